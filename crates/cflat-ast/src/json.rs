//! The JSON reader: turns a `serde_json::Value` tree into a [`crate::ast::Program`].
//!
//! Types are encoded as the bare strings `"Int"`/`"Nil"` or single-key
//! objects (`{"Ptr": T}`, `{"Array": T}`, `{"Struct": name}`,
//! `{"Fn": [[params...], ret]}`). Statements, places, and expressions follow
//! the same single-key-tagged-object convention, with one wrinkle: `BinOp`
//! and `UnOp` payloads accept either list form (`[op, lhs, rhs]`) or object
//! form (`{"op": ..., "left": ..., "right": ...}`), and `Break`/`Continue`
//! may appear as bare strings instead of tagged objects.

use serde_json::Value;

use crate::ast::*;
use crate::error::{AstError, Result};

pub fn parse_program(v: &Value) -> Result<Program> {
    let obj = as_object(v, "program")?;

    let structs = match obj.get("structs") {
        Some(v) => as_array(v, "structs")?
            .iter()
            .map(parse_struct)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let externs = match obj.get("externs") {
        Some(v) => as_array(v, "externs")?
            .iter()
            .map(parse_extern)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let functions = as_array(req(obj, "functions")?, "functions")?
        .iter()
        .map(parse_function)
        .collect::<Result<Vec<_>>>()?;

    Ok(Program {
        structs,
        externs,
        functions,
    })
}

fn parse_struct(v: &Value) -> Result<StructDef> {
    let obj = as_object(v, "struct")?;
    let name = as_str(req(obj, "name")?, "struct.name")?.to_string();
    let fields = as_array(req(obj, "fields")?, "struct.fields")?
        .iter()
        .map(parse_field)
        .collect::<Result<Vec<_>>>()?;
    Ok(StructDef { name, fields })
}

fn parse_field(v: &Value) -> Result<Field> {
    // Accept either {"name": ..., "ty"/"type": ...} or a 2-element [name, type] array.
    if let Some(arr) = v.as_array() {
        if arr.len() != 2 {
            return Err(malformed("field array must have exactly 2 elements"));
        }
        let name = as_str(&arr[0], "field.name")?.to_string();
        let ty = parse_type(&arr[1])?;
        return Ok(Field { name, ty });
    }
    let obj = as_object(v, "field")?;
    let name = as_str(req(obj, "name")?, "field.name")?.to_string();
    let ty = parse_type(req_any(obj, &["ty", "type"])?)?;
    Ok(Field { name, ty })
}

fn parse_extern(v: &Value) -> Result<ExternDef> {
    let obj = as_object(v, "extern")?;
    let name = as_str(req(obj, "name")?, "extern.name")?.to_string();
    let params = as_array(req(obj, "params")?, "extern.params")?
        .iter()
        .map(parse_type)
        .collect::<Result<Vec<_>>>()?;
    let ret = parse_type(req_any(obj, &["ret", "ret_type"])?)?;
    Ok(ExternDef { name, params, ret })
}

fn parse_param(v: &Value) -> Result<Param> {
    if let Some(arr) = v.as_array() {
        if arr.len() != 2 {
            return Err(malformed("param array must have exactly 2 elements"));
        }
        let name = as_str(&arr[0], "param.name")?.to_string();
        let ty = parse_type(&arr[1])?;
        return Ok(Param { name, ty });
    }
    let obj = as_object(v, "param")?;
    let name = as_str(req(obj, "name")?, "param.name")?.to_string();
    let ty = parse_type(req_any(obj, &["ty", "type"])?)?;
    Ok(Param { name, ty })
}

fn parse_function(v: &Value) -> Result<FunctionDef> {
    let obj = as_object(v, "function")?;
    let name = as_str(req(obj, "name")?, "function.name")?.to_string();
    let params = match obj.get("params") {
        Some(v) => as_array(v, "function.params")?
            .iter()
            .map(parse_param)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let ret = parse_type(req_any(obj, &["ret", "ret_type"])?)?;
    let locals = match obj.get("locals") {
        Some(v) => as_array(v, "function.locals")?
            .iter()
            .map(parse_param)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let body = parse_stmt(req(obj, "body")?)?;
    Ok(FunctionDef {
        name,
        params,
        ret,
        locals,
        body,
    })
}

pub fn parse_type(v: &Value) -> Result<Type> {
    if let Some(s) = v.as_str() {
        return match s {
            "Int" => Ok(Type::Int),
            "Nil" => Ok(Type::Nil),
            other => Err(malformed(format!("unknown type tag: {other}"))),
        };
    }
    let (tag, payload) = tagged(v, "type")?;
    match tag {
        "Ptr" => Ok(Type::Ptr(Box::new(parse_type(payload)?))),
        "Array" => Ok(Type::Array(Box::new(parse_type(payload)?))),
        "Struct" => Ok(Type::Struct(as_str(payload, "Struct")?.to_string())),
        "Fn" => {
            let arr = as_array(payload, "Fn")?;
            if arr.len() != 2 {
                return Err(malformed("Fn type payload must be [params, ret]"));
            }
            let params = as_array(&arr[0], "Fn.params")?
                .iter()
                .map(parse_type)
                .collect::<Result<Vec<_>>>()?;
            let ret = parse_type(&arr[1])?;
            Ok(Type::Fn(params, Box::new(ret)))
        }
        other => Err(malformed(format!("unknown type tag: {other}"))),
    }
}

pub fn parse_stmt(v: &Value) -> Result<Stmt> {
    if let Some(s) = v.as_str() {
        return match s {
            "Break" => Ok(Stmt::Break),
            "Continue" => Ok(Stmt::Continue),
            other => Err(malformed(format!("unknown bare statement: {other}"))),
        };
    }
    let (tag, payload) = tagged(v, "statement")?;
    match tag {
        "Stmts" => {
            let stmts = as_array(payload, "Stmts")?
                .iter()
                .map(parse_stmt)
                .collect::<Result<Vec<_>>>()?;
            Ok(Stmt::Stmts(stmts))
        }
        "Assign" => {
            let (place, expr) = pair(payload, "Assign", "place", "expr")?;
            Ok(Stmt::Assign(parse_place(place)?, parse_expr(expr)?))
        }
        "CallStmt" => Ok(Stmt::CallStmt(parse_funcall(payload)?)),
        "If" => {
            let obj = as_object(payload, "If")?;
            let cond = parse_expr(req(obj, "cond")?)?;
            let then_branch = Box::new(parse_stmt(req_any(obj, &["then", "tt"])?)?);
            let else_branch = match obj.get("else").or_else(|| obj.get("ff")) {
                Some(Value::Null) | None => None,
                Some(v) => Some(Box::new(parse_stmt(v)?)),
            };
            Ok(Stmt::If(cond, then_branch, else_branch))
        }
        "While" => {
            let obj = as_object(payload, "While")?;
            let cond = parse_expr(req(obj, "cond")?)?;
            let body = Box::new(parse_stmt(req(obj, "body")?)?);
            Ok(Stmt::While(cond, body))
        }
        "Break" => Ok(Stmt::Break),
        "Continue" => Ok(Stmt::Continue),
        "Return" => match payload {
            Value::Null => Ok(Stmt::Return(None)),
            other => Ok(Stmt::Return(Some(parse_expr(other)?))),
        },
        other => Err(malformed(format!("unknown statement tag: {other}"))),
    }
}

pub fn parse_place(v: &Value) -> Result<Place> {
    let (tag, payload) = tagged(v, "place")?;
    match tag {
        "Id" => Ok(Place::Id(as_str(payload, "Id")?.to_string())),
        "Deref" => Ok(Place::Deref(Box::new(parse_expr(payload)?))),
        "ArrayAccess" => {
            let (arr, index) = pair(payload, "ArrayAccess", "arr", "index")?;
            Ok(Place::ArrayAccess {
                arr: Box::new(parse_expr(arr)?),
                index: Box::new(parse_expr(index)?),
            })
        }
        "FieldAccess" => {
            let obj = as_object(payload, "FieldAccess")?;
            let base = parse_expr(req(obj, "base")?)?;
            let field = as_str(req(obj, "field")?, "FieldAccess.field")?.to_string();
            Ok(Place::FieldAccess {
                base: Box::new(base),
                field,
            })
        }
        other => Err(malformed(format!("unknown place tag: {other}"))),
    }
}

pub fn parse_expr(v: &Value) -> Result<Expr> {
    if let Some(n) = v.as_i64() {
        return Ok(Expr::Num(n));
    }
    if let Some(s) = v.as_str() {
        if s == "Nil" {
            return Ok(Expr::Nil);
        }
        return Err(malformed(format!("unknown bare expression: {s}")));
    }
    let (tag, payload) = tagged(v, "expression")?;
    match tag {
        "Val" => Ok(Expr::Val(parse_place(payload)?)),
        "Num" => Ok(Expr::Num(as_i64(payload, "Num")?)),
        "Nil" => Ok(Expr::Nil),
        "Select" => {
            let obj = as_object(payload, "Select")?;
            let cond = parse_expr(req_any(obj, &["cond", "guard"])?)?;
            let then_branch = parse_expr(req_any(obj, &["then", "tt"])?)?;
            let else_branch = parse_expr(req_any(obj, &["else", "ff"])?)?;
            Ok(Expr::Select {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            })
        }
        "UnOp" => {
            let (op_str, expr_v) = un_op_payload(payload)?;
            Ok(Expr::UnOp {
                op: parse_unop(op_str)?,
                expr: Box::new(parse_expr(expr_v)?),
            })
        }
        "BinOp" => {
            let (op_str, left_v, right_v) = bin_op_payload(payload)?;
            Ok(Expr::BinOp {
                op: parse_binop(op_str)?,
                left: Box::new(parse_expr(left_v)?),
                right: Box::new(parse_expr(right_v)?),
            })
        }
        "NewSingle" => Ok(Expr::NewSingle(parse_type(payload)?)),
        "NewArray" => {
            let obj = as_object(payload, "NewArray")?;
            let ty = parse_type(req_any(obj, &["ty", "type"])?)?;
            let count = parse_expr(req_any(obj, &["count", "len", "size"])?)?;
            Ok(Expr::NewArray {
                ty,
                count: Box::new(count),
            })
        }
        "CallExp" => Ok(Expr::CallExp(parse_funcall(payload)?)),
        other => Err(malformed(format!("unknown expression tag: {other}"))),
    }
}

fn parse_funcall(v: &Value) -> Result<FunCall> {
    let obj = as_object(v, "call")?;
    let callee = parse_expr(req(obj, "callee")?)?;
    let args = as_array(req(obj, "args")?, "call.args")?
        .iter()
        .map(parse_expr)
        .collect::<Result<Vec<_>>>()?;
    Ok(FunCall {
        callee: Box::new(callee),
        args,
    })
}

fn un_op_payload(v: &Value) -> Result<(&str, &Value)> {
    if let Some(arr) = v.as_array() {
        if arr.len() != 2 {
            return Err(malformed("UnOp list form must be [op, expr]"));
        }
        return Ok((as_str(&arr[0], "UnOp.op")?, &arr[1]));
    }
    let obj = as_object(v, "UnOp")?;
    let op = as_str(req(obj, "op")?, "UnOp.op")?;
    let expr = req_any(obj, &["expr", "operand", "e"])?;
    Ok((op, expr))
}

fn bin_op_payload(v: &Value) -> Result<(&str, &Value, &Value)> {
    if let Some(arr) = v.as_array() {
        if arr.len() != 3 {
            return Err(malformed("BinOp list form must be [op, lhs, rhs]"));
        }
        return Ok((as_str(&arr[0], "BinOp.op")?, &arr[1], &arr[2]));
    }
    let obj = as_object(v, "BinOp")?;
    let op = as_str(req(obj, "op")?, "BinOp.op")?;
    let left = req_any(obj, &["left", "lhs", "l"])?;
    let right = req_any(obj, &["right", "rhs", "r"])?;
    Ok((op, left, right))
}

fn parse_unop(s: &str) -> Result<UnOp> {
    match s {
        "Neg" | "neg" | "-" => Ok(UnOp::Neg),
        "Not" | "not" | "!" => Ok(UnOp::Not),
        other => Err(malformed(format!("unknown unary operator: {other}"))),
    }
}

fn parse_binop(s: &str) -> Result<BinOp> {
    match s {
        "Add" | "add" | "+" => Ok(BinOp::Add),
        "Sub" | "sub" | "-" => Ok(BinOp::Sub),
        "Mul" | "mul" | "*" => Ok(BinOp::Mul),
        "Div" | "div" | "/" => Ok(BinOp::Div),
        "Eq" | "eq" | "==" => Ok(BinOp::Eq),
        "Ne" | "ne" | "!=" => Ok(BinOp::Ne),
        "Lt" | "lt" | "<" => Ok(BinOp::Lt),
        "Lte" | "lte" | "<=" => Ok(BinOp::Lte),
        "Gt" | "gt" | ">" => Ok(BinOp::Gt),
        "Gte" | "gte" | ">=" => Ok(BinOp::Gte),
        "And" | "and" | "&&" => Ok(BinOp::And),
        "Or" | "or" | "||" => Ok(BinOp::Or),
        other => Err(malformed(format!("unknown binary operator: {other}"))),
    }
}

// ---- small navigation helpers over serde_json::Value ----

fn malformed(msg: impl Into<String>) -> AstError {
    AstError::Malformed(msg.into())
}

fn as_object<'a>(
    v: &'a Value,
    what: &str,
) -> Result<&'a serde_json::Map<String, Value>> {
    v.as_object()
        .ok_or_else(|| malformed(format!("expected {what} to be a JSON object")))
}

fn as_array<'a>(v: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    v.as_array()
        .ok_or_else(|| malformed(format!("expected {what} to be a JSON array")))
}

fn as_str<'a>(v: &'a Value, what: &str) -> Result<&'a str> {
    v.as_str()
        .ok_or_else(|| malformed(format!("expected {what} to be a string")))
}

fn as_i64(v: &Value, what: &str) -> Result<i64> {
    v.as_i64()
        .ok_or_else(|| malformed(format!("expected {what} to be an integer")))
}

fn req<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| malformed(format!("missing required field \"{key}\"")))
}

fn req_any<'a>(
    obj: &'a serde_json::Map<String, Value>,
    keys: &[&str],
) -> Result<&'a Value> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .ok_or_else(|| malformed(format!("missing any of fields {keys:?}")))
}

/// Splits a single-key tagged object `{tag: payload}` into its parts.
fn tagged<'a>(v: &'a Value, what: &str) -> Result<(&'a str, &'a Value)> {
    let obj = as_object(v, what)?;
    if obj.len() != 1 {
        return Err(malformed(format!(
            "expected {what} to be a single-key tagged object, found {} keys",
            obj.len()
        )));
    }
    let (tag, payload) = obj.iter().next().unwrap();
    Ok((tag.as_str(), payload))
}

fn pair<'a>(
    v: &'a Value,
    what: &str,
    key_a: &str,
    key_b: &str,
) -> Result<(&'a Value, &'a Value)> {
    if let Some(arr) = v.as_array() {
        if arr.len() != 2 {
            return Err(malformed(format!("{what} list form must have 2 elements")));
        }
        return Ok((&arr[0], &arr[1]));
    }
    let obj = as_object(v, what)?;
    Ok((req(obj, key_a)?, req(obj, key_b)?))
}
