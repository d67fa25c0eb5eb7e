//! Program shell builder (component 2): walks the AST program and produces
//! a LIR program whose function bodies are still empty.

use std::collections::BTreeMap;

use cflat_ast::ast;
use tracing::debug;

use crate::convert::convert_type;
use crate::error::Result;
use crate::types::{Function, Program, StructDef, Type};

pub fn build_shell(ast: &ast::Program) -> Result<Program> {
    let mut structs = BTreeMap::new();
    for s in &ast.structs {
        let mut fields = BTreeMap::new();
        for f in &s.fields {
            fields.insert(f.name.clone(), convert_type(&f.ty)?);
        }
        structs.insert(s.name.clone(), StructDef { name: s.name.clone(), fields });
    }

    let mut externs = BTreeMap::new();
    for e in &ast.externs {
        let params = e.params.iter().map(convert_type).collect::<Result<Vec<_>>>()?;
        let ret = convert_type(&e.ret)?;
        externs.insert(e.name.clone(), Type::Fn(params, Box::new(ret)));
    }

    let mut funptrs = BTreeMap::new();
    let mut functions = BTreeMap::new();
    for f in &ast.functions {
        let param_types = f
            .params
            .iter()
            .map(|p| convert_type(&p.ty))
            .collect::<Result<Vec<_>>>()?;
        let ret = convert_type(&f.ret)?;

        let mut locals = BTreeMap::new();
        let mut params = Vec::with_capacity(f.params.len());
        for (p, ty) in f.params.iter().zip(param_types.iter()) {
            locals.insert(p.name.clone(), ty.clone());
            params.push((p.name.clone(), ty.clone()));
        }
        for l in &f.locals {
            locals.insert(l.name.clone(), convert_type(&l.ty)?);
        }

        if f.name != "main" {
            funptrs.insert(
                f.name.clone(),
                Type::Ptr(Box::new(Type::Fn(param_types, Box::new(ret.clone())))),
            );
        }

        functions.insert(
            f.name.clone(),
            Function {
                name: f.name.clone(),
                params,
                ret,
                locals,
                body: BTreeMap::new(),
                entry: format!("{}_entry", f.name),
            },
        );
    }

    debug!(
        structs = structs.len(),
        externs = externs.len(),
        functions = functions.len(),
        "built program shell"
    );

    Ok(Program { structs, externs, funptrs, functions })
}
