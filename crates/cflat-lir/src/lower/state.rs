//! Per-function lowering state (§4.3.1): the translation vector, fresh-name
//! counters, constant cache, and loop-label stacks.

use std::collections::BTreeMap;

use crate::error::{LowerError, Result};
use crate::types::{Instruction, Program, Terminator, Type};

/// One item of the translation vector: a label, an instruction, or a
/// terminator, in emission order. The CFG builder (component 4) slices this
/// back into basic blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum TvItem {
    Label(String),
    Inst(Instruction),
    Term(Terminator),
}

pub struct LowerState<'p> {
    pub program: &'p Program,
    pub locals: BTreeMap<String, Type>,
    pub tv: Vec<TvItem>,
    label_counter: u32,
    tmp_counter: u32,
    const_insert_pos: usize,
    pub loop_hdr_stack: Vec<String>,
    pub loop_end_stack: Vec<String>,
}

impl<'p> LowerState<'p> {
    pub fn new(program: &'p Program, entry_label: String, locals: BTreeMap<String, Type>) -> Self {
        let mut tv = Vec::new();
        tv.push(TvItem::Label(entry_label));
        LowerState {
            program,
            locals,
            tv,
            label_counter: 0,
            tmp_counter: 0,
            const_insert_pos: 1,
            loop_hdr_stack: Vec::new(),
            loop_end_stack: Vec::new(),
        }
    }

    pub fn push_label(&mut self, label: String) {
        self.tv.push(TvItem::Label(label));
    }

    pub fn push_inst(&mut self, inst: Instruction) {
        self.tv.push(TvItem::Inst(inst));
    }

    pub fn push_term(&mut self, term: Terminator) {
        self.tv.push(TvItem::Term(term));
    }

    /// `release(vs)` is a liveness hint only (§4.3.4). Per the spec's own
    /// recommendation ("the safest posture is to skip reuse entirely"), this
    /// implementation never reclaims temporaries; the call sites are kept so
    /// the code reads against the lowering schema 1:1.
    pub fn release(&mut self, _vars: &[&str]) {}

    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("{prefix}{n}")
    }

    fn fresh_temp(&mut self, prefix: &str, ty: Type) -> String {
        let n = self.tmp_counter;
        self.tmp_counter += 1;
        let name = format!("_{prefix}{n}");
        self.locals.insert(name.clone(), ty);
        name
    }

    pub fn fresh_non_inner(&mut self, ty: Type) -> String {
        self.fresh_temp("tmp", ty)
    }

    pub fn fresh_inner(&mut self, ty: Type) -> String {
        self.fresh_temp("inner", ty)
    }

    /// Constant caching (§4.3.3): one `_const_<n>` local per distinct literal,
    /// `Const` emitted only on first use, inserted contiguously at the top of
    /// the entry block in first-use order.
    pub fn emit_const(&mut self, n: i64) -> Result<String> {
        let name = const_name(n);
        if !self.locals.contains_key(&name) {
            self.locals.insert(name.clone(), Type::Int);
            self.tv
                .insert(self.const_insert_pos, TvItem::Inst(Instruction::Const(name.clone(), n)));
            self.const_insert_pos += 1;
        }
        Ok(name)
    }

    /// `typeof` lookup (§4.3.5): function locals, then `funptrs`, then
    /// `externs`; `__NULL` is always `Nil`.
    pub fn typeof_var(&self, name: &str) -> Result<Type> {
        if name == "__NULL" {
            return Ok(Type::Nil);
        }
        if let Some(ty) = self.locals.get(name) {
            return Ok(ty.clone());
        }
        if let Some(ty) = self.program.funptrs.get(name) {
            return Ok(ty.clone());
        }
        if let Some(ty) = self.program.externs.get(name) {
            return Ok(ty.clone());
        }
        Err(LowerError::UnknownIdentifier(name.to_string()))
    }

    pub fn field_type(&self, struct_name: &str, field: &str) -> Result<Type> {
        self.program
            .structs
            .get(struct_name)
            .and_then(|s| s.fields.get(field))
            .cloned()
            .ok_or_else(|| LowerError::TypeShapeMismatch {
                expected: format!("struct {struct_name} with field {field}"),
                found: "no such struct or field".to_string(),
            })
    }
}

fn const_name(n: i64) -> String {
    if n < 0 {
        format!("_const_n{}", -n)
    } else {
        format!("_const_{n}")
    }
}

/// `Ptr(T)`/`Array(T) → T`, used by `Val(place)` to type the loaded value.
pub fn pointee(ty: &Type) -> Result<Type> {
    match ty {
        Type::Ptr(inner) => Ok((**inner).clone()),
        other => Err(LowerError::TypeShapeMismatch {
            expected: "pointer type".to_string(),
            found: format!("{other:?}"),
        }),
    }
}

/// `Array(E) → E`, used by `ArrayAccess` to type the `Gep` result.
pub fn array_elem(ty: &Type) -> Result<Type> {
    match ty {
        Type::Array(inner) => Ok((**inner).clone()),
        other => Err(LowerError::TypeShapeMismatch {
            expected: "array type".to_string(),
            found: format!("{other:?}"),
        }),
    }
}

/// `Ptr(Struct(N)) → N`, used by `FieldAccess` to type the `Gfp` result.
pub fn struct_name_of_ptr(ty: &Type) -> Result<String> {
    match ty {
        Type::Ptr(inner) => match &**inner {
            Type::Struct(name) => Ok(name.clone()),
            other => Err(LowerError::TypeShapeMismatch {
                expected: "pointer to struct".to_string(),
                found: format!("Ptr({other:?})"),
            }),
        },
        other => Err(LowerError::TypeShapeMismatch {
            expected: "pointer to struct".to_string(),
            found: format!("{other:?}"),
        }),
    }
}

/// `Fn(_, R) → R`, unwrapping one layer of `Ptr` for indirect calls.
pub fn call_return_type(ty: &Type) -> Result<Type> {
    match ty {
        Type::Fn(_, ret) => Ok((**ret).clone()),
        Type::Ptr(inner) => match &**inner {
            Type::Fn(_, ret) => Ok((**ret).clone()),
            other => Err(LowerError::TypeShapeMismatch {
                expected: "callable type".to_string(),
                found: format!("Ptr({other:?})"),
            }),
        },
        other => Err(LowerError::TypeShapeMismatch {
            expected: "callable type".to_string(),
            found: format!("{other:?}"),
        }),
    }
}
