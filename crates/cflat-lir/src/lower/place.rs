//! Place lowering (§4.3.6, Place table).

use cflat_ast::ast::Place;

use crate::error::Result;
use crate::types::{Instruction, Type};

use super::expr::lower_expr;
use super::state::{array_elem, struct_name_of_ptr, LowerState};

/// Lowers a place, returning the variable holding the computed pointer (or,
/// for a bare identifier, the identifier itself).
pub fn lower_place(st: &mut LowerState, place: &Place) -> Result<String> {
    match place {
        Place::Id(x) => Ok(x.clone()),
        Place::Deref(e) => lower_expr(st, e),
        Place::ArrayAccess { arr, index } => {
            let s = lower_expr(st, arr)?;
            let j = lower_expr(st, index)?;
            let arr_ty = st.typeof_var(&s)?;
            let elem_ty = array_elem(&arr_ty)?;
            let t = st.fresh_inner(Type::Ptr(Box::new(elem_ty)));
            st.push_inst(Instruction::Gep(t.clone(), s.clone(), j.clone(), true));
            st.release(&[&s, &j]);
            Ok(t)
        }
        Place::FieldAccess { base, field } => {
            let s = lower_expr(st, base)?;
            let ptr_ty = st.typeof_var(&s)?;
            let struct_name = struct_name_of_ptr(&ptr_ty)?;
            let field_ty = st.field_type(&struct_name, field)?;
            let t = st.fresh_inner(Type::Ptr(Box::new(field_ty)));
            st.push_inst(Instruction::Gfp(t.clone(), s.clone(), struct_name, field.clone()));
            st.release(&[&s]);
            Ok(t)
        }
    }
}
