//! Expression lowering (§4.3.6 Expression table, §4.3.7 Select, §4.3.8 Or).

use cflat_ast::ast::{BinOp, Expr, FunCall, Place, UnOp};

use crate::convert::convert_type;
use crate::error::Result;
use crate::types::{ArithOp, CmpOp, Instruction, Terminator, Type};

use super::place::lower_place;
use super::state::{call_return_type, pointee, LowerState};

pub fn lower_expr(st: &mut LowerState, expr: &Expr) -> Result<String> {
    match expr {
        Expr::Val(Place::Id(x)) => Ok(x.clone()),
        Expr::Val(place) => {
            let p = lower_place(st, place)?;
            let ptr_ty = st.typeof_var(&p)?;
            let value_ty = pointee(&ptr_ty)?;
            let t = st.fresh_non_inner(value_ty);
            st.push_inst(Instruction::Load(t.clone(), p.clone()));
            st.release(&[&p]);
            Ok(t)
        }
        Expr::Num(n) => st.emit_const(*n),
        Expr::Nil => Ok("__NULL".to_string()),
        Expr::Select { cond, then_branch, else_branch } => {
            lower_select(st, cond, then_branch, else_branch)
        }
        Expr::UnOp { op: UnOp::Neg, expr } => lower_neg(st, expr),
        Expr::UnOp { op: UnOp::Not, expr } => {
            let zero = Expr::Num(0);
            lower_binop(st, BinOp::Eq, expr, &zero)
        }
        Expr::BinOp { op, left, right } => lower_binop(st, *op, left, right),
        Expr::NewSingle(ty) => {
            let lir_ty = convert_type(ty)?;
            let t = st.fresh_non_inner(Type::Ptr(Box::new(lir_ty.clone())));
            st.push_inst(Instruction::AllocSingle(t.clone(), lir_ty));
            Ok(t)
        }
        Expr::NewArray { ty, count } => {
            let lir_ty = convert_type(ty)?;
            let t = st.fresh_non_inner(Type::Array(Box::new(lir_ty.clone())));
            let x = lower_expr(st, count)?;
            st.push_inst(Instruction::AllocArray(t.clone(), x.clone(), lir_ty));
            st.release(&[&x]);
            Ok(t)
        }
        Expr::CallExp(call) => {
            let (callee, args) = lower_call_args(st, call)?;
            let callee_ty = st.typeof_var(&callee)?;
            let ret_ty = call_return_type(&callee_ty)?;
            let t = st.fresh_non_inner(ret_ty);
            st.push_inst(Instruction::Call(Some(t.clone()), callee.clone(), args.clone()));
            release_call(st, &callee, &args);
            Ok(t)
        }
    }
}

fn lower_neg(st: &mut LowerState, expr: &Expr) -> Result<String> {
    if let Expr::Num(n) = expr {
        return st.emit_const(-n);
    }
    let t = st.fresh_non_inner(Type::Int);
    let z = st.emit_const(0)?;
    let x = lower_expr(st, expr)?;
    st.push_inst(Instruction::Arith(t.clone(), ArithOp::Sub, z, x.clone()));
    st.release(&[&x]);
    Ok(t)
}

fn lower_binop(st: &mut LowerState, op: BinOp, left: &Expr, right: &Expr) -> Result<String> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
            let a = lower_expr(st, left)?;
            let b = lower_expr(st, right)?;
            let t = st.fresh_non_inner(Type::Int);
            let arith_op = match op {
                BinOp::Add => ArithOp::Add,
                BinOp::Sub => ArithOp::Sub,
                BinOp::Mul => ArithOp::Mul,
                BinOp::Div => ArithOp::Div,
                _ => unreachable!(),
            };
            st.push_inst(Instruction::Arith(t.clone(), arith_op, a.clone(), b.clone()));
            st.release(&[&a, &b]);
            Ok(t)
        }
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Lte | BinOp::Gt | BinOp::Gte => {
            let a = lower_expr(st, left)?;
            let b = lower_expr(st, right)?;
            let t = st.fresh_non_inner(Type::Int);
            let cmp_op = match op {
                BinOp::Eq => CmpOp::Eq,
                BinOp::Ne => CmpOp::Ne,
                BinOp::Lt => CmpOp::Lt,
                BinOp::Lte => CmpOp::Lte,
                BinOp::Gt => CmpOp::Gt,
                BinOp::Gte => CmpOp::Gte,
                _ => unreachable!(),
            };
            st.push_inst(Instruction::Cmp(t.clone(), cmp_op, a.clone(), b.clone()));
            st.release(&[&a, &b]);
            Ok(t)
        }
        BinOp::And => {
            let zero = Expr::Num(0);
            lower_select(st, left, right, &zero)
        }
        BinOp::Or => lower_or(st, left, right),
    }
}

/// Null-tolerant conditional expression lowering (§4.3.7).
fn lower_select(st: &mut LowerState, cond: &Expr, tt: &Expr, ff: &Expr) -> Result<String> {
    let tt_label = st.fresh_label("select_true");
    let ff_label = st.fresh_label("select_false");
    let end_label = st.fresh_label("select_end");

    let mut x = "__NULL".to_string();

    let y = lower_expr(st, cond)?;
    st.push_term(Terminator::Branch(y.clone(), tt_label.clone(), ff_label.clone()));
    st.push_label(tt_label);
    st.release(&[&y]);

    let z = lower_expr(st, tt)?;
    if z != "__NULL" {
        let z_ty = st.typeof_var(&z)?;
        x = st.fresh_non_inner(z_ty);
        st.push_inst(Instruction::Copy(x.clone(), z.clone()));
    }
    st.release(&[&z]);
    st.push_term(Terminator::Jump(end_label.clone()));

    st.push_label(ff_label);
    let w = lower_expr(st, ff)?;
    if w != "__NULL" {
        if x == "__NULL" {
            let w_ty = st.typeof_var(&w)?;
            x = st.fresh_non_inner(w_ty);
        }
        st.push_inst(Instruction::Copy(x.clone(), w.clone()));
    }
    st.release(&[&w]);
    st.push_term(Terminator::Jump(end_label.clone()));

    st.push_label(end_label);
    Ok(x)
}

/// Short-circuit `Or` lowering (§4.3.8).
fn lower_or(st: &mut LowerState, l: &Expr, r: &Expr) -> Result<String> {
    let ff_label = st.fresh_label("or_false");
    let end_label = st.fresh_label("or_end");

    let x = lower_expr(st, l)?;
    let y = st.fresh_non_inner(Type::Int);
    st.push_inst(Instruction::Copy(y.clone(), x.clone()));
    st.push_term(Terminator::Branch(y.clone(), end_label.clone(), ff_label.clone()));
    st.push_label(ff_label);
    st.release(&[&x]);

    let z = lower_expr(st, r)?;
    st.push_inst(Instruction::Copy(y.clone(), z.clone()));
    st.release(&[&z]);
    st.push_term(Terminator::Jump(end_label.clone()));
    st.push_label(end_label);

    Ok(y)
}

/// Lowers call arguments right-to-left, returning `(callee, args_in_source_order)`.
pub(super) fn lower_call_args(st: &mut LowerState, call: &FunCall) -> Result<(String, Vec<String>)> {
    let mut rev_args = Vec::with_capacity(call.args.len());
    for a in call.args.iter().rev() {
        rev_args.push(lower_expr(st, a)?);
    }
    rev_args.reverse();
    let callee = lower_expr(st, &call.callee)?;
    Ok((callee, rev_args))
}

pub(super) fn release_call(st: &mut LowerState, callee: &str, args: &[String]) {
    let mut released: Vec<&str> = args.iter().map(String::as_str).collect();
    released.push(callee);
    st.release(&released);
}
