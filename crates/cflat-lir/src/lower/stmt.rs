//! Statement lowering (§4.3.6, Statement table).

use cflat_ast::ast::{Expr, Place, Stmt};

use crate::error::{LowerError, Result};
use crate::types::{Instruction, Terminator};

use super::expr::{lower_call_args, lower_expr, release_call};
use super::place::lower_place;
use super::state::LowerState;

pub fn lower_stmt(st: &mut LowerState, stmt: &Stmt) -> Result<()> {
    match stmt {
        Stmt::Stmts(ss) => {
            for s in ss {
                lower_stmt(st, s)?;
            }
            Ok(())
        }
        Stmt::Assign(Place::Id(x), e) => {
            let y = lower_expr(st, e)?;
            st.push_inst(Instruction::Copy(x.clone(), y.clone()));
            st.release(&[&y]);
            Ok(())
        }
        Stmt::Assign(place, e) => {
            let p = lower_place(st, place)?;
            let y = lower_expr(st, e)?;
            st.push_inst(Instruction::Store(p.clone(), y.clone()));
            st.release(&[&p, &y]);
            Ok(())
        }
        Stmt::CallStmt(call) => {
            let (callee, args) = lower_call_args(st, call)?;
            st.push_inst(Instruction::Call(None, callee.clone(), args.clone()));
            release_call(st, &callee, &args);
            Ok(())
        }
        Stmt::If(g, tt, ff) => lower_if(st, g, tt, ff.as_deref()),
        Stmt::While(g, body) => lower_while(st, g, body),
        Stmt::Break => {
            let target = st
                .loop_end_stack
                .last()
                .cloned()
                .ok_or(LowerError::BreakOutsideLoop)?;
            st.push_term(Terminator::Jump(target));
            Ok(())
        }
        Stmt::Continue => {
            let target = st
                .loop_hdr_stack
                .last()
                .cloned()
                .ok_or(LowerError::ContinueOutsideLoop)?;
            st.push_term(Terminator::Jump(target));
            Ok(())
        }
        Stmt::Return(e) => {
            match e {
                Some(expr) => {
                    let y = lower_expr(st, expr)?;
                    st.push_term(Terminator::Ret(Some(y.clone())));
                    st.release(&[&y]);
                }
                None => st.push_term(Terminator::Ret(None)),
            }
            Ok(())
        }
    }
}

fn lower_if(st: &mut LowerState, g: &Expr, tt: &Stmt, ff: Option<&Stmt>) -> Result<()> {
    let tt_label = st.fresh_label("if_true");
    let ff_label = st.fresh_label("if_false");
    let end_label = st.fresh_label("if_end");

    let y = lower_expr(st, g)?;
    st.push_term(Terminator::Branch(y.clone(), tt_label.clone(), ff_label.clone()));
    st.push_label(tt_label);
    st.release(&[&y]);

    lower_stmt(st, tt)?;
    st.push_term(Terminator::Jump(end_label.clone()));

    st.push_label(ff_label);
    if let Some(ff_stmt) = ff {
        lower_stmt(st, ff_stmt)?;
    }
    st.push_term(Terminator::Jump(end_label.clone()));

    st.push_label(end_label);
    Ok(())
}

fn lower_while(st: &mut LowerState, g: &cflat_ast::ast::Expr, body: &Stmt) -> Result<()> {
    let hdr_label = st.fresh_label("loop_hdr");
    let body_label = st.fresh_label("loop_body");
    let end_label = st.fresh_label("loop_end");

    st.loop_hdr_stack.push(hdr_label.clone());
    st.loop_end_stack.push(end_label.clone());

    st.push_term(Terminator::Jump(hdr_label.clone()));
    st.push_label(hdr_label.clone());
    let y = lower_expr(st, g)?;
    st.push_term(Terminator::Branch(y.clone(), body_label.clone(), end_label.clone()));
    st.release(&[&y]);

    st.push_label(body_label);
    lower_stmt(st, body)?;
    st.push_term(Terminator::Jump(hdr_label));

    st.push_label(end_label);

    st.loop_hdr_stack.pop();
    st.loop_end_stack.pop();
    Ok(())
}
