//! Function lowerer (component 3, the core) and the top-level entry point
//! that ties the whole pipeline together.

mod expr;
mod place;
mod stmt;
mod state;

pub use state::{LowerState, TvItem};

use cflat_ast::ast;
use tracing::{debug, instrument};

use crate::cfg::build_cfg;
use crate::error::Result;
use crate::shell::build_shell;
use crate::types::{Program, Terminator};

/// Lowers a whole Cflat AST program into a LIR program (shell + every
/// function body).
pub fn lower_program(ast_program: &ast::Program) -> Result<Program> {
    let mut program = build_shell(ast_program)?;

    for ast_fn in &ast_program.functions {
        let body = lower_function_body(&program, ast_fn)?;
        let func = program
            .functions
            .get_mut(&ast_fn.name)
            .expect("program shell always contains every AST function by name");
        func.body = body.blocks;
        func.locals = body.locals;
    }

    Ok(program)
}

struct LoweredBody {
    locals: std::collections::BTreeMap<String, crate::types::Type>,
    blocks: std::collections::BTreeMap<String, crate::types::BasicBlock>,
}

#[instrument(skip(program, ast_fn), fields(function = %ast_fn.name))]
fn lower_function_body(program: &Program, ast_fn: &ast::FunctionDef) -> Result<LoweredBody> {
    let shell_fn = &program.functions[&ast_fn.name];
    let mut st = LowerState::new(program, shell_fn.entry.clone(), shell_fn.locals.clone());

    stmt::lower_stmt(&mut st, &ast_fn.body)?;

    // A block is still open at the end of lowering iff the last item isn't a
    // terminator (the body fell through without an explicit `return`). This
    // must not key on whether a `Ret` exists anywhere in `tv`: a `return;`
    // nested inside an `if`/`while` leaves the surrounding fall-through block
    // (e.g. `if_end`) open even though the function contains a `Ret`.
    let open_at_end = !matches!(st.tv.last(), Some(TvItem::Term(_)));
    if open_at_end {
        st.push_term(Terminator::Ret(None));
    }

    let blocks = build_cfg(&shell_fn.entry, &st.tv)?;
    debug!(blocks = blocks.len(), locals = st.locals.len(), "lowered function");

    Ok(LoweredBody { locals: st.locals, blocks })
}
