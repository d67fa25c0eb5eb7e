//! Cflat AST crate: the data model and JSON reader for Cflat programs.
//!
//! `cflat-lir` consumes [`ast::Program`] values produced here; this crate
//! knows nothing about lowering, temporaries, or control-flow graphs.

pub mod ast;
pub mod error;
pub mod json;

use std::fs;
use std::path::Path;

pub use ast::Program;
pub use error::{AstError, Result};

/// Reads and parses a Cflat program from a JSON file on disk.
pub fn read_program_from_path(path: impl AsRef<Path>) -> Result<Program> {
    let text = fs::read_to_string(path)?;
    read_program_str(&text)
}

/// Parses a Cflat program from a JSON string.
pub fn read_program_str(text: &str) -> Result<Program> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    json::parse_program(&value)
}
