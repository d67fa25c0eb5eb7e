use thiserror::Error;

/// Errors raised while turning raw JSON into a [`crate::ast::Program`].
///
/// This is the `InvalidInput` / `MalformedAST` side of the error taxonomy;
/// lowering-time errors (`UnsupportedType`, `UnknownIdentifier`, ...) belong
/// to `cflat-lir` instead.
#[derive(Debug, Error)]
pub enum AstError {
    #[error("failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed AST: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, AstError>;
