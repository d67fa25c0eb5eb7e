use thiserror::Error;

/// Lowering-time error taxonomy. One variant per kind named by the error
/// taxonomy; `cflat-ast`'s `AstError` covers the `InvalidInput`/`MalformedAST`
/// kinds upstream of this crate.
#[derive(Debug, Error)]
pub enum LowerError {
    #[error("unsupported type variant: {0}")]
    UnsupportedType(String),

    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("break outside of a loop")]
    BreakOutsideLoop,

    #[error("continue outside of a loop")]
    ContinueOutsideLoop,

    #[error("type shape mismatch: expected {expected}, found {found}")]
    TypeShapeMismatch { expected: String, found: String },

    #[error("basic block \"{0}\" has no terminator")]
    MalformedBlock(String),

    #[error("duplicate name: {0}")]
    DuplicateName(String),
}

pub type Result<T> = std::result::Result<T, LowerError>;
