//! Type converter (component 1): pure, stateless mapping from AST types to
//! LIR types.

use cflat_ast::ast;

use crate::error::Result;
use crate::types::Type;

/// `ast::Type` is already a closed enum matched exhaustively below, so this
/// can never actually fail; it returns `Result` to keep the taxonomy's
/// `UnsupportedType` variant meaningful if the AST grows a variant this
/// converter doesn't know about yet.
pub fn convert_type(ty: &ast::Type) -> Result<Type> {
    match ty {
        ast::Type::Int => Ok(Type::Int),
        ast::Type::Nil => Ok(Type::Nil),
        ast::Type::Struct(name) => Ok(Type::Struct(name.clone())),
        ast::Type::Ptr(inner) => Ok(Type::Ptr(Box::new(convert_type(inner)?))),
        ast::Type::Array(inner) => Ok(Type::Array(Box::new(convert_type(inner)?))),
        ast::Type::Fn(params, ret) => {
            let params = params.iter().map(convert_type).collect::<Result<Vec<_>>>()?;
            Ok(Type::Fn(params, Box::new(convert_type(ret)?)))
        }
    }
}
