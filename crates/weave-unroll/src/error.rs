// SPDX-License-Identifier: (MIT OR Apache-2.0)

use thiserror::Error;
use weave_ast::module::Location;
use weave_codegen::EmitError;
use weave_interp::{CompileError, RuntimeError};

/// A loop the unroller was asked to expand but cannot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("{location}: cannot unroll a 'for' loop with an 'else' clause")]
    ForElse { location: Location },

    #[error("{location}: cannot unroll over '{name}': a '{ty}' has no fixed length")]
    Unsized { name: String, ty: String, location: Location },

    #[error("{location}: '{keyword}' would leave the unrolled loop over '{name}'")]
    LoopControl {
        keyword: &'static str,
        name: String,
        location: Location,
    },
}

#[derive(Debug, Error)]
pub enum SpecializeError {
    #[error("cannot specialize a value of type '{0}'")]
    NotAFunction(String),

    #[error("'{0}' cannot be used as a parameter name")]
    InvalidName(String),

    #[error("generated unit did not define 'make'")]
    MissingFactory,

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
