// SPDX-License-Identifier: (MIT OR Apache-2.0)

use thiserror::Error;
use weave_interp::{CompileError, RuntimeError};

/// A line could not be rendered from its template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("no substitution for '{{{name}}}' in {template:?}")]
    MissingSubstitution { name: String, template: String },

    #[error("malformed template {template:?} at byte {position}: {message}")]
    MalformedTemplate {
        template: String,
        position: usize,
        message: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
