// SPDX-License-Identifier: (MIT OR Apache-2.0)

use thiserror::Error;
use weave_codegen::EmitError;
use weave_interp::{CompileError, RuntimeError};

#[derive(Debug, Error)]
pub enum RecordError {
    /// Bad type or field names, or a construction with the wrong arguments.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl RecordError {
    /// Sort a construction failure: wrong arity or keywords are the
    /// caller's mistake, anything else is a runtime failure.
    pub(crate) fn from_construction(err: RuntimeError) -> Self {
        match err.into_root() {
            err @ (RuntimeError::ArityMismatch { .. } | RuntimeError::TypeError(_)) => {
                RecordError::Validation(err.to_string())
            }
            other => RecordError::Runtime(other),
        }
    }
}
