// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Function specialization and loop unrolling for weave script.
//!
//! [`Closure`] re-creates a function with chosen values for its free names.
//! [`Unroller`] rewrites the re-parsed tree so loops over sequences of known
//! length become straight-line code. [`Unroll`] combines the two and is also
//! available to scripts as the `unroll(**names)` decorator after
//! [`install`].

mod closure;
mod decorator;
mod error;
mod unroller;

pub use closure::{clone_function, Closure, CONTROL_NAME};
pub use decorator::{install, Unroll};
pub use error::{SpecializeError, TransformError};
pub use unroller::{Transform, Unroller};
