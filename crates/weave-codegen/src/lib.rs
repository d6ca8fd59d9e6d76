// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Incremental source emitter for weave script.
//!
//! A [`Code`] buffer collects indentation-correct lines, written through
//! [`Scope`]s that carry `{name}` substitutions. The finished text is
//! compiled and run into the buffer's own namespace, where values staged
//! with [`Code::new_global`] are already visible.

mod args;
mod config;
mod emitter;
mod error;
mod template;

pub use args::Var;
pub use config::EmitterConfig;
pub use emitter::{Code, Scope};
pub use error::{EmitError, Error};

/// Substitution bindings, in insertion order.
pub type Subs = indexmap::IndexMap<String, String>;

/// Build a [`Subs`] table: `subs! { name = "f", n = 3 }`.
#[macro_export]
macro_rules! subs {
    () => {
        $crate::Subs::new()
    };
    ($($name:ident = $value:expr),+ $(,)?) => {{
        let mut subs = $crate::Subs::new();
        $( subs.insert(stringify!($name).to_string(), ($value).to_string()); )+
        subs
    }};
}
