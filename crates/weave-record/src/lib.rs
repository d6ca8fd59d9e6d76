// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lightweight mutable record types generated at runtime.
//!
//! [`define`] renders a slot-backed class from a template, compiles it in a
//! fresh namespace and hands back the resulting type:
//!
//! ```
//! use weave_record::{define, DefineOptions};
//! use weave_interp::Value;
//!
//! let point = define("Point", "x, y", &DefineOptions::default()).unwrap();
//! let p = point.make([Value::Int(11), Value::Int(22)]).unwrap();
//! assert_eq!(p.repr(), "Point(x=11, y=22)");
//! ```

mod error;
mod factory;
mod fields;

pub use error::RecordError;
pub use factory::{define, DefineOptions, RecordClass};
pub use fields::FieldNames;
