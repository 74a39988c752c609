//! Tree-walking runtime
//!
//! Evaluates parsed statements against a layered variable store.

mod access;
mod error;
mod eval;
mod scope;
mod value;

pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{MAX_RECURSION_DEPTH, Runtime};
pub use scope::Environment;
pub use value::{Number, Object, Primitive, Value};
