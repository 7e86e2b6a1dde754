//! Mu Values - the value and object core of the Mu runtime.
//!
//! This crate provides:
//! - The tagged value type (`Value`) and its dispatch operations
//! - The hybrid array/map/scope container (`Table`)
//! - Errors as values (`Error`, `IsError`, descriptor tables)
//! - The number, string and function collaborators values are built from
//!
//! # Architecture
//!
//! ```text
//! Value ──dispatch──► Table ──backing array──► mu_mem::Slots
//!   │                   │
//!   │                   └──tail──► Table ──tail──► ...
//!   ├──► Str ──► mu_mem::RcBytes
//!   └──► Builtin / Closure ──call──► Table (args, scope)
//! ```
//!
//! Everything is single-threaded: handles are `!Send`, counts are plain.
//! Failures are returned as `Error` values (`Result<_, Error>` in Rust
//! signatures, `Value::Error` when stored), never unwound.

mod error;
mod function;
pub mod num;
mod runtime;
mod string;
mod table;
mod value;

pub use error::{
    length_exceeded, out_of_memory, parse_error, preload_descriptors, read_only_violation, Error,
    IsError,
};
pub use function::{Builtin, BuiltinFn, Callable, Closure};
pub use runtime::{init_tracing, Runtime};
pub use string::{Str, MAX_LEN};
pub use table::{Access, Entries, Stride, Table};
pub use value::{Hash, Value, ValueType};
