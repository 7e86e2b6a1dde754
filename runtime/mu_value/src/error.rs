//! Errors as values.
//!
//! Every failure the core can report is one of four categories. The category
//! itself is a plain `Copy` value, so reporting an error never allocates.
//! Each category also has a descriptor table `{type, reason}` that scripts
//! can inspect; descriptors are built on first demand from static strings,
//! cached for the rest of the thread, and handed out read-only.
//!
//! # Bootstrapping
//!
//! Building a descriptor allocates a table, which can itself fail under
//! exhaustion. [`preload_descriptors`] builds all four up front (the runtime
//! calls it at startup) so later reporting only reads the cache.

use std::cell::RefCell;

use mu_mem::AllocError;

use crate::string::Str;
use crate::table::Table;
use crate::value::Value;

/// Failure categories of the value core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    /// Allocation exhaustion.
    #[error("memory error: out of memory")]
    OutOfMemory,
    /// A computed string or result would exceed the maximum length.
    #[error("length error: exceeded max length")]
    LengthExceeded,
    /// Mutation attempted through a read-only table handle.
    #[error("readonly error: assigning to readonly table")]
    ReadOnly,
    /// Text could not be parsed.
    #[error("parse error: expression could not be parsed")]
    Parse,
}

impl Error {
    /// All categories, in descriptor cache order.
    pub const ALL: [Error; 4] = [
        Error::OutOfMemory,
        Error::LengthExceeded,
        Error::ReadOnly,
        Error::Parse,
    ];

    /// The `type` field of the descriptor.
    pub fn kind(self) -> &'static str {
        match self {
            Error::OutOfMemory => "memory error",
            Error::LengthExceeded => "length error",
            Error::ReadOnly => "readonly error",
            Error::Parse => "parse error",
        }
    }

    /// The `reason` field of the descriptor.
    pub fn reason(self) -> &'static str {
        match self {
            Error::OutOfMemory => "out of memory",
            Error::LengthExceeded => "exceeded max length",
            Error::ReadOnly => "assigning to readonly table",
            Error::Parse => "expression could not be parsed",
        }
    }

    fn index(self) -> usize {
        match self {
            Error::OutOfMemory => 0,
            Error::LengthExceeded => 1,
            Error::ReadOnly => 2,
            Error::Parse => 3,
        }
    }

    /// Descriptor table `{type, reason}` for this category.
    ///
    /// The returned handle is read-only. Fails only if the descriptor has
    /// not been built yet and building it runs out of memory.
    pub fn descriptor(self) -> Result<Table, Error> {
        let cached = DESCRIPTORS.with(|cache| cache.borrow()[self.index()].clone());
        if let Some(table) = cached {
            return Ok(table);
        }

        let table = build_descriptor(self)?;
        DESCRIPTORS.with(|cache| cache.borrow_mut()[self.index()] = Some(table.clone()));
        Ok(table)
    }
}

impl From<AllocError> for Error {
    fn from(err: AllocError) -> Self {
        tracing::debug!(requested = err.requested, "allocation failed");
        Error::OutOfMemory
    }
}

thread_local! {
    static DESCRIPTORS: RefCell<[Option<Table>; 4]> = const {
        RefCell::new([None, None, None, None])
    };
}

fn build_descriptor(err: Error) -> Result<Table, Error> {
    tracing::debug!(kind = err.kind(), "building error descriptor");
    let table = Table::with_hash(2)?;
    table.insert(
        Value::Str(Str::from_static("type")),
        Value::Str(Str::from_static(err.kind())),
    )?;
    table.insert(
        Value::Str(Str::from_static("reason")),
        Value::Str(Str::from_static(err.reason())),
    )?;
    Ok(table.read_only())
}

/// Build and cache every descriptor now.
pub fn preload_descriptors() -> Result<(), Error> {
    for err in Error::ALL {
        err.descriptor()?;
    }
    Ok(())
}

/// The out-of-memory error.
#[inline]
pub fn out_of_memory() -> Error {
    Error::OutOfMemory
}

/// The length-exceeded error.
#[inline]
pub fn length_exceeded() -> Error {
    Error::LengthExceeded
}

/// The read-only-violation error.
#[inline]
pub fn read_only_violation() -> Error {
    Error::ReadOnly
}

/// The parse error.
#[inline]
pub fn parse_error() -> Error {
    Error::Parse
}

/// "Is this an error" test for any result shape.
pub trait IsError {
    fn is_error(&self) -> bool;
}

impl IsError for Error {
    #[inline]
    fn is_error(&self) -> bool {
        true
    }
}

impl IsError for Value {
    #[inline]
    fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl<T> IsError for Result<T, Error> {
    #[inline]
    fn is_error(&self) -> bool {
        self.is_err()
    }
}
