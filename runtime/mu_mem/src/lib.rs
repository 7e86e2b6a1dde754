//! Mu memory layer (`mu_mem`)
//!
//! This crate owns every raw heap block the Mu runtime touches. Everything
//! above it (tables, strings, error descriptors) is written in safe Rust on
//! top of the types exported here.
//!
//! # Layers
//!
//! - **Allocator**: [`alloc`], [`realloc`], [`dealloc`]. Thin wrapper over the
//!   global allocator guaranteeing [`ALIGN`]-byte alignment and reporting
//!   exhaustion as [`AllocError`] instead of aborting.
//! - **Reference counting**: [`ref_alloc`], [`ref_inc`], [`ref_dec`],
//!   [`ref_dealloc`], [`ref_count`]. Blocks are prefixed with a count header
//!   and the caller only ever sees the payload pointer.
//! - **Typed storage**: [`Slots`] (fixed-capacity initialized buffers, the
//!   backing arrays of tables) and [`RcBytes`] (immutable refcounted byte
//!   blocks, the storage of strings).
//!
//! # Accounting
//!
//! Live bytes are tracked per thread ([`stats`]) and may be capped with a
//! [`MemConfig`] limit. A refused allocation is indistinguishable from host
//! exhaustion, which keeps out-of-memory paths testable.
//!
//! # Threading
//!
//! The runtime is single-threaded. Counts are plain integers and every handle
//! type here is `!Send`/`!Sync`; accounting state is thread-local.

#![warn(clippy::allow_attributes_without_reason)]
#![allow(
    unsafe_code,
    reason = "raw block management requires unsafe pointer operations"
)]
#![allow(
    clippy::cast_ptr_alignment,
    reason = "all blocks are ALIGN-aligned, header and payload casts are intentional"
)]

mod alloc;
mod bytes;
mod config;
mod rc;
mod slots;

pub use alloc::{alloc, dealloc, realloc, stats, MemStats, ALIGN};
pub use bytes::RcBytes;
pub use config::{configure, current_config, MemConfig, LIMIT_ENV};
pub use rc::{ref_alloc, ref_count, ref_dealloc, ref_dec, ref_inc, HEADER_SIZE};
pub use slots::Slots;

/// Allocation failure.
///
/// Returned when the host allocator is exhausted or the configured limit
/// would be exceeded. Carries the size of the refused request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("out of memory ({requested} bytes requested)")]
pub struct AllocError {
    /// Size in bytes of the refused request.
    pub requested: usize,
}

impl AllocError {
    #[inline]
    pub(crate) fn new(requested: usize) -> Self {
        AllocError { requested }
    }
}
