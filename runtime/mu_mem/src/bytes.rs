//! Immutable refcounted byte blocks.
//!
//! Payload layout inside a [`ref_alloc`] block:
//!
//! ```text
//! +-------+-------------+-------------------+
//! | count | len: usize  | bytes[len] ...    |
//! +-------+-------------+-------------------+
//!         ^ handle
//! ```
//!
//! The length lives in the payload so the destructor can free the block
//! without outside help. `Clone` increments the count, `Drop` decrements it.

use std::fmt;
use std::mem;
use std::ptr::NonNull;

use crate::rc::{ref_alloc, ref_count, ref_dealloc, ref_dec, ref_inc};
use crate::AllocError;

const LEN_SIZE: usize = mem::size_of::<usize>();

/// Shared, immutable bytes in a refcounted block.
pub struct RcBytes {
    payload: NonNull<u8>,
}

unsafe fn release_block(payload: *mut u8) {
    // SAFETY: payload is an RcBytes block whose count just reached zero
    unsafe {
        let len = payload.cast::<usize>().read();
        ref_dealloc(payload, LEN_SIZE + len);
    }
}

impl RcBytes {
    /// Allocate `len` zeroed bytes and let `fill` write them.
    pub fn new(len: usize, fill: impl FnOnce(&mut [u8])) -> Result<Self, AllocError> {
        let size = LEN_SIZE.checked_add(len).ok_or(AllocError::new(len))?;
        let raw = ref_alloc(size)?;
        let Some(payload) = NonNull::new(raw) else {
            return Err(AllocError::new(size));
        };

        // SAFETY: the payload is valid for LEN_SIZE + len bytes and
        // ALIGN-aligned, so the length word is aligned too
        let data = unsafe {
            raw.cast::<usize>().write(len);
            let data = raw.add(LEN_SIZE);
            data.write_bytes(0, len);
            std::slice::from_raw_parts_mut(data, len)
        };
        fill(data);

        Ok(RcBytes { payload })
    }

    /// Copy `bytes` into a fresh block.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AllocError> {
        RcBytes::new(bytes.len(), |buf| buf.copy_from_slice(bytes))
    }

    /// Number of bytes.
    #[inline]
    pub fn len(&self) -> usize {
        // SAFETY: the length word is written before the handle exists
        unsafe { self.payload.as_ptr().cast::<usize>().read() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: len bytes follow the length word and are initialized
        unsafe { std::slice::from_raw_parts(self.payload.as_ptr().add(LEN_SIZE), self.len()) }
    }

    /// Current reference count of the block.
    #[inline]
    pub fn ref_count(&self) -> usize {
        // SAFETY: the handle keeps the block live
        unsafe { ref_count(self.payload.as_ptr()) }
    }

    /// Whether both handles share one block.
    #[inline]
    pub fn ptr_eq(a: &RcBytes, b: &RcBytes) -> bool {
        a.payload == b.payload
    }

    /// Address of the block, stable for its lifetime.
    #[inline]
    pub fn addr(&self) -> usize {
        self.payload.as_ptr() as usize
    }
}

impl Clone for RcBytes {
    #[inline]
    fn clone(&self) -> Self {
        // SAFETY: the handle keeps the block live
        unsafe { ref_inc(self.payload.as_ptr()) };
        RcBytes {
            payload: self.payload,
        }
    }
}

impl Drop for RcBytes {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: this handle owns one count; release_block frees the block
        // with the size it was allocated with
        unsafe {
            ref_dec(self.payload.as_ptr(), release_block);
        }
    }
}

impl fmt::Debug for RcBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RcBytes")
            .field("len", &self.len())
            .field("refs", &self.ref_count())
            .finish()
    }
}
