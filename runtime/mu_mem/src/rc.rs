// Reference-counted blocks.
//
// Heap layout:
//
//   +----------------+--------------------------+
//   | count: usize   | payload bytes ...        |
//   +----------------+--------------------------+
//   ^                ^
//   base             payload (returned by ref_alloc)
//
// The payload pointer is the handle; the count lives HEADER_SIZE bytes
// before it. Counts start at 1 and are plain (non-atomic) integers.
// Nothing detects cycles: a cycle of blocks is never released.

use crate::alloc::{alloc, dealloc, ALIGN};
use crate::AllocError;

type Count = usize;

/// Size of the count header in front of every refcounted payload.
pub const HEADER_SIZE: usize = std::mem::size_of::<Count>().next_multiple_of(ALIGN);

/// Allocate a refcounted block with a `size`-byte payload.
///
/// The count starts at 1. Returns the payload pointer, which is
/// [`ALIGN`]-aligned and never null.
pub fn ref_alloc(size: usize) -> Result<*mut u8, AllocError> {
    let total = size
        .checked_add(HEADER_SIZE)
        .ok_or(AllocError::new(size))?;
    let base = alloc(total)?;

    // SAFETY: base is valid for total >= HEADER_SIZE bytes and ALIGN-aligned
    unsafe {
        base.cast::<Count>().write(1);
        Ok(base.add(HEADER_SIZE))
    }
}

#[inline]
unsafe fn header(payload: *const u8) -> *mut Count {
    // SAFETY: caller guarantees payload came from ref_alloc
    unsafe { payload.sub(HEADER_SIZE).cast::<Count>().cast_mut() }
}

/// Increment the count of a refcounted block.
///
/// # Safety
/// `payload` must have been returned by [`ref_alloc`] and still be live.
pub unsafe fn ref_inc(payload: *mut u8) {
    // SAFETY: forwarded caller contract
    unsafe {
        let count = header(payload);
        *count += 1;
    }
}

/// Decrement the count of a refcounted block.
///
/// When the count reaches zero `dtor` runs exactly once with the payload
/// pointer; it is responsible for releasing whatever the payload owns and
/// for freeing the block with [`ref_dealloc`]. Returns whether the block was
/// handed to `dtor`.
///
/// # Safety
/// `payload` must have been returned by [`ref_alloc`] and still be live, and
/// `dtor` must be safe to call on it.
pub unsafe fn ref_dec(payload: *mut u8, dtor: unsafe fn(*mut u8)) -> bool {
    // SAFETY: forwarded caller contract
    let released = unsafe {
        let count = header(payload);
        debug_assert!(*count > 0, "refcount underflow");
        *count -= 1;
        *count == 0
    };

    if released {
        tracing::trace!("refcount reached zero");
        // SAFETY: the count just hit zero, this is the only call
        unsafe { dtor(payload) };
    }
    released
}

/// Free a refcounted block with a `size`-byte payload.
///
/// Accounts for the header internally. Typically the last step of a
/// destructor passed to [`ref_dec`].
///
/// # Safety
/// `payload` must have been returned by [`ref_alloc`] with the same `size`
/// and must not be used afterwards.
pub unsafe fn ref_dealloc(payload: *mut u8, size: usize) {
    if payload.is_null() {
        return;
    }

    // SAFETY: forwarded caller contract, the block starts at the header
    unsafe { dealloc(header(payload).cast::<u8>(), size + HEADER_SIZE) };
}

/// Current count of a refcounted block (for testing and debugging).
///
/// # Safety
/// `payload` must have been returned by [`ref_alloc`] and still be live.
pub unsafe fn ref_count(payload: *const u8) -> usize {
    // SAFETY: forwarded caller contract
    unsafe { *header(payload) }
}
