//! Base allocator with per-thread accounting.

use std::alloc::Layout;
use std::cell::Cell;
use std::ptr;

use crate::config;
use crate::AllocError;

/// Minimum alignment of every block handed out by this crate.
pub const ALIGN: usize = 8;

/// Allocation counters for the current thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemStats {
    /// Bytes currently allocated and not yet released.
    pub live_bytes: usize,
    /// Highest value `live_bytes` has reached.
    pub peak_bytes: usize,
    /// Number of successful allocations.
    ///
    /// A reallocation counts as one allocation and one deallocation, so
    /// `allocations - deallocations` is the number of live blocks.
    pub allocations: usize,
    /// Number of blocks released.
    pub deallocations: usize,
}

thread_local! {
    static STATS: Cell<MemStats> = const {
        Cell::new(MemStats {
            live_bytes: 0,
            peak_bytes: 0,
            allocations: 0,
            deallocations: 0,
        })
    };
}

/// Snapshot of the allocation counters for the current thread.
pub fn stats() -> MemStats {
    STATS.with(Cell::get)
}

/// Check a request of `extra` additional bytes against the configured limit.
fn admit(extra: usize) -> Result<(), AllocError> {
    let live = stats().live_bytes;
    let Some(limit) = config::limit() else {
        return Ok(());
    };

    match live.checked_add(extra) {
        Some(total) if total <= limit => Ok(()),
        _ => {
            tracing::warn!(requested = extra, live, limit, "allocation refused by limit");
            Err(AllocError::new(extra))
        }
    }
}

fn record(grown: usize, shrunk: usize, allocations: usize, deallocations: usize) {
    STATS.with(|cell| {
        let mut s = cell.get();
        s.live_bytes = s.live_bytes.saturating_add(grown).saturating_sub(shrunk);
        s.peak_bytes = s.peak_bytes.max(s.live_bytes);
        s.allocations = s.allocations.saturating_add(allocations);
        s.deallocations = s.deallocations.saturating_add(deallocations);
        cell.set(s);
    });
}

#[inline]
fn layout(size: usize) -> Result<Layout, AllocError> {
    Layout::from_size_align(size, ALIGN).map_err(|_| AllocError::new(size))
}

/// Allocate `size` bytes of uninitialized memory.
///
/// Returns a null pointer for a zero-size request without allocating.
/// The block is at least [`ALIGN`]-byte aligned.
pub fn alloc(size: usize) -> Result<*mut u8, AllocError> {
    if size == 0 {
        return Ok(ptr::null_mut());
    }

    admit(size)?;
    let layout = layout(size)?;

    // SAFETY: layout has non-zero size and a power-of-two alignment
    let block = unsafe { std::alloc::alloc(layout) };
    if block.is_null() {
        tracing::warn!(size, "host allocator exhausted");
        return Err(AllocError::new(size));
    }

    debug_assert_eq!(block as usize & (ALIGN - 1), 0, "block must be ALIGN-aligned");
    record(size, 0, 1, 0);
    tracing::trace!(size, "alloc");
    Ok(block)
}

/// Resize a block from `old_size` to `new_size` bytes.
///
/// Contents are preserved up to the smaller of both sizes. A null `block`
/// behaves like [`alloc`]; a zero `new_size` releases the block and returns
/// null. On failure the original block is untouched and still owned by the
/// caller.
///
/// # Safety
/// `block` must be null or have been returned by this crate's allocator with
/// exactly `old_size` bytes, and must not be used after a successful call.
pub unsafe fn realloc(
    block: *mut u8,
    old_size: usize,
    new_size: usize,
) -> Result<*mut u8, AllocError> {
    if block.is_null() || old_size == 0 {
        return alloc(new_size);
    }

    if new_size == 0 {
        // SAFETY: forwarded caller contract
        unsafe { dealloc(block, old_size) };
        return Ok(ptr::null_mut());
    }

    if new_size > old_size {
        admit(new_size - old_size)?;
    }
    let old_layout = layout(old_size)?;
    layout(new_size)?;

    // SAFETY: caller guarantees block was allocated with old_layout,
    // new_size is non-zero and forms a valid layout
    let moved = unsafe { std::alloc::realloc(block, old_layout, new_size) };
    if moved.is_null() {
        tracing::warn!(old_size, new_size, "host allocator exhausted on realloc");
        return Err(AllocError::new(new_size));
    }

    debug_assert_eq!(moved as usize & (ALIGN - 1), 0, "block must be ALIGN-aligned");
    record(new_size, old_size, 1, 1);
    tracing::trace!(old_size, new_size, "realloc");
    Ok(moved)
}

/// Release a block of `size` bytes.
///
/// Null pointers and zero sizes are ignored.
///
/// # Safety
/// `block` must be null or have been returned by this crate's allocator with
/// exactly `size` bytes, and must not be used afterwards.
pub unsafe fn dealloc(block: *mut u8, size: usize) {
    if block.is_null() || size == 0 {
        return;
    }

    let Ok(layout) = layout(size) else {
        return;
    };

    // SAFETY: caller guarantees block was allocated with this layout
    unsafe { std::alloc::dealloc(block, layout) };
    record(0, size, 0, 1);
    tracing::trace!(size, "dealloc");
}
