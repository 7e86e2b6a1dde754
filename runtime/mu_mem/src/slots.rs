//! Fixed-capacity buffers of initialized slots.
//!
//! `Slots<T>` is the backing array of a table: a block from the base
//! allocator holding exactly `capacity` values of `T`, every one of them
//! initialized (to `T::default()` when fresh). Unlike `Vec`, both creation
//! and growth are fallible and report [`AllocError`] instead of aborting.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::alloc::{alloc, dealloc, realloc, ALIGN};
use crate::AllocError;

/// A block of `capacity` initialized `T`s.
pub struct Slots<T> {
    ptr: NonNull<T>,
    cap: usize,
    _marker: PhantomData<T>,
}

fn bytes_for<T>(cap: usize) -> Result<usize, AllocError> {
    mem::size_of::<T>()
        .checked_mul(cap)
        .ok_or(AllocError::new(usize::MAX))
}

impl<T: Default> Slots<T> {
    const LAYOUT_OK: () = assert!(
        mem::align_of::<T>() <= ALIGN && mem::size_of::<T>() > 0,
        "slot type must be sized and fit the allocator alignment"
    );

    /// A buffer with no capacity. Does not allocate.
    #[inline]
    pub fn empty() -> Self {
        Slots {
            ptr: NonNull::dangling(),
            cap: 0,
            _marker: PhantomData,
        }
    }

    /// Allocate `cap` slots, each set to `T::default()`.
    pub fn new(cap: usize) -> Result<Self, AllocError> {
        let () = Self::LAYOUT_OK;
        let raw = alloc(bytes_for::<T>(cap)?)?;
        let Some(ptr) = NonNull::new(raw.cast::<T>()) else {
            return Ok(Self::empty());
        };

        // SAFETY: the block holds cap values of T, each written exactly once
        unsafe {
            for i in 0..cap {
                ptr.as_ptr().add(i).write(T::default());
            }
        }

        Ok(Slots {
            ptr,
            cap,
            _marker: PhantomData,
        })
    }

    /// Grow the buffer in place (reallocating) to `cap` slots.
    ///
    /// Existing slots keep their values; new slots are `T::default()`.
    /// Requests not larger than the current capacity are a no-op. On failure
    /// the buffer is unchanged.
    pub fn grow(&mut self, cap: usize) -> Result<(), AllocError> {
        if cap <= self.cap {
            return Ok(());
        }
        if self.cap == 0 {
            *self = Self::new(cap)?;
            return Ok(());
        }

        let old_size = bytes_for::<T>(self.cap)?;
        let new_size = bytes_for::<T>(cap)?;

        // SAFETY: ptr/old_size describe the block this buffer owns; values
        // of T may be moved bitwise by the reallocation
        let raw = unsafe { realloc(self.ptr.as_ptr().cast::<u8>(), old_size, new_size)? };
        let Some(ptr) = NonNull::new(raw.cast::<T>()) else {
            return Err(AllocError::new(new_size));
        };

        // SAFETY: slots old_cap..cap are inside the new block and uninitialized
        unsafe {
            for i in self.cap..cap {
                ptr.as_ptr().add(i).write(T::default());
            }
        }

        self.ptr = ptr;
        self.cap = cap;
        Ok(())
    }
}

impl<T> Slots<T> {
    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }
}

impl<T> Deref for Slots<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        // SAFETY: ptr is valid for cap initialized values (or dangling with cap 0)
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.cap) }
    }
}

impl<T> DerefMut for Slots<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: ptr is valid for cap initialized values (or dangling with cap 0)
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.cap) }
    }
}

impl<T> Drop for Slots<T> {
    fn drop(&mut self) {
        if self.cap == 0 {
            return;
        }

        let size = mem::size_of::<T>() * self.cap;
        // SAFETY: every slot is initialized and dropped once, then the block
        // is released with the size it was allocated with
        unsafe {
            std::ptr::drop_in_place(std::ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.cap,
            ));
            dealloc(self.ptr.as_ptr().cast::<u8>(), size);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Slots<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests;
