// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2024.

//! Wrapper type for pointers to memory-mapped register blocks.

use core::ops::Deref;
use core::ptr::NonNull;

/// A pointer to a statically placed register block.
///
/// Peripheral instances are declared as `const` values of this type, one per
/// base address. Dereferencing yields a shared reference to the register
/// struct; all register types use interior mutability, so `&T` is enough to
/// read and write the hardware.
#[derive(Debug)]
pub struct StaticRef<T> {
    ptr: NonNull<T>,
}

impl<T> StaticRef<T> {
    /// Create a new `StaticRef` from a raw pointer.
    ///
    /// ## Safety
    ///
    /// The pointer must be non-null, aligned for `T` and valid for the whole
    /// program. Register types have no invalid bit patterns, so any address
    /// of the memory map satisfies the last point.
    pub const unsafe fn new(ptr: *const T) -> StaticRef<T> {
        StaticRef {
            ptr: NonNull::new_unchecked(ptr.cast_mut()),
        }
    }

    /// Address of the register block.
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl<T> Clone for StaticRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StaticRef<T> {}

impl<T> Deref for StaticRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: `new` requires a pointer valid for the program lifetime.
        unsafe { self.ptr.as_ref() }
    }
}

// Register blocks are shared hardware. Access ordering is the driver's job.
unsafe impl<T> Sync for StaticRef<T> {}
unsafe impl<T> Send for StaticRef<T> {}

#[cfg(test)]
mod tests {
    use super::StaticRef;
    use core::cell::Cell;

    #[test]
    fn deref_reads_through_pointer() {
        let cell = std::boxed::Box::leak(std::boxed::Box::new(Cell::new(7u32)));
        let r = unsafe { StaticRef::new(cell as *const Cell<u32>) };
        let copy = r;
        copy.set(11);
        assert_eq!(r.get(), 11);
        assert_eq!(r.addr(), copy.addr());
    }

    #[test]
    fn address_is_preserved() {
        let r: StaticRef<u32> = unsafe { StaticRef::new(0x4002_1000 as *const u32) };
        assert_eq!(r.addr(), 0x4002_1000);
    }
}
