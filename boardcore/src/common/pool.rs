//! Init-time memory pool.
//!
//! The CH32V203 has 20 KiB of SRAM; the scheduler carves its timer and
//! command buffers out of one fixed arena reserved here instead of
//! linking an allocator. Allocations only happen during init on a
//! single core, nothing is ever freed.

use core::cell::{Cell, UnsafeCell};
use core::ptr::NonNull;

pub struct MemPool<const N: usize> {
    arena: UnsafeCell<[u8; N]>,
    next: Cell<usize>,
}

// Single core, allocations happen before the scheduler starts.
unsafe impl<const N: usize> Sync for MemPool<N> {}

impl<const N: usize> MemPool<N> {
    pub const fn new() -> Self {
        Self {
            arena: UnsafeCell::new([0; N]),
            next: Cell::new(0),
        }
    }

    /// Carve `size` bytes out of the arena at the given alignment.
    /// Returns `None` once the pool is exhausted or for an `align`
    /// that is not a power of two; whether that is fatal is the
    /// caller's call.
    pub fn alloc(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if !align.is_power_of_two() {
            return None;
        }
        let base = self.arena.get() as usize;
        let start = (base + self.next.get()).checked_add(align - 1)? & !(align - 1);
        let offset = start - base;
        if size > N || offset > N - size {
            return None;
        }
        self.next.set(offset + size);
        NonNull::new((base + offset) as *mut u8)
    }

    /// Bytes still available, ignoring future alignment padding.
    pub fn available(&self) -> usize {
        N - self.next.get()
    }
}

impl<const N: usize> Default for MemPool<N> {
    fn default() -> Self {
        Self::new()
    }
}
