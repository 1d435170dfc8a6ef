#![cfg_attr(not(test), no_std)]

//! The byte memory: a deterministic heap of fixed-size blocks.
//!
//! Allocation is best-fit over a doubly-linked free list; freeing coalesces
//! with both neighbors so two adjacent free blocks never exist. The design
//! is meant for interrupt-driven firmware: every mutator runs bracketed by
//! the critical-section lock, block indices fit in 15 bits, and all work is
//! bounded by the free-list length.
//!
//! Callers hold block-aligned byte *offsets* into the arena rather than
//! pointers; an offset stays valid until it is freed, and the arena itself
//! never moves.

extern crate alloc;

mod heap;

pub use heap::{FreeStatus, UmmHeap};

use mutex::SpinNoIrqLock;
use systype::MemoryInfo;

/// An [`UmmHeap`] behind the critical-section lock.
///
/// This is the shape the rest of the runtime consumes: value memories own
/// one, diagnostics read `info()`, and the garbage collector walks the
/// allocation list through `incremental_iterate`.
pub struct ByteMemory {
    heap: SpinNoIrqLock<UmmHeap>,
}

impl ByteMemory {
    /// Create an arena of `size` bytes divided into `1 << block_size_bits`
    /// byte blocks. See `config::mem` for the supported block sizes.
    pub fn new(size: usize, block_size_bits: u32) -> Self {
        log::debug!(
            "byte memory: {} blocks of {} bytes",
            size >> block_size_bits,
            1usize << block_size_bits
        );
        Self {
            heap: SpinNoIrqLock::new(UmmHeap::new(size, block_size_bits)),
        }
    }

    pub fn allocate(&self, size: usize) -> Option<u32> {
        self.heap.lock().allocate(size)
    }

    pub fn allocate_and_zero(&self, size: usize) -> Option<u32> {
        let mut heap = self.heap.lock();
        let offset = heap.allocate(size)?;
        heap.bytes_mut(offset, size).fill(0);
        Some(offset)
    }

    pub fn free(&self, offset: u32) -> FreeStatus {
        self.heap.lock().free(offset)
    }

    pub fn reallocate(&self, offset: u32, new_size: usize) -> Option<u32> {
        self.heap.lock().reallocate(offset, new_size)
    }

    pub fn info(&self) -> MemoryInfo {
        self.heap.lock().info()
    }

    pub fn block_size(&self) -> usize {
        self.heap.lock().block_size()
    }

    /// Read access to `len` bytes of an allocation starting at `offset`.
    pub fn with_bytes<R>(&self, offset: u32, len: usize, f: impl FnOnce(&[u8]) -> R) -> R {
        let heap = self.heap.lock();
        f(heap.bytes(offset, len))
    }

    /// Write access to `len` bytes of an allocation starting at `offset`.
    pub fn with_bytes_mut<R>(&self, offset: u32, len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut heap = self.heap.lock();
        f(heap.bytes_mut(offset, len))
    }

    /// Visit every allocated span as `(offset, span_bytes)`; stop when the
    /// callback returns false.
    pub fn iterate_allocations(&self, f: impl FnMut(u32, usize) -> bool) {
        self.heap.lock().iterate_allocations(f)
    }

    /// Resumable walk of the allocation list. The cursor starts at 0, is
    /// advanced by each call, and returns to 0 once a full cycle completes;
    /// repeated calls eventually visit every allocation even while blocks
    /// come and go between calls.
    pub fn incremental_iterate(&self, cursor: &mut u16, f: impl FnMut(u32) -> bool) {
        self.heap.lock().incremental_iterate(cursor, f)
    }

    /// Run `f` against the raw heap under the critical-section lock. The
    /// garbage collector uses this to inspect headers while it walks the
    /// allocation list.
    pub fn with_heap<R>(&self, f: impl FnOnce(&UmmHeap) -> R) -> R {
        f(&self.heap.lock())
    }

    /// Mutable companion of [`ByteMemory::with_heap`].
    pub fn with_heap_mut<R>(&self, f: impl FnOnce(&mut UmmHeap) -> R) -> R {
        f(&mut self.heap.lock())
    }
}
