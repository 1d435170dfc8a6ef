//! The garbage-collected value memory.

use alloc::sync::Arc;

use bytemem::ByteMemory;
use config::mem::{BLOCK_SIZE_1N, GC_BATCH_LENGTH};
use lazy_static::lazy_static;
use mutex::SpinNoIrqLock;
use systype::MemoryInfo;

use crate::implementation::{ValueImplementation, value_implementation};
use crate::vref::Vref;

/// impl id (u16) + reference count (u16) + payload length (u32).
const VALUE_HEADER_BYTES: usize = 8;

/// Memory ids fit the 3-bit field of a heap reference.
pub const MAX_VALUE_MEMORIES: usize = 8;

lazy_static! {
    static ref MEMORIES: SpinNoIrqLock<[Option<Arc<ValueMemory>>; MAX_VALUE_MEMORIES]> =
        SpinNoIrqLock::new([const { None }; MAX_VALUE_MEMORIES]);
}

/// Make a memory reachable from heap references carrying its id. False if
/// the id is taken or out of range.
pub fn register_value_memory(vm: &Arc<ValueMemory>) -> bool {
    let mut memories = MEMORIES.lock();
    let slot = vm.id() as usize;
    if slot >= MAX_VALUE_MEMORIES || memories[slot].is_some() {
        return false;
    }
    memories[slot] = Some(vm.clone());
    true
}

pub fn unregister_value_memory(id: u8) {
    let mut memories = MEMORIES.lock();
    if let Some(slot) = memories.get_mut(id as usize) {
        *slot = None;
    }
}

pub fn value_memory_by_id(id: u8) -> Option<Arc<ValueMemory>> {
    MEMORIES.lock().get(id as usize)?.clone()
}

struct GcState {
    cursor: u16,
}

/// A pool of values carved out of a dedicated byte memory.
///
/// Values are prefixed by an 8-byte header and handed out as heap-flavored
/// references. `do_gc` sweeps the underlying allocation list a bounded
/// batch at a time, so a single call does a little work and repeated calls
/// cover the whole heap.
pub struct ValueMemory {
    bm: ByteMemory,
    id: u8,
    gc: SpinNoIrqLock<GcState>,
}

impl ValueMemory {
    /// A value memory of `size` bytes with the given 3-bit id. The memory
    /// must be registered before heap references into it can resolve.
    pub fn new(size: usize, id: u8) -> Arc<Self> {
        Arc::new(Self {
            bm: ByteMemory::new(size, BLOCK_SIZE_1N),
            id,
            gc: SpinNoIrqLock::new(GcState { cursor: 0 }),
        })
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn get_info(&self) -> MemoryInfo {
        self.bm.info()
    }

    /// Heap value memories are reclaimed by sweep, not preserved across
    /// power cycles.
    pub fn is_persistent(&self) -> bool {
        false
    }

    /// Allocate an uninitialised value. The returned reference owns one
    /// count; when every clone is gone the value becomes collectable.
    pub fn allocate_value(&self, implementation_id: u16, size: usize) -> Vref {
        let Some(offset) = self.bm.allocate_and_zero(VALUE_HEADER_BYTES + size) else {
            return Vref::Invalid;
        };
        self.bm.with_bytes_mut(offset, VALUE_HEADER_BYTES, |header| {
            header[0..2].copy_from_slice(&implementation_id.to_le_bytes());
            header[2..4].copy_from_slice(&1u16.to_le_bytes());
            header[4..8].copy_from_slice(&(size as u32).to_le_bytes());
        });
        Vref::heap(self.id, offset)
    }

    /// Allocate and initialise through the implementation; rolls back to
    /// the invalid reference when initialisation refuses.
    pub fn new_value(
        &self,
        implementation: &'static dyn ValueImplementation,
        implementation_id: u16,
        size: usize,
        base: &Vref,
    ) -> Vref {
        let value = self.allocate_value(implementation_id, size);
        if value.is_invalid() {
            return Vref::Invalid;
        }
        if !implementation.initialise(self, &value, base) {
            return Vref::Invalid; // dropping the only count leaves it to the sweep
        }
        value
    }

    /// The implementation of the value a reference names.
    pub fn implementation_of(&self, value: &Vref) -> Option<&'static dyn ValueImplementation> {
        let offset = value.byte_offset()?;
        let id = self
            .bm
            .with_bytes(offset, VALUE_HEADER_BYTES, |header| {
                u16::from_le_bytes([header[0], header[1]])
            });
        value_implementation(id)
    }

    pub fn reference_count_of(&self, value: &Vref) -> Option<u16> {
        let offset = value.byte_offset()?;
        Some(self.bm.with_bytes(offset, VALUE_HEADER_BYTES, |header| {
            u16::from_le_bytes([header[2], header[3]])
        }))
    }

    pub(crate) fn reference_word(&self, word: u32) {
        let offset = word << 3;
        self.bm.with_bytes_mut(offset, VALUE_HEADER_BYTES, |header| {
            let count = u16::from_le_bytes([header[2], header[3]]);
            header[2..4].copy_from_slice(&count.saturating_add(1).to_le_bytes());
        });
    }

    pub(crate) fn unreference_word(&self, word: u32) {
        let offset = word << 3;
        self.bm.with_bytes_mut(offset, VALUE_HEADER_BYTES, |header| {
            let count = u16::from_le_bytes([header[2], header[3]]);
            if count == 0 {
                log::warn!("value at {:#x} unreferenced below zero", offset);
            } else {
                header[2..4].copy_from_slice(&(count - 1).to_le_bytes());
            }
        });
    }

    /// Read access to a value's payload.
    pub fn with_value_ro<R>(&self, value: &Vref, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let offset = value.byte_offset()?;
        let length = self.bm.with_bytes(offset, VALUE_HEADER_BYTES, |header| {
            u32::from_le_bytes([header[4], header[5], header[6], header[7]])
        }) as usize;
        Some(
            self.bm
                .with_bytes(offset + VALUE_HEADER_BYTES as u32, length, f),
        )
    }

    /// Write access to a value's payload.
    pub fn with_value_rw<R>(&self, value: &Vref, f: impl FnOnce(&mut [u8]) -> R) -> Option<R> {
        let offset = value.byte_offset()?;
        let length = self.bm.with_bytes(offset, VALUE_HEADER_BYTES, |header| {
            u32::from_le_bytes([header[4], header[5], header[6], header[7]])
        }) as usize;
        Some(
            self.bm
                .with_bytes_mut(offset + VALUE_HEADER_BYTES as u32, length, f),
        )
    }

    /// One garbage-collection step: walk the allocation list gathering up
    /// to [`GC_BATCH_LENGTH`] values whose count is zero and free them.
    /// `count` bounds the number of passes; negative means run until a
    /// pass finds nothing.
    pub fn do_gc(&self, count: i32) {
        let mut remaining = if count < 0 { i32::MAX } else { count };
        let mut gc = self.gc.lock();

        while remaining > 0 {
            let mut batch = [0u32; GC_BATCH_LENGTH];
            let mut found = 0usize;

            self.bm.with_heap(|heap| {
                heap.incremental_iterate(&mut gc.cursor, |offset| {
                    let header = heap.bytes(offset, VALUE_HEADER_BYTES);
                    if u16::from_le_bytes([header[2], header[3]]) == 0 {
                        batch[found] = offset;
                        found += 1;
                    }
                    found < GC_BATCH_LENGTH
                });
            });

            for &offset in &batch[..found] {
                self.bm.free(offset);
            }

            if found == 0 {
                break;
            }
            remaining -= 1;
        }
    }
}
