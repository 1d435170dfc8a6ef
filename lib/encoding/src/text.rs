//! Human-readable encoding of values.

use alloc::sync::Arc;
use core::fmt;

use config::pipes::ENCODING_GROWTH_INCREMENT;
use mutex::SpinNoIrqLock;
use table::RefSet;
use value::{ValueMemory, Vref};

use crate::binary::ByteBuf;
use crate::{Encoding, EncodingRef, EncodingSink, print_into};

/// A binary encoding that knows it is carrying text.
///
/// Printing a value may recurse through containers that reach themselves;
/// the lazily created `visited` set holds a reference to everything
/// already printed so a cycle renders as an ellipsis instead of looping.
pub struct TextEncoding {
    buf: SpinNoIrqLock<ByteBuf>,
    visited: SpinNoIrqLock<Option<RefSet<Vref>>>,
}

impl TextEncoding {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            buf: SpinNoIrqLock::new(ByteBuf::new(None, ENCODING_GROWTH_INCREMENT)),
            visited: SpinNoIrqLock::new(None),
        })
    }

    /// Feed the content a character position at a time. Bytes of
    /// multi-byte sequences are handed through unchanged, one per call.
    pub fn iterate_characters(&self, mut f: impl FnMut(u8) -> bool) -> bool {
        let mut ok = true;
        self.with_content(&mut |bytes| {
            for &byte in bytes {
                if !f(byte) {
                    ok = false;
                    break;
                }
            }
        });
        ok
    }

    /// Render a value, cycle-safe.
    pub fn print_value(&self, vm: &ValueMemory, value: &Vref) -> bool {
        let first_visit = {
            let mut visited = self.visited.lock();
            visited
                .get_or_insert_with(|| RefSet::new(17))
                .insert(value.clone())
        };
        if !first_visit {
            return self.append_bytes(b"...");
        }
        let Some(implementation) = vm.implementation_of(value) else {
            return false;
        };
        implementation.encode_text(vm, value, &mut EncodingSink(self))
    }
}

impl Encoding for TextEncoding {
    fn length(&self) -> usize {
        self.buf.lock().len()
    }

    fn grow_increment(&self) -> usize {
        self.buf.lock().grow_increment_value()
    }

    fn grow(&self, increment: usize) -> bool {
        self.buf.lock().grow(increment)
    }

    fn reset(&self) {
        self.buf.lock().reset();
        *self.visited.lock() = None;
    }

    fn append_byte(&self, byte: u8) -> bool {
        self.buf.lock().append_byte(byte)
    }

    fn append_bytes(&self, bytes: &[u8]) -> bool {
        self.buf.lock().append_bytes(bytes)
    }

    fn pop_last_byte(&self) -> Option<u8> {
        self.buf.lock().pop_last_byte()
    }

    fn fill(&self, byte: u8, count: usize) -> usize {
        self.buf.lock().fill(byte, count)
    }

    fn with_content(&self, f: &mut dyn FnMut(&[u8])) {
        f(self.buf.lock().content())
    }

    fn decode_offset(&self) -> usize {
        self.buf.lock().decode_offset()
    }

    fn increment_decode_offset(&self, by: usize) -> usize {
        self.buf.lock().increment_decode_offset(by)
    }

    fn print(&self, args: fmt::Arguments) -> bool {
        print_into(self, args)
    }

    fn duplicate_empty(&self) -> Option<EncodingRef> {
        Some(TextEncoding::new())
    }
}
