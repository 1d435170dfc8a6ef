//! The x70 wire codec.
//!
//! A stream of tagged items. `'U'` opens an unsigned integer carried as a
//! 7-bit-per-byte varint; a value rides as `'U'` + name length + the
//! implementation's registered name + an implementation-defined body.
//! Decoding resolves names against the value-implementation registry, so
//! both ends agree on names, not numeric ids.

use alloc::sync::Arc;
use core::fmt;

use common::{read_uvarint, write_uvarint};
use config::pipes::ENCODING_GROWTH_INCREMENT;
use mutex::SpinNoIrqLock;
use value::{ValueMemory, Vref, value_implementation_named};

use crate::binary::ByteBuf;
use crate::{Encoding, EncodingRef, EncodingSink, print_into};

pub const X70_UINT_VALUE_BYTE: u8 = b'U';

pub struct X70Encoding {
    buf: SpinNoIrqLock<ByteBuf>,
}

impl X70Encoding {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            buf: SpinNoIrqLock::new(ByteBuf::new(None, ENCODING_GROWTH_INCREMENT)),
        })
    }

    /// Append `'U'` + uvarint.
    pub fn append_uint_value(&self, value: u32) -> bool {
        let mut buf = self.buf.lock();
        if !buf.append_byte(X70_UINT_VALUE_BYTE) {
            return false;
        }
        let mut ok = true;
        write_uvarint(value, |byte| {
            ok = buf.append_byte(byte);
            ok
        });
        ok
    }

    /// Read back what [`X70Encoding::append_uint_value`] produced:
    /// the integer and the exact byte count consumed, tag included.
    pub fn take_uint_value(bytes: &[u8]) -> Option<(u32, usize)> {
        match bytes.first() {
            Some(&X70_UINT_VALUE_BYTE) => {
                let (value, consumed) = read_uvarint(&bytes[1..])?;
                Some((value, consumed + 1))
            }
            _ => None,
        }
    }

    /// Serialize a value: envelope (`'U'` + name length + name) and then
    /// the implementation's body bytes.
    pub fn append_value(&self, vm: &ValueMemory, value: &Vref) -> bool {
        let Some(implementation) = vm.implementation_of(value) else {
            return false;
        };
        let name = implementation.name().as_bytes();
        if !self.append_uint_value(name.len() as u32) {
            return false;
        }
        if !self.append_bytes(name) {
            return false;
        }
        implementation.encode_x70_body(vm, value, &mut EncodingSink(self))
    }
}

/// Decode an x70 content stream into a value. Items decode in order; the
/// last one that resolves wins, and a stream with no resolvable item
/// yields the invalid reference.
pub fn x70_decoder(bytes: &[u8], offset: usize, vm: &ValueMemory) -> Vref {
    let mut out = Vref::Invalid;
    let mut at = offset;
    while at < bytes.len() {
        match bytes[at] {
            X70_UINT_VALUE_BYTE => {
                let Some((name_length, consumed)) = read_uvarint(&bytes[at + 1..]) else {
                    break;
                };
                at += 1 + consumed;
                let Some(name) = bytes.get(at..at + name_length as usize) else {
                    break;
                };
                at += name_length as usize;
                let Some((_, implementation)) = value_implementation_named(name) else {
                    // unknown implementation, cannot frame its body
                    log::debug!("x70: no implementation named {:?}", name);
                    break;
                };
                let Some((value, body_consumed)) =
                    implementation.decode_x70_body(vm, &bytes[at..])
                else {
                    break;
                };
                at += body_consumed;
                if value.is_valid() {
                    out = value;
                }
            }
            _ => break,
        }
    }
    out
}

impl Encoding for X70Encoding {
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
        self.buf.lock().reset()
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
        Some(X70Encoding::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use value::{int64_value, register_value_memory, text_value, unregister_value_memory};

    #[test]
    fn uint_round_trips_with_exact_consumption() {
        for u in [0u32, 1, 0x7f, 0x80, 300, 0xffff, 0x12345678, u32::MAX] {
            let e = X70Encoding::new();
            assert!(e.append_uint_value(u));
            let produced = e.content_to_vec();
            let (decoded, consumed) = X70Encoding::take_uint_value(&produced).unwrap();
            assert_eq!(decoded, u);
            assert_eq!(consumed, produced.len());
        }
    }

    #[test]
    fn uint_wire_shape() {
        let e = X70Encoding::new();
        e.append_uint_value(5);
        assert_eq!(e.content_to_vec(), alloc::vec![b'U', 5]);
    }

    #[test]
    fn value_round_trips_by_name() {
        let vm = ValueMemory::new(4096, 2);
        assert!(register_value_memory(&vm));

        let e = X70Encoding::new();
        let v = int64_value(&vm, -123456789);
        assert!(e.append_value(&vm, &v));

        let decoded = e.decode_to_io_value(&mut x70_decoder, &vm);
        assert!(decoded.is_valid());
        assert_eq!(value::int64_of(&vm, &decoded), Some(-123456789));

        unregister_value_memory(2);
    }

    #[test]
    fn last_item_wins_and_unknown_names_stop_the_parse(){
        let vm = ValueMemory::new(4096, 3);
        assert!(register_value_memory(&vm));

        let e = X70Encoding::new();
        e.append_value(&vm, &int64_value(&vm, 1));
        e.append_value(&vm, &text_value(&vm, b"two"));
        let decoded = e.decode_to_io_value(&mut x70_decoder, &vm);
        let text = vm.with_value_ro(&decoded, |b| b.to_vec()).unwrap();
        assert_eq!(text, b"two");

        // an unresolvable name aborts without poisoning earlier items
        let bad = X70Encoding::new();
        bad.append_value(&vm, &int64_value(&vm, 9));
        bad.append_uint_value(7);
        bad.append_bytes(b"unknown");
        let decoded = bad.decode_to_io_value(&mut x70_decoder, &vm);
        assert_eq!(value::int64_of(&vm, &decoded), Some(9));

        unregister_value_memory(3);
    }

    #[test]
    fn garbage_decodes_to_invalid() {
        let vm = ValueMemory::new(1024, 4);
        assert!(register_value_memory(&vm));
        let e = X70Encoding::new();
        e.append_bytes(b"not an x70 stream");
        assert!(e.decode_to_io_value(&mut x70_decoder, &vm).is_invalid());
        unregister_value_memory(4);
    }
}
