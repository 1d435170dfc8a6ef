//! The growable byte-buffer encoding every stream format builds on.

use alloc::sync::Arc;
use core::fmt;

use config::pipes::{ENCODING_GROWTH_INCREMENT, ENCODING_INITIAL_SIZE};
use mutex::SpinNoIrqLock;

use crate::{Encoding, EncodingRef, print_into};

/// Buffer state shared by the buffer-backed encodings. Room (`capacity`)
/// and content (`bytes.len()`) are tracked separately so growth policy
/// stays what the caller configured rather than whatever the allocator
/// rounds to.
pub(crate) struct ByteBuf {
    bytes: alloc::vec::Vec<u8>,
    capacity: usize,
    limit: Option<usize>,
    grow_increment: usize,
    decode_offset: usize,
}

impl ByteBuf {
    pub(crate) fn new(limit: Option<usize>, grow_increment: usize) -> Self {
        Self {
            bytes: alloc::vec::Vec::with_capacity(ENCODING_INITIAL_SIZE),
            capacity: ENCODING_INITIAL_SIZE,
            limit,
            grow_increment,
            decode_offset: 0,
        }
    }

    fn may_take_more(&self) -> bool {
        self.limit.map_or(true, |limit| self.bytes.len() < limit)
    }

    pub(crate) fn grow(&mut self, increment: usize) -> bool {
        self.capacity += increment;
        self.bytes.reserve(self.capacity - self.bytes.len());
        true
    }

    pub(crate) fn append_byte(&mut self, byte: u8) -> bool {
        if self.bytes.len() == self.capacity && self.may_take_more() {
            self.grow(self.grow_increment);
        }
        if self.bytes.len() < self.capacity && self.may_take_more() {
            self.bytes.push(byte);
            true
        } else {
            false
        }
    }

    pub(crate) fn append_bytes(&mut self, bytes: &[u8]) -> bool {
        for &byte in bytes {
            if !self.append_byte(byte) {
                return false;
            }
        }
        true
    }

    pub(crate) fn fill(&mut self, byte: u8, count: usize) -> usize {
        let needed = self.bytes.len() + count;
        if needed > self.capacity {
            if !self.may_take_more() {
                return 0;
            }
            self.grow(needed - self.capacity + self.grow_increment);
        }
        self.bytes.resize(needed, byte);
        count
    }

    pub(crate) fn pop_last_byte(&mut self) -> Option<u8> {
        self.bytes.pop()
    }

    pub(crate) fn reset(&mut self) {
        self.bytes.clear();
        self.decode_offset = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub(crate) fn grow_increment_value(&self) -> usize {
        self.grow_increment
    }

    pub(crate) fn content(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn decode_offset(&self) -> usize {
        self.decode_offset
    }

    pub(crate) fn increment_decode_offset(&mut self, by: usize) -> usize {
        self.decode_offset += by;
        self.decode_offset
    }
}

/// Plain binary stream.
pub struct BinaryEncoding {
    pub(crate) buf: SpinNoIrqLock<ByteBuf>,
}

impl BinaryEncoding {
    pub fn new() -> Arc<Self> {
        Self::with_limit(None, ENCODING_GROWTH_INCREMENT)
    }

    /// A stream refusing to hold more than `limit` content bytes.
    pub fn with_limit(limit: Option<usize>, grow_increment: usize) -> Arc<Self> {
        Arc::new(Self {
            buf: SpinNoIrqLock::new(ByteBuf::new(limit, grow_increment)),
        })
    }
}

impl Encoding for BinaryEncoding {
    fn length(&self) -> usize {
        self.buf.lock().len()
    }

    fn limit(&self) -> Option<usize> {
        self.buf.lock().limit()
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
        Some(BinaryEncoding::with_limit(
            self.limit(),
            self.grow_increment(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Encoding;

    #[test]
    fn append_then_content_returns_the_bytes_in_order() {
        let e = BinaryEncoding::new();
        assert!(e.append_bytes(b"gook"));
        assert!(e.append_byte(b'!'));
        assert_eq!(e.content_to_vec(), b"gook!");
        assert_eq!(e.length(), 5);
    }

    #[test]
    fn pop_last_byte_unwinds_the_tail() {
        let e = BinaryEncoding::new();
        e.append_bytes(b"ab");
        assert_eq!(e.pop_last_byte(), Some(b'b'));
        assert_eq!(e.pop_last_byte(), Some(b'a'));
        assert_eq!(e.pop_last_byte(), None);
    }

    #[test]
    fn growth_crosses_the_initial_capacity() {
        let e = BinaryEncoding::new();
        let big: alloc::vec::Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
        assert!(e.append_bytes(&big));
        assert_eq!(e.length(), 1000);
        assert_eq!(e.content_to_vec(), big);
    }

    #[test]
    fn limit_caps_content() {
        let e = BinaryEncoding::with_limit(Some(4), 16);
        assert!(e.append_bytes(b"abcd"));
        assert!(!e.append_byte(b'e'));
        assert_eq!(e.length(), 4);
        assert_eq!(e.limit(), Some(4));
    }

    #[test]
    fn fill_writes_n_copies() {
        let e = BinaryEncoding::new();
        e.append_byte(b'x');
        assert_eq!(e.fill(0xee, 200), 200);
        let content = e.content_to_vec();
        assert_eq!(content.len(), 201);
        assert!(content[1..].iter().all(|&b| b == 0xee));
    }

    #[test]
    fn fill_respects_the_limit() {
        let e = BinaryEncoding::with_limit(Some(8), 4);
        e.fill(1, 8);
        assert_eq!(e.fill(2, 100), 0, "filling past the limit writes nothing");
        assert_eq!(e.length(), 8);
    }

    #[test]
    fn reset_empties_without_losing_configuration() {
        let e = BinaryEncoding::with_limit(Some(100), 32);
        e.append_bytes(b"data");
        e.increment_decode_offset(2);
        e.reset();
        assert_eq!(e.length(), 0);
        assert_eq!(e.decode_offset(), 0);
        assert_eq!(e.grow_increment(), 32);
    }

    #[test]
    fn decode_offset_advances() {
        let e = BinaryEncoding::new();
        assert_eq!(e.increment_decode_offset(3), 3);
        assert_eq!(e.increment_decode_offset(2), 5);
        assert_eq!(e.decode_offset(), 5);
    }
}
