#![cfg_attr(not(test), no_std)]

//! Encodings: byte streams under construction and interpretation.
//!
//! Every message the runtime builds, prints, or parses lives in an
//! encoding. Ownership is the reference count of the `Arc` handle: pipes,
//! sockets and handlers clone the handle to keep a message alive and drop
//! it to let go, and the last drop frees the buffer.

extern crate alloc;

mod binary;
mod null;
mod numeric;
mod text;
mod x70;

pub use binary::BinaryEncoding;
pub use null::NullEncoding;
pub use numeric::{Float64Encoding, Int64Encoding};
pub use text::TextEncoding;
pub use x70::{X70_UINT_VALUE_BYTE, X70Encoding, x70_decoder};

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use downcast_rs::{Downcast, impl_downcast};
use value::{ValueMemory, ValueSink, Vref};

pub type EncodingRef = Arc<dyn Encoding>;

/// Pipes carry whole messages by reference; put clones the handle in,
/// get moves it out to the receiver.
pub type EncodingPipe = pipe::Pipe<EncodingRef>;

/// A decoder interprets an encoding's content, from its decode offset,
/// into a value.
pub type ValueDecoder<'a> = &'a mut dyn FnMut(&[u8], usize, &ValueMemory) -> Vref;

/// The encoding contract.
///
/// Byte-buffer operations default to the refusing/empty behavior so that
/// value-bearing and placeholder encodings implement only what they have;
/// buffer-backed encodings override the lot.
pub trait Encoding: Downcast + Send + Sync {
    /// Bytes of content accumulated so far.
    fn length(&self) -> usize;

    /// Max content length, `None` for unbounded.
    fn limit(&self) -> Option<usize> {
        None
    }

    fn grow_increment(&self) -> usize {
        0
    }

    /// Extend buffer room by `increment` bytes.
    fn grow(&self, _increment: usize) -> bool {
        false
    }

    fn reset(&self) {}

    fn append_byte(&self, _byte: u8) -> bool {
        false
    }

    fn append_bytes(&self, _bytes: &[u8]) -> bool {
        false
    }

    fn pop_last_byte(&self) -> Option<u8> {
        None
    }

    /// Append `count` copies of `byte`; returns how many were written.
    fn fill(&self, _byte: u8, _count: usize) -> usize {
        0
    }

    /// Run `f` over the accumulated content.
    fn with_content(&self, f: &mut dyn FnMut(&[u8])) {
        f(&[])
    }

    fn decode_offset(&self) -> usize {
        0
    }

    /// Advance the decode cursor, returning the new offset.
    fn increment_decode_offset(&self, _by: usize) -> usize {
        0
    }

    /// Render formatted text into the encoding.
    fn print(&self, _args: fmt::Arguments) -> bool {
        false
    }

    /// Interpret the content as a value using `decoder`.
    fn decode_to_io_value(&self, decoder: ValueDecoder<'_>, vm: &ValueMemory) -> Vref {
        let mut out = Vref::Invalid;
        let offset = self.decode_offset();
        self.with_content(&mut |bytes| {
            out = decoder(bytes, offset, vm);
        });
        out
    }

    /// A fresh, empty encoding of the same kind (the receive-copy seed
    /// used when a message is re-addressed onto another stack).
    fn duplicate_empty(&self) -> Option<EncodingRef> {
        None
    }

    /// Content copied out; convenience over [`Encoding::with_content`].
    fn content_to_vec(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.with_content(&mut |bytes| out.extend_from_slice(bytes));
        out
    }
}

impl_downcast!(Encoding);

/// Append formatted text into any encoding.
pub fn print_into(encoding: &dyn Encoding, args: fmt::Arguments) -> bool {
    struct Sink<'a> {
        encoding: &'a dyn Encoding,
    }
    impl fmt::Write for Sink<'_> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            if self.encoding.append_bytes(s.as_bytes()) {
                Ok(())
            } else {
                Err(fmt::Error)
            }
        }
    }
    fmt::write(&mut Sink { encoding }, args).is_ok()
}

/// Adapter letting a value implementation render into an encoding.
pub struct EncodingSink<'a>(pub &'a dyn Encoding);

impl ValueSink for EncodingSink<'_> {
    fn push_bytes(&mut self, bytes: &[u8]) -> bool {
        self.0.append_bytes(bytes)
    }
}
