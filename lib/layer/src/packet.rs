//! Binary encoding with a layer stack.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use encoding::{BinaryEncoding, Encoding, EncodingRef};
use mutex::SpinNoIrqLock;

use crate::{Layer, LayerId, LayerImplementation};

/// A message under construction or interpretation, together with the
/// protocol layers wrapped around it. Layers sit outermost first: pushing
/// works from the outside of the stack inward as a message descends
/// through the protocol graph.
pub struct PacketEncoding {
    stream: Arc<BinaryEncoding>,
    layers: SpinNoIrqLock<Vec<Arc<dyn Layer>>>,
}

impl PacketEncoding {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stream: BinaryEncoding::new(),
            layers: SpinNoIrqLock::new(Vec::new()),
        })
    }

    /// Attach a layer of the given implementation, recording the current
    /// stream offset in it.
    pub fn push_layer(&self, implementation: &'static dyn LayerImplementation) -> Arc<dyn Layer> {
        let layer = implementation.make(self);
        self.layers.lock().push(layer.clone());
        layer
    }

    /// Attach an already-built layer (a receive twin made by `swap`).
    pub fn adopt_layer(&self, layer: Arc<dyn Layer>) {
        self.layers.lock().push(layer);
    }

    /// First layer matching `id`, or the outermost layer when `id` is
    /// `None`.
    pub fn layer(&self, id: Option<LayerId>) -> Option<Arc<dyn Layer>> {
        let layers = self.layers.lock();
        match id {
            None => layers.first().cloned(),
            Some(id) => layers
                .iter()
                .find(|layer| layer.implementation().id() == id)
                .cloned(),
        }
    }

    pub fn outermost_layer(&self) -> Option<Arc<dyn Layer>> {
        self.layer(None)
    }

    pub fn innermost_layer(&self) -> Option<Arc<dyn Layer>> {
        self.layers.lock().last().cloned()
    }

    /// The layer pushed immediately before `layer` (one step outward).
    pub fn outer_layer(&self, layer: &Arc<dyn Layer>) -> Option<Arc<dyn Layer>> {
        let layers = self.layers.lock();
        let at = layers.iter().position(|l| Arc::ptr_eq(l, layer))?;
        if at == 0 {
            None
        } else {
            layers.get(at - 1).cloned()
        }
    }

    /// The layer pushed immediately after `layer` (one step inward).
    pub fn inner_layer(&self, layer: &Arc<dyn Layer>) -> Option<Arc<dyn Layer>> {
        let layers = self.layers.lock();
        let at = layers.iter().position(|l| Arc::ptr_eq(l, layer))?;
        layers.get(at + 1).cloned()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.lock().len()
    }
}

impl Encoding for PacketEncoding {
    fn length(&self) -> usize {
        self.stream.length()
    }

    fn limit(&self) -> Option<usize> {
        self.stream.limit()
    }

    fn grow_increment(&self) -> usize {
        self.stream.grow_increment()
    }

    fn grow(&self, increment: usize) -> bool {
        self.stream.grow(increment)
    }

    fn reset(&self) {
        self.stream.reset()
    }

    fn append_byte(&self, byte: u8) -> bool {
        self.stream.append_byte(byte)
    }

    fn append_bytes(&self, bytes: &[u8]) -> bool {
        self.stream.append_bytes(bytes)
    }

    fn pop_last_byte(&self) -> Option<u8> {
        self.stream.pop_last_byte()
    }

    fn fill(&self, byte: u8, count: usize) -> usize {
        self.stream.fill(byte, count)
    }

    fn with_content(&self, f: &mut dyn FnMut(&[u8])) {
        self.stream.with_content(f)
    }

    fn decode_offset(&self) -> usize {
        self.stream.decode_offset()
    }

    fn increment_decode_offset(&self, by: usize) -> usize {
        self.stream.increment_decode_offset(by)
    }

    fn print(&self, args: fmt::Arguments) -> bool {
        self.stream.print(args)
    }

    fn duplicate_empty(&self) -> Option<EncodingRef> {
        Some(PacketEncoding::new())
    }
}
