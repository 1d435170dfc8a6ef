#![cfg_attr(not(test), no_std)]

//! Protocol layers and the packet encoding that carries them.
//!
//! A packet encoding is a binary encoding plus a stack of layers, pushed
//! outermost first. Each layer records the byte offset the stream had
//! when it was pushed; the buffer may move as it grows, so layers never
//! hold pointers into it. Layer implementations register under a four
//! byte id so sockets can splice stacks for protocols they did not link
//! against.

extern crate alloc;

mod link;
mod packet;
mod registry;
mod virtual_layer;

pub use link::{LINK_LAYER_ID, LinkLayer, LinkLayerImplementation, LINK_LAYER_IMPLEMENTATION};
pub use packet::PacketEncoding;
pub use registry::{layer_implementation_by_id, register_layer_implementation};
pub use virtual_layer::{VIRTUAL_LAYER_IMPLEMENTATION, VirtualLayerImplementation};

use alloc::sync::Arc;

use address::Address;
use downcast_rs::{Downcast, impl_downcast};
use encoding::EncodingPipe;
use event::EventRef;

/// Four-byte registered layer id, always `i` plus three protocol bytes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct LayerId(pub [u8; 4]);

impl LayerId {
    pub const fn registered(b: u8, c: u8, d: u8) -> Self {
        Self([b'i', b, c, d])
    }
}

/// The null layer id.
pub const NULL_LAYER_ID: LayerId = LayerId::registered(b'0', b'0', b'0');
/// Data-link control framing.
pub const DLC_LAYER_ID: LayerId = LayerId::registered(b'D', b'L', b'C');
/// x70-framed payloads.
pub const X70_LAYER_ID: LayerId = LayerId::registered(b'X', b'7', b'0');
/// Transport-size negotiation.
pub const MTU_LAYER_ID: LayerId = LayerId::registered(b'M', b'T', b'U');

/// Where a decoded message should land: the addressed binding's receive
/// pipe and its data-available event.
pub struct PortEndpoints {
    pub receive_pipe: Arc<EncodingPipe>,
    pub rx_available: Option<EventRef>,
}

/// The slice of a multiplex socket a layer needs for demultiplexing.
pub trait BindingResolver {
    fn find_endpoints(&self, address: &Address) -> Option<PortEndpoints>;
}

pub trait LayerImplementation: Send + Sync {
    fn id(&self) -> LayerId;

    /// The address that addresses every binding.
    fn any_address(&self) -> Address {
        Address::invalid()
    }

    /// Attach a fresh layer to `packet`, capturing the current stream
    /// offset as the layer's header position.
    fn make(&self, packet: &PacketEncoding) -> Arc<dyn Layer>;
}

pub trait Layer: Downcast + Send + Sync {
    fn implementation(&self) -> &'static dyn LayerImplementation;

    /// Offset of this layer's header in the byte stream.
    fn byte_offset(&self) -> usize;

    /// Build this layer's receive-side twin bound to `encoding`: the
    /// remote and local addresses change places, everything else carries
    /// over.
    fn swap(&self, encoding: &dyn encoding::Encoding) -> Option<Arc<dyn Layer>>;

    /// Demultiplex a received message to the inner binding it addresses.
    fn decode(
        &self,
        encoding: &dyn encoding::Encoding,
        socket: &dyn BindingResolver,
    ) -> Option<PortEndpoints>;

    /// Should a binding with this address receive the message?
    fn match_address(&self, address: &Address) -> bool;

    fn remote_address(&self) -> Address;
    fn set_remote_address(&self, address: Address) -> bool;
    fn local_address(&self) -> Address;
    fn set_local_address(&self, address: Address) -> bool;
    fn inner_address(&self) -> Address;
    fn set_inner_address(&self, address: Address) -> bool;
}

impl_downcast!(Layer);
