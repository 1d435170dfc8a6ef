//! The inert base layer.

use alloc::sync::Arc;

use address::Address;
use encoding::Encoding;

use crate::{BindingResolver, Layer, LayerImplementation, NULL_LAYER_ID, PacketEncoding, PortEndpoints};

/// A layer that declines everything: no addresses, no matches, no
/// receive twin. Protocol families start from this shape and override
/// what they carry.
pub struct VirtualLayer {
    offset: usize,
}

pub struct VirtualLayerImplementation;

pub static VIRTUAL_LAYER_IMPLEMENTATION: VirtualLayerImplementation = VirtualLayerImplementation;

impl LayerImplementation for VirtualLayerImplementation {
    fn id(&self) -> crate::LayerId {
        NULL_LAYER_ID
    }

    fn make(&self, packet: &PacketEncoding) -> Arc<dyn Layer> {
        Arc::new(VirtualLayer {
            offset: packet.length(),
        })
    }
}

impl Layer for VirtualLayer {
    fn implementation(&self) -> &'static dyn LayerImplementation {
        &VIRTUAL_LAYER_IMPLEMENTATION
    }

    fn byte_offset(&self) -> usize {
        self.offset
    }

    fn swap(&self, _encoding: &dyn Encoding) -> Option<Arc<dyn Layer>> {
        None
    }

    fn decode(
        &self,
        _encoding: &dyn Encoding,
        _socket: &dyn BindingResolver,
    ) -> Option<PortEndpoints> {
        None
    }

    fn match_address(&self, _address: &Address) -> bool {
        false
    }

    fn remote_address(&self) -> Address {
        Address::invalid()
    }

    fn set_remote_address(&self, _address: Address) -> bool {
        false
    }

    fn local_address(&self) -> Address {
        Address::invalid()
    }

    fn set_local_address(&self, _address: Address) -> bool {
        false
    }

    fn inner_address(&self) -> Address {
        Address::invalid()
    }

    fn set_inner_address(&self, _address: Address) -> bool {
        false
    }
}
