//! Link-layer framing for shared media.
//!
//! Carries three addresses: `remote` (the far end the message is for, or
//! invalid for every listener), `local` (the sender's media address) and
//! `inner` (the binding the payload belongs to on arrival). A message
//! crossing a shared medium is re-addressed by swapping: the receive twin
//! sees the sender as its remote.

use alloc::sync::Arc;

use address::Address;
use encoding::Encoding;
use mutex::SpinNoIrqLock;

use crate::{
    BindingResolver, DLC_LAYER_ID, Layer, LayerId, LayerImplementation, PacketEncoding,
    PortEndpoints,
};

pub const LINK_LAYER_ID: LayerId = DLC_LAYER_ID;

struct Addresses {
    remote: Address,
    local: Address,
    inner: Address,
}

pub struct LinkLayer {
    offset: usize,
    addresses: SpinNoIrqLock<Addresses>,
}

pub struct LinkLayerImplementation;

pub static LINK_LAYER_IMPLEMENTATION: LinkLayerImplementation = LinkLayerImplementation;

impl LinkLayerImplementation {
    fn make_at(&self, offset: usize) -> Arc<LinkLayer> {
        Arc::new(LinkLayer {
            offset,
            addresses: SpinNoIrqLock::new(Addresses {
                remote: Address::invalid(),
                local: Address::invalid(),
                inner: Address::invalid(),
            }),
        })
    }
}

impl LayerImplementation for LinkLayerImplementation {
    fn id(&self) -> LayerId {
        LINK_LAYER_ID
    }

    /// The invalid address stands for "every listener" on a link.
    fn any_address(&self) -> Address {
        Address::invalid()
    }

    fn make(&self, packet: &PacketEncoding) -> Arc<dyn Layer> {
        self.make_at(packet.length())
    }
}

impl Layer for LinkLayer {
    fn implementation(&self) -> &'static dyn LayerImplementation {
        &LINK_LAYER_IMPLEMENTATION
    }

    fn byte_offset(&self) -> usize {
        self.offset
    }

    fn swap(&self, encoding: &dyn Encoding) -> Option<Arc<dyn Layer>> {
        let addresses = self.addresses.lock();
        let twin = LINK_LAYER_IMPLEMENTATION.make_at(encoding.length());
        {
            let mut t = twin.addresses.lock();
            t.remote = addresses.local.clone();
            t.local = addresses.remote.clone();
            t.inner = addresses.inner.clone();
        }
        Some(twin)
    }

    fn decode(
        &self,
        _encoding: &dyn Encoding,
        socket: &dyn BindingResolver,
    ) -> Option<PortEndpoints> {
        socket.find_endpoints(&self.remote_address())
    }

    /// A valid binding address matches when the message is for everyone
    /// (invalid remote) or addressed to it.
    fn match_address(&self, address: &Address) -> bool {
        if address.is_invalid() {
            return false;
        }
        let remote = &self.addresses.lock().remote;
        remote.is_invalid() || remote == address
    }

    fn remote_address(&self) -> Address {
        self.addresses.lock().remote.clone()
    }

    fn set_remote_address(&self, address: Address) -> bool {
        self.addresses.lock().remote = address;
        true
    }

    fn local_address(&self) -> Address {
        self.addresses.lock().local.clone()
    }

    fn set_local_address(&self, address: Address) -> bool {
        self.addresses.lock().local = address;
        true
    }

    fn inner_address(&self) -> Address {
        self.addresses.lock().inner.clone()
    }

    fn set_inner_address(&self, address: Address) -> bool {
        self.addresses.lock().inner = address;
        true
    }
}
