//! A broadcast fabric joining socket stacks.

use alloc::sync::Arc;

use address::Address;
use encoding::{Encoding, EncodingPipe, EncodingRef};
use event::{EventQueue, EventRef};
use layer::PacketEncoding;

use crate::{MultiplexSocket, Socket, SocketRef, SocketSettings};

/// Emulates a shared communication medium: every message sent into it is
/// re-addressed as a reception and fanned out to every other binding the
/// outermost layer's address predicate admits.
pub struct SharedMediaSocket {
    mux: MultiplexSocket,
}

impl SharedMediaSocket {
    pub fn new(queue: Arc<EventQueue>, settings: SocketSettings) -> Arc<Self> {
        Arc::new(Self {
            mux: MultiplexSocket::with_parts(queue, Address::invalid(), settings),
        })
    }

    pub fn multiplex(&self) -> &MultiplexSocket {
        &self.mux
    }

    /// The reception twin of an outgoing packet: same kind of encoding,
    /// outermost layer swapped so the receiver sees the sender as its
    /// remote, content carried over verbatim.
    fn make_receive_copy(packet: &PacketEncoding, message: &dyn Encoding) -> Option<EncodingRef> {
        let base = packet.outermost_layer()?;
        let copy = message.duplicate_empty()?;
        let copy_packet = copy.downcast_ref::<PacketEncoding>()?;
        let rx_layer = base.swap(copy_packet)?;
        copy_packet.adopt_layer(rx_layer);
        let mut ok = true;
        message.with_content(&mut |bytes| {
            ok = copy.append_bytes(bytes);
        });
        ok.then_some(copy)
    }
}

impl Socket for SharedMediaSocket {
    fn address(&self) -> Address {
        Address::invalid()
    }

    fn open(&self) -> bool {
        self.mux.open()
    }

    fn close(&self) {
        self.mux.close()
    }

    fn is_closed(&self) -> bool {
        self.mux.is_closed()
    }

    fn bind_to_outer(&self, _outer: &SocketRef) -> bool {
        false
    }

    fn bind_inner(
        &self,
        address: &Address,
        tx_available: Option<EventRef>,
        rx_available: Option<EventRef>,
    ) -> bool {
        self.mux.bind(address, tx_available, rx_available)
    }

    fn unbind_inner(&self, address: &Address) {
        self.mux.unbind(address)
    }

    fn new_message(&self) -> Option<EncodingRef> {
        None
    }

    /// Fan the message out to every other matching binding. The receive
    /// copy is referenced for the duration of the fan-out and released
    /// afterwards; pipes keep their own references.
    fn send_message(&self, message: EncodingRef) -> bool {
        let Some(packet) = message.downcast_ref::<PacketEncoding>() else {
            return true;
        };
        let Some(layer) = packet.outermost_layer() else {
            log::debug!("shared media dropped a message with no layers");
            return true;
        };
        let source = layer.local_address();

        if !self.mux.has_bindings() {
            return true;
        }
        let Some(receive_copy) = Self::make_receive_copy(packet, &*message) else {
            return true;
        };

        let queue = self.mux.event_queue().clone();
        self.mux.each_binding(|binding| {
            if binding.address != source && layer.match_address(&binding.address) {
                if let Some(rx_available) = binding.port.rx_available_event() {
                    if binding.port.receive_pipe.put(receive_copy.clone()).is_ok() {
                        queue.enqueue(rx_available);
                    }
                }
            }
        });
        true
    }

    fn receive_pipe(&self, address: &Address) -> Option<Arc<EncodingPipe>> {
        self.mux.receive_pipe(address)
    }

    /// The minimum transport size of everything attached; unconstrained
    /// here since emulated media carry whole encodings.
    fn mtu(&self) -> usize {
        0
    }
}
