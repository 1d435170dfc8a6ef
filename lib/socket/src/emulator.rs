//! A software link endpoint.
//!
//! The emulator stands in for a physical transport: downward it forwards
//! whole encodings to the medium it is bound to, upward its rx event
//! drains its binding on the medium and demultiplexes each arrival to the
//! addressed inner binding. Wiring tests and loopback rigs are built out
//! of these.

use alloc::sync::{Arc, Weak};

use address::Address;
use encoding::{EncodingPipe, EncodingRef};
use event::{EventQueue, EventRef, FnEvent};
use layer::{LINK_LAYER_IMPLEMENTATION, PacketEncoding};
use mutex::SpinNoIrqLock;

use crate::{MultiplexSocket, Socket, SocketRef, SocketSettings, SocketState};

pub struct EmulatorSocket {
    mux: MultiplexSocket,
    outer: SpinNoIrqLock<Option<SocketRef>>,
    tx: EventRef,
    rx: EventRef,
}

impl EmulatorSocket {
    pub fn new(queue: Arc<EventQueue>, address: Address, settings: SocketSettings) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<EmulatorSocket>| {
            let tx_weak = weak.clone();
            let rx_weak = weak.clone();
            Self {
                mux: MultiplexSocket::with_parts(queue, address, settings),
                outer: SpinNoIrqLock::new(None),
                tx: Arc::new(FnEvent(move || {
                    if let Some(socket) = tx_weak.upgrade() {
                        socket.on_transmit_available();
                    }
                })),
                rx: Arc::new(FnEvent(move || {
                    if let Some(socket) = rx_weak.upgrade() {
                        socket.on_receive_available();
                    }
                })),
            }
        })
    }

    pub fn multiplex(&self) -> &MultiplexSocket {
        &self.mux
    }

    fn outer_socket(&self) -> Option<SocketRef> {
        self.outer.lock().clone()
    }

    fn on_transmit_available(&self) {
        self.mux.round_robin_signal_transmit_available();
    }

    /// Drain our binding on the medium: each received encoding is decoded
    /// by its outermost layer and forwarded to the inner binding it
    /// addresses.
    fn on_receive_available(&self) {
        let Some(outer) = self.outer_socket() else {
            return;
        };
        let Some(pipe) = outer.receive_pipe(&self.address()) else {
            return;
        };
        while let Some(message) = pipe.get() {
            let Some(packet) = message.downcast_ref::<PacketEncoding>() else {
                continue;
            };
            let Some(base) = packet.outermost_layer() else {
                continue;
            };
            let Some(endpoints) = base.decode(packet, &self.mux) else {
                continue;
            };
            if endpoints.receive_pipe.put(message.clone()).is_ok() {
                if let Some(rx_available) = endpoints.rx_available {
                    self.mux.event_queue().enqueue(rx_available);
                }
            }
        }
    }
}

impl Socket for EmulatorSocket {
    fn address(&self) -> Address {
        self.mux.address()
    }

    fn open(&self) -> bool {
        match self.outer_socket() {
            Some(outer) => {
                self.mux.set_state(SocketState::Opening);
                if outer.open() {
                    self.mux.set_state(SocketState::Open);
                    true
                } else {
                    self.mux.set_state(SocketState::Closed);
                    false
                }
            }
            None => false,
        }
    }

    fn close(&self) {
        self.mux.event_queue().dequeue(&self.tx);
        self.mux.event_queue().dequeue(&self.rx);
        self.mux.close();
    }

    fn is_closed(&self) -> bool {
        self.mux.is_closed()
    }

    /// Join a medium: our availability events become the medium's view of
    /// this endpoint.
    fn bind_to_outer(&self, outer: &SocketRef) -> bool {
        *self.outer.lock() = Some(outer.clone());
        outer.bind_inner(
            &self.address(),
            Some(self.tx.clone()),
            Some(self.rx.clone()),
        )
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

    /// A link message: packet encoding with this endpoint's address as
    /// the link-local sender.
    fn new_message(&self) -> Option<EncodingRef> {
        let packet = PacketEncoding::new();
        let link = packet.push_layer(&LINK_LAYER_IMPLEMENTATION);
        link.set_local_address(self.address());
        Some(packet)
    }

    fn send_message(&self, message: EncodingRef) -> bool {
        match self.outer_socket() {
            Some(outer) => outer.send_message(message),
            None => false,
        }
    }

    fn receive_pipe(&self, address: &Address) -> Option<Arc<EncodingPipe>> {
        self.mux.receive_pipe(address)
    }

    fn mtu(&self) -> usize {
        self.outer_socket().map_or(0, |outer| outer.mtu())
    }

    fn iterate_outer_sockets(&self, f: &mut dyn FnMut(&SocketRef) -> bool) {
        if let Some(outer) = self.outer_socket() {
            f(&outer);
        }
    }
}
