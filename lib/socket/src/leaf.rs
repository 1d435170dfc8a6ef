//! Leaf sockets: the application ends of a stack.

use alloc::sync::Arc;

use address::Address;
use encoding::{EncodingPipe, EncodingRef};
use event::{EventQueue, EventRef};
use layer::PacketEncoding;
use mutex::SpinNoIrqLock;

use crate::{Socket, SocketRef, SocketState};

/// One-to-one adapter between application code and an outer socket. Its
/// address names the remote peer it converses with; opens, messages and
/// mtu queries all forward outward.
pub struct LeafSocket {
    address: Address,
    state: SpinNoIrqLock<SocketState>,
    queue: Arc<EventQueue>,
    outer: SpinNoIrqLock<Option<SocketRef>>,
    transmit_available: SpinNoIrqLock<Option<EventRef>>,
    receive_data_available: SpinNoIrqLock<Option<EventRef>>,
}

impl LeafSocket {
    pub fn new(queue: Arc<EventQueue>, address: Address) -> Arc<Self> {
        Arc::new(Self {
            address,
            state: SpinNoIrqLock::new(SocketState::Closed),
            queue,
            outer: SpinNoIrqLock::new(None),
            transmit_available: SpinNoIrqLock::new(None),
            receive_data_available: SpinNoIrqLock::new(None),
        })
    }

    fn outer_socket(&self) -> Option<SocketRef> {
        self.outer.lock().clone()
    }

    /// Register our user's events with the outer socket under our own
    /// address.
    fn register_with_outer(&self) -> bool {
        let Some(outer) = self.outer_socket() else {
            return false;
        };
        outer.bind_inner(
            &self.address,
            self.transmit_available.lock().clone(),
            self.receive_data_available.lock().clone(),
        )
    }
}

impl Socket for LeafSocket {
    fn address(&self) -> Address {
        self.address.clone()
    }

    fn open(&self) -> bool {
        let Some(outer) = self.outer_socket() else {
            return false;
        };
        *self.state.lock() = SocketState::Opening;
        if outer.open() {
            *self.state.lock() = SocketState::Open;
            true
        } else {
            *self.state.lock() = SocketState::Closed;
            false
        }
    }

    fn close(&self) {
        *self.state.lock() = SocketState::Closing;
        for event in [
            self.transmit_available.lock().clone(),
            self.receive_data_available.lock().clone(),
        ]
        .into_iter()
        .flatten()
        {
            self.queue.dequeue(&event);
        }
        if let Some(outer) = self.outer_socket() {
            outer.unbind_inner(&self.address);
        }
        *self.state.lock() = SocketState::Closed;
    }

    fn is_closed(&self) -> bool {
        *self.state.lock() == SocketState::Closed
    }

    fn bind_to_outer(&self, outer: &SocketRef) -> bool {
        *self.outer.lock() = Some(outer.clone());
        self.register_with_outer()
    }

    /// A leaf has exactly one user; the address argument is its own.
    fn bind_inner(
        &self,
        _address: &Address,
        tx_available: Option<EventRef>,
        rx_available: Option<EventRef>,
    ) -> bool {
        *self.transmit_available.lock() = tx_available;
        *self.receive_data_available.lock() = rx_available;
        self.register_with_outer()
    }

    /// A message from the outer stack, re-addressed to this leaf's peer.
    fn new_message(&self) -> Option<EncodingRef> {
        let message = self.outer_socket()?.new_message()?;
        if let Some(packet) = message.downcast_ref::<PacketEncoding>() {
            if let Some(outermost) = packet.outermost_layer() {
                outermost.set_remote_address(self.address.clone());
                outermost.set_inner_address(self.address.clone());
            }
        }
        Some(message)
    }

    fn send_message(&self, message: EncodingRef) -> bool {
        match self.outer_socket() {
            Some(outer) => outer.send_message(message),
            None => false,
        }
    }

    fn receive_pipe(&self, address: &Address) -> Option<Arc<EncodingPipe>> {
        self.outer_socket()?.receive_pipe(address)
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
