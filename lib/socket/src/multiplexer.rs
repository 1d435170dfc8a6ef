//! Multiplexer: a binding table spliced onto one outer transport.

use alloc::sync::Arc;

use address::Address;
use encoding::{EncodingPipe, EncodingRef};
use event::{EventQueue, EventRef};
use mutex::SpinNoIrqLock;

use crate::{MultiplexSocket, Socket, SocketRef, SocketSettings, SocketState};

/// A multiplex socket bound to a single outer socket. Inner traffic fans
/// in: `send_message` forwards outward, and mtu is the transport's.
pub struct MultiplexerSocket {
    pub(crate) mux: MultiplexSocket,
    pub(crate) outer: SpinNoIrqLock<Option<SocketRef>>,
}

impl MultiplexerSocket {
    pub fn new(queue: Arc<EventQueue>, address: Address, settings: SocketSettings) -> Arc<Self> {
        Arc::new(Self {
            mux: MultiplexSocket::with_parts(queue, address, settings),
            outer: SpinNoIrqLock::new(None),
        })
    }

    pub fn multiplex(&self) -> &MultiplexSocket {
        &self.mux
    }

    pub(crate) fn outer_socket(&self) -> Option<SocketRef> {
        self.outer.lock().clone()
    }
}

impl Socket for MultiplexerSocket {
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
        self.mux.close();
    }

    fn is_closed(&self) -> bool {
        self.mux.is_closed()
    }

    fn bind_to_outer(&self, outer: &SocketRef) -> bool {
        *self.outer.lock() = Some(outer.clone());
        outer.bind_inner(&self.address(), None, None)
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
        self.outer_socket()?.new_message()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_nothing_without_an_outer() {
        let socket = MultiplexerSocket::new(
            Arc::new(EventQueue::new()),
            Address::invalid(),
            SocketSettings::default(),
        );
        assert!(!socket.open());
        assert!(socket.new_message().is_none());
        assert_eq!(socket.mtu(), 0);
    }

    #[test]
    fn inner_bindings_live_in_the_multiplex_table() {
        let socket = MultiplexerSocket::new(
            Arc::new(EventQueue::new()),
            Address::invalid(),
            SocketSettings::default(),
        );
        assert!(socket.bind_inner(&Address::U8(2), None, None));
        assert!(socket.receive_pipe(&Address::U8(2)).is_some());
        assert!(socket.receive_pipe(&Address::U8(3)).is_none());
    }
}
