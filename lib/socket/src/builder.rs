//! Declarative stack assembly.
//!
//! A stack is a table of socket descriptions plus inner-to-outer binding
//! pairs; `build_io_sockets` constructs everything, wires the bindings in
//! table order, and opens what asked to be opened.

use alloc::sync::Arc;
use alloc::vec::Vec;

use address::Address;
use event::EventQueue;

use crate::{
    EmulatorSocket, LeafSocket, MultiplexSocket, MultiplexerSocket, SharedMediaSocket, SocketRef,
    SocketSettings,
};

pub type SocketConstructor = fn(&Arc<EventQueue>, Address, SocketSettings) -> SocketRef;

pub struct SocketBuilder {
    pub allocate: SocketConstructor,
    pub address: Address,
    pub settings: SocketSettings,
    pub with_open: bool,
    /// (inner, outer) indices into the builder table.
    pub bindings: &'static [(usize, usize)],
}

impl SocketBuilder {
    pub fn new(allocate: SocketConstructor, address: Address) -> Self {
        Self {
            allocate,
            address,
            settings: SocketSettings::default(),
            with_open: false,
            bindings: &[],
        }
    }

    pub fn with_settings(mut self, settings: SocketSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn opened(mut self) -> Self {
        self.with_open = true;
        self
    }

    pub fn bound(mut self, bindings: &'static [(usize, usize)]) -> Self {
        self.bindings = bindings;
        self
    }
}

pub fn allocate_leaf_socket(
    queue: &Arc<EventQueue>,
    address: Address,
    _settings: SocketSettings,
) -> SocketRef {
    LeafSocket::new(queue.clone(), address)
}

pub fn allocate_multiplex_socket(
    queue: &Arc<EventQueue>,
    address: Address,
    settings: SocketSettings,
) -> SocketRef {
    MultiplexSocket::new(queue.clone(), address, settings)
}

pub fn allocate_multiplexer_socket(
    queue: &Arc<EventQueue>,
    address: Address,
    settings: SocketSettings,
) -> SocketRef {
    MultiplexerSocket::new(queue.clone(), address, settings)
}

pub fn allocate_emulator_socket(
    queue: &Arc<EventQueue>,
    address: Address,
    settings: SocketSettings,
) -> SocketRef {
    EmulatorSocket::new(queue.clone(), address, settings)
}

pub fn allocate_shared_media(
    queue: &Arc<EventQueue>,
    _address: Address,
    settings: SocketSettings,
) -> SocketRef {
    SharedMediaSocket::new(queue.clone(), settings)
}

/// Construct every socket, apply the binding pairs, then open the ones
/// marked for opening.
pub fn build_io_sockets(queue: &Arc<EventQueue>, builders: &[SocketBuilder]) -> Vec<SocketRef> {
    let sockets: Vec<SocketRef> = builders
        .iter()
        .map(|b| (b.allocate)(queue, b.address.clone(), b.settings))
        .collect();

    for builder in builders {
        for &(inner, outer) in builder.bindings {
            sockets[inner].bind_to_outer(&sockets[outer]);
        }
    }

    for (builder, socket) in builders.iter().zip(sockets.iter()) {
        if builder.with_open {
            socket.open();
        }
    }

    sockets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_wires_a_two_socket_stack() {
        let queue = Arc::new(EventQueue::new());
        let net = [
            SocketBuilder::new(allocate_leaf_socket, Address::U8(7)).bound(&[(0, 1)]),
            SocketBuilder::new(allocate_shared_media, Address::invalid()),
        ];
        let sockets = build_io_sockets(&queue, &net);
        assert_eq!(sockets.len(), 2);

        // the leaf registered itself with the media under its address
        let media = sockets[1]
            .downcast_ref::<crate::SharedMediaSocket>()
            .unwrap();
        assert!(media.multiplex().find_binding(&Address::U8(7)).is_some());
    }

    #[test]
    fn socket_kinds_downcast_as_expected() {
        let queue = Arc::new(EventQueue::new());
        let mux = allocate_multiplex_socket(&queue, Address::invalid(), SocketSettings::default());
        assert!(mux.downcast_ref::<crate::MultiplexSocket>().is_some());
        assert!(mux.downcast_ref::<crate::MultiplexerSocket>().is_none());

        let muxer =
            allocate_multiplexer_socket(&queue, Address::invalid(), SocketSettings::default());
        assert!(muxer.downcast_ref::<crate::MultiplexerSocket>().is_some());
        assert!(muxer.downcast_ref::<crate::MultiplexSocket>().is_none());

        let emulator = allocate_emulator_socket(&queue, Address::U8(1), SocketSettings::default());
        assert!(emulator.downcast_ref::<crate::EmulatorSocket>().is_some());
    }
}
