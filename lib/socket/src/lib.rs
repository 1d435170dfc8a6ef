#![cfg_attr(not(test), no_std)]

//! Sockets: the splice points of the protocol graph.
//!
//! A socket stack is assembled by binding inner sockets to outer ones.
//! Transmit descends through `send_message` calls; receive ascends by
//! events: an outer socket queues the inner binding's rx event and the
//! handler drains the binding's receive pipe. Everything runs on the
//! event thread.

extern crate alloc;

mod builder;
mod emulator;
mod leaf;
mod multiplex;
mod multiplexer;
mod shared_media;

pub use builder::{
    SocketBuilder, allocate_emulator_socket, allocate_leaf_socket, allocate_multiplex_socket,
    allocate_multiplexer_socket, allocate_shared_media, build_io_sockets,
};
pub use emulator::EmulatorSocket;
pub use leaf::LeafSocket;
pub use multiplex::{Binding, MultiplexSocket, Port};
pub use multiplexer::MultiplexerSocket;
pub use shared_media::SharedMediaSocket;

use alloc::sync::Arc;

use address::Address;
use downcast_rs::{Downcast, impl_downcast};
use encoding::{EncodingPipe, EncodingRef};
use event::EventRef;

pub type SocketRef = Arc<dyn Socket>;

/// Lifecycle of a socket.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SocketState {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Pipe geometry for a socket's ports.
#[derive(Clone, Copy, Debug)]
pub struct SocketSettings {
    pub transmit_pipe_length: usize,
    pub receive_pipe_length: usize,
}

impl Default for SocketSettings {
    fn default() -> Self {
        Self {
            transmit_pipe_length: config::pipes::DEFAULT_TRANSMIT_PIPE_LENGTH,
            receive_pipe_length: config::pipes::DEFAULT_RECEIVE_PIPE_LENGTH,
        }
    }
}

pub trait Socket: Downcast + Send + Sync {
    /// The address this socket answers to (for a leaf, the remote peer it
    /// speaks with).
    fn address(&self) -> Address;

    /// Bring the socket up. An outer socket opens first; the result is
    /// true only when every prerequisite reports open.
    fn open(&self) -> bool;

    /// Take the socket down: pending events are dequeued and inner
    /// bindings released.
    fn close(&self);

    fn is_closed(&self) -> bool;

    /// Attach this socket under `outer`, registering its events with the
    /// outer binding table.
    fn bind_to_outer(&self, outer: &SocketRef) -> bool;

    /// Attach a user under `address`: their tx-available and rx-available
    /// events replace whatever the binding held.
    fn bind_inner(
        &self,
        address: &Address,
        tx_available: Option<EventRef>,
        rx_available: Option<EventRef>,
    ) -> bool;

    fn unbind_inner(&self, _address: &Address) {}

    /// A fresh transmit message shaped for this stack (layers pushed,
    /// addresses seeded).
    fn new_message(&self) -> Option<EncodingRef>;

    /// Hand a message down the stack. False when it cannot be carried;
    /// the handing reference is consumed either way.
    fn send_message(&self, message: EncodingRef) -> bool;

    /// The receive pipe serving `address`.
    fn receive_pipe(&self, address: &Address) -> Option<Arc<EncodingPipe>>;

    fn mtu(&self) -> usize;

    fn iterate_outer_sockets(&self, _f: &mut dyn FnMut(&SocketRef) -> bool) {}
}

impl_downcast!(Socket);
