//! The binding table shared by every demultiplexing socket.

use alloc::sync::Arc;
use alloc::vec::Vec;

use address::Address;
use encoding::{EncodingPipe, EncodingRef};
use event::{EventQueue, EventRef};
use layer::{BindingResolver, PortEndpoints};
use mutex::SpinNoIrqLock;

use crate::{Socket, SocketRef, SocketSettings, SocketState};

/// The endpoint a binding owns: a transmit pipe, a receive pipe, and the
/// bound user's availability events.
pub struct Port {
    pub transmit_pipe: Arc<EncodingPipe>,
    pub receive_pipe: Arc<EncodingPipe>,
    pub tx_available: SpinNoIrqLock<Option<EventRef>>,
    pub rx_available: SpinNoIrqLock<Option<EventRef>>,
}

impl Port {
    fn new(settings: &SocketSettings) -> Arc<Self> {
        Arc::new(Self {
            transmit_pipe: Arc::new(EncodingPipe::new(settings.transmit_pipe_length)),
            receive_pipe: Arc::new(EncodingPipe::new(settings.receive_pipe_length)),
            tx_available: SpinNoIrqLock::new(None),
            rx_available: SpinNoIrqLock::new(None),
        })
    }

    pub fn rx_available_event(&self) -> Option<EventRef> {
        self.rx_available.lock().clone()
    }

    pub fn tx_available_event(&self) -> Option<EventRef> {
        self.tx_available.lock().clone()
    }
}

/// An address and the port bound to it.
#[derive(Clone)]
pub struct Binding {
    pub address: Address,
    pub port: Arc<Port>,
}

/// A socket that parcels one transport among addressed inner bindings:
/// every binding gets its own port, transmit fairness is round-robin from
/// a cursor, and receive routing is by address.
pub struct MultiplexSocket {
    address: Address,
    state: SpinNoIrqLock<SocketState>,
    settings: SocketSettings,
    bindings: SpinNoIrqLock<Vec<Binding>>,
    round_robin_cursor: SpinNoIrqLock<usize>,
    queue: Arc<EventQueue>,
}

impl MultiplexSocket {
    pub fn new(queue: Arc<EventQueue>, address: Address, settings: SocketSettings) -> Arc<Self> {
        Arc::new(Self::with_parts(queue, address, settings))
    }

    pub(crate) fn with_parts(
        queue: Arc<EventQueue>,
        address: Address,
        settings: SocketSettings,
    ) -> Self {
        Self {
            address,
            state: SpinNoIrqLock::new(SocketState::Closed),
            settings,
            bindings: SpinNoIrqLock::new(Vec::new()),
            round_robin_cursor: SpinNoIrqLock::new(0),
            queue,
        }
    }

    pub fn event_queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub(crate) fn set_state(&self, state: SocketState) {
        *self.state.lock() = state;
    }

    pub(crate) fn state(&self) -> SocketState {
        *self.state.lock()
    }

    pub fn find_binding(&self, address: &Address) -> Option<Binding> {
        self.bindings
            .lock()
            .iter()
            .find(|binding| binding.address == *address)
            .cloned()
    }

    pub fn has_bindings(&self) -> bool {
        !self.bindings.lock().is_empty()
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.lock().len()
    }

    pub(crate) fn each_binding(&self, mut f: impl FnMut(&Binding)) {
        for binding in self.bindings.lock().iter() {
            f(binding);
        }
    }

    /// Find or create the binding for `address`, reset its pipes, and
    /// install the user's events in place of any previous ones.
    pub fn bind(
        &self,
        address: &Address,
        tx_available: Option<EventRef>,
        rx_available: Option<EventRef>,
    ) -> bool {
        let port = match self.find_binding(address) {
            Some(binding) => binding.port,
            None => {
                log::debug!("new binding, {} byte address", address.size());
                let port = Port::new(&self.settings);
                self.bindings.lock().push(Binding {
                    address: address.clone(),
                    port: port.clone(),
                });
                port
            }
        };

        for old in [
            port.tx_available.lock().take(),
            port.rx_available.lock().take(),
        ]
        .into_iter()
        .flatten()
        {
            self.queue.dequeue(&old);
        }
        port.transmit_pipe.reset();
        port.receive_pipe.reset();
        *port.tx_available.lock() = tx_available;
        *port.rx_available.lock() = rx_available;
        true
    }

    /// Drop the binding for `address`, cancelling its pending events.
    pub fn unbind(&self, address: &Address) {
        let mut bindings = self.bindings.lock();
        let Some(at) = bindings.iter().position(|b| b.address == *address) else {
            return;
        };
        let binding = bindings.remove(at);
        drop(bindings);
        for event in [
            binding.port.tx_available.lock().take(),
            binding.port.rx_available.lock().take(),
        ]
        .into_iter()
        .flatten()
        {
            self.queue.dequeue(&event);
        }
        let mut cursor = self.round_robin_cursor.lock();
        if *cursor > at {
            *cursor -= 1;
        }
    }

    pub(crate) fn release_all_bindings(&self) {
        let drained: Vec<Binding> = core::mem::take(&mut *self.bindings.lock());
        for binding in drained {
            for event in [
                binding.port.tx_available.lock().take(),
                binding.port.rx_available.lock().take(),
            ]
            .into_iter()
            .flatten()
            {
                self.queue.dequeue(&event);
            }
        }
        *self.round_robin_cursor.lock() = 0;
    }

    /// Advance the round-robin cursor to the first binding with queued
    /// transmit work; the cursor parks on the returned binding.
    pub fn get_next_transmit_binding(&self) -> Option<Binding> {
        let bindings = self.bindings.lock();
        if bindings.is_empty() {
            return None;
        }
        let mut cursor = self.round_robin_cursor.lock();
        if *cursor >= bindings.len() {
            *cursor = 0;
        }
        let start = *cursor;
        loop {
            let binding = &bindings[*cursor];
            if binding.port.transmit_pipe.is_readable() {
                return Some(binding.clone());
            }
            *cursor = (*cursor + 1) % bindings.len();
            if *cursor == start {
                return None;
            }
        }
    }

    /// Move past the current binding and queue the next tx-available
    /// event found, keeping transmit opportunity fair across bindings.
    pub fn round_robin_signal_transmit_available(&self) {
        let bindings = self.bindings.lock();
        if bindings.is_empty() {
            return;
        }
        let mut cursor = self.round_robin_cursor.lock();
        if *cursor >= bindings.len() {
            *cursor = 0;
        }
        let start = *cursor;
        loop {
            *cursor = (*cursor + 1) % bindings.len();
            if let Some(event) = bindings[*cursor].port.tx_available_event() {
                self.queue.enqueue(event);
                return;
            }
            if *cursor == start {
                return;
            }
        }
    }
}

impl BindingResolver for MultiplexSocket {
    fn find_endpoints(&self, address: &Address) -> Option<PortEndpoints> {
        let binding = self.find_binding(address)?;
        Some(PortEndpoints {
            receive_pipe: binding.port.receive_pipe.clone(),
            rx_available: binding.port.rx_available_event(),
        })
    }
}

impl Socket for MultiplexSocket {
    fn address(&self) -> Address {
        self.address.clone()
    }

    fn open(&self) -> bool {
        self.set_state(SocketState::Open);
        true
    }

    fn close(&self) {
        self.set_state(SocketState::Closing);
        self.release_all_bindings();
        self.set_state(SocketState::Closed);
    }

    fn is_closed(&self) -> bool {
        self.state() == SocketState::Closed
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
        self.bind(address, tx_available, rx_available)
    }

    fn unbind_inner(&self, address: &Address) {
        self.unbind(address)
    }

    fn new_message(&self) -> Option<EncodingRef> {
        None
    }

    fn send_message(&self, _message: EncodingRef) -> bool {
        false
    }

    fn receive_pipe(&self, address: &Address) -> Option<Arc<EncodingPipe>> {
        Some(self.find_binding(address)?.port.receive_pipe.clone())
    }

    fn mtu(&self) -> usize {
        0
    }
}
