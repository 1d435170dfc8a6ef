//! Value implementations and their registry.
//!
//! Every value type registers once under a wire name; the id handed back
//! is what value headers store, and the name is what the x70 codec puts on
//! the wire. Registration is global because references must stay
//! resolvable without carrying their implementation around.

use alloc::vec::Vec;

use lazy_static::lazy_static;
use mutex::SpinNoIrqLock;
use table::StringTable;

use crate::memory::ValueMemory;
use crate::vref::Vref;

/// Byte sink a value renders itself into. Encodings implement this so a
/// value can print or serialize without knowing the encoding flavor.
pub trait ValueSink {
    fn push_bytes(&mut self, bytes: &[u8]) -> bool;
}

impl ValueSink for alloc::vec::Vec<u8> {
    fn push_bytes(&mut self, bytes: &[u8]) -> bool {
        self.extend_from_slice(bytes);
        true
    }
}

pub trait ValueImplementation: Send + Sync {
    /// Wire name, also the registry key.
    fn name(&self) -> &'static str;

    /// Fill in a freshly allocated value, optionally from `base` (a value
    /// of the same implementation to copy). False rolls the allocation
    /// back.
    fn initialise(&self, vm: &ValueMemory, value: &Vref, base: &Vref) -> bool;

    /// Human-readable rendering.
    fn encode_text(&self, vm: &ValueMemory, value: &Vref, sink: &mut dyn ValueSink) -> bool;

    /// x70 body bytes (the envelope is the codec's business).
    fn encode_x70_body(&self, vm: &ValueMemory, value: &Vref, sink: &mut dyn ValueSink) -> bool;

    /// Rebuild a value from x70 body bytes; returns the value and how many
    /// body bytes were consumed.
    fn decode_x70_body(&self, vm: &ValueMemory, body: &[u8]) -> Option<(Vref, usize)>;
}

struct Registry {
    list: Vec<&'static dyn ValueImplementation>,
    names: StringTable<u16>,
}

lazy_static! {
    static ref REGISTRY: SpinNoIrqLock<Registry> = {
        let mut registry = Registry {
            list: Vec::new(),
            names: StringTable::new(17),
        };
        for imp in crate::core_values::CORE_IMPLEMENTATIONS {
            let id = registry.list.len() as u16;
            registry.list.push(*imp);
            registry.names.insert(imp.name().as_bytes(), id);
        }
        SpinNoIrqLock::new(registry)
    };
}

/// Register an implementation, returning its id. Registering the same
/// name twice keeps the first id.
pub fn register_value_implementation(imp: &'static dyn ValueImplementation) -> u16 {
    let mut registry = REGISTRY.lock();
    if let Some(&id) = registry.names.map(imp.name().as_bytes()) {
        return id;
    }
    let id = registry.list.len() as u16;
    registry.list.push(imp);
    registry.names.insert(imp.name().as_bytes(), id);
    id
}

pub fn value_implementation(id: u16) -> Option<&'static dyn ValueImplementation> {
    REGISTRY.lock().list.get(id as usize).copied()
}

pub fn value_implementation_named(
    name: &[u8],
) -> Option<(u16, &'static dyn ValueImplementation)> {
    let registry = REGISTRY.lock();
    let id = *registry.names.map(name)?;
    registry.list.get(id as usize).copied().map(|imp| (id, imp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_implementations_are_preregistered() {
        let (_, nil) = value_implementation_named(b"nil").expect("nil registered");
        assert_eq!(nil.name(), "nil");
        let (int_id, int) = value_implementation_named(b"int64").expect("int64 registered");
        assert_eq!(int.name(), "int64");
        assert_eq!(value_implementation(int_id).unwrap().name(), "int64");
        assert!(value_implementation_named(b"no-such").is_none());
    }

    #[test]
    fn reregistration_is_idempotent() {
        let (id, imp) = value_implementation_named(b"text").unwrap();
        assert_eq!(register_value_implementation(imp), id);
    }
}
