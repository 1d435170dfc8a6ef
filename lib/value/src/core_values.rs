//! The value implementations every runtime instance carries.

use alloc::vec::Vec;

use common::{read_uvarint, write_uvarint};

use crate::implementation::{ValueImplementation, ValueSink, value_implementation_named};
use crate::memory::ValueMemory;
use crate::vref::Vref;

pub struct NilValue;
pub struct Int64Value;
pub struct Float64Value;
pub struct TextValue;

pub static NIL_IMPLEMENTATION: NilValue = NilValue;
pub static INT64_IMPLEMENTATION: Int64Value = Int64Value;
pub static FLOAT64_IMPLEMENTATION: Float64Value = Float64Value;
pub static TEXT_IMPLEMENTATION: TextValue = TextValue;

pub(crate) static CORE_IMPLEMENTATIONS: &[&'static dyn ValueImplementation] = &[
    &NIL_IMPLEMENTATION,
    &INT64_IMPLEMENTATION,
    &FLOAT64_IMPLEMENTATION,
    &TEXT_IMPLEMENTATION,
];

/// Copy `base`'s payload into `value` when both exist. The two accesses
/// are kept apart so the byte memory is locked once at a time.
fn copy_payload(vm: &ValueMemory, value: &Vref, base: &Vref) -> bool {
    if base.is_invalid() {
        return true;
    }
    let Some(bytes) = base.with_ro_bytes(|b| b.to_vec()) else {
        return true;
    };
    vm.with_value_rw(value, |dst| {
        if dst.len() == bytes.len() {
            dst.copy_from_slice(&bytes);
            true
        } else {
            false
        }
    })
    .unwrap_or(false)
}

impl ValueImplementation for NilValue {
    fn name(&self) -> &'static str {
        "nil"
    }

    fn initialise(&self, _vm: &ValueMemory, _value: &Vref, _base: &Vref) -> bool {
        true
    }

    fn encode_text(&self, _vm: &ValueMemory, _value: &Vref, sink: &mut dyn ValueSink) -> bool {
        sink.push_bytes(b"nil")
    }

    fn encode_x70_body(&self, _vm: &ValueMemory, _value: &Vref, _sink: &mut dyn ValueSink) -> bool {
        true
    }

    fn decode_x70_body(&self, vm: &ValueMemory, _body: &[u8]) -> Option<(Vref, usize)> {
        let value = nil_value(vm);
        value.is_valid().then_some((value, 0))
    }
}

impl ValueImplementation for Int64Value {
    fn name(&self) -> &'static str {
        "int64"
    }

    fn initialise(&self, vm: &ValueMemory, value: &Vref, base: &Vref) -> bool {
        copy_payload(vm, value, base)
    }

    fn encode_text(&self, vm: &ValueMemory, value: &Vref, sink: &mut dyn ValueSink) -> bool {
        match int64_of(vm, value) {
            Some(v) => sink.push_bytes(alloc::format!("{v}").as_bytes()),
            None => false,
        }
    }

    fn encode_x70_body(&self, vm: &ValueMemory, value: &Vref, sink: &mut dyn ValueSink) -> bool {
        match int64_of(vm, value) {
            Some(v) => sink.push_bytes(&v.to_le_bytes()),
            None => false,
        }
    }

    fn decode_x70_body(&self, vm: &ValueMemory, body: &[u8]) -> Option<(Vref, usize)> {
        let bytes: [u8; 8] = body.get(..8)?.try_into().ok()?;
        let value = int64_value(vm, i64::from_le_bytes(bytes));
        value.is_valid().then_some((value, 8))
    }
}

impl ValueImplementation for Float64Value {
    fn name(&self) -> &'static str {
        "float64"
    }

    fn initialise(&self, vm: &ValueMemory, value: &Vref, base: &Vref) -> bool {
        copy_payload(vm, value, base)
    }

    fn encode_text(&self, vm: &ValueMemory, value: &Vref, sink: &mut dyn ValueSink) -> bool {
        match float64_of(vm, value) {
            Some(v) => sink.push_bytes(alloc::format!("{v}").as_bytes()),
            None => false,
        }
    }

    fn encode_x70_body(&self, vm: &ValueMemory, value: &Vref, sink: &mut dyn ValueSink) -> bool {
        match float64_of(vm, value) {
            Some(v) => sink.push_bytes(&v.to_le_bytes()),
            None => false,
        }
    }

    fn decode_x70_body(&self, vm: &ValueMemory, body: &[u8]) -> Option<(Vref, usize)> {
        let bytes: [u8; 8] = body.get(..8)?.try_into().ok()?;
        let value = float64_value(vm, f64::from_le_bytes(bytes));
        value.is_valid().then_some((value, 8))
    }
}

impl ValueImplementation for TextValue {
    fn name(&self) -> &'static str {
        "text"
    }

    fn initialise(&self, vm: &ValueMemory, value: &Vref, base: &Vref) -> bool {
        copy_payload(vm, value, base)
    }

    fn encode_text(&self, vm: &ValueMemory, value: &Vref, sink: &mut dyn ValueSink) -> bool {
        vm.with_value_ro(value, |bytes| bytes.to_vec())
            .map(|bytes| sink.push_bytes(&bytes))
            .unwrap_or(false)
    }

    fn encode_x70_body(&self, vm: &ValueMemory, value: &Vref, sink: &mut dyn ValueSink) -> bool {
        let Some(bytes) = vm.with_value_ro(value, |b| b.to_vec()) else {
            return false;
        };
        let mut head: Vec<u8> = Vec::new();
        write_uvarint(bytes.len() as u32, |b| {
            head.push(b);
            true
        });
        sink.push_bytes(&head) && sink.push_bytes(&bytes)
    }

    fn decode_x70_body(&self, vm: &ValueMemory, body: &[u8]) -> Option<(Vref, usize)> {
        let (length, consumed) = read_uvarint(body)?;
        let bytes = body.get(consumed..consumed + length as usize)?;
        let value = text_value(vm, bytes);
        value
            .is_valid()
            .then_some((value, consumed + length as usize))
    }
}

pub fn nil_value(vm: &ValueMemory) -> Vref {
    match value_implementation_named(b"nil") {
        Some((id, _)) => vm.allocate_value(id, 0),
        None => Vref::Invalid,
    }
}

pub fn int64_value(vm: &ValueMemory, v: i64) -> Vref {
    let Some((id, _)) = value_implementation_named(b"int64") else {
        return Vref::Invalid;
    };
    let value = vm.allocate_value(id, 8);
    if value.is_valid() {
        vm.with_value_rw(&value, |bytes| bytes.copy_from_slice(&v.to_le_bytes()));
    }
    value
}

pub fn float64_value(vm: &ValueMemory, v: f64) -> Vref {
    let Some((id, _)) = value_implementation_named(b"float64") else {
        return Vref::Invalid;
    };
    let value = vm.allocate_value(id, 8);
    if value.is_valid() {
        vm.with_value_rw(&value, |bytes| bytes.copy_from_slice(&v.to_le_bytes()));
    }
    value
}

pub fn text_value(vm: &ValueMemory, text: &[u8]) -> Vref {
    let Some((id, _)) = value_implementation_named(b"text") else {
        return Vref::Invalid;
    };
    let value = vm.allocate_value(id, text.len());
    if value.is_valid() {
        vm.with_value_rw(&value, |bytes| bytes.copy_from_slice(text));
    }
    value
}

pub fn int64_of(vm: &ValueMemory, value: &Vref) -> Option<i64> {
    vm.with_value_ro(value, |bytes| {
        bytes
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .map(i64::from_le_bytes)
    })
    .flatten()
}

pub fn float64_of(vm: &ValueMemory, value: &Vref) -> Option<f64> {
    vm.with_value_ro(value, |bytes| {
        bytes
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .map(f64::from_le_bytes)
    })
    .flatten()
}
