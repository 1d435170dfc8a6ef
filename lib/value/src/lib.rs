#![cfg_attr(not(test), no_std)]

//! Values and the references that name them.
//!
//! A value lives inside a [`ValueMemory`]'s heap with a small header
//! (implementation id, reference count, payload length). Code never holds
//! a value directly; it holds a [`Vref`], an 8-byte-payload handle whose
//! flavor decides what referencing means. Heap-flavored references count;
//! constant, data-section and stack flavors are free to copy.
//!
//! Reclamation is reference counting plus a mark-free sweep: dropping the
//! last `Vref` makes a value collectable and a later [`ValueMemory::do_gc`]
//! pass frees it. Nothing here chases cycles; a memory dropped as a whole
//! takes its cycles with it.

extern crate alloc;

mod core_values;
mod implementation;
mod memory;
mod vref;

pub use core_values::{
    FLOAT64_IMPLEMENTATION, INT64_IMPLEMENTATION, NIL_IMPLEMENTATION, TEXT_IMPLEMENTATION,
    float64_of, float64_value, int64_of, int64_value, nil_value, text_value,
};
pub use implementation::{
    ValueImplementation, ValueSink, register_value_implementation, value_implementation,
    value_implementation_named,
};
pub use memory::{ValueMemory, register_value_memory, unregister_value_memory, value_memory_by_id};
pub use vref::Vref;

/// The handle that names no value.
pub const INVALID_VREF: Vref = Vref::Invalid;
