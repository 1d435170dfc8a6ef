#![cfg_attr(not(test), no_std)]

//! The runtime context: one CPU core's worth of event-driven machinery.
//!
//! An [`Io`] instance owns the byte memory, two value memories (short and
//! long term), the event and alarm queues, and the task pipe. Everything
//! application code touches hangs off one of these; platform code feeds
//! it time and interrupts.

extern crate alloc;

mod context;
pub mod retained;

pub use context::{Io, IoConfig};
pub use systype::{LogLevel, MemoryInfo, PanicCode, io_panic};
