#![cfg_attr(not(test), no_std)]

//! The event layer: deferred callbacks, deadline alarms, and the
//! clock/power dependency graph they pace.

extern crate alloc;

mod alarm;
mod clock;
mod power;
mod queue;
mod time;

pub use alarm::{Alarm, AlarmQueue};
pub use clock::{
    ClockRef, CpuClock, DependentClock, FunctionClock, SourceClock, clock_has_implementation,
    clock_is_derived_from,
};
pub use power::{ALWAYS_ON_POWER_DOMAIN, AlwaysOnPowerDomain, PowerDomain, PowerDomainRef};
pub use queue::{EventQueue, EventRef, FnEvent, IEvent};
pub use time::IoTime;
