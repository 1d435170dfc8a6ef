//! Power domains.

use alloc::sync::Arc;

/// Something clocks sit inside that can be switched. Real domains gate
/// regulators and rails; the always-on domain satisfies clocks with no
/// switchable supply.
pub trait PowerDomain: Send + Sync {
    fn turn_on(&self);
    fn turn_off(&self);
}

pub type PowerDomainRef = Arc<dyn PowerDomain>;

pub struct AlwaysOnPowerDomain;

impl PowerDomain for AlwaysOnPowerDomain {
    fn turn_on(&self) {}
    fn turn_off(&self) {}
}

pub static ALWAYS_ON_POWER_DOMAIN: AlwaysOnPowerDomain = AlwaysOnPowerDomain;
