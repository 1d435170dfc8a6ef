//! The clock dependency graph.
//!
//! Clocks form a directed graph: sources feed dependent clocks, function
//! clocks (PLLs, dividers) have both an input and outputs. Starting a
//! clock starts its input first, so bringing up a leaf brings up the whole
//! chain to its source.

use alloc::sync::Arc;
use alloc::vec::Vec;

use downcast_rs::{Downcast, impl_downcast};

use crate::power::{AlwaysOnPowerDomain, PowerDomain, PowerDomainRef};

pub type ClockRef = Arc<dyn CpuClock>;

pub trait CpuClock: Downcast + Send + Sync {
    /// Frequency the clock runs at right now, in Hz. Stopped clocks
    /// report their expected frequency; gating is the power domain's
    /// business.
    fn current_frequency(&self) -> f64;

    fn expected_frequency(&self) -> f64 {
        self.current_frequency()
    }

    fn input(&self) -> Option<ClockRef> {
        None
    }

    fn power_domain(&self) -> PowerDomainRef {
        Arc::new(AlwaysOnPowerDomain)
    }

    /// Bring the clock up; the input chain starts first and a failure
    /// anywhere aborts the start.
    fn start(&self) -> bool {
        match self.input() {
            Some(input) => input.start(),
            None => true,
        }
    }

    fn stop(&self) {}

    /// Visit dependent clocks; stop when the callback returns false.
    fn iterate_outputs(&self, _f: &mut dyn FnMut(&ClockRef) -> bool) {}
}

impl_downcast!(CpuClock);

/// True when `clock` or any clock on its input chain is a `T`.
pub fn clock_is_derived_from<T: CpuClock>(clock: &ClockRef) -> bool {
    let mut cursor = Some(clock.clone());
    while let Some(c) = cursor {
        if c.as_ref().as_any().is::<T>() {
            return true;
        }
        cursor = c.input();
    }
    false
}

/// True when `clock` itself is a `T`. The runtime-walked specialisation
/// chains of the original collapse into the concrete type here.
pub fn clock_has_implementation<T: CpuClock>(clock: &ClockRef) -> bool {
    clock.as_ref().as_any().is::<T>()
}

/// A root oscillator: no input, a fixed frequency, downstream outputs.
pub struct SourceClock {
    pub frequency: f64,
    pub outputs: mutex::SpinNoIrqLock<Vec<ClockRef>>,
}

impl SourceClock {
    pub fn new(frequency: f64) -> Arc<Self> {
        Arc::new(Self {
            frequency,
            outputs: mutex::SpinNoIrqLock::new(Vec::new()),
        })
    }

    pub fn add_output(&self, output: ClockRef) {
        self.outputs.lock().push(output);
    }
}

impl CpuClock for SourceClock {
    fn current_frequency(&self) -> f64 {
        self.frequency
    }

    fn iterate_outputs(&self, f: &mut dyn FnMut(&ClockRef) -> bool) {
        for output in self.outputs.lock().iter() {
            if !f(output) {
                return;
            }
        }
    }
}

/// A clock fed by exactly one input.
pub struct DependentClock {
    pub input: ClockRef,
    pub scale: f64,
}

impl DependentClock {
    pub fn new(input: ClockRef, scale: f64) -> Arc<Self> {
        Arc::new(Self { input, scale })
    }
}

impl CpuClock for DependentClock {
    fn current_frequency(&self) -> f64 {
        self.input.current_frequency() * self.scale
    }

    fn expected_frequency(&self) -> f64 {
        self.input.expected_frequency() * self.scale
    }

    fn input(&self) -> Option<ClockRef> {
        Some(self.input.clone())
    }
}

/// Input and outputs both: the shape of a PLL or divider bank.
pub struct FunctionClock {
    pub input: ClockRef,
    pub scale: f64,
    pub outputs: mutex::SpinNoIrqLock<Vec<ClockRef>>,
}

impl FunctionClock {
    pub fn new(input: ClockRef, scale: f64) -> Arc<Self> {
        Arc::new(Self {
            input,
            scale,
            outputs: mutex::SpinNoIrqLock::new(Vec::new()),
        })
    }

    pub fn add_output(&self, output: ClockRef) {
        self.outputs.lock().push(output);
    }
}

impl CpuClock for FunctionClock {
    fn current_frequency(&self) -> f64 {
        self.input.current_frequency() * self.scale
    }

    fn input(&self) -> Option<ClockRef> {
        Some(self.input.clone())
    }

    fn iterate_outputs(&self, f: &mut dyn FnMut(&ClockRef) -> bool) {
        for output in self.outputs.lock().iter() {
            if !f(output) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependent_chains_scale_frequency() {
        let source = SourceClock::new(8_000_000.0);
        let pll: ClockRef = FunctionClock::new(source.clone(), 6.0);
        let core: ClockRef = DependentClock::new(pll.clone(), 0.5);
        assert_eq!(core.current_frequency(), 24_000_000.0);
        assert_eq!(core.expected_frequency(), 24_000_000.0);
    }

    #[test]
    fn derivation_walks_the_input_chain() {
        let source = SourceClock::new(32_768.0);
        let source_ref: ClockRef = source.clone();
        let leaf: ClockRef = DependentClock::new(source_ref.clone(), 1.0);

        assert!(clock_is_derived_from::<SourceClock>(&leaf));
        assert!(clock_is_derived_from::<DependentClock>(&leaf));
        assert!(!clock_has_implementation::<SourceClock>(&leaf));
        assert!(clock_has_implementation::<DependentClock>(&leaf));
        assert!(clock_has_implementation::<SourceClock>(&source_ref));
    }

    #[test]
    fn start_reaches_the_source() {
        let source = SourceClock::new(1.0);
        let leaf: ClockRef = DependentClock::new(source, 1.0);
        assert!(leaf.start());
    }

    #[test]
    fn outputs_iterate_until_stopped() {
        let source = SourceClock::new(1.0);
        for scale in [1.0, 2.0, 3.0] {
            let src: ClockRef = source.clone();
            source.add_output(DependentClock::new(src, scale));
        }
        let mut seen = 0;
        source.iterate_outputs(&mut |_| {
            seen += 1;
            true
        });
        assert_eq!(seen, 3);

        let mut first = 0;
        source.iterate_outputs(&mut |_| {
            first += 1;
            false
        });
        assert_eq!(first, 1);
    }
}
