#![cfg_attr(not(test), no_std)]

mod spin_mutex;

pub use spin_mutex::SpinMutex;

pub type SpinLock<T> = SpinMutex<T, Spin>;
pub type SpinNoIrqLock<T> = SpinMutex<T, SpinNoIrq>;

/// Low-level support for a spinlock.
///
/// `before_lock` produces the critical-section token; dropping the guard
/// hands it back through `after_unlock`. Interrupt-masking policies restore
/// the saved state there.
pub trait MutexSupport {
    /// Guard data
    type GuardData;
    /// Called before lock() & try_lock()
    fn before_lock() -> Self::GuardData;
    /// Called when MutexGuard is dropping
    fn after_unlock(_: &mut Self::GuardData);
}

/// Plain spin policy, no interrupt masking.
#[derive(Debug)]
pub struct Spin;

impl MutexSupport for Spin {
    type GuardData = ();
    #[inline(always)]
    fn before_lock() -> Self::GuardData {}
    #[inline(always)]
    fn after_unlock(_: &mut Self::GuardData) {}
}

/// Saved interrupt-enable state, restored on drop.
pub struct InterruptGuard(#[allow(dead_code)] bool);

impl InterruptGuard {
    fn new() -> Self {
        #[cfg(target_arch = "riscv64")]
        {
            let sie = riscv::register::sstatus::read().sie();
            unsafe {
                riscv::register::sstatus::clear_sie();
            }
            Self(sie)
        }
        #[cfg(not(target_arch = "riscv64"))]
        Self(false)
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        #[cfg(target_arch = "riscv64")]
        if self.0 {
            unsafe {
                riscv::register::sstatus::set_sie();
            }
        }
    }
}

/// Spin policy that masks interrupts for the duration of the lock. This is
/// the runtime's critical-section pair: every byte-memory mutator and every
/// queue shared with interrupt handlers locks through it.
#[derive(Debug)]
pub struct SpinNoIrq;

impl MutexSupport for SpinNoIrq {
    type GuardData = InterruptGuard;
    #[inline(always)]
    fn before_lock() -> Self::GuardData {
        InterruptGuard::new()
    }
    #[inline(always)]
    fn after_unlock(_: &mut Self::GuardData) {}
}
