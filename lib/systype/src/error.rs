use strum::FromRepr;

/// Unrecoverable runtime conditions.
///
/// Raising one of these means an invariant has been violated and no local
/// recovery is possible. Recoverable conditions (allocation failure, decode
/// failure, a socket refusing a message) are reported through `Option`,
/// `Result` or `bool` returns instead and never come through here.
#[derive(FromRepr, Clone, Copy, Debug, Eq, PartialEq)]
#[repr(i32)]
pub enum PanicCode {
    /// Internal invariant broken
    UnrecoverableError = 1,
    /// Catch-all for states that should be impossible
    SomethingBadHappened = 2,
    /// A peripheral misbehaved
    DeviceError = 3,
    /// An allocation the runtime cannot operate without failed
    OutOfMemory = 4,
    /// The time source or clock tree failed
    TimeClockError = 5,
    /// An operation was applied to an object that cannot perform it
    InvalidOperation = 6,
}

/// Report an unrecoverable condition and halt.
///
/// On firmware builds the panic handler spins forever; on the host it
/// aborts the test with the code in the message.
pub fn io_panic(code: PanicCode) -> ! {
    log::error!("io panic: {:?} ({})", code, code as i32);
    panic!("io panic: {:?}", code);
}
