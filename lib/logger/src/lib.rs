#![cfg_attr(not(test), no_std)]

//! Runtime logging through the `log` facade.
//!
//! The platform registers a console sink once at startup; until then log
//! records go nowhere. Levels follow the runtime's own table (see
//! [`systype::LogLevel`]): a message is emitted only when the configured
//! level admits it.

extern crate alloc;

use alloc::format;

use log::{Level, LevelFilter};
use spin::Once;
use systype::{LogLevel, MemoryInfo};

/// Where log lines end up: a UART, a semihosting channel, stderr.
pub trait Console: Send + Sync {
    fn write_line(&self, line: &str);
}

static CONSOLE: Once<&'static dyn Console> = Once::new();

struct RuntimeLogger;

static LOGGER: RuntimeLogger = RuntimeLogger;

impl log::Log for RuntimeLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(console) = CONSOLE.get() {
            console.write_line(&format!(
                "\x1b[{}m[{:>5}]\x1b[0m {}",
                level2color(record.level()),
                record.level(),
                record.args()
            ));
        }
    }

    fn flush(&self) {}
}

/// Install the logger at the given runtime level. Safe to call more than
/// once; later calls only adjust the level.
pub fn init(level: LogLevel) {
    log::set_logger(&LOGGER).ok();
    log::set_max_level(level.to_level_filter());
}

pub fn set_console(console: &'static dyn Console) {
    CONSOLE.call_once(|| console);
}

pub fn set_level(level: LogLevel) {
    log::set_max_level(level.to_level_filter());
}

pub fn level2color(level: Level) -> u8 {
    match level {
        Level::Error => 31, // Red
        Level::Warn => 93,  // BrightYellow
        Level::Info => 36,  // Cyan
        Level::Debug => 32, // Green
        Level::Trace => 90, // BrightBlack
    }
}

/// The startup banner: who we are and how the byte memory came up.
pub fn log_startup_message(device_name: &str, byte_memory: &MemoryInfo, level: LogLevel) {
    let Some(level) = to_log_level(level) else {
        return;
    };
    let field1 = config::identity::BANNER_FIELD1;
    let field2 = config::identity::BANNER_FIELD2;
    log::log!(
        level,
        "{:<field1$}{:<field2$}complete",
        device_name,
        "startup"
    );
    log::log!(
        level,
        "{:<field1$}{:<field2$}io bm: {} bytes of {} used",
        "",
        "",
        byte_memory.used_bytes,
        byte_memory.total_bytes
    );
}

fn to_log_level(level: LogLevel) -> Option<Level> {
    match level.to_level_filter() {
        LevelFilter::Off => None,
        filter => filter.to_level(),
    }
}
