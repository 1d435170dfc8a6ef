use strum::FromRepr;

/// Runtime log levels.
///
/// A message is emitted only if the configured level is at least the
/// message's level. The levels map onto the `log` facade so that the
/// ordinary `log::error!`..`log::debug!` macros can be used everywhere.
#[derive(FromRepr, Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum LogLevel {
    NoLogging = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Detail = 4,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::NoLogging => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Detail => log::LevelFilter::Debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_order_matches_emission_rule() {
        assert!(LogLevel::Detail > LogLevel::Info);
        assert!(LogLevel::Info > LogLevel::Warning);
        assert!(LogLevel::Warning > LogLevel::Error);
        assert!(LogLevel::Error > LogLevel::NoLogging);
        assert_eq!(LogLevel::from_repr(3), Some(LogLevel::Info));
    }
}
