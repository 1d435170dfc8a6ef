//! Device identity and retained-state geometry

/// Byte length of a device UID.
pub const UID_BYTE_LENGTH: usize = 16;

/// Byte length of an authentication key.
pub const AUTHENTICATION_KEY_BYTE_LENGTH: usize = 32;

/// UIDs below this value are reserved.
pub const UID_RESERVED_LIMIT: u32 = 0xffff;

/// Retained-state first-run flag values.
pub const FIRST_RUN_SET: u32 = 0xaaaa_aaaa;
pub const FIRST_RUN_CLEAR: u32 = 0xbbbb_bbbb;

/// Field widths used by the startup banner.
pub const BANNER_FIELD1: usize = 12;
pub const BANNER_FIELD2: usize = 10;
