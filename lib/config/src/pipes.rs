//! Default pipe geometry for socket ports

/// Default transmit pipe ring size.
pub const DEFAULT_TRANSMIT_PIPE_LENGTH: usize = 4;
/// Default receive pipe ring size.
pub const DEFAULT_RECEIVE_PIPE_LENGTH: usize = 4;

/// Initial byte-buffer size of a fresh binary encoding.
pub const ENCODING_INITIAL_SIZE: usize = 64;
/// Bytes added to a binary encoding's buffer per grow step.
pub const ENCODING_GROWTH_INCREMENT: usize = 64;
