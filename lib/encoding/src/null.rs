//! The encoding that carries nothing.

use alloc::sync::Arc;

use crate::Encoding;

/// Placeholder for interfaces that must hand back an encoding when there
/// is nothing to say. Only the required contract exists; every optional
/// operation keeps its refusing default.
pub struct NullEncoding;

impl NullEncoding {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl Encoding for NullEncoding {
    fn length(&self) -> usize {
        0
    }

    fn limit(&self) -> Option<usize> {
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_everything_quietly() {
        let e = NullEncoding::new();
        assert_eq!(e.length(), 0);
        assert!(!e.append_byte(0));
        assert!(!e.append_bytes(b"x"));
        assert_eq!(e.pop_last_byte(), None);
        assert_eq!(e.fill(0, 10), 0);
        assert!(e.content_to_vec().is_empty());
        assert!(e.duplicate_empty().is_none());
    }
}
