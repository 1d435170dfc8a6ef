//! Value-bearing encodings.
//!
//! These carry a single numeric literal through interfaces that expect an
//! encoding; they own no byte buffer, so the buffer operations keep their
//! refusing defaults.

use alloc::sync::Arc;

use crate::{Encoding, EncodingRef};

pub struct Int64Encoding {
    value: i64,
}

impl Int64Encoding {
    pub fn new(value: i64) -> Arc<Self> {
        Arc::new(Self { value })
    }

    pub fn encoded_value(&self) -> i64 {
        self.value
    }
}

impl Encoding for Int64Encoding {
    fn length(&self) -> usize {
        0
    }

    fn limit(&self) -> Option<usize> {
        Some(0)
    }

    fn duplicate_empty(&self) -> Option<EncodingRef> {
        Some(Int64Encoding::new(self.value))
    }
}

pub struct Float64Encoding {
    value: f64,
}

impl Float64Encoding {
    pub fn new(value: f64) -> Arc<Self> {
        Arc::new(Self { value })
    }

    pub fn encoded_value(&self) -> f64 {
        self.value
    }
}

impl Encoding for Float64Encoding {
    fn length(&self) -> usize {
        0
    }

    fn limit(&self) -> Option<usize> {
        Some(0)
    }

    fn duplicate_empty(&self) -> Option<EncodingRef> {
        Some(Float64Encoding::new(self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EncodingRef;

    #[test]
    fn literals_survive_the_encoding_detour() {
        let e: EncodingRef = Int64Encoding::new(-7);
        assert_eq!(e.length(), 0);
        assert!(!e.append_byte(1), "no byte buffer to append into");
        let back = e.downcast_ref::<Int64Encoding>().unwrap();
        assert_eq!(back.encoded_value(), -7);

        let f: EncodingRef = Float64Encoding::new(2.5);
        assert_eq!(
            f.downcast_ref::<Float64Encoding>().unwrap().encoded_value(),
            2.5
        );
        assert!(f.downcast_ref::<Int64Encoding>().is_none());
    }
}
