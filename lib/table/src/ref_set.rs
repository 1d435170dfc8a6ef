//! Reference-keyed set.
//!
//! Elements are held by clone, so for reference-counted keys membership
//! keeps the referent alive (the text encoder relies on this for its
//! visited set while printing recursive structures).

use alloc::vec::Vec;

use common::{integer_hash_u64, next_prime_u32};

use crate::{MAX_CHAIN_DEPTH, TableKey};

pub struct RefSet<K: TableKey> {
    buckets: Vec<Vec<K>>,
    table_grow: usize,
}

impl<K: TableKey> RefSet<K> {
    pub fn new(initial_size: u32) -> Self {
        let size = next_prime_u32(initial_size) as usize;
        let mut buckets = Vec::with_capacity(size);
        buckets.resize_with(size, Vec::new);
        Self {
            buckets,
            table_grow: size / 2,
        }
    }

    fn index_of(&self, key: &K) -> usize {
        integer_hash_u64(key.key_u64()) as usize % self.buckets.len()
    }

    /// Add a reference; false when it was already a member.
    pub fn insert(&mut self, key: K) -> bool {
        let index = self.index_of(&key);
        if self.buckets[index].iter().any(|k| *k == key) {
            return false;
        }
        if self.buckets[index].len() > MAX_CHAIN_DEPTH {
            self.grow();
            return self.insert(key);
        }
        self.buckets[index].push(key);
        true
    }

    fn grow(&mut self) {
        let new_size = next_prime_u32((self.buckets.len() + self.table_grow) as u32) as usize;
        let mut bigger: Vec<Vec<K>> = Vec::with_capacity(new_size);
        bigger.resize_with(new_size, Vec::new);
        for chain in self.buckets.drain(..) {
            for key in chain {
                let index = integer_hash_u64(key.key_u64()) as usize % new_size;
                bigger[index].push(key);
            }
        }
        self.buckets = bigger;
        self.table_grow = new_size / 2;
    }

    pub fn contains(&self, key: &K) -> bool {
        let index = self.index_of(key);
        self.buckets[index].iter().any(|k| k == key)
    }

    /// Drop a member's reference; false when it was not present.
    pub fn remove(&mut self, key: &K) -> bool {
        let index = self.index_of(key);
        if let Some(at) = self.buckets[index].iter().position(|k| k == key) {
            self.buckets[index].remove(at);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RefSet;

    #[test]
    fn membership() {
        let mut s: RefSet<u64> = RefSet::new(17);
        assert!(s.insert(42));
        assert!(!s.insert(42));
        assert!(s.contains(&42));
        assert!(!s.contains(&43));
        assert!(s.remove(&42));
        assert!(!s.remove(&42));
    }

    #[test]
    fn survives_growth() {
        let mut s: RefSet<u64> = RefSet::new(2);
        for i in 0..500u64 {
            s.insert(i);
        }
        for i in 0..500u64 {
            assert!(s.contains(&i));
        }
    }
}
