//! Byte-string keyed map with bucketed chaining.

use alloc::vec::Vec;

use common::{next_prime_u32, tommy_hash_u32};

use crate::MAX_CHAIN_DEPTH;

struct Entry<V> {
    bytes: Vec<u8>,
    value: V,
}

/// Prime-sized bucket array; each bucket chains entries in insertion order.
/// When any chain passes depth 7 on insert the table grows to the next
/// prime past `size + size/2` and rehashes everything.
pub struct StringTable<V> {
    buckets: Vec<Vec<Entry<V>>>,
    table_grow: usize,
}

impl<V> StringTable<V> {
    pub fn new(initial_size: u32) -> Self {
        let size = next_prime_u32(initial_size) as usize;
        let mut buckets = Vec::with_capacity(size);
        buckets.resize_with(size, Vec::new);
        Self {
            buckets,
            table_grow: size / 2,
        }
    }

    fn index_of(&self, key: &[u8]) -> usize {
        tommy_hash_u32(0, key) as usize % self.buckets.len()
    }

    /// Insert or replace. Returns true when the key was new.
    pub fn insert(&mut self, key: &[u8], value: V) -> bool {
        let index = self.index_of(key);
        let chain = &mut self.buckets[index];
        if let Some(entry) = chain.iter_mut().find(|e| e.bytes == key) {
            entry.value = value;
            return false;
        }
        let depth = chain.len();
        if depth > MAX_CHAIN_DEPTH {
            self.grow();
            return self.insert(key, value);
        }
        self.buckets[index].push(Entry {
            bytes: key.to_vec(),
            value,
        });
        true
    }

    fn grow(&mut self) {
        let new_size = next_prime_u32((self.buckets.len() + self.table_grow) as u32) as usize;
        let mut bigger: Vec<Vec<Entry<V>>> = Vec::with_capacity(new_size);
        bigger.resize_with(new_size, Vec::new);
        for chain in self.buckets.drain(..) {
            for entry in chain {
                let index = tommy_hash_u32(0, &entry.bytes) as usize % new_size;
                bigger[index].push(entry);
            }
        }
        self.buckets = bigger;
        self.table_grow = new_size / 2;
    }

    pub fn remove(&mut self, key: &[u8]) -> bool {
        let index = self.index_of(key);
        let chain = &mut self.buckets[index];
        if let Some(at) = chain.iter().position(|e| e.bytes == key) {
            chain.remove(at);
            true
        } else {
            false
        }
    }

    pub fn map(&self, key: &[u8]) -> Option<&V> {
        let index = self.index_of(key);
        self.buckets[index]
            .iter()
            .find(|e| e.bytes == key)
            .map(|e| &e.value)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.map(key).is_some()
    }

    /// Visit every mapping; stop early when the callback returns false.
    pub fn iterate(&self, mut f: impl FnMut(&[u8], &V) -> bool) {
        for chain in self.buckets.iter() {
            for entry in chain.iter() {
                if !f(&entry.bytes, &entry.value) {
                    return;
                }
            }
        }
    }

    pub fn table_size(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::StringTable;
    use alloc::format;

    #[test]
    fn insert_map_remove() {
        let mut t: StringTable<u32> = StringTable::new(17);
        assert!(t.insert(b"nil", 1));
        assert!(t.insert(b"int64", 2));
        assert_eq!(t.map(b"nil"), Some(&1));
        assert_eq!(t.map(b"int64"), Some(&2));
        assert_eq!(t.map(b"float64"), None);

        // replacing is not a fresh insert
        assert!(!t.insert(b"nil", 9));
        assert_eq!(t.map(b"nil"), Some(&9));

        assert!(t.remove(b"nil"));
        assert!(!t.remove(b"nil"));
        assert_eq!(t.map(b"nil"), None);
    }

    #[test]
    fn grows_past_deep_chains_and_keeps_entries() {
        let mut t: StringTable<usize> = StringTable::new(2);
        let before = t.table_size();
        for i in 0..200usize {
            t.insert(format!("key-{i}").as_bytes(), i);
        }
        assert!(t.table_size() > before);
        for i in 0..200usize {
            assert_eq!(t.map(format!("key-{i}").as_bytes()), Some(&i));
        }
    }

    #[test]
    fn iterate_sees_everything() {
        let mut t: StringTable<usize> = StringTable::new(5);
        for i in 0..20usize {
            t.insert(format!("k{i}").as_bytes(), i);
        }
        let mut count = 0;
        t.iterate(|_, _| {
            count += 1;
            true
        });
        assert_eq!(count, 20);

        let mut first_only = 0;
        t.iterate(|_, _| {
            first_only += 1;
            false
        });
        assert_eq!(first_only, 1);
    }

    #[test]
    fn empty_key_is_a_valid_key() {
        let mut t: StringTable<u8> = StringTable::new(3);
        assert!(t.insert(b"", 7));
        assert_eq!(t.map(b""), Some(&7));
    }
}
