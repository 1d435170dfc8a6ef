//! Age-bounded cache with open addressing.
//!
//! Entries live in a fixed prime-sized array. A key's primary slot is
//! `murmur3_32(key) % table_size`; colliding keys borrow any free slot and
//! are chained to the primary through successor/predecessor indices within
//! the same array. Removing a chain root promotes a chain member whose
//! primary hash equals the freed slot so lookups keep finding it.
//!
//! The table refuses to fill up: once the live count reaches 80% of the
//! table a prune pass sorts the shadow `ordered` array by
//! (free, access_count, age) and evicts the least-used tenth, giving the
//! owner a veto per entry through the purge callback.

use alloc::boxed::Box;
use alloc::vec::Vec;

use bitflags::bitflags;
use common::{murmur3_32, next_prime_u32, pq_sort};
use systype::{PanicCode, io_panic};

use crate::TableKey;

bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    struct EntryFlags: u32 {
        const FREE = 1 << 0;
        const USER1 = 1 << 1;
        const USER2 = 1 << 2;
    }
}

struct Entry<K, V> {
    key: Option<K>,
    value: Option<V>,
    age: i64,
    access_count: u32,
    flags: EntryFlags,
    successor: Option<usize>,
    predecessor: Option<usize>,
}

impl<K, V> Entry<K, V> {
    fn free() -> Self {
        Self {
            key: None,
            value: None,
            age: 0,
            access_count: 0,
            flags: EntryFlags::FREE,
            successor: None,
            predecessor: None,
        }
    }

    fn is_free(&self) -> bool {
        self.flags.contains(EntryFlags::FREE)
    }
}

/// Called once before a prune pass begins.
pub type BeginPurge = Box<dyn FnMut() + Send>;
/// Called per eviction candidate; returning false vetoes the eviction.
pub type PurgeEntry<K, V> = Box<dyn FnMut(&K, &V) -> bool + Send>;

pub struct ConstrainedHash<K: TableKey, V: Clone> {
    entries: Vec<Entry<K, V>>,
    ordered: Vec<usize>,
    entry_count: usize,
    entry_limit: usize,
    prune_count: usize,
    age_counter: i64,
    begin_purge: Option<BeginPurge>,
    purge_entry: Option<PurgeEntry<K, V>>,
}

impl<K: TableKey, V: Clone> ConstrainedHash<K, V> {
    pub fn new(
        size: u32,
        begin_purge: Option<BeginPurge>,
        purge_entry: Option<PurgeEntry<K, V>>,
    ) -> Self {
        let table_size = next_prime_u32(size) as usize;
        let mut entries = Vec::with_capacity(table_size);
        entries.resize_with(table_size, Entry::free);
        Self {
            entries,
            ordered: (0..table_size).collect(),
            entry_count: 0,
            entry_limit: table_size * 4 / 5,
            prune_count: table_size / 10 + 1,
            age_counter: 0,
            begin_purge,
            purge_entry,
        }
    }

    pub fn count(&self) -> usize {
        self.entry_count
    }

    pub fn table_size(&self) -> usize {
        self.entries.len()
    }

    pub fn entry_limit(&self) -> usize {
        self.entry_limit
    }

    pub fn prune_count(&self) -> usize {
        self.prune_count
    }

    fn hash1(&self, key: &K) -> usize {
        murmur3_32(&key.key_u64().to_le_bytes()) as usize % self.entries.len()
    }

    fn find_entry(&self, key: &K) -> Option<usize> {
        let mut at = self.hash1(key);
        if self.entries[at].is_free() {
            return None;
        }
        loop {
            if self.entries[at].key.as_ref() == Some(key) {
                return Some(at);
            }
            at = self.entries[at].successor?;
        }
    }

    /// Retrieve a value; counts as an access.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let at = self.find_entry(key)?;
        self.entries[at].access_count += 1;
        self.entries[at].value.clone()
    }

    /// Existence test; does not count as an access.
    pub fn has_key(&self, key: &K) -> bool {
        self.find_entry(key).is_some()
    }

    pub fn set(&mut self, key: K, value: V) {
        self.prune();

        let mut at = self.hash1(&key);
        if !self.entries[at].is_free() {
            loop {
                if self.entries[at].key.as_ref() == Some(&key) {
                    self.entries[at].value = Some(value);
                    self.entries[at].access_count += 1;
                    return;
                }
                match self.entries[at].successor {
                    Some(next) => at = next,
                    None => break,
                }
            }
            let free = self.get_free_entry();
            self.entries[free].successor = None;
            self.entries[free].predecessor = Some(at);
            self.entries[at].successor = Some(free);
            at = free;
        }

        self.entry_count += 1;
        let entry = &mut self.entries[at];
        entry.key = Some(key);
        entry.value = Some(value);
        entry.age = self.age_counter;
        entry.access_count = 0;
        entry.flags = EntryFlags::empty();
        self.age_counter += 1;
    }

    /// Remove a key. When a chain root is freed, chain members whose
    /// primary hash is the freed slot are promoted into it (and the same
    /// again for each slot a promotion frees).
    pub fn unset(&mut self, key: &K) -> bool {
        let Some(root) = self.find_entry(key) else {
            return false;
        };
        let mut forward = self.entries[root].successor;
        let mut free_slot = root;

        self.unlink(root);
        self.entries[free_slot].key = None;
        self.entries[free_slot].value = None;
        self.entries[free_slot].flags = EntryFlags::FREE;

        // walk the rest of the chain pulling primal-hash entries into the
        // hole left behind
        loop {
            let promoted = self.find_chain_entry_for_slot(forward, free_slot);
            match promoted {
                Some(at) => {
                    forward = self.entries[at].successor;
                    self.move_entry(free_slot, at);
                    free_slot = at;
                }
                None => break,
            }
        }

        self.entry_count -= 1;
        true
    }

    fn find_chain_entry_for_slot(&self, from: Option<usize>, slot: usize) -> Option<usize> {
        let mut cursor = from;
        while let Some(at) = cursor {
            if let Some(key) = self.entries[at].key.as_ref() {
                if self.hash1(key) == slot {
                    return Some(at);
                }
            }
            cursor = self.entries[at].successor;
        }
        None
    }

    fn unlink(&mut self, at: usize) {
        let predecessor = self.entries[at].predecessor;
        let successor = self.entries[at].successor;
        if let Some(p) = predecessor {
            self.entries[p].successor = successor;
        }
        if let Some(s) = successor {
            self.entries[s].predecessor = predecessor;
        }
        self.entries[at].predecessor = None;
        self.entries[at].successor = None;
    }

    fn move_entry(&mut self, dest: usize, src: usize) {
        let key = self.entries[src].key.take();
        let value = self.entries[src].value.take();
        let age = self.entries[src].age;
        let access_count = self.entries[src].access_count;
        let successor = self.entries[src].successor;
        let predecessor = self.entries[src].predecessor;

        if let Some(s) = successor {
            self.entries[s].predecessor = Some(dest);
        }
        if let Some(p) = predecessor {
            self.entries[p].successor = Some(dest);
        }

        let d = &mut self.entries[dest];
        d.key = key;
        d.value = value;
        d.age = age;
        d.access_count = access_count;
        d.successor = successor;
        d.predecessor = predecessor;
        d.flags = EntryFlags::empty();

        let s = &mut self.entries[src];
        s.flags = EntryFlags::FREE;
        s.access_count = 0;
        s.successor = None;
        s.predecessor = None;
    }

    fn get_free_entry(&mut self) -> usize {
        // after a sort the free entries congregate at the tail
        for &at in self.ordered.iter().rev() {
            if self.entries[at].is_free() {
                return at;
            }
        }
        io_panic(PanicCode::UnrecoverableError);
    }

    /// Order the shadow array so the least-accessed, oldest entries come
    /// first and free entries sink to the end.
    pub fn sort(&mut self) {
        let entries = &self.entries;
        let mut ordered = core::mem::take(&mut self.ordered);
        pq_sort(&mut ordered, |&a, &b| {
            let ea = &entries[a];
            let eb = &entries[b];
            match (ea.is_free(), eb.is_free()) {
                (true, true) => core::cmp::Ordering::Equal,
                (true, false) => core::cmp::Ordering::Greater,
                (false, true) => core::cmp::Ordering::Less,
                (false, false) => ea
                    .access_count
                    .cmp(&eb.access_count)
                    .then(ea.age.cmp(&eb.age)),
            }
        });
        self.ordered = ordered;
    }

    fn prune(&mut self) {
        if self.entry_count < self.entry_limit {
            return;
        }
        if let Some(begin) = self.begin_purge.as_mut() {
            begin();
        }
        self.sort();
        let candidates: Vec<usize> = self
            .ordered
            .iter()
            .copied()
            .filter(|&at| !self.entries[at].is_free())
            .take(self.prune_count)
            .collect();
        for at in candidates {
            let (Some(key), Some(value)) = (
                self.entries[at].key.clone(),
                self.entries[at].value.clone(),
            ) else {
                continue;
            };
            let evict = match self.purge_entry.as_mut() {
                Some(purge) => purge(&key, &value),
                None => true,
            };
            if evict {
                self.unset(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConstrainedHash;
    use alloc::boxed::Box;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    fn cache(size: u32) -> ConstrainedHash<u64, u64> {
        ConstrainedHash::new(size, None, None)
    }

    #[test]
    fn set_then_get_returns_the_value() {
        let mut c = cache(10);
        c.set(1, 100);
        c.set(2, 200);
        assert_eq!(c.get(&1), Some(100));
        assert_eq!(c.get(&2), Some(200));
        assert_eq!(c.get(&3), None);
        assert!(c.has_key(&1));
        assert!(!c.has_key(&3));
    }

    #[test]
    fn replacing_a_key_does_not_grow_the_count() {
        let mut c = cache(10);
        c.set(1, 100);
        c.set(1, 101);
        assert_eq!(c.count(), 1);
        assert_eq!(c.get(&1), Some(101));
    }

    #[test]
    fn geometry_of_a_ten_slot_cache() {
        let c = cache(10);
        assert_eq!(c.table_size(), 11);
        assert_eq!(c.entry_limit(), 8);
        assert_eq!(c.prune_count(), 2);
    }

    #[test]
    fn insertion_past_the_limit_triggers_eviction() {
        let purged = Arc::new(AtomicUsize::new(0));
        let observed = purged.clone();
        let mut c: ConstrainedHash<u64, u64> = ConstrainedHash::new(
            10,
            None,
            Some(Box::new(move |_, _| {
                observed.fetch_add(1, Ordering::Relaxed);
                true
            })),
        );
        for i in 0..9u64 {
            c.set(i, i * 10);
        }
        assert!(c.count() <= c.entry_limit());
        assert!(purged.load(Ordering::Relaxed) >= 1);
    }

    #[test]
    fn purge_callback_can_veto() {
        let mut c: ConstrainedHash<u64, u64> =
            ConstrainedHash::new(10, None, Some(Box::new(|_, _| false)));
        for i in 0..9u64 {
            c.set(i, i);
        }
        // nothing was evicted, every key survives
        for i in 0..9u64 {
            assert!(c.has_key(&i));
        }
    }

    #[test]
    fn least_used_entries_are_evicted_first() {
        let mut c = cache(10);
        for i in 0..8u64 {
            c.set(i, i);
        }
        // touch everything except key 0 so key 0 is the cold one
        for i in 1..8u64 {
            c.get(&i);
        }
        c.set(100, 100); // crosses the limit, prunes two
        assert!(!c.has_key(&0));
        assert!(c.has_key(&100));
    }

    fn colliding_keys(c: &ConstrainedHash<u64, u64>, count: usize) -> alloc::vec::Vec<u64> {
        // find keys sharing a primary slot
        let target = c_hash(c, 1);
        let mut out = alloc::vec![1u64];
        let mut k = 2u64;
        while out.len() < count {
            if c_hash(c, k) == target {
                out.push(k);
            }
            k += 1;
        }
        out
    }

    fn c_hash(c: &ConstrainedHash<u64, u64>, k: u64) -> usize {
        common::murmur3_32(&k.to_le_bytes()) as usize % c.table_size()
    }

    #[test]
    fn removing_a_chain_root_promotes_members() {
        let mut c = cache(40);
        let keys = colliding_keys(&c, 3);
        for &k in &keys {
            c.set(k, k + 1000);
        }
        assert_eq!(c.count(), 3);

        // removing the root must leave the rest reachable
        assert!(c.unset(&keys[0]));
        assert_eq!(c.get(&keys[1]), Some(keys[1] + 1000));
        assert_eq!(c.get(&keys[2]), Some(keys[2] + 1000));
        assert_eq!(c.count(), 2);

        assert!(c.unset(&keys[1]));
        assert_eq!(c.get(&keys[2]), Some(keys[2] + 1000));
        assert!(!c.has_key(&keys[1]));
    }

    #[test]
    fn unset_of_a_missing_key_is_false() {
        let mut c = cache(10);
        c.set(1, 1);
        assert!(!c.unset(&2));
        assert!(c.unset(&1));
        assert!(!c.unset(&1));
    }
}
