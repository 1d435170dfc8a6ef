//! Cross-component scenarios: addresses, alarms, the cache, the heap.

use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use address::{Address, read_le_address, write_le_address};
use event::{Alarm, AlarmQueue, FnEvent, IoTime};
use runtime::{Io, IoConfig};
use table::ConstrainedHash;

#[test]
fn address_equality_with_trailing_zeros() {
    let long = Address::from_bytes(&[1, 0, 0, 0, 0]);
    assert_eq!(long.compare(&Address::U8(1)), CmpOrdering::Equal);
    assert_eq!(long.compare(&Address::U8(2)), CmpOrdering::Less);
    assert_eq!(Address::U8(2).compare(&long), CmpOrdering::Greater);
}

#[test]
fn address_wire_format_round_trips() {
    let mut buffer = [0u8; 16];

    let invalid = Address::invalid();
    assert_eq!(write_le_address(&mut buffer, &invalid), 1);
    assert_eq!(buffer[0], 0);
    let (decoded, consumed) = read_le_address(&buffer).unwrap();
    assert_eq!(consumed, 1);
    assert!(decoded.is_invalid());

    let one = Address::U8(1);
    assert_eq!(write_le_address(&mut buffer, &one), 2);
    assert_eq!(&buffer[..2], &[1, 1]);
    let (decoded, consumed) = read_le_address(&buffer).unwrap();
    assert_eq!(consumed, 2);
    assert_eq!(decoded, one);

    let long = Address::from_bytes(&[1, 0, 0, 0, 1]);
    assert_eq!(write_le_address(&mut buffer, &long), 6);
    assert_eq!(&buffer[..2], &[5, 1]);
    let (decoded, consumed) = read_le_address(&buffer).unwrap();
    assert_eq!(consumed, 6);
    assert_eq!(decoded, long);
}

#[test]
fn alarms_order_by_deadline() {
    let alarms = AlarmQueue::new();
    let noop = || Arc::new(FnEvent(|| {}));
    for seconds in [3i64, 1, 2] {
        alarms.enqueue(Alarm::new(IoTime::seconds(seconds), noop(), noop()));
    }
    assert_eq!(alarms.next_deadline(), Some(IoTime::seconds(1)));
}

#[test]
fn alarms_fire_through_the_context_clock() {
    let io = Io::new(IoConfig {
        short_term_memory_id: 0,
        long_term_memory_id: 1,
        ..IoConfig::default()
    });
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    for (tag, ms) in [(3u8, 30i64), (1, 10), (2, 20)] {
        let order = order.clone();
        io.enqueue_alarm(Alarm::new(
            IoTime::milliseconds(ms),
            Arc::new(FnEvent(move || order.lock().unwrap().push(tag))),
            Arc::new(FnEvent(|| {})),
        ));
    }
    // the platform tick advances past each deadline in turn
    for ms in [10i64, 20, 30] {
        io.set_time(IoTime::milliseconds(ms));
    }
    io.wait_for_all_events();
    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn constrained_hash_eviction_keeps_the_cache_bounded() {
    let evicted = Arc::new(AtomicUsize::new(0));
    let observed = evicted.clone();
    let mut cache: ConstrainedHash<u64, u64> = ConstrainedHash::new(
        10,
        None,
        Some(Box::new(move |_, _| {
            observed.fetch_add(1, Ordering::Relaxed);
            true
        })),
    );

    for key in 0..9u64 {
        cache.set(key, key * 2);
    }
    assert!(cache.count() <= cache.entry_limit());
    assert!(evicted.load(Ordering::Relaxed) >= 1);

    // what survived still answers
    let mut hits = 0;
    for key in 0..9u64 {
        if cache.get(&key) == Some(key * 2) {
            hits += 1;
        }
    }
    assert_eq!(hits, cache.count());
}

#[test]
fn byte_memory_info_restores_after_free() {
    let io = Io::new(IoConfig {
        short_term_memory_id: 2,
        long_term_memory_id: 3,
        ..IoConfig::default()
    });
    let bm = io.get_byte_memory();
    let info = bm.info();
    assert_eq!(info.used_bytes + info.free_bytes, info.total_bytes);

    let before = bm.info().used_bytes;
    let allocation = bm.allocate(100).unwrap();
    assert!(bm.info().used_bytes > before);
    assert_eq!(bm.free(allocation), bytemem::FreeStatus::Ok);
    assert_eq!(bm.info().used_bytes, before);
}

#[test]
fn first_run_and_power_cycles_live_in_retained_state() {
    let io = Io::new(IoConfig {
        short_term_memory_id: 4,
        long_term_memory_id: 5,
        ..IoConfig::default()
    });
    assert!(io.is_first_run());
    assert!(io.clear_first_run());
    assert!(!io.is_first_run());

    let cycles = io.with_retained_state(|s| s.bump_power_cycles());
    assert_eq!(cycles, 1);
}
