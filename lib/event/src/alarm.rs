//! Deadline alarms.

use alloc::sync::Arc;
use alloc::vec::Vec;

use mutex::SpinNoIrqLock;

use crate::queue::{EventQueue, EventRef};
use crate::time::IoTime;

/// An event with a deadline. `at` fires when the deadline is reached;
/// `error` fires instead when dispatch happens later than the tolerance
/// allows.
pub struct Alarm {
    pub when: IoTime,
    pub at: EventRef,
    pub error: EventRef,
}

impl Alarm {
    pub fn new(when: IoTime, at: EventRef, error: EventRef) -> Arc<Self> {
        Arc::new(Self { when, at, error })
    }
}

/// Alarms ordered by deadline. Insertion keeps the earliest deadline at
/// the head; dispatch walks off due alarms in ascending `when` order and
/// queues their events.
pub struct AlarmQueue {
    // kept sorted, earliest last so pop is O(1)
    alarms: SpinNoIrqLock<Vec<Arc<Alarm>>>,
}

impl AlarmQueue {
    pub const fn new() -> Self {
        Self {
            alarms: SpinNoIrqLock::new(Vec::new()),
        }
    }

    pub fn enqueue(&self, alarm: Arc<Alarm>) {
        let mut alarms = self.alarms.lock();
        let at = alarms
            .binary_search_by(|probe| alarm.when.cmp(&probe.when))
            .unwrap_or_else(|e| e);
        alarms.insert(at, alarm);
    }

    /// Cancel a pending alarm.
    pub fn dequeue(&self, alarm: &Arc<Alarm>) {
        let mut alarms = self.alarms.lock();
        if let Some(at) = alarms.iter().position(|a| Arc::ptr_eq(a, alarm)) {
            alarms.remove(at);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.lock().is_empty()
    }

    /// The earliest pending deadline.
    pub fn next_deadline(&self) -> Option<IoTime> {
        self.alarms.lock().last().map(|a| a.when)
    }

    /// Dispatch everything due at `now`: queue the `at` event of each due
    /// alarm, or its `error` event when `now` has run further than
    /// `tolerance` past the deadline. Returns the number dispatched.
    pub fn process(&self, now: IoTime, tolerance: IoTime, events: &EventQueue) -> usize {
        let mut fired = 0;
        loop {
            let due = {
                let mut alarms = self.alarms.lock();
                let head_due = alarms.last().is_some_and(|head| head.when <= now);
                if head_due { alarms.pop() } else { None }
            };
            let Some(alarm) = due else {
                break;
            };
            if alarm.when <= now - tolerance {
                log::warn!(
                    "alarm dispatched {}ms late",
                    (now - alarm.when).to_milliseconds()
                );
                events.enqueue(alarm.error.clone());
            } else {
                events.enqueue(alarm.at.clone());
            }
            fired += 1;
        }
        fired
    }
}

impl Default for AlarmQueue {
    fn default() -> Self {
        Self::new()
    }
}
