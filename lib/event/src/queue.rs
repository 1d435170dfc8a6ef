//! Deferred callbacks and the FIFO that dispatches them.

use alloc::collections::VecDeque;
use alloc::sync::Arc;

use mutex::SpinNoIrqLock;

/// A deferred callback. Implementations hold whatever context the handler
/// needs; the same event object is enqueued again and again over its life.
pub trait IEvent: Send + Sync {
    fn handle(&self);
}

pub type EventRef = Arc<dyn IEvent>;

/// An [`IEvent`] from a closure, for handlers with no state of their own.
pub struct FnEvent<F: Fn() + Send + Sync>(pub F);

impl<F: Fn() + Send + Sync> IEvent for FnEvent<F> {
    fn handle(&self) {
        self.0()
    }
}

/// First-in first-out dispatch queue.
///
/// An event is in the queue at most once; enqueueing it again before it
/// fires is a no-op. `dequeue` before dispatch cancels. Interrupt handlers
/// may enqueue (the lock masks interrupts) and then signal the platform;
/// everything else runs on the event thread.
pub struct EventQueue {
    events: SpinNoIrqLock<VecDeque<EventRef>>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            events: SpinNoIrqLock::new(VecDeque::new()),
        }
    }

    fn contains(queue: &VecDeque<EventRef>, event: &EventRef) -> bool {
        queue.iter().any(|e| Arc::ptr_eq(e, event))
    }

    pub fn enqueue(&self, event: EventRef) {
        let mut queue = self.events.lock();
        if !Self::contains(&queue, &event) {
            queue.push_back(event);
        }
    }

    /// Cancel a pending event. Harmless when the event is not queued.
    pub fn dequeue(&self, event: &EventRef) {
        let mut queue = self.events.lock();
        if let Some(at) = queue.iter().position(|e| Arc::ptr_eq(e, event)) {
            queue.remove(at);
        }
    }

    /// Pop and run the next handler; false when the queue was empty.
    pub fn next_event(&self) -> bool {
        let next = self.events.lock().pop_front();
        match next {
            Some(event) => {
                event.handle();
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drain until empty. This is the base `wait_for_all_events`: with no
    /// platform to sleep on, waiting degenerates to running what is
    /// already queued (handlers may enqueue more, which also runs).
    pub fn run_to_idle(&self) {
        while self.next_event() {}
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    fn counting_event(counter: Arc<AtomicUsize>) -> EventRef {
        Arc::new(FnEvent(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }))
    }

    #[test]
    fn events_fire_in_fifo_order() {
        let q = EventQueue::new();
        let order = Arc::new(SpinNoIrqLock::new(alloc::vec::Vec::new()));

        for tag in [1u8, 2, 3] {
            let order = order.clone();
            q.enqueue(Arc::new(FnEvent(move || order.lock().push(tag))));
        }
        q.run_to_idle();
        assert_eq!(*order.lock(), alloc::vec![1, 2, 3]);
    }

    #[test]
    fn an_event_queues_at_most_once() {
        let q = EventQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let ev = counting_event(counter.clone());
        q.enqueue(ev.clone());
        q.enqueue(ev.clone());
        q.run_to_idle();
        assert_eq!(counter.load(Ordering::Relaxed), 1);

        // after firing it may queue again
        q.enqueue(ev);
        q.run_to_idle();
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn dequeue_cancels() {
        let q = EventQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let ev = counting_event(counter.clone());
        q.enqueue(ev.clone());
        q.dequeue(&ev);
        assert!(!q.next_event());
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }
}
