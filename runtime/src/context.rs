use alloc::boxed::Box;
use alloc::sync::Arc;

use bytemem::ByteMemory;
use config::mem::{BLOCK_SIZE_2N, DEFAULT_BYTE_MEMORY_SIZE, DEFAULT_VALUE_MEMORY_SIZE};
use event::{Alarm, AlarmQueue, EventQueue, EventRef, IoTime};
use mutex::SpinNoIrqLock;
use pipe::Pipe;
use systype::LogLevel;
use value::{ValueMemory, Vref, register_value_memory, unregister_value_memory};

use crate::retained::RetainedState;

/// Geometry of a runtime instance. The two value-memory ids must differ
/// and be unique across live instances; references carry them.
#[derive(Clone, Copy, Debug)]
pub struct IoConfig {
    pub byte_memory_size: usize,
    pub value_memory_size: usize,
    pub short_term_memory_id: u8,
    pub long_term_memory_id: u8,
    pub task_pipe_length: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            byte_memory_size: DEFAULT_BYTE_MEMORY_SIZE,
            value_memory_size: DEFAULT_VALUE_MEMORY_SIZE,
            short_term_memory_id: 0,
            long_term_memory_id: 1,
            task_pipe_length: 8,
        }
    }
}

type TaskHandler = Box<dyn Fn(&Io, Vref) + Send + Sync>;

pub struct Io {
    byte_memory: ByteMemory,
    short_term_values: Arc<ValueMemory>,
    long_term_values: Arc<ValueMemory>,
    events: Arc<EventQueue>,
    alarms: AlarmQueue,
    tasks: Pipe<Vref>,
    task_handler: SpinNoIrqLock<Option<TaskHandler>>,
    retained: SpinNoIrqLock<RetainedState>,
    time: SpinNoIrqLock<IoTime>,
    alarm_tolerance: IoTime,
    prbs_state: SpinNoIrqLock<u32>,
    log_level: SpinNoIrqLock<LogLevel>,
    config: IoConfig,
}

impl Io {
    /// Bring up a runtime instance and register its value memories.
    /// Panics if either memory id is already live.
    pub fn new(config: IoConfig) -> Self {
        let short_term_values =
            ValueMemory::new(config.value_memory_size, config.short_term_memory_id);
        let long_term_values =
            ValueMemory::new(config.value_memory_size, config.long_term_memory_id);
        if !register_value_memory(&short_term_values) || !register_value_memory(&long_term_values)
        {
            systype::io_panic(systype::PanicCode::InvalidOperation);
        }
        let io = Self {
            byte_memory: ByteMemory::new(config.byte_memory_size, BLOCK_SIZE_2N),
            short_term_values,
            long_term_values,
            events: Arc::new(EventQueue::new()),
            alarms: AlarmQueue::new(),
            tasks: Pipe::new(config.task_pipe_length),
            task_handler: SpinNoIrqLock::new(None),
            retained: SpinNoIrqLock::new(RetainedState::new()),
            time: SpinNoIrqLock::new(IoTime::ZERO),
            alarm_tolerance: IoTime::milliseconds(1),
            prbs_state: SpinNoIrqLock::new(0xace1_2b3d),
            log_level: SpinNoIrqLock::new(LogLevel::NoLogging),
            config,
        };
        log::info!(
            "io context up: {} bytes byte memory, value memories {}/{}",
            config.byte_memory_size,
            config.short_term_memory_id,
            config.long_term_memory_id
        );
        io
    }

    // core resources

    pub fn get_byte_memory(&self) -> &ByteMemory {
        &self.byte_memory
    }

    pub fn get_short_term_value_memory(&self) -> &Arc<ValueMemory> {
        &self.short_term_values
    }

    pub fn get_long_term_value_memory(&self) -> &Arc<ValueMemory> {
        &self.long_term_values
    }

    /// One bounded garbage-collection step across both value memories.
    pub fn do_gc(&self, count: i32) {
        self.short_term_values.do_gc(count);
        self.long_term_values.do_gc(count);
    }

    // events

    pub fn event_queue(&self) -> &Arc<EventQueue> {
        &self.events
    }

    pub fn enqueue_event(&self, event: EventRef) {
        self.events.enqueue(event);
        self.signal_event_pending();
    }

    pub fn dequeue_event(&self, event: &EventRef) {
        self.events.dequeue(event);
    }

    pub fn next_event(&self) -> bool {
        self.events.next_event()
    }

    /// The base platform has nothing to poke; real CPUs raise a software
    /// interrupt here.
    pub fn signal_event_pending(&self) {}

    pub fn in_event_thread(&self) -> bool {
        false
    }

    /// Drain the queue, dispatching due alarms first.
    pub fn wait_for_all_events(&self) {
        loop {
            self.alarms
                .process(self.get_time(), self.alarm_tolerance, &self.events);
            if !self.events.next_event() {
                break;
            }
        }
    }

    // time and alarms

    pub fn get_time(&self) -> IoTime {
        *self.time.lock()
    }

    /// Advance the runtime clock (platform tick or test control) and
    /// dispatch whatever came due.
    pub fn set_time(&self, now: IoTime) {
        *self.time.lock() = now;
        self.alarms.process(now, self.alarm_tolerance, &self.events);
    }

    pub fn enqueue_alarm(&self, alarm: Arc<Alarm>) {
        self.alarms.enqueue(alarm);
    }

    pub fn dequeue_alarm(&self, alarm: &Arc<Alarm>) {
        self.alarms.dequeue(alarm);
    }

    pub fn next_alarm_deadline(&self) -> Option<IoTime> {
        self.alarms.next_deadline()
    }

    // tasks

    pub fn set_task_handler(&self, handler: TaskHandler) {
        *self.task_handler.lock() = Some(handler);
    }

    /// Queue a value for deferred processing; false when the task pipe is
    /// full.
    pub fn enqueue_task(&self, task: Vref) -> bool {
        self.tasks.put(task).is_ok()
    }

    /// Run the oldest queued task through the registered handler.
    pub fn do_next_task(&self) -> bool {
        let Some(task) = self.tasks.get() else {
            return false;
        };
        let handler = self.task_handler.lock();
        match handler.as_ref() {
            Some(handler) => {
                handler(self, task);
                true
            }
            None => false,
        }
    }

    // identity and retained state

    pub fn with_retained_state<R>(&self, f: impl FnOnce(&mut RetainedState) -> R) -> R {
        f(&mut self.retained.lock())
    }

    pub fn is_first_run(&self) -> bool {
        self.retained.lock().is_first_run()
    }

    pub fn clear_first_run(&self) -> bool {
        self.retained.lock().clear_first_run()
    }

    /// Pseudo-random sequence for protocol backoff and key material
    /// mixing; not cryptographic.
    pub fn get_next_prbs_u32(&self) -> u32 {
        let mut state = self.prbs_state.lock();
        let mut x = *state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        *state = x;
        x
    }

    // logging

    pub fn log_level(&self) -> LogLevel {
        *self.log_level.lock()
    }

    pub fn set_log_level(&self, level: LogLevel) {
        *self.log_level.lock() = level;
        logger::set_level(level);
    }

    pub fn log_startup_message(&self, device_name: &str, level: LogLevel) {
        logger::log_startup_message(device_name, &self.byte_memory.info(), level);
    }
}

impl Drop for Io {
    fn drop(&mut self) {
        unregister_value_memory(self.config.short_term_memory_id);
        unregister_value_memory(self.config.long_term_memory_id);
    }
}
