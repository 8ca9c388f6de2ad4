//! Thread-safe metrics registry and multi-thread stopwatch.
//!
//! Each typed table is protected by its own lock, and every mutation that
//! can fire a change handler snapshots the handler list under the lock
//! then drops the guard before invoking any of them, so a handler is
//! free to read the registry again without deadlocking or blocking other
//! writers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::Instant;

use parking_lot::Mutex;

type IntHandler = Arc<dyn Fn(i64, i64) + Send + Sync>;
type FloatHandler = Arc<dyn Fn(f64, f64) + Send + Sync>;

struct Record<T, H> {
    name: String,
    value: T,
    handlers: Vec<H>,
}

struct TypedTable<T, H> {
    values: HashMap<u32, Record<T, H>>,
    order: Vec<u32>,
}

impl<T: Default + Copy, H> Default for TypedTable<T, H> {
    fn default() -> Self {
        Self { values: HashMap::new(), order: Vec::new() }
    }
}

/// A thread-safe map of `id -> (name, value, handlers)`, kept separately
/// for integer and floating-point metrics.
#[derive(Default)]
pub struct Metrics {
    ints: Mutex<TypedTable<i64, IntHandler>>,
    floats: Mutex<TypedTable<f64, FloatHandler>>,
}

impl Metrics {
    /// Registers a new integer metric. Panics if `id` is already
    /// registered.
    pub fn register_int(&self, id: u32, name: &str) {
        let mut table = self.ints.lock();
        assert!(!table.values.contains_key(&id), "metric {id} already registered");
        table.values.insert(id, Record { name: name.to_string(), value: 0, handlers: Vec::new() });
        table.order.push(id);
    }

    /// Registers a new floating-point metric.
    pub fn register_float(&self, id: u32, name: &str) {
        let mut table = self.floats.lock();
        assert!(!table.values.contains_key(&id), "metric {id} already registered");
        table.values.insert(id, Record { name: name.to_string(), value: 0.0, handlers: Vec::new() });
        table.order.push(id);
    }

    /// Attaches a handler invoked with `(old, new)` whenever the integer
    /// metric's value changes.
    pub fn on_int_change(&self, id: u32, handler: impl Fn(i64, i64) + Send + Sync + 'static) {
        let mut table = self.ints.lock();
        let record = table.values.get_mut(&id).expect("metric not registered");
        record.handlers.push(Arc::new(handler));
    }

    /// Attaches a handler invoked with `(old, new)` whenever the float
    /// metric's value changes.
    pub fn on_float_change(&self, id: u32, handler: impl Fn(f64, f64) + Send + Sync + 'static) {
        let mut table = self.floats.lock();
        let record = table.values.get_mut(&id).expect("metric not registered");
        record.handlers.push(Arc::new(handler));
    }

    /// Current value of an integer metric.
    pub fn int_value(&self, id: u32) -> i64 {
        self.ints.lock().values.get(&id).expect("metric not registered").value
    }

    /// Current value of a float metric.
    pub fn float_value(&self, id: u32) -> f64 {
        self.floats.lock().values.get(&id).expect("metric not registered").value
    }

    /// Adds `increment` to an integer metric and returns the new value,
    /// invoking handlers after the lock is released.
    pub fn update_int(&self, id: u32, increment: i64) -> i64 {
        let (old, new, handlers) = {
            let mut table = self.ints.lock();
            let record = table.values.get_mut(&id).expect("metric not registered");
            let old = record.value;
            record.value += increment;
            (old, record.value, record.handlers.clone())
        };
        for handler in handlers {
            handler(old, new);
        }
        new
    }

    /// Resets an integer metric to its default and invokes handlers with
    /// `(old, 0)` outside the lock.
    pub fn reset_int(&self, id: u32) {
        let (old, handlers) = {
            let mut table = self.ints.lock();
            let record = table.values.get_mut(&id).expect("metric not registered");
            let old = record.value;
            record.value = 0;
            (old, record.handlers.clone())
        };
        for handler in handlers {
            handler(old, 0);
        }
    }

    /// Adds `increment` to a float metric and returns the new value,
    /// invoking handlers after the lock is released.
    pub fn update_float(&self, id: u32, increment: f64) -> f64 {
        let (old, new, handlers) = {
            let mut table = self.floats.lock();
            let record = table.values.get_mut(&id).expect("metric not registered");
            let old = record.value;
            record.value += increment;
            (old, record.value, record.handlers.clone())
        };
        for handler in handlers {
            handler(old, new);
        }
        new
    }

    /// Resets a float metric to its default and invokes handlers.
    pub fn reset_float(&self, id: u32) {
        let (old, handlers) = {
            let mut table = self.floats.lock();
            let record = table.values.get_mut(&id).expect("metric not registered");
            let old = record.value;
            record.value = 0.0;
            (old, record.handlers.clone())
        };
        for handler in handlers {
            handler(old, 0.0);
        }
    }

    /// `(id, name)` pairs for every registered integer metric, in
    /// registration order.
    pub fn int_indices(&self) -> Vec<(u32, String)> {
        let table = self.ints.lock();
        table.order.iter().map(|id| (*id, table.values[id].name.clone())).collect()
    }

    /// `(id, name)` pairs for every registered float metric, in
    /// registration order.
    pub fn float_indices(&self) -> Vec<(u32, String)> {
        let table = self.floats.lock();
        table.order.iter().map(|id| (*id, table.values[id].name.clone())).collect()
    }

    /// A deep snapshot of values and indices, without handlers (handlers
    /// are not `Clone`-able closures and a snapshot has no use for them).
    pub fn snapshot(&self) -> MetricsSnapshotValues {
        let ints = self.ints.lock();
        let floats = self.floats.lock();
        MetricsSnapshotValues {
            ints: ints.order.iter().map(|id| (*id, ints.values[id].name.clone(), ints.values[id].value)).collect(),
            floats: floats.order.iter().map(|id| (*id, floats.values[id].name.clone(), floats.values[id].value)).collect(),
        }
    }
}

/// A value-only, clonable snapshot of a [`Metrics`] registry, used by
/// [`crate::controller::ChainController::invoke_stats`].
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshotValues {
    /// `(id, name, value)` for every integer metric.
    pub ints: Vec<(u32, String, i64)>,
    /// `(id, name, value)` for every float metric.
    pub floats: Vec<(u32, String, f64)>,
}

/// Multi-thread stopwatch: astronomical (wall since construction or last
/// reset), idling (wall during which no thread held the counter on), and
/// working (sum of per-thread on-time) readouts.
pub struct TimeCounter {
    inner: Mutex<TimeCounterState>,
}

struct TimeCounterState {
    thread_on: HashMap<ThreadId, (bool, Instant)>,
    start: Instant,
    last_working: Instant,
    working_time_secs: f64,
    idling_time_secs: f64,
}

impl Default for TimeCounter {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            inner: Mutex::new(TimeCounterState {
                thread_on: HashMap::new(),
                start: now,
                last_working: now,
                working_time_secs: 0.0,
                idling_time_secs: 0.0,
            }),
        }
    }
}

impl TimeCounter {
    /// Creates a new counter, started at the current instant.
    pub fn new() -> Self {
        Self::default()
    }

    /// `(astronomical, idling, working)` readouts in seconds.
    pub fn get_times(&self) -> (f64, f64, f64) {
        let state = self.inner.lock();
        let now = Instant::now();
        let mut working_add = 0.0;
        let mut is_idling = true;
        for (on, since) in state.thread_on.values() {
            if *on {
                working_add += now.duration_since(*since).as_secs_f64();
                is_idling = false;
            }
        }
        let astronomical = now.duration_since(state.start).as_secs_f64();
        let idling = state.idling_time_secs
            + if is_idling { now.duration_since(state.last_working).as_secs_f64() } else { 0.0 };
        let working = state.working_time_secs + if is_idling { 0.0 } else { working_add };
        (astronomical, idling, working)
    }

    /// Resets all readouts to zero. Panics if any thread is still turned
    /// on.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        assert!(
            state.thread_on.values().all(|(on, _)| !*on),
            "TimeCounter::reset(): some threads have not finished counting"
        );
        let now = Instant::now();
        state.start = now;
        state.last_working = now;
        state.working_time_secs = 0.0;
        state.idling_time_secs = 0.0;
    }

    /// Marks the calling thread as turned on. Panics if it was already on.
    pub fn turn_on(&self) {
        let mut state = self.inner.lock();
        let id = std::thread::current().id();
        let was_any_on = state.thread_on.values().any(|(on, _)| *on);
        let now = Instant::now();
        match state.thread_on.get(&id) {
            Some((true, _)) => panic!("TimeCounter::turn_on(): counter was not turned off"),
            _ => {
                state.thread_on.insert(id, (true, now));
            }
        }
        if !was_any_on {
            state.idling_time_secs += now.duration_since(state.last_working).as_secs_f64();
        }
    }

    /// Marks the calling thread as turned off. Panics if it was not on.
    pub fn turn_off(&self) {
        let mut state = self.inner.lock();
        let id = std::thread::current().id();
        let now = Instant::now();
        match state.thread_on.get(&id).copied() {
            Some((true, since)) => {
                state.working_time_secs += now.duration_since(since).as_secs_f64();
                state.thread_on.insert(id, (false, since));
            }
            _ => panic!("TimeCounter::turn_off(): timer was not turned on"),
        }
        if state.thread_on.values().all(|(on, _)| !*on) {
            state.last_working = now;
        }
    }
}

/// RAII guard: `turn_on` on construction, `turn_off` on every exit path.
pub struct TimeCounterLock<'a> {
    counter: &'a TimeCounter,
}

impl<'a> TimeCounterLock<'a> {
    /// Turns the counter on for the current scope.
    pub fn new(counter: &'a TimeCounter) -> Self {
        counter.turn_on();
        Self { counter }
    }
}

impl Drop for TimeCounterLock<'_> {
    fn drop(&mut self) {
        self.counter.turn_off();
    }
}

/// A simple owner-level hard-stop flag, set by a controller's hard
/// interrupt path (see `controller.rs`).
#[derive(Default)]
pub struct StopFlag(AtomicBool);

impl StopFlag {
    /// A fresh, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the flag has been set.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sets the flag.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}
