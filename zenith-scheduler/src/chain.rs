//! The chain: a worker that runs an ordered list of algorithm instances
//! over one scheduling snapshot, with a two-slot ping-pong buffer and
//! asynchronous interrupt/inject support.
//!
//! The worker thread runs each algorithm in turn, alternating between the
//! two buffer slots of the ping-pong, and checks the async-op slot at
//! every stage boundary to honor a pending interrupt or timetable
//! injection. The async-op slot and the published-timetable pair live
//! behind separate locks so a reader checking `intermediate`/`actual`
//! never contends with a pending interrupt or inject request.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::algorithm::{Algorithm, ChainEvents};
use crate::error::{Error, Result};
use crate::metrics::{Metrics, TimeCounter, TimeCounterLock};
use crate::model::{SchedulingSnapshot, Timetable};

/// The chain's lifecycle state. Initial `NotStarted`; terminal `Finished`
/// and `Interrupted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStatus {
    /// `start` has not been called yet.
    NotStarted,
    /// Constructing or improving a timetable.
    Working,
    /// A stage failed, or an interrupt handshake completed.
    Interrupted,
    /// The last stage succeeded; `actual` holds its output.
    Finished,
}

impl ChainStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ChainStatus::NotStarted,
            1 => ChainStatus::Working,
            2 => ChainStatus::Interrupted,
            _ => ChainStatus::Finished,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ChainStatus::NotStarted => 0,
            ChainStatus::Working => 1,
            ChainStatus::Interrupted => 2,
            ChainStatus::Finished => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AsyncOp {
    None,
    Interrupt,
    InjectTt,
}

struct AsyncOpSlot {
    op: AsyncOp,
    injected_tt: Option<Timetable>,
}

#[derive(Default)]
struct Published {
    intermediate: Option<Timetable>,
    actual: Option<Timetable>,
}

struct ChainInner {
    status: AtomicU8,
    async_op: Mutex<AsyncOpSlot>,
    published: RwLock<Published>,
    metrics: Metrics,
}

/// Bridges the worker thread's loop state to the [`ChainEvents`] trait an
/// algorithm consumes.
struct EventsHandle<'a> {
    inner: &'a ChainInner,
}

impl ChainEvents for EventsHandle<'_> {
    fn forced_to_interrupt(&self) -> bool {
        let slot = self.inner.async_op.lock();
        matches!(slot.op, AsyncOp::Interrupt | AsyncOp::InjectTt)
    }

    fn publish_intermediate(&self, tt: &Timetable) {
        self.inner.published.write().intermediate = Some(tt.clone());
    }
}

/// A worker that runs a fixed-length sequence of scheduling algorithms,
/// each improving the previous one's timetable.
pub struct Chain {
    inner: Arc<ChainInner>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Chain {
    /// A chain with no worker started yet.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChainInner {
                status: AtomicU8::new(ChainStatus::NotStarted.as_u8()),
                async_op: Mutex::new(AsyncOpSlot { op: AsyncOp::None, injected_tt: None }),
                published: RwLock::new(Published::default()),
                metrics: Metrics::default(),
            }),
            worker: None,
        }
    }

    /// Starts the worker thread running `algorithms` over `snapshot`. The
    /// first algorithm creates the timetable; the rest improve it.
    pub fn start(
        &mut self,
        snapshot: Arc<SchedulingSnapshot>,
        algorithms: Vec<Box<dyn Algorithm>>,
        timer: Option<Arc<TimeCounter>>,
    ) -> Result<()> {
        if algorithms.is_empty() {
            return Err(Error::PluginFault("chain requires at least one algorithm".to_string()));
        }
        if ChainStatus::from_u8(self.inner.status.load(Ordering::SeqCst)) != ChainStatus::NotStarted
        {
            return Err(Error::PluginFault("chain was already initialized".to_string()));
        }

        self.inner.status.store(ChainStatus::Working.as_u8(), Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        self.worker = Some(thread::spawn(move || {
            worker_loop(inner, snapshot, algorithms, timer);
        }));
        Ok(())
    }

    /// Current lifecycle state.
    pub fn status(&self) -> ChainStatus {
        ChainStatus::from_u8(self.inner.status.load(Ordering::SeqCst))
    }

    /// Whether the chain has left the `Working` state.
    pub fn stopped(&self) -> bool {
        self.status() != ChainStatus::Working
    }

    /// Whether the async-op slot is empty (safe to queue a new request).
    pub fn ready_for_async_op(&self) -> bool {
        self.inner.async_op.lock().op == AsyncOp::None
    }

    /// Requests a soft interrupt. A no-op once the chain has already
    /// stopped. Fails if another async op is already pending.
    pub fn interrupt_async(&self) -> Result<()> {
        let mut slot = self.inner.async_op.lock();
        if slot.op != AsyncOp::None {
            return Err(Error::PluginFault("chain is not ready for async operation".to_string()));
        }
        if !self.stopped() {
            slot.op = AsyncOp::Interrupt;
        }
        Ok(())
    }

    /// Requests a timetable injection. If the chain has already stopped,
    /// the injected timetable is applied to `actual` immediately.
    pub fn inject_timetable_async(&self, tt: Timetable) -> Result<()> {
        let mut slot = self.inner.async_op.lock();
        if slot.op != AsyncOp::None {
            return Err(Error::PluginFault("chain is not ready for async operation".to_string()));
        }
        if !self.stopped() {
            slot.op = AsyncOp::InjectTt;
            slot.injected_tt = Some(tt);
        } else {
            drop(slot);
            self.inner.published.write().actual = Some(tt);
        }
        Ok(())
    }

    /// The latest in-progress artifact published by the currently running
    /// algorithm, if any.
    pub fn intermediate_timetable(&self) -> Option<Timetable> {
        self.inner.published.read().intermediate.clone()
    }

    /// The last completed stage's output, or the last injected timetable.
    pub fn actual_timetable(&self) -> Option<Timetable> {
        self.inner.published.read().actual.clone()
    }

    /// This chain's metrics registry.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        if self.status() == ChainStatus::Working {
            while !self.ready_for_async_op() {
                thread::yield_now();
            }
            let _ = self.interrupt_async();
            while self.status() == ChainStatus::Working {
                thread::sleep(Duration::from_micros(50));
            }
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    inner: Arc<ChainInner>,
    snapshot: Arc<SchedulingSnapshot>,
    algorithms: Vec<Box<dyn Algorithm>>,
    timer: Option<Arc<TimeCounter>>,
) {
    let _time_lock = timer.as_ref().map(|t| TimeCounterLock::new(t));

    // Ping-pong buffer: two slots, the running stage writes into the slot
    // the previous stage did not occupy.
    let mut buffers: [Option<Timetable>; 2] = [None, None];
    let mut cur = 0usize;
    let mut algorithms = algorithms;
    let mut i = 0usize;
    let mut injected = false;

    while i < algorithms.len() {
        let events = EventsHandle { inner: &inner };
        let next = (cur + 1) % 2;

        let result = if i == 0 && !injected {
            algorithms[0].create_timetable(&snapshot, &events)
        } else {
            let input = buffers[cur].clone().unwrap_or_default();
            algorithms[i].improve_timetable(&input, &snapshot, &events)
        };

        let succeeded = result.is_ok();
        if let Ok(tt) = &result {
            buffers[next] = Some(tt.clone());
        }

        let mut slot = inner.async_op.lock();
        if !succeeded && slot.op == AsyncOp::None {
            tracing::error!(
                stage = i,
                error = ?result.err(),
                "chain stage failed without a pending async operation"
            );
            inner.status.store(ChainStatus::Interrupted.as_u8(), Ordering::SeqCst);
            return;
        }

        if succeeded {
            inner.published.write().actual = buffers[next].clone();
        }
        inner.published.write().intermediate = None;

        match slot.op {
            AsyncOp::Interrupt => {
                slot.op = AsyncOp::None;
                drop(slot);
                inner.status.store(ChainStatus::Interrupted.as_u8(), Ordering::SeqCst);
                return;
            }
            AsyncOp::InjectTt => {
                slot.op = AsyncOp::None;
                let injected_tt = slot.injected_tt.take();
                drop(slot);
                inner.status.store(ChainStatus::Working.as_u8(), Ordering::SeqCst);
                if let Some(tt) = injected_tt {
                    inner.published.write().actual = Some(tt.clone());
                    buffers[next] = Some(tt);
                }
                injected = true;
            }
            AsyncOp::None => {}
        }

        cur = next;
        if succeeded {
            i += 1;
        }
    }

    inner.status.store(ChainStatus::Finished.as_u8(), Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{AlgorithmDescriptor, DeviceType};
    use crate::model::TimetableEntry;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct StaticAlgorithm {
        descriptor: AlgorithmDescriptor,
        start_times: Arc<AtomicUsize>,
    }

    impl Algorithm for StaticAlgorithm {
        fn description(&self) -> &AlgorithmDescriptor {
            &self.descriptor
        }
        fn bind_to(&mut self, _cu: crate::algorithm::ComputeUnit) -> Result<()> {
            Ok(())
        }
        fn create_timetable(
            &mut self,
            _snapshot: &SchedulingSnapshot,
            events: &dyn ChainEvents,
        ) -> Result<Timetable> {
            let tt = vec![TimetableEntry { job_id: "1".into(), start_time: 0, node_ids: vec!["A".into()] }];
            events.publish_intermediate(&tt);
            self.start_times.fetch_add(1, Ordering::SeqCst);
            Ok(tt)
        }
        fn improve_timetable(
            &mut self,
            old: &Timetable,
            _snapshot: &SchedulingSnapshot,
            _events: &dyn ChainEvents,
        ) -> Result<Timetable> {
            Ok(old.clone())
        }
    }

    fn algo() -> Box<dyn Algorithm> {
        Box::new(StaticAlgorithm {
            descriptor: AlgorithmDescriptor { family: "test".into(), version: None, device_type: Some(DeviceType::Cpu) },
            start_times: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn empty_snapshot() -> Arc<SchedulingSnapshot> {
        Arc::new(SchedulingSnapshot {
            grid: None,
            resource_hierarchy: vec![],
            clusters: Default::default(),
            partitions: Default::default(),
            nodes: Default::default(),
            jobs: vec![],
        })
    }

    #[test]
    fn chain_finishes_on_success() {
        let mut chain = Chain::new();
        chain.start(empty_snapshot(), vec![algo()], None).unwrap();
        for _ in 0..200 {
            if chain.status() != ChainStatus::Working {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(chain.status(), ChainStatus::Finished);
        assert!(chain.actual_timetable().is_some());
    }

    #[test]
    fn starting_twice_fails() {
        let mut chain = Chain::new();
        chain.start(empty_snapshot(), vec![algo()], None).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(chain.start(empty_snapshot(), vec![algo()], None).is_err());
    }

    #[test]
    fn starting_with_no_algorithms_fails() {
        let mut chain = Chain::new();
        assert!(chain.start(empty_snapshot(), vec![], None).is_err());
    }

    #[test]
    fn inject_after_stop_sets_actual_immediately() {
        let mut chain = Chain::new();
        chain.start(empty_snapshot(), vec![algo()], None).unwrap();
        for _ in 0..200 {
            if chain.status() != ChainStatus::Working {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        let injected = vec![TimetableEntry { job_id: "99".into(), start_time: 5, node_ids: vec!["Z".into()] }];
        chain.inject_timetable_async(injected.clone()).unwrap();
        assert_eq!(chain.actual_timetable(), Some(injected));
    }
}
