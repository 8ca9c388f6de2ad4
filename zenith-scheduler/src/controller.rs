//! The chain controller: wraps one [`Chain`] with a single-consumer queue
//! of closures, a timeout policy, and the three externally visible
//! operations (interrupt, stats, exchange).
//!
//! The worker loop drains queued closures one at a time, escalating a
//! stalled interrupt request from soft (ask the chain to stop) to hard
//! (short-circuit further closures) once the timeout elapses, and runs
//! the four-stage exchange handshake against a peer controller.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::chain::{Chain, ChainStatus};
use crate::error::{Error, Result};
use crate::metrics::{Metrics, MetricsSnapshotValues, TimeCounter, TimeCounterLock};
use crate::model::Timetable;

/// Stages of the inter-controller exchange handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExchangeStage {
    Waiting,
    TtTaken,
    TtInjecting,
    Failed,
}

type Closure = Box<dyn FnOnce(bool) + Send>;
type FinishCallback = Box<dyn FnOnce(bool, Option<Timetable>, MetricsSnapshotValues) + Send>;

struct ControllerInner {
    chain: Arc<Chain>,
    timeout: Duration,
    timer: Option<Arc<TimeCounter>>,
    queue: Mutex<VecDeque<Closure>>,
    /// Doubles as the worker-loop stop signal and the "hard interrupt"
    /// short-circuit flag.
    stopped: AtomicBool,
    finished: AtomicBool,
    exchange_stage: Mutex<ExchangeStage>,
    exchange_target: Mutex<Option<Arc<Chain>>>,
    finish_callback: Mutex<Option<FinishCallback>>,
}

/// Supervises one chain: owns its command queue, enforces the timeout
/// policy, and runs the interrupt/stats/exchange protocols.
pub struct ChainController {
    inner: Arc<ControllerInner>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ChainController {
    /// Starts the controller's worker thread. `finish_callback` fires
    /// exactly once, when the chain stops and the queue has drained.
    pub fn start(
        chain: Arc<Chain>,
        finish_callback: impl FnOnce(bool, Option<Timetable>, MetricsSnapshotValues) + Send + 'static,
        timeout: Duration,
        timer: Option<Arc<TimeCounter>>,
    ) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::Config("ChainController timeout must be greater than zero".to_string()));
        }

        let inner = Arc::new(ControllerInner {
            chain,
            timeout,
            timer,
            queue: Mutex::new(VecDeque::new()),
            stopped: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            exchange_stage: Mutex::new(ExchangeStage::Waiting),
            exchange_target: Mutex::new(None),
            finish_callback: Mutex::new(Some(Box::new(finish_callback))),
        });

        let worker_inner = Arc::clone(&inner);
        let worker = thread::spawn(move || worker_loop(worker_inner));
        Ok(Self { inner, worker: Some(worker) })
    }

    /// Whether the worker thread has delivered its finish callback.
    pub fn finished(&self) -> bool {
        self.inner.finished.load(Ordering::SeqCst)
    }

    fn invoke(&self, func: Closure) {
        let mut guard = self.inner.queue.lock();
        if self.inner.stopped.load(Ordering::SeqCst) {
            drop(guard);
            func(true);
        } else {
            guard.push_back(func);
        }
    }

    /// Requests interruption. Escalates to a hard interrupt if the chain
    /// does not reach the async-op-ready state within the timeout.
    pub fn invoke_interrupt(&self, clb: impl FnOnce(bool) + Send + 'static) {
        let inner = Arc::clone(&self.inner);
        let func = move |skipped: bool| {
            let _lock = inner.timer.as_ref().map(|t| TimeCounterLock::new(t));
            if skipped || inner.chain.status() != ChainStatus::Working {
                clb(false);
                return;
            }

            let start = Instant::now();
            while !inner.chain.stopped() && !inner.chain.ready_for_async_op() && start.elapsed() < inner.timeout {
                thread::yield_now();
            }

            if !inner.chain.ready_for_async_op() && !inner.chain.stopped() {
                inner.stopped.store(true, Ordering::SeqCst);
                clb(true);
                return;
            }

            if let Err(err) = inner.chain.interrupt_async() {
                tracing::error!(error = ?err, "interrupt request rejected");
                clb(false);
                return;
            }

            while !inner.chain.stopped() && start.elapsed() < inner.timeout {
                thread::yield_now();
            }

            if inner.chain.stopped() {
                clb(inner.chain.status() == ChainStatus::Interrupted);
            } else {
                inner.stopped.store(true, Ordering::SeqCst);
                clb(true);
            }
        };
        self.invoke(Box::new(func));
    }

    /// Produces a metrics snapshot combining this chain's metrics with the
    /// service-level registry the processor owns.
    pub fn invoke_stats(
        &self,
        service_metrics: Arc<Metrics>,
        clb: impl FnOnce(bool, Option<MetricsSnapshotValues>) + Send + 'static,
    ) {
        let inner = Arc::clone(&self.inner);
        let func = move |skipped: bool| {
            let _lock = inner.timer.as_ref().map(|t| TimeCounterLock::new(t));
            if !skipped && !inner.chain.stopped() {
                let mut snapshot = service_metrics.snapshot();
                let chain_snapshot = inner.chain.metrics().snapshot();
                snapshot.ints.extend(chain_snapshot.ints);
                snapshot.floats.extend(chain_snapshot.floats);
                clb(true, Some(snapshot));
            } else {
                clb(false, None);
            }
        };
        self.invoke(Box::new(func));
    }

    /// Runs one side of the four-stage exchange handshake against `target`.
    pub fn invoke_exchange(&self, target: &ChainController, clb: impl FnOnce(bool) + Send + 'static) {
        let self_inner = Arc::clone(&self.inner);
        let target_inner = Arc::clone(&target.inner);
        let func = move |skipped: bool| {
            let _lock = self_inner.timer.as_ref().map(|t| TimeCounterLock::new(t));
            if skipped || self_inner.chain.stopped() || target_inner.chain.stopped() {
                clb(false);
                return;
            }
            run_exchange(&self_inner, &target_inner, clb);
        };
        self.invoke(Box::new(func));
    }
}

fn fail_exchange(inner: &ControllerInner) {
    *inner.exchange_stage.lock() = ExchangeStage::Failed;
    *inner.exchange_target.lock() = None;
}

fn run_exchange(self_inner: &Arc<ControllerInner>, target_inner: &Arc<ControllerInner>, clb: impl FnOnce(bool) + Send + 'static) {
    let timeout = self_inner.timeout;
    let start = Instant::now();

    *self_inner.exchange_stage.lock() = ExchangeStage::Waiting;
    *self_inner.exchange_target.lock() = Some(Arc::clone(&target_inner.chain));
    loop {
        let ready = target_inner
            .exchange_target
            .lock()
            .as_ref()
            .is_some_and(|c| Arc::ptr_eq(c, &self_inner.chain));
        if ready {
            break;
        }
        if start.elapsed() >= timeout {
            fail_exchange(self_inner);
            clb(false);
            return;
        }
        thread::yield_now();
    }

    let captured = match target_inner.chain.actual_timetable() {
        Some(tt) => tt,
        None => {
            fail_exchange(self_inner);
            clb(false);
            return;
        }
    };
    *self_inner.exchange_stage.lock() = ExchangeStage::TtTaken;

    loop {
        let stage = *target_inner.exchange_stage.lock();
        if matches!(stage, ExchangeStage::TtTaken | ExchangeStage::TtInjecting) {
            break;
        }
        if stage == ExchangeStage::Failed || start.elapsed() >= timeout {
            fail_exchange(self_inner);
            clb(false);
            return;
        }
        thread::yield_now();
    }

    loop {
        if self_inner.chain.stopped() {
            fail_exchange(self_inner);
            clb(false);
            return;
        }
        if self_inner.chain.ready_for_async_op() {
            break;
        }
        if start.elapsed() >= timeout {
            fail_exchange(self_inner);
            clb(false);
            return;
        }
        thread::yield_now();
    }

    *self_inner.exchange_stage.lock() = ExchangeStage::TtInjecting;
    loop {
        let stage = *target_inner.exchange_stage.lock();
        if stage == ExchangeStage::TtInjecting {
            break;
        }
        if stage == ExchangeStage::Failed || start.elapsed() >= timeout {
            fail_exchange(self_inner);
            clb(false);
            return;
        }
        thread::yield_now();
    }

    if let Err(err) = self_inner.chain.inject_timetable_async(captured) {
        tracing::error!(error = ?err, "exchange injection failed");
        *self_inner.exchange_stage.lock() = ExchangeStage::Failed;
        *self_inner.exchange_target.lock() = None;
        clb(false);
        return;
    }
    *self_inner.exchange_target.lock() = None;
    clb(true);
}

fn worker_loop(inner: Arc<ControllerInner>) {
    inner.stopped.store(false, Ordering::SeqCst);
    inner.finished.store(false, Ordering::SeqCst);

    while !inner.stopped.load(Ordering::SeqCst) && !inner.chain.stopped() {
        let next = inner.queue.lock().pop_front();
        if let Some(func) = next {
            func(false);
        }
        thread::yield_now();
    }

    let _time_lock = inner.timer.as_ref().map(|t| TimeCounterLock::new(t));
    let succeeded = !inner.stopped.load(Ordering::SeqCst) && inner.chain.status() == ChainStatus::Finished;
    loop {
        let next = inner.queue.lock().pop_front();
        match next {
            Some(func) => func(true),
            None => break,
        }
    }
    inner.stopped.store(true, Ordering::SeqCst);

    let actual = inner.chain.actual_timetable();
    let snapshot = inner.chain.metrics().snapshot();
    if let Some(callback) = inner.finish_callback.lock().take() {
        callback(succeeded, actual, snapshot);
    }
    inner.finished.store(true, Ordering::SeqCst);
}

impl Drop for ChainController {
    fn drop(&mut self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{Algorithm, AlgorithmDescriptor, ChainEvents, ComputeUnit, DeviceType};
    use crate::model::{SchedulingSnapshot, TimetableEntry};
    use std::sync::mpsc;
    use std::time::Duration;

    /// An algorithm that spins, publishing no progress, until the chain
    /// asks it to stop. Used to keep a chain `Working` with a stable
    /// `actual` timetable across both `create_timetable` and
    /// `improve_timetable` stages, so a test can exercise interrupt and
    /// exchange against a chain that never finishes on its own.
    struct HoldForever {
        descriptor: AlgorithmDescriptor,
    }

    impl HoldForever {
        fn spin(events: &dyn ChainEvents) -> Result<Timetable> {
            loop {
                if events.forced_to_interrupt() {
                    return Err(Error::Cancelled);
                }
                thread::sleep(Duration::from_millis(2));
            }
        }
    }

    impl Algorithm for HoldForever {
        fn description(&self) -> &AlgorithmDescriptor {
            &self.descriptor
        }
        fn bind_to(&mut self, _cu: ComputeUnit) -> Result<()> {
            Ok(())
        }
        fn create_timetable(&mut self, _snapshot: &SchedulingSnapshot, events: &dyn ChainEvents) -> Result<Timetable> {
            Self::spin(events)
        }
        fn improve_timetable(&mut self, _old: &Timetable, _snapshot: &SchedulingSnapshot, events: &dyn ChainEvents) -> Result<Timetable> {
            Self::spin(events)
        }
    }

    fn hold_forever_chain() -> Arc<Chain> {
        let mut chain = Chain::new();
        let descriptor = AlgorithmDescriptor { family: "hold".into(), version: None, device_type: Some(DeviceType::Cpu) };
        chain
            .start(
                Arc::new(SchedulingSnapshot {
                    grid: None,
                    resource_hierarchy: vec![],
                    clusters: Default::default(),
                    partitions: Default::default(),
                    nodes: Default::default(),
                    jobs: vec![],
                }),
                vec![Box::new(HoldForever { descriptor })],
                None,
            )
            .unwrap();
        Arc::new(chain)
    }

    #[test]
    fn interrupt_stops_a_working_chain() {
        let chain = hold_forever_chain();
        thread::sleep(Duration::from_millis(20));
        let (tx, rx) = mpsc::channel();
        let controller = ChainController::start(
            chain,
            move |succeeded, _tt, _metrics| {
                let _ = tx.send(succeeded);
            },
            Duration::from_secs(2),
            None,
        )
        .unwrap();

        let (itx, irx) = mpsc::channel();
        controller.invoke_interrupt(move |ok| {
            let _ = itx.send(ok);
        });

        assert!(irx.recv_timeout(Duration::from_secs(2)).unwrap());
        assert!(rx.recv_timeout(Duration::from_secs(2)).unwrap());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let chain = hold_forever_chain();
        let result = ChainController::start(chain, |_, _, _| {}, Duration::from_secs(0), None);
        assert!(result.is_err());
    }

    #[test]
    fn exchange_swaps_actual_timetables() {
        let chain_a = hold_forever_chain();
        let chain_b = hold_forever_chain();
        thread::sleep(Duration::from_millis(20));

        let tt_a = vec![TimetableEntry { job_id: "a".into(), start_time: 0, node_ids: vec!["X".into()] }];
        let tt_b = vec![TimetableEntry { job_id: "b".into(), start_time: 0, node_ids: vec!["Y".into()] }];
        chain_a.inject_timetable_async(tt_a.clone()).unwrap();
        chain_b.inject_timetable_async(tt_b.clone()).unwrap();
        thread::sleep(Duration::from_millis(20));

        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        let controller_a = ChainController::start(Arc::clone(&chain_a), |_, _, _| {}, Duration::from_secs(2), None).unwrap();
        let controller_b = ChainController::start(Arc::clone(&chain_b), |_, _, _| {}, Duration::from_secs(2), None).unwrap();

        controller_a.invoke_exchange(&controller_b, move |ok| {
            let _ = tx_a.send(ok);
        });
        controller_b.invoke_exchange(&controller_a, move |ok| {
            let _ = tx_b.send(ok);
        });

        assert!(rx_a.recv_timeout(Duration::from_secs(2)).unwrap());
        assert!(rx_b.recv_timeout(Duration::from_secs(2)).unwrap());
        thread::sleep(Duration::from_millis(20));
        assert_eq!(chain_a.actual_timetable(), Some(tt_b));
        assert_eq!(chain_b.actual_timetable(), Some(tt_a));
    }
}
