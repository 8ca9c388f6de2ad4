//! The processor: owns the input/output bounded queues, the algorithm
//! factory, and the `chain_id -> ChainController` map; dispatches decoded
//! commands to the right effect and reaps finished chains.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::algorithm::{Algorithm, AlgorithmFactory, AlgorithmSpec, ComputeUnit};
use crate::chain::Chain;
use crate::commands::{Command, Response};
use crate::controller::ChainController;
use crate::error::Result;
use crate::metrics::Metrics;
use crate::model::SchedulingSnapshot;
use crate::queue::BoundedQueue;

fn create_algorithms(factory: &AlgorithmFactory, specs: &[AlgorithmSpec]) -> Result<Vec<Box<dyn Algorithm>>> {
    let mut algorithms = Vec::with_capacity(specs.len());
    for spec in specs {
        let mut algorithm = factory.create(spec)?;
        algorithm.bind_to(ComputeUnit::cpu())?;
        algorithms.push(algorithm);
    }
    Ok(algorithms)
}

/// Owns all active chains, dispatching commands from `in_queue` onto
/// per-chain controllers and publishing responses to `out_queue`.
pub struct Processor {
    factory: Arc<AlgorithmFactory>,
    in_queue: Arc<BoundedQueue<Command>>,
    out_queue: Arc<BoundedQueue<Response>>,
    timeout: Duration,
    service_metrics: Arc<Metrics>,
    chains: HashMap<String, ChainController>,
    closed: Arc<AtomicBool>,
}

impl Processor {
    /// Builds a processor ready to run its worker loop via [`Processor::run_once`]
    /// in a caller-owned thread, or [`Processor::spawn`] for a dedicated one.
    pub fn new(
        factory: Arc<AlgorithmFactory>,
        in_queue: Arc<BoundedQueue<Command>>,
        out_queue: Arc<BoundedQueue<Response>>,
        timeout: Duration,
    ) -> Self {
        Self {
            factory,
            in_queue,
            out_queue,
            timeout,
            service_metrics: Arc::new(Metrics::default()),
            chains: HashMap::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle that, when set, asks the worker loop to stop accepting new
    /// work once the input queue drains and all chains finish.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    /// Runs the dispatch loop until `closed` is set, the input queue is
    /// empty, and the chains map is empty. Intended to run on its own
    /// thread; reaps finished chains every pass.
    pub fn run(&mut self) {
        loop {
            let closed = self.closed.load(Ordering::SeqCst);
            if closed && self.in_queue.element_count() == 0 && self.chains.is_empty() {
                break;
            }

            if self.in_queue.element_count() != 0 {
                let command = self.in_queue.pop();
                self.dispatch(command);
            }

            self.reap_finished();
            thread::sleep(Duration::from_millis(2));
        }
    }

    /// Spawns the dispatch loop on a dedicated thread.
    pub fn spawn(mut self) -> thread::JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn reap_finished(&mut self) {
        self.chains.retain(|_, controller| !controller.finished());
    }

    fn dispatch(&mut self, command: Command) {
        let request_id = command.context().request_id.clone();
        match command {
            Command::Schedule { chain_id, algorithms, snapshot, .. } => {
                self.handle_schedule(request_id, chain_id, algorithms, snapshot);
            }
            Command::Interrupt { chain_id, .. } => {
                self.handle_interrupt(request_id, chain_id);
            }
            Command::Metrics { chain_id, .. } => {
                self.handle_metrics(request_id, chain_id);
            }
            Command::Exchange { source_chain_id, target_chain_id, .. } => {
                self.handle_exchange(request_id, source_chain_id, target_chain_id);
            }
            Command::Corrupted { .. } => {
                self.out_queue.push(Response::empty(request_id, false));
            }
        }
    }

    fn handle_schedule(
        &mut self,
        request_id: String,
        chain_id: String,
        algorithms: Vec<crate::commands::AlgorithmSelector>,
        snapshot: SchedulingSnapshot,
    ) {
        if self.chains.contains_key(&chain_id) {
            tracing::warn!(chain_id, "SCHEDULE refused: chain already exists");
            self.out_queue.push(Response::empty(request_id, false));
            return;
        }

        let specs: Vec<AlgorithmSpec> = algorithms.into_iter().map(Into::into).collect();
        let built = match create_algorithms(&self.factory, &specs) {
            Ok(algorithms) => algorithms,
            Err(err) => {
                tracing::warn!(chain_id, error = ?err, "failed to resolve algorithms for SCHEDULE");
                self.out_queue.push(Response::empty(request_id, false));
                return;
            }
        };

        let mut chain = Chain::new();
        if let Err(err) = chain.start(Arc::new(snapshot), built, None) {
            tracing::warn!(chain_id, error = ?err, "failed to start chain");
            self.out_queue.push(Response::empty(request_id, false));
            return;
        }
        let chain = Arc::new(chain);

        let out_queue = Arc::clone(&self.out_queue);
        let finish_request_id = request_id.clone();
        let finish = move |succeeded: bool, tt: Option<crate::model::Timetable>, _metrics| {
            let response = if succeeded {
                Response::timetable(finish_request_id, tt.unwrap_or_default())
            } else {
                Response::empty(finish_request_id, false)
            };
            out_queue.push(response);
        };

        match ChainController::start(chain, finish, self.timeout, None) {
            Ok(controller) => {
                self.chains.insert(chain_id, controller);
            }
            Err(err) => {
                tracing::warn!(chain_id, error = ?err, "failed to start chain controller");
                self.out_queue.push(Response::empty(request_id, false));
            }
        }
    }

    fn handle_interrupt(&mut self, request_id: String, chain_id: String) {
        let Some(controller) = self.chains.get(&chain_id) else {
            tracing::warn!(chain_id, request_id, "INTERRUPT target not found");
            self.out_queue.push(Response::empty(request_id, false));
            return;
        };
        let out_queue = Arc::clone(&self.out_queue);
        controller.invoke_interrupt(move |succeeded| {
            out_queue.push(Response::empty(request_id, succeeded));
        });
    }

    fn handle_metrics(&mut self, request_id: String, chain_id: String) {
        let Some(controller) = self.chains.get(&chain_id) else {
            tracing::warn!(chain_id, request_id, "METRICS target not found");
            self.out_queue.push(Response::empty(request_id, false));
            return;
        };
        let out_queue = Arc::clone(&self.out_queue);
        let service_metrics = Arc::clone(&self.service_metrics);
        controller.invoke_stats(service_metrics, move |succeeded, snapshot| {
            let response = match (succeeded, snapshot) {
                (true, Some(snapshot)) => Response::metrics(request_id, snapshot),
                _ => Response::empty(request_id, false),
            };
            out_queue.push(response);
        });
    }

    fn handle_exchange(&mut self, request_id: String, source_chain_id: String, target_chain_id: String) {
        if !self.chains.contains_key(&source_chain_id) {
            self.out_queue.push(Response::empty(request_id, false));
            return;
        }
        if !self.chains.contains_key(&target_chain_id) {
            self.out_queue.push(Response::empty(request_id, false));
            return;
        }

        let source = self.chains.get(&source_chain_id).unwrap();
        let target = self.chains.get(&target_chain_id).unwrap();

        let out_queue = Arc::clone(&self.out_queue);
        source.invoke_exchange(target, move |succeeded| {
            out_queue.push(Response::empty(request_id, succeeded));
        });
        target.invoke_exchange(source, |_succeeded| {});
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{AlgorithmSelector, CommandContext};
    use std::sync::atomic::Ordering;

    fn empty_snapshot() -> SchedulingSnapshot {
        SchedulingSnapshot {
            grid: None,
            resource_hierarchy: vec![],
            clusters: Default::default(),
            partitions: Default::default(),
            nodes: Default::default(),
            jobs: vec![],
        }
    }

    fn processor() -> (Processor, Arc<BoundedQueue<Command>>, Arc<BoundedQueue<Response>>) {
        let in_queue = Arc::new(BoundedQueue::new(8));
        let out_queue = Arc::new(BoundedQueue::new(8));
        let factory = Arc::new(AlgorithmFactory::with_builtins());
        let processor = Processor::new(factory, Arc::clone(&in_queue), Arc::clone(&out_queue), Duration::from_secs(2));
        (processor, in_queue, out_queue)
    }

    #[test]
    fn corrupted_command_yields_failed_empty_response() {
        let (mut processor, in_queue, out_queue) = processor();
        let closed = processor.closed_flag();
        in_queue.push(Command::Corrupted { context: CommandContext { request_id: "r1".into() } });
        closed.store(true, Ordering::SeqCst);
        processor.run();
        let resp = out_queue.pop();
        assert_eq!(resp.request_id, "r1");
        assert!(!resp.status);
    }

    #[test]
    fn interrupt_on_unknown_chain_fails() {
        let (mut processor, in_queue, out_queue) = processor();
        let closed = processor.closed_flag();
        in_queue.push(Command::Interrupt { context: CommandContext { request_id: "r2".into() }, chain_id: "missing".into() });
        closed.store(true, Ordering::SeqCst);
        processor.run();
        let resp = out_queue.pop();
        assert!(!resp.status);
    }

    #[test]
    fn schedule_then_reap_completes() {
        let (mut processor, in_queue, out_queue) = processor();
        let closed = processor.closed_flag();
        in_queue.push(Command::Schedule {
            context: CommandContext { request_id: "r3".into() },
            chain_id: "chain-1".into(),
            algorithms: vec![AlgorithmSelector { family: "fcfs".into(), version: None, device_type: None }],
            snapshot: empty_snapshot(),
        });
        closed.store(true, Ordering::SeqCst);
        processor.run();
        let resp = out_queue.pop();
        assert_eq!(resp.request_id, "r3");
        assert!(resp.status);
    }

    #[test]
    fn schedule_with_unknown_algorithm_fails_fast() {
        let (mut processor, in_queue, out_queue) = processor();
        let closed = processor.closed_flag();
        in_queue.push(Command::Schedule {
            context: CommandContext { request_id: "r4".into() },
            chain_id: "chain-2".into(),
            algorithms: vec![AlgorithmSelector { family: "backfill".into(), version: None, device_type: None }],
            snapshot: empty_snapshot(),
        });
        closed.store(true, Ordering::SeqCst);
        processor.run();
        let resp = out_queue.pop();
        assert!(!resp.status);
    }
}
