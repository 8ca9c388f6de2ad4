//! Decoded command and response shapes exchanged with the processor.
//!
//! These are the *decoded* shapes each command/response carries once the
//! transport (see `api/rest.rs`) has parsed its wire format into one of
//! these types — the fields, command tags, and response envelope the
//! processor actually operates on.

use serde::{Deserialize, Serialize};

use crate::algorithm::{AlgorithmSpec, DeviceType};
use crate::metrics::MetricsSnapshotValues;
use crate::model::{SchedulingSnapshot, Timetable};

/// Per-request bookkeeping carried alongside every command and mirrored
/// back on its response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandContext {
    /// Opaque request identifier, echoed back on the response.
    pub request_id: String,
}

/// Wire-level algorithm selector as carried on a SCHEDULE command, before
/// being resolved against the factory. Mirrors
/// `ScheduleCommand::AlgorithmSpec`: family required, version and device
/// type optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmSelector {
    /// Required family name, e.g. `"fcfs"`.
    pub family: String,
    /// Optional version constraint.
    #[serde(default)]
    pub version: Option<String>,
    /// Optional device type constraint.
    #[serde(default)]
    pub device_type: Option<DeviceType>,
}

impl From<AlgorithmSelector> for AlgorithmSpec {
    fn from(sel: AlgorithmSelector) -> Self {
        AlgorithmSpec { family: sel.family, version: sel.version, device_type: sel.device_type }
    }
}

/// One decoded command the processor can act on, plus `Corrupted` for a
/// frame that failed to parse upstream (never received from the
/// transport, only ever produced locally so a response can still be
/// returned to the caller).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Start a new chain under `chain_id`, running the resolved algorithms
    /// over `snapshot`.
    Schedule { context: CommandContext, chain_id: String, algorithms: Vec<AlgorithmSelector>, snapshot: SchedulingSnapshot },
    /// Interrupt the chain identified by `chain_id`.
    Interrupt { context: CommandContext, chain_id: String },
    /// Request a metrics snapshot for the chain identified by `chain_id`.
    Metrics { context: CommandContext, chain_id: String },
    /// Exchange actual timetables between two chains.
    Exchange { context: CommandContext, source_chain_id: String, target_chain_id: String },
    /// A frame that could not be decoded; carries only a context so a
    /// response can still be produced.
    Corrupted { context: CommandContext },
}

impl Command {
    /// The context shared by every command variant.
    pub fn context(&self) -> &CommandContext {
        match self {
            Command::Schedule { context, .. }
            | Command::Interrupt { context, .. }
            | Command::Metrics { context, .. }
            | Command::Exchange { context, .. }
            | Command::Corrupted { context } => context,
        }
    }
}

/// The payload carried by a response, specific to the command that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseBody {
    /// A completed SCHEDULE request's output.
    Timetable(Timetable),
    /// A METRICS request's output.
    Metrics(MetricsSnapshotValues),
    /// No payload; `status` on the envelope carries the outcome.
    Empty,
}

/// Every request produces exactly one response envelope, carrying the
/// request id, a success/failure status, and accumulated timing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Echoes the originating command's request id.
    pub request_id: String,
    /// Whether the request succeeded.
    pub status: bool,
    /// Wall time since the owning timer was created or last reset.
    pub astro_time: f64,
    /// Wall time during which no thread held the timer on.
    pub idle_time: f64,
    /// Sum of per-thread on-time.
    pub work_time: f64,
    /// The response payload.
    pub body: ResponseBody,
}

impl Response {
    /// Builds an `Empty` response with the given status and no timing
    /// information (used where no per-request timer is threaded through).
    pub fn empty(request_id: impl Into<String>, status: bool) -> Self {
        Self {
            request_id: request_id.into(),
            status,
            astro_time: 0.0,
            idle_time: 0.0,
            work_time: 0.0,
            body: ResponseBody::Empty,
        }
    }

    /// Builds a successful `Timetable` response.
    pub fn timetable(request_id: impl Into<String>, tt: Timetable) -> Self {
        Self {
            request_id: request_id.into(),
            status: true,
            astro_time: 0.0,
            idle_time: 0.0,
            work_time: 0.0,
            body: ResponseBody::Timetable(tt),
        }
    }

    /// Builds a successful `Metrics` response.
    pub fn metrics(request_id: impl Into<String>, snapshot: MetricsSnapshotValues) -> Self {
        Self {
            request_id: request_id.into(),
            status: true,
            astro_time: 0.0,
            idle_time: 0.0,
            work_time: 0.0,
            body: ResponseBody::Metrics(snapshot),
        }
    }

    /// Attaches timing readouts taken from a per-request `TimeCounter`.
    pub fn with_times(mut self, astro: f64, idle: f64, work: f64) -> Self {
        self.astro_time = astro;
        self.idle_time = idle;
        self.work_time = work;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tag_round_trips_through_json() {
        let cmd = Command::Interrupt { context: CommandContext { request_id: "r1".into() }, chain_id: "c1".into() };
        let encoded = serde_json::to_string(&cmd).unwrap();
        let decoded: Command = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.context().request_id, "r1");
        assert!(matches!(decoded, Command::Interrupt { chain_id, .. } if chain_id == "c1"));
    }

    #[test]
    fn empty_response_carries_status_and_id() {
        let resp = Response::empty("req-9", false);
        assert_eq!(resp.request_id, "req-9");
        assert!(!resp.status);
        assert!(matches!(resp.body, ResponseBody::Empty));
    }

    #[test]
    fn algorithm_selector_converts_to_spec() {
        let sel = AlgorithmSelector { family: "fcfs".into(), version: None, device_type: Some(DeviceType::Cpu) };
        let spec: AlgorithmSpec = sel.into();
        assert_eq!(spec.family, "fcfs");
        assert_eq!(spec.device_type, Some(DeviceType::Cpu));
    }
}
