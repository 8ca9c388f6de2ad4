//! Algorithm abstraction: the unit of work a [`crate::chain::Chain`] runs
//! in sequence, and the factory that resolves an [`AlgorithmSpec`] against
//! known descriptors.
//!
//! The factory holds a registry of descriptor -> constructor closures,
//! with one built-in entry wrapping the FCFS engine; additional families
//! register the same way, without the core needing to know how any of
//! them are implemented.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fcfs::FcfsEngine;
use crate::model::{SchedulingSnapshot, Timetable};

/// A coarse compute-unit tag; the hardware scanner that fills in a real
/// CPU descriptor is an external collaborator, so this is a marker only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// CPU-targeted algorithm.
    Cpu,
    /// GPU-targeted algorithm.
    Gpu,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Cpu => write!(f, "cpu"),
            DeviceType::Gpu => write!(f, "gpu"),
        }
    }
}

/// The compute unit an algorithm is bound to. Minimal by design: the real
/// hardware scanner is an external collaborator.
#[derive(Debug, Clone, Copy)]
pub struct ComputeUnit {
    /// Device type this unit represents.
    pub device_type: DeviceType,
}

impl ComputeUnit {
    /// The single CPU compute unit the processor binds algorithms to.
    pub fn cpu() -> Self {
        Self { device_type: DeviceType::Cpu }
    }
}

/// Identifies an algorithm implementation: a family name plus optional
/// version and device type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    /// Required family name, e.g. `"fcfs"`.
    pub family: String,
    /// Optional version string.
    pub version: Option<String>,
    /// Optional device type.
    pub device_type: Option<DeviceType>,
}

/// What a SCHEDULE command asks the factory to resolve: family is
/// required, version and device type are optional constraints.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmSpec {
    /// Required family name.
    pub family: String,
    /// Optional version constraint.
    pub version: Option<String>,
    /// Optional device type constraint.
    pub device_type: Option<DeviceType>,
}

impl AlgorithmSpec {
    fn matches(&self, desc: &AlgorithmDescriptor) -> bool {
        if self.family != desc.family {
            return false;
        }
        if let Some(v) = &self.version {
            if desc.version.as_deref() != Some(v.as_str()) {
                return false;
            }
        }
        if let Some(dt) = self.device_type {
            if desc.device_type != Some(dt) {
                return false;
            }
        }
        true
    }
}

/// Callbacks an algorithm uses to check for interruption and publish
/// intermediate results mid-stage. The `Chain` implements this trait for
/// the algorithm instances it owns.
pub trait ChainEvents: Send + Sync {
    /// Whether the chain's async-op slot currently demands an interrupt.
    fn forced_to_interrupt(&self) -> bool;

    /// Publishes a not-yet-final timetable for observers to read.
    fn publish_intermediate(&self, tt: &Timetable);
}

/// One algorithm instance bound to a compute unit, producing or improving
/// a timetable for a single chain stage.
pub trait Algorithm: Send {
    /// This instance's descriptor.
    fn description(&self) -> &AlgorithmDescriptor;

    /// Binds the algorithm to a compute unit before use.
    fn bind_to(&mut self, cu: ComputeUnit) -> Result<()>;

    /// Produces a timetable from scratch (the first stage of a chain).
    fn create_timetable(
        &mut self,
        snapshot: &SchedulingSnapshot,
        events: &dyn ChainEvents,
    ) -> Result<Timetable>;

    /// Improves a previous stage's timetable (every stage after the
    /// first).
    fn improve_timetable(
        &mut self,
        old: &Timetable,
        snapshot: &SchedulingSnapshot,
        events: &dyn ChainEvents,
    ) -> Result<Timetable>;
}

/// The built-in FCFS algorithm: `create_timetable` runs a fresh pass;
/// `improve_timetable` re-runs the pass treating `old` as advisory input
/// only (FCFS has no iterative-improvement state, so "improve" degenerates
/// to "recompute").
pub struct FcfsAlgorithm {
    descriptor: AlgorithmDescriptor,
    compute_unit: Option<ComputeUnit>,
    engine: FcfsEngine,
}

impl FcfsAlgorithm {
    /// Builds the built-in descriptor: family `"fcfs"`, no version
    /// constraint, CPU device type.
    pub fn new() -> Self {
        Self {
            descriptor: AlgorithmDescriptor {
                family: "fcfs".to_string(),
                version: None,
                device_type: Some(DeviceType::Cpu),
            },
            compute_unit: None,
            engine: FcfsEngine,
        }
    }
}

impl Default for FcfsAlgorithm {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for FcfsAlgorithm {
    fn description(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn bind_to(&mut self, cu: ComputeUnit) -> Result<()> {
        self.compute_unit = Some(cu);
        Ok(())
    }

    fn create_timetable(
        &mut self,
        snapshot: &SchedulingSnapshot,
        events: &dyn ChainEvents,
    ) -> Result<Timetable> {
        let rh = crate::rh::ResourceHierarchyIndex::build(snapshot)?;
        let cancelled = || events.forced_to_interrupt();
        let tt = self.engine.schedule(snapshot, &rh, &snapshot.jobs, false, &cancelled)?;
        events.publish_intermediate(&tt);
        Ok(tt)
    }

    fn improve_timetable(
        &mut self,
        _old: &Timetable,
        snapshot: &SchedulingSnapshot,
        events: &dyn ChainEvents,
    ) -> Result<Timetable> {
        self.create_timetable(snapshot, events)
    }
}

/// Constructs a fresh [`Algorithm`] instance for a descriptor.
pub type AlgorithmConstructor = Arc<dyn Fn() -> Box<dyn Algorithm> + Send + Sync>;

/// Holds the known algorithm descriptors and how to instantiate each.
pub struct AlgorithmFactory {
    entries: Vec<(AlgorithmDescriptor, AlgorithmConstructor)>,
}

impl AlgorithmFactory {
    /// A factory pre-loaded with the built-in FCFS algorithm.
    pub fn with_builtins() -> Self {
        let mut factory = Self { entries: Vec::new() };
        factory.register(
            AlgorithmDescriptor {
                family: "fcfs".to_string(),
                version: None,
                device_type: Some(DeviceType::Cpu),
            },
            Arc::new(|| Box::new(FcfsAlgorithm::new()) as Box<dyn Algorithm>),
        );
        factory
    }

    /// Registers a descriptor and its constructor.
    pub fn register(&mut self, descriptor: AlgorithmDescriptor, constructor: AlgorithmConstructor) {
        self.entries.push((descriptor, constructor));
    }

    /// All known descriptors, in registration order.
    pub fn known_algorithms(&self) -> Vec<&AlgorithmDescriptor> {
        self.entries.iter().map(|(d, _)| d).collect()
    }

    /// Resolves a spec against the known descriptors, first match wins by
    /// iteration order, and instantiates it.
    pub fn create(&self, spec: &AlgorithmSpec) -> Result<Box<dyn Algorithm>> {
        self.entries
            .iter()
            .find(|(desc, _)| spec.matches(desc))
            .map(|(_, ctor)| ctor())
            .ok_or_else(|| Error::NoMatchingAlgorithm {
                family: spec.family.clone(),
                version: spec.version.clone(),
                device_type: spec.device_type.map(|dt| dt.to_string()),
            })
    }
}

impl Default for AlgorithmFactory {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_resolves_builtin_fcfs() {
        let factory = AlgorithmFactory::with_builtins();
        let spec = AlgorithmSpec { family: "fcfs".to_string(), version: None, device_type: None };
        assert!(factory.create(&spec).is_ok());
    }

    #[test]
    fn factory_rejects_unknown_family() {
        let factory = AlgorithmFactory::with_builtins();
        let spec = AlgorithmSpec { family: "backfill".to_string(), version: None, device_type: None };
        assert!(matches!(factory.create(&spec), Err(Error::NoMatchingAlgorithm { .. })));
    }

    #[test]
    fn factory_respects_device_type_constraint() {
        let factory = AlgorithmFactory::with_builtins();
        let spec = AlgorithmSpec { family: "fcfs".to_string(), version: None, device_type: Some(DeviceType::Gpu) };
        assert!(factory.create(&spec).is_err());
    }
}
