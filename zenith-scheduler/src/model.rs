//! Domain data model for the resource hierarchy, jobs, and timetables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An opaque resource-property value. Equality is by value, for strict
/// property matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A string-valued property.
    Str(String),
    /// An integer-valued property.
    Int(i64),
    /// A boolean-valued property.
    Bool(bool),
}

/// A single named resource, attached either to a node (capacity) or to a
/// job (request).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Resource name, e.g. `"node"`, `"cpu"`, `"job"`.
    pub name: String,
    /// How many units of this resource.
    pub count: i64,
    /// Opaque `(name, value)` properties attached to this resource.
    #[serde(default)]
    pub properties: Vec<(String, PropertyValue)>,
}

impl Resource {
    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// The names of resource requests that never get checked against node
/// capacity: these gate placement differently or are treated as
/// annotations rather than a capacity claim.
pub const DYNAMIC_REQUEST_NAMES: &[&str] =
    &["node", "image", "container-image", "cloud-image", "ports"];

/// Whether a request name belongs to the dynamic set.
pub fn is_dynamic_request(name: &str) -> bool {
    DYNAMIC_REQUEST_NAMES.contains(&name)
}

/// Up/down state shared by clusters and partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminState {
    /// Usable.
    Up,
    /// Not usable; excludes all nodes beneath it from eligibility.
    Down,
}

/// Node power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    /// Powered on.
    Up,
    /// Powered off.
    Down,
}

/// Node allocation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocState {
    /// Free for new work.
    Idle,
    /// Currently running a job.
    Busy,
    /// Drained, reserved, or otherwise unavailable.
    Other,
}

/// A leaf of the resource hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique id within the hierarchy.
    pub id: String,
    /// Power state.
    pub state_power: PowerState,
    /// Allocation state.
    pub state_alloc: AllocState,
    /// When set, the node is always eligible for placement regardless of
    /// its power/alloc state or enclosing cluster/partition state.
    #[serde(default)]
    pub is_template: bool,
    /// Capacity resources carried by this node.
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Node {
    /// Whether this node may host a placement, given the up/down state of
    /// its enclosing cluster and partition.
    pub fn is_eligible(&self, cluster_up: bool, partition_up: bool) -> bool {
        let ordinary = self.state_power == PowerState::Up
            && self.state_alloc == AllocState::Idle
            && cluster_up
            && partition_up;
        ordinary || self.is_template
    }

    /// Whether a resource named `"job"` on this node already reserves it
    /// for a job id other than `job_id`.
    pub fn owned_by_other_job(&self, job_id: &str) -> bool {
        self.resources.iter().any(|r| {
            r.name == "job"
                && matches!(
                    r.property("id"),
                    Some(PropertyValue::Str(owner)) if owner != job_id
                )
        })
    }
}

/// A partition; may nest inside another partition, always inside exactly
/// one cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    /// Unique id.
    pub id: String,
    /// Admin state.
    pub state: AdminState,
    /// Node ids directly contained (not through a nested partition).
    #[serde(default)]
    pub node_ids: Vec<String>,
    /// Nested partition ids.
    #[serde(default)]
    pub partition_ids: Vec<String>,
    /// Jobs allowed per node, informational.
    #[serde(default)]
    pub jobs_per_node: u32,
}

/// A cluster: top-level scheduling domain (below an optional grid).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique id.
    pub id: String,
    /// Admin state.
    pub state: AdminState,
    /// Partition ids directly contained.
    #[serde(default)]
    pub partition_ids: Vec<String>,
}

/// Top of the resource hierarchy tree; optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grid {
    /// Cluster ids contained in the grid.
    #[serde(default)]
    pub cluster_ids: Vec<String>,
}

/// The kind of an entity referenced by an [`RhItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RhKind {
    /// A grid (root only).
    Grid,
    /// A cluster.
    Cluster,
    /// A partition.
    Partition,
    /// A node (always a leaf).
    Node,
}

/// One node of the resource-hierarchy tree as submitted in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RhItem {
    /// Declared kind.
    pub kind: RhKind,
    /// Id, which must resolve against the matching entity list.
    pub id: String,
    /// Children; must be empty when `kind == Node`.
    #[serde(default)]
    pub children: Vec<RhItem>,
}

/// Job lifecycle state, coarse-grained (`Q`, `R`, `S`, `C`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Queued, awaiting placement.
    Queued,
    /// Running.
    Running,
    /// Suspended.
    Suspended,
    /// Completed successfully.
    Completed,
    /// Failed.
    Failed,
    /// Cancelled.
    Cancelled,
}

/// A job to be placed by the FCFS engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique id.
    pub id: String,
    /// Owning cluster id.
    pub cluster_id: String,
    /// Lifecycle state.
    pub state: JobState,
    /// Scheduling priority; higher runs first.
    pub priority: i64,
    /// Gang id; empty string means "not part of a gang".
    #[serde(default)]
    pub gang_id: String,
    /// Duration once placed, in the engine's time unit.
    pub duration: u64,
    /// Resource requests, including the required `"node"` count request.
    #[serde(default)]
    pub request: Vec<Resource>,
    /// Pre-selected node ids; if non-empty, placement is restricted to
    /// this set.
    #[serde(default)]
    pub node_ids: Vec<String>,
    /// Ids of other jobs this job depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Job {
    /// The requested node count, read from a `"node"` resource request.
    pub fn requested_node_count(&self) -> Option<i64> {
        self.request.iter().find(|r| r.name == "node").map(|r| r.count)
    }
}

/// One output unit of a scheduling pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    /// The job placed.
    pub job_id: String,
    /// Its assigned start time.
    pub start_time: u64,
    /// The nodes it was placed on.
    pub node_ids: Vec<String>,
}

/// A full timetable: the output of one scheduling pass or algorithm stage.
pub type Timetable = Vec<TimetableEntry>;

/// A full, already-validated scheduling snapshot: the resource hierarchy
/// plus flat entity lists plus the jobs to place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingSnapshot {
    /// Optional grid; absent means the RH root is a list of clusters.
    #[serde(default)]
    pub grid: Option<Grid>,
    /// The RH tree as submitted.
    pub resource_hierarchy: Vec<RhItem>,
    /// Flat cluster list, keyed by id. A `BTreeMap` keeps snapshot
    /// iteration order deterministic, which the FCFS engine's
    /// tie-breaking relies on for idempotent re-runs.
    pub clusters: BTreeMap<String, Cluster>,
    /// Flat partition list.
    pub partitions: BTreeMap<String, Partition>,
    /// Flat node list.
    pub nodes: BTreeMap<String, Node>,
    /// Jobs to place.
    pub jobs: Vec<Job>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_request_names() {
        assert!(is_dynamic_request("node"));
        assert!(is_dynamic_request("image"));
        assert!(is_dynamic_request("container-image"));
        assert!(is_dynamic_request("cloud-image"));
        assert!(is_dynamic_request("ports"));
        assert!(!is_dynamic_request("cpu"));
    }

    #[test]
    fn node_eligibility_template_override() {
        let node = Node {
            id: "n1".into(),
            state_power: PowerState::Down,
            state_alloc: AllocState::Other,
            is_template: true,
            resources: vec![],
        };
        assert!(node.is_eligible(false, false));
    }

    #[test]
    fn node_eligibility_ordinary() {
        let node = Node {
            id: "n1".into(),
            state_power: PowerState::Up,
            state_alloc: AllocState::Idle,
            is_template: false,
            resources: vec![],
        };
        assert!(node.is_eligible(true, true));
        assert!(!node.is_eligible(false, true));
        assert!(!node.is_eligible(true, false));
    }

    #[test]
    fn node_owned_by_other_job() {
        let node = Node {
            id: "n1".into(),
            state_power: PowerState::Up,
            state_alloc: AllocState::Idle,
            is_template: false,
            resources: vec![Resource {
                name: "job".into(),
                count: 1,
                properties: vec![("id".into(), PropertyValue::Str("job-2".into()))],
            }],
        };
        assert!(node.owned_by_other_job("job-1"));
        assert!(!node.owned_by_other_job("job-2"));
    }
}
