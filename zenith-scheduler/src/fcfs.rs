//! The FCFS scheduling engine: node selection, gang and dependency
//! ordering, partition-affinity placement, and per-cluster "when-free"
//! bookkeeping.
//!
//! Jobs are placed greedily in priority/gang order against a per-cluster
//! view of node free times. Gang members are tracked in a window so their
//! start times can be retroactively aligned once the window closes, and
//! nodes already reserved within the window or owned by another job are
//! excluded from candidacy before a strict resource-fit check decides the
//! rest.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{Error, Result};
use crate::model::{is_dynamic_request, Job, SchedulingSnapshot, Timetable, TimetableEntry};
use crate::rh::ResourceHierarchyIndex;

/// A node reference living inside the engine: a node id plus the engine's
/// mutable overlay, the time after which the node is considered free.
#[derive(Debug, Clone)]
struct NodeRef {
    node_id: String,
    when_free: u64,
}

/// A placed job within the current gang window, tracked so the window can
/// be retroactively aligned to a common start time.
struct JobRef {
    tt_index: usize,
    job_id: String,
    cluster_id: String,
    duration: u64,
    node_ids: Vec<String>,
}

/// Stateless-across-invocations FCFS engine. Owns nothing between calls to
/// [`FcfsEngine::schedule`]; the per-cluster sorted node view lives only
/// for the duration of one call.
#[derive(Debug, Default)]
pub struct FcfsEngine;

impl FcfsEngine {
    /// Run one scheduling pass over `jobs` using `snapshot`/`rh` for node
    /// data. `cancelled` is polled before every job; when it returns
    /// `true` the batch is aborted with [`Error::Cancelled`].
    pub fn schedule(
        &self,
        snapshot: &SchedulingSnapshot,
        rh: &ResourceHierarchyIndex,
        jobs: &[Job],
        ignore_priorities: bool,
        cancelled: &dyn Fn() -> bool,
    ) -> Result<Timetable> {
        let mut nodes_per_cluster = init_nodes_per_cluster(snapshot, rh);

        let mut ordered: Vec<&Job> = jobs.iter().collect();
        if !ignore_priorities {
            ordered.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then_with(|| a.gang_id.cmp(&b.gang_id))
            });
        }

        let mut jobs_to_endtimes: HashMap<String, u64> = HashMap::new();
        let mut gang_id = String::new();
        let mut known_gang_ids: HashSet<String> = HashSet::new();
        let mut gang_nodes: HashSet<String> = HashSet::new();
        let mut gang_jobs: Vec<JobRef> = Vec::new();
        let mut gang_start_time: u64 = 0;
        let mut tts: Vec<TimetableEntry> = Vec::new();

        for job in ordered {
            if cancelled() {
                return Err(Error::Cancelled);
            }
            if job.state != crate::model::JobState::Queued {
                continue;
            }

            // Dependency threshold: every dependency must already have a
            // recorded end time, else the job is skipped for this pass.
            let mut start_time_threshold = 0u64;
            let mut unresolved_dependency = false;
            for dep in &job.dependencies {
                match jobs_to_endtimes.get(dep) {
                    Some(end) => start_time_threshold = start_time_threshold.max(*end),
                    None => {
                        unresolved_dependency = true;
                        break;
                    }
                }
            }
            if unresolved_dependency {
                continue;
            }

            if job.gang_id != gang_id {
                if !job.gang_id.is_empty() && known_gang_ids.contains(&job.gang_id) {
                    tracing::warn!(job_id = %job.id, gang_id = %job.gang_id, "gang id reused after window closed, dropping job");
                    continue;
                }
                if !job.gang_id.is_empty() {
                    known_gang_ids.insert(job.gang_id.clone());
                }
                if !gang_id.is_empty() {
                    align_jobs(&gang_jobs, &mut jobs_to_endtimes, gang_start_time, &mut tts, &mut nodes_per_cluster);
                }
                gang_nodes.clear();
                gang_jobs.clear();
                gang_start_time = 0;
                gang_id = job.gang_id.clone();
            } else if job.gang_id.is_empty() {
                gang_nodes.clear();
                gang_jobs.clear();
                gang_start_time = 0;
            }

            match schedule_single_job(job, start_time_threshold, &mut gang_nodes, &mut nodes_per_cluster, snapshot, rh) {
                Ok((entry, job_ref_node_ids)) => {
                    let end_time = entry.start_time + job.duration;
                    jobs_to_endtimes.insert(job.id.clone(), end_time);
                    gang_start_time = gang_start_time.max(entry.start_time);
                    let tt_index = tts.len();
                    gang_jobs.push(JobRef {
                        tt_index,
                        job_id: job.id.clone(),
                        cluster_id: job.cluster_id.clone(),
                        duration: job.duration,
                        node_ids: job_ref_node_ids,
                    });
                    tts.push(entry);
                }
                Err(err) => {
                    tracing::warn!(job_id = %job.id, error = %err, "cannot schedule job");
                    continue;
                }
            }
        }

        if !gang_id.is_empty() {
            align_jobs(&gang_jobs, &mut jobs_to_endtimes, gang_start_time, &mut tts, &mut nodes_per_cluster);
        }

        Ok(tts)
    }
}

fn init_nodes_per_cluster(
    snapshot: &SchedulingSnapshot,
    rh: &ResourceHierarchyIndex,
) -> BTreeMap<String, Vec<NodeRef>> {
    let mut nodes_per_cluster: BTreeMap<String, Vec<NodeRef>> =
        snapshot.clusters.keys().map(|id| (id.clone(), Vec::new())).collect();

    for (node_id, node) in &snapshot.nodes {
        let Some(cluster_id) = rh.cluster_of_node(node_id) else { continue };
        let Some(partition_id) = rh.partition_of_node(node_id) else { continue };
        let cluster_up = snapshot
            .clusters
            .get(cluster_id)
            .map(|c| c.state == crate::model::AdminState::Up)
            .unwrap_or(false);
        let partition_up = snapshot
            .partitions
            .get(partition_id)
            .map(|p| p.state == crate::model::AdminState::Up)
            .unwrap_or(false);

        if node.is_eligible(cluster_up, partition_up) {
            if let Some(vec) = nodes_per_cluster.get_mut(cluster_id) {
                vec.push(NodeRef { node_id: node_id.clone(), when_free: 0 });
            }
        }
    }
    nodes_per_cluster
}

fn sort_cluster(nodes: &mut [NodeRef]) {
    nodes.sort_by(|a, b| a.when_free.cmp(&b.when_free).then_with(|| a.node_id.cmp(&b.node_id)));
}

fn align_jobs(
    gang_jobs: &[JobRef],
    jobs_to_endtimes: &mut HashMap<String, u64>,
    start_time: u64,
    tts: &mut [TimetableEntry],
    nodes_per_cluster: &mut BTreeMap<String, Vec<NodeRef>>,
) {
    let mut touched_clusters: HashSet<String> = HashSet::new();
    for jr in gang_jobs {
        tts[jr.tt_index].start_time = start_time;
        let end_time = start_time + jr.duration;
        if let Some(nodes) = nodes_per_cluster.get_mut(&jr.cluster_id) {
            for node_id in &jr.node_ids {
                if let Some(nr) = nodes.iter_mut().find(|nr| &nr.node_id == node_id) {
                    nr.when_free = end_time;
                }
            }
        }
        touched_clusters.insert(jr.cluster_id.clone());
        jobs_to_endtimes.insert(jr.job_id.clone(), end_time);
    }
    for cluster_id in touched_clusters {
        if let Some(nodes) = nodes_per_cluster.get_mut(&cluster_id) {
            sort_cluster(nodes);
        }
    }
}

fn does_node_fit_request(requests: &[crate::model::Resource], resources: &[crate::model::Resource]) -> bool {
    for req in requests {
        if is_dynamic_request(&req.name) {
            continue;
        }
        let found = resources.iter().any(|res| {
            if res.name != req.name || res.count < req.count {
                return false;
            }
            req.properties.iter().all(|(name, value)| {
                res.properties
                    .iter()
                    .any(|(rname, rvalue)| rname == name && rvalue == value)
            })
        });
        if !found {
            return false;
        }
    }
    true
}

/// Schedules one job against the per-cluster node view, returning the
/// timetable entry and the chosen node ids (kept by the caller for later
/// gang alignment).
fn schedule_single_job(
    job: &Job,
    start_time_threshold: u64,
    gang_nodes: &mut HashSet<String>,
    nodes_per_cluster: &mut BTreeMap<String, Vec<NodeRef>>,
    snapshot: &SchedulingSnapshot,
    rh: &ResourceHierarchyIndex,
) -> Result<(TimetableEntry, Vec<String>)> {
    let requested = job.requested_node_count().ok_or_else(|| Error::MalformedJob {
        job_id: job.id.clone(),
        reason: "job has no \"node\" resource request".to_string(),
    })?;
    if requested < 1 {
        return Err(Error::MalformedJob {
            job_id: job.id.clone(),
            reason: "job's \"node\" resource request must be >= 1".to_string(),
        });
    }
    let requested = requested as usize;

    let nodes = nodes_per_cluster.get_mut(&job.cluster_id).ok_or_else(|| Error::MalformedJob {
        job_id: job.id.clone(),
        reason: format!("no such cluster #{}", job.cluster_id),
    })?;

    let preselected: HashSet<&str> = job.node_ids.iter().map(String::as_str).collect();
    let mut candidates: Vec<NodeRef> = Vec::new();
    for nr in nodes.iter() {
        if gang_nodes.contains(&nr.node_id) {
            continue;
        }
        if !preselected.is_empty() && !preselected.contains(nr.node_id.as_str()) {
            continue;
        }
        let Some(node) = snapshot.nodes.get(&nr.node_id) else { continue };
        if node.owned_by_other_job(&job.id) {
            continue;
        }
        if does_node_fit_request(&job.request, &node.resources) {
            candidates.push(nr.clone());
        }
    }

    if !preselected.is_empty() {
        let found: HashSet<&str> = candidates.iter().map(|nr| nr.node_id.as_str()).collect();
        if preselected.iter().any(|id| !found.contains(id)) {
            return Err(Error::NotEnoughNodes {
                job_id: job.id.clone(),
                requested: preselected.len(),
                found: found.len(),
            });
        }
    }

    if candidates.len() < requested {
        return Err(Error::NotEnoughNodes {
            job_id: job.id.clone(),
            requested,
            found: candidates.len(),
        });
    }

    // Extend the chosen prefix while the next candidate ties the boundary
    // node's when_free, then prefer the most populated partition among the
    // extended set.
    let mut ext = requested;
    while ext < candidates.len() && candidates[ext].when_free == candidates[requested - 1].when_free {
        ext += 1;
    }
    candidates.truncate(ext);

    let chosen: Vec<NodeRef> = if candidates.len() > requested {
        let mut by_partition: HashMap<String, Vec<NodeRef>> = HashMap::new();
        for nr in candidates {
            let partition = rh.partition_of_node(&nr.node_id).unwrap_or("").to_string();
            by_partition.entry(partition).or_default().push(nr);
        }
        let mut groups: Vec<(String, Vec<NodeRef>)> = by_partition.into_iter().collect();
        groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));

        let mut selected = Vec::with_capacity(requested);
        for (_, group) in groups {
            selected.extend(group);
            if selected.len() >= requested {
                break;
            }
        }
        selected.truncate(requested);
        selected
    } else {
        candidates
    };

    let min_when_free = chosen.iter().map(|nr| nr.when_free).min().unwrap_or(0);
    let start_time = start_time_threshold.max(min_when_free);
    let end_time = start_time + job.duration;

    let chosen_ids: Vec<String> = chosen.iter().map(|nr| nr.node_id.clone()).collect();
    for id in &chosen_ids {
        gang_nodes.insert(id.clone());
    }

    for nr in nodes.iter_mut() {
        if chosen_ids.contains(&nr.node_id) {
            nr.when_free = end_time;
        }
    }
    sort_cluster(nodes);

    Ok((
        TimetableEntry { job_id: job.id.clone(), start_time, node_ids: chosen_ids.clone() },
        chosen_ids,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AdminState, AllocState, Cluster, JobState, Node, Partition, PowerState, PropertyValue,
        Resource, RhItem, RhKind,
    };
    use std::sync::atomic::{AtomicBool, Ordering};

    fn node_resource(count: i64) -> Resource {
        Resource { name: "node".into(), count, properties: vec![] }
    }

    fn make_node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            state_power: PowerState::Up,
            state_alloc: AllocState::Idle,
            is_template: false,
            resources: vec![],
        }
    }

    fn single_cluster_snapshot(node_ids: &[&str]) -> SchedulingSnapshot {
        let mut clusters = BTreeMap::new();
        clusters.insert("c1".to_string(), Cluster { id: "c1".into(), state: AdminState::Up, partition_ids: vec!["p1".into()] });
        let mut partitions = BTreeMap::new();
        partitions.insert(
            "p1".to_string(),
            Partition { id: "p1".into(), state: AdminState::Up, node_ids: node_ids.iter().map(|s| s.to_string()).collect(), partition_ids: vec![], jobs_per_node: 1 },
        );
        let mut nodes = BTreeMap::new();
        let mut rh_children = Vec::new();
        for id in node_ids {
            nodes.insert(id.to_string(), make_node(id));
            rh_children.push(RhItem { kind: RhKind::Node, id: id.to_string(), children: vec![] });
        }
        SchedulingSnapshot {
            grid: None,
            resource_hierarchy: vec![RhItem {
                kind: RhKind::Cluster,
                id: "c1".into(),
                children: vec![RhItem { kind: RhKind::Partition, id: "p1".into(), children: rh_children }],
            }],
            clusters,
            partitions,
            nodes,
            jobs: vec![],
        }
    }

    fn never_cancelled() -> bool {
        false
    }

    const NO_CANCEL: fn() -> bool = never_cancelled;

    fn no_cancel() -> &'static dyn Fn() -> bool {
        &NO_CANCEL
    }

    #[test]
    fn single_node_single_job_zero_duration() {
        let snapshot = single_cluster_snapshot(&["A"]);
        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let job = Job {
            id: "1".into(),
            cluster_id: "c1".into(),
            state: JobState::Queued,
            priority: 0,
            gang_id: String::new(),
            duration: 0,
            request: vec![node_resource(1)],
            node_ids: vec![],
            dependencies: vec![],
        };
        let tts = FcfsEngine.schedule(&snapshot, &rh, &[job], false, no_cancel()).unwrap();
        assert_eq!(tts, vec![TimetableEntry { job_id: "1".into(), start_time: 0, node_ids: vec!["A".into()] }]);
    }

    #[test]
    fn partition_affinity_prefers_larger_partition() {
        let mut snapshot = single_cluster_snapshot(&[]);
        snapshot.partitions.insert("p1".into(), Partition { id: "p1".into(), state: AdminState::Up, node_ids: vec!["A".into()], partition_ids: vec![], jobs_per_node: 1 });
        snapshot.partitions.insert("p2".into(), Partition { id: "p2".into(), state: AdminState::Up, node_ids: vec!["B".into(), "C".into(), "D".into()], partition_ids: vec![], jobs_per_node: 1 });
        snapshot.partitions.insert("p3".into(), Partition { id: "p3".into(), state: AdminState::Up, node_ids: vec!["E".into()], partition_ids: vec![], jobs_per_node: 1 });
        for id in ["A", "B", "C", "D", "E"] {
            snapshot.nodes.insert(id.to_string(), make_node(id));
        }
        snapshot.resource_hierarchy = vec![RhItem {
            kind: RhKind::Cluster,
            id: "c1".into(),
            children: vec![
                RhItem { kind: RhKind::Partition, id: "p1".into(), children: vec![RhItem { kind: RhKind::Node, id: "A".into(), children: vec![] }] },
                RhItem { kind: RhKind::Partition, id: "p2".into(), children: vec!["B", "C", "D"].into_iter().map(|id| RhItem { kind: RhKind::Node, id: id.into(), children: vec![] }).collect() },
                RhItem { kind: RhKind::Partition, id: "p3".into(), children: vec![RhItem { kind: RhKind::Node, id: "E".into(), children: vec![] }] },
            ],
        }];

        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let job = Job {
            id: "1".into(),
            cluster_id: "c1".into(),
            state: JobState::Queued,
            priority: 0,
            gang_id: String::new(),
            duration: 1,
            request: vec![node_resource(3)],
            node_ids: vec![],
            dependencies: vec![],
        };
        let tts = FcfsEngine.schedule(&snapshot, &rh, &[job], false, no_cancel()).unwrap();
        let mut chosen = tts[0].node_ids.clone();
        chosen.sort();
        assert_eq!(chosen, vec!["B".to_string(), "C".to_string(), "D".to_string()]);
    }

    #[test]
    fn priority_ordering_on_single_node() {
        let snapshot = single_cluster_snapshot(&["A"]);
        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let jobs = vec![
            Job { id: "j1".into(), cluster_id: "c1".into(), state: JobState::Queued, priority: 10, gang_id: String::new(), duration: 1, request: vec![node_resource(1)], node_ids: vec![], dependencies: vec![] },
            Job { id: "j2".into(), cluster_id: "c1".into(), state: JobState::Queued, priority: 20, gang_id: String::new(), duration: 2, request: vec![node_resource(1)], node_ids: vec![], dependencies: vec![] },
            Job { id: "j3".into(), cluster_id: "c1".into(), state: JobState::Queued, priority: 0, gang_id: String::new(), duration: 3, request: vec![node_resource(1)], node_ids: vec![], dependencies: vec![] },
        ];
        let tts = FcfsEngine.schedule(&snapshot, &rh, &jobs, false, no_cancel()).unwrap();
        let by_id: HashMap<_, _> = tts.iter().map(|e| (e.job_id.clone(), e.start_time)).collect();
        assert_eq!(by_id["j2"], 0);
        assert_eq!(by_id["j1"], 2);
        assert_eq!(by_id["j3"], 3);
    }

    #[test]
    fn gang_members_share_start_time() {
        let snapshot = single_cluster_snapshot(&["A", "B"]);
        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let jobs = vec![
            Job { id: "g1a".into(), cluster_id: "c1".into(), state: JobState::Queued, priority: 0, gang_id: "g1".into(), duration: 1, request: vec![node_resource(1)], node_ids: vec!["A".into()], dependencies: vec![] },
            Job { id: "g1b".into(), cluster_id: "c1".into(), state: JobState::Queued, priority: 0, gang_id: "g1".into(), duration: 3, request: vec![node_resource(1)], node_ids: vec!["B".into()], dependencies: vec![] },
        ];
        let tts = FcfsEngine.schedule(&snapshot, &rh, &jobs, false, no_cancel()).unwrap();
        let by_id: HashMap<_, _> = tts.iter().map(|e| (e.job_id.clone(), e.start_time)).collect();
        assert_eq!(by_id["g1a"], by_id["g1b"]);
    }

    #[test]
    fn dependency_without_precursor_is_skipped() {
        let snapshot = single_cluster_snapshot(&["A"]);
        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let job = Job {
            id: "j2".into(),
            cluster_id: "c1".into(),
            state: JobState::Queued,
            priority: 0,
            gang_id: String::new(),
            duration: 1,
            request: vec![node_resource(1)],
            node_ids: vec![],
            dependencies: vec!["j1".into()],
        };
        let tts = FcfsEngine.schedule(&snapshot, &rh, &[job], false, no_cancel()).unwrap();
        assert!(tts.is_empty());
    }

    #[test]
    fn empty_jobs_yield_empty_timetable() {
        let snapshot = single_cluster_snapshot(&["A"]);
        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let tts = FcfsEngine.schedule(&snapshot, &rh, &[], false, no_cancel()).unwrap();
        assert!(tts.is_empty());
    }

    #[test]
    fn cancellation_aborts_batch() {
        let snapshot = single_cluster_snapshot(&["A"]);
        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let job = Job { id: "1".into(), cluster_id: "c1".into(), state: JobState::Queued, priority: 0, gang_id: String::new(), duration: 0, request: vec![node_resource(1)], node_ids: vec![], dependencies: vec![] };
        let cancelled = AtomicBool::new(true);
        let result = FcfsEngine.schedule(&snapshot, &rh, &[job], false, &|| cancelled.load(Ordering::Relaxed));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn node_count_missing_is_malformed() {
        let snapshot = single_cluster_snapshot(&["A"]);
        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let job = Job { id: "1".into(), cluster_id: "c1".into(), state: JobState::Queued, priority: 0, gang_id: String::new(), duration: 0, request: vec![], node_ids: vec![], dependencies: vec![] };
        // A dropped job is logged and the batch proceeds rather than
        // surfacing the MalformedJob error to the caller.
        let tts = FcfsEngine.schedule(&snapshot, &rh, &[job], false, no_cancel()).unwrap();
        assert!(tts.is_empty());
    }

    #[test]
    fn idempotent_rerun_with_ignore_priorities() {
        let snapshot = single_cluster_snapshot(&["A", "B", "C"]);
        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let jobs = vec![
            Job { id: "1".into(), cluster_id: "c1".into(), state: JobState::Queued, priority: 0, gang_id: String::new(), duration: 2, request: vec![node_resource(1)], node_ids: vec![], dependencies: vec![] },
            Job { id: "2".into(), cluster_id: "c1".into(), state: JobState::Queued, priority: 0, gang_id: String::new(), duration: 2, request: vec![node_resource(1)], node_ids: vec![], dependencies: vec![] },
        ];
        let first = FcfsEngine.schedule(&snapshot, &rh, &jobs, true, no_cancel()).unwrap();
        let second = FcfsEngine.schedule(&snapshot, &rh, &jobs, true, no_cancel()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn preselected_node_unavailable_drops_job() {
        let snapshot = single_cluster_snapshot(&["A"]);
        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let job = Job { id: "1".into(), cluster_id: "c1".into(), state: JobState::Queued, priority: 0, gang_id: String::new(), duration: 0, request: vec![node_resource(1)], node_ids: vec!["nonexistent".into()], dependencies: vec![] };
        let tts = FcfsEngine.schedule(&snapshot, &rh, &[job], false, no_cancel()).unwrap();
        assert!(tts.is_empty());
    }

    proptest::proptest! {
        #[test]
        fn sort_cluster_is_when_free_then_node_id_ordered(
            entries in proptest::collection::vec((0u64..1_000, "[a-z]{1,6}"), 0..20)
        ) {
            let mut nodes: Vec<NodeRef> = entries
                .into_iter()
                .map(|(when_free, node_id)| NodeRef { node_id, when_free })
                .collect();
            sort_cluster(&mut nodes);
            for pair in nodes.windows(2) {
                proptest::prop_assert!(
                    pair[0].when_free < pair[1].when_free
                        || (pair[0].when_free == pair[1].when_free && pair[0].node_id <= pair[1].node_id)
                );
            }
        }

        #[test]
        fn schedule_single_job_never_decreases_chosen_nodes_when_free(
            node_count in 1usize..5, duration in 0u64..10
        ) {
            let ids: Vec<String> = (0..node_count).map(|i| format!("n{i}")).collect();
            let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let snapshot = single_cluster_snapshot(&id_refs);
            let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
            let job = Job {
                id: "1".into(),
                cluster_id: "c1".into(),
                state: JobState::Queued,
                priority: 0,
                gang_id: String::new(),
                duration,
                request: vec![node_resource(node_count as i64)],
                node_ids: vec![],
                dependencies: vec![],
            };
            let before = init_nodes_per_cluster(&snapshot, &rh);
            let tts = FcfsEngine.schedule(&snapshot, &rh, &[job], false, no_cancel()).unwrap();
            proptest::prop_assert_eq!(tts.len(), 1);
            let entry = &tts[0];
            for node_id in &entry.node_ids {
                let before_when_free = before
                    .get("c1")
                    .and_then(|nodes| nodes.iter().find(|nr| &nr.node_id == node_id))
                    .map(|nr| nr.when_free)
                    .unwrap_or(0);
                proptest::prop_assert!(entry.start_time + duration >= before_when_free);
            }
        }
    }

    #[test]
    fn strict_property_matching_rejects_mismatch() {
        let mut snapshot = single_cluster_snapshot(&["A"]);
        snapshot.nodes.get_mut("A").unwrap().resources = vec![Resource {
            name: "gpu".into(),
            count: 1,
            properties: vec![("model".into(), PropertyValue::Str("a100".into()))],
        }];
        let rh = ResourceHierarchyIndex::build(&snapshot).unwrap();
        let job = Job {
            id: "1".into(),
            cluster_id: "c1".into(),
            state: JobState::Queued,
            priority: 0,
            gang_id: String::new(),
            duration: 0,
            request: vec![
                node_resource(1),
                Resource { name: "gpu".into(), count: 1, properties: vec![("model".into(), PropertyValue::Str("h100".into()))] },
            ],
            node_ids: vec![],
            dependencies: vec![],
        };
        let tts = FcfsEngine.schedule(&snapshot, &rh, &[job], false, no_cancel()).unwrap();
        assert!(tts.is_empty());
    }
}
