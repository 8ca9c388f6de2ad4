//! Resource Hierarchy Index: validates the `{grid? -> clusters ->
//! partitions* -> nodes}` tree and builds O(1) reverse lookup maps.
//!
//! A recursive walk checks each item's id against the flat entity maps,
//! rejecting a level that references the wrong kind, an unknown id, or an
//! id repeated within the same tree, while threading the enclosing
//! cluster id down to every node so the reverse maps can be built in one
//! pass.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::model::{RhItem, RhKind, SchedulingSnapshot};

/// Constant-time lookups derived from a validated resource hierarchy.
#[derive(Debug, Default)]
pub struct ResourceHierarchyIndex {
    node_to_cluster: HashMap<String, String>,
    node_to_partition: HashMap<String, String>,
    partition_to_cluster: HashMap<String, String>,
}

impl ResourceHierarchyIndex {
    /// Build the index from a snapshot, validating the tree shape along
    /// the way.
    pub fn build(snapshot: &SchedulingSnapshot) -> Result<Self> {
        let mut idx = Self::default();

        let root: &[RhItem] = if snapshot.resource_hierarchy.len() == 1
            && snapshot.resource_hierarchy[0].kind == RhKind::Grid
        {
            &snapshot.resource_hierarchy[0].children
        } else {
            &snapshot.resource_hierarchy
        };

        let mut known_clusters = HashSet::new();
        let mut known_partitions = HashSet::new();
        let mut known_nodes = HashSet::new();

        for item in root {
            idx.parse_cluster(
                item,
                snapshot,
                &mut known_clusters,
                &mut known_partitions,
                &mut known_nodes,
            )?;
        }

        Ok(idx)
    }

    fn parse_cluster(
        &mut self,
        item: &RhItem,
        snapshot: &SchedulingSnapshot,
        known_clusters: &mut HashSet<String>,
        known_partitions: &mut HashSet<String>,
        known_nodes: &mut HashSet<String>,
    ) -> Result<()> {
        check_rh_item(item, RhKind::Cluster, &snapshot.clusters, known_clusters)?;

        for child in &item.children {
            self.parse_partition(
                child,
                snapshot,
                &item.id,
                known_partitions,
                known_nodes,
            )?;
        }
        Ok(())
    }

    fn parse_partition(
        &mut self,
        item: &RhItem,
        snapshot: &SchedulingSnapshot,
        cluster_id: &str,
        known_partitions: &mut HashSet<String>,
        known_nodes: &mut HashSet<String>,
    ) -> Result<()> {
        check_rh_item(item, RhKind::Partition, &snapshot.partitions, known_partitions)?;
        self.partition_to_cluster.insert(item.id.clone(), cluster_id.to_string());

        for child in &item.children {
            match child.kind {
                RhKind::Partition => {
                    self.parse_partition(child, snapshot, cluster_id, known_partitions, known_nodes)?;
                }
                _ => {
                    self.parse_node(child, snapshot, cluster_id, &item.id, known_nodes)?;
                }
            }
        }
        Ok(())
    }

    fn parse_node(
        &mut self,
        item: &RhItem,
        snapshot: &SchedulingSnapshot,
        cluster_id: &str,
        partition_id: &str,
        known_nodes: &mut HashSet<String>,
    ) -> Result<()> {
        check_rh_item(item, RhKind::Node, &snapshot.nodes, known_nodes)?;
        if !item.children.is_empty() {
            return Err(Error::InvalidHierarchy(format!(
                "node #{} has children",
                item.id
            )));
        }
        self.node_to_cluster.insert(item.id.clone(), cluster_id.to_string());
        self.node_to_partition.insert(item.id.clone(), partition_id.to_string());
        Ok(())
    }

    /// The cluster id a node belongs to.
    pub fn cluster_of_node(&self, node_id: &str) -> Option<&str> {
        self.node_to_cluster.get(node_id).map(String::as_str)
    }

    /// The partition id a node belongs to.
    pub fn partition_of_node(&self, node_id: &str) -> Option<&str> {
        self.node_to_partition.get(node_id).map(String::as_str)
    }

    /// The cluster id a partition belongs to.
    pub fn cluster_of_partition(&self, partition_id: &str) -> Option<&str> {
        self.partition_to_cluster.get(partition_id).map(String::as_str)
    }
}

fn check_rh_item<T>(
    item: &RhItem,
    expected_kind: RhKind,
    entities: &std::collections::BTreeMap<String, T>,
    known_ids: &mut HashSet<String>,
) -> Result<()> {
    if !entities.contains_key(&item.id) {
        return Err(Error::InvalidHierarchy(format!(
            "{:?} with id={} was referenced in RH but cannot be found",
            expected_kind, item.id
        )));
    }
    if item.kind != expected_kind {
        return Err(Error::InvalidHierarchy(format!(
            "wrong structure of RH, met {:?} instead of {:?}",
            item.kind, expected_kind
        )));
    }
    if !known_ids.insert(item.id.clone()) {
        return Err(Error::InvalidHierarchy(format!(
            "wrong structure of RH, {:?} #{} was referenced twice",
            expected_kind, item.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdminState, AllocState, Cluster, Node, Partition, PowerState};
    use std::collections::BTreeMap;

    fn flat_node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            state_power: PowerState::Up,
            state_alloc: AllocState::Idle,
            is_template: false,
            resources: vec![],
        }
    }

    fn simple_snapshot() -> SchedulingSnapshot {
        let mut clusters = BTreeMap::new();
        clusters.insert(
            "c1".to_string(),
            Cluster { id: "c1".into(), state: AdminState::Up, partition_ids: vec!["p1".into()] },
        );
        let mut partitions = BTreeMap::new();
        partitions.insert(
            "p1".to_string(),
            Partition { id: "p1".into(), state: AdminState::Up, node_ids: vec!["n1".into()], partition_ids: vec![], jobs_per_node: 1 },
        );
        let mut nodes = BTreeMap::new();
        nodes.insert("n1".to_string(), flat_node("n1"));

        SchedulingSnapshot {
            grid: None,
            resource_hierarchy: vec![RhItem {
                kind: RhKind::Cluster,
                id: "c1".into(),
                children: vec![RhItem {
                    kind: RhKind::Partition,
                    id: "p1".into(),
                    children: vec![RhItem { kind: RhKind::Node, id: "n1".into(), children: vec![] }],
                }],
            }],
            clusters,
            partitions,
            nodes,
            jobs: vec![],
        }
    }

    #[test]
    fn builds_reverse_maps() {
        let snapshot = simple_snapshot();
        let idx = ResourceHierarchyIndex::build(&snapshot).unwrap();
        assert_eq!(idx.cluster_of_node("n1"), Some("c1"));
        assert_eq!(idx.partition_of_node("n1"), Some("p1"));
        assert_eq!(idx.cluster_of_partition("p1"), Some("c1"));
    }

    #[test]
    fn rejects_unknown_id() {
        let mut snapshot = simple_snapshot();
        snapshot.resource_hierarchy[0].children[0].children[0].id = "missing".into();
        assert!(ResourceHierarchyIndex::build(&snapshot).is_err());
    }

    #[test]
    fn rejects_duplicate_id() {
        let mut snapshot = simple_snapshot();
        let dup = snapshot.resource_hierarchy[0].clone();
        snapshot.resource_hierarchy.push(dup);
        assert!(ResourceHierarchyIndex::build(&snapshot).is_err());
    }

    #[test]
    fn rejects_node_with_children() {
        let mut snapshot = simple_snapshot();
        snapshot.resource_hierarchy[0].children[0].children[0].children =
            vec![RhItem { kind: RhKind::Node, id: "n2".into(), children: vec![] }];
        assert!(ResourceHierarchyIndex::build(&snapshot).is_err());
    }

    #[test]
    fn grid_root_is_unwrapped() {
        let mut snapshot = simple_snapshot();
        let clusters = std::mem::take(&mut snapshot.resource_hierarchy);
        snapshot.resource_hierarchy = vec![RhItem { kind: RhKind::Grid, id: "g".into(), children: clusters }];
        let idx = ResourceHierarchyIndex::build(&snapshot).unwrap();
        assert_eq!(idx.cluster_of_node("n1"), Some("c1"));
    }
}
