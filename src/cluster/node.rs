use crate::index::Interval;
use std::cmp::Ordering;

/// One read in a cluster, in the orientation it was reached from the seed.
///
/// `interval` is the canonical identity of the read in the index: two nodes
/// with equal intervals are the same indexed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNode {
    pub sequence: String,
    pub interval: Interval,
    pub is_reverse_interval: bool,
}

impl ClusterNode {
    /// Order by interval only
    pub fn compare(a: &ClusterNode, b: &ClusterNode) -> Ordering {
        a.interval.cmp(&b.interval)
    }

    /// Nodes are the same read when their intervals match
    pub fn equal(a: &ClusterNode, b: &ClusterNode) -> bool {
        a.interval == b.interval
    }
}

pub type ClusterNodeVector = Vec<ClusterNode>;

/// Outcome of one cluster-growing run; empty when the run was degenerate or aborted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterResult {
    pub cluster_nodes: ClusterNodeVector,
}

impl ClusterResult {
    pub fn new(cluster_nodes: ClusterNodeVector) -> Self {
        ClusterResult { cluster_nodes }
    }

    pub fn len(&self) -> usize {
        self.cluster_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cluster_nodes.is_empty()
    }
}
