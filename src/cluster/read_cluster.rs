// ReadCluster - grow a cluster of overlapping reads using the FM-index
//
// The index is treated as an implicit overlap graph: starting from the seed
// read(s), a breadth-first traversal asks the overlap engine for every read
// overlapping the current node and enqueues the ones not seen yet. The
// traversal aborts, discarding everything, once the cluster would exceed the
// size limit.

use super::node::{ClusterNode, ClusterNodeVector};
use crate::error::ClusterError;
use crate::index::{Interval, SENTINEL};
use crate::overlap::OverlapEngine;
use crate::utils::reverse_complement_str;
use std::collections::{HashSet, VecDeque};

#[path = "read_cluster_test.rs"]
mod read_cluster_test;

/// How a call to `ReadCluster::run` ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The connected component was fully explored
    Complete,
    /// The size bound was exceeded; all nodes were discarded
    Aborted,
}

pub struct ReadCluster<'a, E: OverlapEngine + ?Sized> {
    overlapper: &'a E,
    min_overlap: usize,
    queue: VecDeque<ClusterNode>,
    out_cluster: ClusterNodeVector,
    // lower bounds of every interval introduced in this run
    used_index: HashSet<i64>,
}

impl<'a, E: OverlapEngine + ?Sized> ReadCluster<'a, E> {
    pub fn new(overlapper: &'a E, min_overlap: usize) -> Self {
        ReadCluster {
            overlapper,
            min_overlap,
            queue: VecDeque::new(),
            out_cluster: Vec::new(),
            used_index: HashSet::new(),
        }
    }

    /// Add a seed read to the cluster. Overlaps are found for each seed to grow the cluster.
    ///
    /// With `check_in_index` the seed must be an indexed read (primary
    /// clustering): a contained or unknown seed is a usage error. Without it
    /// (re-extending an earlier cluster) a contained seed is skipped with a
    /// warning and returned with the invalid interval `{0, -1}`, unqueued; a
    /// seed found only as the reverse complement of a read takes that read's
    /// interval and is flagged reverse.
    pub fn add_seed(
        &mut self,
        sequence: &str,
        check_in_index: bool,
    ) -> Result<ClusterNode, ClusterError> {
        let duplicate = self.overlapper.align_read_duplicate(sequence);
        if duplicate.is_substring {
            if check_in_index {
                return Err(ClusterError::SeedIsSubstring {
                    sequence: sequence.to_string(),
                });
            }

            log::warn!(
                "The cluster sequence to extend is a substring of some read. This seed is being skipped"
            );
            log::warn!("Sequence: {}", sequence);
            return Ok(ClusterNode {
                sequence: sequence.to_string(),
                interval: Interval::invalid(),
                is_reverse_interval: false,
            });
        }

        let mut read_interval = self.canonical_interval(sequence);
        let mut is_reverse_interval = false;

        if !read_interval.is_valid() {
            if check_in_index {
                return Err(ClusterError::SeedNotInIndex {
                    sequence: sequence.to_string(),
                });
            }

            // Cluster files hold members in the first seed's frame, so a
            // member may be the reverse complement of its indexed read
            let rc_interval = self.canonical_interval(&reverse_complement_str(sequence));
            if rc_interval.is_valid() {
                read_interval = rc_interval;
                is_reverse_interval = true;
            }
        }

        let node = ClusterNode {
            sequence: sequence.to_string(),
            interval: read_interval,
            is_reverse_interval,
        };
        self.used_index.insert(read_interval.lower);
        self.queue.push_back(node.clone());
        Ok(node)
    }

    // Anchor an exact match at a read boundary
    fn canonical_interval(&self, sequence: &str) -> Interval {
        let interval = self.overlapper.find_interval(sequence);
        self.overlapper.update_interval(interval, SENTINEL)
    }

    /// Run the traversal. If the number of queued plus accepted nodes exceeds
    /// `max`, the search is aborted and the cluster is emptied.
    pub fn run(&mut self, max: usize) -> RunStatus {
        while !self.queue.is_empty() {
            if self.queue.len() + self.out_cluster.len() > max {
                log::debug!(
                    "Cluster exceeded {} reads ({} queued, {} accepted), aborting",
                    max,
                    self.queue.len(),
                    self.out_cluster.len()
                );
                self.queue.clear();
                self.out_cluster.clear();
                return RunStatus::Aborted;
            }

            let Some(node) = self.queue.pop_front() else {
                break;
            };
            self.out_cluster.push(node);
            let current = &self.out_cluster[self.out_cluster.len() - 1];

            let blocks = self
                .overlapper
                .overlap_read(&current.sequence, self.min_overlap);

            for block in &blocks {
                let canonical_interval = block.canonical_interval();
                // Marked before queueing so a read listed twice in one block list is added once
                if self.used_index.insert(canonical_interval.lower) {
                    let new_node = ClusterNode {
                        sequence: block.full_string(&current.sequence),
                        interval: canonical_interval,
                        is_reverse_interval: block.is_target_reverse(),
                    };
                    self.queue.push_back(new_node);
                }
            }

            if log::log_enabled!(log::Level::Trace) {
                log::trace!(
                    "run: node {} -> {} blocks, queue={}, cluster={}",
                    current.interval,
                    blocks.len(),
                    self.queue.len(),
                    self.out_cluster.len()
                );
            }
        }

        RunStatus::Complete
    }

    /// Accepted nodes sorted by interval with duplicate intervals removed.
    ///
    /// Duplicates can still appear through simple cycles in the subgraph or
    /// repeated seeds. The sort is stable, so the first-discovered node (and
    /// its orientation) is the one kept.
    pub fn get_output(&self) -> ClusterNodeVector {
        let mut ret_vector = self.out_cluster.clone();
        ret_vector.sort_by(ClusterNode::compare);
        ret_vector.dedup_by(|later, earlier| ClusterNode::equal(later, earlier));
        ret_vector
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn cluster_len(&self) -> usize {
        self.out_cluster.len()
    }
}
