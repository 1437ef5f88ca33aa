// Per-seed clustering and the sequential post-processor
//
// ClusterProcess grows one cluster per work item and holds no mutable state,
// so a single instance is shared by all worker threads. ClusterPostProcess
// consumes results one at a time: it filters by size, claims the member reads
// in the shared marker set and writes the cluster records.

use super::node::ClusterResult;
use super::read_cluster::{ReadCluster, RunStatus};
use super::reader::{ClusterRecord, ClusterVector};
use crate::error::ClusterError;
use crate::io::SequenceWorkItem;
use crate::marker::MarkedReads;
use crate::overlap::OverlapEngine;
use std::io::{self, Write};

pub struct ClusterProcess<'a, E: OverlapEngine + ?Sized> {
    overlapper: &'a E,
    min_overlap: usize,
    max_cluster_size: usize,
    marked_reads: &'a MarkedReads,
}

impl<'a, E: OverlapEngine + ?Sized> ClusterProcess<'a, E> {
    pub fn new(
        overlapper: &'a E,
        min_overlap: usize,
        max_cluster_size: usize,
        marked_reads: &'a MarkedReads,
    ) -> Self {
        ClusterProcess {
            overlapper,
            min_overlap,
            max_cluster_size,
            marked_reads,
        }
    }

    /// Grow the cluster seeded by an indexed read.
    ///
    /// The seed must be a whole read of the index. A seed already claimed by
    /// an emitted cluster yields an empty result.
    pub fn process(&self, item: &SequenceWorkItem) -> Result<ClusterResult, ClusterError> {
        let mut cluster = ReadCluster::new(self.overlapper, self.min_overlap);
        let seed = cluster.add_seed(&item.seq, true)?;

        if self.marked_reads.is_marked(seed.interval.lower as usize) {
            log::trace!("Seed {} is already clustered, skipping", item.id);
            return Ok(ClusterResult::default());
        }

        if cluster.run(self.max_cluster_size) == RunStatus::Aborted {
            log::debug!(
                "Cluster seeded by {} exceeds {} reads, discarded",
                item.id,
                self.max_cluster_size
            );
        }
        Ok(ClusterResult::new(cluster.get_output()))
    }

    /// Re-grow a previously emitted cluster from all of its member sequences.
    ///
    /// Members need not be indexed reads; contained members are skipped with
    /// a warning.
    pub fn process_cluster(
        &self,
        in_sequences: &ClusterVector,
    ) -> Result<ClusterResult, ClusterError> {
        let mut cluster = ReadCluster::new(self.overlapper, self.min_overlap);
        for record in in_sequences {
            cluster.add_seed(&record.sequence, false)?;
        }

        if cluster.run(self.max_cluster_size) == RunStatus::Aborted {
            if let Some(first) = in_sequences.first() {
                log::debug!(
                    "Extension of {} exceeds {} reads, discarded",
                    first.cluster_id,
                    self.max_cluster_size
                );
            }
        }
        Ok(ClusterResult::new(cluster.get_output()))
    }
}

/// Running totals of the post-processor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterStats {
    /// Clusters written
    pub num_clusters: usize,
    /// Nodes seen across all results, written or not
    pub num_total_reads: usize,
    /// Nodes in written clusters
    pub num_total_reads_clustered: usize,
}

pub struct ClusterPostProcess<'a, W: Write> {
    writer: W,
    min_cluster_size: usize,
    marked_reads: &'a MarkedReads,
    stats: ClusterStats,
}

impl<'a, W: Write> ClusterPostProcess<'a, W> {
    pub fn new(writer: W, min_cluster_size: usize, marked_reads: &'a MarkedReads) -> Self {
        ClusterPostProcess {
            writer,
            min_cluster_size,
            marked_reads,
            stats: ClusterStats::default(),
        }
    }

    pub fn process_item(
        &mut self,
        _item: &SequenceWorkItem,
        result: &ClusterResult,
    ) -> io::Result<()> {
        self.process(result)
    }

    pub fn process_cluster(
        &mut self,
        _in_sequences: &ClusterVector,
        result: &ClusterResult,
    ) -> io::Result<()> {
        self.process(result)
    }

    /// Emit `result` if it is large enough.
    ///
    /// Every node of an emitted cluster has all rows of its interval marked,
    /// so duplicate copies of a read are claimed together.
    pub fn process(&mut self, result: &ClusterResult) -> io::Result<()> {
        let cluster_size = result.len();
        self.stats.num_total_reads += cluster_size;

        if result.is_empty() || cluster_size < self.min_cluster_size {
            return Ok(());
        }

        let cluster_id = format!("cluster-{}", self.stats.num_clusters);
        for node in &result.cluster_nodes {
            for row in node.interval.rows() {
                if row < self.marked_reads.len() {
                    self.marked_reads.mark(row);
                }
            }

            let record = ClusterRecord {
                cluster_id: cluster_id.clone(),
                cluster_size,
                sequence: node.sequence.clone(),
                interval: node.interval,
            };
            writeln!(self.writer, "{}", record)?;
        }

        self.stats.num_clusters += 1;
        self.stats.num_total_reads_clustered += cluster_size;
        Ok(())
    }

    /// Count the nodes of a result that will not be emitted, e.g. one that
    /// lost a race for its reads to an earlier cluster
    pub fn discard(&mut self, result: &ClusterResult) {
        self.stats.num_total_reads += result.len();
    }

    pub fn stats(&self) -> ClusterStats {
        self.stats
    }

    pub fn log_summary(&self) {
        log::info!(
            "[ClusterPostProcess] Wrote {} clusters",
            self.stats.num_clusters
        );
        log::info!(
            "[ClusterPostProcess] Clustered {} of {} reads seen",
            self.stats.num_total_reads_clustered,
            self.stats.num_total_reads
        );
    }

    /// Flush and hand back the writer
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
