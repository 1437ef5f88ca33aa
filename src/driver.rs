// Batch driver
//
// Both subcommands follow the same three stages per batch:
// - Read a batch of work items
// - Grow clusters in parallel using Rayon
// - Post-process results sequentially, in input order
//
// The post-processor is the only writer of the marker set during a batch;
// workers only read it to skip seeds claimed by earlier batches.

use crate::cluster::{
    ClusterPostProcess, ClusterProcess, ClusterReader, ClusterResult, ClusterStats, ClusterVector,
};
use crate::cluster_opt::ClusterOpt;
use crate::error::ClusterError;
use crate::index::ReadIndex;
use crate::io::{SeqReader, SequenceWorkItem};
use crate::marker::MarkedReads;
use crate::overlap::{FmOverlapper, OverlapEngine};
use crate::utils::xzopen;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

/// Read all sequences in batches of `batch_size` and index them
pub fn load_reads(
    reads_path: &Path,
    batch_size: usize,
) -> Result<(Vec<SequenceWorkItem>, FmOverlapper)> {
    let start_time = Instant::now();
    let mut reader = SeqReader::new(reads_path)
        .with_context(|| format!("Failed to open reads {}", reads_path.display()))?;

    let mut items: Vec<SequenceWorkItem> = Vec::new();
    let mut total_bases = 0usize;
    loop {
        let batch = reader
            .read_batch(batch_size.max(1))
            .with_context(|| format!("Failed to parse reads {}", reads_path.display()))?;
        if batch.is_empty() {
            break;
        }
        let batch_bases: usize = batch.iter().map(|item| item.seq.len()).sum();
        total_bases += batch_bases;
        log::debug!("Read {} sequences ({} bp)", batch.len(), batch_bases);
        items.extend(batch);
    }
    log::info!("Read {} sequences ({} bp)", items.len(), total_bases);

    let index = ReadIndex::build(items.iter().map(|item| item.seq.as_bytes()))
        .with_context(|| format!("Failed to index reads {}", reads_path.display()))?;
    log::info!(
        "Built index over {} reads in {:.2} sec",
        index.num_reads(),
        start_time.elapsed().as_secs_f64()
    );

    Ok((items, FmOverlapper::new(index)))
}

/// Open the output file, or stdout when none is given
pub fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// `cluster` subcommand: one primary cluster per unclaimed read
pub fn run_cluster(opt: &ClusterOpt, reads_path: &Path, output: Option<&Path>) -> Result<ClusterStats> {
    let (items, overlapper) = load_reads(reads_path, opt.batch_size)?;
    let marked_reads = MarkedReads::new(overlapper.index().num_identities());
    let writer = open_output(output)?;
    cluster_items(&items, &overlapper, opt, &marked_reads, writer)
}

/// `extend` subcommand: re-grow each cluster of an earlier run against the reads
pub fn run_extend(
    opt: &ClusterOpt,
    reads_path: &Path,
    clusters_path: &Path,
    output: Option<&Path>,
) -> Result<ClusterStats> {
    let (_, overlapper) = load_reads(reads_path, opt.batch_size)?;
    let marked_reads = MarkedReads::new(overlapper.index().num_identities());

    let input = xzopen(clusters_path)
        .with_context(|| format!("Failed to open clusters {}", clusters_path.display()))?;
    let clusters = ClusterReader::new(BufReader::new(input));
    let writer = open_output(output)?;
    extend_clusters(clusters, &overlapper, opt, &marked_reads, writer)
}

/// True when some node of `result` is a read claimed by an already written cluster
fn has_claimed_read(result: &ClusterResult, marked_reads: &MarkedReads) -> bool {
    result
        .cluster_nodes
        .iter()
        .filter(|node| node.interval.is_valid())
        .any(|node| marked_reads.is_marked(node.interval.lower as usize))
}

/// Cluster `items` in batches, writing every emitted cluster to `writer`
pub fn cluster_items<E, W>(
    items: &[SequenceWorkItem],
    overlapper: &E,
    opt: &ClusterOpt,
    marked_reads: &MarkedReads,
    writer: W,
) -> Result<ClusterStats>
where
    E: OverlapEngine + Sync + ?Sized,
    W: Write,
{
    let start_time = Instant::now();
    let process = ClusterProcess::new(
        overlapper,
        opt.min_overlap,
        opt.max_cluster_size,
        marked_reads,
    );
    let mut post_process = ClusterPostProcess::new(writer, opt.min_cluster_size, marked_reads);

    let batch_size = opt.batch_size.max(1);
    let mut num_dropped = 0usize;
    for batch in items.chunks(batch_size) {
        log::debug!("Processing batch of {} reads in parallel", batch.len());

        // Stage 1: grow clusters in parallel
        let results: Vec<_> = batch.par_iter().map(|item| process.process(item)).collect();

        // Stage 2: post-process in input order
        for (item, result) in batch.iter().zip(results) {
            let result =
                result.with_context(|| format!("Failed to cluster read {}", item.id))?;
            if result.is_empty() {
                continue;
            }
            if has_claimed_read(&result, marked_reads) {
                log::debug!(
                    "Dropping cluster seeded by {}: it shares reads with an earlier cluster",
                    item.id
                );
                post_process.discard(&result);
                num_dropped += 1;
                continue;
            }
            post_process
                .process_item(item, &result)
                .context("Failed to write cluster")?;
        }

        log::info!(
            "Processed {} reads, {} clusters so far",
            batch[batch.len() - 1].idx + 1,
            post_process.stats().num_clusters
        );
    }

    log_dropped(num_dropped);
    finish(post_process, start_time)
}

/// Re-grow each cluster read from `clusters`, writing results to `writer`
pub fn extend_clusters<I, E, W>(
    clusters: I,
    overlapper: &E,
    opt: &ClusterOpt,
    marked_reads: &MarkedReads,
    writer: W,
) -> Result<ClusterStats>
where
    I: IntoIterator<Item = Result<ClusterVector, ClusterError>>,
    E: OverlapEngine + Sync + ?Sized,
    W: Write,
{
    let start_time = Instant::now();
    let process = ClusterProcess::new(
        overlapper,
        opt.min_overlap,
        opt.max_cluster_size,
        marked_reads,
    );
    let mut post_process = ClusterPostProcess::new(writer, opt.min_cluster_size, marked_reads);

    let batch_size = opt.batch_size.max(1);
    let mut clusters = clusters.into_iter();
    let mut num_input_clusters = 0usize;
    let mut num_dropped = 0usize;
    loop {
        let batch: Vec<ClusterVector> = clusters
            .by_ref()
            .take(batch_size)
            .collect::<Result<_, _>>()
            .context("Failed to read cluster file")?;
        if batch.is_empty() {
            break;
        }
        num_input_clusters += batch.len();

        let results: Vec<_> = batch
            .par_iter()
            .map(|in_sequences| process.process_cluster(in_sequences))
            .collect();

        for (in_sequences, result) in batch.iter().zip(results) {
            let result = result.context("Failed to extend cluster")?;
            if has_claimed_read(&result, marked_reads) {
                log::debug!(
                    "Dropping extension of {}: it shares reads with an earlier cluster",
                    in_sequences
                        .first()
                        .map(|r| r.cluster_id.as_str())
                        .unwrap_or("<empty>")
                );
                post_process.discard(&result);
                num_dropped += 1;
                continue;
            }
            post_process
                .process_cluster(in_sequences, &result)
                .context("Failed to write cluster")?;
        }
        log::info!("Extended {} input clusters", num_input_clusters);
    }

    log_dropped(num_dropped);
    finish(post_process, start_time)
}

fn log_dropped(num_dropped: usize) {
    if num_dropped > 0 {
        log::info!(
            "Dropped {} clusters sharing reads with an earlier cluster of the same batch",
            num_dropped
        );
    }
}

fn finish<W: Write>(post_process: ClusterPostProcess<'_, W>, start_time: Instant) -> Result<ClusterStats> {
    post_process.log_summary();
    let stats = post_process.stats();
    post_process.finish().context("Failed to flush output")?;
    log::info!(
        "Clustering done in {:.2} sec",
        start_time.elapsed().as_secs_f64()
    );
    Ok(stats)
}
