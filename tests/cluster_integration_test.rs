// Integration tests for read clustering
//
// Reads are cut from random genomes so that every overlap is known exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use readcluster::cluster::{ClusterReader, ClusterRecord, ClusterVector};
use readcluster::cluster_opt::ClusterOpt;
use readcluster::driver;
use readcluster::index::{Interval, ReadIndex};
use readcluster::io::SequenceWorkItem;
use readcluster::marker::MarkedReads;
use readcluster::overlap::FmOverlapper;
use readcluster::utils::reverse_complement_str;
use readcluster::{ClusterError, ClusterPostProcess, ClusterProcess, ReadCluster};
use std::collections::HashSet;
use std::fs;
use std::io::Cursor;

fn random_genome(len: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| b"ACGT"[rng.gen_range(0..4)] as char)
        .collect()
}

fn overlapper_for(reads: &[String]) -> FmOverlapper {
    FmOverlapper::new(ReadIndex::build(reads).unwrap())
}

fn work_items(reads: &[String]) -> Vec<SequenceWorkItem> {
    reads
        .iter()
        .enumerate()
        .map(|(i, r)| SequenceWorkItem::new(i, format!("read{}", i), r.as_str()))
        .collect()
}

// A/B overlap by 40, B/C by 35, C/D by 10
fn chain_reads() -> Vec<String> {
    let genome = random_genome(400, 11);
    vec![
        genome[0..100].to_string(),
        genome[60..160].to_string(),
        genome[125..225].to_string(),
        genome[215..315].to_string(),
    ]
}

fn test_opt(min_overlap: usize, max_cluster_size: usize, min_cluster_size: usize) -> ClusterOpt {
    ClusterOpt {
        min_overlap,
        max_cluster_size,
        min_cluster_size,
        batch_size: 4,
        ..ClusterOpt::default()
    }
}

#[test]
fn test_chain_stops_at_short_overlap() {
    let reads = chain_reads();
    let overlapper = overlapper_for(&reads);
    let index = overlapper.index();

    let mut cluster = ReadCluster::new(&overlapper, 30);
    cluster.add_seed(&reads[0], true).unwrap();
    cluster.run(10);
    let output = cluster.get_output();

    let got: HashSet<Interval> = output.iter().map(|n| n.interval).collect();
    let expected: HashSet<Interval> = reads[..3]
        .iter()
        .map(|r| index.canonical_interval(r.as_bytes()))
        .collect();
    assert_eq!(got, expected);

    // Output is sorted by interval with no repeats
    assert!(output.windows(2).all(|w| w[0].interval < w[1].interval));
    for node in &output {
        assert!(reads[..3].contains(&node.sequence));
        assert!(!node.is_reverse_interval);
    }
}

#[test]
fn test_chain_aborts_over_size_limit() {
    let reads = chain_reads();
    let overlapper = overlapper_for(&reads);

    let mut cluster = ReadCluster::new(&overlapper, 30);
    cluster.add_seed(&reads[0], true).unwrap();
    cluster.run(2);
    assert!(cluster.get_output().is_empty());
}

#[test]
fn test_reverse_strand_reads_join_the_cluster() {
    let genome = random_genome(300, 5);
    let reads = vec![
        genome[0..100].to_string(),
        reverse_complement_str(&genome[50..150]),
        genome[100..200].to_string(),
    ];
    let overlapper = overlapper_for(&reads);

    let mut cluster = ReadCluster::new(&overlapper, 30);
    cluster.add_seed(&reads[0], true).unwrap();
    cluster.run(10);
    let output = cluster.get_output();
    assert_eq!(output.len(), 3);

    // Every node is given on the seed's strand
    let reverse = output
        .iter()
        .find(|n| n.interval == overlapper.index().canonical_interval(reads[1].as_bytes()))
        .unwrap();
    assert!(reverse.is_reverse_interval);
    assert_eq!(reverse.sequence, &genome[50..150]);
}

#[test]
fn test_strict_seed_errors_are_usage_errors() {
    let genome = random_genome(200, 3);
    let reads = vec![genome[0..100].to_string(), genome[80..180].to_string()];
    let overlapper = overlapper_for(&reads);
    let marks = MarkedReads::new(overlapper.index().num_identities());
    let process = ClusterProcess::new(&overlapper, 30, 10, &marks);

    let contained = SequenceWorkItem::new(0, "inner", &genome[10..60]);
    let err = process.process(&contained).unwrap_err();
    assert!(matches!(err, ClusterError::SeedIsSubstring { .. }));
    assert!(err.is_usage_error());

    let foreign = SequenceWorkItem::new(1, "foreign", random_genome(100, 77));
    let err = process.process(&foreign).unwrap_err();
    assert!(matches!(err, ClusterError::SeedNotInIndex { .. }));
    assert!(err.is_usage_error());
}

#[test]
fn test_empty_reads_never_seed_a_cluster() {
    let genome = random_genome(200, 9);
    let with_empty = vec![genome[0..100].to_string(), String::new()];
    assert!(matches!(
        ReadIndex::build(&with_empty),
        Err(ClusterError::EmptyRead { read: 1 })
    ));

    let reads = vec![genome[0..100].to_string(), genome[70..170].to_string()];
    let overlapper = overlapper_for(&reads);
    let marks = MarkedReads::new(overlapper.index().num_identities());
    let process = ClusterProcess::new(&overlapper, 30, 10, &marks);

    let err = process
        .process(&SequenceWorkItem::new(0, "empty", ""))
        .unwrap_err();
    assert!(matches!(err, ClusterError::SeedIsSubstring { .. }));

    let mut cluster = ReadCluster::new(&overlapper, 30);
    let node = cluster.add_seed("", false).unwrap();
    assert_eq!(node.interval, Interval::invalid());
    assert_eq!(cluster.queue_len(), 0);
    cluster.run(10);
    assert!(cluster.get_output().is_empty());

    // Nothing is claimed through an empty seed
    let empty_member = vec![ClusterRecord {
        cluster_id: "cluster-0".to_string(),
        cluster_size: 1,
        sequence: String::new(),
        interval: Interval::invalid(),
    }];
    let result = process.process_cluster(&empty_member).unwrap();
    assert!(result.is_empty());
    let mut post = ClusterPostProcess::new(Vec::new(), 0, &marks);
    post.process(&result).unwrap();
    assert_eq!(marks.count_marked(), 0);
}

#[test]
fn test_marked_seed_yields_empty_result() {
    let reads = chain_reads();
    let overlapper = overlapper_for(&reads);
    let marks = MarkedReads::new(overlapper.index().num_identities());
    let process = ClusterProcess::new(&overlapper, 30, 10, &marks);
    let item = SequenceWorkItem::new(0, "a", reads[0].as_str());

    assert_eq!(process.process(&item).unwrap().len(), 3);
    let lower = overlapper.index().canonical_interval(reads[0].as_bytes()).lower;
    marks.mark(lower as usize);
    assert!(process.process(&item).unwrap().is_empty());
}

#[test]
fn test_post_process_marks_and_writes() {
    let reads = chain_reads();
    let overlapper = overlapper_for(&reads);
    let marks = MarkedReads::new(overlapper.index().num_identities());
    let process = ClusterProcess::new(&overlapper, 30, 10, &marks);

    let mut post = ClusterPostProcess::new(Vec::new(), 2, &marks);
    for item in work_items(&reads) {
        let result = process.process(&item).unwrap();
        post.process_item(&item, &result).unwrap();
    }

    // Seeds 1 and 2 are claimed by cluster-0; D alone is below the minimum
    let stats = post.stats();
    assert_eq!(stats.num_clusters, 1);
    assert_eq!(stats.num_total_reads_clustered, 3);
    assert_eq!(stats.num_total_reads, 4);
    assert_eq!(marks.count_marked(), 3);

    let out = String::from_utf8(post.finish().unwrap()).unwrap();
    let records: Vec<ClusterRecord> = out
        .lines()
        .enumerate()
        .map(|(i, line)| ClusterRecord::parse(line, i + 1).unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    assert!(records
        .iter()
        .all(|r| r.cluster_id == "cluster-0" && r.cluster_size == 3));
}

#[test]
fn test_driver_assigns_each_read_once() {
    // Two unrelated contigs tiled by overlapping reads
    let mut reads = Vec::new();
    for seed in [21, 22] {
        let genome = random_genome(600, seed);
        for start in (0..=500).step_by(50) {
            reads.push(genome[start..start + 100].to_string());
        }
    }
    let overlapper = overlapper_for(&reads);
    let marks = MarkedReads::new(overlapper.index().num_identities());
    let items = work_items(&reads);

    let mut out = Vec::new();
    let stats =
        driver::cluster_items(&items, &overlapper, &test_opt(40, 100, 2), &marks, &mut out).unwrap();
    assert_eq!(stats.num_clusters, 2);
    assert_eq!(stats.num_total_reads_clustered, reads.len());

    let clusters: Vec<ClusterVector> = ClusterReader::new(Cursor::new(out))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(clusters.len(), 2);

    let mut seen = HashSet::new();
    for cluster in &clusters {
        assert_eq!(cluster.len(), reads.len() / 2);
        for record in cluster {
            assert!(seen.insert(record.interval), "read written twice");
        }
    }
}

#[test]
fn test_dropped_clusters_count_as_seen() {
    let reads = chain_reads();
    let overlapper = overlapper_for(&reads);
    let marks = MarkedReads::new(overlapper.index().num_identities());

    // One batch: seeds B and C regrow A's cluster before it is written
    let stats = driver::cluster_items(
        &work_items(&reads),
        &overlapper,
        &test_opt(30, 10, 2),
        &marks,
        Vec::new(),
    )
    .unwrap();
    assert_eq!(stats.num_clusters, 1);
    assert_eq!(stats.num_total_reads_clustered, 3);
    assert_eq!(stats.num_total_reads, 3 + 3 + 3 + 1);
}

#[test]
fn test_driver_discards_oversized_clusters() {
    let genome = random_genome(600, 31);
    let reads: Vec<String> = (0..=500)
        .step_by(50)
        .map(|start| genome[start..start + 100].to_string())
        .collect();
    let overlapper = overlapper_for(&reads);
    let marks = MarkedReads::new(overlapper.index().num_identities());

    let mut out = Vec::new();
    let stats = driver::cluster_items(
        &work_items(&reads),
        &overlapper,
        &test_opt(40, 5, 2),
        &marks,
        &mut out,
    )
    .unwrap();
    assert_eq!(stats.num_clusters, 0);
    assert!(out.is_empty());
    assert_eq!(marks.count_marked(), 0);
}

#[test]
fn test_driver_fails_on_contained_read() {
    let genome = random_genome(300, 41);
    let reads = vec![genome[0..100].to_string(), genome[20..70].to_string()];
    let overlapper = overlapper_for(&reads);
    let marks = MarkedReads::new(overlapper.index().num_identities());

    let err = driver::cluster_items(
        &work_items(&reads),
        &overlapper,
        &test_opt(30, 10, 1),
        &marks,
        Vec::new(),
    )
    .unwrap_err();
    let cause = err.downcast_ref::<ClusterError>().unwrap();
    assert!(cause.is_usage_error());
}

#[test]
fn test_extend_regrows_written_clusters() {
    let reads = chain_reads();
    let overlapper = overlapper_for(&reads);
    let opt = test_opt(30, 10, 2);

    let marks = MarkedReads::new(overlapper.index().num_identities());
    let mut first_pass = Vec::new();
    driver::cluster_items(&work_items(&reads), &overlapper, &opt, &marks, &mut first_pass).unwrap();

    // Extension only needs one member to recover the whole cluster
    let text = String::from_utf8(first_pass.clone()).unwrap();
    let single_member = text.lines().next().unwrap().to_string() + "\n";

    let marks = MarkedReads::new(overlapper.index().num_identities());
    let mut second_pass = Vec::new();
    let stats = driver::extend_clusters(
        ClusterReader::new(Cursor::new(single_member)),
        &overlapper,
        &opt,
        &marks,
        &mut second_pass,
    )
    .unwrap();
    assert_eq!(stats.num_clusters, 1);
    assert_eq!(second_pass, first_pass);
}

#[test]
fn test_extend_keeps_reverse_members() {
    let genome = random_genome(300, 5);
    let reads = vec![
        genome[0..100].to_string(),
        reverse_complement_str(&genome[50..150]),
        genome[100..200].to_string(),
    ];
    let overlapper = overlapper_for(&reads);
    let opt = test_opt(30, 10, 2);

    let marks = MarkedReads::new(overlapper.index().num_identities());
    let mut first_pass = Vec::new();
    driver::cluster_items(&work_items(&reads), &overlapper, &opt, &marks, &mut first_pass).unwrap();
    let text = String::from_utf8(first_pass.clone()).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains(&genome[50..150]));

    let marks = MarkedReads::new(overlapper.index().num_identities());
    let mut second_pass = Vec::new();
    let stats = driver::extend_clusters(
        ClusterReader::new(Cursor::new(first_pass.clone())),
        &overlapper,
        &opt,
        &marks,
        &mut second_pass,
    )
    .unwrap();
    assert_eq!(stats.num_clusters, 1);
    assert_eq!(stats.num_total_reads_clustered, 3);
    assert_eq!(second_pass, first_pass);
    assert!(!String::from_utf8(second_pass).unwrap().contains("\t0\t-1"));
}

#[test]
fn test_extend_skips_contained_members() {
    let reads = chain_reads();
    let overlapper = overlapper_for(&reads);
    let marks = MarkedReads::new(overlapper.index().num_identities());
    let process = ClusterProcess::new(&overlapper, 30, 10, &marks);

    let record = |sequence: &str| ClusterRecord {
        cluster_id: "cluster-0".to_string(),
        cluster_size: 2,
        sequence: sequence.to_string(),
        interval: Interval::invalid(),
    };
    let contained_only = vec![record(&reads[0][10..60])];
    assert!(process.process_cluster(&contained_only).unwrap().is_empty());

    let mixed = vec![record(&reads[0][10..60]), record(&reads[1])];
    assert_eq!(process.process_cluster(&mixed).unwrap().len(), 3);
}

#[test]
fn test_run_cluster_from_files() {
    let reads = chain_reads();
    let dir = tempfile::tempdir().unwrap();
    let reads_path = dir.path().join("reads.fa");
    let out_path = dir.path().join("clusters.tsv");

    let fasta: String = reads
        .iter()
        .enumerate()
        .map(|(i, r)| format!(">r{}\n{}\n", i, r.to_ascii_lowercase()))
        .collect();
    fs::write(&reads_path, fasta).unwrap();

    let opt = test_opt(30, 10, 2);
    let stats = driver::run_cluster(&opt, &reads_path, Some(&out_path)).unwrap();
    assert_eq!(stats.num_clusters, 1);

    let written = fs::read_to_string(&out_path).unwrap();
    assert_eq!(written.lines().count(), 3);

    let extend_path = dir.path().join("extended.tsv");
    let stats = driver::run_extend(&opt, &reads_path, &out_path, Some(&extend_path)).unwrap();
    assert_eq!(stats.num_clusters, 1);
    assert_eq!(fs::read_to_string(&extend_path).unwrap(), written);
}
