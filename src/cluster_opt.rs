use crate::defaults;
use clap::Args;
use std::path::PathBuf;

/// Clustering parameters
#[derive(Debug, Clone)]
pub struct ClusterOpt {
    /// Minimum exact overlap between two reads to link them
    pub min_overlap: usize,
    /// Clusters growing past this many reads are discarded
    pub max_cluster_size: usize,
    /// Clusters with fewer reads are not written
    pub min_cluster_size: usize,
    pub n_threads: usize,
    /// Work items grown in parallel before post-processing
    pub batch_size: usize,
    pub verbosity: i32,
}

impl Default for ClusterOpt {
    fn default() -> Self {
        ClusterOpt {
            min_overlap: defaults::MIN_OVERLAP,
            max_cluster_size: defaults::MAX_CLUSTER_SIZE,
            min_cluster_size: defaults::MIN_CLUSTER_SIZE,
            n_threads: num_cpus::get(),
            batch_size: defaults::BATCH_SIZE,
            verbosity: defaults::VERBOSITY,
        }
    }
}

impl ClusterOpt {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.min_overlap < 1 {
            errors.push(format!("Minimum overlap must be >= 1 (got {})", self.min_overlap));
        }
        if self.max_cluster_size < 1 {
            errors.push(format!(
                "Maximum cluster size must be >= 1 (got {})",
                self.max_cluster_size
            ));
        }
        if self.batch_size < 1 {
            errors.push(format!("Batch size must be >= 1 (got {})", self.batch_size));
        }
        if self.min_cluster_size > self.max_cluster_size {
            log::warn!(
                "Minimum cluster size {} exceeds maximum {}; no cluster will be written",
                self.min_cluster_size,
                self.max_cluster_size
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Map verbosity (1=error, 2=warning, 3=message, 4=debug, 5+=trace) to a log level
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            v if v <= 1 => log::LevelFilter::Error,
            2 => log::LevelFilter::Warn,
            3 => log::LevelFilter::Info,
            4 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Options shared by the `cluster` and `extend` subcommands
#[derive(Debug, Clone, Args)]
pub struct ClusterCliOptions {
    /// Input reads (FASTA/FASTQ, optionally gzipped); must be free of contained reads
    #[arg(value_name = "READS")]
    pub reads: PathBuf,

    /// Minimum overlap required between two reads
    #[arg(short = 'm', long, value_name = "INT", default_value_t = defaults::MIN_OVERLAP)]
    pub min_overlap: usize,

    /// Abort a cluster once it grows beyond INT reads
    #[arg(short = 'x', long = "max-size", value_name = "INT", default_value_t = defaults::MAX_CLUSTER_SIZE)]
    pub max_cluster_size: usize,

    /// Only write clusters with at least INT reads
    #[arg(short = 'c', long = "min-size", value_name = "INT", default_value_t = defaults::MIN_CLUSTER_SIZE)]
    pub min_cluster_size: usize,

    /// Output cluster file (default: stdout)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Number of threads (default: all available cores)
    #[arg(short = 't', long, value_name = "INT")]
    pub threads: Option<usize>,

    /// Work items per parallel batch
    #[arg(long, value_name = "INT", default_value_t = defaults::BATCH_SIZE)]
    pub batch_size: usize,

    /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
    #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
    pub verbosity: i32,
}

impl ClusterCliOptions {
    pub fn to_opt(&self) -> ClusterOpt {
        let mut opt = ClusterOpt {
            min_overlap: self.min_overlap,
            max_cluster_size: self.max_cluster_size,
            min_cluster_size: self.min_cluster_size,
            batch_size: self.batch_size,
            verbosity: self.verbosity,
            ..ClusterOpt::default()
        };
        if let Some(threads) = self.threads {
            opt.n_threads = threads;
        }
        opt
    }
}
