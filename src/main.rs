use clap::{Parser, Subcommand};
use std::path::PathBuf;

use readcluster::cluster_opt::{ClusterCliOptions, ClusterOpt};
use readcluster::driver;

#[derive(Parser)]
#[command(name = "readcluster")]
#[command(about = "Cluster reads connected by exact overlaps using an FM-index", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grow a cluster from every read not yet clustered
    Cluster {
        #[command(flatten)]
        options: ClusterCliOptions,
    },

    /// Re-grow the clusters of an earlier run against the reads
    Extend {
        #[command(flatten)]
        options: ClusterCliOptions,

        /// Cluster file written by 'cluster'
        #[arg(value_name = "CLUSTERS")]
        clusters: PathBuf,
    },
}

fn init_logging(opt: &ClusterOpt) {
    env_logger::Builder::from_default_env()
        .filter_level(opt.log_level())
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module names
        .init();
}

/// Configure the global rayon pool, clamping the requested thread count
fn init_thread_pool(opt: &mut ClusterOpt) {
    let mut num_threads = opt.n_threads;

    if num_threads < 1 {
        log::warn!("Invalid thread count {}, using 1 thread", num_threads);
        num_threads = 1;
    }

    let max_threads = num_cpus::get() * 2;
    if num_threads > max_threads {
        log::warn!(
            "Thread count {} exceeds recommended maximum {}, capping at {}",
            num_threads,
            max_threads,
            max_threads
        );
        num_threads = max_threads;
    }
    opt.n_threads = num_threads;

    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(_) => {
            log::debug!("Built global Rayon thread pool with {} threads", num_threads);
        }
        Err(e) => {
            log::warn!(
                "Failed to configure thread pool: {} (may already be initialized)",
                e
            );
        }
    }

    let thread_word = if num_threads == 1 {
        "thread"
    } else {
        "threads"
    };
    log::info!("Using {} {}", num_threads, thread_word);
}

fn prepare(options: &ClusterCliOptions) -> ClusterOpt {
    let mut opt = options.to_opt();
    init_logging(&opt);

    if let Err(errors) = opt.validate() {
        for e in errors {
            log::error!("{}", e);
        }
        std::process::exit(1);
    }

    init_thread_pool(&mut opt);
    log::info!("Parameters:");
    log::info!("  Min overlap: {}", opt.min_overlap);
    log::info!("  Max cluster size: {}", opt.max_cluster_size);
    log::info!("  Min cluster size: {}", opt.min_cluster_size);
    opt
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Cluster { options } => {
            let opt = prepare(&options);
            log::info!("Clustering reads: {}", options.reads.display());
            driver::run_cluster(&opt, &options.reads, options.output.as_deref())
        }

        Commands::Extend { options, clusters } => {
            let opt = prepare(&options);
            log::info!(
                "Extending clusters {} against reads {}",
                clusters.display(),
                options.reads.display()
            );
            driver::run_extend(&opt, &options.reads, &clusters, options.output.as_deref())
        }
    };

    match result {
        Ok(stats) => {
            log::info!(
                "Done: {} clusters, {} of {} reads clustered",
                stats.num_clusters,
                stats.num_total_reads_clustered,
                stats.num_total_reads
            );
        }
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
