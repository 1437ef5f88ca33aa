pub mod cluster; // Cluster growth, post-processing and the cluster file format
pub mod cluster_opt;
pub mod defaults;
pub mod driver; // Batched parallel clustering for the binary
pub mod error;
pub mod index; // FM-index over the read set
pub mod io; // FASTA/FASTQ input
pub mod marker; // Shared "already clustered" bits
pub mod overlap; // Overlap engine trait and the FM-index implementation
pub mod utils;

pub use cluster::{
    ClusterNode, ClusterNodeVector, ClusterPostProcess, ClusterProcess, ClusterResult,
    ClusterStats, ReadCluster,
};
pub use error::ClusterError;
