//! Overlap clustering of reads.
//!
//! - [`node`]: cluster members and per-run results
//! - [`read_cluster`]: breadth-first growth of one cluster with a size bound
//! - [`process`]: per-seed worker and the sequential post-processor
//! - [`reader`]: the tab-separated cluster file format

pub mod node;
pub mod process;
pub mod read_cluster;
pub mod reader;

pub use node::{ClusterNode, ClusterNodeVector, ClusterResult};
pub use process::{ClusterPostProcess, ClusterProcess, ClusterStats};
pub use read_cluster::{ReadCluster, RunStatus};
pub use reader::{ClusterReader, ClusterRecord, ClusterVector};
