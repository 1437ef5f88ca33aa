// src/defaults.rs

// Clustering Constants
pub const MIN_OVERLAP: usize = 45;
pub const MAX_CLUSTER_SIZE: usize = 1000;
pub const MIN_CLUSTER_SIZE: usize = 2;

// Processing Constants
pub const BATCH_SIZE: usize = 1000;

// Other Constants
pub const VERBOSITY: i32 = 3;
