//! Full-text index over the read collection.
//!
//! - [`interval`]: BWT row intervals, the identity type of indexed reads
//! - [`fm_index`]: occurrence checkpoints and backward extension
//! - [`read_index`]: generalized suffix array + FM-index over all reads

pub mod fm_index;
pub mod interval;
pub mod read_index;

pub use fm_index::SENTINEL;
pub use interval::Interval;
pub use read_index::{Occurrence, ReadIndex};
