use thiserror::Error;

/// Errors produced while indexing reads or growing clusters.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A strict-mode seed is contained in another indexed read.
    /// The read set must be made substring-free (rmdup) before clustering.
    #[error("the seed is a substring of some read; remove contained reads before clustering (sequence: {sequence})")]
    SeedIsSubstring { sequence: String },

    /// A strict-mode seed does not occur as a whole read in the index.
    #[error("the seed read is not part of the FM-index (sequence: {sequence})")]
    SeedNotInIndex { sequence: String },

    /// No reads were supplied to the index builder.
    #[error("cannot build an index over an empty read set")]
    EmptyReadSet,

    /// A read has no bases. It would match at every read boundary.
    #[error("read {read} is empty")]
    EmptyRead { read: usize },

    /// A read contains a symbol outside of A, C, G, T.
    #[error("read {read} contains unsupported symbol '{symbol}'")]
    InvalidSymbol { read: usize, symbol: char },

    /// A line in a cluster file could not be parsed.
    #[error("malformed cluster record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClusterError {
    /// Usage errors mean the input violates the batch contract (reads not
    /// deduplicated, seed from outside the index).
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ClusterError::SeedIsSubstring { .. } | ClusterError::SeedNotInIndex { .. }
        )
    }
}
