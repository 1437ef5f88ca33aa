// Shared "already clustered" marker bits
//
// One bit per identity slot of the read index. Setting a bit is atomic and
// idempotent, so worker threads may mark concurrently.

use std::sync::atomic::{AtomicU64, Ordering};

pub struct MarkedReads {
    words: Vec<AtomicU64>,
    len: usize,
}

impl MarkedReads {
    pub fn new(len: usize) -> Self {
        let words = (0..len.div_ceil(64)).map(|_| AtomicU64::new(0)).collect();
        MarkedReads { words, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set bit `idx`. Returns true if this call flipped it.
    #[inline]
    pub fn mark(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "marker index {} out of range {}", idx, self.len);
        let bit = 1u64 << (idx & 63);
        let previous = self.words[idx >> 6].fetch_or(bit, Ordering::AcqRel);
        previous & bit == 0
    }

    /// Out-of-range indices read as unmarked
    #[inline]
    pub fn is_marked(&self, idx: usize) -> bool {
        if idx >= self.len {
            return false;
        }
        let bit = 1u64 << (idx & 63);
        self.words[idx >> 6].load(Ordering::Acquire) & bit != 0
    }

    pub fn count_marked(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }
}

impl std::fmt::Debug for MarkedReads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkedReads")
            .field("len", &self.len)
            .field("marked", &self.count_marked())
            .finish()
    }
}
