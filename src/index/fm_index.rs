// FM-Index operations for BWT-based read search
//
// This module contains the core FM-Index functionality including:
// - Occurrence counting with popcount over one-hot checkpoint blocks
// - Backward extension of BWT intervals
// - Backward search of whole patterns

use super::interval::Interval;

const CP_MASK: u64 = 63;
pub const CP_SHIFT: u64 = 6;

/// Read terminator. Lexicographically smaller than every base.
pub const SENTINEL: u8 = b'$';

/// Number of symbols in the index alphabet: `$`, A, C, G, T
pub const ALPHABET_SIZE: usize = 5;

/// Symbol code of the terminator in the BWT
pub const SENTINEL_CODE: u8 = 0;

/// Map an ASCII symbol to its code in the index alphabet.
///
/// Lowercase bases are accepted; anything else outside `$ACGT` is rejected.
#[inline]
pub fn symbol_code(symbol: u8) -> Option<u8> {
    match symbol {
        b'$' => Some(0),
        b'A' | b'a' => Some(1),
        b'C' | b'c' => Some(2),
        b'G' | b'g' => Some(3),
        b'T' | b't' => Some(4),
        _ => None,
    }
}

/// Checkpoint occurrence structure for the FM-Index
/// Stores occurrence counts and the one-hot encoded BWT at 64-symbol checkpoints
#[derive(Debug, Clone, Copy)]
pub struct CpOcc {
    /// Occurrence counts for each symbol before this checkpoint
    pub checkpoint_counts: [i64; ALPHABET_SIZE],
    /// One-hot encoded BWT bits for popcount-based occurrence queries
    pub bwt_encoding_bits: [u64; ALPHABET_SIZE],
}

// ONE_HOT_MASK_ARRAY[i] has the top i bits set
const ONE_HOT_MASK_ARRAY: [u64; 64] = {
    let base: u64 = 0x8000000000000000;
    let mut array = [0u64; 64];
    array[1] = base;
    let mut i = 2;
    while i < 64 {
        array[i] = (array[i - 1] >> 1) | base;
        i += 1;
    }
    array
};

#[inline(always)]
pub fn popcount64(x: u64) -> i64 {
    x.count_ones() as i64
}

/// FM-Index over a BWT of symbol codes
#[derive(Debug)]
pub struct FmIndex {
    /// BWT as symbol codes (0..ALPHABET_SIZE)
    pub bwt: Vec<u8>,
    /// C(): number of symbols smaller than each code; the last entry is the BWT length
    pub cumulative_count: [i64; ALPHABET_SIZE + 1],
    pub cp_occ: Vec<CpOcc>,
}

impl FmIndex {
    /// Build counts and occurrence checkpoints from a BWT of symbol codes
    pub fn from_bwt(bwt: Vec<u8>) -> Self {
        let mut symbol_counts = [0i64; ALPHABET_SIZE];
        for &c in bwt.iter() {
            symbol_counts[c as usize] += 1;
        }

        let mut cumulative_count = [0i64; ALPHABET_SIZE + 1];
        for c in 0..ALPHABET_SIZE {
            cumulative_count[c + 1] = cumulative_count[c] + symbol_counts[c];
        }

        let cp_occ = calculate_cp_occ(&bwt);
        log::debug!(
            "FM-index: {} symbols, {} checkpoints, C = {:?}",
            bwt.len(),
            cp_occ.len(),
            cumulative_count
        );

        FmIndex {
            bwt,
            cumulative_count,
            cp_occ,
        }
    }

    pub fn len(&self) -> usize {
        self.bwt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bwt.is_empty()
    }

    /// Number of occurrences of symbol code `c` in `bwt[0..k)`
    #[inline(always)]
    pub fn get_occ(&self, k: i64, c: u8) -> i64 {
        let occ_id_k = (k >> CP_SHIFT) as usize;
        let y_k = (k & CP_MASK as i64) as usize;

        let cp_occ = &self.cp_occ[occ_id_k];
        let match_mask_k = cp_occ.bwt_encoding_bits[c as usize] & ONE_HOT_MASK_ARRAY[y_k];
        cp_occ.checkpoint_counts[c as usize] + popcount64(match_mask_k)
    }

    /// Rows whose suffix starts with symbol code `c`
    #[inline]
    pub fn symbol_interval(&self, c: u8) -> Interval {
        let lower = self.cumulative_count[c as usize];
        let upper = self.cumulative_count[c as usize + 1] - 1;
        normalize(Interval::new(lower, upper))
    }

    /// Backward extension: narrow `interval` (rows prefixed by P) to the rows
    /// prefixed by cP.
    #[inline]
    pub fn backward_ext(&self, interval: Interval, c: u8) -> Interval {
        if !interval.is_valid() {
            return Interval::invalid();
        }
        let base = self.cumulative_count[c as usize];
        let lower = base + self.get_occ(interval.lower, c);
        let upper = base + self.get_occ(interval.upper + 1, c) - 1;

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "backward_ext: {} --{}--> [{}, {}]",
                interval,
                c,
                lower,
                upper
            );
        }

        normalize(Interval::new(lower, upper))
    }

    /// Backward search of a whole pattern given as symbol codes
    pub fn backward_search(&self, codes: &[u8]) -> Interval {
        let Some((&last, rest)) = codes.split_last() else {
            return normalize(Interval::new(0, self.len() as i64 - 1));
        };

        let mut interval = self.symbol_interval(last);
        for &c in rest.iter().rev() {
            if !interval.is_valid() {
                break;
            }
            interval = self.backward_ext(interval, c);
        }
        interval
    }
}

#[inline]
fn normalize(interval: Interval) -> Interval {
    if interval.is_valid() {
        interval
    } else {
        Interval::invalid()
    }
}

/// Build 64-symbol checkpoints: counts before each block plus the block's one-hot bits
fn calculate_cp_occ(bwt: &[u8]) -> Vec<CpOcc> {
    let cp_occ_size = (bwt.len() >> CP_SHIFT) + 1;
    let mut cp_occ: Vec<CpOcc> = Vec::with_capacity(cp_occ_size);

    let mut cumulative_counts = [0i64; ALPHABET_SIZE];
    for checkpoint in 0..cp_occ_size {
        let block_start = checkpoint << CP_SHIFT;
        let block_end = (block_start + (1 << CP_SHIFT)).min(bwt.len());

        let mut block_one_hot_bwt_str = [0u64; ALPHABET_SIZE];
        let checkpoint_counts = cumulative_counts;
        for pos in block_start..block_end {
            let c = bwt[pos] as usize;
            block_one_hot_bwt_str[c] |= 1u64 << (63 - (pos - block_start));
            cumulative_counts[c] += 1;
        }

        cp_occ.push(CpOcc {
            checkpoint_counts,
            bwt_encoding_bits: block_one_hot_bwt_str,
        });
    }

    cp_occ
}
