// Read index management
//
// Builds two generalized FM-indexes over a read collection:
//   forward:  $ r0 $ r1 $ ... $ r(n-1) $
//   reversed: $ rev(r0) $ rev(r1) $ ... $ rev(r(n-1)) $
// Both texts share the read layout, so rows of either index locate back to
// (read, offset) pairs through the same read start table. Backward search in
// the reversed index extends a match to the right in read coordinates.

use super::fm_index::{FmIndex, SENTINEL, SENTINEL_CODE, symbol_code};
use super::interval::Interval;
use crate::error::ClusterError;
use bio::data_structures::suffix_array::suffix_array;

#[path = "read_index_test.rs"]
mod read_index_test;

/// Position of an interval row inside the read collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub read_id: usize,
    pub offset: usize,
}

/// FM-index and suffix array over one text layout
struct TextIndex {
    fm: FmIndex,
    suffix_array: Vec<usize>,
}

impl TextIndex {
    fn build(text: &[u8], codes: &[u8]) -> Self {
        // bio ranks repeated sentinels by position, so each '$' is distinct
        let suffix_array = suffix_array(text);

        // BWT[i] = text[SA[i] - 1], wrapping to the final '$' for SA[i] == 0
        let last = codes.len() - 1;
        let bwt: Vec<u8> = suffix_array
            .iter()
            .map(|&pos| if pos == 0 { codes[last] } else { codes[pos - 1] })
            .collect();

        TextIndex {
            fm: FmIndex::from_bwt(bwt),
            suffix_array,
        }
    }
}

/// Search and locate operations over one of the two texts
#[derive(Clone, Copy)]
pub struct StrandIndex<'a> {
    text: &'a TextIndex,
    read_starts: &'a [usize],
    reads: &'a [String],
}

impl<'a> StrandIndex<'a> {
    /// Interval of all rows prefixed by `pattern`; invalid when it does not occur
    pub fn find_interval(&self, pattern: &[u8]) -> Interval {
        let mut codes = Vec::with_capacity(pattern.len());
        for &b in pattern {
            match symbol_code(b) {
                Some(code) => codes.push(code),
                None => return Interval::invalid(),
            }
        }
        self.text.fm.backward_search(&codes)
    }

    /// Extend `interval` backward by one symbol
    pub fn update_interval(&self, interval: Interval, symbol: u8) -> Interval {
        match symbol_code(symbol) {
            Some(code) => self.text.fm.backward_ext(interval, code),
            None => Interval::invalid(),
        }
    }

    /// Symbol code of the BWT at `row`
    #[inline]
    pub fn bwt_code(&self, row: usize) -> u8 {
        self.text.fm.bwt[row]
    }

    /// Map an interval row back to its read and offset. Rows that start at a
    /// terminator have no occurrence.
    pub fn locate(&self, row: usize) -> Option<Occurrence> {
        let pos = self.text.suffix_array[row];
        let read_id = self
            .read_starts
            .partition_point(|&start| start <= pos)
            .checked_sub(1)?;
        let offset = pos - self.read_starts[read_id];
        if offset >= self.reads[read_id].len() {
            return None;
        }
        Some(Occurrence { read_id, offset })
    }

    /// Locate every row in `interval`
    pub fn occurrences(&self, interval: Interval) -> impl Iterator<Item = Occurrence> + 'a {
        let view = *self;
        interval.rows().filter_map(move |row| view.locate(row))
    }

    /// Reads starting at a row of `interval`, i.e. rows preceded by a terminator
    pub fn read_starts_in(&self, interval: Interval) -> impl Iterator<Item = usize> + 'a {
        let view = *self;
        interval
            .rows()
            .filter(move |&row| view.bwt_code(row) == SENTINEL_CODE)
            .filter_map(move |row| view.locate(row))
            .map(|occ| occ.read_id)
    }
}

/// FM-indexes over all reads plus the tables needed to locate matches
pub struct ReadIndex {
    forward: TextIndex,
    reversed: TextIndex,
    read_starts: Vec<usize>,
    reads: Vec<String>,
}

impl ReadIndex {
    /// Build the index over `reads`. Bases are upper-cased; any symbol outside
    /// A, C, G, T is rejected, as is an empty read.
    pub fn build<I, S>(reads: I) -> Result<Self, ClusterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        // The leading terminator lets read 0 be found at a read boundary too
        let mut text: Vec<u8> = vec![SENTINEL];
        let mut codes: Vec<u8> = vec![SENTINEL_CODE];
        let mut read_starts = Vec::new();
        let mut stored = Vec::new();

        for (read_id, read) in reads.into_iter().enumerate() {
            let read = read.as_ref();
            if read.is_empty() {
                return Err(ClusterError::EmptyRead { read: read_id });
            }
            read_starts.push(text.len());
            let mut sequence = String::with_capacity(read.len());

            for &b in read {
                let upper = b.to_ascii_uppercase();
                let code = match symbol_code(upper) {
                    Some(code) if upper != SENTINEL => code,
                    _ => {
                        return Err(ClusterError::InvalidSymbol {
                            read: read_id,
                            symbol: b as char,
                        });
                    }
                };
                text.push(upper);
                codes.push(code);
                sequence.push(upper as char);
            }

            text.push(SENTINEL);
            codes.push(SENTINEL_CODE);
            stored.push(sequence);
        }

        if stored.is_empty() {
            return Err(ClusterError::EmptyReadSet);
        }

        log::debug!(
            "Building suffix arrays for {} reads ({} symbols)",
            stored.len(),
            text.len()
        );

        // Reverse each read in place; terminators stay put
        let mut reversed_text = text.clone();
        let mut reversed_codes = codes.clone();
        for (&start, read) in read_starts.iter().zip(&stored) {
            let end = start + read.len();
            reversed_text[start..end].reverse();
            reversed_codes[start..end].reverse();
        }

        Ok(ReadIndex {
            forward: TextIndex::build(&text, &codes),
            reversed: TextIndex::build(&reversed_text, &reversed_codes),
            read_starts,
            reads: stored,
        })
    }

    /// Index over the reads as given
    pub fn forward(&self) -> StrandIndex<'_> {
        StrandIndex {
            text: &self.forward,
            read_starts: &self.read_starts,
            reads: &self.reads,
        }
    }

    /// Index over every read reversed (not complemented). Offsets it reports
    /// count from the end of the read.
    pub fn reversed(&self) -> StrandIndex<'_> {
        StrandIndex {
            text: &self.reversed,
            read_starts: &self.read_starts,
            reads: &self.reads,
        }
    }

    pub fn num_reads(&self) -> usize {
        self.reads.len()
    }

    pub fn read(&self, read_id: usize) -> &str {
        &self.reads[read_id]
    }

    pub fn reads(&self) -> &[String] {
        &self.reads
    }

    /// Size of the identity space addressed by canonical intervals (one slot
    /// per terminator). Marker sets are sized from this.
    pub fn num_identities(&self) -> usize {
        self.forward.fm.cumulative_count[SENTINEL_CODE as usize + 1] as usize
    }

    pub fn find_interval(&self, pattern: &[u8]) -> Interval {
        self.forward().find_interval(pattern)
    }

    pub fn update_interval(&self, interval: Interval, symbol: u8) -> Interval {
        self.forward().update_interval(interval, symbol)
    }

    /// Identity of a sequence anchored at a read boundary: the interval of
    /// `$sequence`. On a substring-free read set this is the whole read.
    /// The empty sequence has no identity.
    pub fn canonical_interval(&self, sequence: &[u8]) -> Interval {
        if sequence.is_empty() {
            return Interval::invalid();
        }
        self.update_interval(self.find_interval(sequence), SENTINEL)
    }

    pub fn bwt_code(&self, row: usize) -> u8 {
        self.forward().bwt_code(row)
    }

    pub fn locate(&self, row: usize) -> Option<Occurrence> {
        self.forward().locate(row)
    }

    pub fn occurrences(&self, interval: Interval) -> impl Iterator<Item = Occurrence> + '_ {
        self.forward().occurrences(interval)
    }

    /// True when a match of `len` symbols at `occ` spans its whole read
    pub fn is_whole_read(&self, occ: &Occurrence, len: usize) -> bool {
        occ.offset == 0 && self.reads[occ.read_id].len() == len
    }
}
