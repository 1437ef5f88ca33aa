// Overlap engine
//
// The clustering core only talks to the index through the `OverlapEngine`
// trait. `FmOverlapper` answers the queries with exact-match overlaps found
// by backward search over a `ReadIndex`, in both read orientations.

use crate::index::read_index::StrandIndex;
use crate::index::{Interval, ReadIndex, SENTINEL};
use crate::utils::{reverse_complement, reverse_complement_str};
use std::collections::BTreeMap;

/// Outcome of a containment query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateResult {
    /// The sequence occurs inside some indexed read without being that whole read
    pub is_substring: bool,
}

/// Side of the query on which the overlapping read continues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExtensionSide {
    Left,
    Right,
}

/// One overlapping read, described relative to the query it was found from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapBlock {
    canonical_interval: Interval,
    overlap_len: usize,
    is_target_reverse: bool,
    side: ExtensionSide,
    extension: String,
}

impl OverlapBlock {
    pub fn new(
        canonical_interval: Interval,
        overlap_len: usize,
        is_target_reverse: bool,
        side: ExtensionSide,
        extension: String,
    ) -> Self {
        OverlapBlock {
            canonical_interval,
            overlap_len,
            is_target_reverse,
            side,
            extension,
        }
    }

    /// Orientation-independent identity of the overlapping read
    pub fn canonical_interval(&self) -> Interval {
        self.canonical_interval
    }

    pub fn overlap_len(&self) -> usize {
        self.overlap_len
    }

    /// True when the target matched the reverse complement of the query's strand
    pub fn is_target_reverse(&self) -> bool {
        self.is_target_reverse
    }

    pub fn side(&self) -> ExtensionSide {
        self.side
    }

    /// Materialize the overlapping read in the frame of `base` (the query).
    pub fn full_string(&self, base: &str) -> String {
        let overlap_len = self.overlap_len.min(base.len());
        match self.side {
            ExtensionSide::Right => {
                let mut full = String::with_capacity(overlap_len + self.extension.len());
                full.push_str(&base[base.len() - overlap_len..]);
                full.push_str(&self.extension);
                full
            }
            ExtensionSide::Left => {
                let mut full = String::with_capacity(overlap_len + self.extension.len());
                full.push_str(&self.extension);
                full.push_str(&base[..overlap_len]);
                full
            }
        }
    }
}

/// Queries the clustering core needs from the index
pub trait OverlapEngine {
    /// Is `sequence` (or its reverse complement) contained in another read?
    fn align_read_duplicate(&self, sequence: &str) -> DuplicateResult;

    /// All reads overlapping `sequence` by at least `min_overlap` bases
    fn overlap_read(&self, sequence: &str, min_overlap: usize) -> Vec<OverlapBlock>;

    /// Interval of index rows prefixed by `sequence`
    fn find_interval(&self, sequence: &str) -> Interval;

    /// Narrow `interval` by one more matched symbol
    fn update_interval(&self, interval: Interval, symbol: u8) -> Interval;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitKind {
    // suffix(query strand) == prefix(read)
    ReadPrefix,
    // prefix(query strand) == suffix(read)
    ReadSuffix,
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    overlap_len: usize,
    kind: HitKind,
}

/// Overlap engine backed by an in-memory FM-index of the reads
pub struct FmOverlapper {
    index: ReadIndex,
}

impl FmOverlapper {
    pub fn new(index: ReadIndex) -> Self {
        FmOverlapper { index }
    }

    pub fn index(&self) -> &ReadIndex {
        &self.index
    }

    /// Reads whose prefix equals a proper suffix of `strand`.
    ///
    /// Backward search in the forward index grows the suffix one symbol at a
    /// time from the end of `strand`.
    fn collect_prefix_hits(
        &self,
        strand: &[u8],
        is_rc: bool,
        min_overlap: usize,
        hits: &mut BTreeMap<(usize, bool), Hit>,
    ) {
        let forward = self.index.forward();
        let suffixes = (1..strand.len()).rev().map(|i| strand[i]);
        self.collect_boundary_hits(forward, suffixes, is_rc, min_overlap, HitKind::ReadPrefix, hits);
    }

    /// Reads whose suffix equals a proper prefix of `strand`.
    ///
    /// The reversed index turns "read ends with P" into "reversed read
    /// starts with rev(P)", so the prefix grows one symbol at a time too.
    fn collect_suffix_hits(
        &self,
        strand: &[u8],
        is_rc: bool,
        min_overlap: usize,
        hits: &mut BTreeMap<(usize, bool), Hit>,
    ) {
        let reversed = self.index.reversed();
        let prefixes = strand[..strand.len().saturating_sub(1)].iter().copied();
        self.collect_boundary_hits(reversed, prefixes, is_rc, min_overlap, HitKind::ReadSuffix, hits);
    }

    /// Extend one interval by `symbols` and, at every length of at least
    /// `min_overlap`, record the reads whose boundary the match touches.
    fn collect_boundary_hits<I>(
        &self,
        view: StrandIndex<'_>,
        symbols: I,
        is_rc: bool,
        min_overlap: usize,
        kind: HitKind,
        hits: &mut BTreeMap<(usize, bool), Hit>,
    ) where
        I: Iterator<Item = u8>,
    {
        let mut interval = view.find_interval(&[]);
        for (i, symbol) in symbols.enumerate() {
            interval = view.update_interval(interval, symbol);
            if !interval.is_valid() {
                break;
            }

            let overlap_len = i + 1;
            if overlap_len < min_overlap {
                continue;
            }

            // Skip the row scan when no match sits at a read boundary
            if !view.update_interval(interval, SENTINEL).is_valid() {
                continue;
            }

            for read_id in view.read_starts_in(interval) {
                // A read no longer than the overlap is contained in the query
                if self.index.read(read_id).len() <= overlap_len {
                    continue;
                }
                record_hit(hits, read_id, is_rc, overlap_len, kind);
            }
        }
    }

    fn make_block(&self, read_id: usize, is_rc: bool, hit: Hit) -> OverlapBlock {
        let read = self.index.read(read_id);
        let canonical_interval = self.index.canonical_interval(read.as_bytes());

        let (raw_extension, side) = match (hit.kind, is_rc) {
            (HitKind::ReadPrefix, false) => (&read[hit.overlap_len..], ExtensionSide::Right),
            (HitKind::ReadPrefix, true) => (&read[hit.overlap_len..], ExtensionSide::Left),
            (HitKind::ReadSuffix, false) => {
                (&read[..read.len() - hit.overlap_len], ExtensionSide::Left)
            }
            (HitKind::ReadSuffix, true) => {
                (&read[..read.len() - hit.overlap_len], ExtensionSide::Right)
            }
        };

        let extension = if is_rc {
            reverse_complement_str(raw_extension)
        } else {
            raw_extension.to_string()
        };

        OverlapBlock::new(canonical_interval, hit.overlap_len, is_rc, side, extension)
    }
}

fn record_hit(
    hits: &mut BTreeMap<(usize, bool), Hit>,
    read_id: usize,
    is_rc: bool,
    overlap_len: usize,
    kind: HitKind,
) {
    let hit = Hit { overlap_len, kind };
    hits.entry((read_id, is_rc))
        .and_modify(|existing| {
            if overlap_len > existing.overlap_len {
                *existing = hit;
            }
        })
        .or_insert(hit);
}

impl OverlapEngine for FmOverlapper {
    fn align_read_duplicate(&self, sequence: &str) -> DuplicateResult {
        let query = sequence.as_bytes().to_ascii_uppercase();
        // The empty sequence occurs inside every read
        if query.is_empty() {
            return DuplicateResult { is_substring: true };
        }
        let query_rc = reverse_complement(&query);

        let is_substring = [&query, &query_rc].into_iter().any(|strand| {
            let interval = self.index.find_interval(strand);
            self.index
                .occurrences(interval)
                .any(|occ| !self.index.is_whole_read(&occ, strand.len()))
        });

        DuplicateResult { is_substring }
    }

    fn overlap_read(&self, sequence: &str, min_overlap: usize) -> Vec<OverlapBlock> {
        let query = sequence.as_bytes().to_ascii_uppercase();
        let query_rc = reverse_complement(&query);
        let min_overlap = min_overlap.max(1);

        // (read, matched on reverse strand) -> longest overlap
        let mut hits: BTreeMap<(usize, bool), Hit> = BTreeMap::new();
        for (strand, is_rc) in [(&query, false), (&query_rc, true)] {
            self.collect_prefix_hits(strand, is_rc, min_overlap, &mut hits);
            self.collect_suffix_hits(strand, is_rc, min_overlap, &mut hits);
        }

        let blocks: Vec<OverlapBlock> = hits
            .into_iter()
            .filter(|&((read_id, _), _)| {
                let read = self.index.read(read_id).as_bytes();
                read != query.as_slice() && read != query_rc.as_slice()
            })
            .map(|((read_id, is_rc), hit)| self.make_block(read_id, is_rc, hit))
            .collect();

        log::trace!(
            "overlap_read: {} blocks >= {}bp for {}bp query",
            blocks.len(),
            min_overlap,
            query.len()
        );
        blocks
    }

    fn find_interval(&self, sequence: &str) -> Interval {
        self.index.find_interval(sequence.as_bytes())
    }

    fn update_interval(&self, interval: Interval, symbol: u8) -> Interval {
        self.index.update_interval(interval, symbol)
    }
}
