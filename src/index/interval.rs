use std::fmt;

/// A closed range `[lower, upper]` of rows in the BWT.
///
/// An interval is invalid when `upper < lower`. Ordering is lexicographic on
/// `(lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub lower: i64,
    pub upper: i64,
}

impl Interval {
    pub const fn new(lower: i64, upper: i64) -> Self {
        Interval { lower, upper }
    }

    /// The normalized invalid interval `{0, -1}`.
    pub const fn invalid() -> Self {
        Interval {
            lower: 0,
            upper: -1,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.upper >= self.lower
    }

    /// Number of rows covered (0 for an invalid interval).
    #[inline]
    pub fn size(&self) -> usize {
        if self.is_valid() {
            (self.upper - self.lower + 1) as usize
        } else {
            0
        }
    }

    /// Iterate over the rows covered by this interval.
    pub fn rows(&self) -> impl Iterator<Item = usize> {
        let (start, end) = if self.is_valid() {
            (self.lower as usize, self.upper as usize + 1)
        } else {
            (0, 0)
        };
        start..end
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::invalid()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}
