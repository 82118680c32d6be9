//! Value ranges used to render the ordered cells of one attribute.

use std::{cmp::Ordering, ops::Bound};

/// A value range with owned bounds.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct KeyRange<K> {
    /// Start bound (inclusive/exclusive/unbounded).
    pub(crate) start: Bound<K>,
    /// End bound (inclusive/exclusive/unbounded).
    pub(crate) end: Bound<K>,
}

impl<K> KeyRange<K> {
    pub(crate) fn new(start: Bound<K>, end: Bound<K>) -> Self {
        Self { start, end }
    }

    /// The range `[value, value]`.
    pub(crate) fn point(value: K) -> Self
    where
        K: Clone,
    {
        Self::new(Bound::Included(value.clone()), Bound::Included(value))
    }
}

impl<K: Ord> KeyRange<K> {
    /// The single value of a `[v, v]` range.
    pub(crate) fn as_point(&self) -> Option<&K> {
        match (&self.start, &self.end) {
            (Bound::Included(start), Bound::Included(end)) if start == end => Some(start),
            _ => None,
        }
    }
}

/// A normalized set of disjoint, sorted value ranges.
#[derive(Clone, Debug, PartialEq, Default)]
pub(crate) struct RangeSet<K> {
    ranges: Vec<KeyRange<K>>,
}

impl<K: Ord> RangeSet<K> {
    /// Construct from raw ranges and normalize (sort + merge overlaps/adjacents).
    pub(crate) fn from_ranges(mut ranges: Vec<KeyRange<K>>) -> Self {
        ranges.sort_by(|a, b| cmp_lower(&a.start, &b.start));
        let mut out: Vec<KeyRange<K>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match out.last_mut() {
                Some(last) if overlaps_or_adjacent(&last.end, &range.start) => {
                    last.end =
                        max_upper_owned(std::mem::replace(&mut last.end, Bound::Unbounded), range.end);
                }
                _ => out.push(range),
            }
        }
        Self { ranges: out }
    }

    pub(crate) fn into_ranges(self) -> Vec<KeyRange<K>> {
        self.ranges
    }
}

// Lower-bound comparator: Included(x) < Excluded(x) < Included(y) if x<y
fn cmp_lower<K: Ord>(a: &Bound<K>, b: &Bound<K>) -> Ordering {
    use Bound as B;
    match (a, b) {
        (B::Unbounded, B::Unbounded) => Ordering::Equal,
        (B::Unbounded, _) => Ordering::Less,
        (_, B::Unbounded) => Ordering::Greater,
        (B::Included(x), B::Included(y)) | (B::Excluded(x), B::Excluded(y)) => x.cmp(y),
        (B::Included(x), B::Excluded(y)) => x.cmp(y).then(Ordering::Less),
        (B::Excluded(x), B::Included(y)) => x.cmp(y).then(Ordering::Greater),
    }
}

// Whether two ranges touch at the boundary (end meets start) or overlap.
// `(.., x)` followed by `(x, ..)` leaves `x` out, so it is not adjacent.
fn overlaps_or_adjacent<K: Ord>(end: &Bound<K>, start: &Bound<K>) -> bool {
    use Bound as B;
    match (end, start) {
        (B::Unbounded, _) | (_, B::Unbounded) => true,
        (B::Included(x), B::Included(y))
        | (B::Included(x), B::Excluded(y))
        | (B::Excluded(x), B::Included(y)) => x >= y,
        (B::Excluded(x), B::Excluded(y)) => x > y,
    }
}

fn max_upper_owned<K: Ord>(a: Bound<K>, b: Bound<K>) -> Bound<K> {
    use Bound as B;
    match (a, b) {
        (B::Unbounded, _) | (_, B::Unbounded) => B::Unbounded,
        (B::Included(x), B::Included(y)) => B::Included(x.max(y)),
        (B::Excluded(x), B::Excluded(y)) => B::Excluded(x.max(y)),
        (B::Included(x), B::Excluded(y)) => {
            if y > x {
                B::Excluded(y)
            } else {
                B::Included(x)
            }
        }
        (B::Excluded(x), B::Included(y)) => {
            if x > y {
                B::Excluded(x)
            } else {
                B::Included(y)
            }
        }
    }
}
