//! Cell sets built on top of roaring bitmaps.
//!
//! Every variable of a cover ranges over a small, dense set of cells; a cube
//! stores one `CellSet` per variable.

use std::ops::Range;

use roaring::RoaringBitmap;

/// Index of a cell within one variable's domain.
pub(crate) type Cell = u32;

/// Subset of a variable's cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct CellSet {
    bitmap: RoaringBitmap,
}

impl CellSet {
    /// Set holding every cell in `cells`.
    pub(crate) fn from_range(cells: Range<Cell>) -> Self {
        let mut bitmap = RoaringBitmap::new();
        bitmap.insert_range(cells);
        Self { bitmap }
    }

    pub(crate) fn single(cell: Cell) -> Self {
        let mut set = Self::default();
        set.insert(cell);
        set
    }

    pub(crate) fn insert(&mut self, cell: Cell) {
        self.bitmap.insert(cell);
    }

    pub(crate) fn contains(&self, cell: Cell) -> bool {
        self.bitmap.contains(cell)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    pub(crate) fn is_subset(&self, other: &Self) -> bool {
        self.bitmap.is_subset(&other.bitmap)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.bitmap.iter()
    }

    pub(crate) fn intersect(&self, other: &Self) -> Self {
        Self {
            bitmap: &self.bitmap & &other.bitmap,
        }
    }

    pub(crate) fn union(&self, other: &Self) -> Self {
        Self {
            bitmap: &self.bitmap | &other.bitmap,
        }
    }

    /// Relative complement (`self \ other`).
    pub(crate) fn difference(&self, other: &Self) -> Self {
        Self {
            bitmap: &self.bitmap - &other.bitmap,
        }
    }
}

impl FromIterator<Cell> for CellSet {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Self {
            bitmap: iter.into_iter().collect(),
        }
    }
}
