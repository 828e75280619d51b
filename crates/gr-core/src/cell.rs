//! Grid coordinate type.
//!
//! A `Cell` is a `(row, col)` position on the discretized map.  Its textual
//! form is `"row_col"` (e.g. `"14_3"`), which is also the node identity used
//! by graph documents produced from segmented map images.

use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// A `(row, col)` grid coordinate.
///
/// Signed so that neighbor arithmetic at the map border never wraps; bounds
/// checks happen where the grid size is known.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    #[inline]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// |Δrow| + |Δcol|.
    #[inline]
    pub fn manhattan(self, other: Cell) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Straight-line distance.
    #[inline]
    pub fn euclidean(self, other: Cell) -> f64 {
        let dr = f64::from(self.row) - f64::from(other.row);
        let dc = f64::from(self.col) - f64::from(other.col);
        dr.hypot(dc)
    }

    /// The four orthogonal neighbors in N, S, W, E order.  May lie outside
    /// any particular grid.
    #[inline]
    pub fn neighbors4(self) -> [Cell; 4] {
        [
            Cell::new(self.row - 1, self.col),
            Cell::new(self.row + 1, self.col),
            Cell::new(self.row, self.col - 1),
            Cell::new(self.row, self.col + 1),
        ]
    }

    /// `true` when the two cells share an edge.
    #[inline]
    pub fn is_adjacent(self, other: Cell) -> bool {
        self.manhattan(other) == 1
    }

    /// `true` if the cell lies in `[0, rows) × [0, cols)`.
    #[inline]
    pub fn in_bounds(self, rows: u32, cols: u32) -> bool {
        self.row >= 0 && self.col >= 0 && (self.row as u32) < rows && (self.col as u32) < cols
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.row, self.col)
    }
}

impl FromStr for Cell {
    type Err = CoreError;

    /// Parse the `"row_col"` label form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (r, c) = s
            .trim()
            .split_once('_')
            .ok_or_else(|| CoreError::Parse(format!("cell label {s:?} is not \"row_col\"")))?;
        let row = r
            .parse::<i32>()
            .map_err(|e| CoreError::Parse(format!("cell label {s:?}: bad row: {e}")))?;
        let col = c
            .parse::<i32>()
            .map_err(|e| CoreError::Parse(format!("cell label {s:?}: bad col: {e}")))?;
        Ok(Cell { row, col })
    }
}

impl From<(i32, i32)> for Cell {
    #[inline]
    fn from((row, col): (i32, i32)) -> Self {
        Cell { row, col }
    }
}
