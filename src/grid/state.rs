use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A motion: picks the scan axis and the edge cells travel toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four motions, in canonical order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// True for motions that scan rows (LEFT/RIGHT).
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// True when traversal runs toward increasing indices (RIGHT/DOWN).
    #[inline]
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Right | Direction::Down)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown direction {0:?} (expected up, down, left or right)")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// Zero-based `(row, col)` position in a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: usize,
    pub col: usize,
}

impl Coordinate {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Coordinate { row, col }
    }
}

impl From<(usize, usize)> for Coordinate {
    fn from((row, col): (usize, usize)) -> Self {
        Coordinate { row, col }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("row {row} has {found} cells, expected {expected}")]
    InvalidShape { row: usize, expected: usize, found: usize },
    #[error("coordinate ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfRange { row: usize, col: usize, rows: usize, cols: usize },
}

/// Rectangular matrix of cells, stored row-major.
///
/// Construction validates the shape; after that every row has `col_count()`
/// cells. A grid with zero rows is valid and simply has nothing to reconcile.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Grid<S> {
    rows: usize,
    cols: usize,
    cells: Vec<S>,
}

impl<S> Grid<S> {
    /// Build a grid from nested rows, rejecting ragged input.
    ///
    /// ```
    /// use grid_reconcile::grid::{Grid, GridError};
    /// let g = Grid::from_rows(vec![vec![2, 0], vec![0, 2]]).unwrap();
    /// assert_eq!((g.row_count(), g.col_count()), (2, 2));
    /// let err = Grid::from_rows(vec![vec![2, 0], vec![2]]).unwrap_err();
    /// assert_eq!(err, GridError::InvalidShape { row: 1, expected: 2, found: 1 });
    /// ```
    pub fn from_rows(rows: Vec<Vec<S>>) -> Result<Self, GridError> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((row, found)) = rows.iter().map(Vec::len).enumerate().find(|&(_, len)| len != cols) {
            return Err(GridError::InvalidShape { row, expected: cols, found });
        }
        let row_count = rows.len();
        let cells: Vec<S> = rows.into_iter().flatten().collect();
        Ok(Grid { rows: row_count, cols, cells })
    }

    /// A grid with no rows.
    pub fn empty() -> Self {
        Grid { rows: 0, cols: 0, cells: Vec::new() }
    }

    #[inline]
    pub fn row_count(&self) -> usize { self.rows }

    #[inline]
    pub fn col_count(&self) -> usize { self.cols }

    /// True if the grid holds no cells at all.
    #[inline]
    pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    #[inline]
    fn offset(&self, at: Coordinate) -> Option<usize> {
        (at.row < self.rows && at.col < self.cols).then(|| at.row * self.cols + at.col)
    }

    fn out_of_range(&self, at: Coordinate) -> GridError {
        GridError::OutOfRange { row: at.row, col: at.col, rows: self.rows, cols: self.cols }
    }

    /// Borrow the cell at `at`, or `None` when out of bounds.
    pub fn get(&self, at: Coordinate) -> Option<&S> {
        self.offset(at).map(|idx| &self.cells[idx])
    }

    /// Replace the cell at `at`.
    pub fn set(&mut self, at: Coordinate, value: S) -> Result<(), GridError> {
        let idx = self.offset(at).ok_or_else(|| self.out_of_range(at))?;
        self.cells[idx] = value;
        Ok(())
    }

    pub fn row(&self, idx: usize) -> Option<&[S]> {
        (idx < self.rows).then(|| &self.cells[idx * self.cols..(idx + 1) * self.cols])
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[S]> + '_ {
        (0..self.rows).map(move |r| &self.cells[r * self.cols..(r + 1) * self.cols])
    }

    pub fn map<T, F: FnMut(&S) -> T>(&self, f: F) -> Grid<T> {
        Grid { rows: self.rows, cols: self.cols, cells: self.cells.iter().map(f).collect() }
    }
}

impl<S: Copy> Grid<S> {
    /// Copy the cell at `at`, failing with `OutOfRange` when out of bounds.
    pub fn value_at(&self, at: Coordinate) -> Result<S, GridError> {
        self.get(at).copied().ok_or_else(|| self.out_of_range(at))
    }
}

impl<S: Clone> Grid<S> {
    pub fn to_rows(&self) -> Vec<Vec<S>> {
        self.rows().map(<[S]>::to_vec).collect()
    }

    /// Copy with every row reversed (mirror across the vertical axis).
    pub fn mirrored(&self) -> Self {
        let cells = self.rows().flat_map(|r| r.iter().rev().cloned()).collect();
        Grid { rows: self.rows, cols: self.cols, cells }
    }

    /// Copy with rows and columns swapped.
    pub fn transposed(&self) -> Self {
        let mut cells = Vec::with_capacity(self.cells.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                cells.push(self.cells[r * self.cols + c].clone());
            }
        }
        Grid { rows: self.cols, cols: self.rows, cells }
    }
}

impl<S> Default for Grid<S> {
    fn default() -> Self { Grid::empty() }
}

impl<S> TryFrom<Vec<Vec<S>>> for Grid<S> {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<S>>) -> Result<Self, Self::Error> {
        Grid::from_rows(rows)
    }
}

impl<S: fmt::Debug> fmt::Debug for Grid<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

impl<S: fmt::Display> fmt::Display for Grid<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.cells.iter().map(ToString::to_string).collect();
        let width = rendered.iter().map(String::len).max().unwrap_or(0);
        for r in 0..self.rows {
            let line: Vec<String> = rendered[r * self.cols..(r + 1) * self.cols]
                .iter()
                .map(|v| format!("{v:>width$}"))
                .collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}
