use super::state::{Coordinate, Direction, Grid};

/// One row (LEFT/RIGHT) or column (UP/DOWN) walked toward the motion's edge.
///
/// Step 0 is the cell farthest from the edge; the last step is the edge cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLine {
    direction: Direction,
    index: usize,
    len: usize,
}

impl ScanLine {
    /// Row index for horizontal motions, column index otherwise.
    #[inline]
    pub fn index(&self) -> usize { self.index }

    #[inline]
    pub fn len(&self) -> usize { self.len }

    #[inline]
    pub fn is_empty(&self) -> bool { self.len == 0 }

    #[inline]
    pub fn direction(&self) -> Direction { self.direction }

    /// Coordinate of the `step`-th cell in traversal order.
    pub fn at(&self, step: usize) -> Option<Coordinate> {
        if step >= self.len {
            return None;
        }
        let pos = if self.direction.is_forward() { step } else { self.len - 1 - step };
        Some(if self.direction.is_horizontal() {
            Coordinate::new(self.index, pos)
        } else {
            Coordinate::new(pos, self.index)
        })
    }

    /// All coordinates of the line in traversal order.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.len).filter_map(move |step| self.at(step))
    }
}

impl<S> Grid<S> {
    /// Scan lines for `direction`, in ascending line index.
    ///
    /// ```
    /// use grid_reconcile::grid::{Coordinate, Direction, Grid};
    /// let g = Grid::from_rows(vec![vec![1, 2, 3]]).unwrap();
    /// let line = g.scan_lines(Direction::Left).next().unwrap();
    /// let cells: Vec<_> = line.coordinates().collect();
    /// assert_eq!(cells, vec![Coordinate::new(0, 2), Coordinate::new(0, 1), Coordinate::new(0, 0)]);
    /// ```
    pub fn scan_lines(&self, direction: Direction) -> impl Iterator<Item = ScanLine> {
        let (count, len) = if direction.is_horizontal() {
            (self.row_count(), self.col_count())
        } else {
            (self.col_count(), self.row_count())
        };
        (0..count).map(move |index| ScanLine { direction, index, len })
    }
}
