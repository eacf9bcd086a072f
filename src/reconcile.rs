//! The reconciliation pass.
//!
//! Each scan line is walked toward the motion's edge. The first eligible cell
//! pairs with the nearest eligible cell after it that is not yet somebody's
//! destination; that partner is then consumed for the rest of the pass. This is
//! a greedy nearest-partner policy, not a globally optimal matching.
//!
//! Quick start:
//! ```
//! use grid_reconcile::grid::{Coordinate, Direction, Grid};
//! use grid_reconcile::reconcile;
//!
//! let grid = Grid::from_rows(vec![vec![2, 0, 2, 0]]).unwrap();
//! let events = reconcile::reconcile(&grid, Direction::Right, |v| *v != 0, |a, b| a + b).unwrap();
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].source, Coordinate::new(0, 0));
//! assert_eq!(events[0].destination, Coordinate::new(0, 2));
//! assert_eq!(events[0].result, 4);
//! ```

use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::grid::{Coordinate, Direction, Grid, GridError};
use crate::ids::{EventId, IdSource, UuidIds};

/// One merge discovered by a pass.
///
/// `operands` are in source-then-destination order; `result` is what the
/// merge function returned for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation<S> {
    pub id: EventId,
    pub direction: Direction,
    pub operands: (S, S),
    pub result: S,
    pub source: Coordinate,
    pub destination: Coordinate,
}

impl<S: PartialEq> Reconciliation<S> {
    /// Equal in every field except `id`.
    pub fn same_pairing(&self, other: &Self) -> bool {
        self.direction == other.direction
            && self.operands == other.operands
            && self.result == other.result
            && self.source == other.source
            && self.destination == other.destination
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ReconcileError<E = Infallible> {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("reconciliation callback failed: {0}")]
    Callback(#[source] E),
}

impl ReconcileError<Infallible> {
    pub fn into_grid_error(self) -> GridError {
        match self {
            ReconcileError::Grid(e) => e,
            ReconcileError::Callback(never) => match never {},
        }
    }
}

/// Runs passes with a chosen id source. Holds no other state.
#[derive(Debug, Clone, Default)]
pub struct Reconciler<I = UuidIds> {
    ids: I,
}

impl Reconciler<UuidIds> {
    pub fn new() -> Self {
        Reconciler { ids: UuidIds }
    }
}

impl<I: IdSource> Reconciler<I> {
    pub fn with_ids(ids: I) -> Self {
        Reconciler { ids }
    }

    pub fn ids(&self) -> &I {
        &self.ids
    }

    /// Run one pass with infallible callbacks.
    pub fn reconcile<S, P, M>(
        &self,
        grid: &Grid<S>,
        direction: Direction,
        mut is_eligible: P,
        mut merge: M,
    ) -> Result<Vec<Reconciliation<S>>, GridError>
    where
        S: Copy,
        P: FnMut(&S) -> bool,
        M: FnMut(S, S) -> S,
    {
        self.try_reconcile(
            grid,
            direction,
            |v| Ok::<_, Infallible>(is_eligible(v)),
            |a, b| Ok(merge(a, b)),
        )
        .map_err(ReconcileError::into_grid_error)
    }

    /// Validate raw rows, then run one pass.
    pub fn reconcile_rows<S, P, M>(
        &self,
        rows: &[Vec<S>],
        direction: Direction,
        is_eligible: P,
        merge: M,
    ) -> Result<Vec<Reconciliation<S>>, GridError>
    where
        S: Copy,
        P: FnMut(&S) -> bool,
        M: FnMut(S, S) -> S,
    {
        let grid = Grid::from_rows(rows.to_vec())?;
        self.reconcile(&grid, direction, is_eligible, merge)
    }

    /// Run one pass with fallible callbacks.
    ///
    /// The first callback error aborts the pass; no partial event list is
    /// returned.
    pub fn try_reconcile<S, E, P, M>(
        &self,
        grid: &Grid<S>,
        direction: Direction,
        mut is_eligible: P,
        mut merge: M,
    ) -> Result<Vec<Reconciliation<S>>, ReconcileError<E>>
    where
        S: Copy,
        P: FnMut(&S) -> Result<bool, E>,
        M: FnMut(S, S) -> Result<S, E>,
    {
        let mut events = Vec::new();
        let mut lines = 0usize;
        let mut cells: Vec<Coordinate> = Vec::new();
        let mut values: Vec<S> = Vec::new();
        let mut eligible: Vec<bool> = Vec::new();
        let mut consumed: Vec<bool> = Vec::new();

        for line in grid.scan_lines(direction) {
            lines += 1;
            cells.clear();
            values.clear();
            eligible.clear();
            consumed.clear();

            for at in line.coordinates() {
                let value = grid.value_at(at)?;
                eligible.push(is_eligible(&value).map_err(ReconcileError::Callback)?);
                cells.push(at);
                values.push(value);
            }
            consumed.resize(cells.len(), false);

            for step in 0..cells.len() {
                if !eligible[step] || consumed[step] {
                    continue;
                }
                let Some(partner) = (step + 1..cells.len()).find(|&k| eligible[k] && !consumed[k]) else {
                    // Nothing eligible remains further along this line.
                    break;
                };
                consumed[partner] = true;

                let (a, b) = (values[step], values[partner]);
                let result = merge(a, b).map_err(ReconcileError::Callback)?;
                let (source, destination) = (cells[step], cells[partner]);
                trace!(%direction, line = line.index(), %source, %destination, "paired cells");
                events.push(Reconciliation {
                    id: self.ids.next_id(),
                    direction,
                    operands: (a, b),
                    result,
                    source,
                    destination,
                });
            }
        }

        debug!(%direction, lines, events = events.len(), "reconciliation pass complete");
        Ok(events)
    }
}

/// Run one pass with uuid ids. See [`Reconciler::reconcile`].
pub fn reconcile<S, P, M>(
    grid: &Grid<S>,
    direction: Direction,
    is_eligible: P,
    merge: M,
) -> Result<Vec<Reconciliation<S>>, GridError>
where
    S: Copy,
    P: FnMut(&S) -> bool,
    M: FnMut(S, S) -> S,
{
    Reconciler::new().reconcile(grid, direction, is_eligible, merge)
}

/// Run one pass with fallible callbacks and uuid ids. See [`Reconciler::try_reconcile`].
pub fn try_reconcile<S, E, P, M>(
    grid: &Grid<S>,
    direction: Direction,
    is_eligible: P,
    merge: M,
) -> Result<Vec<Reconciliation<S>>, ReconcileError<E>>
where
    S: Copy,
    P: FnMut(&S) -> Result<bool, E>,
    M: FnMut(S, S) -> Result<S, E>,
{
    Reconciler::new().try_reconcile(grid, direction, is_eligible, merge)
}

/// Validate raw rows and run one pass with uuid ids.
///
/// ```
/// use grid_reconcile::grid::{Direction, GridError};
/// use grid_reconcile::reconcile::reconcile_rows;
/// let err = reconcile_rows(&[vec![2, 2], vec![2]], Direction::Left, |v| *v != 0, |a, b| a + b).unwrap_err();
/// assert!(matches!(err, GridError::InvalidShape { row: 1, .. }));
/// ```
pub fn reconcile_rows<S, P, M>(
    rows: &[Vec<S>],
    direction: Direction,
    is_eligible: P,
    merge: M,
) -> Result<Vec<Reconciliation<S>>, GridError>
where
    S: Copy,
    P: FnMut(&S) -> bool,
    M: FnMut(S, S) -> S,
{
    Reconciler::new().reconcile_rows(rows, direction, is_eligible, merge)
}
