//! Host-side helpers for applying a pass.
//!
//! The reconciler never touches its input. A host that wants 2048-style
//! movement applies the events (source cleared, destination replaced by the
//! result) and then compacts every line toward the motion's edge before the
//! next pass.

use tracing::debug;

use crate::grid::{Direction, Grid, GridError};
use crate::reconcile::Reconciliation;

/// Apply `events` in order, then compact toward `direction`'s edge.
///
/// ```
/// use grid_reconcile::apply::apply;
/// use grid_reconcile::grid::{Direction, Grid};
/// use grid_reconcile::reconcile::reconcile;
///
/// let g = Grid::from_rows(vec![vec![2, 0, 2, 0]]).unwrap();
/// let events = reconcile(&g, Direction::Right, |v| *v != 0, |a, b| a + b).unwrap();
/// let next = apply(&g, Direction::Right, &events, 0).unwrap();
/// assert_eq!(next.to_rows(), vec![vec![0, 0, 0, 4]]);
/// ```
pub fn apply<S>(
    grid: &Grid<S>,
    direction: Direction,
    events: &[Reconciliation<S>],
    vacant: S,
) -> Result<Grid<S>, GridError>
where
    S: Copy + PartialEq,
{
    let mut next = grid.clone();
    for event in events {
        next.set(event.source, vacant)?;
        next.set(event.destination, event.result)?;
    }
    debug!(%direction, applied = events.len(), "applied reconciliations");
    compact(&next, direction, vacant)
}

/// Slide every non-vacant cell toward `direction`'s edge, keeping order.
pub fn compact<S>(grid: &Grid<S>, direction: Direction, vacant: S) -> Result<Grid<S>, GridError>
where
    S: Copy + PartialEq,
{
    let mut next = grid.clone();
    let mut kept: Vec<S> = Vec::with_capacity(grid.row_count().max(grid.col_count()));
    for line in grid.scan_lines(direction) {
        kept.clear();
        for at in line.coordinates() {
            let value = grid.value_at(at)?;
            if value != vacant {
                kept.push(value);
            }
        }
        let gap = line.len() - kept.len();
        for (step, at) in line.coordinates().enumerate() {
            let value = if step < gap { vacant } else { kept[step - gap] };
            next.set(at, value)?;
        }
    }
    Ok(next)
}
