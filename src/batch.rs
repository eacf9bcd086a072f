//! Parallel reconciliation of independent grids.
//!
//! Passes share nothing, so a slice of grids can be reconciled on the rayon
//! pool without coordination. Output order matches input order.

use rayon::prelude::*;
use tracing::debug;

use crate::grid::{Direction, Grid, GridError};
use crate::ids::IdSource;
use crate::reconcile::{Reconciler, Reconciliation};

/// Reconcile every grid in `direction`; one event list per grid.
///
/// ```
/// use grid_reconcile::batch::reconcile_all;
/// use grid_reconcile::grid::{Direction, Grid};
/// use grid_reconcile::ids::UuidIds;
///
/// let grids = vec![
///     Grid::from_rows(vec![vec![2, 2]]).unwrap(),
///     Grid::from_rows(vec![vec![2, 4]]).unwrap(),
/// ];
/// let out = reconcile_all(&grids, Direction::Left, &UuidIds, |v| *v != 0, |a, b| a + b).unwrap();
/// assert_eq!(out[0][0].result, 4);
/// assert_eq!(out[1][0].result, 6);
/// ```
pub fn reconcile_all<S, I, P, M>(
    grids: &[Grid<S>],
    direction: Direction,
    ids: &I,
    is_eligible: P,
    merge: M,
) -> Result<Vec<Vec<Reconciliation<S>>>, GridError>
where
    S: Copy + Send + Sync,
    I: IdSource + ?Sized,
    P: Fn(&S) -> bool + Sync,
    M: Fn(S, S) -> S + Sync,
{
    let reconciler = Reconciler::with_ids(ids);
    let out: Vec<Vec<Reconciliation<S>>> = grids
        .par_iter()
        .map(|grid| reconciler.reconcile(grid, direction, &is_eligible, &merge))
        .collect::<Result<_, _>>()?;
    debug!(%direction, grids = grids.len(), "batch reconciliation complete");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::reconcile::reconcile;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::collections::HashSet;

    fn corpus(n: usize) -> Vec<Grid<i64>> {
        let mut rng = StdRng::seed_from_u64(7);
        (0..n)
            .map(|_| {
                let rows = (0..4).map(|_| (0..4).map(|_| [0, 2, 4][rng.gen_range(0..3)]).collect()).collect();
                Grid::from_rows(rows).unwrap()
            })
            .collect()
    }

    #[test]
    fn matches_sequential_passes_in_order() {
        let grids = corpus(64);
        let ids = SequentialIds::default();
        for dir in Direction::ALL {
            let par = reconcile_all(&grids, dir, &ids, |v| *v != 0, |a, b| a + b).unwrap();
            assert_eq!(par.len(), grids.len());
            for (g, events) in grids.iter().zip(&par) {
                let seq = reconcile(g, dir, |v| *v != 0, |a, b| a + b).unwrap();
                assert_eq!(seq.len(), events.len());
                assert!(seq.iter().zip(events).all(|(a, b)| a.same_pairing(b)));
            }
        }
    }

    #[test]
    fn ids_stay_unique_across_threads() {
        let grids = corpus(128);
        let ids = SequentialIds::default();
        let out = reconcile_all(&grids, Direction::Right, &ids, |v| *v != 0, |a, b| a + b).unwrap();
        let all: Vec<_> = out.iter().flatten().map(|e| e.id.clone()).collect();
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        assert_eq!(ids.issued() as usize, all.len());
    }

    #[test]
    fn empty_input_is_empty_output() {
        let grids: Vec<Grid<i64>> = Vec::new();
        let out = reconcile_all(&grids, Direction::Up, &SequentialIds::default(), |v| *v != 0, |a, b| a + b).unwrap();
        assert!(out.is_empty());
    }
}
