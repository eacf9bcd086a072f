//! `ReconcilingGrid`: holds grid data plus the host's rules and turns key
//! presses into reconciliation batches.
//!
//! The grid keeps no state besides what the host gives it. Every motion
//! recomputes from the current data, and the resulting events are handed to
//! `on_reconciliation` in one call, even when the batch is empty. Applying the
//! batch is up to the host, which then calls [`ReconcilingGrid::set_data`].
//! When key events arrive through [`ReconcilingGrid::attach`], no borrow of the
//! grid is held while the callback runs, so the callback may do that itself.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use grid_reconcile::config::GridConfig;
//! use grid_reconcile::grid::Grid;
//! use grid_reconcile::input::KeyPhase;
//! use grid_reconcile::listener::KeyDispatcher;
//! use grid_reconcile::widget::ReconcilingGrid;
//!
//! let batches = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&batches);
//! let widget = ReconcilingGrid::new(
//!     Grid::from_rows(vec![vec![2, 0, 2, 0]]).unwrap(),
//!     GridConfig::default(),
//!     |v: &i64| *v != 0,
//!     |a, b| a + b,
//!     move |events| sink.borrow_mut().push(events.to_vec()),
//! );
//! let widget = Rc::new(RefCell::new(widget));
//!
//! let dispatcher = KeyDispatcher::new();
//! let _sub = ReconcilingGrid::attach(&widget, &dispatcher);
//! dispatcher.dispatch(KeyPhase::KeyDown, "ArrowRight");
//! assert_eq!(batches.borrow().len(), 1);
//! assert_eq!(batches.borrow()[0][0].result, 4);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::GridConfig;
use crate::grid::{Direction, Grid, GridError};
use crate::ids::{IdSource, UuidIds};
use crate::listener::{KeyDispatcher, Subscription};
use crate::reconcile::{Reconciler, Reconciliation};

type Eligibility<S> = Box<dyn Fn(&S) -> bool>;
type Merge<S> = Box<dyn Fn(S, S) -> S>;
type BatchCallback<S> = Rc<RefCell<dyn FnMut(&[Reconciliation<S>])>>;

pub struct ReconcilingGrid<S> {
    data: Grid<S>,
    config: GridConfig,
    is_eligible: Eligibility<S>,
    merge: Merge<S>,
    on_reconciliation: BatchCallback<S>,
    reconciler: Reconciler<Box<dyn IdSource>>,
}

impl<S: Copy + 'static> ReconcilingGrid<S> {
    pub fn new<P, M, C>(data: Grid<S>, config: GridConfig, is_eligible: P, merge: M, on_reconciliation: C) -> Self
    where
        P: Fn(&S) -> bool + 'static,
        M: Fn(S, S) -> S + 'static,
        C: FnMut(&[Reconciliation<S>]) + 'static,
    {
        let ids: Box<dyn IdSource> = Box::new(UuidIds);
        let on_reconciliation: BatchCallback<S> = Rc::new(RefCell::new(on_reconciliation));
        ReconcilingGrid {
            data,
            config,
            is_eligible: Box::new(is_eligible),
            merge: Box::new(merge),
            on_reconciliation,
            reconciler: Reconciler::with_ids(ids),
        }
    }

    /// Replace the id source (uuid by default).
    pub fn with_ids<I: IdSource + 'static>(mut self, ids: I) -> Self {
        let ids: Box<dyn IdSource> = Box::new(ids);
        self.reconciler = Reconciler::with_ids(ids);
        self
    }

    pub fn data(&self) -> &Grid<S> {
        &self.data
    }

    pub fn set_data(&mut self, data: Grid<S>) {
        self.data = data;
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Run one pass in `direction` and deliver the batch. Returns its length.
    pub fn motion(&mut self, direction: Direction) -> Result<usize, GridError> {
        let events = self.pass(direction)?;
        deliver(&self.on_reconciliation, &events);
        Ok(events.len())
    }

    /// Map `key` through the key bindings and run the bound motion.
    ///
    /// Unbound keys are ignored and return `Ok(None)`.
    pub fn handle_key(&mut self, key: &str) -> Result<Option<usize>, GridError> {
        match self.bound_direction(key) {
            Some(direction) => self.motion(direction).map(Some),
            None => Ok(None),
        }
    }

    fn bound_direction(&self, key: &str) -> Option<Direction> {
        let direction = self.config.keys.direction_for(key)?;
        debug!(key, %direction, "key mapped to motion");
        Some(direction)
    }

    fn pass(&self, direction: Direction) -> Result<Vec<Reconciliation<S>>, GridError> {
        let is_eligible = &self.is_eligible;
        let merge = &self.merge;
        self.reconciler.reconcile(&self.data, direction, |v| is_eligible(v), |a, b| merge(a, b))
    }

    /// Listen on `dispatcher` for the configured key phase.
    ///
    /// The subscription holds only a weak reference to the grid; dropping it
    /// (or the grid) ends the listening.
    pub fn attach(this: &Rc<RefCell<Self>>, dispatcher: &KeyDispatcher) -> Subscription {
        let phase = this.borrow().config.key_event;
        let weak = Rc::downgrade(this);
        dispatcher.subscribe(phase, move |key| {
            let Some(grid) = weak.upgrade() else {
                return;
            };
            // The borrow ends before delivery so the callback can reach the grid.
            let (callback, events) = {
                let Ok(grid) = grid.try_borrow() else {
                    warn!(key, "grid is busy; dropping key event");
                    return;
                };
                let Some(direction) = grid.bound_direction(key) else {
                    return;
                };
                let events = match grid.pass(direction) {
                    Ok(events) => events,
                    Err(e) => {
                        warn!(key, error = %e, "reconciliation failed");
                        return;
                    }
                };
                let callback = Rc::clone(&grid.on_reconciliation);
                (callback, events)
            };
            deliver(&callback, &events);
        })
    }
}

fn deliver<S: 'static>(callback: &BatchCallback<S>, events: &[Reconciliation<S>]) {
    let Ok(mut run) = callback.try_borrow_mut() else {
        warn!(events = events.len(), "batch callback is already running; dropping batch");
        return;
    };
    (&mut *run)(events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply;
    use crate::grid::Coordinate;
    use crate::ids::SequentialIds;
    use crate::input::{KeyMap, KeyPhase};

    type Batches = Rc<RefCell<Vec<Vec<Reconciliation<i64>>>>>;

    fn widget(rows: Vec<Vec<i64>>, config: GridConfig) -> (ReconcilingGrid<i64>, Batches) {
        let batches: Batches = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&batches);
        let w = ReconcilingGrid::new(
            Grid::from_rows(rows).unwrap(),
            config,
            |v: &i64| *v != 0,
            |a, b| a + b,
            move |events| sink.borrow_mut().push(events.to_vec()),
        )
        .with_ids(SequentialIds::default());
        (w, batches)
    }

    #[test]
    fn motion_delivers_one_batch() {
        let (mut w, batches) = widget(vec![vec![2, 2, 2, 2]], GridConfig::default());
        assert_eq!(w.motion(Direction::Right).unwrap(), 2);
        let batches = batches.borrow();
        assert_eq!(batches.len(), 1);
        let ids: Vec<&str> = batches[0].iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["evt-0", "evt-1"]);
    }

    #[test]
    fn empty_batches_are_still_delivered() {
        let (mut w, batches) = widget(vec![vec![2, 0, 0]], GridConfig::default());
        assert_eq!(w.motion(Direction::Left).unwrap(), 0);
        assert_eq!(*batches.borrow(), vec![Vec::new()]);
    }

    #[test]
    fn unbound_keys_do_nothing() {
        let (mut w, batches) = widget(vec![vec![2, 2]], GridConfig::default());
        assert_eq!(w.handle_key("Enter").unwrap(), None);
        assert_eq!(w.handle_key("ArrowLeft").unwrap(), Some(1));
        assert_eq!(batches.borrow().len(), 1);
    }

    #[test]
    fn custom_bindings_and_phase() {
        let config = GridConfig {
            key_event: KeyPhase::KeyUp,
            keys: KeyMap::default().with_binding(Direction::Down, "s"),
        };
        let (w, batches) = widget(vec![vec![2], vec![2]], config);
        let w = Rc::new(RefCell::new(w));
        let d = KeyDispatcher::new();
        let sub = ReconcilingGrid::attach(&w, &d);
        assert_eq!(sub.phase(), KeyPhase::KeyUp);

        d.dispatch(KeyPhase::KeyDown, "s");
        assert!(batches.borrow().is_empty());
        d.dispatch(KeyPhase::KeyUp, "s");
        let batches = batches.borrow();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].source, Coordinate::new(0, 0));
        assert_eq!(batches[0][0].destination, Coordinate::new(1, 0));
    }

    #[test]
    fn detaching_stops_delivery() {
        let (w, batches) = widget(vec![vec![2, 2]], GridConfig::default());
        let w = Rc::new(RefCell::new(w));
        let d = KeyDispatcher::new();
        let sub = ReconcilingGrid::attach(&w, &d);
        d.dispatch(KeyPhase::KeyDown, "ArrowLeft");
        drop(sub);
        d.dispatch(KeyPhase::KeyDown, "ArrowLeft");
        assert_eq!(batches.borrow().len(), 1);
        assert_eq!(d.listener_count(), 0);
    }

    #[test]
    fn host_applies_batches_between_motions() {
        let (w, batches) = widget(vec![vec![2, 2, 4, 0]], GridConfig::default());
        let w = Rc::new(RefCell::new(w));
        let d = KeyDispatcher::new();
        let _sub = ReconcilingGrid::attach(&w, &d);

        for key in ["ArrowRight", "ArrowRight"] {
            d.dispatch(KeyPhase::KeyDown, key);
            let batch = batches.borrow_mut().pop().unwrap();
            let next = apply(w.borrow().data(), Direction::Right, &batch, 0).unwrap();
            w.borrow_mut().set_data(next);
        }
        assert_eq!(w.borrow().data().to_rows(), vec![vec![0, 0, 0, 8]]);
    }

    #[test]
    fn callback_applies_its_own_batch() {
        let w = Rc::<RefCell<ReconcilingGrid<i64>>>::new_cyclic(|weak| {
            let weak = weak.clone();
            RefCell::new(ReconcilingGrid::new(
                Grid::from_rows(vec![vec![2, 2]]).unwrap(),
                GridConfig::default(),
                |v: &i64| *v != 0,
                |a, b| a + b,
                move |events| {
                    let Some(w) = weak.upgrade() else {
                        return;
                    };
                    let next = apply(w.borrow().data(), Direction::Left, events, 0).unwrap();
                    w.borrow_mut().set_data(next);
                },
            ))
        });
        let d = KeyDispatcher::new();
        let _sub = ReconcilingGrid::attach(&w, &d);

        assert_eq!(d.dispatch(KeyPhase::KeyDown, "ArrowLeft"), 1);
        assert_eq!(w.borrow().data().to_rows(), vec![vec![4, 0]]);
        d.dispatch(KeyPhase::KeyDown, "ArrowLeft");
        assert_eq!(w.borrow().data().to_rows(), vec![vec![4, 0]]);
    }
}
