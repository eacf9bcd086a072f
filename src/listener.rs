//! Single-threaded key-event source with scoped subscriptions.
//!
//! A [`KeyDispatcher`] stands in for the environment-wide event target a
//! component listens on. `subscribe` hands back a [`Subscription`]; dropping it
//! removes the handler, so a listener lives exactly as long as its owner.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use grid_reconcile::input::KeyPhase;
//! use grid_reconcile::listener::KeyDispatcher;
//!
//! let dispatcher = KeyDispatcher::new();
//! let hits = Rc::new(Cell::new(0));
//! let sub = {
//!     let hits = Rc::clone(&hits);
//!     dispatcher.subscribe(KeyPhase::KeyDown, move |_key| hits.set(hits.get() + 1))
//! };
//! assert_eq!(dispatcher.dispatch(KeyPhase::KeyDown, "ArrowUp"), 1);
//! drop(sub);
//! assert_eq!(dispatcher.dispatch(KeyPhase::KeyDown, "ArrowUp"), 0);
//! assert_eq!(hits.get(), 1);
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::input::KeyPhase;

type Handler = Rc<RefCell<dyn FnMut(&str)>>;

struct Entry {
    id: u64,
    phase: KeyPhase,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Registry {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }
}

/// Fan-out of key events to the handlers subscribed on the matching phase.
///
/// Cloning yields another handle to the same set of handlers.
#[derive(Clone, Default)]
pub struct KeyDispatcher {
    registry: Rc<RefCell<Registry>>,
}

impl KeyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `phase` until the returned subscription drops.
    #[must_use = "dropping the subscription unregisters the handler immediately"]
    pub fn subscribe<F>(&self, phase: KeyPhase, handler: F) -> Subscription
    where
        F: FnMut(&str) + 'static,
    {
        let mut reg = self.registry.borrow_mut();
        let id = reg.next_id;
        reg.next_id += 1;
        let handler: Handler = Rc::new(RefCell::new(handler));
        reg.entries.push(Entry { id, phase, handler });
        trace!(id, %phase, "key handler subscribed");
        Subscription { id, phase, registry: Rc::downgrade(&self.registry) }
    }

    /// Deliver `key` to every handler on `phase`, in subscription order.
    ///
    /// Handlers may subscribe or unsubscribe while running. A handler removed
    /// earlier in the same dispatch is not called, and a handler is never
    /// re-entered. Returns the number of handlers invoked.
    pub fn dispatch(&self, phase: KeyPhase, key: &str) -> usize {
        let snapshot: Vec<(u64, Handler)> = self
            .registry
            .borrow()
            .entries
            .iter()
            .filter(|e| e.phase == phase)
            .map(|e| (e.id, Rc::clone(&e.handler)))
            .collect();

        let mut invoked = 0;
        for (id, handler) in snapshot {
            if !self.registry.borrow().contains(id) {
                continue;
            }
            let Ok(mut run) = handler.try_borrow_mut() else {
                trace!(id, "skipping busy key handler");
                continue;
            };
            (&mut *run)(key);
            invoked += 1;
        }
        invoked
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().entries.len()
    }
}

/// Live registration of one handler. Unregisters on drop.
#[must_use = "dropping the subscription unregisters the handler immediately"]
pub struct Subscription {
    id: u64,
    phase: KeyPhase,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn phase(&self) -> KeyPhase {
        self.phase
    }

    /// False once the dispatcher itself is gone.
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|reg| reg.borrow().contains(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        // Take the entry out before dropping it: the handler may own other
        // subscriptions whose drop needs the registry.
        let removed = {
            let mut reg = registry.borrow_mut();
            let pos = reg.entries.iter().position(|e| e.id == self.id);
            pos.map(|p| reg.entries.remove(p))
        };
        if removed.is_some() {
            trace!(id = self.id, "key handler unsubscribed");
        }
        drop(removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> impl FnMut(&str) + 'static {
        let log = Rc::clone(log);
        move |key: &str| log.borrow_mut().push(format!("{tag}:{key}"))
    }

    #[test]
    fn dispatches_by_phase_in_subscription_order() {
        let d = KeyDispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _a = d.subscribe(KeyPhase::KeyDown, recorder(&log, "a"));
        let _b = d.subscribe(KeyPhase::KeyUp, recorder(&log, "b"));
        let _c = d.subscribe(KeyPhase::KeyDown, recorder(&log, "c"));

        assert_eq!(d.dispatch(KeyPhase::KeyDown, "x"), 2);
        assert_eq!(d.dispatch(KeyPhase::KeyUp, "y"), 1);
        assert_eq!(d.dispatch(KeyPhase::KeyPress, "z"), 0);
        assert_eq!(*log.borrow(), vec!["a:x", "c:x", "b:y"]);
    }

    #[test]
    fn drop_releases_the_listener() {
        let d = KeyDispatcher::new();
        let sub = d.subscribe(KeyPhase::KeyDown, |_| {});
        assert_eq!(d.listener_count(), 1);
        assert!(sub.is_active());
        drop(sub);
        assert_eq!(d.listener_count(), 0);
    }

    #[test]
    fn subscription_outlives_dispatcher() {
        let d = KeyDispatcher::new();
        let sub = d.subscribe(KeyPhase::KeyDown, |_| {});
        drop(d);
        assert!(!sub.is_active());
        drop(sub);
    }

    #[test]
    fn handler_can_unsubscribe_a_later_handler() {
        let d = KeyDispatcher::new();
        let later_hits = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let _first = {
            let slot = Rc::clone(&slot);
            d.subscribe(KeyPhase::KeyDown, move |_| {
                slot.borrow_mut().take();
            })
        };
        let later = {
            let hits = Rc::clone(&later_hits);
            d.subscribe(KeyPhase::KeyDown, move |_| hits.set(hits.get() + 1))
        };
        *slot.borrow_mut() = Some(later);

        assert_eq!(d.dispatch(KeyPhase::KeyDown, "k"), 1);
        assert_eq!(later_hits.get(), 0);
        assert_eq!(d.listener_count(), 1);
    }

    #[test]
    fn handler_is_not_reentered() {
        let d = KeyDispatcher::new();
        let depth = Rc::new(Cell::new(0));
        let _sub = {
            let d2 = d.clone();
            let depth = Rc::clone(&depth);
            d.subscribe(KeyPhase::KeyDown, move |_| {
                depth.set(depth.get() + 1);
                assert_eq!(d2.dispatch(KeyPhase::KeyDown, "again"), 0);
            })
        };
        assert_eq!(d.dispatch(KeyPhase::KeyDown, "k"), 1);
        assert_eq!(depth.get(), 1);
    }
}
