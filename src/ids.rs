//! Opaque identifiers for reconciliation events.
//!
//! The reconciler only needs ids that are unique within one process run.
//! `UuidIds` is the default; `SequentialIds` is deterministic and is what the
//! tests and the CLI's `--sequential-ids` use.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self { EventId(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str { &self.0 }
}

/// Source of unique event ids. Shared across threads by `batch::reconcile_all`.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> EventId;
}

impl<T: IdSource + ?Sized> IdSource for &T {
    fn next_id(&self) -> EventId { (**self).next_id() }
}

impl<T: IdSource + ?Sized> IdSource for Box<T> {
    fn next_id(&self) -> EventId { (**self).next_id() }
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&self) -> EventId {
        EventId(Uuid::new_v4().to_string())
    }
}

/// `"{prefix}-{n}"` with a per-source counter starting at zero.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        SequentialIds { prefix: prefix.into(), next: AtomicU64::new(0) }
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> u64 { self.next.load(Ordering::Relaxed) }
}

impl Default for SequentialIds {
    fn default() -> Self { SequentialIds::new("evt") }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> EventId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        EventId(format!("{}-{}", self.prefix, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sequential_ids_count_up() {
        let ids = SequentialIds::new("t");
        assert_eq!(ids.next_id().as_str(), "t-0");
        assert_eq!(ids.next_id().as_str(), "t-1");
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn uuid_ids_are_unique() {
        let ids = UuidIds;
        let seen: HashSet<EventId> = (0..256).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 256);
    }

    #[test]
    fn event_id_serializes_as_plain_string() {
        let id = EventId::new("evt-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"evt-7\"");
    }
}
