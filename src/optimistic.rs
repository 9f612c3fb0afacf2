//! Optimistic mutation tracking.
//!
//! Records in-flight local mutations so the UI can show their effect before
//! the server confirms, and rolls the display back cleanly when the server
//! rejects. The tracker only manages visibility of pending/failed state;
//! retry-or-abandon decisions belong to the caller.
//!
//! Lifecycle of an entry:
//! - registered as `Pending`, with an expiry deadline (default 30 s)
//! - resolved success: removed outright - the authoritative data has landed
//! - resolved failure: flipped to `Error`, destructive notice emitted,
//!   removed after a linger (default 5 s)
//! - never resolved: expiry treats it as a failure (logged as a warning,
//!   since a slow request may still land and be overwritten by the next
//!   authoritative fetch)
//!
//! All deadlines are swept against an injected `now`; nothing sleeps.

use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::WallClock;
use crate::core::{Product, ProductId, ProductPatch};
use crate::service::{Notice, Notifier};

/// Default expiry for an unresolved update.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default linger before a failed update is dropped.
pub const DEFAULT_FAILURE_LINGER_MS: u64 = 5_000;

/// Handle to a registered optimistic update.
pub type UpdateId = Uuid;

/// The mutation being tracked, discriminated exhaustively.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// A locally materialized entity awaiting its server counterpart.
    Create { data: Product },
    /// A patch over a snapshot of the pre-mutation entity.
    Update {
        original: Product,
        patch: ProductPatch,
    },
    /// Removal; the snapshot is kept for compensation.
    Delete { original: Product },
}

impl Mutation {
    /// The entity this mutation targets.
    pub fn target(&self) -> &ProductId {
        match self {
            Mutation::Create { data } => &data.id,
            Mutation::Update { original, .. } => &original.id,
            Mutation::Delete { original } => &original.id,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "create",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateStatus {
    Pending,
    Error,
}

/// A tracked in-flight mutation.
#[derive(Clone, Debug)]
pub struct OptimisticUpdate {
    pub id: UpdateId,
    pub mutation: Mutation,
    pub status: UpdateStatus,
    pub registered_at: WallClock,
    /// Registration order tiebreak for entries in the same millisecond.
    seq: u64,
    /// When an unresolved entry is force-failed.
    expires_at: WallClock,
    /// When a failed entry is dropped; set on resolve-failure.
    remove_at: Option<WallClock>,
}

/// Tracks optimistic updates against the product collection.
pub struct OptimisticTracker {
    updates: HashMap<UpdateId, OptimisticUpdate>,
    next_seq: u64,
    timeout_ms: u64,
    linger_ms: u64,
}

impl Default for OptimisticTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS, DEFAULT_FAILURE_LINGER_MS)
    }
}

impl OptimisticTracker {
    pub fn new(timeout_ms: u64, linger_ms: u64) -> Self {
        Self {
            updates: HashMap::new(),
            next_seq: 0,
            timeout_ms,
            linger_ms,
        }
    }

    /// Record a mutation as pending and arm its expiry deadline.
    ///
    /// Callers are responsible for not double-registering one logical
    /// mutation; the tracker does not de-duplicate by target id.
    pub fn register(&mut self, mutation: Mutation, now: WallClock) -> UpdateId {
        let id = Uuid::new_v4();
        let seq = self.next_seq;
        self.next_seq += 1;

        debug!(update = %id, verb = mutation.verb(), target = %mutation.target(), "optimistic update registered");
        self.updates.insert(
            id,
            OptimisticUpdate {
                id,
                mutation,
                status: UpdateStatus::Pending,
                registered_at: now,
                seq,
                expires_at: now.plus(self.timeout_ms),
                remove_at: None,
            },
        );
        id
    }

    /// Resolve a tracked update.
    ///
    /// Success removes the entry outright - the real data has replaced it.
    /// Failure keeps it visible as `Error` for the linger window and emits
    /// the destructive notice. Unknown ids are a no-op.
    pub fn resolve(&mut self, id: UpdateId, success: bool, now: WallClock, notify: &dyn Notifier) {
        if success {
            self.updates.remove(&id);
            return;
        }

        let Some(update) = self.updates.get_mut(&id) else {
            return;
        };
        update.status = UpdateStatus::Error;
        update.remove_at = Some(now.plus(self.linger_ms));
        notify.notify(Notice::destructive(
            "Operation failed",
            "The change could not be saved, please try again.",
        ));
    }

    /// Drive the deadlines: force-fail expired pending entries and drop
    /// failed entries past their linger.
    pub fn sweep(&mut self, now: WallClock, notify: &dyn Notifier) {
        let expired: Vec<UpdateId> = self
            .updates
            .values()
            .filter(|u| u.status == UpdateStatus::Pending && u.expires_at <= now)
            .map(|u| u.id)
            .collect();

        for id in expired {
            // A slow request may still land later and be overwritten by the
            // next authoritative fetch, hence warn rather than error.
            if let Some(update) = self.updates.get(&id) {
                warn!(
                    update = %id,
                    verb = update.mutation.verb(),
                    target = %update.mutation.target(),
                    "optimistic update expired without resolution, treating as failed"
                );
            }
            self.resolve(id, false, now, notify);
        }

        self.updates
            .retain(|_, u| u.remove_at.map_or(true, |at| at > now));
    }

    /// Pending updates, oldest first.
    pub fn pending(&self) -> Vec<&OptimisticUpdate> {
        self.by_status(UpdateStatus::Pending)
    }

    /// Failed updates still lingering, oldest first.
    pub fn failed(&self) -> Vec<&OptimisticUpdate> {
        self.by_status(UpdateStatus::Error)
    }

    pub fn has_pending(&self) -> bool {
        self.updates
            .values()
            .any(|u| u.status == UpdateStatus::Pending)
    }

    /// Drop everything and disarm all deadlines. Used on full resets.
    pub fn clear(&mut self) {
        self.updates.clear();
    }

    fn by_status(&self, status: UpdateStatus) -> Vec<&OptimisticUpdate> {
        let mut selected: Vec<&OptimisticUpdate> = self
            .updates
            .values()
            .filter(|u| u.status == status)
            .collect();
        selected.sort_by_key(|u| (u.registered_at, u.seq));
        selected
    }

    /// Fold every pending update onto a base collection, oldest first,
    /// with a caller-supplied step. A step that fails is logged and
    /// skipped; one bad update must not blank the whole list.
    pub fn overlay_with<E, F>(&self, base: Vec<Product>, mut step: F) -> Vec<Product>
    where
        E: std::fmt::Display,
        F: FnMut(Vec<Product>, &OptimisticUpdate) -> Result<Vec<Product>, E>,
    {
        let mut list = base;
        for update in self.pending() {
            let snapshot = list.clone();
            match step(list, update) {
                Ok(next) => list = next,
                Err(err) => {
                    warn!(update = %update.id, %err, "optimistic overlay step failed, skipping update");
                    list = snapshot;
                }
            }
        }
        list
    }

    /// Fold pending updates onto a product list with the standard merge:
    /// creates prepend (newest first), updates shallow-merge by id, deletes
    /// filter by id.
    pub fn overlay(&self, base: Vec<Product>) -> Vec<Product> {
        self.overlay_with::<std::convert::Infallible, _>(base, |list, update| {
            Ok(apply_to_product_list(list, &update.mutation))
        })
    }
}

/// The per-update merge used by `overlay`.
pub fn apply_to_product_list(mut list: Vec<Product>, mutation: &Mutation) -> Vec<Product> {
    match mutation {
        Mutation::Create { data } => {
            list.insert(0, data.clone());
            list
        }
        Mutation::Update { original, patch } => list
            .into_iter()
            .map(|p| {
                if p.id == original.id {
                    p.patched(patch)
                } else {
                    p
                }
            })
            .collect(),
        Mutation::Delete { original } => {
            list.retain(|p| p.id != original.id);
            list
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Patch;
    use crate::service::NullNotifier;
    use std::cell::RefCell;

    struct Recorder(RefCell<Vec<Notice>>);

    impl Recorder {
        fn new() -> Self {
            Self(RefCell::new(Vec::new()))
        }
        fn count(&self) -> usize {
            self.0.borrow().len()
        }
    }

    impl Notifier for Recorder {
        fn notify(&self, notice: Notice) {
            self.0.borrow_mut().push(notice);
        }
    }

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: ProductId::new(id).unwrap(),
            name: name.into(),
            description: None,
            category: vec![],
            vendor: None,
            assignee: None,
            stage: None,
            priority: None,
            tags: vec![],
            price: None,
            quantity: None,
            created_at: WallClock(0),
            updated_at: WallClock(0),
        }
    }

    #[test]
    fn resolve_success_removes_outright() {
        let mut tracker = OptimisticTracker::default();
        let id = tracker.register(
            Mutation::Create {
                data: product("t1", "Widget"),
            },
            WallClock(1_000),
        );
        assert!(tracker.has_pending());

        tracker.resolve(id, true, WallClock(1_100), &NullNotifier);
        assert!(tracker.pending().is_empty());
        assert!(tracker.failed().is_empty());
    }

    #[test]
    fn resolve_failure_lingers_then_drops() {
        let sink = Recorder::new();
        let mut tracker = OptimisticTracker::default();
        let id = tracker.register(
            Mutation::Delete {
                original: product("p1", "Widget"),
            },
            WallClock(1_000),
        );

        tracker.resolve(id, false, WallClock(2_000), &sink);
        assert_eq!(tracker.failed().len(), 1);
        assert!(tracker.pending().is_empty());
        assert_eq!(sink.count(), 1);

        // Still lingering just before the 5s mark.
        tracker.sweep(WallClock(6_999), &sink);
        assert_eq!(tracker.failed().len(), 1);

        tracker.sweep(WallClock(7_001), &sink);
        assert!(tracker.failed().is_empty());
    }

    #[test]
    fn unknown_id_resolution_is_a_noop() {
        let mut tracker = OptimisticTracker::default();
        tracker.resolve(Uuid::new_v4(), false, WallClock(0), &NullNotifier);
        assert!(tracker.failed().is_empty());
    }

    #[test]
    fn stale_pending_update_expires_as_failure() {
        let sink = Recorder::new();
        let mut tracker = OptimisticTracker::default();
        tracker.register(
            Mutation::Create {
                data: product("t1", "Widget"),
            },
            WallClock(0),
        );

        tracker.sweep(WallClock(29_999), &sink);
        assert!(tracker.has_pending());

        tracker.sweep(WallClock(30_000), &sink);
        assert!(!tracker.has_pending());
        assert_eq!(tracker.failed().len(), 1);
        assert_eq!(sink.count(), 1);

        // Linger runs from the expiry sweep.
        tracker.sweep(WallClock(35_001), &sink);
        assert!(tracker.failed().is_empty());
    }

    #[test]
    fn overlay_is_deterministic() {
        let mut tracker = OptimisticTracker::default();
        tracker.register(
            Mutation::Create {
                data: product("t1", "New"),
            },
            WallClock(10),
        );
        tracker.register(
            Mutation::Delete {
                original: product("p2", "Old"),
            },
            WallClock(20),
        );

        let base = vec![product("p1", "A"), product("p2", "Old")];
        let once = tracker.overlay(base.clone());
        let twice = tracker.overlay(base);
        assert_eq!(once, twice);
    }

    #[test]
    fn overlay_applies_all_three_branches() {
        let mut tracker = OptimisticTracker::default();
        tracker.register(
            Mutation::Update {
                original: product("p1", "A"),
                patch: ProductPatch {
                    name: Patch::Set("A2".into()),
                    ..ProductPatch::default()
                },
            },
            WallClock(10),
        );
        tracker.register(
            Mutation::Delete {
                original: product("p2", "B"),
            },
            WallClock(20),
        );
        tracker.register(
            Mutation::Create {
                data: product("t9", "C"),
            },
            WallClock(30),
        );

        let out = tracker.overlay(vec![product("p1", "A"), product("p2", "B")]);
        let names: Vec<&str> = out.iter().map(|p| p.name.as_str()).collect();
        // Create prepends, update renames, delete removes.
        assert_eq!(names, vec!["C", "A2"]);
    }

    #[test]
    fn overlay_folds_oldest_first() {
        let mut tracker = OptimisticTracker::default();
        // Same millisecond: registration order decides.
        tracker.register(
            Mutation::Create {
                data: product("t1", "first"),
            },
            WallClock(10),
        );
        tracker.register(
            Mutation::Create {
                data: product("t2", "second"),
            },
            WallClock(10),
        );

        let out = tracker.overlay(vec![]);
        let names: Vec<&str> = out.iter().map(|p| p.name.as_str()).collect();
        // Each create prepends, so the later registration ends up on top.
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn overlay_with_skips_failing_steps() {
        let mut tracker = OptimisticTracker::default();
        tracker.register(
            Mutation::Create {
                data: product("t1", "bad"),
            },
            WallClock(10),
        );
        tracker.register(
            Mutation::Create {
                data: product("t2", "good"),
            },
            WallClock(20),
        );

        let out = tracker.overlay_with(vec![product("p1", "base")], |list, update| {
            if update.mutation.target().as_str() == "t1" {
                Err("corrupt entry")
            } else {
                Ok(apply_to_product_list(list, &update.mutation))
            }
        });

        let names: Vec<&str> = out.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["good", "base"]);
    }

    #[test]
    fn clear_disarms_everything() {
        let sink = Recorder::new();
        let mut tracker = OptimisticTracker::default();
        tracker.register(
            Mutation::Create {
                data: product("t1", "Widget"),
            },
            WallClock(0),
        );
        tracker.clear();

        tracker.sweep(WallClock(60_000), &sink);
        assert_eq!(sink.count(), 0);
        assert!(!tracker.has_pending());
    }
}
