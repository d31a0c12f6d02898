//! Backtrackable per-state extension data
//!
//! Listeners and policies often carry auxiliary data that is correlated
//! with the search's current state (lock histories, coverage counters,
//! heuristic scores). Instead of every client reimplementing save/restore,
//! a [`StateExtensionTracker`] snapshots the client's data on every forward
//! step and hands the right snapshot back whenever the search backtracks or
//! restores, keyed by the driver's state id.
//!
//! The tracker depends only on the externally driven state-id sequence; it
//! knows nothing about pooling or permutation generators. Snapshot objects
//! are owned and interpreted by the registering client alone, the tracker
//! only manages their storage slots.

use tracing::trace;

use crate::growth::DynamicArray;

/// Identifier in the driver's monotonically extended state-id stream.
///
/// Ids start at 0 for the first advanced state; the pre-initial state is
/// id -1, which is why snapshot slots are offset by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub i32);

impl StateId {
    /// The state before the first transition.
    pub const PRE_INIT: StateId = StateId(-1);

    #[inline]
    fn slot(self) -> usize {
        assert!(self.0 >= -1, "state id below the pre-initial id: {}", self.0);
        (self.0 + 1) as usize
    }
}

/// A client whose auxiliary data should track the search state.
///
/// `capture` must return a snapshot that `restore` can later use to bring
/// the client's data back to exactly this point; the tracker never looks
/// inside a snapshot.
pub trait StateExtensionClient {
    type Snapshot;

    fn capture(&self) -> Self::Snapshot;

    fn restore(&mut self, snapshot: &Self::Snapshot);
}

/// State-id-indexed snapshot table driving a client's save/restore in
/// lockstep with the search.
pub struct StateExtensionTracker<C: StateExtensionClient> {
    snapshots: DynamicArray<C::Snapshot>,
}

impl<C: StateExtensionClient> Default for StateExtensionTracker<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: StateExtensionClient> StateExtensionTracker<C> {
    pub fn new() -> Self {
        StateExtensionTracker {
            snapshots: DynamicArray::new(),
        }
    }

    /// The search advanced to `id`: capture and file a fresh snapshot.
    ///
    /// Revisits of an already-known id overwrite the slot with an equal
    /// snapshot, which is harmless; the table grows on demand for new ids.
    pub fn state_advanced(&mut self, client: &C, id: StateId) {
        let snapshot = client.capture();
        self.snapshots.set(id.slot(), snapshot);
        trace!(id = id.0, "captured state extension");
    }

    /// The search backtracked to `id`: hand the stored snapshot back.
    ///
    /// # Panics
    ///
    /// Panics if the search never advanced through `id`; backtracking to an
    /// unknown state is a driver bug that must not be papered over.
    pub fn state_backtracked(&self, client: &mut C, id: StateId) {
        client.restore(self.stored(id));
        trace!(id = id.0, "restored state extension on backtrack");
    }

    /// The search explicitly restored `id` (e.g. to re-explore a fully
    /// explored state). Beyond restoring the snapshot this must restart
    /// choice enumeration at the state's next pending choice point, or
    /// re-entering the state would resume mid-enumeration and miss
    /// choices; the driver passes that reset as `restart_choices`.
    ///
    /// # Panics
    ///
    /// Panics if the search never advanced through `id`.
    pub fn state_restored(&self, client: &mut C, id: StateId, restart_choices: impl FnOnce()) {
        client.restore(self.stored(id));
        restart_choices();
        trace!(id = id.0, "restored state extension on explicit restore");
    }

    fn stored(&self, id: StateId) -> &C::Snapshot {
        self.snapshots.get(id.slot()).unwrap_or_else(|| {
            panic!(
                "no extension snapshot for state id {}: state was never advanced through",
                id.0
            )
        })
    }

    pub fn has_snapshot(&self, id: StateId) -> bool {
        self.snapshots.get(id.slot()).is_some()
    }

    /// Tear down all snapshots between verification runs.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Client carrying a lock-acquisition counter per thread.
    struct Counters {
        per_thread: Vec<u32>,
    }

    impl StateExtensionClient for Counters {
        type Snapshot = Vec<u32>;

        fn capture(&self) -> Vec<u32> {
            self.per_thread.clone()
        }

        fn restore(&mut self, snapshot: &Vec<u32>) {
            self.per_thread.clone_from(snapshot);
        }
    }

    #[test]
    fn test_backtrack_recovers_snapshot() {
        let mut client = Counters {
            per_thread: vec![0, 0],
        };
        let mut tracker = StateExtensionTracker::new();

        client.per_thread[0] = 1;
        tracker.state_advanced(&client, StateId(0));

        // wander off through unrelated states, mutating as we go
        client.per_thread[0] = 7;
        tracker.state_advanced(&client, StateId(1));
        client.per_thread[1] = 3;
        tracker.state_advanced(&client, StateId(2));

        tracker.state_backtracked(&mut client, StateId(0));
        assert_eq!(client.per_thread, vec![1, 0]);
    }

    #[test]
    fn test_pre_initial_state_has_slot_zero() {
        let client = Counters {
            per_thread: vec![9],
        };
        let mut tracker = StateExtensionTracker::new();
        tracker.state_advanced(&client, StateId::PRE_INIT);
        assert!(tracker.has_snapshot(StateId::PRE_INIT));
        assert!(!tracker.has_snapshot(StateId(0)));
    }

    #[test]
    fn test_restored_restarts_choice_enumeration() {
        let mut client = Counters {
            per_thread: vec![5],
        };
        let mut tracker = StateExtensionTracker::new();
        tracker.state_advanced(&client, StateId(0));

        client.per_thread[0] = 42;
        let mut restarted = false;
        tracker.state_restored(&mut client, StateId(0), || restarted = true);
        assert!(restarted);
        assert_eq!(client.per_thread, vec![5]);
    }

    #[test]
    fn test_restored_resets_permuter() {
        use crate::permute::Permuter;

        let mut client = Counters {
            per_thread: vec![0],
        };
        let mut tracker = StateExtensionTracker::new();
        tracker.state_advanced(&client, StateId(3));

        // the choice point at the restored state had already consumed
        // some of its orderings
        let mut choices = Permuter::pairwise(3);
        choices.next();
        choices.next();

        tracker.state_restored(&mut client, StateId(3), || choices.reset());
        assert_eq!(choices.n_generated(), 0);
        assert_eq!(choices.next(), Some(&[0u32, 1, 2][..]));
    }

    #[test]
    #[should_panic(expected = "never advanced")]
    fn test_restore_of_unknown_id_panics() {
        let mut client = Counters {
            per_thread: vec![],
        };
        let mut tracker = StateExtensionTracker::new();
        tracker.state_advanced(&client, StateId(0));
        tracker.state_backtracked(&mut client, StateId(5));
    }

    #[test]
    fn test_clear_drops_snapshots() {
        let client = Counters {
            per_thread: vec![1],
        };
        let mut tracker = StateExtensionTracker::new();
        tracker.state_advanced(&client, StateId(0));
        tracker.clear();
        assert!(!tracker.has_snapshot(StateId(0)));
    }
}
