//! State-matching and interleaving-exploration core for an explicit-state
//! model checker.
//!
//! An explicit-state checker re-executes a program under different schedules
//! of its nondeterministic choice points and needs two things from this
//! crate: a way to recognize that a global state has been visited before
//! (so depth-first search terminates), and a bounded, reproducible order in
//! which to try the choices at each choice point (since trying all
//! orderings is factorial in the number of concurrent entities).
//!
//! # Subsystems
//!
//! - State fingerprinting: the hash-consing [`Pool`], the order-sensitive
//!   [`HashAccumulator`] and the canonicalized [`CanonicalBitSet`] /
//!   [`WorkingBitSet`] pair collapse duplicate state components and fold
//!   them into compact fingerprints; [`StateSet`] maps fingerprinted state
//!   vectors to dense state ids for revisit detection.
//! - Interleaving generation: the [`Permuter`] family (total, pairwise,
//!   random, unique-random) supplies bounded, deterministic exploration
//!   orders, configured through [`PermuterConfig`].
//! - Backtrackable extensions: [`StateExtensionTracker`] snapshots and
//!   restores auxiliary per-state client data in lockstep with the
//!   driver's state-id transitions, backed by the [`Growth`]-policy-sized
//!   [`DynamicArray`].
//!
//! # Concurrency
//!
//! Everything here is single-threaded by design: one exploration thread
//! owns every pool, bit-set, generator and snapshot table. Determinism is
//! a hard requirement (replaying a recorded defect depends on it), so all
//! randomness is explicitly seeded and all index assignment is call-order
//! driven.
//!
//! There is no global, process-wide state: components that need
//! reinitialization between verification runs expose explicit
//! `reset`/`clear` methods and are threaded through the driver's own
//! run-scoped context.

pub mod bitset;
pub mod error;
pub mod extension;
pub mod growth;
pub mod hash;
pub mod permute;
pub mod pool;
pub mod state_set;

pub use bitset::{CanonicalBitSet, SetBits, WorkingBitSet};
pub use error::{Error, Result};
pub use extension::{StateExtensionClient, StateExtensionTracker, StateId};
pub use growth::{DynamicArray, Growth};
pub use hash::HashAccumulator;
pub use permute::{Permuter, PermuterConfig, PermuterKind};
pub use pool::Pool;
pub use state_set::StateSet;
