//! Concurrent binary search tree construction.
//!
//! # concurrent_bst::Tree
//! A binary search tree built once from a pre-allocated [`NodePool`] by any number of agents
//! inserting concurrently. Each node carries its own spin lock; an insertion descends without
//! locks, then locks only the node it is about to attach to and re-validates the empty slot.
//!
//! # concurrent_bst::SpinLock
//! The per-node lock: a compare-and-swap spin lock on a single atomic flag.

#[macro_use]
mod tracing_helpers;

mod atomic;

pub mod spin_lock;
pub use spin_lock::{LockState, NodeLock, SpinLock, SpinPolicy, MAX_BACKOFF_EXPONENT};

pub mod tree;
pub use tree::config::BuildConfig;
pub use tree::error::{BuildError, InvariantViolation};
pub use tree::node::{Direction, Node, NodeId, Origin, OwnershipTag};
pub use tree::pool::NodePool;
pub use tree::{Attachment, Iter, Tree};

#[cfg(feature = "serde")]
mod serde;
