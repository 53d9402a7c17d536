//! [`SpinLock`] is the per-node mutual exclusion primitive.

use crate::atomic::{spin_loop, yield_now, AtomicBool};
use std::fmt;
use std::sync::atomic::Ordering::{Relaxed, Release, SeqCst};

/// The two states of a [`SpinLock`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LockState {
    /// Nobody holds the lock.
    #[default]
    Unlocked,
    /// An agent holds the lock.
    Locked,
}

impl LockState {
    #[inline]
    const fn as_flag(self) -> bool {
        matches!(self, LockState::Locked)
    }
}

/// How an agent waits while a [`NodeLock`] is held by someone else.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SpinPolicy {
    /// Retries the compare-and-swap indefinitely with only a CPU spin hint in between.
    ///
    /// Agents that cannot block or yield can only wait this way; under sustained contention an
    /// agent may starve.
    #[default]
    Spin,
    /// Spins `2^attempt` times between attempts up to `2^max_exponent`, then yields the thread
    /// between further attempts.
    ///
    /// `max_exponent` is capped at [`MAX_BACKOFF_EXPONENT`].
    Backoff {
        /// The largest exponent of the spin count.
        max_exponent: u32,
    },
}

/// The largest exponent honored by [`SpinPolicy::Backoff`]: a single pause never spins more than
/// `2^16` times.
pub const MAX_BACKOFF_EXPONENT: u32 = 16;

impl SpinPolicy {
    /// Waits once after the `attempt`-th failed acquisition.
    #[inline]
    pub fn pause(self, attempt: u32) {
        match self.spins(attempt) {
            Some(spins) => {
                for _ in 0..spins {
                    spin_loop();
                }
            }
            None => yield_now(),
        }
    }

    /// Returns how many spin hints the `attempt`-th pause issues, or `None` if it yields instead.
    #[inline]
    pub fn spins(self, attempt: u32) -> Option<u32> {
        match self {
            SpinPolicy::Spin => Some(1),
            SpinPolicy::Backoff { max_exponent } => {
                if attempt > max_exponent.min(MAX_BACKOFF_EXPONENT) {
                    None
                } else {
                    Some(1_u32 << attempt)
                }
            }
        }
    }
}

/// A lock that can be embedded in every tree node.
///
/// Implementors must provide mutual exclusion between [`try_acquire`](NodeLock::try_acquire) and
/// [`release`](NodeLock::release), and must make writes made while holding the lock visible to
/// the next holder. [`Default`] must produce an unlocked instance.
pub trait NodeLock: Default + Send + Sync {
    /// Attempts to take the lock once, returning `true` on success.
    fn try_acquire(&self) -> bool;

    /// Releases the lock held by the caller.
    fn release(&self);

    /// Returns `true` if the lock is currently held.
    fn is_locked(&self) -> bool;

    /// Takes the lock, waiting according to the [`SpinPolicy`] until it succeeds.
    ///
    /// There is no bound on the number of attempts.
    #[inline]
    fn acquire(&self, policy: SpinPolicy) {
        let mut attempt = 0_u32;
        while !self.try_acquire() {
            policy.pause(attempt);
            attempt = attempt.saturating_add(1);
        }
    }
}

/// [`SpinLock`] is a binary lock on an atomic flag.
///
/// Acquisition is a sequentially consistent compare-and-swap from unlocked to locked, on both
/// success and failure, so that agents with different native memory models agree on the order
/// of lock hand-overs. Release is a plain store with release ordering.
///
/// # Examples
///
/// ```
/// use concurrent_bst::{LockState, NodeLock, SpinLock, SpinPolicy};
///
/// let lock = SpinLock::new(LockState::Unlocked);
/// lock.acquire(SpinPolicy::Spin);
/// assert!(lock.is_locked());
/// assert!(!lock.try_acquire());
///
/// lock.release();
/// assert!(!lock.is_locked());
/// ```
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    /// Creates a [`SpinLock`] in the given initial state.
    ///
    /// Initialization is not a synchronization point: the lock must not be shared yet.
    #[inline]
    pub fn new(state: LockState) -> Self {
        Self {
            locked: AtomicBool::new(state.as_flag()),
        }
    }

    /// Returns the current [`LockState`].
    #[inline]
    pub fn state(&self) -> LockState {
        if self.locked.load(Relaxed) {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }
}

impl NodeLock for SpinLock {
    #[inline]
    fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, SeqCst, SeqCst)
            .is_ok()
    }

    #[inline]
    fn release(&self) {
        debug_assert!(self.locked.load(Relaxed), "releasing an unlocked SpinLock");
        self.locked.store(false, Release);
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.locked.load(SeqCst)
    }
}

impl Default for SpinLock {
    #[inline]
    fn default() -> Self {
        Self::new(LockState::Unlocked)
    }
}

impl fmt::Debug for SpinLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock")
            .field("state", &self.state())
            .finish()
    }
}
