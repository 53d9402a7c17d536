//! Shared helpers for the integration tests.
//!
//! Set `RUST_LOG` (e.g. `concurrent_bst=trace`) and enable the `tracing` feature to see the
//! insertion events.

#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::Once;

use concurrent_bst::{NodeLock, SpinLock};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a test-friendly subscriber once per test binary.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A [`SpinLock`] that counts its holders and hand-overs.
#[derive(Debug, Default)]
pub struct CountingLock {
    inner: SpinLock,
    holders: AtomicUsize,
    max_holders: AtomicUsize,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
}

impl CountingLock {
    /// The largest number of simultaneous holders ever observed.
    pub fn max_holders(&self) -> usize {
        self.max_holders.load(SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(SeqCst)
    }
}

impl NodeLock for CountingLock {
    fn try_acquire(&self) -> bool {
        if !self.inner.try_acquire() {
            return false;
        }
        let holders = self.holders.fetch_add(1, SeqCst) + 1;
        self.max_holders.fetch_max(holders, SeqCst);
        self.acquisitions.fetch_add(1, SeqCst);
        true
    }

    fn release(&self) {
        self.holders.fetch_sub(1, SeqCst);
        self.releases.fetch_add(1, SeqCst);
        self.inner.release();
    }

    fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}
