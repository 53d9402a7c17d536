use super::node::Node;
use crate::spin_lock::{NodeLock, SpinPolicy};
use std::ops::Deref;

/// [`Locked`] holds the lock of a node and releases it when dropped, including on unwinding.
pub(super) struct Locked<'n, L: NodeLock> {
    node: &'n Node<L>,
}

impl<'n, L: NodeLock> Locked<'n, L> {
    /// Acquires the lock of the node, waiting according to `spin`.
    #[inline]
    pub(super) fn acquire(node: &'n Node<L>, spin: SpinPolicy) -> Self {
        node.lock().acquire(spin);
        Self { node }
    }
}

impl<L: NodeLock> Drop for Locked<'_, L> {
    #[inline]
    fn drop(&mut self) {
        self.node.lock().release();
    }
}

impl<L: NodeLock> Deref for Locked<'_, L> {
    type Target = Node<L>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.node
    }
}
