use super::node::{Node, NodeId};
use crate::spin_lock::{NodeLock, SpinLock};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fmt;
use std::ops::Index;

/// Generated keys keep the low 31 bits of each draw.
const RANDOM_KEY_MASK: u32 = 0x7fff_ffff;

/// A fixed-capacity arena of [`Node`] instances.
///
/// The capacity is decided when the pool is created and never changes, so a [`NodeId`] stays
/// valid for the lifetime of the pool. Every node starts detached: no links, lock unlocked and
/// tag unset.
///
/// # Examples
///
/// ```
/// use concurrent_bst::{NodeId, NodePool};
///
/// let pool: NodePool = NodePool::from_keys([50, 30, 70]);
/// assert_eq!(pool.len(), 3);
/// assert_eq!(pool[NodeId::new(1)].key(), 30);
/// ```
pub struct NodePool<L: NodeLock = SpinLock> {
    nodes: Box<[Node<L>]>,
}

impl<L: NodeLock> NodePool<L> {
    /// Creates a [`NodePool`] holding one node per key, in order.
    #[inline]
    pub fn from_keys<I: IntoIterator<Item = i64>>(keys: I) -> Self {
        Self {
            nodes: keys.into_iter().map(Node::new).collect(),
        }
    }

    /// Creates a [`NodePool`] of `len` nodes with non-negative 31-bit keys drawn from a
    /// generator seeded with `seed`.
    ///
    /// The same seed always produces the same keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use concurrent_bst::NodePool;
    ///
    /// let a: NodePool = NodePool::with_random_keys(16, 7);
    /// let b: NodePool = NodePool::with_random_keys(16, 7);
    /// assert!(a.keys().eq(b.keys()));
    /// assert!(a.keys().all(|k| (0..1_i64 << 31).contains(&k)));
    /// ```
    #[inline]
    pub fn with_random_keys(len: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::from_keys((0..len).map(|_| i64::from(rng.next_u32() & RANDOM_KEY_MASK)))
    }

    /// Returns the number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the pool has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node in the given slot, or `None` if the slot does not exist.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<L>> {
        self.nodes.get(id.index())
    }

    /// Returns an iterator over the identities of all slots, in slot order.
    #[inline]
    pub fn ids(&self) -> impl ExactSizeIterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// Returns an iterator over the keys, in slot order.
    #[inline]
    pub fn keys(&self) -> impl ExactSizeIterator<Item = i64> + '_ {
        self.nodes.iter().map(Node::key)
    }

    /// Returns an iterator over the nodes, in slot order.
    #[inline]
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node<L>> + '_ {
        self.nodes.iter()
    }
}

impl<L: NodeLock> Index<NodeId> for NodePool<L> {
    type Output = Node<L>;

    /// # Panics
    ///
    /// Panics if the slot does not exist.
    #[inline]
    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.index()]
    }
}

impl<L: NodeLock> FromIterator<i64> for NodePool<L> {
    #[inline]
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self::from_keys(iter)
    }
}

impl<L: NodeLock> fmt::Debug for NodePool<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.nodes.iter()).finish()
    }
}
