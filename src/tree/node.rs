use crate::atomic::{AtomicBool, AtomicU8, AtomicUsize};
use crate::spin_lock::{NodeLock, SpinLock};
use std::fmt;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

/// Marks an absent link.
const NIL: usize = usize::MAX;

/// The stable identity of a [`Node`] in a [`NodePool`](super::pool::NodePool).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a [`NodeId`] referring to the given slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is `usize::MAX`, which is reserved.
    #[inline]
    pub fn new(index: usize) -> Self {
        assert_ne!(index, NIL, "usize::MAX is not a valid node index");
        Self(index)
    }

    /// Returns the slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which child link of a node.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    /// Keys strictly less than the node's key.
    Left,
    /// Keys greater than or equal to the node's key.
    Right,
}

impl Direction {
    /// Chooses the subtree `key` belongs to relative to a node holding `node_key`.
    ///
    /// Equal keys go right.
    #[inline]
    pub const fn of(key: i64, node_key: i64) -> Self {
        if key < node_key {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

/// The class of agent performing an insertion.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Origin {
    /// A host CPU thread.
    #[default]
    Host,
    /// A device compute unit sharing the pool's memory.
    Device,
}

/// Records which classes of agent attached the children of a node.
///
/// The tag only moves forward: `Unset < HostOnly < Mixed`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum OwnershipTag {
    /// No child has been attached.
    #[default]
    Unset = 0,
    /// Every child so far was attached by a host agent.
    HostOnly = 1,
    /// Children were attached by a mix of host and device agents.
    Mixed = 2,
}

impl OwnershipTag {
    /// Returns the tag after one more child is attached by an agent of the given origin.
    #[inline]
    #[must_use]
    pub const fn after_attach(self, origin: Origin) -> Self {
        match (self, origin) {
            (OwnershipTag::Unset | OwnershipTag::HostOnly, Origin::Host) => OwnershipTag::HostOnly,
            _ => OwnershipTag::Mixed,
        }
    }

    #[inline]
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => OwnershipTag::Unset,
            1 => OwnershipTag::HostOnly,
            _ => OwnershipTag::Mixed,
        }
    }
}

/// One element of the tree.
///
/// Links are slot indices into the owning pool. `left`, `right` and `parent` are written at most
/// once each; `left`/`right` are only written while holding this node's lock, and `parent` is
/// written by the agent attaching this node while it holds the parent's lock.
pub struct Node<L: NodeLock = SpinLock> {
    key: i64,
    left: AtomicUsize,
    right: AtomicUsize,
    parent: AtomicUsize,
    attached: AtomicBool,
    tag: AtomicU8,
    lock: L,
}

impl<L: NodeLock> Node<L> {
    /// Creates a detached [`Node`]: no links, lock unlocked, tag unset.
    #[inline]
    pub fn new(key: i64) -> Self {
        Self {
            key,
            left: AtomicUsize::new(NIL),
            right: AtomicUsize::new(NIL),
            parent: AtomicUsize::new(NIL),
            attached: AtomicBool::new(false),
            tag: AtomicU8::new(OwnershipTag::Unset as u8),
            lock: L::default(),
        }
    }

    /// Returns the key.
    #[inline]
    pub fn key(&self) -> i64 {
        self.key
    }

    /// Returns the left child.
    #[inline]
    pub fn left(&self) -> Option<NodeId> {
        self.child(Direction::Left)
    }

    /// Returns the right child.
    #[inline]
    pub fn right(&self) -> Option<NodeId> {
        self.child(Direction::Right)
    }

    /// Returns the child in the given direction.
    #[inline]
    pub fn child(&self, direction: Direction) -> Option<NodeId> {
        decode(self.link(direction).load(Acquire))
    }

    /// Returns the node this one was attached to; `None` for the root and for detached nodes.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        decode(self.parent.load(Acquire))
    }

    /// Returns `true` once the node is part of the tree.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Acquire)
    }

    /// Returns the current [`OwnershipTag`].
    #[inline]
    pub fn ownership_tag(&self) -> OwnershipTag {
        OwnershipTag::from_u8(self.tag.load(Relaxed))
    }

    /// Returns the embedded lock.
    #[inline]
    pub fn lock(&self) -> &L {
        &self.lock
    }

    /// Links `child` in the given direction and advances the tag.
    ///
    /// The caller must hold this node's lock and must have observed the slot empty under it.
    #[inline]
    pub(crate) fn link_child(&self, direction: Direction, child: NodeId, origin: Origin) {
        debug_assert!(self.lock.is_locked());
        debug_assert_eq!(self.link(direction).load(Relaxed), NIL);
        let tag = self.ownership_tag().after_attach(origin);
        self.tag.store(tag as u8, Relaxed);
        self.link(direction).store(child.index(), Release);
    }

    /// Records the parent and marks the node attached.
    #[inline]
    pub(crate) fn mark_attached(&self, parent: Option<NodeId>) {
        if let Some(parent) = parent {
            self.parent.store(parent.index(), Release);
        }
        self.attached.store(true, Release);
    }

    #[inline]
    fn link(&self, direction: Direction) -> &AtomicUsize {
        match direction {
            Direction::Left => &self.left,
            Direction::Right => &self.right,
        }
    }
}

impl<L: NodeLock> fmt::Debug for Node<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("left", &self.left())
            .field("right", &self.right())
            .field("parent", &self.parent())
            .field("attached", &self.is_attached())
            .field("ownership_tag", &self.ownership_tag())
            .field("locked", &self.lock.is_locked())
            .finish()
    }
}

#[inline]
fn decode(index: usize) -> Option<NodeId> {
    if index == NIL {
        None
    } else {
        Some(NodeId(index))
    }
}
