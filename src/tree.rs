pub mod config;
pub mod error;
mod locked;
pub mod node;
pub mod pool;

use crate::spin_lock::{NodeLock, SpinLock, SpinPolicy};

use config::BuildConfig;
use error::{BuildError, InvariantViolation};
use locked::Locked;
use node::{Direction, Node, NodeId, Origin};
use pool::NodePool;
use std::fmt;
use std::iter::FusedIterator;
use std::thread;

/// A binary search tree built over a [`NodePool`] by concurrent agents.
///
/// The first node of the pool is the root. Every other node joins the tree through exactly one
/// call to [`insert`](Tree::insert) or [`insert_from`](Tree::insert_from), and any number of
/// threads may make those calls at the same time through a shared reference. Equal keys are
/// placed in the right subtree.
///
/// ## How an insertion proceeds
/// * The path to an empty slot is found without taking any lock.
/// * Only the node owning that slot is locked, and the slot is checked again under the lock.
/// * If another agent filled the slot in the meantime, the lock is released and the descent
///   resumes from the node that filled it.
///
/// An agent never holds more than one lock, so insertions cannot deadlock. An agent can starve
/// if other agents keep winning the slots it is heading for.
///
/// Reading the structure through [`iter`](Tree::iter), [`validate`](Tree::validate) and the node
/// accessors is meant for quiescent trees: all insertions must have returned and the inserting
/// threads must have been joined.
pub struct Tree<L: NodeLock = SpinLock> {
    pool: NodePool<L>,
    root: NodeId,
    spin: SpinPolicy,
}

/// Where an insertion attached its node.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Attachment {
    /// The node that received the new child.
    pub parent: NodeId,
    /// The slot of `parent` that was filled.
    pub direction: Direction,
    /// How many times the slot was found already filled under the lock.
    pub retries: usize,
}

/// An in-order iterator over the attached nodes of a [`Tree`].
pub struct Iter<'t, L: NodeLock = SpinLock> {
    tree: &'t Tree<L>,
    stack: Vec<NodeId>,
    next: Option<NodeId>,
}

impl<L: NodeLock> Tree<L> {
    /// Creates a [`Tree`] whose root is the first node of the pool.
    ///
    /// The remaining nodes stay detached until inserted.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptyPool`] if the pool has no node.
    ///
    /// # Examples
    ///
    /// ```
    /// use concurrent_bst::{NodeId, NodePool, Tree};
    ///
    /// let tree: Tree = Tree::new(NodePool::from_keys([50, 30])).unwrap();
    /// assert_eq!(tree.root(), NodeId::new(0));
    /// assert_eq!(tree.len(), 1);
    ///
    /// tree.insert(NodeId::new(1));
    /// assert_eq!(tree.len(), 2);
    /// ```
    #[inline]
    pub fn new(pool: NodePool<L>) -> Result<Self, BuildError> {
        Self::with_spin_policy(pool, SpinPolicy::default())
    }

    /// Creates a [`Tree`] whose insertions wait on contended locks according to `spin`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptyPool`] if the pool has no node.
    pub fn with_spin_policy(pool: NodePool<L>, spin: SpinPolicy) -> Result<Self, BuildError> {
        if pool.is_empty() {
            return Err(BuildError::EmptyPool);
        }
        let root = NodeId::new(0);
        pool[root].mark_attached(None);
        Ok(Self { pool, root, spin })
    }

    /// Builds a [`Tree`] by inserting every non-root node in slot order on the calling thread.
    ///
    /// The result only depends on the sequence of keys.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptyPool`] if the pool has no node.
    ///
    /// # Examples
    ///
    /// ```
    /// use concurrent_bst::{NodePool, Tree};
    ///
    /// let tree: Tree = Tree::build_sequential(NodePool::from_keys([50, 30, 70, 20, 40])).unwrap();
    ///
    /// let root = tree.root_node();
    /// assert_eq!(root.key(), 50);
    /// assert_eq!(tree[root.left().unwrap()].key(), 30);
    /// assert_eq!(tree[root.right().unwrap()].key(), 70);
    /// assert!(tree.iter().map(|(_, n)| n.key()).eq([20, 30, 40, 50, 70]));
    /// ```
    pub fn build_sequential(pool: NodePool<L>) -> Result<Self, BuildError> {
        let tree = Self::new(pool)?;
        debug_log!(nodes = tree.pool.len(), "sequential build started");
        for id in tree.pool.ids().skip(1) {
            tree.insert(id);
        }
        debug_log!(height = tree.height(), "sequential build finished");
        Ok(tree)
    }

    /// Builds a [`Tree`] with the agents described by `config`.
    ///
    /// The non-root nodes are split into contiguous, disjoint partitions of near-equal size, one
    /// per configured agent, and every agent inserts its partition on its own scoped thread. Host
    /// agents take the first partitions, device agents the last. The shape of the result depends
    /// on the interleaving, its in-order sequence does not.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptyPool`] if the pool has no node, and [`BuildError::NoAgents`]
    /// if `config` has no agent.
    ///
    /// # Examples
    ///
    /// ```
    /// use concurrent_bst::{BuildConfig, NodePool, Tree};
    ///
    /// let pool: NodePool = (0..256).rev().collect();
    /// let tree = Tree::build_concurrent(pool, BuildConfig::with_host_agents(4)).unwrap();
    ///
    /// assert_eq!(tree.len(), 256);
    /// assert!(tree.iter().map(|(_, n)| n.key()).eq(0..256));
    /// ```
    pub fn build_concurrent(pool: NodePool<L>, config: BuildConfig) -> Result<Self, BuildError> {
        let agents = config.agents();
        if agents == 0 {
            return Err(BuildError::NoAgents);
        }
        let tree = Self::with_spin_policy(pool, config.spin)?;
        let ids: Vec<NodeId> = tree.pool.ids().skip(1).collect();
        debug_log!(
            nodes = tree.pool.len(),
            host_agents = config.host_agents,
            device_agents = config.device_agents,
            "concurrent build started"
        );

        thread::scope(|s| {
            for agent in 0..agents {
                // Sizes differ by at most one; empty only with fewer nodes than agents.
                let start = agent * ids.len() / agents;
                let end = (agent + 1) * ids.len() / agents;
                let partition = &ids[start..end];
                let origin = if agent < config.host_agents {
                    Origin::Host
                } else {
                    Origin::Device
                };
                let tree = &tree;
                s.spawn(move || {
                    for id in partition {
                        tree.insert_from(*id, origin);
                    }
                });
            }
        });

        debug_log!(height = tree.height(), "concurrent build finished");
        Ok(tree)
    }

    /// Inserts the node as a host agent.
    ///
    /// See [`insert_from`](Tree::insert_from).
    ///
    /// # Panics
    ///
    /// Panics if the node does not belong to the pool of the tree.
    #[inline]
    pub fn insert(&self, id: NodeId) -> Attachment {
        self.insert_from(id, Origin::Host)
    }

    /// Attaches the node to the tree on behalf of an agent of the given [`Origin`].
    ///
    /// The node is linked under the first empty slot on its search path: the left slot of a node
    /// with a greater key, or the right slot of a node with a smaller or equal key. The parent's
    /// [`OwnershipTag`](node::OwnershipTag) advances accordingly.
    ///
    /// The call may run concurrently with insertions of other nodes. It never fails, but it waits
    /// for as long as it takes to win an empty slot.
    ///
    /// Each node must be inserted exactly once and the root must never be inserted; debug builds
    /// assert both, release builds corrupt the tree.
    ///
    /// # Panics
    ///
    /// Panics if the node does not belong to the pool of the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use concurrent_bst::{Direction, NodeId, NodePool, Origin, OwnershipTag, Tree};
    ///
    /// let tree: Tree = Tree::new(NodePool::from_keys([10, 10, 5])).unwrap();
    ///
    /// let attachment = tree.insert(NodeId::new(1));
    /// assert_eq!(attachment.parent, tree.root());
    /// assert_eq!(attachment.direction, Direction::Right);
    /// assert_eq!(tree.root_node().ownership_tag(), OwnershipTag::HostOnly);
    ///
    /// tree.insert_from(NodeId::new(2), Origin::Device);
    /// assert_eq!(tree.root_node().ownership_tag(), OwnershipTag::Mixed);
    /// ```
    pub fn insert_from(&self, id: NodeId, origin: Origin) -> Attachment {
        let node = &self.pool[id];
        debug_assert_ne!(id, self.root, "the root cannot be inserted");
        debug_assert!(!node.is_attached(), "node {id} inserted twice");

        let key = node.key();
        let (mut candidate, mut direction) = self.descend(self.root, key);
        let mut retries = 0;
        loop {
            let locked = Locked::acquire(&self.pool[candidate], self.spin);

            if let Some(child) = locked.child(direction) {
                // Filled since the descent: continue below the node that took the slot.
                drop(locked);
                retries += 1;
                trace_log!(node = %id, slot_owner = %candidate, filled_by = %child, "slot taken");
                (candidate, direction) = self.descend(child, key);
                continue;
            }

            node.mark_attached(Some(candidate));
            locked.link_child(direction, id, origin);
            drop(locked);
            trace_log!(node = %id, parent = %candidate, ?direction, retries, "attached");
            return Attachment {
                parent: candidate,
                direction,
                retries,
            };
        }
    }

    /// Returns the identity of the root.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the root node.
    #[inline]
    pub fn root_node(&self) -> &Node<L> {
        &self.pool[self.root]
    }

    /// Returns the node in the given slot, or `None` if the slot does not exist.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<L>> {
        self.pool.get(id)
    }

    /// Returns the underlying pool.
    #[inline]
    pub fn pool(&self) -> &NodePool<L> {
        &self.pool
    }

    /// Consumes the tree and returns its pool.
    #[inline]
    pub fn into_pool(self) -> NodePool<L> {
        self.pool
    }

    /// Returns the number of attached nodes, the root included.
    ///
    /// # Examples
    ///
    /// ```
    /// use concurrent_bst::{NodeId, NodePool, Tree};
    ///
    /// let tree: Tree = Tree::new(NodePool::from_keys([1, 2, 3])).unwrap();
    /// tree.insert(NodeId::new(2));
    /// assert_eq!(tree.len(), 2);
    /// ```
    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub fn len(&self) -> usize {
        self.pool.nodes().filter(|n| n.is_attached()).count()
    }

    /// Returns `true` if only the root is attached.
    ///
    /// A tree always holds its root, so [`len`](Tree::len) never drops below one.
    #[inline]
    pub fn has_only_root(&self) -> bool {
        self.len() <= 1
    }

    /// Returns the number of nodes on the longest root-to-leaf path.
    ///
    /// Keys inserted in monotonic order degenerate the tree into a chain as high as the number
    /// of nodes.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((id, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.pool[id];
            stack.extend(node.left().map(|c| (c, depth + 1)));
            stack.extend(node.right().map(|c| (c, depth + 1)));
        }
        height
    }

    /// Returns an in-order iterator over the attached nodes.
    ///
    /// Nodes with equal keys are yielded in the order they sit along the right spine, which for a
    /// sequential build is their insertion order.
    ///
    /// # Examples
    ///
    /// ```
    /// use concurrent_bst::{NodePool, Tree};
    ///
    /// let tree: Tree = Tree::build_sequential(NodePool::from_keys([3, 1, 2, 3])).unwrap();
    /// let ids: Vec<usize> = tree.iter().map(|(id, _)| id.index()).collect();
    /// assert_eq!(ids, [1, 2, 0, 3]);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, L> {
        Iter {
            tree: self,
            stack: Vec::new(),
            next: Some(self.root),
        }
    }

    /// Checks the structural invariants of a quiescent tree.
    ///
    /// Every node reachable from the root must be marked attached, must respect the key bounds
    /// of all its ancestors, must name as parent the node linking to it, and must not be locked.
    /// Every node marked attached must be reachable.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    ///
    /// # Examples
    ///
    /// ```
    /// use concurrent_bst::{BuildConfig, NodePool, Tree};
    ///
    /// let pool: NodePool = NodePool::with_random_keys(1024, 42);
    /// let tree = Tree::build_concurrent(pool, BuildConfig::with_host_agents(8)).unwrap();
    /// assert!(tree.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        // Lower bounds are inclusive, upper bounds exclusive.
        struct Bounds {
            lower: Option<NodeId>,
            upper: Option<NodeId>,
        }

        let mut reached = vec![false; self.pool.len()];
        let mut stack = vec![(
            self.root,
            Bounds {
                lower: None,
                upper: None,
            },
        )];
        while let Some((id, bounds)) = stack.pop() {
            let node = &self.pool[id];
            if !node.is_attached() {
                return Err(InvariantViolation::Unattached(id));
            }
            if node.lock().is_locked() {
                return Err(InvariantViolation::LockHeld(id));
            }
            if let Some(ancestor) = bounds.lower {
                if node.key() < self.pool[ancestor].key() {
                    return Err(InvariantViolation::Ordering {
                        node: id,
                        ancestor,
                        direction: Direction::Right,
                    });
                }
            }
            if let Some(ancestor) = bounds.upper {
                if node.key() >= self.pool[ancestor].key() {
                    return Err(InvariantViolation::Ordering {
                        node: id,
                        ancestor,
                        direction: Direction::Left,
                    });
                }
            }
            reached[id.index()] = true;

            for direction in [Direction::Left, Direction::Right] {
                let Some(child) = node.child(direction) else {
                    continue;
                };
                if !self.pool[child].is_attached() {
                    return Err(InvariantViolation::Unattached(child));
                }
                if reached[child.index()] || self.pool[child].parent() != Some(id) {
                    return Err(InvariantViolation::ParentMismatch {
                        node: child,
                        linked_from: id,
                    });
                }
                let bounds = match direction {
                    Direction::Left => Bounds {
                        lower: bounds.lower,
                        upper: Some(id),
                    },
                    Direction::Right => Bounds {
                        lower: Some(id),
                        upper: bounds.upper,
                    },
                };
                stack.push((child, bounds));
            }
        }

        match self
            .pool
            .ids()
            .find(|id| self.pool[*id].is_attached() && !reached[id.index()])
        {
            Some(id) => Err(InvariantViolation::Unreachable(id)),
            None => Ok(()),
        }
    }

    /// Returns the empty slot `key` would fill below `from`, without locking.
    #[inline]
    fn descend(&self, from: NodeId, key: i64) -> (NodeId, Direction) {
        let mut current = from;
        loop {
            let node = &self.pool[current];
            let direction = Direction::of(key, node.key());
            match node.child(direction) {
                Some(child) => current = child,
                None => return (current, direction),
            }
        }
    }
}

impl<L: NodeLock> std::ops::Index<NodeId> for Tree<L> {
    type Output = Node<L>;

    #[inline]
    fn index(&self, id: NodeId) -> &Self::Output {
        &self.pool[id]
    }
}

impl<L: NodeLock> fmt::Debug for Tree<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("spin", &self.spin)
            .field("pool", &self.pool)
            .finish()
    }
}

impl<'t, L: NodeLock> IntoIterator for &'t Tree<L> {
    type Item = (NodeId, &'t Node<L>);
    type IntoIter = Iter<'t, L>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'t, L: NodeLock> Iterator for Iter<'t, L> {
    type Item = (NodeId, &'t Node<L>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.next.take() {
            self.stack.push(id);
            self.next = self.tree.pool[id].left();
        }
        let id = self.stack.pop()?;
        let node = &self.tree.pool[id];
        self.next = node.right();
        Some((id, node))
    }
}

impl<L: NodeLock> FusedIterator for Iter<'_, L> {}
