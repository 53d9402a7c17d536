#![allow(clippy::module_name_repetitions)]

use super::node::{Direction, NodeId};
use std::error::Error;
use std::fmt;

/// [`BuildError`] types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildError {
    /// EmptyPool: the pool has no node to become the root.
    EmptyPool,
    /// NoAgents: a concurrent build was configured without any agent.
    NoAgents,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::EmptyPool => f.write_str("the node pool is empty"),
            BuildError::NoAgents => f.write_str("no insertion agent configured"),
        }
    }
}

impl Error for BuildError {}

/// [`InvariantViolation`] types reported by [`Tree::validate`](super::Tree::validate).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvariantViolation {
    /// Ordering: a node sits in the wrong subtree of an ancestor.
    Ordering {
        /// The misplaced node.
        node: NodeId,
        /// The ancestor whose key bound is broken.
        ancestor: NodeId,
        /// The subtree of `ancestor` the node was found in.
        direction: Direction,
    },
    /// ParentMismatch: a child link and the child's parent link disagree.
    ParentMismatch {
        /// The child.
        node: NodeId,
        /// The node linking to it.
        linked_from: NodeId,
    },
    /// Unattached: a reachable node is not marked attached.
    Unattached(NodeId),
    /// Unreachable: a node marked attached cannot be reached from the root.
    Unreachable(NodeId),
    /// LockHeld: a node's lock is still held.
    LockHeld(NodeId),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::Ordering {
                node,
                ancestor,
                direction,
            } => write!(
                f,
                "node {node} is out of order in the {direction:?} subtree of {ancestor}"
            ),
            InvariantViolation::ParentMismatch { node, linked_from } => write!(
                f,
                "node {node} is linked from {linked_from} but records a different parent"
            ),
            InvariantViolation::Unattached(node) => {
                write!(f, "node {node} is reachable but not marked attached")
            }
            InvariantViolation::Unreachable(node) => {
                write!(f, "node {node} is marked attached but unreachable from the root")
            }
            InvariantViolation::LockHeld(node) => write!(f, "node {node} is still locked"),
        }
    }
}

impl Error for InvariantViolation {}
