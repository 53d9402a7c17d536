use super::{NodeLock, NodePool};

use serde::de::{Deserialize, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde::Deserializer;

use std::fmt;
use std::marker::PhantomData;

/// Deserializes a sequence of keys into a detached [`NodePool`].
pub struct NodePoolVisitor<L: NodeLock> {
    marker: PhantomData<fn() -> NodePool<L>>,
}

impl<L: NodeLock> NodePoolVisitor<L> {
    fn new() -> Self {
        NodePoolVisitor {
            marker: PhantomData,
        }
    }
}

impl<'de, L: NodeLock> Visitor<'de> for NodePoolVisitor<L> {
    type Value = NodePool<L>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence of node keys")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut keys = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(key) = access.next_element::<i64>()? {
            keys.push(key);
        }
        Ok(NodePool::from_keys(keys))
    }
}

impl<'de, L: NodeLock> Deserialize<'de> for NodePool<L> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(NodePoolVisitor::<L>::new())
    }
}

/// Only the keys are written, in slot order; links, tags and lock states are not.
impl<L: NodeLock> Serialize for NodePool<L> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for key in self.keys() {
            seq.serialize_element(&key)?;
        }
        seq.end()
    }
}
