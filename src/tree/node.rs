use super::{FlatSeq, TreeNodeId};
use crate::event::NodeListeners;

/// Lifecycle state of a tree with respect to its forest.
///
/// Only roots store a meaningful membership; every other node resolves it through
/// its root, so a tree changes state in O(1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Membership {
    /// Created but never added with [`Forest::add_root`](super::Forest::add_root).
    #[default]
    Unregistered,
    /// Listed among the forest's roots, or part of such a tree.
    Registered,
    /// Removed from the forest. Terminal.
    Removed,
}

/// Bookkeeping for one node.
///
/// The subtree of the node occupies `[position, position + descendant_count]` of
/// the sequence owned by `root`.
#[derive(Clone, Debug)]
pub struct NodeRecord<V> {
    pub(crate) position: usize,
    /// Nodes strictly below this one.
    pub(crate) descendant_count: usize,
    pub(crate) direct_child_count: usize,
    pub(crate) parent: Option<TreeNodeId>,
    pub(crate) root: TreeNodeId,
    /// Only read on roots.
    pub(crate) membership: Membership,
    /// The flattened tree. Empty unless this node is a root.
    pub(crate) seq: FlatSeq,
    pub(crate) data: V,
    pub(crate) listeners: NodeListeners,
}

impl<V> NodeRecord<V> {
    pub(crate) fn new_root(id: TreeNodeId, seq: FlatSeq, data: V) -> Self {
        NodeRecord {
            position: 0,
            descendant_count: 0,
            direct_child_count: 0,
            parent: None,
            root: id,
            membership: Membership::Unregistered,
            seq,
            data,
            listeners: NodeListeners::default(),
        }
    }

    /// Number of slots the subtree rooted here occupies.
    pub fn subtree_len(&self) -> usize {
        self.descendant_count + 1
    }

    /// Last slot of the subtree, inclusive.
    pub(crate) fn subtree_end(&self) -> usize {
        self.position + self.descendant_count
    }

    /// Whether `position` lies strictly inside this node's subtree.
    pub(crate) fn covers(&self, position: usize) -> bool {
        self.position < position && position <= self.subtree_end()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn descendant_count(&self) -> usize {
        self.descendant_count
    }

    pub fn direct_child_count(&self) -> usize {
        self.direct_child_count
    }

    pub fn parent(&self) -> Option<TreeNodeId> {
        self.parent
    }

    pub fn root(&self) -> TreeNodeId {
        self.root
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn data(&self) -> &V {
        &self.data
    }
}
