//! The flattened forest.
//!
//! Every node lives in one arena (`Forest::nodes`) and is addressed by a
//! [`TreeNodeId`]. Every root additionally owns a [`FlatSeq`]: the handles of its
//! whole tree in depth-first pre-order. Non-root nodes own an empty sequence.
//!
//! *   [`node`]: the per-node record and its bookkeeping fields.
//! *   [`flat_seq`]: the backing sequence and its range operations.
//! *   [`structure`]: reparenting, detaching and removal.
//! *   [`roots`]: root registration and forest-wide indexing.
//! *   [`query`]: read-only accessors and traversal.
//! *   [`iterato`]: the iterator types returned by [`query`].
//! *   [`validate`]: the invariant checker and the debug drawing.

use std::{
    fmt,
    ops::{Index, IndexMut},
    sync::atomic::{AtomicU32, Ordering},
};

use derive_more::Into;
use thiserror::Error;
use tracing::error;

use crate::{config::ForestOptions, event::ForestListeners};

pub mod flat_seq;
pub mod iterato;
pub mod node;
pub mod query;
pub mod roots;
pub mod structure;
pub mod validate;

pub use flat_seq::FlatSeq;
pub use iterato::{AncestorsIter, DirectChildren};
pub use node::{Membership, NodeRecord};

static NEXT_FOREST_ID: AtomicU32 = AtomicU32::new(0);

/// Identifies one [`Forest`] instance. Every handle carries the id of the forest
/// that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForestId(u32);

impl ForestId {
    fn fresh() -> Self {
        ForestId(NEXT_FOREST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A stable handle to a node of a [`Forest`].
///
/// Handles stay valid for the lifetime of the forest, including after the node has
/// been removed; operations on a removed node fail with [`ForestError::Removed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeNodeId {
    pub(crate) forest: ForestId,
    pub(crate) slot: usize,
}

impl TreeNodeId {
    /// The arena slot of this node. Slots are handed out in creation order.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn forest(&self) -> ForestId {
        self.forest
    }
}

impl fmt::Display for TreeNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.slot)
    }
}

/// Traversal direction for the callback based walkers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

/// Coarse classification of a [`ForestError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A handle, index or parent argument was unusable.
    InvalidArgument,
    /// The requested parent is a descendant of the node being moved.
    Cycle,
    /// The node is in the wrong lifecycle state for the operation.
    State,
    /// The invariant checker found an inconsistency.
    Corruption,
}

/// Errors that can occur during forest operations. No variant is ever returned after
/// a structure has been partially modified.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ForestError {
    #[error("Invalid TreeNodeId: {0}")]
    InvalidNodeId(TreeNodeId),
    #[error("Node {0} belongs to a different forest")]
    ForeignNode(TreeNodeId),
    #[error("Node {0} cannot be its own parent")]
    SelfParent(TreeNodeId),
    #[error("Node {node} and parent {parent} do not belong to the same forest")]
    MembershipMismatch {
        node: TreeNodeId,
        parent: TreeNodeId,
    },
    #[error("Index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Parent {parent} is a descendant of node {node}")]
    Cycle {
        node: TreeNodeId,
        parent: TreeNodeId,
    },
    #[error("Node {0} is not a root")]
    NotRoot(TreeNodeId),
    #[error("Node {0} is already registered with the forest")]
    AlreadyRegistered(TreeNodeId),
    #[error("Node {0} is not registered with the forest")]
    NotRegistered(TreeNodeId),
    #[error("Node {0} has been removed from the forest")]
    Removed(TreeNodeId),
    #[error("Forest invariant violated: {0}")]
    Corrupt(String),
}

impl ForestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForestError::InvalidNodeId(_)
            | ForestError::ForeignNode(_)
            | ForestError::SelfParent(_)
            | ForestError::MembershipMismatch { .. }
            | ForestError::IndexOutOfRange { .. } => ErrorKind::InvalidArgument,
            ForestError::Cycle { .. } => ErrorKind::Cycle,
            ForestError::NotRoot(_)
            | ForestError::AlreadyRegistered(_)
            | ForestError::NotRegistered(_)
            | ForestError::Removed(_) => ErrorKind::State,
            ForestError::Corrupt(_) => ErrorKind::Corruption,
        }
    }
}

/// The fail-fast path. A sequence whose indices were partially shifted leaves every
/// node sharing it with meaningless positions, so execution must not continue.
#[cold]
#[track_caller]
pub(crate) fn corrupted(detail: &str) -> ! {
    error!(detail, "forest invariant corrupted");
    panic!("forest invariant corrupted: {detail}")
}

/// A collection of independently rooted trees, each stored flattened.
///
/// `V` is the payload attached to every node.
#[derive(Debug)]
pub struct Forest<V> {
    pub(crate) id: ForestId,
    pub(crate) options: ForestOptions,
    /// Arena of every node ever created by this forest.
    pub(crate) nodes: Vec<NodeRecord<V>>,
    /// Registered roots in registration order.
    pub(crate) roots: Vec<TreeNodeId>,
    /// Sum of the subtree sizes of all registered roots.
    pub(crate) total_count: usize,
    pub(crate) listeners: ForestListeners,
    pub(crate) next_listener: u64,
}

impl<V> Default for Forest<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Forest<V> {
    pub fn new() -> Self {
        Self::with_options(ForestOptions::default())
    }

    pub fn with_options(options: ForestOptions) -> Self {
        Forest {
            id: ForestId::fresh(),
            options,
            nodes: Vec::new(),
            roots: Vec::new(),
            total_count: 0,
            listeners: ForestListeners::default(),
            next_listener: 0,
        }
    }

    pub fn id(&self) -> ForestId {
        self.id
    }

    pub fn options(&self) -> &ForestOptions {
        &self.options
    }

    /// Creates a single-node tree. The new root is not registered: call
    /// [`Forest::add_root`] to make it part of the forest, or use
    /// [`Forest::insert_root`] to do both at once.
    pub fn create_node(&mut self, data: V) -> TreeNodeId {
        let id = TreeNodeId {
            forest: self.id,
            slot: self.nodes.len(),
        };
        let mut seq = FlatSeq::with_capacity(self.options.sequence_capacity);
        seq.push(id);
        self.nodes.push(NodeRecord::new_root(id, seq, data));
        id
    }

    /// Validates a handle and returns its record.
    pub(crate) fn check(&self, id: TreeNodeId) -> Result<&NodeRecord<V>, ForestError> {
        if id.forest != self.id {
            return Err(ForestError::ForeignNode(id));
        }
        self.nodes.get(id.slot).ok_or(ForestError::InvalidNodeId(id))
    }

    /// Like [`Forest::check`], but also rejects nodes of removed trees.
    pub(crate) fn check_live(&self, id: TreeNodeId) -> Result<&NodeRecord<V>, ForestError> {
        let record = self.check(id)?;
        if self.rec(record.root).membership == Membership::Removed {
            return Err(ForestError::Removed(id));
        }
        Ok(record)
    }

    pub(crate) fn rec(&self, id: TreeNodeId) -> &NodeRecord<V> {
        &self.nodes[id.slot]
    }

    pub(crate) fn rec_mut(&mut self, id: TreeNodeId) -> &mut NodeRecord<V> {
        &mut self.nodes[id.slot]
    }

    /// Membership of the tree `id` belongs to, read from its root.
    pub(crate) fn tree_membership(&self, id: TreeNodeId) -> Membership {
        self.rec(self.rec(id).root).membership
    }

    /// Runs the invariant checker if the options ask for it.
    pub(crate) fn verify(&self) {
        if self.options.verify_invariants {
            if let Err(e) = self.validate() {
                corrupted(&e.to_string());
            }
        }
    }
}

impl<V> Index<TreeNodeId> for Forest<V> {
    type Output = V;
    fn index(&self, index: TreeNodeId) -> &Self::Output {
        match self.check(index) {
            Ok(record) => &record.data,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<V> IndexMut<TreeNodeId> for Forest<V> {
    fn index_mut(&mut self, index: TreeNodeId) -> &mut Self::Output {
        if let Err(e) = self.check(index) {
            panic!("{e}");
        }
        &mut self.rec_mut(index).data
    }
}
