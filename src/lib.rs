//! # Flatforest
//!
//! Flatforest is a pointer-free forest: any number of independent trees, each one
//! stored as a single contiguous sequence of node handles in depth-first pre-order.
//! Nodes never hold links to their children. A node only knows its position in its
//! root's sequence, how many descendants it has, how many direct children it has,
//! its parent and its root. From those numbers every structural query falls out:
//!
//! *   the subtree of a node is the slice `[position, position + descendant_count]`,
//! *   the first child sits at `position + 1`,
//! *   the next sibling sits at `position + descendant_count + 1`.
//!
//! Structural edits ([`Forest::reparent`], [`Forest::detach`], [`Forest::remove`])
//! move whole slices between or within sequences and then fix up the counts on the
//! affected ancestor chains, so their cost is proportional to the size of the moved
//! subtree plus the length of the shifted window.
//!
//! The main entry points are:
//! *   [`Forest<V>`]: the arena owning every node and the set of registered roots.
//! *   [`TreeNodeId`]: the stable handle of a node.
//! *   [`SharedForest<V>`]: a cloneable handle that serialises every operation on a
//!     forest behind one lock, for use across threads.
//! *   [`ForestOptions`]: tuning knobs such as invariant verification.
//!
//! ## Notifications
//!
//! Nodes carry `parent_changed`, `children_changed` and `removed` listener lists, and
//! the forest carries `root_added` and `root_removed`. Listener lists are copy on
//! write: a mutation snapshots the lists it needs while the structure is being
//! edited and calls them once the edit is complete. Subscribing or unsubscribing
//! never affects a dispatch that is already under way.
//!
//! ## Corruption is fatal
//!
//! Every precondition of a structural edit is checked before a single index moves,
//! and invalid requests come back as a [`ForestError`]. If an invariant nevertheless
//! fails half way through an edit, the positions of every node sharing the touched
//! sequence are unreliable, so the engine does not try to recover: it logs the
//! problem and panics. Callers should treat such a panic as a bug in this crate.

#![forbid(unsafe_code)]

pub mod config;
pub mod event;
pub mod shared;
pub mod tree;

pub use config::ForestOptions;
pub use event::{ForestEvent, ListenerId, NodeEvent};
pub use shared::SharedForest;
pub use tree::{
    Direction, ErrorKind, Forest, ForestError, ForestId, Membership, TreeNodeId,
};
