//! Root registration and forest-wide indexing.

use tracing::debug;

use super::{Forest, ForestError, Membership, TreeNodeId};
use crate::event::Outbox;

impl<V> Forest<V> {
    /// Registers the root `node` (and with it its tree) with the forest.
    ///
    /// # Errors
    ///
    /// * [`ForestError::NotRoot`] if `node` has a parent.
    /// * [`ForestError::AlreadyRegistered`] if the tree is registered already.
    /// * [`ForestError::Removed`] if the tree was removed.
    pub fn add_root(&mut self, node: TreeNodeId) -> Result<(), ForestError> {
        self.add_root_inner(node)?.deliver();
        Ok(())
    }

    /// Creates a node and registers it as a new root.
    pub fn insert_root(&mut self, data: V) -> TreeNodeId {
        let node = self.create_node(data);
        match self.add_root_inner(node) {
            Ok(outbox) => outbox.deliver(),
            Err(e) => super::corrupted(&format!("fresh node {node} refused registration: {e}")),
        }
        node
    }

    /// Deregisters the root `node`. Its tree is marked removed and the forest fires
    /// `root_removed`; the nodes themselves get no `removed` notification (see
    /// [`Forest::remove`]).
    pub fn remove_root(&mut self, node: TreeNodeId) -> Result<(), ForestError> {
        self.remove_root_inner(node)?.deliver();
        Ok(())
    }

    /// Removes every registered root, the most recently registered first.
    pub fn clear(&mut self) {
        self.clear_inner().deliver();
    }

    /// Resolves a forest-wide flattened index. Roots are scanned in registration
    /// order; inside the matching tree the index is a direct sequence lookup.
    pub fn node_at(&self, index: usize) -> Result<TreeNodeId, ForestError> {
        let mut offset = 0;
        for &root in &self.roots {
            let record = self.rec(root);
            let len = record.subtree_len();
            if index < offset + len {
                return Ok(record.seq[index - offset]);
            }
            offset += len;
        }
        Err(ForestError::IndexOutOfRange {
            index,
            len: self.total_count,
        })
    }

    pub(crate) fn clear_inner(&mut self) -> Outbox {
        debug!(roots = self.roots.len(), "clear");
        let mut outbox = Outbox::default();
        while let Some(&root) = self.roots.last() {
            match self.remove_inner(root) {
                Ok(removed) => outbox.append(removed),
                Err(e) => super::corrupted(&format!("registered root {root} refused removal: {e}")),
            }
        }
        outbox
    }

    pub(crate) fn add_root_inner(&mut self, node: TreeNodeId) -> Result<Outbox, ForestError> {
        let record = self.check(node)?;
        if !record.is_root() {
            return Err(ForestError::NotRoot(node));
        }
        match record.membership {
            Membership::Registered => return Err(ForestError::AlreadyRegistered(node)),
            Membership::Removed => return Err(ForestError::Removed(node)),
            Membership::Unregistered => {}
        }
        let size = record.subtree_len();

        self.rec_mut(node).membership = Membership::Registered;
        self.roots.push(node);
        self.total_count += size;
        debug!(%node, size, total = self.total_count, "root added");
        self.verify();

        let mut outbox = Outbox::default();
        outbox.push(&self.listeners.root_added, node);
        Ok(outbox)
    }

    pub(crate) fn remove_root_inner(&mut self, node: TreeNodeId) -> Result<Outbox, ForestError> {
        let record = self.check(node)?;
        if !record.is_root() {
            return Err(ForestError::NotRoot(node));
        }
        match record.membership {
            Membership::Unregistered => return Err(ForestError::NotRegistered(node)),
            Membership::Removed => return Err(ForestError::Removed(node)),
            Membership::Registered => {}
        }
        let size = record.subtree_len();
        let Some(index) = self.roots.iter().position(|r| *r == node) else {
            super::corrupted(&format!("registered root {node} is missing from the roots"));
        };

        self.roots.remove(index);
        self.total_count = self.total_count.checked_sub(size).unwrap_or_else(|| {
            super::corrupted(&format!("total count is below the {size} nodes of {node}"))
        });
        self.rec_mut(node).membership = Membership::Removed;
        debug!(%node, size, total = self.total_count, "root removed");
        self.verify();

        let mut outbox = Outbox::default();
        outbox.push(&self.listeners.root_removed, node);
        Ok(outbox)
    }
}
