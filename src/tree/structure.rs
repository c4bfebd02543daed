//! Reparenting, detaching and removal.
//!
//! Every public operation here is split in two phases. The first phase validates
//! all preconditions and gathers what the second phase needs (subtree size,
//! ancestor chains, insertion point) without touching any index. The second phase
//! only uses infallible moves: a rotation inside one sequence, or a drain and a
//! splice between two. Count updates follow, then notifications are collected into
//! an [`Outbox`] that the public wrapper delivers once the forest is consistent.

use std::ops::Range;

use tracing::{debug, trace};

use super::{corrupted, FlatSeq, Forest, ForestError, Membership, TreeNodeId};
use crate::event::Outbox;

impl<V> Forest<V> {
    /// Makes `node`, with its whole subtree, the last child of `parent`.
    ///
    /// If `node` already has a parent it is detached from it first. Reparenting a
    /// node under its current parent does nothing.
    ///
    /// # Errors
    ///
    /// * [`ForestError::SelfParent`] if `node == parent`.
    /// * [`ForestError::Removed`] if either node belongs to a removed tree.
    /// * [`ForestError::Cycle`] if `parent` lies inside the subtree of `node`.
    /// * [`ForestError::MembershipMismatch`] if exactly one of the two trees is
    ///   registered with the forest.
    ///
    /// Nothing is modified when an error is returned.
    pub fn reparent(&mut self, node: TreeNodeId, parent: TreeNodeId) -> Result<(), ForestError> {
        self.reparent_inner(node, parent)?.deliver();
        Ok(())
    }

    /// Turns `node` into the root of its own tree, keeping the membership of the
    /// tree it leaves. If that tree is registered, `node` is appended to the roots.
    /// Detaching a root does nothing.
    pub fn detach(&mut self, node: TreeNodeId) -> Result<(), ForestError> {
        self.detach_inner(node)?.deliver();
        Ok(())
    }

    /// Removes the registered root `node` and its whole tree from the forest.
    ///
    /// Every node of the tree receives exactly one `removed` notification, in
    /// pre-order, followed by the forest's `root_removed` notification. Removed nodes
    /// keep their handles but reject further structural operations.
    pub fn remove(&mut self, node: TreeNodeId) -> Result<(), ForestError> {
        self.remove_inner(node)?.deliver();
        Ok(())
    }

    /// Creates a node and makes it the last child of `parent`.
    pub fn add_child(&mut self, parent: TreeNodeId, data: V) -> Result<TreeNodeId, ForestError> {
        let (child, outbox) = self.add_child_inner(parent, data)?;
        outbox.deliver();
        Ok(child)
    }

    /// A fresh node may join a tree of any membership, so the membership check of
    /// [`Forest::reparent`] is skipped.
    pub(crate) fn add_child_inner(
        &mut self,
        parent: TreeNodeId,
        data: V,
    ) -> Result<(TreeNodeId, Outbox), ForestError> {
        self.check_live(parent)?;
        let child = self.create_node(data);
        Ok((child, self.move_under(child, parent)))
    }

    pub(crate) fn reparent_inner(
        &mut self,
        node: TreeNodeId,
        parent: TreeNodeId,
    ) -> Result<Outbox, ForestError> {
        self.check_live(node)?;
        self.check_live(parent)?;
        if node == parent {
            return Err(ForestError::SelfParent(node));
        }
        if self.is_ancestor_of(node, parent)? {
            return Err(ForestError::Cycle { node, parent });
        }
        if self.tree_membership(node) != self.tree_membership(parent) {
            return Err(ForestError::MembershipMismatch { node, parent });
        }
        if self.rec(node).parent == Some(parent) {
            return Ok(Outbox::default());
        }
        Ok(self.move_under(node, parent))
    }

    /// The infallible half of a reparent. Every precondition has been checked.
    fn move_under(&mut self, node: TreeNodeId, parent: TreeNodeId) -> Outbox {
        let previous = self.rec(node).parent;
        let moved = self.rec(node).subtree_len();
        let old_ancestors = self.ancestor_chain(node);
        let mut new_ancestors = vec![parent];
        new_ancestors.extend(self.ancestor_chain(parent));
        debug!(
            %node,
            %parent,
            previous = ?previous.map(|p| p.to_string()),
            moved,
            "reparent"
        );

        if self.rec(node).root == self.rec(parent).root {
            self.relocate_within(node, parent, moved);
        } else {
            self.relocate_across(node, parent, moved);
        }

        if let Some(previous) = previous {
            self.lose_child(previous, &old_ancestors, moved);
        }
        self.rec_mut(parent).direct_child_count += 1;
        for &ancestor in &new_ancestors {
            self.rec_mut(ancestor).descendant_count += moved;
        }
        self.rec_mut(node).parent = Some(parent);
        self.verify();

        let mut outbox = Outbox::default();
        for &ancestor in &old_ancestors {
            outbox.push(&self.rec(ancestor).listeners.children_changed, ancestor);
        }
        outbox.push(&self.rec(node).listeners.children_changed, node);
        for &ancestor in &new_ancestors {
            outbox.push(&self.rec(ancestor).listeners.children_changed, ancestor);
        }
        self.push_parent_changed(node, &mut outbox);
        outbox
    }

    pub(crate) fn detach_inner(&mut self, node: TreeNodeId) -> Result<Outbox, ForestError> {
        self.check_live(node)?;
        let Some(previous) = self.rec(node).parent else {
            return Ok(Outbox::default());
        };

        let moved = self.rec(node).subtree_len();
        let old_ancestors = self.ancestor_chain(node);
        let old_root = self.rec(node).root;
        let membership = self.rec(old_root).membership;
        let from = self.rec(node).position;
        debug!(%node, %previous, moved, "detach");

        let mut seq = FlatSeq::with_capacity(self.options.sequence_capacity.max(moved));
        seq.insert_range(0, self.rec_mut(old_root).seq.remove_range(from, moved));
        let old_len = self.rec(old_root).seq.len();
        self.renumber(old_root, from..old_len);

        let record = self.rec_mut(node);
        record.seq = seq;
        record.parent = None;
        record.membership = membership;
        self.renumber(node, 0..moved);
        self.reassign_root(node, 0..moved);

        self.lose_child(previous, &old_ancestors, moved);
        if membership == Membership::Registered {
            self.roots.push(node);
        }
        self.verify();

        let mut outbox = Outbox::default();
        for &ancestor in &old_ancestors {
            outbox.push(&self.rec(ancestor).listeners.children_changed, ancestor);
        }
        self.push_parent_changed(node, &mut outbox);
        Ok(outbox)
    }

    pub(crate) fn remove_inner(&mut self, node: TreeNodeId) -> Result<Outbox, ForestError> {
        let deregistered = self.remove_root_inner(node)?;
        let mut outbox = Outbox::default();
        for &id in self.subtree_slice(node) {
            outbox.push(&self.rec(id).listeners.removed, id);
        }
        outbox.append(deregistered);
        Ok(outbox)
    }

    /// Moves the subtree of `node` to the end of `parent`'s subtree when both share
    /// one sequence.
    fn relocate_within(&mut self, node: TreeNodeId, parent: TreeNodeId, moved: usize) {
        let root = self.rec(node).root;
        let from = self.rec(node).position;
        let dest = self.rec(parent).subtree_end() + 1;
        let window = self.rec_mut(root).seq.rotate_window(from, moved, dest);
        self.renumber(root, window);
    }

    /// Moves the subtree of `node` out of its sequence and splices it in after
    /// `parent`'s subtree in the parent's sequence. `total_count` follows the nodes
    /// when they enter or leave a registered tree.
    fn relocate_across(&mut self, node: TreeNodeId, parent: TreeNodeId, moved: usize) {
        let old_root = self.rec(node).root;
        let new_root = self.rec(parent).root;
        let was_counted = self.rec(old_root).membership == Membership::Registered;
        let is_counted = self.rec(new_root).membership == Membership::Registered;
        let from = self.rec(node).position;
        let dest = self.rec(parent).subtree_end() + 1;

        let range = self.rec_mut(old_root).seq.remove_range(from, moved);
        self.rec_mut(new_root).seq.insert_range(dest, range);

        let old_len = self.rec(old_root).seq.len();
        self.renumber(old_root, from..old_len);
        let new_len = self.rec(new_root).seq.len();
        self.renumber(new_root, dest..new_len);
        self.reassign_root(new_root, dest..dest + moved);

        if old_root == node {
            // The whole tree moved; `node` stops being a root.
            self.unlist_root(node);
            self.rec_mut(node).membership = Membership::Unregistered;
        }
        match (was_counted, is_counted) {
            (false, true) => self.total_count += moved,
            (true, false) => {
                self.total_count = self.total_count.checked_sub(moved).unwrap_or_else(|| {
                    corrupted(&format!("total count is below the {moved} nodes leaving it"))
                })
            }
            _ => {}
        }
    }

    /// Takes `moved` nodes away from `previous` and every node in `ancestors`
    /// (which starts with `previous`).
    fn lose_child(&mut self, previous: TreeNodeId, ancestors: &[TreeNodeId], moved: usize) {
        let record = self.rec_mut(previous);
        record.direct_child_count = record
            .direct_child_count
            .checked_sub(1)
            .unwrap_or_else(|| corrupted(&format!("{previous} lost a child it did not have")));
        for &ancestor in ancestors {
            let record = self.rec_mut(ancestor);
            record.descendant_count = record
                .descendant_count
                .checked_sub(moved)
                .unwrap_or_else(|| {
                    corrupted(&format!("{ancestor} has fewer than {moved} descendants"))
                });
        }
    }

    /// Writes each slot's index into the record of the node stored there.
    pub(crate) fn renumber(&mut self, root: TreeNodeId, window: Range<usize>) {
        trace!(%root, start = window.start, end = window.end, "renumber");
        let seq = std::mem::take(&mut self.rec_mut(root).seq);
        for position in window {
            self.nodes[seq[position].slot].position = position;
        }
        self.rec_mut(root).seq = seq;
    }

    fn reassign_root(&mut self, root: TreeNodeId, window: Range<usize>) {
        let seq = std::mem::take(&mut self.rec_mut(root).seq);
        for position in window {
            self.nodes[seq[position].slot].root = root;
        }
        self.rec_mut(root).seq = seq;
    }

    /// Drops `node` from the registered roots without touching `total_count`: its
    /// nodes stay in the forest as part of another registered tree.
    fn unlist_root(&mut self, node: TreeNodeId) {
        if let Some(index) = self.roots.iter().position(|r| *r == node) {
            self.roots.remove(index);
        }
    }

    fn push_parent_changed(&self, node: TreeNodeId, outbox: &mut Outbox) {
        for &id in self.subtree_slice(node) {
            outbox.push(&self.rec(id).listeners.parent_changed, id);
        }
    }
}
