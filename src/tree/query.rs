//! Read-only accessors and traversal.
//!
//! Everything here is answered from the flattened layout: positions and counts give
//! the subtree range, and stepping over a child's subtree lands on the next sibling.

use std::ops::ControlFlow;

use super::{
    AncestorsIter, Direction, DirectChildren, Forest, ForestError, Membership, NodeRecord,
    TreeNodeId,
};

impl<V> Forest<V> {
    /// The full record of a node.
    pub fn node(&self, id: TreeNodeId) -> Result<&NodeRecord<V>, ForestError> {
        self.check(id)
    }

    pub fn data(&self, id: TreeNodeId) -> Result<&V, ForestError> {
        Ok(&self.check(id)?.data)
    }

    pub fn data_mut(&mut self, id: TreeNodeId) -> Result<&mut V, ForestError> {
        self.check(id)?;
        Ok(&mut self.rec_mut(id).data)
    }

    pub fn parent(&self, id: TreeNodeId) -> Result<Option<TreeNodeId>, ForestError> {
        Ok(self.check(id)?.parent)
    }

    pub fn root(&self, id: TreeNodeId) -> Result<TreeNodeId, ForestError> {
        Ok(self.check(id)?.root)
    }

    pub fn position(&self, id: TreeNodeId) -> Result<usize, ForestError> {
        Ok(self.check(id)?.position)
    }

    pub fn descendant_count(&self, id: TreeNodeId) -> Result<usize, ForestError> {
        Ok(self.check(id)?.descendant_count)
    }

    pub fn direct_child_count(&self, id: TreeNodeId) -> Result<usize, ForestError> {
        Ok(self.check(id)?.direct_child_count)
    }

    pub fn is_root(&self, id: TreeNodeId) -> Result<bool, ForestError> {
        Ok(self.check(id)?.is_root())
    }

    /// Membership of the tree the node currently belongs to.
    pub fn membership(&self, id: TreeNodeId) -> Result<Membership, ForestError> {
        self.check(id)?;
        Ok(self.tree_membership(id))
    }

    pub fn is_registered(&self, id: TreeNodeId) -> Result<bool, ForestError> {
        Ok(self.membership(id)? == Membership::Registered)
    }

    /// Number of ancestors of the node.
    pub fn depth(&self, id: TreeNodeId) -> Result<usize, ForestError> {
        Ok(self.ancestors(id)?.count())
    }

    /// Whether `descendant` lies strictly below `ancestor`. An O(1) range check.
    pub fn is_ancestor_of(
        &self,
        ancestor: TreeNodeId,
        descendant: TreeNodeId,
    ) -> Result<bool, ForestError> {
        let a = self.check(ancestor)?;
        let d = self.check(descendant)?;
        Ok(a.root == d.root && a.covers(d.position))
    }

    /// The flattened sequence of the tree `id` belongs to.
    pub fn sequence(&self, id: TreeNodeId) -> Result<&[TreeNodeId], ForestError> {
        let root = self.check(id)?.root;
        Ok(self.rec(root).seq.as_slice())
    }

    /// The node followed by all of its descendants, in pre-order.
    pub fn subtree(&self, id: TreeNodeId) -> Result<&[TreeNodeId], ForestError> {
        self.check(id)?;
        Ok(self.subtree_slice(id))
    }

    /// All descendants of the node, in pre-order.
    pub fn descendants(&self, id: TreeNodeId) -> Result<&[TreeNodeId], ForestError> {
        Ok(&self.subtree(id)?[1..])
    }

    /// The `index`-th descendant in pre-order.
    pub fn descendant_at(&self, id: TreeNodeId, index: usize) -> Result<TreeNodeId, ForestError> {
        let descendants = self.descendants(id)?;
        descendants
            .get(index)
            .copied()
            .ok_or(ForestError::IndexOutOfRange {
                index,
                len: descendants.len(),
            })
    }

    pub fn children(&self, id: TreeNodeId) -> Result<DirectChildren<'_, V>, ForestError> {
        let record = self.check(id)?;
        Ok(DirectChildren::new(
            &self.nodes,
            self.rec(record.root).seq.as_slice(),
            record,
        ))
    }

    /// A snapshot of the direct children.
    pub fn children_vec(&self, id: TreeNodeId) -> Result<Vec<TreeNodeId>, ForestError> {
        Ok(self.children(id)?.collect())
    }

    /// The `index`-th direct child.
    pub fn child_at(&self, id: TreeNodeId, index: usize) -> Result<TreeNodeId, ForestError> {
        let mut children = self.children(id)?;
        let len = children.len();
        children
            .nth(index)
            .ok_or(ForestError::IndexOutOfRange { index, len })
    }

    /// Ancestors from the parent outward.
    pub fn ancestors(&self, id: TreeNodeId) -> Result<AncestorsIter<'_, V>, ForestError> {
        self.check(id)?;
        Ok(AncestorsIter::new(&self.nodes, id))
    }

    /// The sibling right after `id`, found by stepping over its subtree.
    pub fn next_sibling(&self, id: TreeNodeId) -> Result<Option<TreeNodeId>, ForestError> {
        let record = self.check(id)?;
        let Some(parent) = record.parent else {
            return Ok(None);
        };
        let next = record.subtree_end() + 1;
        if next > self.rec(parent).subtree_end() {
            return Ok(None);
        }
        Ok(Some(self.rec(record.root).seq[next]))
    }

    /// The sibling right before `id`. The slot before a node is either its parent or
    /// the last node of its previous sibling's subtree; in the latter case we climb
    /// until we reach a child of the same parent.
    pub fn prev_sibling(&self, id: TreeNodeId) -> Result<Option<TreeNodeId>, ForestError> {
        let record = self.check(id)?;
        let Some(parent) = record.parent else {
            return Ok(None);
        };
        if record.position == self.rec(parent).position + 1 {
            return Ok(None);
        }
        let mut current = self.rec(record.root).seq[record.position - 1];
        while let Some(p) = self.rec(current).parent {
            if p == parent {
                return Ok(Some(current));
            }
            current = p;
        }
        super::corrupted(&format!("{current} is reachable before {id} but shares no parent"))
    }

    /// Calls `f` on each direct child until it breaks. Returns
    /// `ControlFlow::Continue(())` if every child was visited.
    pub fn for_each_child(
        &self,
        id: TreeNodeId,
        direction: Direction,
        mut f: impl FnMut(TreeNodeId) -> ControlFlow<()>,
    ) -> Result<ControlFlow<()>, ForestError> {
        let mut children = self.children(id)?;
        Ok(match direction {
            Direction::Forward => children.try_for_each(&mut f),
            Direction::Reverse => children.rev().try_for_each(&mut f),
        })
    }

    /// Calls `f` on each descendant in pre-order (or reverse pre-order) until it
    /// breaks.
    pub fn for_each_descendant(
        &self,
        id: TreeNodeId,
        direction: Direction,
        mut f: impl FnMut(TreeNodeId) -> ControlFlow<()>,
    ) -> Result<ControlFlow<()>, ForestError> {
        let mut descendants = self.descendants(id)?.iter().copied();
        Ok(match direction {
            Direction::Forward => descendants.try_for_each(&mut f),
            Direction::Reverse => descendants.rev().try_for_each(&mut f),
        })
    }

    /// Copies the descendants of `id` into `dest`, starting at index `at`.
    pub fn copy_descendants_into(
        &self,
        id: TreeNodeId,
        dest: &mut Vec<TreeNodeId>,
        at: usize,
    ) -> Result<(), ForestError> {
        if at > dest.len() {
            return Err(ForestError::IndexOutOfRange {
                index: at,
                len: dest.len(),
            });
        }
        let record = self.check(id)?;
        self.rec(record.root)
            .seq
            .copy_range(record.position + 1, record.descendant_count, dest, at);
        Ok(())
    }

    /// Registered roots in registration order.
    pub fn roots(&self) -> &[TreeNodeId] {
        &self.roots
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Number of nodes in registered trees.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Number of nodes ever created, including unregistered and removed ones.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every node of every registered tree: roots in registration order, each tree in
    /// pre-order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = TreeNodeId> + '_ {
        self.roots
            .iter()
            .flat_map(move |root| self.rec(*root).seq.iter())
    }

    pub(crate) fn subtree_slice(&self, id: TreeNodeId) -> &[TreeNodeId] {
        let record = self.rec(id);
        self.rec(record.root)
            .seq
            .range(record.position, record.subtree_len())
    }

    /// Parent first, then outward to the root.
    pub(crate) fn ancestor_chain(&self, id: TreeNodeId) -> Vec<TreeNodeId> {
        AncestorsIter::new(&self.nodes, id).collect()
    }
}
