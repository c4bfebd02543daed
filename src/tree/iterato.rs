//! Iterator types handed out by the traversal accessors of [`Forest`](super::Forest).

use std::{collections::VecDeque, iter::FusedIterator};

use super::{NodeRecord, TreeNodeId};

// --- Ancestors Iterator ---

/// Walks `parent` links from a node up to its root. The starting node itself is
/// not yielded.
#[derive(Clone)]
pub struct AncestorsIter<'a, V> {
    nodes: &'a [NodeRecord<V>],
    /// The next node ID to yield. `None` once the root has been yielded.
    current: Option<TreeNodeId>,
}

impl<'a, V> AncestorsIter<'a, V> {
    pub(crate) fn new(nodes: &'a [NodeRecord<V>], start_node: TreeNodeId) -> Self {
        AncestorsIter {
            nodes,
            current: nodes[start_node.slot].parent,
        }
    }
}

impl<V> Iterator for AncestorsIter<'_, V> {
    type Item = TreeNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node_to_return = self.current?;
        self.current = self.nodes[node_to_return.slot].parent;
        Some(node_to_return)
    }
}

impl<V> FusedIterator for AncestorsIter<'_, V> {}

// --- Direct children ---

/// The direct children of a node, found by hopping over each child's subtree.
///
/// Forward iteration is a live walk over the sequence. The first call to
/// `next_back` collects the children not yet yielded, so reverse iteration costs
/// one extra forward pass.
#[derive(Clone)]
pub struct DirectChildren<'a, V> {
    nodes: &'a [NodeRecord<V>],
    seq: &'a [TreeNodeId],
    /// Position of the next child to yield from the front.
    front: usize,
    remaining: usize,
    buffered: Option<VecDeque<TreeNodeId>>,
}

impl<'a, V> DirectChildren<'a, V> {
    pub(crate) fn new(
        nodes: &'a [NodeRecord<V>],
        seq: &'a [TreeNodeId],
        parent: &NodeRecord<V>,
    ) -> Self {
        DirectChildren {
            nodes,
            seq,
            front: parent.position + 1,
            remaining: parent.direct_child_count,
            buffered: None,
        }
    }

    fn step(&mut self) -> TreeNodeId {
        let id = self.seq[self.front];
        self.front += self.nodes[id.slot].subtree_len();
        id
    }
}

impl<V> Iterator for DirectChildren<'_, V> {
    type Item = TreeNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        match &mut self.buffered {
            Some(buffered) => buffered.pop_front(),
            None => Some(self.step()),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for DirectChildren<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if self.buffered.is_none() {
            let mut buffered = VecDeque::with_capacity(self.remaining);
            for _ in 0..self.remaining {
                buffered.push_back(self.step());
            }
            self.buffered = Some(buffered);
        }
        self.remaining -= 1;
        self.buffered.as_mut().and_then(VecDeque::pop_back)
    }
}

impl<V> ExactSizeIterator for DirectChildren<'_, V> {}

impl<V> FusedIterator for DirectChildren<'_, V> {}
