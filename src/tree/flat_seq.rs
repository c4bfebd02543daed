//! The backing sequence of one tree: node handles in depth-first pre-order.

use std::ops::{Index, Range};

use super::{corrupted, TreeNodeId};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FlatSeq(Vec<TreeNodeId>);

impl Index<usize> for FlatSeq {
    type Output = TreeNodeId;
    #[inline]
    fn index(&self, i: usize) -> &Self::Output {
        &self.0[i]
    }
}

impl FlatSeq {
    /* construction */
    #[inline]
    pub fn new() -> Self {
        Self(Vec::new())
    }
    #[inline]
    pub fn with_capacity(c: usize) -> Self {
        Self(Vec::with_capacity(c))
    }

    /* capacity */
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    #[inline]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    /* element access */
    #[inline]
    pub fn push(&mut self, id: TreeNodeId) {
        self.0.push(id)
    }
    #[inline]
    pub fn get(&self, i: usize) -> Option<TreeNodeId> {
        self.0.get(i).copied()
    }
    #[inline]
    pub fn set(&mut self, i: usize, id: TreeNodeId) {
        self.0[i] = id;
    }
    #[inline]
    pub fn as_slice(&self) -> &[TreeNodeId] {
        &self.0
    }
    #[inline]
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, TreeNodeId>> {
        self.0.iter().copied()
    }

    /// The `count` handles starting at `start`.
    #[inline]
    pub fn range(&self, start: usize, count: usize) -> &[TreeNodeId] {
        &self.0[start..start + count]
    }

    /// Inserts `src` so that its first element lands at `dest`.
    pub fn insert_range(&mut self, dest: usize, src: impl IntoIterator<Item = TreeNodeId>) {
        self.0.splice(dest..dest, src);
    }

    /// Removes and returns `count` handles starting at `start`.
    pub fn remove_range(&mut self, start: usize, count: usize) -> Vec<TreeNodeId> {
        self.0.drain(start..start + count).collect()
    }

    /// Copies `count` handles starting at `start` into `dest`, inserting them at
    /// index `at`.
    pub fn copy_range(&self, start: usize, count: usize, dest: &mut Vec<TreeNodeId>, at: usize) {
        dest.splice(at..at, self.range(start, count).iter().copied());
    }

    /// Moves the `count` handles starting at `from` so they end up right before the
    /// element that currently sits at `dest`, in one in-place rotation.
    ///
    /// `dest` is expressed in the coordinates before the move and must not fall
    /// strictly inside the moved range. Returns the window whose slots changed.
    pub fn rotate_window(&mut self, from: usize, count: usize, dest: usize) -> Range<usize> {
        let end = from + count;
        if dest <= from {
            self.0[dest..end].rotate_right(count);
            dest..end
        } else if dest >= end {
            self.0[from..dest].rotate_left(count);
            from..dest
        } else {
            corrupted(&format!(
                "cannot move range {from}..{end} to {dest}, which lies inside it"
            ))
        }
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }
}

impl FromIterator<TreeNodeId> for FlatSeq {
    fn from_iter<I: IntoIterator<Item = TreeNodeId>>(iter: I) -> Self {
        FlatSeq(Vec::from_iter(iter))
    }
}

impl<'a> IntoIterator for &'a FlatSeq {
    type Item = TreeNodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, TreeNodeId>>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::FlatSeq;
    use crate::tree::Forest;

    fn ids(n: usize) -> (Forest<()>, FlatSeq) {
        let mut forest = Forest::new();
        let seq = (0..n).map(|_| forest.create_node(())).collect();
        (forest, seq)
    }

    fn slots(seq: &FlatSeq) -> Vec<usize> {
        seq.iter().map(|id| id.slot()).collect()
    }

    #[test]
    fn rotate_forward() {
        let (_forest, mut seq) = ids(6);
        let window = seq.rotate_window(1, 2, 5);
        assert_eq!(window, 1..5);
        assert_eq!(slots(&seq), vec![0, 3, 4, 1, 2, 5]);
    }

    #[test]
    fn rotate_backward() {
        let (_forest, mut seq) = ids(6);
        let window = seq.rotate_window(3, 2, 1);
        assert_eq!(window, 1..5);
        assert_eq!(slots(&seq), vec![0, 3, 4, 1, 2, 5]);
    }

    #[test]
    fn rotate_to_end() {
        let (_forest, mut seq) = ids(4);
        let window = seq.rotate_window(0, 1, 4);
        assert_eq!(window, 0..4);
        assert_eq!(slots(&seq), vec![1, 2, 3, 0]);
    }

    #[test]
    #[should_panic(expected = "forest invariant corrupted")]
    fn rotate_into_itself_is_fatal() {
        let (_forest, mut seq) = ids(4);
        seq.rotate_window(0, 3, 2);
    }

    #[test]
    fn move_between_sequences() {
        let (_forest, mut a) = ids(5);
        let mut b: FlatSeq = a.remove_range(3, 2).into_iter().collect();
        assert_eq!(slots(&a), vec![0, 1, 2]);
        b.insert_range(1, a.remove_range(0, 1));
        assert_eq!(slots(&b), vec![3, 0, 4]);

        let mut out = Vec::new();
        b.copy_range(1, 2, &mut out, 0);
        assert_eq!(out.iter().map(|id| id.slot()).collect::<Vec<_>>(), vec![0, 4]);
    }
}
