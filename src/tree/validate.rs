//! The invariant checker and the debug drawing.

use std::fmt::{self, Write};

use bitvec::vec::BitVec;
use itertools::Itertools;

use super::{Forest, ForestError, Membership, TreeNodeId};

macro_rules! corrupt {
    ($($arg:tt)*) => {
        return Err(ForestError::Corrupt(format!($($arg)*)))
    };
}

impl<V> Forest<V> {
    /// Checks every structural invariant of the forest in one pass over all
    /// sequences.
    ///
    /// This is O(number of nodes). It runs automatically after each mutation when
    /// [`ForestOptions::verify_invariants`](crate::ForestOptions::verify_invariants)
    /// is set.
    pub fn validate(&self) -> Result<(), ForestError> {
        let mut seen: BitVec = BitVec::repeat(false, self.nodes.len());
        let mut registered_total = 0;

        for (slot, record) in self.nodes.iter().enumerate() {
            let id = TreeNodeId {
                forest: self.id,
                slot,
            };
            if record.parent.is_some() {
                if !record.seq.is_empty() {
                    corrupt!("{id} has a parent but owns a sequence");
                }
                continue;
            }
            if record.root != id || record.position != 0 {
                corrupt!("root {id} does not start its own sequence");
            }
            if record.seq.len() != record.subtree_len() {
                corrupt!(
                    "root {id} has {} descendants but its sequence holds {}",
                    record.descendant_count,
                    record.seq.len()
                );
            }
            if record.seq.get(0) != Some(id) {
                corrupt!("sequence of root {id} does not start with it");
            }

            for (position, member) in record.seq.iter().enumerate() {
                if member.forest != self.id {
                    corrupt!("foreign handle {member} in the sequence of {id}");
                }
                let Some(node) = self.nodes.get(member.slot) else {
                    corrupt!("dangling handle {member} in the sequence of {id}");
                };
                if seen[member.slot] {
                    corrupt!("{member} appears in more than one place");
                }
                seen.set(member.slot, true);
                if node.position != position {
                    corrupt!("{member} sits at {position} but records {}", node.position);
                }
                if node.root != id {
                    corrupt!("{member} lives under {id} but records root {}", node.root);
                }

                let end = node.subtree_end();
                let mut cursor = position + 1;
                let mut children = 0;
                while cursor <= end {
                    let Some(child_id) = record.seq.get(cursor) else {
                        corrupt!("subtree of {member} runs past the end of its sequence");
                    };
                    let Some(child) = self.nodes.get(child_id.slot) else {
                        corrupt!("dangling handle {child_id} in the sequence of {id}");
                    };
                    if child.parent != Some(member) {
                        corrupt!("{child_id} is a child of {member} but records another parent");
                    }
                    children += 1;
                    cursor += child.subtree_len();
                }
                if cursor != end + 1 {
                    corrupt!("children of {member} overrun its subtree");
                }
                if children != node.direct_child_count {
                    corrupt!(
                        "{member} has {children} children but records {}",
                        node.direct_child_count
                    );
                }
            }

            if record.membership == Membership::Registered {
                registered_total += record.seq.len();
                if !self.roots.contains(&id) {
                    corrupt!("registered root {id} is not listed among the roots");
                }
            }
        }

        if let Some(slot) = seen.iter_zeros().next() {
            corrupt!("n{slot} is not part of any sequence");
        }

        if let Some(root) = self.roots.iter().duplicates().next() {
            corrupt!("{root} is listed twice among the roots");
        }
        for &root in &self.roots {
            let record = self.check(root)?;
            if !record.is_root() || record.membership != Membership::Registered {
                corrupt!("{root} is listed among the roots but is not a registered root");
            }
        }
        if registered_total != self.total_count {
            corrupt!(
                "registered trees hold {registered_total} nodes but the total count is {}",
                self.total_count
            );
        }
        Ok(())
    }

    /// Draws every registered tree, roots in registration order, one node per line.
    ///
    /// ```text
    /// n0: A
    /// ├── n1: B
    /// │   └── n3: D
    /// └── n2: C
    /// ```
    pub fn debug_draw(&self, label: impl Fn(TreeNodeId, &V) -> String) -> String {
        Drawing {
            forest: self,
            tops: &self.roots,
            label,
        }
        .to_string()
    }

    /// Draws the subtree of any node, registered or not.
    pub fn debug_draw_subtree(
        &self,
        node: TreeNodeId,
        label: impl Fn(TreeNodeId, &V) -> String,
    ) -> Result<String, ForestError> {
        self.check(node)?;
        Ok(Drawing {
            forest: self,
            tops: &[node],
            label,
        }
        .to_string())
    }

    /// Writes the subtrees of `tops` into `f`, stopping at the first write error.
    fn draw_into<W: Write>(
        &self,
        f: &mut W,
        tops: &[TreeNodeId],
        label: &impl Fn(TreeNodeId, &V) -> String,
    ) -> fmt::Result {
        for &top in tops {
            writeln!(f, "{top}: {}", label(top, &self.rec(top).data))?;
            self.draw_children(f, top, "", label)?;
        }
        Ok(())
    }

    fn draw_children<W: Write>(
        &self,
        f: &mut W,
        node: TreeNodeId,
        prefix: &str,
        label: &impl Fn(TreeNodeId, &V) -> String,
    ) -> fmt::Result {
        for (child, is_last) in self
            .children_vec(node)
            .unwrap_or_default()
            .into_iter()
            .with_position()
            .map(|(position, child)| {
                (
                    child,
                    matches!(
                        position,
                        itertools::Position::Last | itertools::Position::Only
                    ),
                )
            })
        {
            let connector = if is_last { "└── " } else { "├── " };
            writeln!(
                f,
                "{prefix}{connector}{child}: {}",
                label(child, &self.rec(child).data)
            )?;
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
            self.draw_children(f, child, &child_prefix, label)?;
        }
        Ok(())
    }
}

struct Drawing<'a, V, F> {
    forest: &'a Forest<V>,
    tops: &'a [TreeNodeId],
    label: F,
}

impl<V, F: Fn(TreeNodeId, &V) -> String> fmt::Display for Drawing<'_, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.forest.draw_into(f, self.tops, &self.label)
    }
}

#[cfg(test)]
mod test {
    use crate::tree::{Forest, ForestError, TreeNodeId};

    struct Refuse;

    impl std::fmt::Write for Refuse {
        fn write_str(&mut self, _: &str) -> std::fmt::Result {
            Err(std::fmt::Error)
        }
    }

    #[test]
    fn drawing_stops_on_write_errors() {
        let mut forest = Forest::new();
        let a = forest.insert_root("A");
        forest.add_child(a, "B").unwrap();
        let roots = forest.roots().to_vec();
        assert!(forest
            .draw_into(&mut Refuse, &roots, &|_: TreeNodeId, v: &&str| v.to_string())
            .is_err());
        assert_eq!(forest.debug_draw(|_, v| v.to_string()), "n0: A\n└── n1: B\n");
    }

    #[test]
    fn fresh_forest_is_valid() {
        let forest: Forest<()> = Forest::new();
        assert_eq!(forest.validate(), Ok(()));
    }

    #[test]
    fn detects_wrong_position() {
        let mut forest = Forest::new();
        let a = forest.insert_root("A");
        let b = forest.add_child(a, "B").unwrap();
        forest.rec_mut(b).position = 0;
        assert!(matches!(forest.validate(), Err(ForestError::Corrupt(_))));
    }

    #[test]
    fn detects_wrong_total() {
        let mut forest = Forest::new();
        forest.insert_root("A");
        forest.total_count = 3;
        let err = forest.validate().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Corruption);
    }

    #[test]
    fn detects_unlisted_root() {
        let mut forest = Forest::new();
        let a = forest.insert_root("A");
        forest.roots.clear();
        forest.total_count = 0;
        let err = forest.validate().unwrap_err();
        assert!(err.to_string().contains(&a.to_string()));
    }

    #[test]
    fn detects_wrong_child_count() {
        let mut forest = Forest::new();
        let a = forest.insert_root("A");
        forest.add_child(a, "B").unwrap();
        forest.rec_mut(a).direct_child_count = 2;
        assert!(forest.validate().is_err());
    }
}
