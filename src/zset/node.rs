//! Tree nodes
//!
//! Nodes live in an arena owned by the tree and refer to each other through
//! `NodeId` indices. A node is owned by exactly one parent's child list; the
//! `parent` and `next` links are plain indices and own nothing.

use super::entry::Entry;

/// Index of a node inside the tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

/// Leaf or internal payload
#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    /// Leaf node, linked to its right sibling to form the leaf chain
    Leaf { next: Option<NodeId> },

    /// Internal node, `children.len() == items.len() + 1`
    Internal { children: Vec<NodeId> },
}

/// A node of the ordered tree
#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// Entries (leaf) or separators (internal), ascending
    pub items: Vec<Entry>,

    /// Back-reference used only to propagate splits upward
    pub parent: Option<NodeId>,

    pub kind: NodeKind,
}

impl Node {
    /// Create an empty leaf
    pub fn leaf(parent: Option<NodeId>, next: Option<NodeId>) -> Self {
        Node {
            items: Vec::new(),
            parent,
            kind: NodeKind::Leaf { next },
        }
    }

    /// Create an internal node
    pub fn internal(parent: Option<NodeId>, items: Vec<Entry>, children: Vec<NodeId>) -> Self {
        Node {
            items,
            parent,
            kind: NodeKind::Internal { children },
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Forward link of a leaf (None for internal nodes and the last leaf)
    pub fn next(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Leaf { next } => next,
            NodeKind::Internal { .. } => None,
        }
    }

    /// Children of an internal node (empty for leaves)
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf { .. } => &[],
            NodeKind::Internal { children } => children,
        }
    }

    /// Index of the child to descend into for `entry`
    ///
    /// Skips every separator less than or equal to `entry`, so equal keys go
    /// right, into the subtree whose first entry the separator was copied from.
    pub fn child_index(&self, entry: &Entry) -> usize {
        self.items.partition_point(|separator| separator <= entry)
    }

    /// Position at which `entry` keeps this node's items sorted
    pub fn insert_position(&self, entry: &Entry) -> usize {
        self.items.partition_point(|item| item < entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(pairs: &[(f64, &str)]) -> Vec<Entry> {
        pairs.iter().map(|(s, m)| Entry::new(*s, *m)).collect()
    }

    #[test]
    fn test_child_index_equal_goes_right() {
        let node = Node::internal(
            None,
            items(&[(2.0, "b"), (4.0, "d")]),
            vec![NodeId(0), NodeId(1), NodeId(2)],
        );

        assert_eq!(node.child_index(&Entry::new(1.0, "a")), 0);
        assert_eq!(node.child_index(&Entry::new(2.0, "b")), 1);
        assert_eq!(node.child_index(&Entry::new(2.0, "a")), 0);
        assert_eq!(node.child_index(&Entry::new(3.0, "c")), 1);
        assert_eq!(node.child_index(&Entry::new(4.0, "d")), 2);
        assert_eq!(node.child_index(&Entry::new(9.0, "z")), 2);
    }

    #[test]
    fn test_insert_position() {
        let mut node = Node::leaf(None, None);
        node.items = items(&[(1.0, "a"), (1.0, "c"), (3.0, "x")]);

        assert_eq!(node.insert_position(&Entry::new(0.0, "z")), 0);
        assert_eq!(node.insert_position(&Entry::new(1.0, "b")), 1);
        assert_eq!(node.insert_position(&Entry::new(2.0, "a")), 2);
        assert_eq!(node.insert_position(&Entry::new(5.0, "a")), 3);
    }

    #[test]
    fn test_kind_accessors() {
        let leaf = Node::leaf(Some(NodeId(3)), Some(NodeId(7)));
        assert!(leaf.is_leaf());
        assert_eq!(leaf.next(), Some(NodeId(7)));
        assert!(leaf.children().is_empty());

        let internal = Node::internal(None, Vec::new(), vec![NodeId(1)]);
        assert!(!internal.is_leaf());
        assert_eq!(internal.next(), None);
        assert_eq!(internal.children(), &[NodeId(1)]);
    }
}
