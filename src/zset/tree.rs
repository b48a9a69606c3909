//! Ordered multiway tree backing sorted sets
//!
//! A B+tree keyed by `(score, member)`. Leaves hold the entries and are
//! chained left to right; internal nodes hold separator copies. Nodes are
//! only ever created by splits and never merged, so the tree only grows.
//!
//! The tree is single-writer: callers serialize access themselves.

use super::entry::Entry;
use super::node::{Node, NodeId, NodeKind};
use crate::config::{TreeConfig, DEFAULT_DEGREE};
use crate::error::ConfigError;
use serde::Serialize;
use siphasher::sip::SipHasher13;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use tracing::{debug, trace};

/// Member -> current score
type MemberIndex = HashMap<String, f64, BuildHasherDefault<SipHasher13>>;

/// Result of [`ScoreTree::add`]; both variants mean success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The member was not present and has been inserted
    Inserted,

    /// The member was present and its score has been updated
    Updated,
}

impl AddOutcome {
    pub fn is_inserted(self) -> bool {
        matches!(self, AddOutcome::Inserted)
    }
}

/// Ordered tree of `(score, member)` entries
#[derive(Debug, Clone)]
pub struct ScoreTree {
    /// Node arena, a node's id is its index
    nodes: Vec<Node>,

    root: NodeId,

    /// Maximum number of children per internal node
    degree: usize,

    /// Membership index used to keep members unique across leaves
    members: MemberIndex,
}

impl ScoreTree {
    /// Create an empty tree with the given fanout (`degree >= 2`)
    pub fn new(degree: usize) -> Result<Self, ConfigError> {
        Self::from_config(&TreeConfig { degree })
    }

    /// Create an empty tree from its configuration
    pub fn from_config(config: &TreeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!("Creating ordered tree with degree {}", config.degree);
        Ok(Self::build(config.degree))
    }

    fn build(degree: usize) -> Self {
        ScoreTree {
            nodes: vec![Node::leaf(None, None)],
            root: NodeId(0),
            degree,
            members: MemberIndex::default(),
        }
    }

    /// Insert `member` with `score`, or update its score if already present
    ///
    /// An updated entry is moved to the position its new score requires, so
    /// the leaf chain stays in `(score, member)` order.
    pub fn add(&mut self, score: f64, member: impl Into<String>) -> AddOutcome {
        let member = member.into();

        if let Some(previous) = self.members.get_mut(&member) {
            let old = *previous;
            *previous = score;
            if old.total_cmp(&score) != Ordering::Equal {
                trace!("Moving member {} from score {} to {}", member, old, score);
                self.relocate(Entry::new(old, member), score);
            }
            return AddOutcome::Updated;
        }

        trace!("Inserting member {} with score {}", member, score);
        self.members.insert(member.clone(), score);
        self.insert_entry(Entry::new(score, member));
        AddOutcome::Inserted
    }

    /// Score of `member`, if present
    pub fn score(&self, member: &str) -> Option<f64> {
        self.members.get(member).copied()
    }

    /// Zero-based position of `member` in ascending `(score, member)` order
    ///
    /// Walks the leaf chain from the leftmost leaf, so this is O(n).
    pub fn rank(&self, member: &str) -> Option<usize> {
        if !self.members.contains_key(member) {
            return None;
        }
        self.iter().position(|entry| entry.member == member)
    }

    /// Whether `member` is present
    pub fn contains(&self, member: &str) -> bool {
        self.members.contains_key(member)
    }

    /// Number of distinct members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of levels, 1 for a tree that is a single leaf
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut id = self.root;
        while let Some(&first) = self.node(id).children().first() {
            id = first;
            height += 1;
        }
        height
    }

    /// Ascending traversal of all entries along the leaf chain
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            tree: self,
            leaf: Some(self.first_leaf()),
            pos: 0,
        }
    }

    /// Node counts and sizes
    pub fn stats(&self) -> TreeStats {
        let leaves = self.nodes.iter().filter(|node| node.is_leaf()).count();

        TreeStats {
            entries: self.len(),
            leaves,
            internal_nodes: self.nodes.len() - leaves,
            height: self.height(),
            memory_bytes: self.memory_usage(),
        }
    }

    /// Approximate memory used by entries and separators in bytes
    pub fn memory_usage(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| node.items.iter())
            .map(Entry::memory_usage)
            .sum()
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn max_items(&self) -> usize {
        self.degree - 1
    }

    /// Leftmost leaf, reached by repeated first-child descent
    fn first_leaf(&self) -> NodeId {
        let mut id = self.root;
        while let Some(&first) = self.node(id).children().first() {
            id = first;
        }
        id
    }

    /// Leaf whose key range contains `entry`
    fn find_leaf(&self, entry: &Entry) -> NodeId {
        let mut id = self.root;
        loop {
            let node = self.node(id);
            match &node.kind {
                NodeKind::Leaf { .. } => return id,
                NodeKind::Internal { children } => id = children[node.child_index(entry)],
            }
        }
    }

    fn insert_entry(&mut self, entry: Entry) {
        let max = self.max_items();
        let leaf = self.find_leaf(&entry);

        let node = self.node_mut(leaf);
        let pos = node.insert_position(&entry);
        node.items.insert(pos, entry);

        if node.items.len() > max {
            self.split(leaf);
        }
    }

    /// Lift `old` out of its leaf and re-insert it with `score`
    fn relocate(&mut self, old: Entry, score: f64) {
        let leaf = self.find_leaf(&old);
        let node = self.node_mut(leaf);

        let pos = match node.items.binary_search(&old) {
            Ok(pos) => pos,
            Err(_) => unreachable!("member {} indexed but missing from its leaf", old.member),
        };

        let mut entry = node.items.remove(pos);
        entry.score = score;
        self.insert_entry(entry);
    }

    /// Split `id` and every ancestor that overflows as a result
    fn split(&mut self, mut id: NodeId) {
        let max = self.max_items();

        while self.node(id).items.len() > max {
            let parent = match self.node(id).parent {
                Some(parent) => parent,
                None => self.grow_root(id),
            };

            if self.node(id).is_leaf() {
                self.split_leaf(id, parent);
            } else {
                self.split_internal(id, parent);
            }

            id = parent;
        }
    }

    /// Put a new empty internal root above `old_root`
    fn grow_root(&mut self, old_root: NodeId) -> NodeId {
        let new_root = self.alloc(Node::internal(None, Vec::new(), vec![old_root]));
        self.node_mut(old_root).parent = Some(new_root);
        self.root = new_root;

        debug!("Tree grew to height {}", self.height());
        new_root
    }

    /// Move the upper half of a leaf into a new right sibling
    ///
    /// The first entry of the new leaf is copied up as the separator.
    fn split_leaf(&mut self, id: NodeId, parent: NodeId) {
        let node = self.node_mut(id);
        let mid = node.items.len() / 2;
        let right_items = node.items.split_off(mid);
        let separator = right_items[0].clone();

        let mut right = Node::leaf(Some(parent), node.next());
        right.items = right_items;
        let right_id = self.alloc(right);

        if let NodeKind::Leaf { next } = &mut self.node_mut(id).kind {
            *next = Some(right_id);
        }

        debug!(
            "Split leaf {} at {}, new leaf {} starts at {}",
            id.0, mid, right_id.0, separator
        );
        self.attach(parent, id, separator, right_id);
    }

    /// Move the items and children after the median into a new internal node
    ///
    /// The median itself is promoted into the parent, not kept.
    fn split_internal(&mut self, id: NodeId, parent: NodeId) {
        let node = self.node_mut(id);
        let mid = node.items.len() / 2;
        let right_items = node.items.split_off(mid + 1);
        let promoted = node.items.remove(mid);
        let right_children = match &mut node.kind {
            NodeKind::Internal { children } => children.split_off(mid + 1),
            NodeKind::Leaf { .. } => unreachable!("internal split on leaf {}", id.0),
        };

        let right_id = self.alloc(Node::internal(Some(parent), right_items, right_children));
        for child in self.node(right_id).children().to_vec() {
            self.node_mut(child).parent = Some(right_id);
        }

        debug!(
            "Split internal node {} at {}, promoted {} with new node {}",
            id.0, mid, promoted, right_id.0
        );
        self.attach(parent, id, promoted, right_id);
    }

    /// Insert `separator` and `right` into `parent` just after `left`
    fn attach(&mut self, parent: NodeId, left: NodeId, separator: Entry, right: NodeId) {
        let node = self.node_mut(parent);
        let NodeKind::Internal { children } = &mut node.kind else {
            unreachable!("parent {} is a leaf", parent.0);
        };
        let Some(pos) = children.iter().position(|&child| child == left) else {
            unreachable!("node {} missing from its parent {}", left.0, parent.0);
        };

        children.insert(pos + 1, right);
        node.items.insert(pos, separator);
    }
}

impl Default for ScoreTree {
    fn default() -> Self {
        Self::build(DEFAULT_DEGREE)
    }
}

impl<'a> IntoIterator for &'a ScoreTree {
    type Item = &'a Entry;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the leaf chain, in ascending order
pub struct Iter<'a> {
    tree: &'a ScoreTree,
    leaf: Option<NodeId>,
    pos: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let node = tree.node(self.leaf?);
            if let Some(entry) = node.items.get(self.pos) {
                self.pos += 1;
                return Some(entry);
            }
            self.leaf = node.next();
            self.pos = 0;
        }
    }
}

/// Statistics about an ordered tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub entries: usize,
    pub leaves: usize,
    pub internal_nodes: usize,
    pub height: usize,
    pub memory_bytes: usize,
}
