//! Doubly-linked list with one free-form cross-reference per node.
//!
//! # Storage
//! [`List`] owns every node in a single `Vec`, in append order.  The
//! `previous` / `next` links are not stored: they are derived from a node's
//! position, so the chain can never be cyclic or disagree with the count.
//! The cross-reference is stored as a position into the same `Vec`, which
//! makes self-references and cycles through `cross` plain integers.
//!
//! # Navigation
//! [`NodeRef`] is a borrowed view of one node.  It exposes the three
//! relations the list models (`previous`, `next`, `cross`) as further views.

use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::index;

// ── Node ──────────────────────────────────────────────────────────────────────

/// A single payload-carrying node.  Only ever created by [`List::append`]
/// or by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) payload: Vec<u8>,
    pub(crate) cross:   Option<usize>,
}

impl Node {
    pub(crate) fn new(payload: Vec<u8>, cross: Option<usize>) -> Self {
        Self { payload, cross }
    }
}

// ── List ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct List {
    nodes: Vec<Node>,
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node at the tail.  Insertion order is traversal order.
    pub fn append(&mut self, payload: impl Into<Vec<u8>>) {
        self.nodes.push(Node::new(payload.into(), None));
    }

    /// Point node `node`'s cross-reference at node `target`.
    ///
    /// If either position is outside `[0, count)` the call does nothing and
    /// any existing cross-reference is kept.  Returns whether it was applied.
    pub fn set_cross(&mut self, node: usize, target: usize) -> bool {
        let len = self.nodes.len();
        if target >= len {
            trace!(node, target, len, "set_cross ignored: target out of range");
            return false;
        }
        match self.nodes.get_mut(node) {
            Some(n) => {
                n.cross = Some(target);
                true
            }
            None => {
                trace!(node, target, len, "set_cross ignored: node out of range");
                false
            }
        }
    }

    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node.  Calling it on an empty list is a no-op.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn get(&self, position: usize) -> Option<NodeRef<'_>> {
        (position < self.nodes.len()).then_some(NodeRef { list: self, position })
    }

    pub fn head(&self) -> Option<NodeRef<'_>> {
        self.get(0)
    }

    pub fn tail(&self) -> Option<NodeRef<'_>> {
        self.nodes.len().checked_sub(1).and_then(|p| self.get(p))
    }

    /// Head-to-tail traversal.
    pub fn iter(&self) -> Iter<'_> {
        Iter { list: self, front: 0, back: self.nodes.len() }
    }

    /// Cross-reference positions in traversal order.
    pub fn cross_positions(&self) -> Vec<Option<usize>> {
        self.nodes.iter().map(|n| n.cross).collect()
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Install an already-resolved node set, replacing the current content.
    pub(crate) fn replace_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
    }

    /// Serializable view used for JSON dumps.
    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            count: self.nodes.len(),
            nodes: self.iter().map(|n| NodeSnapshot {
                index:   n.index(),
                payload: display_payload(n.payload()),
                cross:   n.cross().map(|c| c.index()),
            }).collect(),
        }
    }
}

// ── NodeRef ───────────────────────────────────────────────────────────────────

/// Borrowed view of a node at a fixed traversal position.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    list:     &'a List,
    position: usize,
}

impl<'a> NodeRef<'a> {
    /// 0-based traversal position; this is the number the wire format stores.
    pub fn index(&self) -> usize {
        self.position
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.list.nodes[self.position].payload
    }

    pub fn previous(&self) -> Option<NodeRef<'a>> {
        index::previous_of(self.position).and_then(|p| self.list.get(p))
    }

    pub fn next(&self) -> Option<NodeRef<'a>> {
        index::next_of(self.position, self.list.nodes.len()).and_then(|p| self.list.get(p))
    }

    pub fn cross(&self) -> Option<NodeRef<'a>> {
        self.list.nodes[self.position].cross.and_then(|p| self.list.get(p))
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.list, other.list) && self.position == other.position
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("index", &self.position)
            .field("payload", &display_payload(self.payload()))
            .field("cross", &self.list.nodes[self.position].cross)
            .finish()
    }
}

// ── Iteration ─────────────────────────────────────────────────────────────────

pub struct Iter<'a> {
    list:  &'a List,
    front: usize,
    back:  usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let node = NodeRef { list: self.list, position: self.front };
        self.front += 1;
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.back - self.front;
        (rest, Some(rest))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(NodeRef { list: self.list, position: self.back })
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a List {
    type Item     = NodeRef<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<P: Into<Vec<u8>>> FromIterator<P> for List {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut list = List::new();
        for payload in iter {
            list.append(payload);
        }
        list
    }
}

// ── Dump ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub index:   usize,
    pub payload: String,
    pub cross:   Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSnapshot {
    pub count: usize,
    pub nodes: Vec<NodeSnapshot>,
}

/// UTF-8 payloads are shown verbatim, anything else as `0x`-prefixed hex.
pub fn display_payload(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(s)  => s.to_owned(),
        Err(_) => format!("0x{}", hex::encode(payload)),
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self {
            write!(f, "Node {}: data = {}, rand = ", node.index(), display_payload(node.payload()))?;
            match node.cross() {
                Some(c) => writeln!(f, "{}", display_payload(c.payload()))?,
                None    => writeln!(f, "nullptr")?,
            }
        }
        Ok(())
    }
}
