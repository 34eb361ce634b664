//! Arena-backed ownership tree.
//!
//! Nodes live in a `Vec` and are addressed by stable [`NodeId`] handles. Each node
//! has at most one parent and an ordered list of children. Attaching a node is
//! rejected, before anything is mutated, when the node is the proposed parent or
//! one of its ancestors.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    #[error("attaching node {child:?} to {parent:?} would create a cycle")]
    Cycle { child: NodeId, parent: NodeId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node<T> {
    value: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Insert a detached node.
    pub fn insert(&mut self, value: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            value,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn value(&self, id: NodeId) -> &T {
        &self.nodes[id.0].value
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Handles of every node, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// `id` followed by its parent, grandparent, and so on up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Make `child` a child of `parent`, detaching it from any previous parent.
    ///
    /// A leaf can only close a cycle onto itself, so the ancestor walk runs only
    /// when `child` has children.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), TreeError> {
        let closes_cycle = child == parent
            || (!self.nodes[child.0].children.is_empty()
                && self.ancestors(parent).any(|a| a == child));
        if closes_cycle {
            return Err(TreeError::Cycle { child, parent });
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Remove `id` from its parent's children; a no-op for roots.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Breadth-first walk from `root`, yielding each node with its depth below `root`.
    pub fn breadth_first(&self, root: NodeId) -> BreadthFirst<'_, T> {
        let mut queue = VecDeque::new();
        queue.push_back((root, 0));
        BreadthFirst { tree: self, queue }
    }

    /// Pre-order depth-first walk from `root`, children in insertion order.
    pub fn depth_first(&self, root: NodeId) -> DepthFirst<'_, T> {
        DepthFirst {
            tree: self,
            stack: vec![root],
        }
    }

    /// Same shape and handles, values transformed by `f`.
    pub fn map<U>(self, mut f: impl FnMut(NodeId, T) -> U) -> Tree<U> {
        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(i, n)| Node {
                value: f(NodeId(i), n.value),
                parent: n.parent,
                children: n.children,
            })
            .collect();
        Tree { nodes }
    }
}

pub struct Ancestors<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct BreadthFirst<'a, T> {
    tree: &'a Tree<T>,
    queue: VecDeque<(NodeId, usize)>,
}

impl<T> Iterator for BreadthFirst<'_, T> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<(NodeId, usize)> {
        let (id, depth) = self.queue.pop_front()?;
        for child in self.tree.children(id) {
            self.queue.push_back((*child, depth + 1));
        }
        Some((id, depth))
    }
}

pub struct DepthFirst<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<NodeId>,
}

impl<T> Iterator for DepthFirst<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        // Push children in reverse so the first child is visited first
        self.stack.extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
