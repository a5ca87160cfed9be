//! Node view helpers for computing derived properties from the arena.
//!
//! Depth and ancestry are derived by walking parent links rather than being
//! stored on the node.

use crate::storage::{Node, NodeIndex};

use super::Document;

/// A view into a node that can compute derived properties.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    document: &'a Document,
    index: NodeIndex,
}

impl<'a> NodeView<'a> {
    #[inline]
    pub fn new(document: &'a Document, index: NodeIndex) -> Self {
        Self { document, index }
    }

    #[inline]
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn node(&self) -> Option<&'a Node> {
        self.document.node(self.index)
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.node()?.parent()
    }

    /// Computes the depth (number of ancestors, 0 for root nodes).
    pub fn compute_depth(&self) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.index;

        loop {
            let node = self.document.node(current)?;
            match node.parent() {
                Some(parent) => {
                    depth += 1;
                    current = parent;
                }
                None => break,
            }
        }

        Some(depth)
    }

    /// Iterates ancestors from the immediate parent up to the root.
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors {
            document: self.document,
            next: self.parent(),
        }
    }
}

pub struct Ancestors<'a> {
    document: &'a Document,
    next: Option<NodeIndex>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.document.node(current).and_then(Node::parent);
        Some(current)
    }
}
