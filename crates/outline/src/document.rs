//! Outline document: the owned node tree plus derived lookup state.
//!
//! This module handles:
//! - Tree construction and mutation over the node arena
//! - Identifier lookup through a rebuildable cache
//! - Materializing virtual references into non-owning links
//! - Search node identification

mod id_index;
mod node_view;
mod resolver;
mod search_node;
mod tree;

use crate::storage::{Arena, Node, NodeIndex};

pub use node_view::{Ancestors, NodeView};
pub use resolver::ResolveStats;
pub use search_node::{is_search_node, search_query};
pub use tree::PreorderIter;

use id_index::IdIndex;

/// An ordered forest of owned root nodes.
///
/// `id_index` is a derived cache from identifier to arena slot. Structural
/// mutations bump `generation`, and resolution passes rebuild a cache built
/// at an older generation. Lookups still verify every hit and fall back to a
/// linear scan.
#[derive(Debug, Default)]
pub struct Document {
    nodes: Arena<Node>,
    roots: Vec<NodeIndex>,
    id_index: Option<IdIndex>,
    generation: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn view(&self, index: NodeIndex) -> NodeView<'_> {
        NodeView::new(self, index)
    }
}
