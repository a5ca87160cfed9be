//! Per-node state shared by the filters of one evaluation.

use std::cell::OnceCell;

use chrono::NaiveDate;

use crate::document::{Document, NodeView};
use crate::storage::{Node, NodeIndex};

/// Query context for matching one node.
///
/// The lowercased text is computed on first use, so a conjunction of several
/// text terms lowercases the node text once.
pub struct NodeQueryContext<'a> {
    document: &'a Document,
    index: NodeIndex,
    node: &'a Node,
    today: NaiveDate,
    lowered_text: OnceCell<String>,
}

impl<'a> NodeQueryContext<'a> {
    /// Returns `None` if `index` is not a live node.
    pub fn new(document: &'a Document, index: NodeIndex, today: NaiveDate) -> Option<Self> {
        let node = document.node(index)?;
        Some(Self {
            document,
            index,
            node,
            today,
            lowered_text: OnceCell::new(),
        })
    }

    /// Context for another node of the same evaluation.
    pub fn related(&self, index: NodeIndex) -> Option<Self> {
        Self::new(self.document, index, self.today)
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn view(&self) -> NodeView<'a> {
        self.document.view(self.index)
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn lowered_text(&self) -> &str {
        self.lowered_text.get_or_init(|| self.node.text().to_lowercase())
    }
}
