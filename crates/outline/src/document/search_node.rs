//! Search node identification.

use crate::config::SearchConfig;
use crate::error::Result;
use crate::storage::{Node, NodeIndex};

use super::Document;

/// Returns true if the node's type attribute marks it as a search node.
pub fn is_search_node(node: &Node, config: &SearchConfig) -> bool {
    node.attribute(&config.type_attribute) == Some(config.search_type.as_str())
}

/// Returns the query text of a search node.
pub fn search_query<'a>(node: &'a Node, config: &SearchConfig) -> Option<&'a str> {
    if !is_search_node(node, config) {
        return None;
    }
    node.attribute(&config.query_attribute)
}

impl Document {
    /// Creates a search node as a new root, or as the last child of `parent`.
    pub fn add_search_node(
        &mut self,
        parent: Option<NodeIndex>,
        text: impl Into<String>,
        query: impl Into<String>,
        config: &SearchConfig,
    ) -> Result<NodeIndex> {
        let node = Node::new(text)
            .with_attribute(config.type_attribute.clone(), config.search_type.clone())
            .with_attribute(config.query_attribute.clone(), query);
        match parent {
            Some(parent) => self.add_child(parent, node),
            None => Ok(self.add_root(node)),
        }
    }

    /// Search nodes in tree pre-order.
    pub fn search_nodes(&self, config: &SearchConfig) -> Vec<NodeIndex> {
        self.iter_preorder()
            .filter(|(_, node)| is_search_node(node, config))
            .map(|(index, _)| index)
            .collect()
    }
}
