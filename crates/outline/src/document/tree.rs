//! Tree construction, mutation, and traversal.

use crate::error::{OutlineError, Result};
use crate::storage::{Node, NodeIndex};

use super::Document;

impl Document {
    /// Appends a new root node.
    pub fn add_root(&mut self, mut node: Node) -> NodeIndex {
        node.set_parent(None);
        let index = self.nodes.insert(node);
        self.roots.push(index);
        self.generation += 1;
        index
    }

    /// Appends `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeIndex, mut node: Node) -> Result<NodeIndex> {
        if !self.nodes.contains(parent) {
            return Err(OutlineError::NodeNotFound(parent));
        }
        node.set_parent(Some(parent));
        let index = self.nodes.insert(node);
        self.nodes[parent].push_child(index);
        self.generation += 1;
        Ok(index)
    }

    /// Removes a node and its whole owned subtree, returning how many nodes
    /// were dropped.
    ///
    /// Virtual references pointing into the removed subtree are left as-is;
    /// the next resolution pass drops them.
    pub fn remove_subtree(&mut self, index: NodeIndex) -> Result<usize> {
        let parent = self
            .nodes
            .get(index)
            .ok_or(OutlineError::NodeNotFound(index))?
            .parent();

        match parent {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.remove_child(index);
                }
            }
            None => self.roots.retain(|&root| root != index),
        }

        let mut removed = 0;
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            if let Some(mut node) = self.nodes.try_remove(current) {
                stack.extend(node.take_children());
                removed += 1;
            }
        }
        self.generation += 1;
        Ok(removed)
    }

    pub fn set_text(&mut self, index: NodeIndex, text: impl Into<String>) -> Result<()> {
        self.node_mut(index)?.set_text(text.into());
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        index: NodeIndex,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.node_mut(index)?.set_attribute(key.into(), value.into());
        Ok(())
    }

    pub fn remove_attribute(&mut self, index: NodeIndex, key: &str) -> Result<Option<String>> {
        Ok(self.node_mut(index)?.remove_attribute(key))
    }

    pub fn add_tag(&mut self, index: NodeIndex, tag: impl Into<String>) -> Result<bool> {
        Ok(self.node_mut(index)?.add_tag(tag.into()))
    }

    /// Iterates every real node in tree pre-order, roots in document order.
    pub fn iter_preorder(&self) -> PreorderIter<'_> {
        PreorderIter::new(self, self.roots.iter().copied())
    }

    /// Iterates `index` and its owned descendants in pre-order.
    pub fn iter_subtree(&self, index: NodeIndex) -> PreorderIter<'_> {
        PreorderIter::new(self, std::iter::once(index))
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> Result<&mut Node> {
        self.nodes
            .get_mut(index)
            .ok_or(OutlineError::NodeNotFound(index))
    }
}

/// Pre-order iterator over the owned tree. Virtual references are never
/// followed.
pub struct PreorderIter<'a> {
    document: &'a Document,
    stack: Vec<NodeIndex>,
}

impl<'a> PreorderIter<'a> {
    fn new(document: &'a Document, starts: impl DoubleEndedIterator<Item = NodeIndex>) -> Self {
        Self {
            document,
            stack: starts.rev().collect(),
        }
    }
}

impl<'a> Iterator for PreorderIter<'a> {
    type Item = (NodeIndex, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(index) = self.stack.pop() {
            let Some(node) = self.document.nodes.get(index) else {
                continue;
            };
            self.stack.extend(node.children().iter().rev().copied());
            return Some((index, node));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(doc: &Document) -> Vec<&str> {
        doc.iter_preorder().map(|(_, node)| node.text()).collect()
    }

    #[test]
    fn preorder_follows_document_order() {
        let mut doc = Document::new();
        let a = doc.add_root(Node::new("a"));
        let a1 = doc.add_child(a, Node::new("a1")).unwrap();
        doc.add_child(a1, Node::new("a1x")).unwrap();
        doc.add_child(a, Node::new("a2")).unwrap();
        doc.add_root(Node::new("b"));

        assert_eq!(texts(&doc), vec!["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn add_child_sets_parent_link() {
        let mut doc = Document::new();
        let root = doc.add_root(Node::new("root"));
        let child = doc.add_child(root, Node::new("child")).unwrap();

        assert_eq!(doc.node(child).unwrap().parent(), Some(root));
        assert_eq!(doc.node(root).unwrap().children(), &[child]);
        assert_eq!(doc.node(root).unwrap().parent(), None);
    }

    #[test]
    fn add_child_under_missing_parent_fails() {
        let mut doc = Document::new();
        let root = doc.add_root(Node::new("root"));
        doc.remove_subtree(root).unwrap();

        let result = doc.add_child(root, Node::new("orphan"));
        assert!(matches!(result, Err(OutlineError::NodeNotFound(idx)) if idx == root));
    }

    #[test]
    fn remove_subtree_drops_descendants() {
        let mut doc = Document::new();
        let a = doc.add_root(Node::new("a"));
        let b = doc.add_child(a, Node::new("b")).unwrap();
        doc.add_child(b, Node::new("c")).unwrap();
        doc.add_child(a, Node::new("d")).unwrap();

        assert_eq!(doc.remove_subtree(b).unwrap(), 2);
        assert_eq!(texts(&doc), vec!["a", "d"]);
        assert_eq!(doc.len(), 2);

        assert_eq!(doc.remove_subtree(a).unwrap(), 2);
        assert!(doc.is_empty());
        assert!(doc.roots().is_empty());
    }

    #[test]
    fn mutations_on_missing_node_fail() {
        let mut doc = Document::new();
        let root = doc.add_root(Node::new("root"));
        doc.remove_subtree(root).unwrap();

        assert!(doc.set_text(root, "x").is_err());
        assert!(doc.set_attribute(root, "k", "v").is_err());
        assert!(doc.add_tag(root, "t").is_err());
    }

    #[test]
    fn attribute_and_tag_updates() {
        let mut doc = Document::new();
        let root = doc.add_root(Node::new("root"));
        doc.set_attribute(root, "status", "open").unwrap();
        assert!(doc.add_tag(root, "work").unwrap());
        assert!(!doc.add_tag(root, "work").unwrap());

        let node = doc.node(root).unwrap();
        assert_eq!(node.attribute("status"), Some("open"));
        assert!(node.has_tag("work"));

        assert_eq!(
            doc.remove_attribute(root, "status").unwrap(),
            Some("open".to_string())
        );
        assert_eq!(doc.remove_attribute(root, "status").unwrap(), None);
    }
}
