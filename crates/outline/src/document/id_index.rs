//! Identifier to arena slot cache.

use fnv::FnvHashMap;

use crate::storage::{Arena, Node, NodeId, NodeIndex};

#[derive(Debug, Default)]
pub(super) struct IdIndex {
    slots: FnvHashMap<NodeId, NodeIndex>,
    generation: u64,
}

impl IdIndex {
    pub(super) fn build(nodes: &Arena<Node>, generation: u64) -> Self {
        let slots = nodes
            .iter()
            .map(|(index, node)| (node.id(), index))
            .collect::<FnvHashMap<_, _>>();
        Self { slots, generation }
    }

    pub(super) fn get(&self, id: NodeId) -> Option<NodeIndex> {
        self.slots.get(&id).copied()
    }

    pub(super) fn len(&self) -> usize {
        self.slots.len()
    }
}

impl super::Document {
    /// Rebuilds the identifier cache from the live nodes.
    pub fn rebuild_id_index(&mut self) {
        let index = IdIndex::build(&self.nodes, self.generation);
        log::debug!("rebuilt id index with {} entries", index.len());
        self.id_index = Some(index);
    }

    /// Drops the identifier cache; lookups fall back to linear scans.
    pub fn invalidate_id_index(&mut self) {
        self.id_index = None;
    }

    pub fn has_id_index(&self) -> bool {
        self.id_index.is_some()
    }

    /// Builds the cache if it is absent or predates the last structural
    /// mutation.
    pub(crate) fn ensure_id_index(&mut self) {
        let current = self
            .id_index
            .as_ref()
            .is_some_and(|index| index.generation == self.generation);
        if !current {
            self.rebuild_id_index();
        }
    }

    /// Finds the slot holding the node with `id`.
    ///
    /// Cache hits are verified against the slot contents; misses and stale
    /// entries fall back to scanning every live node.
    pub fn find_by_id(&self, id: NodeId) -> Option<NodeIndex> {
        if let Some(cache) = self.id_index.as_ref() {
            if let Some(index) = cache.get(id) {
                if self.nodes.get(index).is_some_and(|node| node.id() == id) {
                    return Some(index);
                }
                log::trace!("stale id index entry for {id}");
            }
        }
        self.nodes
            .iter()
            .find(|(_, node)| node.id() == id)
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use crate::document::Document;
    use crate::storage::{Node, NodeId};

    #[test]
    fn lookup_without_index_scans() {
        let mut doc = Document::new();
        let root = doc.add_root(Node::new("root"));
        let id = doc.node(root).unwrap().id();

        assert!(!doc.has_id_index());
        assert_eq!(doc.find_by_id(id), Some(root));
        assert_eq!(doc.find_by_id(NodeId::new()), None);
    }

    #[test]
    fn nodes_added_after_rebuild_are_still_found() {
        let mut doc = Document::new();
        let root = doc.add_root(Node::new("root"));
        doc.rebuild_id_index();

        let child = doc.add_child(root, Node::new("late")).unwrap();
        let child_id = doc.node(child).unwrap().id();
        assert_eq!(doc.find_by_id(child_id), Some(child));
    }

    #[test]
    fn reused_slot_does_not_alias_old_id() {
        let mut doc = Document::new();
        let root = doc.add_root(Node::new("root"));
        let doomed = doc.add_child(root, Node::new("doomed")).unwrap();
        let doomed_id = doc.node(doomed).unwrap().id();
        doc.rebuild_id_index();

        doc.remove_subtree(doomed).unwrap();
        let replacement = doc.add_child(root, Node::new("replacement")).unwrap();
        assert_eq!(replacement, doomed, "arena should reuse the freed slot");

        assert_eq!(doc.find_by_id(doomed_id), None);
        let replacement_id = doc.node(replacement).unwrap().id();
        assert_eq!(doc.find_by_id(replacement_id), Some(replacement));
    }

    #[test]
    fn resolution_refreshes_an_outdated_index() {
        let mut doc = Document::new();
        let search = doc.add_root(Node::new("search"));
        doc.rebuild_id_index();

        let late = doc.add_root(Node::new("late"));
        let late_id = doc.node(late).unwrap().id();
        assert_eq!(doc.id_index.as_ref().unwrap().get(late_id), None);

        doc.populate_search_node(search, [late_id]).unwrap();
        assert_eq!(doc.id_index.as_ref().unwrap().get(late_id), Some(late));

        doc.remove_subtree(late).unwrap();
        doc.resolve_virtual_children();
        assert_eq!(doc.id_index.as_ref().unwrap().get(late_id), None);
        assert_eq!(doc.id_index.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn unchanged_tree_keeps_its_index() {
        let mut doc = Document::new();
        let root = doc.add_root(Node::new("root"));
        doc.rebuild_id_index();
        let built_at = doc.id_index.as_ref().unwrap().generation;

        doc.set_text(root, "renamed").unwrap();
        doc.resolve_virtual_children();
        assert_eq!(doc.id_index.as_ref().unwrap().generation, built_at);
    }
}
