//! Virtual reference resolution.
//!
//! Persisted virtual reference identifiers are turned into transient
//! `ResolvedRef` links by a depth-first walk over the owned tree. The walk
//! carries the set of identifiers on the current root-to-node path; a target
//! already on that path would close a reference cycle and is skipped for the
//! node being resolved. A target whose resolved list already links back to
//! the node is skipped as well, so two nodes never link to each other. Virtual
//! edges are never followed, so one pass visits each real node exactly once.

use fnv::FnvHashSet;
use thin_vec::ThinVec;

use crate::error::{OutlineError, Result};
use crate::storage::{Node, NodeId, NodeIndex, ResolvedRef};

use super::Document;

/// Counters from one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Real nodes visited.
    pub visited: usize,
    /// Links attached.
    pub resolved: usize,
    /// Identifiers with no live node.
    pub dropped: usize,
    /// Identifiers skipped because they were on the traversal path or
    /// already linked back to the node.
    pub cycle_breaks: usize,
}

enum Frame {
    Enter(NodeIndex),
    Exit(NodeId),
}

impl Document {
    /// Rebuilds every node's resolved links from its persisted identifiers.
    pub fn resolve_virtual_children(&mut self) -> ResolveStats {
        self.ensure_id_index();
        // Links from earlier passes must not count as back-links in this one.
        for node in self.nodes.values_mut() {
            node.set_resolved(ThinVec::new());
        }

        let mut stats = ResolveStats::default();
        let roots = self.roots.clone();
        for root in roots {
            self.resolve_subtree(root, FnvHashSet::default(), &mut stats);
        }

        log::debug!(
            "resolved virtual children: visited={} resolved={} dropped={} cycle_breaks={}",
            stats.visited,
            stats.resolved,
            stats.dropped,
            stats.cycle_breaks
        );
        stats
    }

    /// Overwrites a search node's virtual references with `matching_ids` and
    /// re-resolves it, returning the number of live links attached.
    ///
    /// The node's own identifier and repeated identifiers are dropped from the
    /// persisted list. Resolution starts with the node's ancestors on the path,
    /// as they would be during a full pass.
    pub fn populate_search_node<I>(&mut self, index: NodeIndex, matching_ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let own_id = self
            .nodes
            .get(index)
            .ok_or(OutlineError::NodeNotFound(index))?
            .id();

        let mut seen = FnvHashSet::default();
        let refs = matching_ids
            .into_iter()
            .filter(|id| *id != own_id && seen.insert(*id))
            .collect::<ThinVec<_>>();
        self.nodes[index].set_virtual_refs(refs);

        self.ensure_id_index();
        let on_path = self
            .view(index)
            .ancestors()
            .filter_map(|ancestor| self.nodes.get(ancestor).map(Node::id))
            .collect::<FnvHashSet<_>>();

        let mut stats = ResolveStats::default();
        self.resolve_subtree(index, on_path, &mut stats);
        log::debug!(
            "populated search node {own_id}: {} refs, {} resolved",
            self.nodes[index].virtual_refs().len(),
            self.nodes[index].resolved_refs().len()
        );
        Ok(self.nodes[index].resolved_refs().len())
    }

    /// Iterates the live targets of a node's resolved links.
    pub fn virtual_children(&self, index: NodeIndex) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .get(index)
            .map(Node::resolved_refs)
            .unwrap_or_default()
            .iter()
            .filter_map(move |link| {
                self.nodes
                    .get(link.index)
                    .filter(|target| target.id() == link.id)
                    .map(|target| (link.index, target))
            })
    }

    /// Flips the collapsed display state of one virtual child, returning the
    /// new state.
    pub fn toggle_virtual_collapsed(&mut self, index: NodeIndex, target: NodeId) -> Result<bool> {
        let node = self.node_mut(index)?;
        if !node.virtual_refs().contains(&target) {
            return Err(OutlineError::InvalidInput(format!(
                "{target} is not a virtual reference of {}",
                node.id()
            )));
        }
        Ok(node.toggle_collapsed(target))
    }

    fn resolve_subtree(
        &mut self,
        start: NodeIndex,
        mut on_path: FnvHashSet<NodeId>,
        stats: &mut ResolveStats,
    ) {
        let mut stack = vec![Frame::Enter(start)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(index) => {
                    let Some(node) = self.nodes.get(index) else {
                        continue;
                    };
                    let id = node.id();
                    // A node is on its own path, so self-references never resolve.
                    on_path.insert(id);
                    self.resolve_node(index, &on_path, stats);

                    stack.push(Frame::Exit(id));
                    stack.extend(
                        self.nodes[index]
                            .children()
                            .iter()
                            .rev()
                            .map(|&child| Frame::Enter(child)),
                    );
                }
                Frame::Exit(id) => {
                    on_path.remove(&id);
                }
            }
        }
    }

    fn resolve_node(
        &mut self,
        index: NodeIndex,
        on_path: &FnvHashSet<NodeId>,
        stats: &mut ResolveStats,
    ) {
        stats.visited += 1;
        let own_id = self.nodes[index].id();
        let mut resolved = ThinVec::new();
        for &target in self.nodes[index].virtual_refs() {
            if on_path.contains(&target) {
                stats.cycle_breaks += 1;
                continue;
            }
            match self.find_by_id(target) {
                Some(target_index) if self.links_to(target_index, own_id) => {
                    stats.cycle_breaks += 1;
                }
                Some(target_index) => resolved.push(ResolvedRef {
                    index: target_index,
                    id: target,
                }),
                None => stats.dropped += 1,
            }
        }
        stats.resolved += resolved.len();
        self.nodes[index].set_resolved(resolved);
    }

    fn links_to(&self, from: NodeIndex, target: NodeId) -> bool {
        self.nodes
            .get(from)
            .is_some_and(|node| node.resolved_refs().iter().any(|link| link.id == target))
    }
}
