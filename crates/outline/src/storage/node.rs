//! Node records stored in the document arena.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;
use uuid::Uuid;

use super::index_types::{NodeIndex, OptionNodeIndex};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable node identifier, generated at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generates a fresh, time-ordered identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses the hyphenated text form.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl NodeMetadata {
    pub fn new() -> Self {
        let now = Utc::now();
        Self::with_timestamps(now, now)
    }

    pub fn with_timestamps(created: DateTime<Utc>, modified: DateTime<Utc>) -> Self {
        Self {
            tags: BTreeSet::new(),
            attributes: BTreeMap::new(),
            created,
            modified,
        }
    }
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Resolved references
// ---------------------------------------------------------------------------

/// A transient, non-owning link to a virtual reference target.
///
/// The identifier is kept next to the slot index so a link into a slot that
/// has since been freed or reused reads as dangling instead of aliasing an
/// unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRef {
    pub index: NodeIndex,
    pub id: NodeId,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A node in the outline document.
///
/// Ownership is expressed through `children` (owned subtrees) and `parent`
/// (a back index maintained by the document). Virtual references are kept as
/// identifiers; `resolved` is rebuilt from them on every resolution pass.
#[derive(Debug, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    text: String,
    #[serde(skip)]
    parent: OptionNodeIndex,
    #[serde(skip)]
    children: ThinVec<NodeIndex>,
    pub metadata: NodeMetadata,
    #[serde(default)]
    virtual_refs: ThinVec<NodeId>,
    #[serde(skip)]
    resolved: ThinVec<ResolvedRef>,
    #[serde(skip)]
    collapsed: FnvHashSet<NodeId>,
}

impl Node {
    /// Creates a node with a fresh identifier and empty attributes.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_metadata(NodeId::new(), text, NodeMetadata::new())
    }

    pub fn with_metadata(id: NodeId, text: impl Into<String>, metadata: NodeMetadata) -> Self {
        Self {
            id,
            text: text.into(),
            parent: OptionNodeIndex::none(),
            children: ThinVec::new(),
            metadata,
            virtual_refs: ThinVec::new(),
            resolved: ThinVec::new(),
            collapsed: FnvHashSet::default(),
        }
    }

    /// Builder helper that sets an attribute without touching timestamps.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.attributes.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent.to_option()
    }

    #[inline]
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.metadata.attributes.get(key).map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.contains(tag)
    }

    /// Persisted virtual reference identifiers, in display order.
    #[inline]
    pub fn virtual_refs(&self) -> &[NodeId] {
        &self.virtual_refs
    }

    /// Links produced by the last resolution pass.
    #[inline]
    pub fn resolved_refs(&self) -> &[ResolvedRef] {
        &self.resolved
    }

    pub fn is_virtual_collapsed(&self, target: NodeId) -> bool {
        self.collapsed.contains(&target)
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
        self.touch();
    }

    pub(crate) fn set_attribute(&mut self, key: String, value: String) {
        self.metadata.attributes.insert(key, value);
        self.touch();
    }

    pub(crate) fn remove_attribute(&mut self, key: &str) -> Option<String> {
        let removed = self.metadata.attributes.remove(key);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub(crate) fn add_tag(&mut self, tag: String) -> bool {
        let inserted = self.metadata.tags.insert(tag);
        if inserted {
            self.touch();
        }
        inserted
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeIndex>) {
        self.parent = OptionNodeIndex::from_option(parent);
    }

    pub(crate) fn push_child(&mut self, child: NodeIndex) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: NodeIndex) -> bool {
        if let Some(pos) = self.children.iter().position(|&existing| existing == child) {
            self.children.remove(pos);
            true
        } else {
            false
        }
    }

    pub(crate) fn take_children(&mut self) -> ThinVec<NodeIndex> {
        std::mem::take(&mut self.children)
    }

    pub(crate) fn set_virtual_refs(&mut self, refs: ThinVec<NodeId>) {
        self.virtual_refs = refs;
    }

    pub(crate) fn set_resolved(&mut self, resolved: ThinVec<ResolvedRef>) {
        self.resolved = resolved;
        let persisted = &self.virtual_refs;
        self.collapsed.retain(|target| persisted.contains(target));
    }

    pub(crate) fn toggle_collapsed(&mut self, target: NodeId) -> bool {
        if self.collapsed.remove(&target) {
            false
        } else {
            self.collapsed.insert(target);
            true
        }
    }

    fn touch(&mut self) {
        self.metadata.modified = Utc::now();
    }
}
