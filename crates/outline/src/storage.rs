//! Storage layer for the outline document.
//!
//! This module provides the low-level data storage primitives:
//! - Arena allocator with a freelist, addressed by compact indices
//! - Node and metadata records owned by the arena

mod arena;
mod entry;
mod index_types;
mod node;

pub use arena::{Arena, ArenaIter};
pub use index_types::{NodeIndex, OptionNodeIndex};
pub use node::{Node, NodeId, NodeMetadata, ResolvedRef};
