//! Filter queries and virtual references for outline documents.
//!
//! This crate provides:
//! - Arena storage for the owned node tree
//! - A filter language with a hand-written tokenizer and recursive-descent parser
//! - A single-pass pre-order scan applying a parsed filter to a document
//! - Search nodes whose query results are attached as cycle-safe virtual children

pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod query;
pub mod search;
pub mod storage;

// Re-export main types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SearchConfig;
pub use document::{Document, NodeView, ResolveStats};
pub use error::{OutlineError, Result};
pub use query::{QueryExpression, QueryFilter, QueryParser, QueryTerm, SearchQueryMatcher};
pub use search::{
    get_matching_items, get_matching_items_at, matching_indices, refresh_search_nodes,
    RefreshReport,
};
pub use storage::{Node, NodeId, NodeIndex, NodeMetadata};

/// Parses a filter query. Shorthand for [`QueryParser::parse`].
pub fn parse_query(input: &str) -> Result<QueryExpression> {
    QueryParser::parse(input)
}
