//! Query parsing and matching for outline filters.
//!
//! This module provides the filter language, including:
//! - Expression types (AND, OR, NOT, terms)
//! - Filter types (depth, child count, attribute, date, parent, ancestor)
//! - Tokenization and recursive-descent parsing
//! - Matching against document nodes

mod comparator;
mod context;
mod date_filter;
mod evaluate;
mod expression;
mod highlight;
mod matcher;
mod parser;
mod tokenizer;

pub use comparator::Comparator;
pub use date_filter::{parse_attribute_instant, DateExpr, DatePredicate};
pub use expression::{AttributePredicate, DateField, QueryExpression, QueryFilter, QueryTerm};
pub use highlight::derive_highlight_terms;
pub use matcher::SearchQueryMatcher;
pub use parser::QueryParser;
pub use tokenizer::{
    tokenize, FilterKind, QueryToken, QueryTokenKind, RawFilter, MAX_NESTING_DEPTH,
};

pub(crate) use context::NodeQueryContext;
pub(crate) use evaluate::evaluate_node_query_expression;

impl QueryExpression {
    /// Returns sorted, deduplicated, lowercased positive text terms.
    pub fn highlight_terms(&self) -> Vec<String> {
        derive_highlight_terms(self)
    }
}
