//! Compiled query wrapper used by search-node refresh.

use chrono::{DateTime, Local};

use crate::document::Document;
use crate::error::Result;
use crate::storage::NodeIndex;

use super::expression::QueryExpression;
use super::highlight::derive_highlight_terms;
use super::parser::QueryParser;

/// A parsed query together with its source text.
#[derive(Debug, Clone)]
pub struct SearchQueryMatcher {
    source: String,
    expression: QueryExpression,
}

impl SearchQueryMatcher {
    pub fn compile(raw_query: &str) -> Result<Self> {
        let expression = QueryParser::parse(raw_query)?;
        log::debug!("compiled query {raw_query:?} as {expression}");
        Ok(Self {
            source: raw_query.to_string(),
            expression,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &QueryExpression {
        &self.expression
    }

    /// True when the source had no terms at all.
    pub fn is_blank(&self) -> bool {
        self.expression.is_empty()
    }

    /// Returns terms that should be highlighted in matching rows.
    pub fn highlight_terms(&self) -> Vec<String> {
        derive_highlight_terms(&self.expression)
    }

    pub fn matches_at(&self, document: &Document, index: NodeIndex, now: DateTime<Local>) -> bool {
        self.expression.matches_at(document, index, now)
    }
}
