//! Query expression types and AST nodes.

use std::fmt;

use chrono::{DateTime, Local};

use crate::clock::{Clock, SystemClock};
use crate::document::Document;
use crate::storage::NodeIndex;

use super::comparator::Comparator;
use super::context::NodeQueryContext;
use super::date_filter::DatePredicate;
use super::evaluate::evaluate_node_query_expression;

/// A parsed query expression (AST node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpression {
    Term(QueryTerm),
    Not(Box<QueryExpression>),
    /// An empty conjunction matches every node.
    And(Vec<QueryExpression>),
    Or(Vec<QueryExpression>),
}

/// A single query term (leaf node in the AST).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTerm {
    /// Lowercased substring of the node text.
    Text(String),
    Filter(QueryFilter),
}

/// A query filter (typed constraint).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// `d:` - number of ancestor hops, 0 for roots.
    Depth { comparator: Comparator, value: usize },
    /// `children:` - owned children only.
    ChildCount { comparator: Comparator, value: usize },
    /// `@key` with an optional comparison. Always requires the key.
    Attribute {
        key: String,
        predicate: Option<AttributePredicate>,
    },
    /// `c:` / `m:`
    Date {
        field: DateField,
        predicate: DatePredicate,
    },
    /// `p:` - the immediate parent matches.
    Parent(Box<QueryExpression>),
    /// `a:` - some ancestor matches.
    Ancestor(Box<QueryExpression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Created,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributePredicate {
    /// Exact equality, or numeric/lexical ordering.
    Text { comparator: Comparator, value: String },
    /// Chosen when the query value reads as a date.
    Date(DatePredicate),
}

impl QueryExpression {
    /// Tests a node against the expression using the system clock for
    /// relative dates.
    pub fn matches(&self, document: &Document, index: NodeIndex) -> bool {
        self.matches_at(document, index, SystemClock.now())
    }

    /// Tests a node with relative dates resolved against `now`.
    pub fn matches_at(&self, document: &Document, index: NodeIndex, now: DateTime<Local>) -> bool {
        match NodeQueryContext::new(document, index, now.date_naive()) {
            Some(context) => evaluate_node_query_expression(self, &context),
            None => false,
        }
    }

    /// Returns true for the empty conjunction produced by a blank query.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::And(parts) if parts.is_empty())
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(term) => write!(f, "{term}"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::And(parts) if parts.is_empty() => f.write_str("*"),
            Self::And(parts) => write_joined(f, parts, " AND "),
            Self::Or(parts) => write_joined(f, parts, " OR "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[QueryExpression], separator: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{part}")?;
    }
    f.write_str(")")
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Filter(filter) => write!(f, "{filter}"),
        }
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depth { comparator, value } => write!(f, "d:{comparator}{value}"),
            Self::ChildCount { comparator, value } => write!(f, "children:{comparator}{value}"),
            Self::Attribute { key, predicate } => {
                write!(f, "@{key}")?;
                match predicate {
                    None => Ok(()),
                    Some(AttributePredicate::Text { comparator, value }) => {
                        write!(f, "{comparator}{value:?}")
                    }
                    Some(AttributePredicate::Date(predicate)) => write!(f, "{predicate}"),
                }
            }
            Self::Date { field, predicate } => match field {
                DateField::Created => write!(f, "c:{predicate}"),
                DateField::Modified => write!(f, "m:{predicate}"),
            },
            Self::Parent(inner) => write!(f, "PARENT({inner})"),
            Self::Ancestor(inner) => write!(f, "ANCESTOR({inner})"),
        }
    }
}
