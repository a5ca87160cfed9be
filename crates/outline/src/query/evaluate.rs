//! Query evaluation logic for matching terms against nodes.

use std::cmp::Ordering;

use memchr::memmem;

use super::comparator::Comparator;
use super::context::NodeQueryContext;
use super::date_filter::parse_attribute_instant;
use super::expression::{AttributePredicate, DateField, QueryExpression, QueryFilter, QueryTerm};

/// Evaluates an expression with short-circuit boolean composition.
pub fn evaluate_node_query_expression(
    expression: &QueryExpression,
    context: &NodeQueryContext,
) -> bool {
    match expression {
        QueryExpression::Term(term) => evaluate_node_query_term(term, context),
        QueryExpression::Not(inner) => !evaluate_node_query_expression(inner, context),
        QueryExpression::And(parts) => parts
            .iter()
            .all(|part| evaluate_node_query_expression(part, context)),
        QueryExpression::Or(parts) => parts
            .iter()
            .any(|part| evaluate_node_query_expression(part, context)),
    }
}

/// Evaluates a query term against a NodeQueryContext.
pub fn evaluate_node_query_term(term: &QueryTerm, context: &NodeQueryContext) -> bool {
    match term {
        QueryTerm::Text(needle) => {
            memmem::find(context.lowered_text().as_bytes(), needle.as_bytes()).is_some()
        }
        QueryTerm::Filter(filter) => evaluate_node_query_filter(filter, context),
    }
}

fn evaluate_node_query_filter(filter: &QueryFilter, context: &NodeQueryContext) -> bool {
    let node = context.node();
    match filter {
        QueryFilter::Depth { comparator, value } => context
            .view()
            .compute_depth()
            .is_some_and(|depth| comparator.compare(&depth, value)),
        QueryFilter::ChildCount { comparator, value } => {
            comparator.compare(&node.children().len(), value)
        }
        QueryFilter::Attribute { key, predicate } => {
            let Some(actual) = node.attribute(key) else {
                return false;
            };
            match predicate {
                None => true,
                Some(predicate) => attribute_matches(predicate, actual, context),
            }
        }
        QueryFilter::Date { field, predicate } => {
            let instant = match field {
                DateField::Created => node.metadata.created,
                DateField::Modified => node.metadata.modified,
            };
            predicate.matches(instant, context.today())
        }
        QueryFilter::Parent(inner) => node
            .parent()
            .and_then(|parent| context.related(parent))
            .is_some_and(|parent| evaluate_node_query_expression(inner, &parent)),
        QueryFilter::Ancestor(inner) => context.view().ancestors().any(|ancestor| {
            context
                .related(ancestor)
                .is_some_and(|ancestor| evaluate_node_query_expression(inner, &ancestor))
        }),
    }
}

fn attribute_matches(predicate: &AttributePredicate, actual: &str, context: &NodeQueryContext) -> bool {
    match predicate {
        AttributePredicate::Text { comparator, value } => {
            if !comparator.is_ordering() {
                return comparator.compare(actual, value.as_str());
            }
            match numeric_ordering(actual, value) {
                Some(ordering) => comparator.matches_ordering(ordering),
                None => comparator.compare(actual, value.as_str()),
            }
        }
        AttributePredicate::Date(predicate) => match parse_attribute_instant(actual) {
            Some(instant) => predicate.matches(instant, context.today()),
            // A value that is not a date is never equal to one.
            None => predicate.comparator() == Comparator::Ne,
        },
    }
}

fn numeric_ordering(actual: &str, expected: &str) -> Option<Ordering> {
    let actual = actual.trim().parse::<f64>().ok()?;
    let expected = expected.trim().parse::<f64>().ok()?;
    actual.partial_cmp(&expected)
}
