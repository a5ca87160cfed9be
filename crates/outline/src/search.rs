//! Document scans and search node refresh.

use chrono::{DateTime, Local};

use crate::clock::{Clock, SystemClock};
use crate::config::SearchConfig;
use crate::document::{search_query, Document};
use crate::error::OutlineError;
use crate::query::{
    evaluate_node_query_expression, NodeQueryContext, QueryExpression, SearchQueryMatcher,
};
use crate::storage::{Node, NodeId, NodeIndex};

/// Returns every real node matching `expression`, in tree pre-order.
///
/// Virtual references are never followed. Relative dates resolve against the
/// system clock.
pub fn get_matching_items<'a>(document: &'a Document, expression: &QueryExpression) -> Vec<&'a Node> {
    get_matching_items_at(document, expression, SystemClock.now())
}

/// Like [`get_matching_items`], with every node evaluated against `now`.
pub fn get_matching_items_at<'a>(
    document: &'a Document,
    expression: &QueryExpression,
    now: DateTime<Local>,
) -> Vec<&'a Node> {
    matching_indices(document, expression, now)
        .into_iter()
        .filter_map(|index| document.node(index))
        .collect()
}

/// Arena indices of the matching nodes, in tree pre-order.
pub fn matching_indices(
    document: &Document,
    expression: &QueryExpression,
    now: DateTime<Local>,
) -> Vec<NodeIndex> {
    let today = now.date_naive();
    document
        .iter_preorder()
        .filter(|(index, _)| {
            NodeQueryContext::new(document, *index, today)
                .is_some_and(|context| evaluate_node_query_expression(expression, &context))
        })
        .map(|(index, _)| index)
        .collect()
}

/// Outcome of [`refresh_search_nodes`].
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Search nodes whose reference list was rewritten.
    pub refreshed: usize,
    /// Sum of resolved links over all refreshed nodes.
    pub total_matches: usize,
    /// Search nodes whose query failed to parse. They were populated with an
    /// empty list.
    pub errors: Vec<(NodeId, OutlineError)>,
}

/// Re-runs the query of every search node and repopulates its references,
/// then resolves the whole document once.
pub fn refresh_search_nodes(
    document: &mut Document,
    config: &SearchConfig,
    clock: &dyn Clock,
) -> RefreshReport {
    let now = clock.now();
    let mut report = RefreshReport::default();

    for index in document.search_nodes(config) {
        let Some(node) = document.node(index) else {
            continue;
        };
        let id = node.id();
        let query = search_query(node, config).unwrap_or_default().to_string();

        let matches = match SearchQueryMatcher::compile(&query) {
            Ok(matcher) if matcher.is_blank() => Vec::new(),
            Ok(matcher) => matching_indices(document, matcher.expression(), now)
                .into_iter()
                .filter_map(|index| document.node(index).map(Node::id))
                .collect(),
            Err(error) => {
                log::warn!("search node {id} has an invalid query {query:?}: {error}");
                report.errors.push((id, error));
                Vec::new()
            }
        };

        match document.populate_search_node(index, matches) {
            Ok(count) => {
                report.refreshed += 1;
                report.total_matches += count;
            }
            Err(error) => report.errors.push((id, error)),
        }
    }

    let stats = document.resolve_virtual_children();
    log::debug!(
        "refreshed {} search nodes: {} matches, {} errors, {} cycle breaks",
        report.refreshed,
        report.total_matches,
        report.errors.len(),
        stats.cycle_breaks
    );
    report
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::clock::FixedClock;
    use crate::query::QueryParser;

    fn texts<'a>(nodes: &[&'a Node]) -> Vec<&'a str> {
        nodes.iter().map(|node| node.text()).collect()
    }

    #[test]
    fn scan_returns_tree_order() {
        let mut document = Document::new();
        let first = document.add_root(Node::new("apple pie"));
        document.add_child(first, Node::new("apple tart")).unwrap();
        document.add_root(Node::new("banana"));
        document.add_root(Node::new("Apple juice"));

        let expression = QueryParser::parse("apple").unwrap();
        assert_eq!(
            texts(&get_matching_items(&document, &expression)),
            vec!["apple pie", "apple tart", "Apple juice"]
        );
    }

    #[test]
    fn empty_expression_matches_everything() {
        let mut document = Document::new();
        let root = document.add_root(Node::new("a"));
        document.add_child(root, Node::new("b")).unwrap();
        let everything = QueryParser::parse("").unwrap();
        assert_eq!(get_matching_items(&document, &everything).len(), 2);
    }

    #[test]
    fn scan_does_not_follow_virtual_refs() {
        let mut document = Document::new();
        let target = document.add_root(Node::new("needle"));
        let target_id = document.node(target).unwrap().id();
        let search = document.add_root(Node::new("results"));
        document.populate_search_node(search, [target_id]).unwrap();

        let expression = QueryParser::parse("needle").unwrap();
        assert_eq!(texts(&get_matching_items(&document, &expression)), vec!["needle"]);
    }

    #[test]
    fn refresh_populates_search_nodes() {
        let config = SearchConfig::default();
        let mut document = Document::new();
        let projects = document.add_root(Node::new("Projects"));
        document.add_child(projects, Node::new("task one")).unwrap();
        document.add_child(projects, Node::new("task two")).unwrap();
        let search = document
            .add_search_node(None, "Open tasks", "task", &config)
            .unwrap();

        let clock = FixedClock(Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap());
        let report = refresh_search_nodes(&mut document, &config, &clock);

        assert_eq!(report.refreshed, 1);
        assert_eq!(report.total_matches, 2);
        assert!(report.errors.is_empty());
        let children: Vec<&str> = document
            .virtual_children(search)
            .map(|(_, node)| node.text())
            .collect();
        assert_eq!(children, vec!["task one", "task two"]);
    }

    #[test]
    fn refresh_excludes_the_search_node_itself() {
        let config = SearchConfig::default();
        let mut document = Document::new();
        document.add_root(Node::new("todo: call"));
        let search = document
            .add_search_node(None, "todo list", "todo", &config)
            .unwrap();

        let report = refresh_search_nodes(&mut document, &config, &SystemClock);
        assert_eq!(report.total_matches, 1);
        let search_id = document.node(search).unwrap().id();
        assert!(!document.node(search).unwrap().virtual_refs().contains(&search_id));
    }

    #[test]
    fn refresh_records_parse_errors() {
        let config = SearchConfig::default();
        let mut document = Document::new();
        let target = document.add_root(Node::new("x"));
        let target_id = document.node(target).unwrap().id();
        let broken = document
            .add_search_node(None, "broken", "(x", &config)
            .unwrap();
        document.populate_search_node(broken, [target_id]).unwrap();

        let report = refresh_search_nodes(&mut document, &config, &SystemClock);
        assert_eq!(report.errors.len(), 1);
        let (id, error) = &report.errors[0];
        assert_eq!(*id, document.node(broken).unwrap().id());
        assert!(matches!(error, OutlineError::Syntax { position: 0, .. }));
        assert!(document.node(broken).unwrap().virtual_refs().is_empty());
    }

    #[test]
    fn refresh_treats_blank_query_as_no_results() {
        let config = SearchConfig::default();
        let mut document = Document::new();
        document.add_root(Node::new("anything"));
        let blank = document.add_search_node(None, "blank", "  ", &config).unwrap();

        let report = refresh_search_nodes(&mut document, &config, &SystemClock);
        assert_eq!(report.refreshed, 1);
        assert_eq!(report.total_matches, 0);
        assert!(document.node(blank).unwrap().virtual_refs().is_empty());
    }
}
