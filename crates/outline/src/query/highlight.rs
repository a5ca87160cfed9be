//! Highlight term extraction.
//!
//! Collects the positive text terms of an expression so the editor can mark
//! them in matching rows. Terms under `NOT` are skipped, as are filter
//! values, since neither appears in the text of a matching node. Sub-filter
//! terms describe a parent or ancestor rather than the match itself and are
//! skipped as well.

use std::collections::BTreeSet;

use super::expression::{QueryExpression, QueryTerm};

/// Returns sorted, deduplicated, lowercased terms to highlight.
///
/// # Example
/// ```ignore
/// // "Report (draft | final) -old d:>1" -> ["draft", "final", "report"]
/// ```
pub fn derive_highlight_terms(expr: &QueryExpression) -> Vec<String> {
    let mut collector = HighlightCollector::default();
    collector.collect_expr(expr);
    collector.into_terms()
}

#[derive(Default)]
struct HighlightCollector {
    terms: BTreeSet<String>,
}

impl HighlightCollector {
    fn collect_expr(&mut self, expr: &QueryExpression) {
        match expr {
            QueryExpression::Term(QueryTerm::Text(text)) => self.push(text),
            QueryExpression::Term(QueryTerm::Filter(_)) | QueryExpression::Not(_) => {}
            QueryExpression::And(parts) | QueryExpression::Or(parts) => {
                for part in parts {
                    self.collect_expr(part);
                }
            }
        }
    }

    fn push(&mut self, candidate: &str) {
        let lowercased = candidate.trim().to_lowercase();
        if !lowercased.is_empty() {
            self.terms.insert(lowercased);
        }
    }

    fn into_terms(self) -> Vec<String> {
        self.terms.into_iter().collect()
    }
}
