//! Recursive-descent query parser.
//!
//! Precedence from loosest to tightest: `|`, then AND (adjacency or `+`),
//! then leading `-`, then atoms. `-` applies to exactly one following atom.
//!
//! Groups, `-` prefixes and sub-filters share one nesting counter capped at
//! [`MAX_NESTING_DEPTH`]; deeper queries are rejected as syntax errors.

use crate::error::{OutlineError, Result};

use super::comparator::Comparator;
use super::date_filter::{DateExpr, DatePredicate};
use super::expression::{AttributePredicate, DateField, QueryExpression, QueryFilter, QueryTerm};
use super::tokenizer::{
    too_deep, tokenize_nested, FilterKind, QueryToken, QueryTokenKind, RawFilter,
    MAX_NESTING_DEPTH,
};

pub struct QueryParser {
    tokens: Vec<QueryToken>,
    index: usize,
    input_len: usize,
    depth: usize,
}

impl QueryParser {
    /// Parses a query. A blank query yields the empty conjunction.
    pub fn parse(input: &str) -> Result<QueryExpression> {
        Self::parse_nested(input, 0)
    }

    fn parse_nested(input: &str, depth: usize) -> Result<QueryExpression> {
        let tokens = tokenize_nested(input, depth)?;
        if tokens.is_empty() {
            return Ok(QueryExpression::And(Vec::new()));
        }

        let mut parser = Self {
            tokens,
            index: 0,
            input_len: input.len(),
            depth,
        };
        let expression = parser.parse_or_expression()?;
        if let Some(token) = parser.peek() {
            return Err(OutlineError::syntax(
                token.position,
                format!("unexpected {}", token.kind.describe()),
            ));
        }

        Ok(expression)
    }

    fn parse_or_expression(&mut self) -> Result<QueryExpression> {
        let mut parts = vec![self.parse_and_expression()?];

        while let Some(position) = self.consume_if(|kind| matches!(kind, QueryTokenKind::Or)) {
            if !self.next_starts_operand() && !self.next_is(|kind| matches!(kind, QueryTokenKind::And))
            {
                return Err(OutlineError::syntax(
                    position,
                    "'|' must be followed by a query term",
                ));
            }
            parts.push(self.parse_and_expression()?);
        }

        Ok(match parts.len() {
            1 => parts.remove(0),
            _ => QueryExpression::Or(parts),
        })
    }

    fn parse_and_expression(&mut self) -> Result<QueryExpression> {
        let mut parts = Vec::new();

        loop {
            if let Some(position) = self.consume_if(|kind| matches!(kind, QueryTokenKind::And)) {
                if !self.next_starts_operand() {
                    return Err(OutlineError::syntax(
                        position,
                        "'+' must be followed by a query term",
                    ));
                }
                continue;
            }
            if !self.next_starts_operand() {
                break;
            }
            parts.push(self.parse_not_expression()?);
        }

        match parts.len() {
            0 => Err(self.expected_term()),
            1 => Ok(parts.remove(0)),
            _ => Ok(QueryExpression::And(parts)),
        }
    }

    fn parse_not_expression(&mut self) -> Result<QueryExpression> {
        if let Some(position) = self.consume_if(|kind| matches!(kind, QueryTokenKind::Not)) {
            if !self.next_starts_operand() {
                return Err(OutlineError::syntax(
                    position,
                    "'-' must be followed by a query term",
                ));
            }
            self.descend(position)?;
            let inner = self.parse_not_expression();
            self.depth -= 1;
            return Ok(QueryExpression::Not(Box::new(inner?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<QueryExpression> {
        let Some(token) = self.next() else {
            return Err(self.expected_term());
        };

        match token.kind {
            QueryTokenKind::LParen => self.parse_group(token.position),
            QueryTokenKind::Text(text) | QueryTokenKind::Quoted(text) => {
                Ok(QueryExpression::Term(QueryTerm::Text(text.to_lowercase())))
            }
            QueryTokenKind::Filter(raw) => {
                let filter = parse_filter(raw, token.position, self.depth)?;
                Ok(QueryExpression::Term(QueryTerm::Filter(filter)))
            }
            other => Err(OutlineError::syntax(
                token.position,
                format!("expected a query term, found {}", other.describe()),
            )),
        }
    }

    fn parse_group(&mut self, open_position: usize) -> Result<QueryExpression> {
        if self.next_is(|kind| matches!(kind, QueryTokenKind::RParen)) {
            return Err(OutlineError::syntax(open_position, "empty group '()'"));
        }

        self.descend(open_position)?;
        let expression = self.parse_or_expression();
        self.depth -= 1;
        let expression = expression?;
        if self
            .consume_if(|kind| matches!(kind, QueryTokenKind::RParen))
            .is_some()
        {
            return Ok(expression);
        }

        Err(OutlineError::syntax(open_position, "missing closing ')'"))
    }

    /// Enters one nesting level for the token at `position`.
    fn descend(&mut self, position: usize) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(too_deep(position));
        }
        self.depth += 1;
        Ok(())
    }

    fn next_starts_operand(&self) -> bool {
        self.next_is(|kind| {
            matches!(
                kind,
                QueryTokenKind::Text(_)
                    | QueryTokenKind::Quoted(_)
                    | QueryTokenKind::Filter(_)
                    | QueryTokenKind::LParen
                    | QueryTokenKind::Not
            )
        })
    }

    fn next_is(&self, predicate: impl Fn(&QueryTokenKind) -> bool) -> bool {
        self.peek().is_some_and(|token| predicate(&token.kind))
    }

    /// Consumes the next token if it satisfies `predicate`, returning its
    /// position.
    fn consume_if(&mut self, predicate: impl Fn(&QueryTokenKind) -> bool) -> Option<usize> {
        let position = self
            .peek()
            .filter(|token| predicate(&token.kind))?
            .position;
        self.index += 1;
        Some(position)
    }

    fn expected_term(&self) -> OutlineError {
        match self.peek() {
            Some(token) => OutlineError::syntax(
                token.position,
                format!("expected a query term, found {}", token.kind.describe()),
            ),
            None => OutlineError::syntax(self.input_len, "expected a query term"),
        }
    }

    fn peek(&self) -> Option<&QueryToken> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<QueryToken> {
        let token = self.tokens.get(self.index).cloned()?;
        self.index += 1;
        Some(token)
    }
}

// ---------------------------------------------------------------------------
// Filter parsing
// ---------------------------------------------------------------------------

fn parse_filter(raw: RawFilter, position: usize, depth: usize) -> Result<QueryFilter> {
    let RawFilter {
        kind,
        comparator,
        value,
        value_position,
    } = raw;
    let label = kind.to_string();

    match kind {
        FilterKind::Depth => {
            let (comparator, value) = parse_count(&label, comparator, &value, value_position)?;
            Ok(QueryFilter::Depth { comparator, value })
        }
        FilterKind::Children => {
            let (comparator, value) = parse_count(&label, comparator, &value, value_position)?;
            Ok(QueryFilter::ChildCount { comparator, value })
        }
        FilterKind::Created | FilterKind::Modified => {
            let field = if kind == FilterKind::Created {
                DateField::Created
            } else {
                DateField::Modified
            };
            let value = require_value(&label, &value, value_position)?;
            let expr = DateExpr::parse(value).ok_or_else(|| {
                OutlineError::syntax(
                    value_position,
                    format!("invalid date '{value}' for {label}, expected YYYY-MM-DD or [+-]Nd"),
                )
            })?;
            let predicate = DatePredicate::new(comparator.unwrap_or(Comparator::Eq), expr);
            Ok(QueryFilter::Date { field, predicate })
        }
        FilterKind::Attribute(key) => {
            if comparator.is_none() && value.is_empty() {
                return Ok(QueryFilter::Attribute {
                    key,
                    predicate: None,
                });
            }
            let comparator = comparator.unwrap_or(Comparator::Eq);
            let value = require_value(&label, &value, value_position)?;
            let predicate = match DateExpr::parse(value) {
                Some(expr) => AttributePredicate::Date(DatePredicate::new(comparator, expr)),
                None => AttributePredicate::Text {
                    comparator,
                    value: value.to_string(),
                },
            };
            Ok(QueryFilter::Attribute {
                key,
                predicate: Some(predicate),
            })
        }
        FilterKind::Parent | FilterKind::Ancestor => {
            if value.trim().is_empty() {
                return Err(OutlineError::syntax(
                    position,
                    format!("{label} requires an inner expression"),
                ));
            }
            if depth >= MAX_NESTING_DEPTH {
                return Err(too_deep(position));
            }
            let inner = QueryParser::parse_nested(&value, depth + 1)
                .map_err(|error| error.offset_by(value_position))?;
            let inner = Box::new(inner);
            Ok(if kind == FilterKind::Parent {
                QueryFilter::Parent(inner)
            } else {
                QueryFilter::Ancestor(inner)
            })
        }
    }
}

fn require_value<'v>(label: &str, value: &'v str, value_position: usize) -> Result<&'v str> {
    if value.is_empty() {
        return Err(OutlineError::syntax(
            value_position,
            format!("missing comparison value for {label}"),
        ));
    }
    Ok(value)
}

fn parse_count(
    label: &str,
    comparator: Option<Comparator>,
    value: &str,
    value_position: usize,
) -> Result<(Comparator, usize)> {
    let value = require_value(label, value, value_position)?;
    let count = value.parse::<usize>().map_err(|_| {
        OutlineError::syntax(
            value_position,
            format!("invalid number '{value}' for {label}"),
        )
    })?;
    Ok((comparator.unwrap_or(Comparator::Eq), count))
}
