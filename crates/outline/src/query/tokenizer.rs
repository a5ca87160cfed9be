//! Query tokenizer.
//!
//! Splits a raw query into a flat token stream. Filter words are recognized
//! here by prefix and carry their raw value; the parser validates values and
//! recursively parses `p:` / `a:` arguments.

use std::fmt;

use crate::error::{OutlineError, Result};

use super::comparator::Comparator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToken {
    pub kind: QueryTokenKind,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTokenKind {
    Text(String),
    Quoted(String),
    Filter(RawFilter),
    LParen,
    RParen,
    /// Explicit `+`.
    And,
    /// `|`.
    Or,
    /// Leading `-`.
    Not,
}

impl QueryTokenKind {
    /// Short form used in parser diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(text) => format!("'{text}'"),
            Self::Quoted(text) => format!("\"{text}\""),
            Self::Filter(filter) => format!("'{}'", filter.kind),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::And => "'+'".to_string(),
            Self::Or => "'|'".to_string(),
            Self::Not => "'-'".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    Depth,
    Created,
    Modified,
    Children,
    Parent,
    Ancestor,
    Attribute(String),
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depth => f.write_str("d:"),
            Self::Created => f.write_str("c:"),
            Self::Modified => f.write_str("m:"),
            Self::Children => f.write_str("children:"),
            Self::Parent => f.write_str("p:"),
            Self::Ancestor => f.write_str("a:"),
            Self::Attribute(key) => write!(f, "@{key}"),
        }
    }
}

/// A recognized filter word before value validation.
///
/// For `p:` and `a:` the comparator is always `None` and `value` is the raw
/// source text of the inner argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilter {
    pub kind: FilterKind,
    pub comparator: Option<Comparator>,
    pub value: String,
    pub value_position: usize,
}

/// Deepest nesting of groups, `-` prefixes and `p:` / `a:` sub-filters a
/// query may use.
pub const MAX_NESTING_DEPTH: usize = 256;

pub fn tokenize(input: &str) -> Result<Vec<QueryToken>> {
    tokenize_nested(input, 0)
}

/// Tokenizes a sub-filter argument found `depth` levels down.
pub(crate) fn tokenize_nested(input: &str, depth: usize) -> Result<Vec<QueryToken>> {
    let mut tokens = Vec::new();
    let mut cursor = 0usize;

    while let Some(ch) = input[cursor..].chars().next() {
        if ch.is_whitespace() {
            cursor += ch.len_utf8();
            continue;
        }

        let position = cursor;
        let kind = match ch {
            '(' => {
                cursor += 1;
                QueryTokenKind::LParen
            }
            ')' => {
                cursor += 1;
                QueryTokenKind::RParen
            }
            '|' => {
                cursor += 1;
                QueryTokenKind::Or
            }
            '+' => {
                cursor += 1;
                QueryTokenKind::And
            }
            '-' => {
                cursor += 1;
                QueryTokenKind::Not
            }
            '"' | '\'' => {
                let (phrase, next_cursor) = consume_quoted(input, cursor)?;
                cursor = next_cursor;
                QueryTokenKind::Quoted(phrase)
            }
            _ => {
                let (kind, next_cursor) = scan_word_token(input, cursor, depth)?;
                cursor = next_cursor;
                kind
            }
        };
        tokens.push(QueryToken { kind, position });
    }

    Ok(tokens)
}

fn is_word_break(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '|')
}

fn is_quote(ch: char) -> bool {
    matches!(ch, '"' | '\'')
}

fn match_filter_prefix(rest: &str) -> Option<(usize, FilterKind)> {
    [
        ("children:", FilterKind::Children),
        ("d:", FilterKind::Depth),
        ("c:", FilterKind::Created),
        ("m:", FilterKind::Modified),
        ("p:", FilterKind::Parent),
        ("a:", FilterKind::Ancestor),
    ]
    .into_iter()
    .find(|(prefix, _)| {
        rest.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
    .map(|(prefix, kind)| (prefix.len(), kind))
}

/// Scans one word starting at `start`, classifying it as a filter or text.
fn scan_word_token(input: &str, start: usize, depth: usize) -> Result<(QueryTokenKind, usize)> {
    let rest = &input[start..];
    if rest.starts_with('@') {
        if let Some(scanned) = scan_attribute(input, start)? {
            return Ok(scanned);
        }
    } else if let Some((prefix_len, kind)) = match_filter_prefix(rest) {
        let value_position = start + prefix_len;
        if matches!(kind, FilterKind::Parent | FilterKind::Ancestor) {
            if depth >= MAX_NESTING_DEPTH {
                return Err(too_deep(start));
            }
            let end = argument_end(input, value_position, depth + 1)?;
            let filter = RawFilter {
                kind,
                comparator: None,
                value: input[value_position..end].to_string(),
                value_position,
            };
            return Ok((QueryTokenKind::Filter(filter), end));
        }
        return scan_comparison(input, value_position, kind);
    }

    let (text, end) = scan_word(input, start)?;
    Ok((QueryTokenKind::Text(text), end))
}

/// Scans `@key[CMP VALUE]`. Returns `None` when the key is empty.
fn scan_attribute(input: &str, start: usize) -> Result<Option<(QueryTokenKind, usize)>> {
    let key_start = start + 1;
    let mut key_end = key_start;
    while let Some(ch) = input[key_end..].chars().next() {
        if is_word_break(ch) || matches!(ch, '<' | '>' | '=') || input[key_end..].starts_with("!=")
        {
            break;
        }
        key_end += ch.len_utf8();
    }
    if key_end == key_start {
        return Ok(None);
    }

    let key = input[key_start..key_end].to_string();
    scan_comparison(input, key_end, FilterKind::Attribute(key)).map(Some)
}

fn scan_comparison(input: &str, at: usize, kind: FilterKind) -> Result<(QueryTokenKind, usize)> {
    let (comparator, remainder) = Comparator::split_prefix(&input[at..]);
    let value_position = input.len() - remainder.len();
    let (value, end) = scan_word(input, value_position)?;
    let filter = RawFilter {
        kind,
        comparator,
        value,
        value_position,
    };
    Ok((QueryTokenKind::Filter(filter), end))
}

/// Reads a bare word. A quote directly after `=`, `<`, `>` or `:` opens a
/// quoted section that may contain separators.
fn scan_word(input: &str, start: usize) -> Result<(String, usize)> {
    let mut word = String::new();
    let mut cursor = start;

    while let Some(ch) = input[cursor..].chars().next() {
        if is_word_break(ch) {
            break;
        }
        if is_quote(ch) && input[..cursor].ends_with(['=', '<', '>', ':']) {
            let (quoted, next_cursor) = consume_quoted(input, cursor)?;
            word.push_str(&quoted);
            cursor = next_cursor;
            continue;
        }
        word.push(ch);
        cursor += ch.len_utf8();
    }

    Ok((word, cursor))
}

/// Finds the end of a `p:` / `a:` argument starting at `start`.
fn argument_end(input: &str, start: usize, depth: usize) -> Result<usize> {
    // Leading `-` prefixes belong to the argument.
    let start = input.len() - input[start..].trim_start_matches('-').len();
    let Some(ch) = input[start..].chars().next() else {
        return Ok(start);
    };
    match ch {
        '(' => group_end(input, start),
        '"' | '\'' => consume_quoted(input, start).map(|(_, end)| end),
        ch if is_word_break(ch) => Ok(start),
        _ => scan_word_token(input, start, depth).map(|(_, end)| end),
    }
}

pub(crate) fn too_deep(position: usize) -> OutlineError {
    OutlineError::syntax(
        position,
        format!("query nests deeper than {MAX_NESTING_DEPTH} levels"),
    )
}

/// Returns the byte offset just past the `)` balancing the `(` at `start`.
fn group_end(input: &str, start: usize) -> Result<usize> {
    let mut depth = 0usize;
    let mut cursor = start;

    while let Some(ch) = input[cursor..].chars().next() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(cursor + 1);
                }
            }
            ch if is_quote(ch) && opens_quote_in_group(input, cursor) => {
                let (_, next_cursor) = consume_quoted(input, cursor)?;
                cursor = next_cursor;
                continue;
            }
            _ => {}
        }
        cursor += ch.len_utf8();
    }

    Err(OutlineError::syntax(start, "missing closing ')'"))
}

fn opens_quote_in_group(input: &str, at: usize) -> bool {
    match input[..at].chars().next_back() {
        None => true,
        Some(prev) => {
            prev.is_whitespace()
                || matches!(prev, '(' | ')' | '|' | '+' | '-' | '=' | '<' | '>' | ':')
        }
    }
}

/// Consumes a quoted run starting at the opening quote. A backslash escapes
/// the quote character or another backslash and is kept literally otherwise.
fn consume_quoted(input: &str, start: usize) -> Result<(String, usize)> {
    let Some(quote) = input[start..].chars().next() else {
        return Err(OutlineError::syntax(start, "expected a quote"));
    };
    let mut cursor = start + quote.len_utf8();
    let mut phrase = String::new();
    let mut escaped = false;

    while let Some(ch) = input[cursor..].chars().next() {
        cursor += ch.len_utf8();

        if escaped {
            if ch != quote && ch != '\\' {
                phrase.push('\\');
            }
            phrase.push(ch);
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == quote {
            return Ok((phrase, cursor));
        }

        phrase.push(ch);
    }

    Err(OutlineError::syntax(start, "missing closing quote"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<QueryTokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn text(value: &str) -> QueryTokenKind {
        QueryTokenKind::Text(value.to_string())
    }

    fn filter(
        kind: FilterKind,
        comparator: Option<Comparator>,
        value: &str,
        value_position: usize,
    ) -> QueryTokenKind {
        QueryTokenKind::Filter(RawFilter {
            kind,
            comparator,
            value: value.to_string(),
            value_position,
        })
    }

    #[test]
    fn operators_and_grouping() {
        assert_eq!(
            kinds("(a|b) -c + d"),
            vec![
                QueryTokenKind::LParen,
                text("a"),
                QueryTokenKind::Or,
                text("b"),
                QueryTokenKind::RParen,
                QueryTokenKind::Not,
                text("c"),
                QueryTokenKind::And,
                text("d"),
            ]
        );
    }

    #[test]
    fn positions_are_byte_offsets() {
        let tokens = tokenize("ab  (cd)").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|token| token.position).collect();
        assert_eq!(positions, vec![0, 4, 5, 7]);
    }

    #[test]
    fn inner_dashes_and_pluses_stay_in_words() {
        assert_eq!(kinds("well-known c++"), vec![text("well-known"), text("c++")]);
    }

    #[test]
    fn quoted_phrases() {
        assert_eq!(
            kinds(r#""a | b" 'it\'s'"#),
            vec![
                QueryTokenKind::Quoted("a | b".to_string()),
                QueryTokenKind::Quoted("it's".to_string()),
            ]
        );
    }

    #[test]
    fn backslash_only_escapes_quotes_and_itself() {
        assert_eq!(
            kinds(r#""C:\path" "say \"hi\"" "a\\b""#),
            vec![
                QueryTokenKind::Quoted(r"C:\path".to_string()),
                QueryTokenKind::Quoted(r#"say "hi""#.to_string()),
                QueryTokenKind::Quoted(r"a\b".to_string()),
            ]
        );
        assert_eq!(
            kinds(r#"@path="C:\tmp""#),
            vec![filter(
                FilterKind::Attribute("path".to_string()),
                Some(Comparator::Eq),
                r"C:\tmp",
                6
            )]
        );
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let error = tokenize("foo \"bar").unwrap_err();
        assert_eq!(error.position(), Some(4));
    }

    #[test]
    fn filter_prefixes_with_comparators() {
        assert_eq!(
            kinds("d:>=2 children:0 C:<2024-01-01 m:-7d"),
            vec![
                filter(FilterKind::Depth, Some(Comparator::Gte), "2", 4),
                filter(FilterKind::Children, None, "0", 15),
                filter(FilterKind::Created, Some(Comparator::Lt), "2024-01-01", 20),
                filter(FilterKind::Modified, None, "-7d", 33),
            ]
        );
    }

    #[test]
    fn missing_value_is_kept_empty() {
        assert_eq!(
            kinds("d:>"),
            vec![filter(FilterKind::Depth, Some(Comparator::Gt), "", 3)]
        );
    }

    #[test]
    fn attribute_filters() {
        assert_eq!(
            kinds("@status=done @due!=x @flag @n>3"),
            vec![
                filter(
                    FilterKind::Attribute("status".to_string()),
                    Some(Comparator::Eq),
                    "done",
                    8
                ),
                filter(
                    FilterKind::Attribute("due".to_string()),
                    Some(Comparator::Ne),
                    "x",
                    19
                ),
                filter(FilterKind::Attribute("flag".to_string()), None, "", 26),
                filter(
                    FilterKind::Attribute("n".to_string()),
                    Some(Comparator::Gt),
                    "3",
                    30
                ),
            ]
        );
    }

    #[test]
    fn attribute_values_may_be_quoted() {
        assert_eq!(
            kinds(r#"@status="in progress" x"#),
            vec![
                filter(
                    FilterKind::Attribute("status".to_string()),
                    Some(Comparator::Eq),
                    "in progress",
                    8
                ),
                text("x"),
            ]
        );
    }

    #[test]
    fn bare_at_sign_is_text() {
        assert_eq!(kinds("@ @=x"), vec![text("@"), text("@=x")]);
    }

    #[test]
    fn unknown_prefixes_are_text() {
        assert_eq!(
            kinds("note:thing https://x"),
            vec![text("note:thing"), text("https://x")]
        );
    }

    #[test]
    fn sub_filter_arguments() {
        assert_eq!(
            kinds("p:(a | b) x"),
            vec![filter(FilterKind::Parent, None, "(a | b)", 2), text("x")]
        );
        assert_eq!(
            kinds("a:@type=project"),
            vec![filter(FilterKind::Ancestor, None, "@type=project", 2)]
        );
        assert_eq!(
            kinds("p:a:(x y)"),
            vec![filter(FilterKind::Parent, None, "a:(x y)", 2)]
        );
        assert_eq!(
            kinds("a:-done"),
            vec![filter(FilterKind::Ancestor, None, "-done", 2)]
        );
        assert_eq!(
            kinds(r#"p:"two words""#),
            vec![filter(FilterKind::Parent, None, r#""two words""#, 2)]
        );
    }

    #[test]
    fn empty_sub_filter_argument() {
        assert_eq!(
            kinds("p: x"),
            vec![filter(FilterKind::Parent, None, "", 2), text("x")]
        );
    }

    #[test]
    fn sub_filter_chains_are_bounded() {
        let at_limit = format!("{}x", "p:".repeat(MAX_NESTING_DEPTH));
        assert_eq!(tokenize(&at_limit).unwrap().len(), 1);

        let over_limit = format!("{}x", "p:".repeat(MAX_NESTING_DEPTH + 1));
        let error = tokenize(&over_limit).unwrap_err();
        assert_eq!(error.position(), Some(2 * MAX_NESTING_DEPTH));
    }

    #[test]
    fn long_negation_prefix_in_sub_filter() {
        let input = format!("a:{}x", "-".repeat(10_000));
        let tokens = tokenize(&input).unwrap();
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn unbalanced_sub_filter_group() {
        let error = tokenize("x p:(a").unwrap_err();
        assert_eq!(error.position(), Some(4));
    }
}
