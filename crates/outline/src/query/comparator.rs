//! Comparison operators shared by numeric, lexical, and date filters.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    Ne,
}

impl Comparator {
    /// Splits a leading comparator off `raw`, trying two-character operators
    /// first.
    pub fn split_prefix(raw: &str) -> (Option<Self>, &str) {
        for (operator, kind) in [
            (">=", Self::Gte),
            ("<=", Self::Lte),
            ("!=", Self::Ne),
            (">", Self::Gt),
            ("<", Self::Lt),
            ("=", Self::Eq),
        ] {
            if let Some(value) = raw.strip_prefix(operator) {
                return (Some(kind), value);
            }
        }
        (None, raw)
    }

    /// Applies the comparator to `left.cmp(right)`.
    pub fn matches_ordering(self, ordering: Ordering) -> bool {
        match self {
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
        }
    }

    pub fn compare<T: Ord + ?Sized>(self, left: &T, right: &T) -> bool {
        self.matches_ordering(left.cmp(right))
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Lte | Self::Gt | Self::Gte)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Eq => "=",
            Self::Ne => "!=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
