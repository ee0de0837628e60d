//! Query-string filters.
//!
//! Every query parameter left over after relation selection becomes one
//! [`Clause`]. A `Min` suffix turns the parameter into an inclusive lower
//! bound and a `Max` suffix into an exclusive upper bound, so
//! `/events?startMin=2020-01-18&startMax=2020-02-01` selects events starting
//! in that window. Clauses are combined with `AND`.
//!
//! Values are carried as raw text; the store's parameter binding and column
//! affinity decide how they compare.

use std::collections::BTreeMap;
use std::fmt;

use compact_str::CompactString;

use crate::value::Value;

/// Comparison operator of a [`Clause`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// `=`
    Eq,
    /// `>=`, from a `Min` suffix
    Gte,
    /// `<`, from a `Max` suffix
    Lt,
}

impl Comparator {
    #[inline]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lt => "<",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One filter condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub key: CompactString,
    pub comparator: Comparator,
    pub value: Value,
}

impl Clause {
    pub fn new(key: impl Into<CompactString>, comparator: Comparator, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            comparator,
            value: value.into(),
        }
    }

    /// Equality clause, e.g. on the identifier column.
    pub fn eq(key: impl Into<CompactString>, value: impl Into<Value>) -> Self {
        Self::new(key, Comparator::Eq, value)
    }
}

const MIN_SUFFIX: &str = "Min";
const MAX_SUFFIX: &str = "Max";

/// Converts query parameters into filter clauses.
///
/// Output follows the map's key order (lexicographic), so equal inputs always
/// produce equal clause sequences.
pub fn parse(params: &BTreeMap<String, String>) -> Vec<Clause> {
    params
        .iter()
        .map(|(key, value)| {
            let (key, comparator) = if let Some(stripped) = key.strip_suffix(MIN_SUFFIX) {
                (stripped, Comparator::Gte)
            } else if let Some(stripped) = key.strip_suffix(MAX_SUFFIX) {
                (stripped, Comparator::Lt)
            } else {
                (key.as_str(), Comparator::Eq)
            };
            Clause::new(key, comparator, value.as_str())
        })
        .collect()
}
