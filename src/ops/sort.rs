//! Stable multi-key sorting.

use std::cmp::Ordering;
use std::str::FromStr;

use super::{apply_to_table, require_column, Operation};
use crate::context::Context;
use crate::error::OperationError;
use crate::model::{compare_values, Content, Record, Value};

static NULL: Value = Value::Null;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// One sort key: a column and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Column to compare
    pub column: String,
    /// Direction
    pub direction: SortDirection,
}

impl SortKey {
    /// Ascending key.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending key.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let ord = compare_values(
            a.get(&self.column).unwrap_or(&NULL),
            b.get(&self.column).unwrap_or(&NULL),
        );
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// Parses `column`, `column:asc`, `column:desc`, or `-column` (descending).
impl FromStr for SortKey {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(column) = s.strip_prefix('-') {
            return Ok(Self::desc(column));
        }
        match s.rsplit_once(':') {
            Some((column, dir)) => match dir.to_ascii_lowercase().as_str() {
                "asc" | "ascending" => Ok(Self::asc(column)),
                "desc" | "descending" => Ok(Self::desc(column)),
                other => Err(OperationError::Other(format!(
                    "unknown sort direction '{}'",
                    other
                ))),
            },
            None => Ok(Self::asc(s)),
        }
    }
}

/// Stable sort by one or more keys.
///
/// Rows with equal keys keep their original relative order. Missing cells
/// compare as `null`, which sorts before every other value.
#[derive(Debug, Clone, Default)]
pub struct Sort {
    keys: Vec<SortKey>,
}

impl Sort {
    /// Sort by the given keys, most significant first.
    pub fn new(keys: impl IntoIterator<Item = SortKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Sort ascending by one column.
    pub fn ascending(column: impl Into<String>) -> Self {
        Self::new([SortKey::asc(column)])
    }

    /// Sort descending by one column.
    pub fn descending(column: impl Into<String>) -> Self {
        Self::new([SortKey::desc(column)])
    }

    /// Add a less significant key.
    pub fn then_by(mut self, key: SortKey) -> Self {
        self.keys.push(key);
        self
    }

    /// Sort keys, most significant first.
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }
}

impl Operation for Sort {
    fn name(&self) -> &str {
        "sort"
    }

    fn validate(&self) -> Result<(), OperationError> {
        if self.keys.is_empty() {
            return Err(OperationError::NoSortKeys);
        }
        if let Some(i) = self.keys.iter().position(|k| k.column.is_empty()) {
            return Err(OperationError::EmptySortColumn(i));
        }
        Ok(())
    }

    fn apply(&self, _cx: &Context, content: &Content) -> Result<Content, OperationError> {
        apply_to_table(content, |table| {
            for key in &self.keys {
                require_column(table, &key.column)?;
            }

            let mut rows = table.rows().to_vec();
            rows.sort_by(|a, b| {
                self.keys
                    .iter()
                    .map(|k| k.compare(a, b))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
            Ok(table.clone().with_rows_unchecked(rows))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{record, Table};
    use serde_json::json;

    fn people() -> Content {
        let rows = vec![
            record([("name", json!("carol")), ("team", json!("b")), ("age", json!(41))]),
            record([("name", json!("alice")), ("team", json!("a")), ("age", json!(30))]),
            record([("name", json!("bob")), ("team", json!("b")), ("age", json!(30))]),
            record([("name", json!("dave")), ("team", json!("a"))]),
        ];
        Content::table("people", Table::from_rows(["name", "team", "age"], rows).unwrap())
    }

    fn names(content: &Content) -> Vec<String> {
        content
            .as_table()
            .unwrap()
            .rows()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_sort_ascending_nulls_first() {
        let out = Sort::ascending("age")
            .apply(&Context::background(), &people())
            .unwrap();
        assert_eq!(names(&out), vec!["dave", "alice", "bob", "carol"]);
    }

    #[test]
    fn test_sort_multi_key() {
        let sort = Sort::new([SortKey::asc("team"), SortKey::desc("age")]);
        let out = sort.apply(&Context::background(), &people()).unwrap();
        assert_eq!(names(&out), vec!["alice", "dave", "carol", "bob"]);
    }

    #[test]
    fn test_sort_is_stable() {
        // alice and bob share age 30 and must keep their input order
        let out = Sort::descending("age")
            .apply(&Context::background(), &people())
            .unwrap();
        assert_eq!(names(&out), vec!["carol", "alice", "bob", "dave"]);
    }

    #[test]
    fn test_sort_missing_column_fails_apply() {
        let sort = Sort::ascending("salary");
        assert!(sort.validate().is_ok());
        let err = sort.apply(&Context::background(), &people()).unwrap_err();
        assert_eq!(err, OperationError::ColumnNotFound("salary".into()));
    }

    #[test]
    fn test_sort_validation() {
        assert_eq!(Sort::default().validate(), Err(OperationError::NoSortKeys));
        let sort = Sort::ascending("a").then_by(SortKey::desc(""));
        assert_eq!(sort.validate(), Err(OperationError::EmptySortColumn(1)));
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("age".parse::<SortKey>().unwrap(), SortKey::asc("age"));
        assert_eq!("age:desc".parse::<SortKey>().unwrap(), SortKey::desc("age"));
        assert_eq!("-age".parse::<SortKey>().unwrap(), SortKey::desc("age"));
        assert!("age:sideways".parse::<SortKey>().is_err());
    }
}
