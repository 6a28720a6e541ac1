//! Tabular content.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{display_value, Record, Value};
use crate::error::{Error, Result};
use crate::guard::format_guarded;

/// Per-column display formatter.
pub type CellFormatter = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// A table with an explicit, order-preserving schema.
///
/// The schema is the column order ("key order") used by every renderer.
/// Every row's keys are a subset of the schema; a missing key renders as an
/// empty cell and compares as `null`.
#[derive(Clone)]
pub struct Table {
    schema: Vec<String>,
    rows: Vec<Record>,
    caption: Option<String>,
    formatters: BTreeMap<String, CellFormatter>,
}

impl Table {
    /// Create an empty table with the given columns.
    ///
    /// Duplicate column names are dropped, keeping the first occurrence.
    pub fn new<S: Into<String>>(schema: impl IntoIterator<Item = S>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for name in schema {
            let name = name.into();
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
        Self {
            schema: columns,
            rows: Vec::new(),
            caption: None,
            formatters: BTreeMap::new(),
        }
    }

    /// Create a table from a schema and rows, checking that every row only
    /// uses columns from the schema.
    pub fn from_rows<S: Into<String>>(
        schema: impl IntoIterator<Item = S>,
        rows: Vec<Record>,
    ) -> Result<Self> {
        let table = Self::new(schema);
        for (i, row) in rows.iter().enumerate() {
            if let Some(key) = row.keys().find(|k| !table.has_column(k)) {
                return Err(Error::InvalidDocument(format!(
                    "row {} has column '{}' which is not in the schema",
                    i, key
                )));
            }
        }
        Ok(table.with_rows_unchecked(rows))
    }

    /// Add a row, checking it against the schema.
    pub fn with_row(mut self, row: Record) -> Result<Self> {
        if let Some(key) = row.keys().find(|k| !self.has_column(k)) {
            return Err(Error::InvalidDocument(format!(
                "column '{}' is not in the schema",
                key
            )));
        }
        self.rows.push(row);
        Ok(self)
    }

    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Attach a display formatter for one column.
    pub fn with_formatter<F>(mut self, column: impl Into<String>, formatter: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.formatters.insert(column.into(), Arc::new(formatter));
        self
    }

    /// Same table with the rows replaced. Callers keep rows within the schema.
    pub(crate) fn with_rows_unchecked(mut self, rows: Vec<Record>) -> Self {
        self.rows = rows;
        self
    }

    /// Same table with schema and rows replaced.
    pub(crate) fn with_parts_unchecked(mut self, schema: Vec<String>, rows: Vec<Record>) -> Self {
        self.schema = schema;
        self.rows = rows;
        self
    }

    /// Column names in order.
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Table caption.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the schema.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.iter().position(|c| c == name)
    }

    /// Check if the schema contains a column.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Value of a cell; missing keys read as `None`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Display text of a cell, using the column formatter if one is attached.
    ///
    /// A panicking formatter falls back to the plain display text.
    pub fn format_cell(&self, column: &str, value: Option<&Value>) -> String {
        let value = value.unwrap_or(&Value::Null);
        match self.formatters.get(column) {
            Some(formatter) => format_guarded(column, formatter.as_ref(), value),
            None => display_value(value),
        }
    }

    /// Display text of every cell of one row, in schema order.
    pub fn formatted_row(&self, row: &Record) -> Vec<String> {
        self.schema
            .iter()
            .map(|c| self.format_cell(c, row.get(c)))
            .collect()
    }

    /// Get plain text representation of the table (tab-separated, header first).
    pub fn plain_text(&self) -> String {
        let mut lines = vec![self.schema.join("\t")];
        for row in &self.rows {
            lines.push(self.formatted_row(row).join("\t"));
        }
        lines.join("\n")
    }

    /// Names of columns with an attached formatter.
    pub fn formatted_columns(&self) -> impl Iterator<Item = &str> {
        self.formatters.keys().map(|k| k.as_str())
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("schema", &self.schema)
            .field("rows", &self.rows)
            .field("caption", &self.caption)
            .field("formatters", &self.formatters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.rows == other.rows
            && self.caption == other.caption
            && self.formatters.keys().eq(other.formatters.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record;
    use serde_json::json;

    fn people() -> Table {
        Table::from_rows(
            ["name", "age"],
            vec![
                record([("name", json!("Alice")), ("age", json!(30))]),
                record([("name", json!("Bob"))]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_table_new() {
        let table = Table::new(["a", "b", "a"]);
        assert!(table.is_empty());
        assert_eq!(table.schema(), ["a", "b"]);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_table_rejects_unknown_column() {
        let result = Table::from_rows(["a"], vec![record([("b", json!(1))])]);
        assert!(matches!(result, Err(Error::InvalidDocument(_))));

        let result = Table::new(["a"]).with_row(record([("z", json!(1))]));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_cell_is_empty() {
        let table = people();
        assert_eq!(table.get(1, "age"), None);
        assert_eq!(table.formatted_row(&table.rows()[1]), vec!["Bob", ""]);
    }

    #[test]
    fn test_plain_text_follows_schema_order() {
        let table = people();
        assert_eq!(table.plain_text(), "name\tage\nAlice\t30\nBob\t");
    }

    #[test]
    fn test_formatter_applies() {
        let table = people().with_formatter("age", |v| format!("{} yrs", v));
        assert_eq!(table.format_cell("age", table.get(0, "age")), "30 yrs");
        assert_eq!(table.format_cell("name", table.get(0, "name")), "Alice");
    }

    #[test]
    fn test_panicking_formatter_falls_back() {
        let table = people().with_formatter("age", |_| panic!("no"));
        assert_eq!(table.format_cell("age", table.get(0, "age")), "30");
        assert_eq!(table.format_cell("name", table.get(1, "name")), "Bob");
    }
}
