//! Grouping with aggregates.
//!
//! Aggregate value policy:
//!
//! - `count` counts every row in the group, whatever its values.
//! - `sum` and `avg` only consider JSON numbers; nulls, missing cells, and
//!   non-numeric values (including numeric-looking strings) are skipped.
//!   `sum` of integers stays an integer unless it overflows `i64`, in which
//!   case it is computed as `f64`. `sum` of no numbers is `0`; `avg` of no
//!   numbers is `null`. A non-finite float result is reported as `null`.
//! - `min` and `max` skip nulls and missing cells and use the same total
//!   order as sorting. On ties the first-seen value wins.
//! - `first` is the group's first row value (`null` if missing).
//!
//! Rows fall into the same group when their key tuples are equal as JSON
//! values. `0.0` and `-0.0` are the same key; the integer `1` and the float
//! `1.0` are different keys.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Number;

use super::{apply_to_table, require_column, Operation};
use crate::context::Context;
use crate::error::OperationError;
use crate::guard::call_guarded;
use crate::model::{compare_values, Content, Record, Value};

/// Aggregate function computed over a group's rows.
#[derive(Clone)]
pub enum AggregateFn {
    /// Number of rows
    Count,
    /// Sum of numeric values of a column
    Sum(String),
    /// Mean of numeric values of a column
    Avg(String),
    /// Smallest non-null value of a column
    Min(String),
    /// Largest non-null value of a column
    Max(String),
    /// Value from the group's first row
    First(String),
    /// User-defined function over the group's rows
    Custom(Arc<dyn Fn(&[Record]) -> Value + Send + Sync>),
}

impl AggregateFn {
    fn source_column(&self) -> Option<&str> {
        match self {
            AggregateFn::Sum(c)
            | AggregateFn::Avg(c)
            | AggregateFn::Min(c)
            | AggregateFn::Max(c)
            | AggregateFn::First(c) => Some(c),
            AggregateFn::Count | AggregateFn::Custom(_) => None,
        }
    }
}

impl fmt::Debug for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFn::Count => write!(f, "Count"),
            AggregateFn::Sum(c) => write!(f, "Sum({})", c),
            AggregateFn::Avg(c) => write!(f, "Avg({})", c),
            AggregateFn::Min(c) => write!(f, "Min({})", c),
            AggregateFn::Max(c) => write!(f, "Max({})", c),
            AggregateFn::First(c) => write!(f, "First({})", c),
            AggregateFn::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}

/// A named aggregate: output column name plus function.
#[derive(Debug, Clone)]
pub struct Aggregate {
    name: String,
    func: AggregateFn,
}

impl Aggregate {
    /// Create an aggregate.
    pub fn new(name: impl Into<String>, func: AggregateFn) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    /// Row count, output as `count`.
    pub fn count() -> Self {
        Self::new("count", AggregateFn::Count)
    }

    /// Sum of a column, output as `sum_<column>`.
    pub fn sum(column: impl Into<String>) -> Self {
        let column = column.into();
        Self::new(format!("sum_{}", column), AggregateFn::Sum(column))
    }

    /// Mean of a column, output as `avg_<column>`.
    pub fn avg(column: impl Into<String>) -> Self {
        let column = column.into();
        Self::new(format!("avg_{}", column), AggregateFn::Avg(column))
    }

    /// Minimum of a column, output as `min_<column>`.
    pub fn min(column: impl Into<String>) -> Self {
        let column = column.into();
        Self::new(format!("min_{}", column), AggregateFn::Min(column))
    }

    /// Maximum of a column, output as `max_<column>`.
    pub fn max(column: impl Into<String>) -> Self {
        let column = column.into();
        Self::new(format!("max_{}", column), AggregateFn::Max(column))
    }

    /// First value of a column, output under the column's own name.
    pub fn first(column: impl Into<String>) -> Self {
        let column = column.into();
        Self::new(column.clone(), AggregateFn::First(column))
    }

    /// User-defined aggregate.
    pub fn custom<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Record]) -> Value + Send + Sync + 'static,
    {
        Self::new(name, AggregateFn::Custom(Arc::new(f)))
    }

    /// Rename the output column.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Output column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Aggregate function.
    pub fn func(&self) -> &AggregateFn {
        &self.func
    }

    fn compute(&self, rows: &[&Record]) -> Result<Value, OperationError> {
        let value = match &self.func {
            AggregateFn::Count => Value::from(rows.len()),
            AggregateFn::Sum(c) => sum(&present(rows, c)),
            AggregateFn::Avg(c) => {
                let numbers: Vec<f64> = present(rows, c)
                    .into_iter()
                    .filter_map(|v| v.as_f64())
                    .collect();
                if numbers.is_empty() {
                    Value::Null
                } else {
                    float_value(numbers.iter().sum::<f64>() / numbers.len() as f64)
                }
            }
            AggregateFn::Min(c) => present(rows, c)
                .into_iter()
                .reduce(|best, v| {
                    if compare_values(v, best).is_lt() {
                        v
                    } else {
                        best
                    }
                })
                .cloned()
                .unwrap_or(Value::Null),
            AggregateFn::Max(c) => present(rows, c)
                .into_iter()
                .reduce(|best, v| {
                    if compare_values(v, best).is_gt() {
                        v
                    } else {
                        best
                    }
                })
                .cloned()
                .unwrap_or(Value::Null),
            AggregateFn::First(c) => rows
                .first()
                .and_then(|r| r.get(c))
                .cloned()
                .unwrap_or(Value::Null),
            AggregateFn::Custom(f) => {
                let owned: Vec<Record> = rows.iter().map(|r| (*r).clone()).collect();
                call_guarded(&format!("aggregate '{}'", self.name), || f(&owned))?
            }
        };
        Ok(value)
    }
}

/// Non-null values of a column across rows.
fn present<'a>(rows: &[&'a Record], column: &str) -> Vec<&'a Value> {
    rows.iter()
        .filter_map(|r| r.get(column))
        .filter(|v| !v.is_null())
        .collect()
}

fn sum(values: &[&Value]) -> Value {
    let numbers: Vec<&Number> = values
        .iter()
        .filter_map(|v| match v {
            Value::Number(n) => Some(n),
            _ => None,
        })
        .collect();

    let mut int_total: Option<i64> = Some(0);
    for n in &numbers {
        int_total = match (int_total, n.as_i64()) {
            (Some(total), Some(i)) => total.checked_add(i),
            _ => None,
        };
    }
    match int_total {
        Some(total) => Value::from(total),
        None => float_value(numbers.iter().filter_map(|n| n.as_f64()).sum()),
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Partition rows by the values of some columns and emit one row per group.
///
/// Groups are emitted in the order their key tuple is first seen. Each output
/// row holds the group columns followed by one value per aggregate; the
/// output schema is `columns ++ aggregate names`. Missing group cells group
/// as `null`.
#[derive(Debug, Clone, Default)]
pub struct GroupBy {
    columns: Vec<String>,
    aggregates: Vec<Aggregate>,
}

impl GroupBy {
    /// Group by the given columns with the given aggregates.
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        aggregates: impl IntoIterator<Item = Aggregate>,
    ) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            aggregates: aggregates.into_iter().collect(),
        }
    }

    /// Add an aggregate.
    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    /// Grouping columns.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Aggregates.
    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }
}

impl Operation for GroupBy {
    fn name(&self) -> &str {
        "group_by"
    }

    fn validate(&self) -> Result<(), OperationError> {
        if self.columns.is_empty() {
            return Err(OperationError::NoGroupColumns);
        }
        if self.columns.iter().any(|c| c.is_empty()) {
            return Err(OperationError::EmptyColumnName);
        }
        if let Some(i) = self.aggregates.iter().position(|a| a.name.is_empty()) {
            return Err(OperationError::EmptyAggregateName(i));
        }

        let mut seen: Vec<&str> = Vec::new();
        for name in self
            .columns
            .iter()
            .map(|c| c.as_str())
            .chain(self.aggregates.iter().map(|a| a.name.as_str()))
        {
            if seen.contains(&name) {
                return Err(OperationError::DuplicateColumn(name.to_string()));
            }
            seen.push(name);
        }
        Ok(())
    }

    fn apply(&self, _cx: &Context, content: &Content) -> Result<Content, OperationError> {
        apply_to_table(content, |table| {
            for column in &self.columns {
                require_column(table, column)?;
            }
            for aggregate in &self.aggregates {
                if let Some(column) = aggregate.func.source_column() {
                    require_column(table, column)?;
                }
            }

            let mut index: HashMap<String, usize> = HashMap::new();
            let mut groups: Vec<(Vec<Value>, Vec<&Record>)> = Vec::new();
            for row in table.rows() {
                let key: Vec<Value> = self
                    .columns
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                    .collect();
                let fingerprint = fingerprint(&key);
                match index.get(&fingerprint) {
                    Some(&i) => groups[i].1.push(row),
                    None => {
                        index.insert(fingerprint, groups.len());
                        groups.push((key, vec![row]));
                    }
                }
            }

            let mut rows = Vec::with_capacity(groups.len());
            for (key, members) in &groups {
                let mut out = Record::new();
                for (column, value) in self.columns.iter().zip(key) {
                    out.insert(column.clone(), value.clone());
                }
                for aggregate in &self.aggregates {
                    out.insert(aggregate.name.clone(), aggregate.compute(members)?);
                }
                rows.push(out);
            }

            let schema = self
                .columns
                .iter()
                .cloned()
                .chain(self.aggregates.iter().map(|a| a.name.clone()))
                .collect();
            Ok(table.clone().with_parts_unchecked(schema, rows))
        })
    }
}

/// Text form of a group key. Equal keys map to the same text.
fn fingerprint(key: &[Value]) -> String {
    Value::Array(key.iter().map(normalize_zero).collect()).to_string()
}

fn normalize_zero(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.as_f64() == Some(0.0) && n.is_f64() => Value::from(0.0),
        Value::Array(items) => Value::Array(items.iter().map(normalize_zero).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_zero(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
