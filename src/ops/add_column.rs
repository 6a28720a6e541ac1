//! Derived columns.

use std::fmt;
use std::sync::Arc;

use super::{apply_to_table, Operation};
use crate::context::Context;
use crate::error::OperationError;
use crate::guard::call_guarded;
use crate::model::{Content, Record, Value};

/// Function computing a derived value from a row.
pub type DeriveFn = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// Add a column computed from each row.
///
/// The new column is inserted into the schema at `position` (clamped to the
/// schema length) or appended when no position is given. Adding a column
/// that already exists is an apply-time error.
#[derive(Clone)]
pub struct AddColumn {
    name: String,
    derive: DeriveFn,
    position: Option<usize>,
}

impl AddColumn {
    /// Append a derived column.
    pub fn new<F>(name: impl Into<String>, derive: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            derive: Arc::new(derive),
            position: None,
        }
    }

    /// Insert the column at a schema position instead of appending it.
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Name of the new column.
    pub fn column(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for AddColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddColumn")
            .field("name", &self.name)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl Operation for AddColumn {
    fn name(&self) -> &str {
        "add_column"
    }

    fn validate(&self) -> Result<(), OperationError> {
        if self.name.is_empty() {
            return Err(OperationError::EmptyColumnName);
        }
        Ok(())
    }

    fn apply(&self, _cx: &Context, content: &Content) -> Result<Content, OperationError> {
        apply_to_table(content, |table| {
            if table.has_column(&self.name) {
                return Err(OperationError::DuplicateColumn(self.name.clone()));
            }

            let mut schema = table.schema().to_vec();
            let position = self.position.unwrap_or(schema.len()).min(schema.len());
            schema.insert(position, self.name.clone());

            let callback = format!("column function '{}'", self.name);
            let mut rows = Vec::with_capacity(table.row_count());
            for row in table.rows() {
                let value = call_guarded(&callback, || (self.derive)(row))?;
                let mut row = row.clone();
                row.insert(self.name.clone(), value);
                rows.push(row);
            }
            Ok(table.clone().with_parts_unchecked(schema, rows))
        })
    }
}
