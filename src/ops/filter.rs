//! Row filtering.

use std::fmt;
use std::sync::Arc;

use super::{apply_to_table, Operation};
use crate::context::Context;
use crate::error::OperationError;
use crate::guard::call_guarded;
use crate::model::{Content, Record, Value};

/// Row predicate.
pub type Predicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Keep the rows for which a predicate returns `true`.
///
/// The schema is never changed, even when no rows match.
#[derive(Clone, Default)]
pub struct Filter {
    predicate: Option<Predicate>,
}

impl Filter {
    /// Create a filter from a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// Keep rows whose `column` equals `value`.
    pub fn column_equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        Self::new(move |row| row.get(&column) == Some(&value))
    }

    /// Check if a predicate is set.
    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Operation for Filter {
    fn name(&self) -> &str {
        "filter"
    }

    fn validate(&self) -> Result<(), OperationError> {
        if self.predicate.is_none() {
            return Err(OperationError::MissingPredicate);
        }
        Ok(())
    }

    fn apply(&self, _cx: &Context, content: &Content) -> Result<Content, OperationError> {
        let predicate = self
            .predicate
            .as_ref()
            .ok_or(OperationError::MissingPredicate)?;

        apply_to_table(content, |table| {
            let mut kept = Vec::new();
            for row in table.rows() {
                if call_guarded("filter predicate", || predicate(row))? {
                    kept.push(row.clone());
                }
            }
            Ok(table.clone().with_rows_unchecked(kept))
        })
    }

    fn can_optimize(&self, next: &dyn Operation) -> bool {
        next.name() == "filter"
    }
}
