//! Row limiting.

use super::{apply_to_table, Operation};
use crate::context::Context;
use crate::error::OperationError;
use crate::model::Content;

/// Keep the first `n` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    n: i64,
}

impl Limit {
    /// Create a limit. Negative values fail validation.
    pub fn new(n: i64) -> Self {
        Self { n }
    }

    /// The configured row count.
    pub fn count(&self) -> i64 {
        self.n
    }
}

impl Operation for Limit {
    fn name(&self) -> &str {
        "limit"
    }

    fn validate(&self) -> Result<(), OperationError> {
        if self.n < 0 {
            return Err(OperationError::NegativeLimit(self.n));
        }
        Ok(())
    }

    fn apply(&self, _cx: &Context, content: &Content) -> Result<Content, OperationError> {
        if self.n < 0 {
            return Err(OperationError::NegativeLimit(self.n));
        }
        // saturates where usize is narrower than i64
        let n = usize::try_from(self.n).unwrap_or(usize::MAX);
        apply_to_table(content, |table| {
            let rows = table.rows().iter().take(n).cloned().collect();
            Ok(table.clone().with_rows_unchecked(rows))
        })
    }

    fn can_optimize(&self, next: &dyn Operation) -> bool {
        next.name() == "limit"
    }
}
