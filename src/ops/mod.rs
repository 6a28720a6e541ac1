//! Operations attached to content and run by the pipeline.
//!
//! An [`Operation`] is a stateless step with a name, a structural
//! pre-condition check ([`Operation::validate`]), and an execution step
//! ([`Operation::apply`]) that returns a *new* content item. Operations act
//! on table bodies; every other body passes through unchanged.
//!
//! # Example
//!
//! ```
//! use docrender::model::{record, Content, Table};
//! use docrender::ops::{Filter, Limit, Sort};
//! use serde_json::json;
//!
//! let table = Table::from_rows(
//!     ["region", "sales"],
//!     vec![
//!         record([("region", json!("west")), ("sales", json!(10))]),
//!         record([("region", json!("east")), ("sales", json!(25))]),
//!     ],
//! )?;
//!
//! let content = Content::table("sales", table)
//!     .with_operation(Filter::new(|row| row["sales"].as_i64().unwrap_or(0) > 5))
//!     .with_operation(Sort::descending("sales"))
//!     .with_operation(Limit::new(10));
//! assert_eq!(content.operations().len(), 3);
//! # Ok::<(), docrender::Error>(())
//! ```

mod add_column;
mod filter;
mod group_by;
mod limit;
mod sort;

pub use add_column::{AddColumn, DeriveFn};
pub use filter::{Filter, Predicate};
pub use group_by::{Aggregate, AggregateFn, GroupBy};
pub use limit::Limit;
pub use sort::{Sort, SortDirection, SortKey};

use crate::context::Context;
use crate::error::OperationError;
use crate::model::{Content, ContentBody, Table};

/// A stateless transformation step attached to content.
///
/// Implementations must not keep mutable state: the same operation instance
/// may be applied concurrently to different content by different renders.
pub trait Operation: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Check structural validity. Called before every [`Operation::apply`].
    fn validate(&self) -> Result<(), OperationError>;

    /// Produce a new content item. The input is never modified.
    fn apply(&self, cx: &Context, content: &Content) -> Result<Content, OperationError>;

    /// Whether this operation could be fused with `next` when they are
    /// adjacent. Advisory only; the pipeline always runs both.
    fn can_optimize(&self, next: &dyn Operation) -> bool {
        let _ = next;
        false
    }
}

/// Run `f` on the table body of `content`, wrapping the result in a new
/// content item with the same identifier and operations.
///
/// Non-table bodies are returned unchanged.
pub fn apply_to_table<F>(content: &Content, f: F) -> Result<Content, OperationError>
where
    F: FnOnce(&Table) -> Result<Table, OperationError>,
{
    match content.body() {
        ContentBody::Table(table) => Ok(content.with_body(ContentBody::Table(f(table)?))),
        _ => Ok(content.clone()),
    }
}

/// Fail with [`OperationError::ColumnNotFound`] if `column` is not in the schema.
pub(crate) fn require_column(table: &Table, column: &str) -> Result<(), OperationError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(OperationError::ColumnNotFound(column.to_string()))
    }
}
