//! Per-content operation pipeline.
//!
//! [`apply_transformations`] runs a content item's operations in order:
//! check cancellation, validate, apply. The first failure stops the chain.
//! The input is never modified; when there is nothing to do it is returned
//! borrowed.

use std::borrow::Cow;

use crate::context::Context;
use crate::error::PipelineError;
use crate::model::Content;

/// Run the operations attached to `content`.
///
/// Returns the input unchanged (borrowed) when no operations are attached.
/// Otherwise each operation is, in order:
///
/// 1. preceded by a cancellation check; a done context fails with
///    [`PipelineError::Cancelled`] and nothing further runs,
/// 2. validated; failure returns [`PipelineError::Validation`] without
///    applying it or any later operation,
/// 3. applied to the output of the previous one; failure returns
///    [`PipelineError::Apply`].
pub fn apply_transformations<'a>(
    cx: &Context,
    content: &'a Content,
) -> Result<Cow<'a, Content>, PipelineError> {
    let operations = content.operations();
    if operations.is_empty() {
        return Ok(Cow::Borrowed(content));
    }

    let mut current: Cow<'a, Content> = Cow::Borrowed(content);
    for (index, operation) in operations.iter().enumerate() {
        if let Some(cause) = cx.err() {
            log::debug!(
                "content '{}': cancelled before operation {} ({})",
                content.id(),
                index,
                operation.name()
            );
            return Err(PipelineError::Cancelled {
                content_id: content.id().to_string(),
                index,
                cause,
            });
        }

        operation
            .validate()
            .map_err(|source| PipelineError::Validation {
                content_id: content.id().to_string(),
                index,
                operation: operation.name().to_string(),
                source,
            })?;

        let next = operation
            .apply(cx, &current)
            .map_err(|source| PipelineError::Apply {
                content_id: content.id().to_string(),
                index,
                operation: operation.name().to_string(),
                source,
            })?;

        log::debug!(
            "content '{}': applied operation {} ({})",
            content.id(),
            index,
            operation.name()
        );
        current = Cow::Owned(next);
    }

    Ok(current)
}

/// Run [`apply_transformations`] over a list of content items, stopping at
/// the first failure.
pub fn apply_all<'a>(
    cx: &Context,
    contents: &'a [Content],
) -> Result<Vec<Cow<'a, Content>>, PipelineError> {
    contents
        .iter()
        .map(|c| apply_transformations(cx, c))
        .collect()
}

/// Validate every attached operation without applying anything.
pub fn validate_operations(content: &Content) -> Result<(), PipelineError> {
    for (index, operation) in content.operations().iter().enumerate() {
        operation
            .validate()
            .map_err(|source| PipelineError::Validation {
                content_id: content.id().to_string(),
                index,
                operation: operation.name().to_string(),
                source,
            })?;
    }
    Ok(())
}

/// Indices `(i, i + 1)` of adjacent operations that report they could be
/// fused. Purely informational; execution is unaffected.
pub fn optimization_hints(content: &Content) -> Vec<(usize, usize)> {
    content
        .operations()
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0].can_optimize(pair[1].as_ref()))
        .map(|(i, _)| (i, i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CancelCause, OperationError};
    use crate::model::{record, Table};
    use crate::ops::{Filter, Limit, Sort};
    use serde_json::json;

    fn table() -> Content {
        let rows = (1..=3).map(|i| record([("a", json!(i))])).collect();
        Content::table("t", Table::from_rows(["a"], rows).unwrap())
    }

    #[test]
    fn test_empty_pipeline_borrows() {
        let content = table();
        let out = apply_transformations(&Context::background(), &content).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(*out, content);
    }

    #[test]
    fn test_operations_run_in_order() {
        let content = table()
            .with_operation(Sort::descending("a"))
            .with_operation(Limit::new(1));
        let out = apply_transformations(&Context::background(), &content).unwrap();
        let t = out.as_table().unwrap();
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.get(0, "a"), Some(&json!(3)));
    }

    #[test]
    fn test_cancelled_context() {
        let cx = Context::background();
        cx.cancel();
        let content = table().with_operation(Limit::new(1));
        let err = apply_transformations(&cx, &content).unwrap_err();
        assert_eq!(
            err,
            PipelineError::Cancelled {
                content_id: "t".into(),
                index: 0,
                cause: CancelCause::Cancelled,
            }
        );
    }

    #[test]
    fn test_validation_error_reports_index() {
        let content = table()
            .with_operation(Limit::new(5))
            .with_operation(Limit::new(-2));
        let err = apply_transformations(&Context::background(), &content).unwrap_err();
        match err {
            PipelineError::Validation {
                content_id,
                index,
                operation,
                source,
            } => {
                assert_eq!(content_id, "t");
                assert_eq!(index, 1);
                assert_eq!(operation, "limit");
                assert_eq!(source, OperationError::NegativeLimit(-2));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_validate_operations_dry_run() {
        let content = table().with_operation(Filter::default());
        let err = validate_operations(&content).unwrap_err();
        assert_eq!(err.index(), 0);
        assert!(validate_operations(&table()).is_ok());
    }

    #[test]
    fn test_optimization_hints() {
        let content = table()
            .with_operation(Limit::new(5))
            .with_operation(Limit::new(2))
            .with_operation(Sort::ascending("a"))
            .with_operation(Filter::new(|_| true))
            .with_operation(Filter::new(|_| true));
        assert_eq!(optimization_hints(&content), vec![(0, 1), (3, 4)]);
    }

    #[test]
    fn test_apply_all() {
        let contents = vec![table(), table().with_operation(Limit::new(0))];
        let out = apply_all(&Context::background(), &contents).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_table().unwrap().row_count(), 3);
        assert_eq!(out[1].as_table().unwrap().row_count(), 0);
    }
}
