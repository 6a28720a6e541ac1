//! Panic boundaries around user-supplied callbacks.
//!
//! Predicates, aggregate functions, derived-column functions, and cell
//! formatters are arbitrary user code. A panic inside one of them must not
//! tear down the render thread that invoked it, so every invocation goes
//! through [`call_guarded`] (turning a panic into a typed error) or
//! [`format_guarded`] (turning a panic into a fallback string). Renderers,
//! transformers, and writers called by the orchestrator go through
//! [`component_guarded`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{Error, OperationError, Result as CrateResult};
use crate::model::{display_value, Value};

/// Run `f`, converting a panic into [`OperationError::CallbackPanicked`].
pub fn call_guarded<T>(callback: &str, f: impl FnOnce() -> T) -> Result<T, OperationError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        OperationError::CallbackPanicked {
            callback: callback.to_string(),
            message: panic_message(payload.as_ref()),
        }
    })
}

/// Format a cell value with a user formatter.
///
/// If the formatter panics, the panic is logged and the plain display text
/// of the value is returned instead.
pub fn format_guarded<F>(column: &str, formatter: &F, value: &Value) -> String
where
    F: Fn(&Value) -> String + ?Sized,
{
    match call_guarded("cell formatter", || formatter(value)) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("formatter for column '{}' failed: {}", column, e);
            display_value(value)
        }
    }
}

/// Run a component call, converting a panic into [`Error::Other`].
pub fn component_guarded<T>(component: &str, f: impl FnOnce() -> CrateResult<T>) -> CrateResult<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(Error::Other(format!(
            "{} panicked: {}",
            component,
            panic_message(payload.as_ref())
        )))
    })
}

/// Extract a readable message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_guarded_ok() {
        let result = call_guarded("predicate", || 41 + 1);
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_call_guarded_catches_panic() {
        let result: Result<(), _> = call_guarded("predicate", || panic!("bad row"));
        match result {
            Err(OperationError::CallbackPanicked { callback, message }) => {
                assert_eq!(callback, "predicate");
                assert_eq!(message, "bad row");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_call_guarded_formatted_payload() {
        let n = 7;
        let result: Result<(), _> = call_guarded("aggregate", || panic!("row {}", n));
        assert!(matches!(
            result,
            Err(OperationError::CallbackPanicked { ref message, .. }) if message == "row 7"
        ));
    }

    #[test]
    fn test_format_guarded_fallback() {
        let formatter = |_: &Value| -> String { panic!("formatter exploded") };
        let text = format_guarded("price", &formatter, &json!(12.5));
        assert_eq!(text, "12.5");
    }

    #[test]
    fn test_format_guarded_ok() {
        let formatter = |v: &Value| format!("${}", v);
        assert_eq!(format_guarded("price", &formatter, &json!(3)), "$3");
    }

    #[test]
    fn test_component_guarded() {
        let ok = component_guarded("writer", || Ok(1));
        assert_eq!(ok.unwrap(), 1);

        let err = component_guarded::<()>("writer FileWriter", || panic!("disk gone")).unwrap_err();
        assert_eq!(err.to_string(), "writer FileWriter panicked: disk gone");
    }
}
