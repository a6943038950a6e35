//! Bean Isolation and Panic Safety
//!
//! This module provides panic isolation for user-supplied code using
//! `catch_unwind`: bean constructors, mock rules and logging extractors.
//! Panics are caught and converted to errors or fallback values, so a broken
//! rule or extractor never tears down the caller.
//!
//! # Safety Considerations
//!
//! - `catch_unwind` only catches panics, not aborts
//! - The crate must not be built with `panic = "abort"`
//! - Closures are run under `AssertUnwindSafe`; shared state they touch must
//!   stay consistent if they unwind (locks used here are `parking_lot`, which
//!   do not poison)

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::errors::CallError;

/// Run `f`, turning a panic into `CallError::Panicked`
///
/// Errors returned by `f` are preserved unchanged.
///
/// # Example
///
/// ```ignore
/// let result = call_preserving_error("mock generate", || rule.generate.generate(&args));
/// ```
pub fn call_preserving_error<F, T>(context: &str, f: F) -> Result<T, CallError>
where
    F: FnOnce() -> Result<T, CallError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic_info) => {
            let message = extract_panic_message(&panic_info);
            tracing::error!(context = %context, message = %message, "User code panicked");
            Err(CallError::Panicked {
                context: context.to_string(),
                message,
            })
        }
    }
}

/// Run `f`, returning `fallback()` if it panics
pub fn call_or_else<F, T, D>(context: &str, f: F, fallback: D) -> T
where
    F: FnOnce() -> T,
    D: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(panic_info) => {
            let message = extract_panic_message(&panic_info);
            tracing::warn!(context = %context, message = %message, "User code panicked, using fallback");
            fallback()
        }
    }
}

/// Extract a human-readable message from panic info
///
/// Handles common panic payload types: &str and String, and falls back
/// to a generic message.
pub fn extract_panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic (non-string payload)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_preserving_error_success() {
        let result = call_preserving_error("ok", || Ok::<_, CallError>(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_call_preserving_error_keeps_original_error() {
        let result: Result<i32, CallError> =
            call_preserving_error("err", || Err(CallError::new("Timeout", "late")));
        assert_eq!(result.unwrap_err(), CallError::new("Timeout", "late"));
    }

    #[test]
    fn test_call_preserving_error_panic_str() {
        let result: Result<i32, CallError> = call_preserving_error("generate", || {
            panic!("test panic message");
        });
        match result {
            Err(CallError::Panicked { context, message }) => {
                assert_eq!(context, "generate");
                assert!(message.contains("test panic message"));
            }
            other => panic!("Expected Panicked error, got {:?}", other),
        }
    }

    #[test]
    fn test_call_preserving_error_panic_string() {
        let result: Result<i32, CallError> = call_preserving_error("ctor", || {
            panic!("{}", "dynamic panic message".to_string());
        });
        match result {
            Err(CallError::Panicked { message, .. }) => {
                assert!(message.contains("dynamic panic message"))
            }
            other => panic!("Expected Panicked error, got {:?}", other),
        }
    }

    #[test]
    fn test_call_or_else() {
        assert_eq!(call_or_else("value", || 42, || 0), 42);
        let value = call_or_else(
            "selector",
            || -> bool {
                panic!("selector panic");
            },
            || false,
        );
        assert!(!value);
    }
}
