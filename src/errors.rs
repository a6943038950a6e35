//! Error types
//!
//! `CallError` travels through intercepted calls and must survive being cloned
//! into shared promises and callback error slots. `DecoratorError` covers the
//! construction side (configuration, texture lookup, bean creation).

use thiserror::Error;

/// Result type of every intercepted call
pub type CallResult = Result<crate::object::Value, CallError>;

/// Result type for decorator and registry operations
pub type DecoratorResult<T> = Result<T, DecoratorError>;

/// Error raised (or delivered through a callback / rejected promise) by a bean method
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// Business failure raised by the wrapped implementation or a mock rule
    #[error("{name}: {message}")]
    Failed { name: String, message: String },

    /// The bean has no method with this name
    #[error("Method '{0}' not found")]
    NoSuchMethod(String),

    /// Mocking is enabled, `unmatched` is `exception` and no rule selected the call
    #[error("Mock not found for {object}.{method}")]
    MockNotFound { object: String, method: String },

    /// A user callback or constructor panicked
    #[error("{context} panicked: {message}")]
    Panicked { context: String, message: String },

    /// The calling convention could not be honoured (e.g. callback expected but missing)
    #[error("Callback misuse: {0}")]
    CallbackMisuse(String),
}

impl CallError {
    /// Create a named business error
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a generic error with the default `Error` name
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }

    /// Short name used in log payloads
    pub fn name(&self) -> &str {
        match self {
            CallError::Failed { name, .. } => name,
            CallError::NoSuchMethod(_) => "NoSuchMethodError",
            CallError::MockNotFound { .. } => "MockNotFoundError",
            CallError::Panicked { .. } => "PanicError",
            CallError::CallbackMisuse(_) => "CallbackMisuseError",
        }
    }

    /// JSON view of the error for log `info` payloads
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "message": self.to_string(),
        })
    }
}

/// Errors raised while configuring the decorator or constructing beans
#[derive(Debug, Error)]
pub enum DecoratorError {
    /// Invalid decorator configuration
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A texture tree could not be loaded or parsed
    #[error("Texture error: {0}")]
    Texture(String),

    /// No constructor registered under this key
    #[error("Unknown bean: {0}")]
    UnknownBean(String),

    /// The bean constructor returned an error
    #[error("Construction of '{bean}' failed: {source}")]
    Construction {
        bean: String,
        #[source]
        source: CallError,
    },

    /// The bean constructor panicked
    #[error("Construction of '{bean}' panicked: {message}")]
    Panic { bean: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_error_display() {
        let err = CallError::new("TimeoutError", "upstream did not answer");
        assert_eq!(err.to_string(), "TimeoutError: upstream did not answer");
        assert_eq!(err.name(), "TimeoutError");

        let err = CallError::MockNotFound {
            object: "store/services/cache".to_string(),
            method: "get".to_string(),
        };
        assert_eq!(err.to_string(), "Mock not found for store/services/cache.get");
        assert_eq!(err.name(), "MockNotFoundError");
    }

    #[test]
    fn test_call_error_json() {
        let json = CallError::msg("boom").to_json();
        assert_eq!(json["name"], "Error");
        assert_eq!(json["message"], "Error: boom");
    }

    #[test]
    fn test_decorator_error_wraps_source() {
        let err = DecoratorError::Construction {
            bean: "store/services/cache".to_string(),
            source: CallError::msg("no connection"),
        };
        assert!(err.to_string().contains("no connection"));
    }
}
