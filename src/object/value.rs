//! Dynamic values exchanged with intercepted beans

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use super::bean::Bean;
use crate::errors::{CallError, CallResult};

/// Signature of every callable in the object model
pub type CallFn = dyn Fn(Vec<Value>) -> CallResult + Send + Sync;

/// A value passed to or returned from a bean method
#[derive(Clone)]
pub enum Value {
    /// Plain data (primitives, arrays, records)
    Data(serde_json::Value),
    /// An object with its own members
    Object(Arc<dyn Bean>),
    /// A callable (method reference or callback)
    Function(Function),
    /// A pending asynchronous result
    Promise(Promise),
    /// An error, as found in a callback's error slot
    Error(CallError),
}

impl Value {
    /// The `null` data value
    pub fn null() -> Self {
        Value::Data(serde_json::Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Data(serde_json::Value::Null))
    }

    pub fn is_promise(&self) -> bool {
        matches!(self, Value::Promise(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Objects and functions are the only values the interceptor wraps
    pub fn is_wrappable(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Function(_))
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn Bean>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_promise(&self) -> Option<&Promise> {
        match self {
            Value::Promise(promise) => Some(promise),
            _ => None,
        }
    }

    /// JSON projection used by log payloads
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Data(data) => data.clone(),
            Value::Object(object) => serde_json::Value::String(format!("[object {}]", object.type_name())),
            Value::Function(_) => serde_json::Value::String("[function]".to_string()),
            Value::Promise(_) => serde_json::Value::String("[promise]".to_string()),
            Value::Error(error) => error.to_json(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Data(data) => write!(f, "Data({})", data),
            Value::Object(object) => write!(f, "Object({})", object.type_name()),
            Value::Function(_) => write!(f, "Function"),
            Value::Promise(_) => write!(f, "Promise"),
            Value::Error(error) => write!(f, "Error({})", error),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        Value::Data(data)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Data(serde_json::Value::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Data(serde_json::Value::String(s))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Data(serde_json::Value::Bool(b))
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::Promise(promise)
    }
}

impl From<CallError> for Value {
    fn from(error: CallError) -> Self {
        Value::Error(error)
    }
}

/// Shared callable with pointer identity
#[derive(Clone)]
pub struct Function(Arc<CallFn>);

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> CallResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the function
    #[inline]
    pub fn call(&self, args: Vec<Value>) -> CallResult {
        (self.0)(args)
    }

    /// True when both handles point at the same closure
    pub fn ptr_eq(&self, other: &Function) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// A cloneable deferred result
///
/// Continuations attached with [`Promise::observe`] run when the promise is
/// polled; nothing is spawned on the caller's behalf.
#[derive(Clone)]
pub struct Promise(Shared<BoxFuture<'static, CallResult>>);

impl Promise {
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = CallResult> + Send + 'static,
    {
        Self(future.boxed().shared())
    }

    pub fn resolve(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::from_future(async move { Ok(value) })
    }

    pub fn reject(error: CallError) -> Self {
        Self::from_future(async move { Err(error) })
    }

    /// Wait for the result
    pub async fn settle(self) -> CallResult {
        self.0.await
    }

    /// Chain an observer that sees the settled result before the caller does
    pub fn observe<F>(self, observer: F) -> Promise
    where
        F: FnOnce(&CallResult) + Send + 'static,
    {
        Promise::from_future(async move {
            let result = self.0.await;
            observer(&result);
            result
        })
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Promise")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_function_identity() {
        let f = Function::new(|_| Ok(Value::null()));
        let g = f.clone();
        let h = Function::new(|_| Ok(Value::null()));
        assert!(f.ptr_eq(&g));
        assert!(!f.ptr_eq(&h));
    }

    #[test]
    fn test_value_json_projection() {
        assert_eq!(Value::from(3).to_json(), json!(3));
        assert_eq!(Value::from("x").to_json(), json!("x"));
        assert_eq!(
            Value::Function(Function::new(|_| Ok(Value::null()))).to_json(),
            json!("[function]")
        );
        assert_eq!(Value::Promise(Promise::resolve(1)).to_json(), json!("[promise]"));
        assert!(Value::null().is_null());
    }

    #[tokio::test]
    async fn test_promise_settles() {
        let value = Promise::resolve(json!({"ok": true})).settle().await.unwrap();
        assert_eq!(value.to_json(), json!({"ok": true}));

        let err = Promise::reject(CallError::msg("nope")).settle().await.unwrap_err();
        assert_eq!(err, CallError::msg("nope"));
    }

    #[tokio::test]
    async fn test_promise_observer_runs_once_on_settle() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let promise = Promise::resolve(7).observe(move |result| {
            assert!(result.is_ok());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(seen.load(Ordering::SeqCst), 0);
        let copy = promise.clone();
        promise.settle().await.unwrap();
        copy.settle().await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
