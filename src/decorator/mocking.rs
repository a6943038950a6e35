//! Rule-based mocking layer
//!
//! Rules are tried in declaration order and the first selector that accepts
//! the arguments produces the outcome. The outcome is delivered through the
//! same calling convention the real method uses.

use std::sync::Arc;

use super::classify::Classifier;
use super::texture::{MethodType, MockingTexture, Unmatched};
use crate::errors::{CallError, CallResult};
use crate::object::{Function, Promise, Value};
use crate::plugin::isolation::{call_or_else, call_preserving_error};

pub(crate) struct MockingInterceptor {
    object_name: String,
    method_name: String,
    mocking: MockingTexture,
    classifier: Arc<Classifier>,
}

impl MockingInterceptor {
    pub(crate) fn new(
        object_name: impl Into<String>,
        method_name: impl Into<String>,
        mocking: MockingTexture,
        classifier: Arc<Classifier>,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            method_name: method_name.into(),
            mocking,
            classifier,
        }
    }

    /// Build the mocked invocation around `target`
    pub(crate) fn wrap(self, target: Function) -> Function {
        Function::new(move |args| self.invoke(&target, args))
    }

    fn invoke(&self, target: &Function, args: Vec<Value>) -> CallResult {
        let rule = self.mocking.mappings.iter().find(|mapping| {
            call_or_else("mock selector", || mapping.selector.matches(&args), || false)
        });

        let outcome = match rule {
            Some(mapping) => {
                tracing::trace!(
                    object_name = %self.object_name,
                    method_name = %self.method_name,
                    rule = %mapping.name,
                    "Mock rule selected"
                );
                call_preserving_error("mock generate", || mapping.generate.generate(&args))
            }
            None => match self.mocking.unmatched() {
                Unmatched::Fallthrough => return target.call(args),
                Unmatched::Exception => Err(CallError::MockNotFound {
                    object: self.object_name.clone(),
                    method: self.method_name.clone(),
                }),
            },
        };

        deliver(self.convention(&args), &args, outcome)
    }

    /// Declared or pinned convention, else guessed from the argument shape
    fn convention(&self, args: &[Value]) -> MethodType {
        self.classifier.current().unwrap_or_else(|| {
            if args.last().is_some_and(Value::is_function) {
                MethodType::Callback
            } else {
                MethodType::General
            }
        })
    }
}

/// Hand a generated outcome to the caller the way `convention` reports results
fn deliver(convention: MethodType, args: &[Value], outcome: CallResult) -> CallResult {
    match convention {
        MethodType::General => outcome,
        MethodType::Promise => Ok(match outcome {
            Ok(Value::Promise(promise)) => Value::Promise(promise),
            Ok(value) => Value::Promise(Promise::resolve(value)),
            Err(error) => Value::Promise(Promise::reject(error)),
        }),
        MethodType::Callback => {
            let Some(callback) = args.last().and_then(Value::as_function) else {
                return Err(CallError::CallbackMisuse(
                    "callback-style method called without a trailing function".to_string(),
                ));
            };
            let callback_args = match outcome {
                Ok(value) => vec![Value::null(), value],
                Err(error) => vec![Value::Error(error)],
            };
            callback.call(callback_args)?;
            Ok(Value::null())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn real(counter: Arc<AtomicUsize>) -> Function {
        Function::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from("real"))
        })
    }

    fn greet_rules() -> MockingTexture {
        MockingTexture::on().with_mapping(
            "greet",
            |args| args.first().and_then(Value::as_data) == Some(&json!("x")),
            |_| Ok(Value::from("mocked")),
        )
    }

    fn interceptor(mocking: MockingTexture, classifier: Classifier) -> MockingInterceptor {
        MockingInterceptor::new("demo/services/greeter", "greet", mocking, Arc::new(classifier))
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mocking = greet_rules().with_mapping("second", |_| true, |_| Ok(Value::from("second")));
        let calls = Arc::new(AtomicUsize::new(0));
        let wrapped = interceptor(mocking, Classifier::probing(5)).wrap(real(calls.clone()));

        assert_eq!(wrapped.call(vec![Value::from("x")]).unwrap().to_json(), json!("mocked"));
        assert_eq!(wrapped.call(vec![Value::from("y")]).unwrap().to_json(), json!("second"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unmatched_fallthrough_runs_real_method() {
        let calls = Arc::new(AtomicUsize::new(0));
        let wrapped = interceptor(greet_rules(), Classifier::probing(5)).wrap(real(calls.clone()));

        assert_eq!(wrapped.call(vec![Value::from("y")]).unwrap().to_json(), json!("real"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unmatched_exception() {
        let calls = Arc::new(AtomicUsize::new(0));
        let wrapped = interceptor(
            greet_rules().with_unmatched(Unmatched::Exception),
            Classifier::probing(5),
        )
        .wrap(real(calls.clone()));

        assert_eq!(
            wrapped.call(vec![Value::from("y")]).unwrap_err(),
            CallError::MockNotFound {
                object: "demo/services/greeter".to_string(),
                method: "greet".to_string(),
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_promise_convention() {
        let mocking = greet_rules().with_mapping("fail", |_| true, |_| Err(CallError::msg("denied")));
        let wrapped = interceptor(mocking, Classifier::pinned(MethodType::Promise))
            .wrap(real(Arc::new(AtomicUsize::new(0))));

        let resolved = wrapped.call(vec![Value::from("x")]).unwrap();
        let promise = resolved.as_promise().unwrap().clone();
        assert_eq!(promise.settle().await.unwrap().to_json(), json!("mocked"));

        let rejected = wrapped.call(vec![Value::from("z")]).unwrap();
        let promise = rejected.as_promise().unwrap().clone();
        assert_eq!(promise.settle().await.unwrap_err(), CallError::msg("denied"));
    }

    #[test]
    fn test_callback_convention_from_trailing_function() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback = Function::new(move |args| {
            sink.lock().push(args.iter().map(Value::to_json).collect::<Vec<_>>());
            Ok(Value::null())
        });

        let wrapped = interceptor(greet_rules(), Classifier::probing(5))
            .wrap(real(Arc::new(AtomicUsize::new(0))));
        let returned = wrapped
            .call(vec![Value::from("x"), Value::Function(callback)])
            .unwrap();

        assert!(returned.is_null());
        assert_eq!(seen.lock().clone(), vec![vec![json!(null), json!("mocked")]]);
    }

    #[test]
    fn test_callback_convention_without_callback() {
        let wrapped = interceptor(greet_rules(), Classifier::pinned(MethodType::Callback))
            .wrap(real(Arc::new(AtomicUsize::new(0))));
        assert!(matches!(
            wrapped.call(vec![Value::from("x")]),
            Err(CallError::CallbackMisuse(_))
        ));
    }

    #[test]
    fn test_panicking_rules_are_isolated() {
        let mocking = MockingTexture::on()
            .with_mapping("broken-selector", |_| panic!("selector blew up"), |_| Ok(Value::null()))
            .with_mapping("broken-generate", |_| true, |_| panic!("generate blew up"));
        let wrapped = interceptor(mocking, Classifier::probing(5))
            .wrap(real(Arc::new(AtomicUsize::new(0))));

        assert!(matches!(
            wrapped.call(vec![]),
            Err(CallError::Panicked { .. })
        ));
    }
}
