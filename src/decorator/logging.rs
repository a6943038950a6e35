//! Request/Success/Failure logging layer
//!
//! Emits a Request event before the wrapped call runs and exactly one
//! Success or Failure event once the outcome the caller receives is known.
//! The outcome is observed through the method's calling convention: a
//! returned promise, a trailing callback, or the direct return value.
//!
//! Methods without a declared `methodType` are classified on every call until the
//! [`Classifier`] pins their convention; pinned methods dispatch directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;

use super::classify::Classifier;
use super::context::BeanContext;
use super::template::{default_level, fallback_template, render};
use super::texture::{EventData, EventTexture, LoggingTexture, MethodType};
use crate::errors::{CallError, CallResult};
use crate::object::{Function, Promise, Value};
use crate::plugin::isolation::call_or_else;
use crate::sink::{ActionFlow, EventKind, LogEvent, LogState, RequestType};

/// Argument fields scanned for an upstream correlation id
const REQUEST_ID_FIELDS: [&str; 2] = ["requestId", "reqId"];

pub(crate) struct LoggingInterceptor {
    context: Arc<BeanContext>,
    method_name: String,
    logging: LoggingTexture,
    classifier: Arc<Classifier>,
}

impl LoggingInterceptor {
    pub(crate) fn new(
        context: Arc<BeanContext>,
        method_name: impl Into<String>,
        logging: LoggingTexture,
        classifier: Arc<Classifier>,
    ) -> Self {
        Self {
            context,
            method_name: method_name.into(),
            logging,
            classifier,
        }
    }

    /// Build the logged invocation around `target`
    pub(crate) fn wrap(self, target: Function) -> Function {
        let interceptor = Arc::new(self);
        Function::new(move |args| interceptor.invoke(&target, args))
    }

    fn invoke(self: &Arc<Self>, target: &Function, args: Vec<Value>) -> CallResult {
        match self.classifier.current() {
            Some(MethodType::Promise) => self.call_promise(target, args),
            Some(MethodType::Callback) => self.call_callback(target, args),
            Some(MethodType::General) => {
                let invocation = self.begin(&args, ActionFlow::Explicit);
                call_general(target, args, &invocation)
            }
            None => self.call_detecting(target, args),
        }
    }

    fn call_promise(self: &Arc<Self>, target: &Function, args: Vec<Value>) -> CallResult {
        let invocation = self.begin(&args, ActionFlow::Explicit);
        match target.call(args) {
            Ok(Value::Promise(promise)) => Ok(Value::Promise(invocation.watch(promise))),
            other => {
                invocation.settle(&other);
                other
            }
        }
    }

    fn call_callback(self: &Arc<Self>, target: &Function, args: Vec<Value>) -> CallResult {
        let invocation = self.begin(&args, ActionFlow::Explicit);
        let hook = invocation.clone();
        let (args, substituted) = substitute_callback(args, move |callback_args| {
            hook.settle(&callback_outcome(callback_args));
        });
        if !substituted {
            return call_general(target, args, &invocation);
        }

        let result = target.call(args);
        if let Err(error) = &result {
            invocation.fail(error);
        }
        result
    }

    fn call_detecting(self: &Arc<Self>, target: &Function, args: Vec<Value>) -> CallResult {
        let invocation = self.begin(&args, ActionFlow::Implicit);
        let hit = Arc::new(AtomicBool::new(false));

        let hook = invocation.clone();
        let hook_hit = hit.clone();
        let classifier = self.classifier.clone();
        let (args, has_callback) = substitute_callback(args, move |callback_args| {
            if !hook_hit.swap(true, Ordering::AcqRel) {
                classifier.observe(MethodType::Callback);
            }
            hook.settle(&callback_outcome(callback_args));
        });

        let result = target.call(args);
        match &result {
            Ok(Value::Promise(promise)) => {
                self.classifier.observe(MethodType::Promise);
                return Ok(Value::Promise(invocation.watch(promise.clone())));
            }
            Ok(value) => {
                if !hit.load(Ordering::Acquire) {
                    self.classifier.observe(MethodType::General);
                    // an uninvoked callback may still report later
                    if !has_callback {
                        invocation.succeed(value);
                    }
                }
            }
            Err(error) => {
                if !hit.load(Ordering::Acquire) {
                    self.classifier.observe(MethodType::General);
                }
                invocation.fail(error);
            }
        }
        result
    }

    /// Compute the per-call log state and emit the Request event
    fn begin(self: &Arc<Self>, args: &[Value], action_flow: ActionFlow) -> Arc<Invocation> {
        let (request_id, request_type) = match self.extract_request_id(args) {
            Some(id) => (id, RequestType::Link),
            None => (self.context.tracer().new_id(), RequestType::Head),
        };

        let state = LogState {
            stream_id: self.context.stream_id().map(str::to_string),
            object_name: self.context.object_name().to_string(),
            method_name: self.method_name.clone(),
            req_context: json!({ "requestId": request_id }),
            request_id,
            request_type,
            action_flow,
        };

        self.emit(EventKind::Request, EventData::Request(args), &state);

        Arc::new(Invocation {
            logger: self.clone(),
            state,
            settled: AtomicBool::new(false),
        })
    }

    fn extract_request_id(&self, args: &[Value]) -> Option<String> {
        let custom = [
            &self.logging.on_request,
            &self.logging.on_success,
            &self.logging.on_failure,
        ]
        .into_iter()
        .flatten()
        .find_map(|event| event.get_request_id.as_ref());

        match custom {
            Some(extractor) => call_or_else("getRequestId", || extractor.extract(args), || None),
            None => find_request_id(args),
        }
    }

    fn event(&self, kind: EventKind) -> Option<&EventTexture> {
        match kind {
            EventKind::Request => self.logging.on_request.as_ref(),
            EventKind::Success => self.logging.on_success.as_ref(),
            EventKind::Failure => self.logging.on_failure.as_ref(),
        }
    }

    fn emit(&self, kind: EventKind, data: EventData<'_>, state: &LogState) {
        let event = self.event(kind);
        if event.is_some_and(|event| !event.is_enabled()) {
            return;
        }

        let level = event
            .and_then(|event| event.log_level)
            .unwrap_or_else(|| default_level(kind));
        let sink = self.context.sink();
        if !sink.has(level) {
            return;
        }

        let info = match event.and_then(|event| event.extract_info.as_ref()) {
            Some(extractor) => call_or_else(
                "extractInfo",
                || extractor.extract(&data),
                || json!({ "error": "extractInfo() has failed" }),
            ),
            None => default_info(&data),
        };
        let template = event
            .and_then(|event| event.template.as_deref())
            .unwrap_or_else(|| fallback_template(kind));

        sink.log(&LogEvent {
            kind,
            level,
            message: render(template, kind, state),
            tags: event.and_then(|event| event.tags.clone()).unwrap_or_default(),
            state: state.clone(),
            info,
        });
    }
}

/// One intercepted call; reports its outcome at most once
struct Invocation {
    logger: Arc<LoggingInterceptor>,
    state: LogState,
    settled: AtomicBool,
}

impl Invocation {
    fn claim(&self) -> bool {
        !self.settled.swap(true, Ordering::AcqRel)
    }

    fn succeed(&self, value: &Value) {
        if self.claim() {
            self.logger
                .emit(EventKind::Success, EventData::Success(value), &self.state);
        }
    }

    fn fail(&self, error: &CallError) {
        if self.claim() {
            self.logger
                .emit(EventKind::Failure, EventData::Failure(error), &self.state);
        }
    }

    fn settle(&self, result: &CallResult) {
        match result {
            Ok(value) => self.succeed(value),
            Err(error) => self.fail(error),
        }
    }

    fn watch(self: Arc<Self>, promise: Promise) -> Promise {
        promise.observe(move |result| self.settle(result))
    }
}

fn call_general(target: &Function, args: Vec<Value>, invocation: &Invocation) -> CallResult {
    let result = target.call(args);
    invocation.settle(&result);
    result
}

/// Replace a trailing function argument with a proxy that runs `hook` first
fn substitute_callback<H>(mut args: Vec<Value>, hook: H) -> (Vec<Value>, bool)
where
    H: Fn(&[Value]) + Send + Sync + 'static,
{
    match args.pop() {
        Some(Value::Function(callback)) => {
            let proxy = Function::new(move |callback_args| {
                hook(&callback_args);
                callback.call(callback_args)
            });
            args.push(Value::Function(proxy));
            (args, true)
        }
        Some(other) => {
            args.push(other);
            (args, false)
        }
        None => (args, false),
    }
}

/// Interpret `(error, ...results)` handed to a callback
fn callback_outcome(callback_args: &[Value]) -> CallResult {
    let Some((slot, results)) = callback_args.split_first() else {
        return Ok(Value::null());
    };
    match slot {
        Value::Error(error) => Err(error.clone()),
        Value::Data(data) if is_falsy(data) => Ok(match results {
            [] => Value::null(),
            [single] => single.clone(),
            many => Value::Data(serde_json::Value::Array(
                many.iter().map(Value::to_json).collect(),
            )),
        }),
        Value::Data(serde_json::Value::String(message)) => Err(CallError::msg(message.clone())),
        slot => Err(CallError::msg(slot.to_json().to_string())),
    }
}

/// `null`, `false`, zero and `""` in the error slot mean "no error"
fn is_falsy(data: &serde_json::Value) -> bool {
    match data {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(flag) => !flag,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// Scan arguments from last to first for `requestId` / `reqId`
fn find_request_id(args: &[Value]) -> Option<String> {
    args.iter().rev().find_map(|arg| {
        REQUEST_ID_FIELDS.iter().find_map(|field| match arg {
            Value::Data(serde_json::Value::Object(map)) => map.get(*field).and_then(id_string),
            Value::Object(bean) => bean
                .get(field)
                .and_then(|value| value.as_data().and_then(id_string)),
            _ => None,
        })
    })
}

fn id_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn default_info(data: &EventData<'_>) -> serde_json::Value {
    match data {
        EventData::Request(args) => {
            json!({ "arguments": args.iter().map(Value::to_json).collect::<Vec<_>>() })
        }
        EventData::Success(value) => json!({ "result": value.to_json() }),
        EventData::Failure(error) => json!({ "error": error.to_json() }),
    }
}
