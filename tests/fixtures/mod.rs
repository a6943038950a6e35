//! Test Fixtures Module
//!
//! Shared beans, constructors and decorator setups for the integration tests:
//! - Order beans in the three calling conventions
//! - A fluent repository returning sub-objects
//! - Decorators wired to a collecting sink and a sequential tracer

// Allow dead code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use bean_decorator::config::DecoratorConfig;
use bean_decorator::decorator::{ObjectDecorator, StaticTextureStore, TextureStore};
use bean_decorator::object::{Bean, Constructor, DynamicBean, Function, Promise, Value};
use bean_decorator::plugin::{GadgetOptions, GadgetType, NameRef};
use bean_decorator::sink::{CollectingSink, Tracer};
use bean_decorator::CallError;

/// Path of a file under `tests/fixtures/`
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Store loaded from `tests/fixtures/decorator.yaml`
pub fn fixture_store() -> Arc<StaticTextureStore> {
    Arc::new(
        StaticTextureStore::from_yaml_file(&fixture_path("decorator.yaml"))
            .expect("fixture textures should load"),
    )
}

/// Tracer handing out `gen-0`, `gen-1`, ...
pub struct SeqTracer(AtomicUsize);

impl SeqTracer {
    pub fn new() -> Self {
        Self(AtomicUsize::new(0))
    }
}

impl Tracer for SeqTracer {
    fn new_id(&self) -> String {
        format!("gen-{}", self.0.fetch_add(1, Ordering::SeqCst))
    }
}

/// Decorator over `store` that records every event
pub fn collecting_decorator(
    config: DecoratorConfig,
    store: Arc<dyn TextureStore>,
) -> (ObjectDecorator, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let decorator = ObjectDecorator::new(config)
        .with_store(store)
        .with_sink(sink.clone())
        .with_tracer(Arc::new(SeqTracer::new()));
    (decorator, sink)
}

pub fn order_manager_options() -> GadgetOptions {
    GadgetOptions::new(
        NameRef::name("@shop/plugin-app-orders"),
        GadgetType::Services,
        "orderManager",
    )
}

fn first_i64(args: &[Value]) -> i64 {
    args.first()
        .and_then(Value::as_data)
        .and_then(|data| data.as_i64())
        .unwrap_or(0)
}

/// Order manager bean
///
/// - `place(id)` returns `"placed <id>"` and counts real executions
/// - `fetch(n, cb)` reports `cb(null, n * 2)` synchronously
/// - `load(id)` returns a promise of `{ "id": id }`
/// - `repository` is a sub-object whose `query()` returns a fluent cursor
pub fn order_manager(real_calls: Arc<AtomicUsize>) -> Constructor {
    Arc::new(move |_: Vec<Value>| -> Result<Arc<dyn Bean>, CallError> {
        let counter = real_calls.clone();
        Ok(DynamicBean::builder("OrderManager")
            .field("region", "eu-west")
            .object("repository", repository())
            .method("place", move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                let id = args.first().map(Value::to_json).unwrap_or_default();
                Ok(Value::from(format!("placed {}", id.as_str().unwrap_or("?"))))
            })
            .method("fetch", |args| {
                let n = first_i64(&args);
                if let Some(callback) = args.last().and_then(Value::as_function) {
                    callback.call(vec![Value::null(), Value::from(n * 2)])?;
                }
                Ok(Value::null())
            })
            .method("load", |args| {
                let id = args.first().map(Value::to_json).unwrap_or_default();
                Ok(Value::Promise(Promise::resolve(serde_json::json!({ "id": id }))))
            })
            .build_arc())
    })
}

/// Repository whose `query()` returns a cursor bean with `next()`
pub fn repository() -> Arc<dyn Bean> {
    DynamicBean::builder("Repository")
        .method("query", |_| {
            Ok(Value::Object(
                DynamicBean::builder("Cursor")
                    .method("next", |_| Ok(Value::from(1)))
                    .build_arc(),
            ))
        })
        .method("count", |_| Ok(Value::Promise(Promise::resolve(3))))
        .build_arc()
}

/// Order store dialect: `findById(id)` is the real lookup
pub fn order_store(real_calls: Arc<AtomicUsize>) -> Constructor {
    Arc::new(move |_: Vec<Value>| -> Result<Arc<dyn Bean>, CallError> {
        let counter = real_calls.clone();
        Ok(DynamicBean::builder("OrderStore")
            .method("findById", move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                let id = args.first().map(Value::to_json).unwrap_or_default();
                Ok(Value::from(serde_json::json!({ "id": id, "source": "db" })))
            })
            .build_arc())
    })
}

/// Callback argument recording every `(error, ...results)` it receives
pub fn recording_callback() -> (Value, Arc<Mutex<Vec<Vec<Value>>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let callback = Function::new(move |args| {
        sink.lock().push(args);
        Ok(Value::null())
    });
    (Value::Function(callback), calls)
}
