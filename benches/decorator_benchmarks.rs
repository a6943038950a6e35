//! Performance benchmarks for the bean decorator
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use bean_decorator::config::DecoratorConfig;
use bean_decorator::decorator::{
    LoggingTexture, MockingTexture, ObjectDecorator, ResolveOptions, StaticTextureStore, Texture,
    resolve_method_texture,
};
use bean_decorator::decorator::template::{REQUEST_TEMPLATE, STREAM_REQUEST_TEMPLATE, render};
use bean_decorator::object::{Bean, Constructor, DynamicBean, Value};
use bean_decorator::plugin::{GadgetOptions, GadgetType, NameRef};
use bean_decorator::sink::{
    ActionFlow, EventKind, LogEvent, LogLevel, LogSink, LogState, RequestType,
};
use bean_decorator::CallError;

/// Sink that renders every event and drops it
struct DiscardSink;

impl LogSink for DiscardSink {
    fn has(&self, _level: LogLevel) -> bool {
        true
    }

    fn log(&self, event: &LogEvent) {
        black_box(event);
    }
}

/// Sink that declines every level, so events are never rendered
struct SilentSink;

impl LogSink for SilentSink {
    fn has(&self, _level: LogLevel) -> bool {
        false
    }

    fn log(&self, _event: &LogEvent) {}
}

fn calculator() -> Constructor {
    Arc::new(|_: Vec<Value>| -> Result<Arc<dyn Bean>, CallError> {
        Ok(DynamicBean::builder("Calculator")
            .method("add", |args| {
                let sum: i64 = args.iter().filter_map(|a| a.as_data()?.as_i64()).sum();
                Ok(Value::from(sum))
            })
            .method("plain", |_| Ok(Value::null()))
            .method("lookup", |_| Ok(Value::null()))
            .build_arc())
    })
}

fn texture() -> Texture {
    Texture::default()
        .with_method("add", Texture::default().with_logging(LoggingTexture::on()))
        .with_method(
            "plain",
            Texture::enabled(false).with_logging(LoggingTexture::on()),
        )
        .with_method(
            "lookup",
            Texture::default().with_mocking(MockingTexture::on().with_mapping(
                "any",
                |_| true,
                |_| Ok(Value::from(0)),
            )),
        )
}

fn decorated(sink: Arc<dyn LogSink>) -> Arc<dyn Bean> {
    let store = StaticTextureStore::default();
    store.set_gadget_texture("math", GadgetType::Services, "calculator", texture());
    let decorator = ObjectDecorator::new(DecoratorConfig::default())
        .with_store(Arc::new(store))
        .with_sink(sink);
    let options = GadgetOptions::new(NameRef::code("math"), GadgetType::Services, "calculator");
    decorator.wrap_plugin_gadget(calculator(), &options)(vec![])
        .expect("calculator builds")
}

/// Benchmark a method call through each interception layer
fn bench_method_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("method_calls");
    group.measurement_time(Duration::from_secs(5));

    let raw = calculator()(vec![]).expect("calculator builds");
    let logged = decorated(Arc::new(DiscardSink));
    let silent = decorated(Arc::new(SilentSink));
    let args = || vec![Value::from(1), Value::from(2), Value::from(3)];

    group.bench_function("raw", |b| {
        b.iter(|| raw.call(black_box("add"), args()));
    });

    group.bench_function("disabled_method", |b| {
        b.iter(|| logged.call(black_box("plain"), args()));
    });

    group.bench_function("logged_discarded", |b| {
        b.iter(|| logged.call(black_box("add"), args()));
    });

    group.bench_function("logged_level_filtered", |b| {
        b.iter(|| silent.call(black_box("add"), args()));
    });

    group.bench_function("mocked", |b| {
        b.iter(|| silent.call(black_box("lookup"), args()));
    });

    group.finish();
}

/// Benchmark capsule lookup (cached after the first access)
fn bench_capsule_lookup(c: &mut Criterion) {
    let bean = decorated(Arc::new(SilentSink));
    let interceptor = bean.as_interceptor().expect("bean is intercepted");
    interceptor.capsule("add");

    c.bench_function("capsule_lookup", |b| {
        b.iter(|| interceptor.capsule(black_box("add")));
    });
}

/// Benchmark texture resolution for nested and missing paths
fn bench_texture_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("texture_resolution");

    let bean = texture()
        .with_method("db.pool.query", Texture::default().with_logging(LoggingTexture::on()));
    let chain = vec!["db".to_string(), "pool".to_string()];
    let root: Vec<String> = Vec::new();
    let plain = ResolveOptions::default();
    let with_default = ResolveOptions {
        use_default_texture: true,
        stream_aware: false,
    };

    for (label, options) in [("plain", plain), ("with_default", with_default)] {
        group.bench_with_input(BenchmarkId::new("nested", label), &options, |b, options| {
            b.iter(|| resolve_method_texture(&bean, black_box(&chain), "query", options));
        });
        group.bench_with_input(BenchmarkId::new("missing", label), &options, |b, options| {
            b.iter(|| resolve_method_texture(&bean, black_box(&root), "absent", options));
        });
    }

    group.finish();
}

/// Benchmark message template rendering
fn bench_template_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_render");

    let state = LogState {
        stream_id: Some("run-42".to_string()),
        object_name: "math/services/calculator".to_string(),
        method_name: "add".to_string(),
        request_id: "6f1c3a52-45c2-4c8e-9a57-0d1b2f7e9c10".to_string(),
        request_type: RequestType::Head,
        action_flow: ActionFlow::Explicit,
        req_context: json!({ "requestId": "6f1c3a52-45c2-4c8e-9a57-0d1b2f7e9c10" }),
    };

    for (label, template) in [("plain", REQUEST_TEMPLATE), ("stream", STREAM_REQUEST_TEMPLATE)] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &template, |b, template| {
            b.iter(|| render(black_box(template), EventKind::Request, &state));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_method_calls,
    bench_capsule_lookup,
    bench_texture_resolution,
    bench_template_render,
);
criterion_main!(benches);
