//! Log sinks and correlation-id generation
//!
//! The interceptor never writes logs itself; it renders [`LogEvent`]s and hands
//! them to an injected [`LogSink`]. The default sink forwards to `tracing`.

use std::fmt;
use std::str::FromStr;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity of a log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Which side of an invocation an event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Request,
    Success,
    Failure,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Request => write!(f, "request"),
            EventKind::Success => write!(f, "success"),
            EventKind::Failure => write!(f, "failure"),
        }
    }
}

/// `head` starts a new causal chain, `link` continues one found in the arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Head,
    Link,
}

/// `explicit` when dispatching by a declared or pinned calling convention,
/// `implicit` while the convention is still being detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionFlow {
    Explicit,
    Implicit,
}

/// Per-invocation logging context shared by the three events of one call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogState {
    pub stream_id: Option<String>,
    pub object_name: String,
    pub method_name: String,
    pub request_id: String,
    pub request_type: RequestType,
    pub action_flow: ActionFlow,
    pub req_context: serde_json::Value,
}

/// A rendered Request/Success/Failure event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub kind: EventKind,
    pub level: LogLevel,
    pub message: String,
    pub tags: Vec<String>,
    pub state: LogState,
    pub info: serde_json::Value,
}

/// Destination for interceptor events
pub trait LogSink: Send + Sync {
    /// Whether events at `level` would be recorded; checked before rendering
    fn has(&self, level: LogLevel) -> bool;

    fn log(&self, event: &LogEvent);
}

/// Correlation-id generator
pub trait Tracer: Send + Sync {
    fn new_id(&self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTracer;

impl Tracer for UuidTracer {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Forwards events to `tracing` under the `bean_decorator::calls` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

macro_rules! emit_at {
    ($macro:ident, $event:expr) => {
        tracing::$macro!(
            target: "bean_decorator::calls",
            kind = %$event.kind,
            object_name = %$event.state.object_name,
            method_name = %$event.state.method_name,
            request_id = %$event.state.request_id,
            request_type = ?$event.state.request_type,
            action_flow = ?$event.state.action_flow,
            stream_id = ?$event.state.stream_id,
            tags = ?$event.tags,
            info = %$event.info,
            "{}",
            $event.message
        )
    };
}

impl LogSink for TracingSink {
    fn has(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(target: "bean_decorator::calls", tracing::Level::TRACE),
            LogLevel::Debug => tracing::enabled!(target: "bean_decorator::calls", tracing::Level::DEBUG),
            LogLevel::Info => tracing::enabled!(target: "bean_decorator::calls", tracing::Level::INFO),
            LogLevel::Warn => tracing::enabled!(target: "bean_decorator::calls", tracing::Level::WARN),
            LogLevel::Error => tracing::enabled!(target: "bean_decorator::calls", tracing::Level::ERROR),
        }
    }

    fn log(&self, event: &LogEvent) {
        match event.level {
            LogLevel::Trace => emit_at!(trace, event),
            LogLevel::Debug => emit_at!(debug, event),
            LogLevel::Info => emit_at!(info, event),
            LogLevel::Warn => emit_at!(warn, event),
            LogLevel::Error => emit_at!(error, event),
        }
    }
}

/// Keeps every event in memory; used in test mode and assertions
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<LogEvent>>,
    min_level: Option<LogLevel>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only record events at or above `level`
    pub fn with_min_level(level: LogLevel) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            min_level: Some(level),
        }
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    pub fn events_of(&self, kind: EventKind) -> Vec<LogEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl LogSink for CollectingSink {
    fn has(&self, level: LogLevel) -> bool {
        self.min_level.is_none_or(|min| level >= min)
    }

    fn log(&self, event: &LogEvent) {
        self.events.lock().push(event.clone());
    }
}
