//! Per-bean interception context
//!
//! Texture, sink, tracer and detection settings shared by one interceptor tree.

use std::sync::Arc;

use super::resolver::ResolveOptions;
use super::texture::Texture;
use crate::config::DEFAULT_PRECISE_THRESHOLD;
use crate::sink::{LogSink, Tracer, TracingSink, UuidTracer};

/// Everything an interceptor tree shares about the bean it wraps
///
/// Built once per decorated constructor and shared by every instance the
/// constructor produces.
pub struct BeanContext {
    object_name: String,
    texture: Arc<Texture>,
    sink: Arc<dyn LogSink>,
    tracer: Arc<dyn Tracer>,
    stream_id: Option<String>,
    threshold: u32,
    use_default_texture: bool,
    support_all_methods: bool,
}

impl BeanContext {
    /// Context with a `tracing` sink, UUID correlation ids and threshold 5
    pub fn new(object_name: impl Into<String>, texture: Texture) -> Self {
        Self {
            object_name: object_name.into(),
            texture: Arc::new(texture),
            sink: Arc::new(TracingSink),
            tracer: Arc::new(UuidTracer),
            stream_id: None,
            threshold: DEFAULT_PRECISE_THRESHOLD,
            use_default_texture: false,
            support_all_methods: false,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn with_stream_id(mut self, stream_id: Option<String>) -> Self {
        self.stream_id = stream_id;
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_use_default_texture(mut self, enabled: bool) -> Self {
        self.use_default_texture = enabled;
        self
    }

    pub fn with_support_all_methods(mut self, enabled: bool) -> Self {
        self.support_all_methods = enabled;
        self
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    pub fn tracer(&self) -> &Arc<dyn Tracer> {
        &self.tracer
    }

    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn support_all_methods(&self) -> bool {
        self.support_all_methods
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            use_default_texture: self.use_default_texture,
            stream_aware: self.stream_id.is_some(),
        }
    }
}

impl std::fmt::Debug for BeanContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanContext")
            .field("object_name", &self.object_name)
            .field("stream_id", &self.stream_id)
            .field("threshold", &self.threshold)
            .field("use_default_texture", &self.use_default_texture)
            .field("support_all_methods", &self.support_all_methods)
            .finish_non_exhaustive()
    }
}
