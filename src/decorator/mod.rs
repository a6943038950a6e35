//! Bean Decorator
//!
//! Wraps bean constructors so that every method call on the produced objects
//! can be logged (Request/Success/Failure events with correlation ids) and
//! mocked (ordered selector/generate rules), as configured by a texture tree.
//!
//! # Architecture
//!
//! ```text
//! ObjectDecorator::wrap_plugin_gadget / wrap_bridge_dialect
//!        │  resolve codes, fetch bean texture
//!        ▼
//! ConstructorWrapper ──▶ ObjectInterceptor (per instance, per field path)
//!                               │  first access of a method
//!                               ▼
//!                         MethodState::compose
//!                               │
//!                  LoggingInterceptor(MockingInterceptor(raw))
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bean_decorator::plugin::prelude::*;
//!
//! let decorator = ObjectDecorator::new(config).with_store(store);
//! let ctor = decorator.wrap_plugin_gadget(
//!     ctor,
//!     &GadgetOptions::new(NameRef::name("plugin-app-orders"), GadgetType::Services, "orderManager"),
//! );
//! let manager = ctor(vec![])?;
//! manager.call("placeOrder", vec![Value::from("order-1")])?;
//! ```

pub mod classify;
pub mod composer;
pub mod constructor;
pub mod context;
pub mod interceptor;
mod logging;
mod mocking;
pub mod resolver;
pub mod store;
pub mod template;
pub mod texture;

use std::sync::Arc;

pub use classify::{Classifier, Counters};
pub use constructor::ConstructorWrapper;
pub use context::BeanContext;
pub use interceptor::ObjectInterceptor;
pub use resolver::{ResolveOptions, resolve_method_texture};
pub use store::{StaticTextureStore, TextureStore, TextureTree};
pub use texture::{
    EventTexture, LoggingTexture, MethodType, MockMapping, MockingTexture, Texture, Unmatched,
};

use crate::config::DecoratorConfig;
use crate::object::Constructor;
use crate::plugin::metadata::{BeanIdentity, DialectOptions, GadgetOptions};
use crate::plugin::naming::{DefaultNameResolver, NameResolver};
use crate::sink::{LogSink, Tracer, TracingSink, UuidTracer};

/// Entry point wrapping gadget and dialect constructors
pub struct ObjectDecorator {
    config: DecoratorConfig,
    store: Arc<dyn TextureStore>,
    names: Arc<dyn NameResolver>,
    sink: Arc<dyn LogSink>,
    tracer: Arc<dyn Tracer>,
}

impl ObjectDecorator {
    /// Decorator with an empty texture store, the default name resolver and
    /// events forwarded to `tracing`
    pub fn new(config: DecoratorConfig) -> Self {
        Self {
            config,
            store: Arc::new(StaticTextureStore::default()),
            names: Arc::new(DefaultNameResolver),
            sink: Arc::new(TracingSink),
            tracer: Arc::new(UuidTracer),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn TextureStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_name_resolver(mut self, names: Arc<dyn NameResolver>) -> Self {
        self.names = names;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn config(&self) -> &DecoratorConfig {
        &self.config
    }

    pub fn name_resolver(&self) -> &Arc<dyn NameResolver> {
        &self.names
    }

    /// Identity a gadget constructor is decorated under
    pub fn gadget_identity(&self, options: &GadgetOptions) -> BeanIdentity {
        BeanIdentity::Gadget {
            plugin_code: self.names.plugin_code(&options.plugin),
            gadget_type: options.gadget_type,
            gadget_name: options.gadget_name.clone(),
        }
    }

    /// Identity a dialect constructor is decorated under
    pub fn dialect_identity(&self, options: &DialectOptions) -> BeanIdentity {
        BeanIdentity::Dialect {
            bridge_code: self.names.bridge_code(&options.bridge),
            plugin_code: self.names.plugin_code(&options.plugin),
            dialect_name: options.dialect_name.clone(),
        }
    }

    /// Decorate a bridge dialect constructor
    ///
    /// The constructor is returned untouched when bridge decoration is off or
    /// the store holds no texture for this dialect.
    pub fn wrap_bridge_dialect(&self, constructor: Constructor, options: &DialectOptions) -> Constructor {
        let identity = self.dialect_identity(options);
        if !self.config.bridge_enabled {
            tracing::debug!(bean = %identity, "Bridge decoration disabled");
            return constructor;
        }
        let BeanIdentity::Dialect {
            bridge_code,
            plugin_code,
            dialect_name,
        } = &identity
        else {
            return constructor;
        };

        let Some(texture) = self.store.dialect_texture(bridge_code, plugin_code, dialect_name) else {
            tracing::debug!(bean = %identity, "No texture for dialect");
            return constructor;
        };

        let context = self
            .context(&identity, texture)
            .with_use_default_texture(self.config.use_default_texture)
            .with_support_all_methods(self.config.support_all_methods);
        tracing::info!(bean = %identity, "Decorating bridge dialect");
        ConstructorWrapper::new(context).wrap(constructor)
    }

    /// Decorate a plugin gadget constructor
    ///
    /// `support_all_methods` and `use_default_texture` given in the options
    /// take precedence over the configured defaults.
    pub fn wrap_plugin_gadget(&self, constructor: Constructor, options: &GadgetOptions) -> Constructor {
        let identity = self.gadget_identity(options);
        if !self.config.gadget_enabled {
            tracing::debug!(bean = %identity, "Gadget decoration disabled");
            return constructor;
        }
        let BeanIdentity::Gadget {
            plugin_code,
            gadget_type,
            gadget_name,
        } = &identity
        else {
            return constructor;
        };

        let support_all_methods = options
            .support_all_methods
            .unwrap_or(self.config.support_all_methods);
        let texture = match self.store.gadget_texture(plugin_code, *gadget_type, gadget_name) {
            Some(texture) => texture,
            // every method still gets a mocking layer
            None if support_all_methods => Texture::default(),
            None => {
                tracing::debug!(bean = %identity, "No texture for gadget");
                return constructor;
            }
        };

        let context = self
            .context(&identity, texture)
            .with_use_default_texture(
                options
                    .use_default_texture
                    .unwrap_or(self.config.use_default_texture),
            )
            .with_support_all_methods(support_all_methods);
        tracing::info!(bean = %identity, "Decorating plugin gadget");
        ConstructorWrapper::new(context).wrap(constructor)
    }

    fn context(&self, identity: &BeanIdentity, texture: Texture) -> BeanContext {
        BeanContext::new(identity.object_name(), texture)
            .with_sink(self.sink.clone())
            .with_tracer(self.tracer.clone())
            .with_stream_id(self.config.app.stream_id.clone())
            .with_threshold(self.config.precise_threshold)
    }
}

impl std::fmt::Debug for ObjectDecorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDecorator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
