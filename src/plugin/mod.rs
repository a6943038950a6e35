//! Bean Plugin Glue
//!
//! This module connects decorated beans to the rest of an application:
//! - Identity of gadgets and dialects (plugin/bridge codes, gadget types)
//! - Package-name normalization and gadget-type aliases
//! - A registry of decorated constructors with per-bean metrics
//! - Panic isolation for user-supplied code
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Bean Registration                         │
//! │  inventory crate ──▶ ObjectDecorator ──▶ DashMap Bean Registry   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use bean_decorator::plugin::prelude::*;
//!
//! let registry = BeanRegistry::new(ObjectDecorator::new(config).with_store(store));
//! registry.register_gadget(
//!     ctor,
//!     &GadgetOptions::new(NameRef::name("plugin-app-orders"), GadgetType::Services, "orderManager"),
//! );
//! let manager = registry.create("appOrders/services/orderManager", vec![])?;
//! ```

pub mod isolation;
pub mod lifecycle;
#[macro_use]
pub mod macros;
pub mod metadata;
pub mod naming;
pub mod registry;

// Re-exports for convenience
pub use isolation::{call_or_else, call_preserving_error};
pub use lifecycle::{BeanEntry, BeanMetrics, BeanState};
pub use metadata::{BeanIdentity, DialectOptions, GadgetOptions, GadgetType, NameRef};
pub use naming::{DefaultNameResolver, NameResolver, resolve_gadget_type};
pub use registry::{BeanConstructor, BeanRegistry, global_registry, init_registry};

/// Prelude module for convenient imports
///
/// Use this for bean development:
/// ```ignore
/// use bean_decorator::plugin::prelude::*;
/// ```
pub mod prelude {
    pub use super::metadata::{BeanIdentity, DialectOptions, GadgetOptions, GadgetType, NameRef};
    pub use super::naming::{DefaultNameResolver, NameResolver};
    pub use super::registry::{BeanConstructor, BeanRegistry, global_registry, init_registry};

    // Re-export commonly needed external crates
    pub use inventory;
    pub use std::sync::Arc;

    // Re-export core types for bean implementations
    pub use crate::config::DecoratorConfig;
    pub use crate::decorator::{
        LoggingTexture, MethodType, MockingTexture, ObjectDecorator, StaticTextureStore, Texture,
        TextureStore,
    };
    pub use crate::errors::{CallError, CallResult, DecoratorError};
    pub use crate::object::{Bean, Constructor, DynamicBean, Function, Promise, Value};
}
