//! Bean Registry
//!
//! This module provides the central registry of bean constructors. Gadgets and
//! dialects are registered either at runtime or at compile-time through the
//! `inventory` crate; every constructor is decorated once, at registration,
//! and stored under its object name.
//!
//! # Architecture
//!
//! ```text
//! register_gadget! / register_dialect!  ──▶ inventory::collect!
//!                                                │
//! register_gadget() / register_dialect() ◀───────┘
//!        │  ObjectDecorator::wrap_*
//!        ▼
//! DashMap<objectName, decorated constructor> ──create()──▶ Arc<dyn Bean>
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use bean_decorator::plugin::global_registry;
//!
//! let manager = global_registry().create("appOrders/services/orderManager", vec![])?;
//! ```

use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

use super::isolation::call_preserving_error;
use super::lifecycle::{BeanEntry, BeanMetrics};
use super::metadata::{BeanIdentity, DialectOptions, GadgetOptions, GadgetType, NameRef};
use crate::config::DecoratorConfig;
use crate::decorator::ObjectDecorator;
use crate::errors::{CallError, DecoratorError, DecoratorResult};
use crate::object::{Bean, Constructor, Value};

/// Factory function pointer type for beans (non-Arc version for BeanConstructor)
pub type BeanFactoryPtr = fn(Vec<Value>) -> Result<Arc<dyn Bean>, CallError>;

/// Kind of a compile-time registered bean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeanKind {
    /// Plugin gadget of the given type
    Gadget(GadgetType),
    /// Dialect provided by the named bridge
    Dialect(&'static str),
}

/// Bean constructor for inventory-based registration
///
/// Names are package names or codes; they go through the decorator's name
/// resolver at registration.
pub struct BeanConstructor {
    pub kind: BeanKind,

    /// Owning (gadget) or target (dialect) plugin
    pub plugin: &'static str,

    /// Gadget or dialect name
    pub name: &'static str,

    pub create: BeanFactoryPtr,

    /// Overrides the configured default for gadgets
    pub support_all_methods: Option<bool>,

    /// Alternative registry keys for this bean
    pub aliases: &'static [&'static str],
}

impl BeanConstructor {
    /// Create a new gadget constructor
    pub const fn gadget(
        plugin: &'static str,
        gadget_type: GadgetType,
        name: &'static str,
        create: BeanFactoryPtr,
    ) -> Self {
        Self {
            kind: BeanKind::Gadget(gadget_type),
            plugin,
            name,
            create,
            support_all_methods: None,
            aliases: &[],
        }
    }

    /// Create a new dialect constructor
    pub const fn dialect(
        bridge: &'static str,
        plugin: &'static str,
        name: &'static str,
        create: BeanFactoryPtr,
    ) -> Self {
        Self {
            kind: BeanKind::Dialect(bridge),
            plugin,
            name,
            create,
            support_all_methods: None,
            aliases: &[],
        }
    }

    pub const fn with_support_all_methods(mut self, enabled: bool) -> Self {
        self.support_all_methods = Some(enabled);
        self
    }

    /// Add aliases for this bean
    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }
}

// Collect all registered beans at link time
inventory::collect!(BeanConstructor);

struct RegisteredBean {
    identity: BeanIdentity,
    constructor: Constructor,
}

/// Central bean registry
///
/// Holds decorated constructors indexed by object name and builds bean
/// instances on demand, recording per-constructor metrics.
pub struct BeanRegistry {
    decorator: ObjectDecorator,

    /// Decorated constructors indexed by object name
    constructors: DashMap<String, RegisteredBean>,

    /// Alias -> object name
    aliases: DashMap<String, String>,

    /// Per-constructor metrics indexed by object name
    entries: DashMap<String, BeanEntry>,
}

impl BeanRegistry {
    /// Create a new empty registry decorating through `decorator`
    pub fn new(decorator: ObjectDecorator) -> Self {
        Self {
            decorator,
            constructors: DashMap::new(),
            aliases: DashMap::new(),
            entries: DashMap::new(),
        }
    }

    pub fn decorator(&self) -> &ObjectDecorator {
        &self.decorator
    }

    /// Decorate and register a gadget constructor
    ///
    /// A constructor already registered under the same object name is replaced.
    pub fn register_gadget(&self, constructor: Constructor, options: &GadgetOptions) -> BeanIdentity {
        let identity = self.decorator.gadget_identity(options);
        let decorated = self.decorator.wrap_plugin_gadget(constructor.clone(), options);
        self.insert(identity, constructor, decorated)
    }

    /// Decorate and register a dialect constructor
    pub fn register_dialect(&self, constructor: Constructor, options: &DialectOptions) -> BeanIdentity {
        let identity = self.decorator.dialect_identity(options);
        let decorated = self.decorator.wrap_bridge_dialect(constructor.clone(), options);
        self.insert(identity, constructor, decorated)
    }

    fn insert(&self, identity: BeanIdentity, raw: Constructor, decorated: Constructor) -> BeanIdentity {
        let name = identity.object_name();
        let is_decorated = !Arc::ptr_eq(&raw, &decorated);

        if self
            .constructors
            .insert(
                name.clone(),
                RegisteredBean {
                    identity: identity.clone(),
                    constructor: decorated,
                },
            )
            .is_some()
        {
            tracing::warn!(bean = %name, "Replacing registered bean constructor");
        }
        self.entries.insert(name.clone(), BeanEntry::new(is_decorated));

        tracing::debug!(bean = %name, decorated = is_decorated, "Registered bean constructor");
        identity
    }

    /// Register an alternative key for a registered bean
    ///
    /// Returns `false` if `object_name` is unknown.
    pub fn register_alias(&self, alias: &str, object_name: &str) -> bool {
        if !self.constructors.contains_key(object_name) {
            return false;
        }
        self.aliases.insert(alias.to_string(), object_name.to_string());
        true
    }

    fn canonical(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .map(|target| target.value().clone())
            .unwrap_or_else(|| name.to_string())
    }

    /// Build a bean by object name (or alias)
    ///
    /// Constructor panics are isolated and reported as [`DecoratorError::Panic`].
    pub fn create(&self, name: &str, args: Vec<Value>) -> DecoratorResult<Arc<dyn Bean>> {
        let name = self.canonical(name);
        let constructor = self
            .constructors
            .get(&name)
            .map(|entry| entry.constructor.clone())
            .ok_or_else(|| DecoratorError::UnknownBean(name.clone()))?;

        let result = call_preserving_error(&name, || constructor(args));

        if let Some(mut entry) = self.entries.get_mut(&name) {
            match &result {
                Ok(_) => entry.record_success(),
                Err(e) => entry.record_error(e.to_string()),
            }
        }

        result.map_err(|source| match source {
            CallError::Panicked { message, .. } => DecoratorError::Panic { bean: name, message },
            source => DecoratorError::Construction { bean: name, source },
        })
    }

    /// Build a gadget by its codes
    pub fn create_gadget(
        &self,
        plugin_code: &str,
        gadget_type: GadgetType,
        gadget_name: &str,
        args: Vec<Value>,
    ) -> DecoratorResult<Arc<dyn Bean>> {
        let identity = BeanIdentity::Gadget {
            plugin_code: plugin_code.to_string(),
            gadget_type,
            gadget_name: gadget_name.to_string(),
        };
        self.create(&identity.object_name(), args)
    }

    /// Build a dialect by its codes
    pub fn create_dialect(
        &self,
        bridge_code: &str,
        plugin_code: &str,
        dialect_name: &str,
        args: Vec<Value>,
    ) -> DecoratorResult<Arc<dyn Bean>> {
        let identity = BeanIdentity::Dialect {
            bridge_code: bridge_code.to_string(),
            plugin_code: plugin_code.to_string(),
            dialect_name: dialect_name.to_string(),
        };
        self.create(&identity.object_name(), args)
    }

    /// Check if a bean is registered under this object name or alias
    pub fn has_bean(&self, name: &str) -> bool {
        self.constructors.contains_key(&self.canonical(name))
    }

    /// Identity of a registered bean
    pub fn identity(&self, name: &str) -> Option<BeanIdentity> {
        self.constructors
            .get(&self.canonical(name))
            .map(|entry| entry.identity.clone())
    }

    /// Object names of all registered beans, sorted
    pub fn bean_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .constructors
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Get the number of registered beans
    pub fn bean_count(&self) -> usize {
        self.constructors.len()
    }

    /// Get construction metrics for a bean
    pub fn get_bean_metrics(&self, name: &str) -> Option<BeanMetrics> {
        self.entries
            .get(&self.canonical(name))
            .map(|entry| entry.metrics())
    }

    /// Get all bean metrics for monitoring
    pub fn get_all_bean_metrics(&self) -> Vec<(String, BeanMetrics)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.metrics()))
            .collect()
    }

    /// Register every bean submitted with `register_gadget!` / `register_dialect!`
    pub fn register_inventory(&self) {
        for submitted in inventory::iter::<BeanConstructor> {
            let constructor: Constructor = Arc::new(submitted.create);
            let identity = match submitted.kind {
                BeanKind::Gadget(gadget_type) => {
                    let mut options =
                        GadgetOptions::new(NameRef::name(submitted.plugin), gadget_type, submitted.name);
                    options.support_all_methods = submitted.support_all_methods;
                    self.register_gadget(constructor, &options)
                }
                BeanKind::Dialect(bridge) => self.register_dialect(
                    constructor,
                    &DialectOptions::new(
                        NameRef::name(submitted.plugin),
                        NameRef::name(bridge),
                        submitted.name,
                    ),
                ),
            };

            let name = identity.object_name();
            for alias in submitted.aliases {
                self.register_alias(alias, &name);
            }
        }
    }
}

impl Default for BeanRegistry {
    fn default() -> Self {
        Self::new(ObjectDecorator::new(DecoratorConfig::default()))
    }
}

/// Global registry instance
static GLOBAL_REGISTRY: OnceLock<BeanRegistry> = OnceLock::new();

/// Get the global bean registry
///
/// The registry is lazily initialized on first access with the configuration
/// found in the environment, and populated with all beans registered via
/// `inventory::submit!`.
pub fn global_registry() -> &'static BeanRegistry {
    GLOBAL_REGISTRY.get_or_init(|| {
        let config = DecoratorConfig::from_env().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid decorator environment, using defaults");
            DecoratorConfig::default()
        });
        build_global(ObjectDecorator::new(config))
    })
}

/// Initialize the global registry with a configured decorator
///
/// Returns `false` if the registry was already initialized; the existing one
/// is kept.
pub fn init_registry(decorator: ObjectDecorator) -> bool {
    let mut decorator = Some(decorator);
    GLOBAL_REGISTRY.get_or_init(|| match decorator.take() {
        Some(decorator) => build_global(decorator),
        None => BeanRegistry::default(),
    });
    decorator.is_none()
}

fn build_global(decorator: ObjectDecorator) -> BeanRegistry {
    let registry = BeanRegistry::new(decorator);
    registry.register_inventory();

    tracing::info!(bean_count = registry.bean_count(), "Bean registry initialized");
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::{LoggingTexture, StaticTextureStore, Texture};
    use crate::object::DynamicBean;

    fn ok_constructor() -> Constructor {
        Arc::new(|_: Vec<Value>| -> Result<Arc<dyn Bean>, CallError> {
            Ok(DynamicBean::builder("Cache")
                .method("get", |_| Ok(Value::null()))
                .build_arc())
        })
    }

    fn gadget_options() -> GadgetOptions {
        GadgetOptions::new(NameRef::name("plugin-app-cache"), GadgetType::Services, "cache")
    }

    #[test]
    fn test_registry_new() {
        let registry = BeanRegistry::default();
        assert_eq!(registry.bean_count(), 0);
        assert!(!registry.has_bean("appCache/services/cache"));
    }

    #[test]
    fn test_register_and_create_gadget() {
        let registry = BeanRegistry::default();
        let identity = registry.register_gadget(ok_constructor(), &gadget_options());
        assert_eq!(identity.object_name(), "appCache/services/cache");
        assert_eq!(registry.bean_names(), vec!["appCache/services/cache".to_string()]);

        let bean = registry
            .create_gadget("appCache", GadgetType::Services, "cache", vec![])
            .unwrap();
        assert!(bean.call("get", vec![]).unwrap().is_null());

        let metrics = registry.get_bean_metrics("appCache/services/cache").unwrap();
        assert_eq!(metrics.call_count, 1);
        assert_eq!(metrics.state, "active");
        // empty store: nothing to decorate
        assert!(!metrics.decorated);
    }

    #[test]
    fn test_decorated_registration() {
        let store = StaticTextureStore::default();
        store.set_gadget_texture(
            "appCache",
            GadgetType::Services,
            "cache",
            Texture::default().with_method("get", Texture::default().with_logging(LoggingTexture::on())),
        );
        let registry = BeanRegistry::new(
            ObjectDecorator::new(DecoratorConfig::default()).with_store(Arc::new(store)),
        );
        registry.register_gadget(ok_constructor(), &gadget_options());

        let bean = registry.create("appCache/services/cache", vec![]).unwrap();
        assert!(bean.as_interceptor().is_some());
        assert!(registry.get_bean_metrics("appCache/services/cache").unwrap().decorated);
    }

    #[test]
    fn test_unknown_bean() {
        let registry = BeanRegistry::default();
        let result = registry.create("nothing/services/here", vec![]);
        assert!(matches!(result, Err(DecoratorError::UnknownBean(_))));
    }

    #[test]
    fn test_registry_records_error() {
        let registry = BeanRegistry::default();
        let failing: Constructor = Arc::new(|_: Vec<Value>| -> Result<Arc<dyn Bean>, CallError> {
            Err(CallError::msg("intentional error"))
        });
        registry.register_dialect(
            failing,
            &DialectOptions::new(NameRef::code("appCache"), NameRef::name("bridge-redis"), "client"),
        );

        let result = registry.create_dialect("redis", "appCache", "client", vec![]);
        assert!(matches!(result, Err(DecoratorError::Construction { .. })));

        let metrics = registry.get_bean_metrics("redis/appCache/client").unwrap();
        assert_eq!(metrics.error_count, 1);
        assert!(metrics.last_error.unwrap().contains("intentional error"));
    }

    #[test]
    fn test_constructor_panic_is_isolated() {
        let registry = BeanRegistry::default();
        let panicking: Constructor = Arc::new(|_: Vec<Value>| -> Result<Arc<dyn Bean>, CallError> {
            panic!("constructor exploded")
        });
        registry.register_gadget(panicking, &gadget_options());

        match registry.create("appCache/services/cache", vec![]) {
            Err(DecoratorError::Panic { bean, message }) => {
                assert_eq!(bean, "appCache/services/cache");
                assert!(message.contains("constructor exploded"));
            }
            other => panic!("expected panic error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(
            registry.get_bean_metrics("appCache/services/cache").unwrap().state,
            "failed"
        );
    }

    #[test]
    fn test_aliases() {
        let registry = BeanRegistry::default();
        registry.register_gadget(ok_constructor(), &gadget_options());

        assert!(registry.register_alias("cache", "appCache/services/cache"));
        assert!(!registry.register_alias("ghost", "appCache/services/ghost"));
        assert!(registry.has_bean("cache"));
        assert!(registry.create("cache", vec![]).is_ok());
        assert_eq!(
            registry.identity("cache").map(|identity| identity.object_name()),
            Some("appCache/services/cache".to_string())
        );
    }
}
