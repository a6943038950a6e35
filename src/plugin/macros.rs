//! Bean Registration Macros
//!
//! Convenience macros for registering gadgets and dialects with the global
//! bean registry. They wrap the `inventory::submit!` boilerplate.
//!
//! # Example
//!
//! ```ignore
//! use bean_decorator::plugin::prelude::*;
//! use bean_decorator::register_gadget;
//!
//! fn create_order_manager(_args: Vec<Value>) -> Result<Arc<dyn Bean>, CallError> {
//!     Ok(DynamicBean::builder("OrderManager")
//!         .method("placeOrder", |args| Ok(args.into_iter().next().unwrap_or_default()))
//!         .build_arc())
//! }
//!
//! register_gadget!("plugin-app-orders", Services, "orderManager", create_order_manager);
//! ```

/// Register a plugin gadget constructor.
///
/// # Arguments
///
/// * `$plugin` - Plugin package name or code (e.g., "plugin-app-orders")
/// * `$gadget_type` - `Services`, `Triggers` or `Routines`
/// * `$name` - Gadget name
/// * `$factory_fn` - Function with signature `fn(Vec<Value>) -> Result<Arc<dyn Bean>, CallError>`
///
/// # Optional Arguments
///
/// * `aliases: [$alias1, $alias2, ...]` - Alternative registry keys
///
/// # Example
///
/// ```ignore
/// register_gadget!("plugin-app-orders", Services, "orderManager", create_order_manager);
///
/// // With aliases
/// register_gadget!("plugin-app-orders", Services, "orderManager", create_order_manager, aliases: ["orders"]);
/// ```
#[macro_export]
macro_rules! register_gadget {
    ($plugin:expr, $gadget_type:ident, $name:expr, $factory_fn:expr) => {
        ::inventory::submit! {
            $crate::plugin::registry::BeanConstructor::gadget(
                $plugin,
                $crate::plugin::metadata::GadgetType::$gadget_type,
                $name,
                $factory_fn,
            )
        }
    };
    ($plugin:expr, $gadget_type:ident, $name:expr, $factory_fn:expr, aliases: [$($alias:expr),* $(,)?]) => {
        ::inventory::submit! {
            $crate::plugin::registry::BeanConstructor::gadget(
                $plugin,
                $crate::plugin::metadata::GadgetType::$gadget_type,
                $name,
                $factory_fn,
            )
            .with_aliases(&[$($alias),*])
        }
    };
}

/// Register a bridge dialect constructor.
///
/// # Arguments
///
/// * `$bridge` - Bridge package name or code (e.g., "bridge-mongoose")
/// * `$plugin` - Plugin the dialect is configured for
/// * `$name` - Dialect name
/// * `$factory_fn` - Function with signature `fn(Vec<Value>) -> Result<Arc<dyn Bean>, CallError>`
///
/// # Example
///
/// ```ignore
/// register_dialect!("bridge-mongoose", "plugin-app-orders", "orderStore", create_order_store);
/// ```
#[macro_export]
macro_rules! register_dialect {
    ($bridge:expr, $plugin:expr, $name:expr, $factory_fn:expr) => {
        ::inventory::submit! {
            $crate::plugin::registry::BeanConstructor::dialect($bridge, $plugin, $name, $factory_fn)
        }
    };
    ($bridge:expr, $plugin:expr, $name:expr, $factory_fn:expr, aliases: [$($alias:expr),* $(,)?]) => {
        ::inventory::submit! {
            $crate::plugin::registry::BeanConstructor::dialect($bridge, $plugin, $name, $factory_fn)
                .with_aliases(&[$($alias),*])
        }
    };
}
