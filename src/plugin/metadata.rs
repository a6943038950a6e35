//! Bean Identity and Wrapping Options
//!
//! This module defines how gadgets and bridge dialects are identified: the
//! gadget kind, the raw or normalized names of the owning plugin and bridge,
//! and the per-call wrapping options handed to the decorator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::naming::resolve_gadget_type;

/// Kind of plugin-provided gadget
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GadgetType {
    Services,
    Triggers,
    Routines,
}

impl GadgetType {
    /// Section name used in texture trees and object names
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            GadgetType::Services => "services",
            GadgetType::Triggers => "triggers",
            GadgetType::Routines => "routines",
        }
    }
}

impl fmt::Display for GadgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GadgetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_gadget_type(s).ok_or_else(|| {
            format!(
                "Unknown gadget type: '{}'. Expected one of: services, triggers, routines",
                s
            )
        })
    }
}

/// A name given either raw (package name) or already normalized (code)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NameRef {
    /// Package name, normalized by the name resolver
    Name(String),
    /// Normalized code, used as is
    Code(String),
}

impl NameRef {
    pub fn name(name: impl Into<String>) -> Self {
        NameRef::Name(name.into())
    }

    pub fn code(code: impl Into<String>) -> Self {
        NameRef::Code(code.into())
    }
}

/// Options for wrapping a plugin gadget constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GadgetOptions {
    /// Owning plugin
    pub plugin: NameRef,
    pub gadget_type: GadgetType,
    pub gadget_name: String,
    /// Overrides the configured `support_all_methods` default
    pub support_all_methods: Option<bool>,
    /// Overrides the configured `use_default_texture` default
    pub use_default_texture: Option<bool>,
}

impl GadgetOptions {
    pub fn new(plugin: NameRef, gadget_type: GadgetType, gadget_name: impl Into<String>) -> Self {
        Self {
            plugin,
            gadget_type,
            gadget_name: gadget_name.into(),
            support_all_methods: None,
            use_default_texture: None,
        }
    }

    pub fn with_support_all_methods(mut self, enabled: bool) -> Self {
        self.support_all_methods = Some(enabled);
        self
    }

    pub fn with_use_default_texture(mut self, enabled: bool) -> Self {
        self.use_default_texture = Some(enabled);
        self
    }
}

/// Options for wrapping a bridge dialect constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectOptions {
    /// Plugin the dialect is configured for
    pub plugin: NameRef,
    /// Bridge providing the dialect
    pub bridge: NameRef,
    pub dialect_name: String,
}

impl DialectOptions {
    pub fn new(plugin: NameRef, bridge: NameRef, dialect_name: impl Into<String>) -> Self {
        Self {
            plugin,
            bridge,
            dialect_name: dialect_name.into(),
        }
    }
}

/// Resolved identity of a decorated bean
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BeanIdentity {
    Gadget {
        plugin_code: String,
        gadget_type: GadgetType,
        gadget_name: String,
    },
    Dialect {
        bridge_code: String,
        plugin_code: String,
        dialect_name: String,
    },
}

impl BeanIdentity {
    /// Object name used in log events and registry keys
    pub fn object_name(&self) -> String {
        match self {
            BeanIdentity::Gadget {
                plugin_code,
                gadget_type,
                gadget_name,
            } => format!("{}/{}/{}", plugin_code, gadget_type, gadget_name),
            BeanIdentity::Dialect {
                bridge_code,
                plugin_code,
                dialect_name,
            } => format!("{}/{}/{}", bridge_code, plugin_code, dialect_name),
        }
    }
}

impl fmt::Display for BeanIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object_name())
    }
}
