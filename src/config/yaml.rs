use serde::Deserialize;
use std::path::PathBuf;

use super::{ConfigError, DecoratorConfig};
use crate::decorator::store::TextureTree;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// decorator:
///   bridge_enabled: true
///   gadget_enabled: true
///   precise_threshold: 5
///   use_default_texture: false
///   support_all_methods: false
///
/// app:
///   name: "order-service"
///   version: "1.4.0"
///   stream_id: "run-2026-10-19"
///
/// textures:
///   plugins:
///     appOrders:
///       services:
///         orderManager:
///           methods:
///             placeOrder:
///               methodType: promise
///               logging:
///                 onRequest:
///                   template: "placing order #{requestId}"
///             repository:
///               findById:
///                 logging:
///                   enabled: true
///   bridges:
///     mongoose:
///       appOrders:
///         orderStore:
///           mocking:
///             mappings:
///               - name: "missing order"
///                 when: ["order-0"]
///                 throws:
///                   name: "NotFoundError"
///                   message: "order-0 does not exist"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub decorator: Option<DecoratorYaml>,
    pub app: Option<AppYaml>,
    pub textures: Option<TextureTree>,
}

/// Decorator switches from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DecoratorYaml {
    pub bridge_enabled: Option<bool>,
    pub gadget_enabled: Option<bool>,
    pub precise_threshold: Option<u32>,
    pub use_default_texture: Option<bool>,
    pub support_all_methods: Option<bool>,
}

/// Application identity from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppYaml {
    pub name: Option<String>,
    pub version: Option<String>,
    pub stream_id: Option<String>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Self::parse(&contents)
    }

    /// Parse YAML configuration from a string
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Overlay the values present in this document on `base`
    pub fn apply(self, mut base: DecoratorConfig) -> DecoratorConfig {
        if let Some(decorator) = self.decorator {
            if let Some(enabled) = decorator.bridge_enabled {
                base.bridge_enabled = enabled;
            }
            if let Some(enabled) = decorator.gadget_enabled {
                base.gadget_enabled = enabled;
            }
            if let Some(threshold) = decorator.precise_threshold {
                base.precise_threshold = threshold;
            }
            if let Some(enabled) = decorator.use_default_texture {
                base.use_default_texture = enabled;
            }
            if let Some(enabled) = decorator.support_all_methods {
                base.support_all_methods = enabled;
            }
        }

        if let Some(app) = self.app {
            if let Some(name) = app.name {
                base.app.name = name;
            }
            if let Some(version) = app.version {
                base.app.version = version;
            }
            if app.stream_id.is_some() {
                base.app.stream_id = app.stream_id;
            }
        }

        base
    }
}
