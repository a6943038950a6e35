//! Configuration module for the bean decorator
//!
//! Decorator settings come from .env files, environment variables and YAML
//! files. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading (decorator settings and textures)
//! - `env`: Environment variable loading
//!
//! # Example
//! ```rust,no_run
//! use bean_decorator::config::DecoratorConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = DecoratorConfig::from_env()?;
//!
//! // Load from YAML file with environment variables as the base
//! let config = DecoratorConfig::from_file(&PathBuf::from("decorator.yaml"))?;
//! println!("probing threshold: {}", config.precise_threshold);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;

mod env;
pub mod yaml;

pub use yaml::YamlConfig;

/// Number of same-convention observations needed before a method's calling
/// convention is pinned
pub const DEFAULT_PRECISE_THRESHOLD: u32 = 5;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config file {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// YAML could not be parsed
    #[error("Failed to parse YAML config: {0}")]
    Parse(String),

    /// An environment variable or YAML value has the wrong format
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Application identity feeding stream-id templating
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    /// Identifier of the broader process/run; enables the stream-aware
    /// default logging template when set
    pub stream_id: Option<String>,
}

/// Decorator configuration
///
/// Global switches for decorating each bean kind, the convention-probing
/// threshold and the option-level defaults passed to every wrap call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorConfig {
    /// Decorate bridge dialects (default: true)
    pub bridge_enabled: bool,
    /// Decorate plugin gadgets (default: true)
    pub gadget_enabled: bool,
    /// Observations required before pinning a calling convention (default: 5)
    pub precise_threshold: u32,
    /// Merge the default logging texture under every method texture (default: false)
    pub use_default_texture: bool,
    /// Route every gadget method through mocking (default: false)
    pub support_all_methods: bool,
    /// Application identity
    pub app: AppInfo,
}

impl Default for DecoratorConfig {
    fn default() -> Self {
        Self {
            bridge_enabled: true,
            gadget_enabled: true,
            precise_threshold: DEFAULT_PRECISE_THRESHOLD,
            use_default_texture: false,
            support_all_methods: false,
            app: AppInfo::default(),
        }
    }
}

impl DecoratorConfig {
    /// Load configuration from environment variables with defaults
    ///
    /// # Errors
    /// Returns an error if a variable is set but has an invalid format, or if
    /// the resulting configuration fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::load_from_env(Self::default())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values (loaded by the binary at startup)
    /// 4. Default values
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;
        Self::from_yaml(yaml_config)
    }

    /// Merge an already parsed YAML document over the environment
    pub fn from_yaml(yaml_config: YamlConfig) -> Result<Self, ConfigError> {
        let base = env::load_from_env(Self::default())?;
        let config = yaml_config.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.precise_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                key: "precise_threshold".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn clear_env() {
        for key in env::ENV_KEYS {
            // SAFETY: tests touching the environment run serially
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn test_default_config() {
        let config = DecoratorConfig::default();
        assert!(config.bridge_enabled);
        assert!(config.gadget_enabled);
        assert_eq!(config.precise_threshold, 5);
        assert!(!config.use_default_texture);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = DecoratorConfig {
            precise_threshold: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        // SAFETY: serialized test
        unsafe {
            std::env::set_var("DECORATOR_PRECISE_THRESHOLD", "9");
            std::env::set_var("DECORATOR_BRIDGE_ENABLED", "false");
            std::env::set_var("APP_STREAM_ID", "run-42");
        }

        let config = DecoratorConfig::from_env().unwrap();
        assert_eq!(config.precise_threshold, 9);
        assert!(!config.bridge_enabled);
        assert!(config.gadget_enabled);
        assert_eq!(config.app.stream_id.as_deref(), Some("run-42"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_value() {
        clear_env();
        // SAFETY: serialized test
        unsafe { std::env::set_var("DECORATOR_PRECISE_THRESHOLD", "many") };

        let result = DecoratorConfig::from_env();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_yaml_overrides_env() {
        clear_env();
        // SAFETY: serialized test
        unsafe {
            std::env::set_var("DECORATOR_PRECISE_THRESHOLD", "9");
            std::env::set_var("APP_NAME", "from-env");
        }

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("decorator.yaml");
        fs::write(
            &path,
            r#"
decorator:
  precise_threshold: 3
  use_default_texture: true
app:
  version: "2.1.0"
"#,
        )
        .unwrap();

        let config = DecoratorConfig::from_file(&path).unwrap();
        assert_eq!(config.precise_threshold, 3);
        assert!(config.use_default_texture);
        assert_eq!(config.app.name, "from-env");
        assert_eq!(config.app.version, "2.1.0");

        clear_env();
    }
}
