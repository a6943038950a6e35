use std::str::FromStr;

use super::{ConfigError, DecoratorConfig};

pub(crate) const ENV_KEYS: [&str; 8] = [
    "DECORATOR_BRIDGE_ENABLED",
    "DECORATOR_GADGET_ENABLED",
    "DECORATOR_PRECISE_THRESHOLD",
    "DECORATOR_USE_DEFAULT_TEXTURE",
    "DECORATOR_SUPPORT_ALL_METHODS",
    "APP_NAME",
    "APP_VERSION",
    "APP_STREAM_ID",
];

/// Overlay environment variables on `base`
pub(crate) fn load_from_env(mut base: DecoratorConfig) -> Result<DecoratorConfig, ConfigError> {
    if let Some(v) = parse_bool("DECORATOR_BRIDGE_ENABLED")? {
        base.bridge_enabled = v;
    }
    if let Some(v) = parse_bool("DECORATOR_GADGET_ENABLED")? {
        base.gadget_enabled = v;
    }
    if let Some(v) = parse_var::<u32>("DECORATOR_PRECISE_THRESHOLD")? {
        base.precise_threshold = v;
    }
    if let Some(v) = parse_bool("DECORATOR_USE_DEFAULT_TEXTURE")? {
        base.use_default_texture = v;
    }
    if let Some(v) = parse_bool("DECORATOR_SUPPORT_ALL_METHODS")? {
        base.support_all_methods = v;
    }
    if let Some(v) = read_var("APP_NAME") {
        base.app.name = v;
    }
    if let Some(v) = read_var("APP_VERSION") {
        base.app.version = v;
    }
    if let Some(v) = read_var("APP_STREAM_ID") {
        base.app.stream_id = Some(v);
    }
    Ok(base)
}

fn read_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    read_var(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

fn parse_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    read_var(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a boolean, got '{}'", other),
            }),
        })
        .transpose()
}
