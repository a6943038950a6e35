//! Texture: the per-bean interception policy tree
//!
//! A bean texture carries bean-wide switches and a `methods` map. Method
//! nodes nest directly (`methods.a.b.c`); a node is both the texture of the
//! member at that path and the parent of deeper members.
//!
//! Data fields deserialize from YAML/JSON. Closures (`selector`, `generate`,
//! `getRequestId`, `extractInfo`) are attached programmatically.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{CallError, CallResult};
use crate::object::Value;
use crate::sink::LogLevel;

/// Declared calling convention of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodType {
    /// Returns a [`Promise`](crate::object::Promise)
    Promise,
    /// Reports through a trailing function argument `(error, ...results)`
    Callback,
    /// Returns or fails synchronously
    General,
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodType::Promise => write!(f, "promise"),
            MethodType::Callback => write!(f, "callback"),
            MethodType::General => write!(f, "general"),
        }
    }
}

/// Interception policy for a bean or a member of it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Texture {
    /// Unset inherits from the parent node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingTexture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mocking: Option<MockingTexture>,
    /// Unset means auto-detect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_type: Option<MethodType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outspread: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_default_texture: Option<bool>,
    /// Member textures of a bean root, keyed by name or dotted path
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, Texture>,
    /// Deeper members below a method node
    #[serde(flatten)]
    pub children: BTreeMap<String, Texture>,
}

impl Texture {
    /// Texture with only `enabled` set
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    /// Any recursion flag asks for the return value to be wrapped
    pub fn wants_spread(&self) -> bool {
        [self.recursive, self.spread, self.outspread, self.nested]
            .iter()
            .any(|flag| *flag == Some(true))
    }

    /// Attach a member texture at `path` (dotted names create nested nodes)
    pub fn with_method(mut self, path: &str, texture: Texture) -> Self {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return self;
        };
        let mut node = self.methods.entry(first.to_string()).or_default();
        for segment in segments {
            node = node.children.entry(segment.to_string()).or_default();
        }
        let children = std::mem::take(&mut node.children);
        *node = texture;
        for (name, child) in children {
            node.children.entry(name).or_insert(child);
        }
        self
    }

    pub fn with_logging(mut self, logging: LoggingTexture) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn with_mocking(mut self, mocking: MockingTexture) -> Self {
        self.mocking = Some(mocking);
        self
    }

    pub fn with_method_type(mut self, method_type: MethodType) -> Self {
        self.method_type = Some(method_type);
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }

    /// Fill every unset field from `defaults`, recursing into logging
    pub fn merge_defaults(&mut self, defaults: &Texture) {
        fill(&mut self.enabled, &defaults.enabled);
        fill(&mut self.method_type, &defaults.method_type);
        fill(&mut self.recursive, &defaults.recursive);
        fill(&mut self.spread, &defaults.spread);
        fill(&mut self.outspread, &defaults.outspread);
        fill(&mut self.nested, &defaults.nested);
        fill(&mut self.use_default_texture, &defaults.use_default_texture);
        fill(&mut self.mocking, &defaults.mocking);
        match (&mut self.logging, &defaults.logging) {
            (Some(logging), Some(default_logging)) => logging.merge_defaults(default_logging),
            (None, Some(default_logging)) => self.logging = Some(default_logging.clone()),
            _ => {}
        }
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, default: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(default);
    }
}

/// Logging policy of a method
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingTexture {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_request: Option<EventTexture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_success: Option<EventTexture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<EventTexture>,
}

impl LoggingTexture {
    /// Logging switched on with default event settings
    pub fn on() -> Self {
        Self {
            enabled: Some(true),
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    pub fn with_on_request(mut self, event: EventTexture) -> Self {
        self.on_request = Some(event);
        self
    }

    pub fn with_on_success(mut self, event: EventTexture) -> Self {
        self.on_success = Some(event);
        self
    }

    pub fn with_on_failure(mut self, event: EventTexture) -> Self {
        self.on_failure = Some(event);
        self
    }

    pub fn merge_defaults(&mut self, defaults: &LoggingTexture) {
        fill(&mut self.enabled, &defaults.enabled);
        for (slot, default) in [
            (&mut self.on_request, &defaults.on_request),
            (&mut self.on_success, &defaults.on_success),
            (&mut self.on_failure, &defaults.on_failure),
        ] {
            match (slot.as_mut(), default) {
                (Some(event), Some(default_event)) => event.merge_defaults(default_event),
                (None, Some(default_event)) => *slot = Some(default_event.clone()),
                _ => {}
            }
        }
    }
}

/// Settings of one Request/Success/Failure event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventTexture {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip)]
    pub get_request_id: Option<RequestIdExtractor>,
    #[serde(skip)]
    pub extract_info: Option<Extractor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl EventTexture {
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn with_request_id<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Option<String> + Send + Sync + 'static,
    {
        self.get_request_id = Some(RequestIdExtractor::new(f));
        self
    }

    pub fn with_extract_info<F>(mut self, f: F) -> Self
    where
        F: Fn(&EventData<'_>) -> serde_json::Value + Send + Sync + 'static,
    {
        self.extract_info = Some(Extractor::new(f));
        self
    }

    pub fn merge_defaults(&mut self, defaults: &EventTexture) {
        fill(&mut self.enabled, &defaults.enabled);
        fill(&mut self.get_request_id, &defaults.get_request_id);
        fill(&mut self.extract_info, &defaults.extract_info);
        fill(&mut self.template, &defaults.template);
        fill(&mut self.tags, &defaults.tags);
        fill(&mut self.log_level, &defaults.log_level);
    }
}

/// What an `extractInfo` callback sees
#[derive(Debug, Clone, Copy)]
pub enum EventData<'a> {
    /// Arguments before the call
    Request(&'a [Value]),
    /// Value the caller received
    Success(&'a Value),
    /// Error the caller received
    Failure(&'a CallError),
}

/// `getRequestId(args)` callback
#[derive(Clone)]
pub struct RequestIdExtractor(Arc<dyn Fn(&[Value]) -> Option<String> + Send + Sync>);

impl RequestIdExtractor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn extract(&self, args: &[Value]) -> Option<String> {
        (self.0)(args)
    }
}

impl fmt::Debug for RequestIdExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestIdExtractor")
    }
}

/// `extractInfo(data)` callback
#[derive(Clone)]
pub struct Extractor(Arc<dyn Fn(&EventData<'_>) -> serde_json::Value + Send + Sync>);

impl Extractor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&EventData<'_>) -> serde_json::Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn extract(&self, data: &EventData<'_>) -> serde_json::Value {
        (self.0)(data)
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Extractor")
    }
}

/// Policy when no mock rule selects a call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unmatched {
    /// Fail with "mock not found" through the calling convention
    Exception,
    /// Run the real method
    #[default]
    Fallthrough,
}

/// Mocking policy of a method
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MockingTexture {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmatched: Option<Unmatched>,
    /// Rules, tried in declaration order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<MockMapping>,
}

impl MockingTexture {
    pub fn on() -> Self {
        Self {
            enabled: Some(true),
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    /// Enabled and holding at least one rule
    pub fn has_rules(&self) -> bool {
        self.is_enabled() && !self.mappings.is_empty()
    }

    pub fn unmatched(&self) -> Unmatched {
        self.unmatched.unwrap_or_default()
    }

    pub fn with_unmatched(mut self, unmatched: Unmatched) -> Self {
        self.unmatched = Some(unmatched);
        self
    }

    /// Append a rule
    pub fn with_mapping<S, G>(mut self, name: impl Into<String>, selector: S, generate: G) -> Self
    where
        S: Fn(&[Value]) -> bool + Send + Sync + 'static,
        G: Fn(&[Value]) -> CallResult + Send + Sync + 'static,
    {
        self.mappings.push(MockMapping::new(name, selector, generate));
        self
    }
}

/// `selector(args) -> bool`
#[derive(Clone)]
pub struct Selector(Arc<dyn Fn(&[Value]) -> bool + Send + Sync>);

impl Selector {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn matches(&self, args: &[Value]) -> bool {
        (self.0)(args)
    }
}

/// `generate(args) -> result | error`
#[derive(Clone)]
pub struct Generator(Arc<dyn Fn(&[Value]) -> CallResult + Send + Sync>);

impl Generator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn generate(&self, args: &[Value]) -> CallResult {
        (self.0)(args)
    }
}

/// One named mock rule
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "MockMappingSpec", into = "MockMappingSpec")]
pub struct MockMapping {
    pub name: String,
    pub selector: Selector,
    pub generate: Generator,
    spec: Option<MockMappingSpec>,
}

impl MockMapping {
    pub fn new<S, G>(name: impl Into<String>, selector: S, generate: G) -> Self
    where
        S: Fn(&[Value]) -> bool + Send + Sync + 'static,
        G: Fn(&[Value]) -> CallResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            selector: Selector::new(selector),
            generate: Generator::new(generate),
            spec: None,
        }
    }
}

impl fmt::Debug for MockMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockMapping")
            .field("name", &self.name)
            .field("declarative", &self.spec.is_some())
            .finish()
    }
}

/// Declarative form of a mock rule
///
/// ```yaml
/// mappings:
///   - name: known-user
///     when: ["alice"]
///     returns: { id: 1 }
///   - name: broken
///     when: ["mallory"]
///     throws: { name: AccessDenied, message: "blocked" }
/// ```
///
/// `when` matches when each listed value equals the argument at the same
/// position; a missing `when` matches every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockMappingSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throws: Option<ThrowSpec>,
}

/// Error produced by a declarative rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowSpec {
    #[serde(default = "default_error_name")]
    pub name: String,
    pub message: String,
}

fn default_error_name() -> String {
    "Error".to_string()
}

impl From<MockMappingSpec> for MockMapping {
    fn from(spec: MockMappingSpec) -> Self {
        let when = spec.when.clone();
        let selector = Selector::new(move |args: &[Value]| match &when {
            None => true,
            Some(expected) => {
                expected.len() <= args.len()
                    && expected
                        .iter()
                        .zip(args)
                        .all(|(want, got)| got.as_data() == Some(want))
            }
        });

        let returns = spec.returns.clone();
        let throws = spec.throws.clone();
        let generate = Generator::new(move |_args: &[Value]| match &throws {
            Some(error) => Err(CallError::new(error.name.clone(), error.message.clone())),
            None => Ok(Value::Data(returns.clone().unwrap_or(serde_json::Value::Null))),
        });

        Self {
            name: spec.name.clone(),
            selector,
            generate,
            spec: Some(spec),
        }
    }
}

impl From<MockMapping> for MockMappingSpec {
    fn from(mapping: MockMapping) -> Self {
        mapping.spec.unwrap_or(MockMappingSpec {
            name: mapping.name,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_method_nodes_deserialize() {
        let texture: Texture = serde_yaml::from_str(
            r#"
enabled: true
methods:
  client:
    enabled: false
    query:
      methodType: promise
      logging:
        enabled: true
        onFailure:
          logLevel: warn
          tags: [db]
  "client.close":
    recursive: true
"#,
        )
        .unwrap();

        let client = &texture.methods["client"];
        assert_eq!(client.enabled, Some(false));
        let query = &client.children["query"];
        assert_eq!(query.method_type, Some(MethodType::Promise));
        let failure = query.logging.as_ref().unwrap().on_failure.as_ref().unwrap();
        assert_eq!(failure.log_level, Some(LogLevel::Warn));
        assert_eq!(failure.tags.as_deref(), Some(&["db".to_string()][..]));
        assert!(texture.methods["client.close"].wants_spread());
    }

    #[test]
    fn test_with_method_builds_nested_nodes() {
        let texture = Texture::default()
            .with_method("a.b", Texture::enabled(false))
            .with_method("a", Texture::default().with_recursive(true));
        let a = &texture.methods["a"];
        assert_eq!(a.recursive, Some(true));
        assert_eq!(a.children["b"].enabled, Some(false));
    }

    #[test]
    fn test_merge_defaults_keeps_explicit_fields() {
        let mut texture = Texture::default().with_logging(
            LoggingTexture::default()
                .with_on_failure(EventTexture::default().with_log_level(LogLevel::Warn)),
        );
        let defaults = Texture::default().with_logging(
            LoggingTexture::on()
                .with_on_failure(
                    EventTexture::default()
                        .with_log_level(LogLevel::Error)
                        .with_template("failed"),
                )
                .with_on_success(EventTexture::default().with_template("done")),
        );

        texture.merge_defaults(&defaults);
        let logging = texture.logging.unwrap();
        assert_eq!(logging.enabled, Some(true));
        let failure = logging.on_failure.unwrap();
        assert_eq!(failure.log_level, Some(LogLevel::Warn));
        assert_eq!(failure.template.as_deref(), Some("failed"));
        assert_eq!(logging.on_success.unwrap().template.as_deref(), Some("done"));
    }

    #[test]
    fn test_declarative_mock_mapping() {
        let mocking: MockingTexture = serde_yaml::from_str(
            r#"
unmatched: exception
mappings:
  - name: alice
    when: ["alice"]
    returns: { id: 1 }
  - name: mallory
    when: ["mallory"]
    throws: { name: AccessDenied, message: blocked }
"#,
        )
        .unwrap();

        assert_eq!(mocking.unmatched(), Unmatched::Exception);
        assert!(mocking.has_rules());

        let alice = &mocking.mappings[0];
        assert!(alice.selector.matches(&[Value::from("alice"), Value::from(2)]));
        assert!(!alice.selector.matches(&[Value::from("bob")]));
        assert!(!alice.selector.matches(&[]));
        assert_eq!(alice.generate.generate(&[]).unwrap().to_json(), json!({"id": 1}));

        let mallory = &mocking.mappings[1];
        assert_eq!(
            mallory.generate.generate(&[]).unwrap_err(),
            CallError::new("AccessDenied", "blocked")
        );

        let round: serde_json::Value = serde_json::to_value(&mocking).unwrap();
        assert_eq!(round["mappings"][0]["name"], "alice");
        assert_eq!(round["unmatched"], "exception");
    }

    #[test]
    fn test_enabled_defaults() {
        assert!(Texture::default().is_enabled());
        assert!(!Texture::enabled(false).is_enabled());
        assert!(LoggingTexture::default().is_enabled());
        assert!(!MockingTexture::on().has_rules());
        assert_eq!(MockingTexture::default().unmatched(), Unmatched::Fallthrough);
    }
}
