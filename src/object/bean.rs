//! Bean trait and a builder-made bean implementation

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::value::{Function, Value};
use crate::decorator::ObjectInterceptor;
use crate::errors::{CallError, CallResult};

/// Factory producing a bean instance from constructor arguments
pub type Constructor =
    Arc<dyn Fn(Vec<Value>) -> Result<Arc<dyn Bean>, CallError> + Send + Sync>;

/// Call surface of a constructed gadget or bridge dialect
///
/// `get` only reports members the bean actually owns; the interceptor relies
/// on this to avoid wrapping foreign or synthetic properties.
pub trait Bean: Send + Sync {
    /// Type name used in log payloads
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Read an own property (data, sub-object or function-valued field)
    fn get(&self, name: &str) -> Option<Value>;

    /// Whether `name` is a method of this bean
    fn has_method(&self, name: &str) -> bool;

    /// Invoke a method
    fn call(&self, method: &str, args: Vec<Value>) -> CallResult;

    /// Write a property
    fn set(&self, name: &str, value: Value) -> Result<(), CallError> {
        let _ = value;
        Err(CallError::msg(format!(
            "property '{}' of {} is read-only",
            name,
            self.type_name()
        )))
    }

    /// Names of own properties
    fn fields(&self) -> Vec<String> {
        Vec::new()
    }

    /// Names of methods
    fn methods(&self) -> Vec<String> {
        Vec::new()
    }

    /// The interceptor view of this bean, if it is decorated
    fn as_interceptor(&self) -> Option<&ObjectInterceptor> {
        None
    }
}

impl std::fmt::Debug for dyn Bean {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bean")
            .field("type_name", &self.type_name())
            .finish_non_exhaustive()
    }
}

/// Bean assembled from named fields and methods
///
/// ```ignore
/// let bean = DynamicBean::builder("Greeter")
///     .method("greet", |args| Ok(Value::from(format!("hello {:?}", args))))
///     .field("lang", Value::from("en"))
///     .build();
/// ```
pub struct DynamicBean {
    type_name: String,
    fields: RwLock<BTreeMap<String, Value>>,
    methods: BTreeMap<String, Function>,
}

impl DynamicBean {
    pub fn builder(type_name: impl Into<String>) -> DynamicBeanBuilder {
        DynamicBeanBuilder {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
            methods: BTreeMap::new(),
        }
    }
}

impl Bean for DynamicBean {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    fn call(&self, method: &str, args: Vec<Value>) -> CallResult {
        if let Some(function) = self.methods.get(method) {
            return function.call(args);
        }
        // function-valued fields are callable too
        let field = self.fields.read().get(method).cloned();
        match field {
            Some(Value::Function(function)) => function.call(args),
            _ => Err(CallError::NoSuchMethod(method.to_string())),
        }
    }

    fn set(&self, name: &str, value: Value) -> Result<(), CallError> {
        self.fields.write().insert(name.to_string(), value);
        Ok(())
    }

    fn fields(&self) -> Vec<String> {
        self.fields.read().keys().cloned().collect()
    }

    fn methods(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }
}

/// Builder for [`DynamicBean`]
pub struct DynamicBeanBuilder {
    type_name: String,
    fields: BTreeMap<String, Value>,
    methods: BTreeMap<String, Function>,
}

impl DynamicBeanBuilder {
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Attach a sub-object
    pub fn object(mut self, name: impl Into<String>, bean: Arc<dyn Bean>) -> Self {
        self.fields.insert(name.into(), Value::Object(bean));
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> CallResult + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Function::new(f));
        self
    }

    pub fn build(self) -> DynamicBean {
        DynamicBean {
            type_name: self.type_name,
            fields: RwLock::new(self.fields),
            methods: self.methods,
        }
    }

    pub fn build_arc(self) -> Arc<dyn Bean> {
        Arc::new(self.build())
    }
}
