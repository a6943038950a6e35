//! Recursive object interceptor
//!
//! An [`ObjectInterceptor`] stands in for a bean. Reads of object- or
//! function-valued members hand out nested interceptors scoped to the
//! extended path; method calls go through the cached capsule of their path.
//! Sub-objects are wrapped on first access and never copied, so writes made
//! through an interceptor land on the original object.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::classify::Counters;
use super::composer::MethodState;
use super::context::BeanContext;
use super::texture::MethodType;
use crate::errors::{CallError, CallResult};
use crate::object::{Bean, Function, Value};

pub struct ObjectInterceptor {
    target: Arc<dyn Bean>,
    context: Arc<BeanContext>,
    path: Vec<String>,
    /// Nested interceptors of sub-object fields
    children: DashMap<String, Arc<ObjectInterceptor>>,
    /// Composed methods, keyed by member name
    methods: DashMap<String, Arc<MethodState>>,
    /// Composed function-valued fields, keyed by member name
    functions: DashMap<String, Arc<MethodState>>,
}

impl ObjectInterceptor {
    /// Wrap a freshly built bean at the root path
    ///
    /// A bean that is already intercepted is returned as is.
    pub fn wrap_root(target: Arc<dyn Bean>, context: Arc<BeanContext>) -> Arc<dyn Bean> {
        if target.as_interceptor().is_some() {
            return target;
        }
        Arc::new(Self::new(target, context, Vec::new()))
    }

    pub(crate) fn new(target: Arc<dyn Bean>, context: Arc<BeanContext>, path: Vec<String>) -> Self {
        Self {
            target,
            context,
            path,
            children: DashMap::new(),
            methods: DashMap::new(),
            functions: DashMap::new(),
        }
    }

    /// The wrapped bean
    pub fn target(&self) -> &Arc<dyn Bean> {
        &self.target
    }

    pub fn context(&self) -> &Arc<BeanContext> {
        &self.context
    }

    /// Field names from the bean root to this object
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Capsule of a method, composing it on first use
    pub fn capsule(&self, method: &str) -> Option<Function> {
        self.state_of(method).map(|state| state.capsule().clone())
    }

    /// Declared or pinned calling convention of a method
    pub fn method_type(&self, method: &str) -> Option<MethodType> {
        self.existing_state(method).and_then(|state| state.method_type())
    }

    /// Probing counters of a method
    pub fn counters(&self, method: &str) -> Counters {
        self.existing_state(method)
            .map(|state| state.counters())
            .unwrap_or_default()
    }

    /// Number of composed method paths held by this object
    pub fn composed_count(&self) -> usize {
        self.methods.len() + self.functions.len()
    }

    fn existing_state(&self, name: &str) -> Option<Arc<MethodState>> {
        if let Some(state) = self.methods.get(name) {
            return Some(state.clone());
        }
        self.functions.get(name).map(|state| state.clone())
    }

    fn state_of(&self, name: &str) -> Option<Arc<MethodState>> {
        if self.target.has_method(name) {
            return Some(self.method_state(name));
        }
        match self.target.get(name) {
            Some(Value::Function(function)) => Some(self.function_state(name, function)),
            _ => None,
        }
    }

    /// Composed state of a bean method; built once per name
    fn method_state(&self, name: &str) -> Arc<MethodState> {
        if let Some(state) = self.methods.get(name) {
            return state.clone();
        }

        let target = self.target.clone();
        let method = name.to_string();
        let raw = Function::new(move |args| target.call(&method, args));
        let state = Arc::new(MethodState::compose(&self.context, &self.path, name, raw));

        // first writer wins so every caller sees the same capsule
        self.methods
            .entry(name.to_string())
            .or_insert(state)
            .clone()
    }

    /// Composed state of a function-valued field; rebuilt if the field is reassigned
    fn function_state(&self, name: &str, function: Function) -> Arc<MethodState> {
        if let Some(state) = self.functions.get(name) {
            if state.raw().ptr_eq(&function) {
                return state.clone();
            }
        }

        // composed under the shard lock so racing readers share one state
        match self.functions.entry(name.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().raw().ptr_eq(&function) {
                    return occupied.get().clone();
                }
                let state = Arc::new(MethodState::compose(&self.context, &self.path, name, function));
                occupied.insert(state.clone());
                state
            }
            Entry::Vacant(vacant) => vacant
                .insert(Arc::new(MethodState::compose(&self.context, &self.path, name, function)))
                .value()
                .clone(),
        }
    }

    fn child(&self, name: &str, object: Arc<dyn Bean>) -> Arc<ObjectInterceptor> {
        if let Some(child) = self.children.get(name) {
            if Arc::ptr_eq(&child.target, &object) {
                return child.clone();
            }
        }

        let build = |object: Arc<dyn Bean>| {
            Arc::new(ObjectInterceptor::new(
                object,
                self.context.clone(),
                self.extended_path(name),
            ))
        };
        match self.children.entry(name.to_string()) {
            Entry::Occupied(mut occupied) => {
                if Arc::ptr_eq(&occupied.get().target, &object) {
                    return occupied.get().clone();
                }
                let child = build(object);
                occupied.insert(child.clone());
                child
            }
            Entry::Vacant(vacant) => vacant.insert(build(object)).value().clone(),
        }
    }

    fn extended_path(&self, name: &str) -> Vec<String> {
        let mut path = self.path.clone();
        path.push(name.to_string());
        path
    }
}

/// Wrap a value returned from `field_chain + [method]`
///
/// Objects get a fresh interceptor scoped to the extended path; functions get
/// a freshly composed method. Anything else, promises included, is returned
/// as is.
pub(crate) fn spread_result(
    context: &Arc<BeanContext>,
    field_chain: &[String],
    method: &str,
    value: Value,
) -> Value {
    match value {
        Value::Object(object) if object.as_interceptor().is_none() => {
            let mut path = field_chain.to_vec();
            path.push(method.to_string());
            Value::Object(Arc::new(ObjectInterceptor::new(object, context.clone(), path)))
        }
        Value::Function(function) => {
            let state = MethodState::compose(context, field_chain, method, function);
            Value::Function(state.entry().clone())
        }
        other => other,
    }
}

impl Bean for ObjectInterceptor {
    fn type_name(&self) -> &str {
        self.target.type_name()
    }

    fn get(&self, name: &str) -> Option<Value> {
        match self.target.get(name) {
            Some(Value::Object(object)) => {
                let child: Arc<dyn Bean> = self.child(name, object);
                Some(Value::Object(child))
            }
            Some(Value::Function(function)) => Some(Value::Function(
                self.function_state(name, function).entry().clone(),
            )),
            Some(other) => Some(other),
            None if self.target.has_method(name) => {
                Some(Value::Function(self.method_state(name).entry().clone()))
            }
            None => None,
        }
    }

    fn has_method(&self, name: &str) -> bool {
        self.target.has_method(name)
    }

    fn call(&self, method: &str, args: Vec<Value>) -> CallResult {
        let Some(state) = self.state_of(method) else {
            return match self.target.call(method, args) {
                Err(CallError::NoSuchMethod(_)) => Err(CallError::NoSuchMethod(method.to_string())),
                other => other,
            };
        };

        state.entry().call(args)
    }

    fn set(&self, name: &str, value: Value) -> Result<(), CallError> {
        self.target.set(name, value)
    }

    fn fields(&self) -> Vec<String> {
        self.target.fields()
    }

    fn methods(&self) -> Vec<String> {
        self.target.methods()
    }

    fn as_interceptor(&self) -> Option<&ObjectInterceptor> {
        Some(self)
    }
}

impl std::fmt::Debug for ObjectInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectInterceptor")
            .field("type_name", &self.target.type_name())
            .field("object_name", &self.context.object_name())
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
