//! Constructor wrapping, the entry point of decoration

use std::sync::Arc;

use super::context::BeanContext;
use super::interceptor::ObjectInterceptor;
use crate::errors::CallError;
use crate::object::{Bean, Constructor, Value};

/// Wraps a bean constructor so every instance it builds is intercepted
#[derive(Debug)]
pub struct ConstructorWrapper {
    context: Arc<BeanContext>,
}

impl ConstructorWrapper {
    pub fn new(context: BeanContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &Arc<BeanContext> {
        &self.context
    }

    /// Decorated constructor; the original one if the bean texture is disabled
    pub fn wrap(self, constructor: Constructor) -> Constructor {
        if !self.context.texture().is_enabled() {
            tracing::debug!(
                object_name = %self.context.object_name(),
                "Bean texture disabled, constructor left untouched"
            );
            return constructor;
        }

        let context = self.context;
        Arc::new(move |args: Vec<Value>| -> Result<Arc<dyn Bean>, CallError> {
            let bean = constructor(args)?;
            Ok(ObjectInterceptor::wrap_root(bean, context.clone()))
        })
    }
}
