//! Capsule composition
//!
//! Mocking sits innermost and Logging outermost, so logs always describe
//! what the caller actually received. When neither layer is active the raw
//! function is handed back unchanged.

use std::sync::Arc;

use super::classify::{Classifier, Counters};
use super::context::BeanContext;
use super::interceptor::spread_result;
use super::logging::LoggingInterceptor;
use super::mocking::MockingInterceptor;
use super::resolver::resolve_method_texture;
use super::texture::{MethodType, MockingTexture, Texture};
use crate::object::Function;

/// Composed state of one method path, cached by its owning interceptor
pub struct MethodState {
    raw: Function,
    capsule: Function,
    /// Capsule plus result re-wrapping when the texture asks for it
    entry: Function,
    texture: Option<Texture>,
    classifier: Arc<Classifier>,
}

impl MethodState {
    /// Resolve the texture of `field_chain + [method]` and build its capsule
    pub fn compose(
        context: &Arc<BeanContext>,
        field_chain: &[String],
        method: &str,
        raw: Function,
    ) -> Self {
        let mut texture = resolve_method_texture(
            context.texture(),
            field_chain,
            method,
            &context.resolve_options(),
        );

        if context.support_all_methods() {
            let texture = texture.get_or_insert_with(Texture::default);
            texture.mocking.get_or_insert_with(MockingTexture::on);
        }

        let classifier = Arc::new(
            match texture.as_ref().and_then(|texture| texture.method_type) {
                Some(method_type) => Classifier::pinned(method_type),
                None => Classifier::probing(context.threshold()),
            },
        );

        let method_name = dotted(field_chain, method);
        let capsule = match &texture {
            Some(texture) if texture.is_enabled() => build_capsule(
                context,
                &method_name,
                texture,
                &classifier,
                raw.clone(),
            ),
            _ => raw.clone(),
        };

        tracing::debug!(
            object_name = %context.object_name(),
            method_name = %method_name,
            instrumented = !capsule.ptr_eq(&raw),
            "Composed method capsule"
        );

        let entry = if texture.as_ref().is_some_and(Texture::wants_spread) {
            spreading(context.clone(), field_chain.to_vec(), method.to_string(), capsule.clone())
        } else {
            capsule.clone()
        };

        Self {
            raw,
            capsule,
            entry,
            texture,
            classifier,
        }
    }

    /// The callable handed to callers
    pub fn capsule(&self) -> &Function {
        &self.capsule
    }

    /// The callable returned by member reads and used by member calls
    pub fn entry(&self) -> &Function {
        &self.entry
    }

    /// The unwrapped implementation
    pub fn raw(&self) -> &Function {
        &self.raw
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /// Whether returned objects and functions are wrapped again
    pub fn spread(&self) -> bool {
        self.texture.as_ref().is_some_and(Texture::wants_spread)
    }

    /// Declared or pinned convention
    pub fn method_type(&self) -> Option<MethodType> {
        self.classifier.current()
    }

    pub fn counters(&self) -> Counters {
        self.classifier.counters()
    }

    pub fn is_instrumented(&self) -> bool {
        !self.capsule.ptr_eq(&self.raw)
    }
}

/// Call `capsule`, then wrap a returned object or function at `field_chain + [method]`
fn spreading(
    context: Arc<BeanContext>,
    field_chain: Vec<String>,
    method: String,
    capsule: Function,
) -> Function {
    Function::new(move |args| {
        let result = capsule.call(args)?;
        if !result.is_wrappable() {
            return Ok(result);
        }
        Ok(spread_result(&context, &field_chain, &method, result))
    })
}

fn build_capsule(
    context: &Arc<BeanContext>,
    method_name: &str,
    texture: &Texture,
    classifier: &Arc<Classifier>,
    raw: Function,
) -> Function {
    let mut capsule = raw.clone();
    let mut layered = false;

    if let Some(mocking) = texture.mocking.as_ref().filter(|mocking| {
        mocking.has_rules() || (context.support_all_methods() && mocking.is_enabled())
    }) {
        capsule = MockingInterceptor::new(
            context.object_name(),
            method_name,
            mocking.clone(),
            classifier.clone(),
        )
        .wrap(capsule);
        layered = true;
    }

    if let Some(logging) = texture.logging.as_ref().filter(|logging| logging.is_enabled()) {
        capsule = LoggingInterceptor::new(
            context.clone(),
            method_name,
            logging.clone(),
            classifier.clone(),
        )
        .wrap(capsule);
        layered = true;
    }

    if layered { capsule } else { raw }
}

fn dotted(field_chain: &[String], method: &str) -> String {
    if field_chain.is_empty() {
        return method.to_string();
    }
    let mut name = field_chain.join(".");
    name.push('.');
    name.push_str(method);
    name
}
