//! Method texture lookup
//!
//! Finds the effective texture of a method inside a bean texture. Nested
//! nodes (`methods.a.b.c`) are tried before the flattened dotted key
//! (`methods["a.b.c"]`). A disabled ancestor disables every descendant that
//! does not set `enabled` itself. The shared tree is never mutated; callers
//! receive an owned copy.

use super::template::default_texture;
use super::texture::Texture;

/// Option-level inputs to texture resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Fallback for `useDefaultTexture` when neither method nor bean sets it
    pub use_default_texture: bool,
    /// Pick the stream-id-aware default template
    pub stream_aware: bool,
}

/// Resolve the texture for `field_chain + [method]`
///
/// Returns `None` when the bean texture holds nothing for this path and no
/// default template applies.
pub fn resolve_method_texture(
    bean: &Texture,
    field_chain: &[String],
    method: &str,
    options: &ResolveOptions,
) -> Option<Texture> {
    let mut path: Vec<&str> = field_chain.iter().map(String::as_str).collect();
    path.push(method);

    let mut disabled = bean.enabled == Some(false);
    let mut found = lookup_nested(bean, &path, &mut disabled);
    if found.is_none() {
        found = bean.methods.get(&path.join("."));
    }

    let use_default = found
        .and_then(|texture| texture.use_default_texture)
        .or(bean.use_default_texture)
        .unwrap_or(options.use_default_texture);

    if found.is_none() && !use_default {
        return None;
    }

    let mut texture = found.map(detach).unwrap_or_default();
    if disabled && texture.enabled.is_none() {
        texture.enabled = Some(false);
    }
    if use_default {
        texture.merge_defaults(default_texture(options.stream_aware));
    }

    tracing::trace!(
        path = %path.join("."),
        enabled = texture.is_enabled(),
        use_default,
        "Resolved method texture"
    );

    Some(texture)
}

/// Walk `methods.a.b.c`, recording disabled ancestors on the way
fn lookup_nested<'t>(bean: &'t Texture, path: &[&str], disabled: &mut bool) -> Option<&'t Texture> {
    let (first, rest) = path.split_first()?;
    let mut node = bean.methods.get(*first)?;
    for segment in rest {
        if node.enabled == Some(false) {
            *disabled = true;
        }
        node = node.children.get(*segment)?;
    }
    Some(node)
}

/// Copy of a node without its descendants
fn detach(texture: &Texture) -> Texture {
    Texture {
        enabled: texture.enabled,
        logging: texture.logging.clone(),
        mocking: texture.mocking.clone(),
        method_type: texture.method_type,
        recursive: texture.recursive,
        spread: texture.spread,
        outspread: texture.outspread,
        nested: texture.nested,
        use_default_texture: texture.use_default_texture,
        methods: Default::default(),
        children: Default::default(),
    }
}
