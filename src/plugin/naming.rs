//! Name Resolution
//!
//! Maps raw package names to the normalized codes used as texture-tree keys
//! and object names, and resolves gadget-type aliases with an O(1) PHF lookup.
//!
//! ```text
//! "@acme/plugin-app-webserver" → strip scope → strip "plugin-" → "appWebserver"
//! "Service" → SmallString (stack-alloc lowercase) → PHF Map → GadgetType::Services
//! ```

use phf::phf_map;

use super::metadata::{GadgetType, NameRef};

/// PHF map for gadget-type resolution (including aliases)
pub static GADGET_TYPE_MAP: phf::Map<&'static str, GadgetType> = phf_map! {
    // Primary names
    "services" => GadgetType::Services,
    "triggers" => GadgetType::Triggers,
    "routines" => GadgetType::Routines,
    // Aliases
    "service" => GadgetType::Services,
    "servlet" => GadgetType::Services,
    "servlets" => GadgetType::Services,
    "trigger" => GadgetType::Triggers,
    "routine" => GadgetType::Routines,
    "command" => GadgetType::Routines,
    "commands" => GadgetType::Routines,
};

/// Resolve a gadget-type name or alias, case-insensitively
#[inline]
pub fn resolve_gadget_type(name: &str) -> Option<GadgetType> {
    let lowercase = SmallString::from_lowercase(name);
    GADGET_TYPE_MAP.get(lowercase.as_str()).copied()
}

/// Stack-allocated lowercase string for short lookup keys
///
/// Falls back to heap allocation for keys longer than 32 bytes.
pub struct SmallString {
    inline: [u8; 32],
    len: u8,
    heap: Option<String>,
}

impl SmallString {
    #[inline]
    pub fn from_lowercase(s: &str) -> Self {
        let bytes = s.as_bytes();
        if bytes.len() <= 32 && s.is_ascii() {
            let mut inline = [0u8; 32];
            for (i, &b) in bytes.iter().enumerate() {
                inline[i] = b.to_ascii_lowercase();
            }
            Self {
                inline,
                len: bytes.len() as u8,
                heap: None,
            }
        } else {
            Self {
                inline: [0u8; 32],
                len: 0,
                heap: Some(s.to_lowercase()),
            }
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        match &self.heap {
            Some(heap) => heap.as_str(),
            // inline bytes are lowercased ASCII
            None => std::str::from_utf8(&self.inline[..self.len as usize]).unwrap_or_default(),
        }
    }
}

/// Maps package names to normalized codes
pub trait NameResolver: Send + Sync {
    fn plugin_code(&self, name: &NameRef) -> String;

    fn bridge_code(&self, name: &NameRef) -> String;
}

/// Strips the npm-style scope and the kind prefix, then camel-cases the rest
#[derive(Debug, Clone, Default)]
pub struct DefaultNameResolver;

impl DefaultNameResolver {
    fn normalize(name: &NameRef, prefix: &str) -> String {
        match name {
            NameRef::Code(code) => code.clone(),
            NameRef::Name(raw) => {
                let unscoped = match raw.strip_prefix('@') {
                    Some(scoped) => scoped.split_once('/').map_or(scoped, |(_, rest)| rest),
                    None => raw.as_str(),
                };
                let bare = unscoped.strip_prefix(prefix).unwrap_or(unscoped);
                kebab_to_camel(bare)
            }
        }
    }
}

impl NameResolver for DefaultNameResolver {
    fn plugin_code(&self, name: &NameRef) -> String {
        Self::normalize(name, "plugin-")
    }

    fn bridge_code(&self, name: &NameRef) -> String {
        Self::normalize(name, "bridge-")
    }
}

fn kebab_to_camel(name: &str) -> String {
    let mut code = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '-' || ch == '_' {
            upper = !code.is_empty();
            continue;
        }
        if upper {
            code.extend(ch.to_uppercase());
            upper = false;
        } else {
            code.push(ch);
        }
    }
    code
}
