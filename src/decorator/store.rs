//! Texture store
//!
//! Holds the configured texture tree and answers per-bean lookups. The tree
//! sits behind an `ArcSwap`, so a reload never blocks readers; beans resolve
//! their texture once, when their constructor is wrapped.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use super::texture::Texture;
use crate::config::YamlConfig;
use crate::errors::{DecoratorError, DecoratorResult};
use crate::plugin::metadata::GadgetType;

/// `gadgetType -> gadgetName -> texture`
pub type GadgetTextures = BTreeMap<GadgetType, BTreeMap<String, Texture>>;

/// `pluginCode -> dialectName -> texture`
pub type DialectTextures = BTreeMap<String, BTreeMap<String, Texture>>;

/// The `textures:` configuration section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureTree {
    /// `plugins.<pluginCode>.<gadgetType>.<gadgetName>`
    pub plugins: BTreeMap<String, GadgetTextures>,
    /// `bridges.<bridgeCode>.<pluginCode>.<dialectName>`
    pub bridges: BTreeMap<String, DialectTextures>,
}

impl TextureTree {
    pub fn gadget(&self, plugin_code: &str, gadget_type: GadgetType, gadget_name: &str) -> Option<&Texture> {
        self.plugins.get(plugin_code)?.get(&gadget_type)?.get(gadget_name)
    }

    pub fn dialect(&self, bridge_code: &str, plugin_code: &str, dialect_name: &str) -> Option<&Texture> {
        self.bridges.get(bridge_code)?.get(plugin_code)?.get(dialect_name)
    }

    pub fn insert_gadget(
        &mut self,
        plugin_code: impl Into<String>,
        gadget_type: GadgetType,
        gadget_name: impl Into<String>,
        texture: Texture,
    ) {
        self.plugins
            .entry(plugin_code.into())
            .or_default()
            .entry(gadget_type)
            .or_default()
            .insert(gadget_name.into(), texture);
    }

    pub fn insert_dialect(
        &mut self,
        bridge_code: impl Into<String>,
        plugin_code: impl Into<String>,
        dialect_name: impl Into<String>,
        texture: Texture,
    ) {
        self.bridges
            .entry(bridge_code.into())
            .or_default()
            .entry(plugin_code.into())
            .or_default()
            .insert(dialect_name.into(), texture);
    }

    /// Number of bean textures in the tree
    pub fn len(&self) -> usize {
        let gadgets: usize = self
            .plugins
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum();
        let dialects: usize = self
            .bridges
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum();
        gadgets + dialects
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source of bean textures
pub trait TextureStore: Send + Sync {
    fn gadget_texture(&self, plugin_code: &str, gadget_type: GadgetType, gadget_name: &str) -> Option<Texture>;

    fn dialect_texture(&self, bridge_code: &str, plugin_code: &str, dialect_name: &str) -> Option<Texture>;
}

/// In-memory store, optionally loaded from the YAML `textures:` section
#[derive(Debug, Default)]
pub struct StaticTextureStore {
    tree: ArcSwap<TextureTree>,
}

impl StaticTextureStore {
    pub fn new(tree: TextureTree) -> Self {
        Self {
            tree: ArcSwap::from_pointee(tree),
        }
    }

    /// Load the `textures:` section of a YAML config file
    pub fn from_yaml_file(path: &PathBuf) -> DecoratorResult<Self> {
        Ok(Self::new(Self::read_tree(path)?))
    }

    /// Current snapshot of the tree
    pub fn snapshot(&self) -> Arc<TextureTree> {
        self.tree.load_full()
    }

    /// Swap in a new tree; beans already wrapped keep their texture
    pub fn replace(&self, tree: TextureTree) {
        tracing::info!(beans = tree.len(), "Texture tree replaced");
        self.tree.store(Arc::new(tree));
    }

    /// Re-read the YAML file; the current tree is kept on error
    pub fn reload(&self, path: &PathBuf) -> DecoratorResult<()> {
        let tree = Self::read_tree(path)?;
        self.replace(tree);
        Ok(())
    }

    pub fn set_gadget_texture(
        &self,
        plugin_code: &str,
        gadget_type: GadgetType,
        gadget_name: &str,
        texture: Texture,
    ) {
        self.tree.rcu(|current| {
            let mut tree = TextureTree::clone(current);
            tree.insert_gadget(plugin_code, gadget_type, gadget_name, texture.clone());
            tree
        });
    }

    pub fn set_dialect_texture(
        &self,
        bridge_code: &str,
        plugin_code: &str,
        dialect_name: &str,
        texture: Texture,
    ) {
        self.tree.rcu(|current| {
            let mut tree = TextureTree::clone(current);
            tree.insert_dialect(bridge_code, plugin_code, dialect_name, texture.clone());
            tree
        });
    }

    fn read_tree(path: &PathBuf) -> DecoratorResult<TextureTree> {
        let yaml = YamlConfig::from_file(path).map_err(|e| DecoratorError::Texture(e.to_string()))?;
        Ok(yaml.textures.unwrap_or_default())
    }
}

impl TextureStore for StaticTextureStore {
    fn gadget_texture(&self, plugin_code: &str, gadget_type: GadgetType, gadget_name: &str) -> Option<Texture> {
        self.tree.load().gadget(plugin_code, gadget_type, gadget_name).cloned()
    }

    fn dialect_texture(&self, bridge_code: &str, plugin_code: &str, dialect_name: &str) -> Option<Texture> {
        self.tree.load().dialect(bridge_code, plugin_code, dialect_name).cloned()
    }
}
