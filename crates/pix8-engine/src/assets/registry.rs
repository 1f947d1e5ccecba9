//! Asset lookup by kind and name.
//!
//! The registry is an explicit strategy map: each asset kind owns an
//! ordered list of provider functions, and lookup returns the first
//! provider's hit. Providers are registered by the embedder (or built
//! from a manifest) and the registry is passed where it is needed;
//! nothing here is global.

use std::collections::HashMap;
use thiserror::Error;

use crate::assets::manifest::AssetManifest;
use crate::components::image::{ImageFormatError, PixelImage};
use crate::components::tilemap::TileMap;

/// Asset kinds used by the built-in providers.
pub const KIND_IMAGE: &str = "image";
pub const KIND_TILEMAP: &str = "tilemap";

/// A resolved asset.
#[derive(Debug, Clone)]
pub enum Asset {
    Image(PixelImage),
    TileMap(TileMap),
}

/// Provider callback: name in, asset out, `None` when this provider does
/// not know the name.
pub type AssetProvider = Box<dyn Fn(&str) -> Option<Asset>>;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("malformed image {name:?}: {source}")]
    Image {
        name: String,
        source: ImageFormatError,
    },
    #[error("malformed tilemap {name:?}: {source}")]
    TileMap {
        name: String,
        source: ImageFormatError,
    },
}

/// Kind-to-providers strategy map.
#[derive(Default)]
pub struct AssetRegistry {
    providers: HashMap<String, Vec<AssetProvider>>,
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field(
                "providers",
                &self
                    .providers
                    .iter()
                    .map(|(kind, providers)| (kind, providers.len()))
                    .collect::<HashMap<_, _>>(),
            )
            .finish()
    }
}

impl AssetRegistry {
    pub fn new() -> AssetRegistry {
        AssetRegistry {
            providers: HashMap::new(),
        }
    }

    /// Decode every asset in the manifest eagerly and register providers
    /// backed by the decoded tables. Decoding errors surface here rather
    /// than at lookup time.
    pub fn from_manifest(manifest: &AssetManifest) -> Result<AssetRegistry, AssetError> {
        let mut images = HashMap::with_capacity(manifest.images.len());
        for (name, descriptor) in &manifest.images {
            let image = descriptor.decode().map_err(|source| AssetError::Image {
                name: name.clone(),
                source,
            })?;
            images.insert(name.clone(), image);
        }

        let mut tilemaps = HashMap::with_capacity(manifest.tilemaps.len());
        for (name, descriptor) in &manifest.tilemaps {
            let map = descriptor.decode().map_err(|source| AssetError::TileMap {
                name: name.clone(),
                source,
            })?;
            tilemaps.insert(name.clone(), map);
        }

        let mut registry = AssetRegistry::new();
        registry.register(
            KIND_IMAGE,
            Box::new(move |name| images.get(name).cloned().map(Asset::Image)),
        );
        registry.register(
            KIND_TILEMAP,
            Box::new(move |name| tilemaps.get(name).cloned().map(Asset::TileMap)),
        );
        Ok(registry)
    }

    /// Append a provider for `kind`. Earlier registrations win on lookup.
    pub fn register(&mut self, kind: &str, provider: AssetProvider) {
        log::debug!("asset registry: provider added for kind {kind:?}");
        self.providers
            .entry(kind.to_string())
            .or_default()
            .push(provider);
    }

    /// First hit among `kind`'s providers, in registration order.
    pub fn get(&self, kind: &str, name: &str) -> Option<Asset> {
        self.providers
            .get(kind)?
            .iter()
            .find_map(|provider| provider(name))
    }

    /// Convenience lookup for `KIND_IMAGE`.
    pub fn image(&self, name: &str) -> Option<PixelImage> {
        match self.get(KIND_IMAGE, name) {
            Some(Asset::Image(image)) => Some(image),
            _ => None,
        }
    }

    /// Convenience lookup for `KIND_TILEMAP`.
    pub fn tile_map(&self, name: &str) -> Option<TileMap> {
        match self.get(KIND_TILEMAP, name) {
            Some(Asset::TileMap(map)) => Some(map),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_from_manifest() {
        let json = r#"{
            "images": {
                "hero": { "rows": ["1.", ".1"] }
            },
            "tilemaps": {
                "level1": { "tile_size": 8, "rows": ["11", "11"] }
            }
        }"#;
        let manifest = AssetManifest::from_json(json).unwrap();
        let registry = AssetRegistry::from_manifest(&manifest).unwrap();

        let hero = registry.image("hero").expect("hero should exist");
        assert_eq!(hero.get_pixel(0, 0), 1);
        assert_eq!(hero.get_pixel(1, 0), 0);

        let level = registry.tile_map("level1").expect("level1 should exist");
        assert_eq!(level.area_width(), 16);
    }

    #[test]
    fn unknown_name_or_kind_returns_none() {
        let registry = AssetRegistry::new();
        assert!(registry.get(KIND_IMAGE, "nope").is_none());
        assert!(registry.image("nope").is_none());
    }

    #[test]
    fn first_registered_provider_wins() {
        let mut registry = AssetRegistry::new();
        registry.register(
            KIND_IMAGE,
            Box::new(|name| (name == "a").then(|| Asset::Image(PixelImage::new(1, 1)))),
        );
        registry.register(
            KIND_IMAGE,
            Box::new(|_| Some(Asset::Image(PixelImage::new(9, 9)))),
        );

        let a = registry.image("a").unwrap();
        assert_eq!(a.width(), 1);
        // fallthrough reaches the second provider
        let other = registry.image("b").unwrap();
        assert_eq!(other.width(), 9);
    }

    #[test]
    fn bad_manifest_asset_fails_eagerly() {
        let json = r#"{
            "images": {
                "broken": { "rows": ["11", "1"] }
            }
        }"#;
        let manifest = AssetManifest::from_json(json).unwrap();
        let err = AssetRegistry::from_manifest(&manifest).unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }
}
