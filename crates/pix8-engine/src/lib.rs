pub mod api;
pub mod core;
pub mod components;
pub mod collision;
pub mod renderer;
pub mod assets;

// Re-export key types at crate root for convenience
pub use api::types::{SpriteId, SpriteLayer};
pub use collision::hitbox::{calculate_hitbox, Aabb, Hitbox};
pub use collision::spritemap::SpriteMap;
pub use components::image::{ImageFormatError, PixelImage};
pub use components::sprite::Sprite;
pub use components::tilemap::TileMap;
pub use core::fixed::Fx8;
pub use core::scene::Scene;
pub use renderer::camera::Camera;
pub use renderer::screen::Screen;
pub use assets::manifest::{AssetManifest, ImageDescriptor, TileMapDescriptor};
pub use assets::registry::{Asset, AssetError, AssetProvider, AssetRegistry};
