pub mod hitbox;
pub mod spritemap;

// Re-export the collision surface for convenient access
pub use hitbox::{calculate_hitbox, Aabb, Hitbox};
pub use spritemap::SpriteMap;
