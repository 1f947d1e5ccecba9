pub mod image;
pub mod sprite;
pub mod tilemap;
