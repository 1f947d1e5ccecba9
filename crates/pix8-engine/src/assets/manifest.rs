use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::components::image::{ImageFormatError, PixelImage};
use crate::components::tilemap::TileMap;

/// Asset manifest describing all named images and tilemaps for a game.
/// Loaded from a JSON file at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Named pixel-art images.
    #[serde(default)]
    pub images: HashMap<String, ImageDescriptor>,
    /// Named tilemaps.
    #[serde(default)]
    pub tilemaps: HashMap<String, TileMapDescriptor>,
}

/// Pixel-art text rows: `.` or `0` for transparent, hex digit for a
/// palette index. Every row must have the same length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub rows: Vec<String>,
}

/// Tile grid as text rows of hex tile indices, plus the pixel size of one
/// tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileMapDescriptor {
    /// Pixels per tile side.
    pub tile_size: i32,
    pub rows: Vec<String>,
}

impl AssetManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl ImageDescriptor {
    pub fn decode(&self) -> Result<PixelImage, ImageFormatError> {
        let rows: Vec<&str> = self.rows.iter().map(String::as_str).collect();
        PixelImage::from_rows(&rows)
    }
}

impl TileMapDescriptor {
    /// Decode into a tilemap; the rows share the pixel-art text format,
    /// with each digit read as a tile index.
    pub fn decode(&self) -> Result<TileMap, ImageFormatError> {
        let rows: Vec<&str> = self.rows.iter().map(String::as_str).collect();
        let grid = PixelImage::from_rows(&rows)?;
        let mut map = TileMap::new(grid.width(), grid.height(), self.tile_size);
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                map.set(x, y, grid.get_pixel(x, y));
            }
        }
        Ok(map)
    }
}
