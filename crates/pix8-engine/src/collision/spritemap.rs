//! Uniform-grid broad phase over the play area.
//!
//! Buckets are a sparse hash map of cell key to a small inline list of
//! sprite stubs. The grid is rebuilt (resized and cleared) once per frame
//! by `reset`; sprites enter cells lazily, as a side effect of their own
//! `get_overlapping_sprites` call. A sprite that has not been queried yet
//! this frame is therefore invisible to other sprites' queries; calling
//! order affects when a pair is first seen within the frame, never whether
//! a query sees the sprites already inserted.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

use crate::api::types::{SpriteId, SpriteLayer};
use crate::collision::hitbox::calculate_hitbox;
use crate::components::sprite::Sprite;
use crate::renderer::camera::Camera;
use crate::renderer::screen::Screen;

/// Cell size never drops below this, which keeps the coordinate-to-cell
/// division defined for any play area.
const MIN_CELL_SIZE: i32 = 8;

/// Palette index used by the debug overlay.
const GRID_DEBUG_COLOR: u8 = 5;

/// Pre-baked per-sprite stub stored in buckets, so the layer-mask merge
/// never has to resolve ids against sprite storage.
#[derive(Debug, Clone, Copy)]
struct CellEntry {
    id: SpriteId,
    layer: SpriteLayer,
}

/// Most cells hold a handful of sprites; keep them inline.
type Bucket = SmallVec<[CellEntry; 4]>;

/// Uniform spatial hash used to find overlap candidates.
///
/// Lifecycle per frame: `reset` with the frame's sprite set, then any
/// number of `get_overlapping_sprites` calls. Querying before the first
/// reset yields no candidates.
pub struct SpriteMap {
    cell_width: i32,
    cell_height: i32,
    row_count: i32,
    column_count: i32,
    buckets: HashMap<i32, Bucket>,
}

impl SpriteMap {
    pub fn new() -> SpriteMap {
        SpriteMap {
            cell_width: 0,
            cell_height: 0,
            row_count: 0,
            column_count: 0,
            buckets: HashMap::new(),
        }
    }

    pub fn cell_width(&self) -> i32 {
        self.cell_width
    }

    pub fn cell_height(&self) -> i32 {
        self.cell_height
    }

    pub fn column_count(&self) -> i32 {
        self.column_count
    }

    pub fn row_count(&self) -> i32 {
        self.row_count
    }

    /// Drop the previous frame's population and recompute cell sizing for
    /// the given sprite set and play area. Must run before any query of
    /// the new frame.
    pub fn reset(&mut self, sprites: &[Sprite], area_width: i32, area_height: i32) {
        self.buckets.clear();

        let mut max_width = 0;
        let mut max_height = 0;
        for sprite in sprites {
            max_width = max_width.max(sprite.width());
            max_height = max_height.max(sprite.height());
        }

        self.cell_width = cell_size(area_width, max_width);
        self.cell_height = cell_size(area_height, max_height);
        self.column_count = div_ceil(area_width, self.cell_width);
        self.row_count = div_ceil(area_height, self.cell_height);

        log::trace!(
            "sprite map reset: {}x{} cells of {}x{}px",
            self.column_count,
            self.row_count,
            self.cell_width,
            self.cell_height
        );
    }

    /// Sprites overlapping `id`, confirmed by hitbox.
    ///
    /// Broad phase: insert the querying sprite into every cell its display
    /// bounds span and collect the sprites already in those cells whose
    /// layer mask intersects its own. Narrow phase: lazily revalidate both
    /// hitboxes and keep only candidates whose boxes actually overlap.
    pub fn get_overlapping_sprites(&mut self, sprites: &mut [Sprite], id: SpriteId) -> Vec<SpriteId> {
        let Some(query_index) = sprites.iter().position(|s| s.id == id) else {
            return Vec::new();
        };

        let candidates = self.neighbors(&sprites[query_index]);
        if candidates.is_empty() {
            return candidates;
        }

        let query_bounds = {
            let hitbox = calculate_hitbox(&mut sprites[query_index]);
            hitbox.bounds(&sprites[query_index])
        };

        let mut overlapping = Vec::new();
        for candidate in candidates {
            let Some(index) = sprites.iter().position(|s| s.id == candidate) else {
                continue;
            };
            let hitbox = calculate_hitbox(&mut sprites[index]);
            if query_bounds.overlaps_with(&hitbox.bounds(&sprites[index])) {
                overlapping.push(candidate);
            }
        }
        overlapping
    }

    /// Broad-phase candidates for one sprite: walk the cells its bounds
    /// span, inserting the sprite and merging layer-compatible occupants.
    /// Deduplicated, the sprite itself excluded.
    fn neighbors(&mut self, sprite: &Sprite) -> Vec<SpriteId> {
        if self.cell_width <= 0 || self.cell_height <= 0 {
            return Vec::new();
        }

        let layer = sprite.layer;
        let left = sprite.left();
        let top = sprite.top();
        let width = sprite.width();
        let height = sprite.height();
        let xn = (width + self.cell_width - 1) / self.cell_width;
        let yn = (height + self.cell_height - 1) / self.cell_height;

        let mut neighbors = Vec::new();
        for x in 0..=xn {
            for y in 0..=yn {
                // sample points clamp to the sprite's own far edge
                let key = self.key(
                    left + (x * self.cell_width).min(width),
                    top + (y * self.cell_height).min(height),
                );
                self.insert_at(key, CellEntry { id: sprite.id, layer });
                self.merge_at(key, layer, sprite.id, &mut neighbors);
            }
        }
        neighbors
    }

    /// Bucket key for a world position. Indices clamp to the cell counts
    /// themselves (not count - 1): positions beyond the play area share a
    /// catch-all index past the nominal grid instead of aliasing into the
    /// edge cells.
    fn key(&self, x: i32, y: i32) -> i32 {
        let column = (x / self.cell_width).clamp(0, self.column_count);
        let row = (y / self.cell_height).clamp(0, self.row_count);
        column + row * self.column_count
    }

    fn insert_at(&mut self, key: i32, entry: CellEntry) {
        let bucket = self.buckets.entry(key).or_default();
        if !bucket.iter().any(|e| e.id == entry.id) {
            bucket.push(entry);
        }
    }

    fn merge_at(&self, key: i32, layer: SpriteLayer, exclude: SpriteId, neighbors: &mut Vec<SpriteId>) {
        if let Some(bucket) = self.buckets.get(&key) {
            for entry in bucket {
                if entry.id != exclude
                    && entry.layer.intersects(layer)
                    && !neighbors.contains(&entry.id)
                {
                    neighbors.push(entry.id);
                }
            }
        }
    }

    /// Outline every occupied cell of the nominal grid, offset by the
    /// camera's draw offset. Diagnostic only; collision results never
    /// depend on it.
    pub fn draw(&self, screen: &mut Screen, camera: &Camera) {
        for x in 0..self.column_count {
            for y in 0..self.row_count {
                let key = x + y * self.column_count;
                if self.buckets.get(&key).is_some_and(|b| !b.is_empty()) {
                    screen.draw_rect(
                        x * self.cell_width - camera.draw_offset_x,
                        y * self.cell_height - camera.draw_offset_y,
                        self.cell_width,
                        self.cell_height,
                        GRID_DEBUG_COLOR,
                    );
                }
            }
        }
    }
}

impl Default for SpriteMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpriteMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cells, {} occupied",
            self.column_count * self.row_count,
            self.buckets.len()
        )
    }
}

/// Target twice the largest sprite, bounded into `[8, area / 4]`.
fn cell_size(area: i32, max_dim: i32) -> i32 {
    (max_dim * 2)
        .max(MIN_CELL_SIZE)
        .min((area >> 2).max(MIN_CELL_SIZE))
}

fn div_ceil(a: i32, b: i32) -> i32 {
    (a + b - 1) / b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::image::PixelImage;
    use crate::core::fixed::Fx8;

    fn solid_sprite(id: u32, size: i32) -> Sprite {
        let mut image = PixelImage::new(size, size);
        for y in 0..size {
            for x in 0..size {
                image.set_pixel(x, y, 1);
            }
        }
        Sprite::new(SpriteId(id), image)
    }

    fn at(sprite: Sprite, x: i32, y: i32) -> Sprite {
        sprite.with_pos(Fx8::from_int(x), Fx8::from_int(y))
    }

    #[test]
    fn reset_sizes_cells_from_largest_sprite() {
        let sprites = vec![solid_sprite(1, 16), solid_sprite(2, 8)];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 256, 192);
        assert_eq!(map.cell_width(), 32);
        assert_eq!(map.cell_height(), 32);
        assert_eq!(map.column_count(), 8);
        assert_eq!(map.row_count(), 6);
    }

    #[test]
    fn reset_without_sprites_uses_minimum_cell() {
        let mut map = SpriteMap::new();
        map.reset(&[], 160, 120);
        assert_eq!(map.cell_width(), 8);
        assert_eq!(map.cell_height(), 8);
        assert_eq!(map.column_count(), 20);
        assert_eq!(map.row_count(), 15);
    }

    #[test]
    fn huge_sprite_is_capped_at_quarter_area() {
        let sprites = vec![solid_sprite(1, 100)];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 256, 192);
        assert_eq!(map.cell_width(), 64);
        assert_eq!(map.cell_height(), 48);
    }

    #[test]
    fn query_before_any_reset_is_empty() {
        let mut sprites = vec![solid_sprite(1, 8), at(solid_sprite(2, 8), 4, 4)];
        let mut map = SpriteMap::new();
        assert!(map.get_overlapping_sprites(&mut sprites, SpriteId(1)).is_empty());
    }

    #[test]
    fn first_query_after_reset_sees_no_candidates() {
        let mut sprites = vec![solid_sprite(1, 8), at(solid_sprite(2, 8), 4, 4)];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 160, 120);
        // populate, then reset again: the population must not survive
        map.get_overlapping_sprites(&mut sprites, SpriteId(1));
        map.get_overlapping_sprites(&mut sprites, SpriteId(2));
        map.reset(&sprites, 160, 120);
        assert!(map.get_overlapping_sprites(&mut sprites, SpriteId(2)).is_empty());
    }

    #[test]
    fn overlap_appears_once_both_sprites_have_queried() {
        let mut sprites = vec![solid_sprite(1, 8), at(solid_sprite(2, 8), 4, 4)];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 160, 120);
        // sprite 2 is not inserted yet, so sprite 1 sees nothing
        assert!(map.get_overlapping_sprites(&mut sprites, SpriteId(1)).is_empty());
        // sprite 1 is inserted now, so sprite 2 finds it
        assert_eq!(
            map.get_overlapping_sprites(&mut sprites, SpriteId(2)),
            vec![SpriteId(1)]
        );
        // and the reverse query now sees sprite 2
        assert_eq!(
            map.get_overlapping_sprites(&mut sprites, SpriteId(1)),
            vec![SpriteId(2)]
        );
    }

    #[test]
    fn edge_to_edge_sprites_are_rejected_by_narrow_phase() {
        // same 8px cell neighborhood, but boxes only touch edge-to-edge
        let mut sprites = vec![solid_sprite(1, 8), at(solid_sprite(2, 8), 8, 0)];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 160, 120);
        map.get_overlapping_sprites(&mut sprites, SpriteId(1));
        assert!(map.get_overlapping_sprites(&mut sprites, SpriteId(2)).is_empty());
    }

    #[test]
    fn disjoint_layers_are_never_candidates() {
        let mut sprites = vec![
            solid_sprite(1, 8).with_layer(SpriteLayer(0b01)),
            at(solid_sprite(2, 8), 4, 4).with_layer(SpriteLayer(0b10)),
        ];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 160, 120);
        map.get_overlapping_sprites(&mut sprites, SpriteId(1));
        assert!(map.get_overlapping_sprites(&mut sprites, SpriteId(2)).is_empty());
        assert!(map.get_overlapping_sprites(&mut sprites, SpriteId(1)).is_empty());
    }

    #[test]
    fn sprite_never_reports_itself() {
        let mut sprites = vec![solid_sprite(1, 8)];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 160, 120);
        map.get_overlapping_sprites(&mut sprites, SpriteId(1));
        assert!(map.get_overlapping_sprites(&mut sprites, SpriteId(1)).is_empty());
    }

    #[test]
    fn multi_cell_span_reports_each_neighbor_once() {
        // 32px sprites over 8px cells span several buckets each
        let mut sprites = vec![solid_sprite(1, 32), at(solid_sprite(2, 32), 8, 8)];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 64, 64);
        map.get_overlapping_sprites(&mut sprites, SpriteId(1));
        let found = map.get_overlapping_sprites(&mut sprites, SpriteId(2));
        assert_eq!(found, vec![SpriteId(1)]);
    }

    #[test]
    fn off_area_sprites_meet_in_the_catch_all_bucket() {
        let mut sprites = vec![
            at(solid_sprite(1, 8), 1000, 1000),
            at(solid_sprite(2, 8), 1004, 1004),
        ];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 160, 120);
        map.get_overlapping_sprites(&mut sprites, SpriteId(1));
        assert_eq!(
            map.get_overlapping_sprites(&mut sprites, SpriteId(2)),
            vec![SpriteId(1)]
        );
    }

    #[test]
    fn unknown_id_yields_empty_result() {
        let mut sprites = vec![solid_sprite(1, 8)];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 160, 120);
        assert!(map.get_overlapping_sprites(&mut sprites, SpriteId(99)).is_empty());
    }

    #[test]
    fn same_point_maps_to_same_key() {
        let mut map = SpriteMap::new();
        map.reset(&[], 160, 120);
        assert_eq!(map.key(3, 3), map.key(7, 7));
        assert_ne!(map.key(7, 7), map.key(8, 7));
        // everything past the area clamps to one catch-all column/row
        assert_eq!(map.key(1000, 0), map.key(5000, 0));
    }

    #[test]
    fn display_reports_occupancy() {
        let mut sprites = vec![solid_sprite(1, 8)];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 160, 120);
        map.get_overlapping_sprites(&mut sprites, SpriteId(1));
        let text = map.to_string();
        assert!(text.contains("300 cells"), "unexpected: {text}");
    }

    #[test]
    fn draw_outlines_occupied_cells() {
        let mut sprites = vec![solid_sprite(1, 8)];
        let mut map = SpriteMap::new();
        map.reset(&sprites, 64, 64);
        map.get_overlapping_sprites(&mut sprites, SpriteId(1));

        let mut screen = Screen::new(64, 64);
        let camera = Camera::new();
        map.draw(&mut screen, &camera);
        // the sprite occupies the cell at the origin; its outline corner is lit
        assert_eq!(screen.get_pixel(0, 0), GRID_DEBUG_COLOR);
        // far corner cell is unoccupied
        assert_eq!(screen.get_pixel(63, 63), 0);
    }
}
