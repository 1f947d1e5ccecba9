//! Scene wiring: sprite storage plus the frame-synchronous collision
//! lifecycle (grid reset, then queries) and camera/clock bookkeeping.
//!
//! Everything here runs on one logical thread per frame, in the fixed
//! order `update` / `begin_collision_phase` / queries. The grid is an
//! owned field passed through explicitly, never shared global state.

use crate::api::types::SpriteId;
use crate::collision::spritemap::SpriteMap;
use crate::components::sprite::Sprite;
use crate::components::tilemap::TileMap;
use crate::renderer::camera::Camera;
use crate::renderer::screen::Screen;

/// Simple sprite storage using a flat Vec.
/// Designed for small-to-medium sprite counts (hundreds, not millions).
pub struct Scene {
    sprites: Vec<Sprite>,
    pub camera: Camera,
    sprite_map: SpriteMap,
    tile_map: Option<TileMap>,
    screen: Screen,
    clock_ms: u32,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Scene {
        Scene::with_screen(Screen::default())
    }

    pub fn with_screen(screen: Screen) -> Scene {
        Scene {
            sprites: Vec::with_capacity(64),
            camera: Camera::new(),
            sprite_map: SpriteMap::new(),
            tile_map: None,
            screen,
            clock_ms: 0,
            next_id: 1,
        }
    }

    /// Generate the next unique sprite ID.
    pub fn next_id(&mut self) -> SpriteId {
        let id = SpriteId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a sprite to the scene.
    pub fn spawn(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    /// Remove a sprite by ID. Returns the removed sprite if found.
    ///
    /// Do not despawn between `begin_collision_phase` and the end of that
    /// frame's queries; the grid would keep referring to the removed id
    /// (queries skip it, but its overlaps go undetected for the frame).
    pub fn despawn(&mut self, id: SpriteId) -> Option<Sprite> {
        if let Some(index) = self.sprites.iter().position(|s| s.id == id) {
            Some(self.sprites.swap_remove(index))
        } else {
            None
        }
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn set_tile_map(&mut self, tile_map: Option<TileMap>) {
        self.tile_map = tile_map;
    }

    pub fn tile_map(&self) -> Option<&TileMap> {
        self.tile_map.as_ref()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn sprite_map(&self) -> &SpriteMap {
        &self.sprite_map
    }

    pub fn now_ms(&self) -> u32 {
        self.clock_ms
    }

    /// Play area in pixels: the tilemap's dimensions when one is set, the
    /// screen's otherwise.
    pub fn play_area(&self) -> (i32, i32) {
        match &self.tile_map {
            Some(tile_map) => (tile_map.area_width(), tile_map.area_height()),
            None => (self.screen.width(), self.screen.height()),
        }
    }

    /// Resize and clear the collision grid for a new frame. Must run
    /// before any `overlapping_sprites` call of that frame.
    pub fn begin_collision_phase(&mut self) {
        let (area_width, area_height) = self.play_area();
        self.sprite_map.reset(&self.sprites, area_width, area_height);
    }

    /// Sprites overlapping `id`, confirmed by hitbox. Inserts the queried
    /// sprite into the grid as a side effect, so the result reflects only
    /// sprites that have themselves been queried this frame.
    pub fn overlapping_sprites(&mut self, id: SpriteId) -> Vec<SpriteId> {
        self.sprite_map.get_overlapping_sprites(&mut self.sprites, id)
    }

    /// Overlay the occupied collision cells onto the screen.
    pub fn draw_sprite_map(&mut self) {
        self.sprite_map.draw(&mut self.screen, &self.camera);
    }

    /// Advance the frame clock and the camera.
    pub fn update(&mut self, dt_ms: u32) {
        self.clock_ms = self.clock_ms.wrapping_add(dt_ms);
        let focus = self.camera.follow().and_then(|id| {
            self.sprites
                .iter()
                .find(|s| s.id == id)
                .map(|s| (s.left() + s.width() / 2, s.top() + s.height() / 2))
        });
        let (area_width, area_height) = self.play_area();
        let (screen_width, screen_height) = (self.screen.width(), self.screen.height());
        self.camera.update(
            self.clock_ms,
            focus,
            screen_width,
            screen_height,
            area_width,
            area_height,
        );
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
