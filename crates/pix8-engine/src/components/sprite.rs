use crate::api::types::{SpriteId, SpriteLayer};
use crate::collision::hitbox::Hitbox;
use crate::components::image::PixelImage;
use crate::core::fixed::Fx8;

/// Fat sprite struct: position, scale, collision layer, artwork, and the
/// lazily computed hitbox slot. One struct with public fields over ECS
/// purity, same as the rest of the engine.
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Unique identifier.
    pub id: SpriteId,
    /// Position of the top-left corner, in fixed point.
    pub x: Fx8,
    pub y: Fx8,
    /// Per-axis scale factors applied to the artwork.
    pub sx: Fx8,
    pub sy: Fx8,
    /// Collision layer mask; two sprites are candidates only when their
    /// masks share a bit.
    pub layer: SpriteLayer,
    image: PixelImage,
    hitbox: Option<Hitbox>,
}

impl Sprite {
    /// Create a sprite at the origin with unit scale on layer 1.
    pub fn new(id: SpriteId, image: PixelImage) -> Sprite {
        Sprite {
            id,
            x: Fx8::ZERO,
            y: Fx8::ZERO,
            sx: Fx8::ONE,
            sy: Fx8::ONE,
            layer: SpriteLayer(1),
            image,
            hitbox: None,
        }
    }

    // -- Builder pattern --

    pub fn with_pos(mut self, x: Fx8, y: Fx8) -> Sprite {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_scale(mut self, sx: Fx8, sy: Fx8) -> Sprite {
        self.sx = sx;
        self.sy = sy;
        self
    }

    pub fn with_layer(mut self, layer: SpriteLayer) -> Sprite {
        self.layer = layer;
        self
    }

    pub fn image(&self) -> &PixelImage {
        &self.image
    }

    /// Mutable access to the artwork. In-place pixel edits do not
    /// invalidate the cached hitbox; the dimension hash only covers size
    /// and scale.
    pub fn image_mut(&mut self) -> &mut PixelImage {
        &mut self.image
    }

    /// Replace the artwork. Drops the cached hitbox: a same-size frame
    /// swap keeps the dimension hash unchanged, so a stale box would
    /// otherwise survive revalidation.
    pub fn set_image(&mut self, image: PixelImage) {
        self.image = image;
        self.hitbox = None;
    }

    // -- Display bounds in whole pixels, used by the broad phase --

    pub fn left(&self) -> i32 {
        self.x.floor().to_int()
    }

    pub fn top(&self) -> i32 {
        self.y.floor().to_int()
    }

    /// Scaled artwork width in whole pixels.
    pub fn width(&self) -> i32 {
        (Fx8::from_int(self.image.width()) * self.sx).to_int()
    }

    /// Scaled artwork height in whole pixels.
    pub fn height(&self) -> i32 {
        (Fx8::from_int(self.image.height()) * self.sy).to_int()
    }

    /// Composite of artwork size and scale. A cached hitbox is stale once
    /// this no longer matches its snapshot.
    pub fn dimension_hash(&self) -> Fx8 {
        Fx8::from_int(self.image.width()) + Fx8::from_int(self.image.height()) + self.sx + self.sy
    }

    pub fn cached_hitbox(&self) -> Option<&Hitbox> {
        self.hitbox.as_ref()
    }

    pub(crate) fn install_hitbox(&mut self, hitbox: Hitbox) {
        self.hitbox = Some(hitbox);
    }
}
