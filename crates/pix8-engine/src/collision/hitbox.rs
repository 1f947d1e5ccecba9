//! Per-sprite cached collision box.
//!
//! A `Hitbox` is the tight axis-aligned box around a sprite's opaque
//! pixels, scaled and stored in fixed point relative to the sprite's
//! floored position. It is rebuilt only when the sprite's dimension hash
//! changes; `calculate_hitbox` is the only path that builds one.

use crate::api::types::SpriteId;
use crate::components::sprite::Sprite;
use crate::core::fixed::Fx8;

/// Cached collision geometry for one sprite.
///
/// The parent reference is an id, never a pointer: validity is re-derived
/// from the parent's current state on every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hitbox {
    hash: Fx8,
    parent: SpriteId,
    /// Offset of the box from the sprite's floored position.
    pub ox: Fx8,
    pub oy: Fx8,
    pub width: Fx8,
    pub height: Fx8,
}

impl Hitbox {
    /// Snapshot the parent's dimension hash and store the supplied
    /// geometry as-is.
    pub fn new(parent: &Sprite, width: Fx8, height: Fx8, ox: Fx8, oy: Fx8) -> Hitbox {
        Hitbox {
            hash: parent.dimension_hash(),
            parent: parent.id,
            ox,
            oy,
            width,
            height,
        }
    }

    pub fn parent(&self) -> SpriteId {
        self.parent
    }

    /// The cached geometry is usable iff the snapshot still matches the
    /// parent's current dimension hash.
    pub fn is_valid(&self, parent: &Sprite) -> bool {
        debug_assert_eq!(parent.id, self.parent);
        self.hash == parent.dimension_hash()
    }

    /// Resolve world-space bounds against the parent's current position.
    pub fn bounds(&self, parent: &Sprite) -> Aabb {
        debug_assert_eq!(parent.id, self.parent);
        let left = self.ox + parent.x.floor();
        let top = self.oy + parent.y.floor();
        Aabb {
            left,
            top,
            right: left + self.width - Fx8::ONE,
            bottom: top + self.height - Fx8::ONE,
        }
    }
}

/// World-space box with inclusive pixel extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aabb {
    pub left: Fx8,
    pub top: Fx8,
    pub right: Fx8,
    pub bottom: Fx8,
}

impl Aabb {
    /// Inclusive bounds test.
    pub fn contains(&self, x: Fx8, y: Fx8) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// Corner-sampling overlap test: true iff any of the eight corners of
    /// the two boxes lies inside the other box.
    ///
    /// Not equivalent to interval overlap: a cross configuration where the
    /// boxes intersect without either contributing a corner is reported as
    /// non-overlapping (pinned by a test below). Kept for compatibility
    /// with the engine's established collision behavior.
    pub fn overlaps_with(&self, other: &Aabb) -> bool {
        if self.contains(other.left, other.top) {
            return true;
        }
        if self.contains(other.left, other.bottom) {
            return true;
        }
        if self.contains(other.right, other.top) {
            return true;
        }
        if self.contains(other.right, other.bottom) {
            return true;
        }
        if other.contains(self.left, self.top) {
            return true;
        }
        if other.contains(self.left, self.bottom) {
            return true;
        }
        if other.contains(self.right, self.top) {
            return true;
        }
        if other.contains(self.right, self.bottom) {
            return true;
        }
        false
    }
}

/// Return the sprite's hitbox, rescanning its artwork only when stale.
///
/// On a cache miss this walks every pixel of the source image to find the
/// opaque extent, scales it by the sprite's scale factors, installs the
/// new box on the sprite, and returns it. O(pixels) on a miss and O(1) on
/// a hit, so callers may invoke this every frame.
pub fn calculate_hitbox(sprite: &mut Sprite) -> Hitbox {
    if let Some(hitbox) = sprite.cached_hitbox() {
        if hitbox.is_valid(sprite) {
            return *hitbox;
        }
    }

    let image = sprite.image();
    let mut min_x = Fx8::from_int(image.width());
    let mut min_y = Fx8::from_int(image.height());
    let mut max_x = Fx8::ZERO;
    let mut max_y = Fx8::ZERO;

    for c in 0..image.width() {
        let fxc = Fx8::from_int(c);
        for r in 0..image.height() {
            if image.get_pixel(c, r) != 0 {
                let fxr = Fx8::from_int(r);
                min_x = min_x.min(fxc);
                min_y = min_y.min(fxr);
                max_x = max_x.max(fxc);
                max_y = max_y.max(fxr);
            }
        }
    }

    // No opaque pixels (or an empty image): collapse to a single unit at
    // the origin instead of a negative extent.
    if min_x > max_x || min_y > max_y {
        min_x = Fx8::ZERO;
        min_y = Fx8::ZERO;
        max_x = Fx8::ZERO;
        max_y = Fx8::ZERO;
    }

    min_x = min_x * sprite.sx;
    min_y = min_y * sprite.sy;
    max_x = max_x * sprite.sx;
    max_y = max_y * sprite.sy;

    // A single surviving column/row still spans one scaled unit.
    let width = max_x - min_x + sprite.sx;
    let height = max_y - min_y + sprite.sy;

    let hitbox = Hitbox::new(sprite, width, height, min_x.floor(), min_y.floor());
    sprite.install_hitbox(hitbox);
    hitbox
}
