//! Per-frame quad batching.
//!
//! Every visible particle becomes one textured quad: four [`Vertex`] values
//! and six `u32` indices. Quads are grouped by (blend mode, texture) so that
//! each group is drawn with a single submission. Groups are registered once
//! from the [`SpriteSet`] in kind order and keep that order every frame.
//!
//! Buffers are cleared, not reallocated, between frames.

use bytemuck::{Pod, Zeroable};
use glam::{Affine2, Vec2};

use crate::compositor::DrawItem;
use crate::particle::ParticleKind;
use crate::textures::{Sprite, SpriteSet, TextureHandle};
use crate::visuals::BlendMode;

/// Quad corner offsets, in the order vertices are emitted.
const CORNERS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
];

/// Index pattern for one quad relative to its first vertex.
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// Default fade at or below which a particle is skipped.
pub const DEFAULT_DROP_THRESHOLD: f32 = 1.0 / 255.0;

/// Vertex layout shared with the quad shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Screen position in pixels.
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    /// Premultiplied RGBA.
    pub color: [f32; 4],
}

/// Identity of a draw group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub blend: BlendMode,
    pub texture: TextureHandle,
}

/// Geometry for one draw group.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub key: GroupKey,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Batch {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    fn push_quad(&mut self, corners: [Vertex; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        self.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }
}

/// The four vertices of a particle's quad.
pub fn quad_vertices(item: &DrawItem, sprite: &Sprite) -> [Vertex; 4] {
    let extent = Vec2::new(sprite.width, sprite.height);
    let transform = Affine2::from_translation(item.screen)
        * Affine2::from_scale(Vec2::splat(item.size))
        * Affine2::from_angle(item.angle)
        * Affine2::from_translation(-extent * 0.5);

    let a = item.fade;
    let color = [item.color.x * a, item.color.y * a, item.color.z * a, a];

    CORNERS.map(|corner| Vertex {
        position: transform.transform_point2(corner * extent).to_array(),
        tex_coords: corner.to_array(),
        color,
    })
}

/// Turns the ordered draw list into per-group vertex and index buffers.
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    sprites: SpriteSet,
    batches: Vec<Batch>,
    group_of: [usize; ParticleKind::COUNT],
    drop_threshold: f32,
}

impl BatchBuilder {
    pub fn new(sprites: SpriteSet) -> Self {
        let mut builder = Self {
            sprites,
            batches: Vec::new(),
            group_of: [0; ParticleKind::COUNT],
            drop_threshold: DEFAULT_DROP_THRESHOLD,
        };
        builder.register_groups();
        builder
    }

    pub fn with_drop_threshold(mut self, threshold: f32) -> Self {
        self.drop_threshold = threshold;
        self
    }

    /// Swap the sprite table, re-registering groups.
    pub fn set_sprites(&mut self, sprites: SpriteSet) {
        self.sprites = sprites;
        self.register_groups();
    }

    pub fn sprites(&self) -> &SpriteSet {
        &self.sprites
    }

    fn register_groups(&mut self) {
        self.batches.clear();
        for kind in ParticleKind::ALL {
            let key = GroupKey {
                blend: kind.params().blend,
                texture: self.sprites.get(kind).texture,
            };
            let index = match self.batches.iter().position(|b| b.key == key) {
                Some(index) => index,
                None => {
                    self.batches.push(Batch::new(key));
                    self.batches.len() - 1
                }
            };
            self.group_of[kind.index()] = index;
        }
    }

    /// Rebuild every group from `items`, preserving their order within a group.
    pub fn build(&mut self, items: &[DrawItem]) -> &[Batch] {
        for batch in &mut self.batches {
            batch.clear();
        }

        for item in items {
            if item.fade <= self.drop_threshold {
                continue;
            }
            let sprite = self.sprites.get(item.kind);
            let corners = quad_vertices(item, sprite);
            self.batches[self.group_of[item.kind.index()]].push_quad(corners);
        }

        &self.batches
    }

    /// All registered groups, including empty ones.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Groups with at least one quad, in registration order.
    pub fn non_empty(&self) -> impl Iterator<Item = &Batch> + '_ {
        self.batches.iter().filter(|b| !b.is_empty())
    }
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new(SpriteSet::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SlotId;
    use glam::Vec3;

    fn item(kind: ParticleKind, screen: Vec2, fade: f32) -> DrawItem {
        DrawItem {
            slot: SlotId::new(0),
            kind,
            screen,
            size: 1.0,
            angle: 0.0,
            depth: 0.0,
            fade,
            color: Vec3::ONE,
        }
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn test_unrotated_quad() {
        let sprite = Sprite::new(TextureHandle::new(0), 32.0, 32.0);
        let v = quad_vertices(&item(ParticleKind::Smoke, Vec2::new(100.0, 100.0), 1.0), &sprite);
        assert_eq!(v[0].position, [84.0, 84.0]);
        assert_eq!(v[1].position, [84.0, 116.0]);
        assert_eq!(v[2].position, [116.0, 84.0]);
        assert_eq!(v[3].position, [116.0, 116.0]);
        assert_eq!(v[0].tex_coords, [0.0, 0.0]);
        assert_eq!(v[3].tex_coords, [1.0, 1.0]);
    }

    #[test]
    fn test_rotation_and_scale_about_center() {
        let sprite = Sprite::new(TextureHandle::new(0), 10.0, 10.0);
        let mut it = item(ParticleKind::Smoke, Vec2::new(50.0, 50.0), 1.0);
        it.size = 2.0;
        it.angle = std::f32::consts::FRAC_PI_2;
        let v = quad_vertices(&it, &sprite);
        // Corner (0,0) sits at (-5,-5) from center; rotated 90 degrees and doubled.
        assert!(Vec2::from(v[0].position).abs_diff_eq(Vec2::new(60.0, 40.0), 1e-4));
        let center: Vec2 = v.iter().map(|x| Vec2::from(x.position)).sum::<Vec2>() / 4.0;
        assert!(center.abs_diff_eq(Vec2::new(50.0, 50.0), 1e-4));
    }

    #[test]
    fn test_premultiplied_color() {
        let sprite = Sprite::new(TextureHandle::new(0), 1.0, 1.0);
        let mut it = item(ParticleKind::Smoke, Vec2::ZERO, 0.5);
        it.color = Vec3::new(1.0, 0.5, 0.0);
        let v = quad_vertices(&it, &sprite);
        assert_eq!(v[0].color, [0.5, 0.25, 0.0, 0.5]);
    }

    #[test]
    fn test_index_pattern() {
        let mut builder = BatchBuilder::default();
        let items = [
            item(ParticleKind::Smoke, Vec2::ZERO, 1.0),
            item(ParticleKind::Smoke, Vec2::ONE, 1.0),
        ];
        builder.build(&items);
        let batch = builder.non_empty().next().unwrap();
        assert_eq!(batch.indices, vec![0, 1, 2, 1, 3, 2, 4, 5, 6, 5, 7, 6]);
        assert_eq!(batch.quad_count(), 2);
    }

    #[test]
    fn test_groups_by_blend_mode() {
        let mut builder = BatchBuilder::default();
        let items = [
            item(ParticleKind::Fire, Vec2::ZERO, 1.0),
            item(ParticleKind::Smoke, Vec2::ZERO, 1.0),
            item(ParticleKind::Ember, Vec2::ZERO, 1.0),
        ];
        builder.build(&items);
        let groups: Vec<_> = builder.non_empty().collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key.blend, BlendMode::Alpha);
        assert_eq!(groups[0].quad_count(), 1);
        assert_eq!(groups[1].key.blend, BlendMode::Additive);
        assert_eq!(groups[1].quad_count(), 2);
    }

    #[test]
    fn test_separate_textures_split_groups() {
        let sprites = SpriteSet::default().with(
            ParticleKind::Ember,
            Sprite::new(TextureHandle::new(7), 8.0, 8.0),
        );
        let mut builder = BatchBuilder::new(sprites);
        builder.build(&[
            item(ParticleKind::Fire, Vec2::ZERO, 1.0),
            item(ParticleKind::Ember, Vec2::ZERO, 1.0),
        ]);
        assert_eq!(builder.non_empty().count(), 2);
    }

    #[test]
    fn test_faded_items_are_dropped() {
        let mut builder = BatchBuilder::default().with_drop_threshold(0.1);
        builder.build(&[
            item(ParticleKind::Smoke, Vec2::ZERO, 0.1),
            item(ParticleKind::Smoke, Vec2::ZERO, 0.0),
        ]);
        assert_eq!(builder.non_empty().count(), 0);
    }

    #[test]
    fn test_rebuild_clears_previous_frame() {
        let mut builder = BatchBuilder::default();
        builder.build(&[item(ParticleKind::Smoke, Vec2::ZERO, 1.0)]);
        builder.build(&[]);
        assert!(builder.batches().iter().all(Batch::is_empty));
    }
}
