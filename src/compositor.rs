//! Depth ordering and fade computation.
//!
//! The compositor projects every active particle, drops the ones the
//! projector rejects, and stable-sorts the rest back to front so that later
//! draws cover earlier ones. For each survivor it resolves the final tint
//! and a fade multiplier:
//!
//! ```text
//! strength = depth_factor(depth) * brightness * alpha
//! fade = envelope(age / lifespan) * max(strength, floor)
//! depth_factor = clamp(1 - (depth - near) / (far - near), floor, 1)
//! ```
//!
//! The floor covers everything except the life envelope.

use glam::{Vec2, Vec3};

use crate::camera::Projector;
use crate::particle::ParticleKind;
use crate::pool::{ParticlePool, SlotId};

/// Depth range used for fading and depth tinting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeConfig {
    /// Depth at which particles are fully bright.
    pub near: f32,
    /// Depth at which the depth factor reaches `floor`.
    pub far: f32,
    /// Lowest value the depth factor can take.
    pub floor: f32,
}

impl FadeConfig {
    /// Depth range suited to the perspective camera at its default distance.
    pub const fn perspective() -> Self {
        Self {
            near: 200.0,
            far: 1400.0,
            floor: 0.25,
        }
    }

    /// Depth range suited to the synthetic depth of flat shows.
    pub const fn flat() -> Self {
        Self {
            near: -2.0,
            far: 2.0,
            floor: 0.2,
        }
    }

    /// 1 at `near`, 0 at `far`, clamped in between.
    #[inline]
    pub fn nearness(&self, depth: f32) -> f32 {
        let span = self.far - self.near;
        if span <= 0.0 {
            return 1.0;
        }
        (1.0 - (depth - self.near) / span).clamp(0.0, 1.0)
    }

    /// Depth component of the fade, never below `floor`.
    #[inline]
    pub fn depth_factor(&self, depth: f32) -> f32 {
        let span = self.far - self.near;
        let raw = if span <= 0.0 {
            1.0
        } else {
            1.0 - (depth - self.near) / span
        };
        raw.max(self.floor).min(1.0)
    }
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self::perspective()
    }
}

/// One visible particle, ready for the batch builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub slot: SlotId,
    pub kind: ParticleKind,
    pub screen: Vec2,
    /// Sprite size multiplier.
    pub size: f32,
    pub angle: f32,
    pub depth: f32,
    /// Opacity multiplier in `[0, 1]`.
    pub fade: f32,
    /// Straight RGB.
    pub color: Vec3,
}

/// Builds the back-to-front draw list each frame, reusing its storage.
#[derive(Debug, Clone, Default)]
pub struct DepthCompositor {
    pub config: FadeConfig,
    items: Vec<DrawItem>,
}

impl DepthCompositor {
    pub fn new(config: FadeConfig) -> Self {
        Self {
            config,
            items: Vec::new(),
        }
    }

    /// Project, tint and order every active particle.
    ///
    /// `time` is in seconds and drives the depth-tint shimmer.
    pub fn compose(
        &mut self,
        pool: &ParticlePool,
        projector: &Projector,
        time: f32,
    ) -> &[DrawItem] {
        self.items.clear();

        for (slot, p) in pool.iter_active() {
            let Some(projected) = projector.project(p.position) else {
                continue;
            };
            let params = p.kind.params();
            let rate = p.life_rate();

            let strength =
                self.config.depth_factor(projected.depth) * params.brightness * p.color.w;
            let fade = params.envelope.alpha(rate) * strength.max(self.config.floor);
            let color = params.color.tint(
                p.color.truncate(),
                rate,
                self.config.nearness(projected.depth),
                time,
            );

            self.items.push(DrawItem {
                slot,
                kind: p.kind,
                screen: projected.screen,
                size: p.base_scale * params.growth_at(rate) * projected.scale,
                angle: p.angle,
                depth: projected.depth,
                fade: fade.clamp(0.0, 1.0),
                color,
            });
        }

        // Stable: equal depths keep slot order.
        self.items.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        &self.items
    }

    /// The list produced by the last [`compose`](Self::compose).
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }
}
