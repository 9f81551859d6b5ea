//! Particle records and the per-kind behaviour table.
//!
//! Kind-specific behaviour is data, not code: [`ParticleKind::params`]
//! returns a [`KindParams`] row that the integrator, compositor and batch
//! builder read from. Spawn-time randomization lives in [`Particle::spawn`].
//!
//! 2D shows use screen coordinates with `y` pointing down and keep `z` as a
//! small synthetic depth; the 3D cloud uses world units around the origin.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, TAU};

use glam::{Vec3, Vec4};

use crate::spawn::SpawnContext;
use crate::visuals::{BlendMode, ColorMode, LifeEnvelope};

/// The behavioural family a particle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParticleKind {
    /// Slow, long-lived grey puffs rising from a chimney.
    #[default]
    Smoke,
    /// Short-lived flames that lift and drag, tinted by depth.
    Fire,
    /// Tiny long-lived cinders drifting upward with lateral flutter.
    Ember,
    /// Explosion sparks that fall and lose depth velocity, blue far away and
    /// red up close.
    Spark,
    /// Orange firework flares pulled down by gravity.
    Flare,
    /// Soft motes of a 3D cloud, slowly spreading out.
    Mote,
    /// Pale blue puffs sprayed radially from a single point.
    Spray,
}

impl ParticleKind {
    /// Number of kinds.
    pub const COUNT: usize = 7;

    /// Every kind, in table order.
    pub const ALL: [ParticleKind; Self::COUNT] = [
        ParticleKind::Smoke,
        ParticleKind::Fire,
        ParticleKind::Ember,
        ParticleKind::Spark,
        ParticleKind::Flare,
        ParticleKind::Mote,
        ParticleKind::Spray,
    ];

    /// Position of this kind in [`ParticleKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            ParticleKind::Smoke => 0,
            ParticleKind::Fire => 1,
            ParticleKind::Ember => 2,
            ParticleKind::Spark => 3,
            ParticleKind::Flare => 4,
            ParticleKind::Mote => 5,
            ParticleKind::Spray => 6,
        }
    }

    /// Behaviour row for this kind.
    #[must_use]
    pub const fn params(self) -> KindParams {
        match self {
            ParticleKind::Smoke => KindParams {
                drift: Vec3::ZERO,
                damping: Vec3::ONE,
                wobble: 0.0,
                blend: BlendMode::Alpha,
                envelope: LifeEnvelope::InOut {
                    fade_in: 0.2,
                    fade_out: 0.2,
                },
                growth_start: 0.8,
                growth: 0.5,
                brightness: 1.0,
                color: ColorMode::Base,
            },
            ParticleKind::Fire => KindParams {
                drift: Vec3::new(0.0, -0.015, 0.0),
                damping: Vec3::new(0.998, 0.999, 0.994),
                wobble: 0.0,
                blend: BlendMode::Additive,
                envelope: LifeEnvelope::Power(1.4),
                growth_start: 1.0,
                growth: 0.8,
                brightness: 1.15,
                color: DEPTH_RAMP,
            },
            ParticleKind::Ember => KindParams {
                drift: Vec3::new(0.0, -0.01, 0.0),
                damping: Vec3::new(1.0, 1.0, 0.995),
                wobble: 0.02,
                blend: BlendMode::Additive,
                envelope: LifeEnvelope::Power(1.4),
                growth_start: 1.0,
                growth: 0.8,
                brightness: 0.7,
                color: DEPTH_RAMP,
            },
            ParticleKind::Spark => KindParams {
                drift: Vec3::new(0.0, 0.02, 0.0),
                damping: Vec3::new(1.0, 1.0, 0.98),
                wobble: 0.0,
                blend: BlendMode::Additive,
                envelope: LifeEnvelope::Power(1.5),
                growth_start: 1.0,
                growth: 0.5,
                brightness: 1.0,
                color: ColorMode::DepthGradient {
                    near: Vec3::new(1.0, 0.0, 0.0),
                    far: Vec3::new(0.0, 0.0, 1.0),
                    shimmer: 0.0,
                },
            },
            ParticleKind::Flare => KindParams {
                drift: Vec3::new(0.0, 0.05, 0.0),
                damping: Vec3::ONE,
                wobble: 0.0,
                blend: BlendMode::Additive,
                envelope: LifeEnvelope::Power(2.0),
                growth_start: 1.0,
                growth: 1.0,
                brightness: 1.0,
                color: ColorMode::Base,
            },
            ParticleKind::Mote => KindParams {
                drift: Vec3::ZERO,
                damping: Vec3::splat(0.995),
                wobble: 0.0,
                blend: BlendMode::Alpha,
                envelope: LifeEnvelope::Power(1.0),
                growth_start: 1.0,
                growth: 0.0,
                brightness: 1.0,
                color: ColorMode::Base,
            },
            ParticleKind::Spray => KindParams {
                drift: Vec3::new(0.0, 0.01, 0.0),
                damping: Vec3::ONE,
                wobble: 0.0,
                blend: BlendMode::Alpha,
                envelope: LifeEnvelope::Power(1.0),
                growth_start: 1.0,
                growth: 0.0,
                brightness: 1.0,
                color: ColorMode::Base,
            },
        }
    }
}

// Blue in the distance, red up close.
const DEPTH_RAMP: ColorMode = ColorMode::DepthGradient {
    near: Vec3::new(1.0, 0.05, 0.0),
    far: Vec3::new(0.0, 0.25, 1.0),
    shimmer: 0.15,
};

/// Per-kind constants shared by every particle of that kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindParams {
    /// Added to velocity every tick.
    pub drift: Vec3,
    /// Multiplies velocity every tick, per axis.
    pub damping: Vec3,
    /// Amplitude of the deterministic lateral flutter added to `velocity.x`.
    pub wobble: f32,
    pub blend: BlendMode,
    pub envelope: LifeEnvelope,
    /// Scale multiplier at birth.
    pub growth_start: f32,
    /// Extra scale gained linearly over the particle's life.
    pub growth: f32,
    /// Multiplies the fade; values above 1 saturate sooner.
    pub brightness: f32,
    pub color: ColorMode,
}

impl KindParams {
    /// Scale multiplier at normalized age `rate`.
    #[inline]
    pub fn growth_at(&self, rate: f32) -> f32 {
        self.growth_start + self.growth * rate.clamp(0.0, 1.0)
    }
}

/// A single pooled particle.
///
/// While `active`, `age < lifespan` holds. Fields of an inactive particle are
/// stale and are overwritten when the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Rotation in radians.
    pub angle: f32,
    /// Radians added to `angle` per tick.
    pub angular_velocity: f32,
    /// Ticks lived so far.
    pub age: u32,
    /// Ticks this particle lives for.
    pub lifespan: u32,
    pub base_scale: f32,
    /// Straight (non-premultiplied) RGBA.
    pub color: Vec4,
    pub kind: ParticleKind,
    pub active: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            age: 0,
            lifespan: 1,
            base_scale: 1.0,
            color: Vec4::ONE,
            kind: ParticleKind::default(),
            active: false,
        }
    }
}

impl Particle {
    /// Normalized age in `[0, 1]`.
    #[inline]
    pub fn life_rate(&self) -> f32 {
        if self.lifespan == 0 {
            1.0
        } else {
            (self.age as f32 / self.lifespan as f32).min(1.0)
        }
    }

    /// Whether the particle has used up its lifespan.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age >= self.lifespan
    }

    /// Roll a fresh, active particle of `kind` at `anchor + offset`.
    ///
    /// `offset` is the scatter offset chosen by the emitter; motes use its
    /// direction as their outward heading.
    pub fn spawn(kind: ParticleKind, anchor: Vec3, offset: Vec3, ctx: &mut SpawnContext) -> Self {
        let mut p = Particle {
            position: anchor + offset,
            angle: ctx.random_range(0.0, TAU),
            kind,
            active: true,
            ..Particle::default()
        };

        match kind {
            ParticleKind::Smoke => {
                let heading = ctx.random_signed(FRAC_PI_3) + FRAC_PI_2;
                let speed = ctx.random_range(0.1, 0.5);
                p.velocity = Vec3::new(heading.cos() * speed, heading.sin() * speed - 1.0, 0.0);
                p.angular_velocity = ctx.random_signed(0.03);
                p.lifespan = ctx.random_uint(240, 300);
                p.base_scale = ctx.random_range(0.3, 0.4);
                let grey = ctx.random_range(0.75, 1.0);
                p.color = Vec4::new(grey, grey, grey, 0.8);
            }
            ParticleKind::Fire => {
                p.position += jitter(ctx, 6.0, -1.0, 1.2);
                p.angular_velocity = ctx.random_signed(0.12);
                p.lifespan = ctx.random_uint(30, 80);
                p.base_scale = ctx.random_range(0.14, 0.36);
                let heading = ctx.random_range(0.0, TAU);
                let speed = ctx.random_range(1.2, 7.0);
                p.velocity = Vec3::new(
                    heading.cos() * speed * ctx.random_range(0.2, 0.8),
                    heading.sin() * speed * ctx.random_range(0.3, 1.2),
                    ctx.random_signed(0.6),
                );
            }
            ParticleKind::Ember => {
                p.position += jitter(ctx, 6.0, -1.0, 1.2);
                p.angular_velocity = ctx.random_signed(0.03);
                p.lifespan = ctx.random_uint(120, 320);
                p.base_scale = ctx.random_range(0.03, 0.078);
                p.velocity = Vec3::new(
                    ctx.random_signed(0.6),
                    -0.2 - ctx.random_range(0.0, 0.6),
                    ctx.random_signed(0.15),
                );
            }
            ParticleKind::Spark => {
                p.position += jitter(ctx, 2.0, -1.0, 1.0);
                p.angular_velocity = ctx.random_signed(0.1);
                p.lifespan = ctx.random_uint(40, 80);
                p.base_scale = ctx.random_range(0.2, 0.3);
                let heading = ctx.random_range(0.0, TAU);
                let speed = ctx.random_range(2.0, 6.0);
                p.velocity = Vec3::new(
                    heading.cos() * speed * 0.3,
                    heading.sin() * speed * 0.7,
                    ctx.random_signed(0.5),
                );
            }
            ParticleKind::Flare => {
                p.position += jitter(ctx, 2.0, 0.0, 0.0);
                p.angular_velocity = ctx.random_signed(0.05);
                p.lifespan = ctx.random_uint(45, 75);
                p.base_scale = ctx.random_range(0.15, 0.2);
                let heading = ctx.random_signed(FRAC_PI_4) + FRAC_PI_2;
                let speed = ctx.random_range(1.0, 2.5);
                p.velocity =
                    Vec3::new(heading.cos() * speed * 0.5, heading.sin() * speed * 2.0, 0.0);
                p.color = Vec4::new(1.0, 0.565, 0.0, 1.0);
            }
            ParticleKind::Mote => {
                p.angular_velocity = ctx.random_signed(0.05);
                p.lifespan = ctx.random_uint(80, 240);
                p.base_scale = ctx.random_range(0.12, 0.3);
                p.velocity = offset.normalize_or_zero() * ctx.random_range(0.1, 0.7) * 0.4;
                p.color = Vec4::new(
                    ctx.random_range(0.7, 0.94),
                    ctx.random_range(0.7, 0.94),
                    1.0,
                    1.0,
                );
            }
            ParticleKind::Spray => {
                let heading = ctx.random_range(0.0, TAU);
                let speed = ctx.random_range(0.5, 2.0);
                p.velocity = Vec3::new(heading.cos() * speed, heading.sin() * speed, 0.0);
                p.angular_velocity = 0.01;
                p.lifespan = ctx.random_uint(60, 180);
                p.base_scale = ctx.random_range(0.3, 0.5);
                let tint = |ctx: &mut SpawnContext| ctx.random_range(200.0, 255.0) / 255.0;
                p.color = Vec4::new(tint(ctx), tint(ctx), 1.0, 0.6);
            }
        }

        p
    }
}

/// Square jitter in XY plus a depth roll in `z_min..z_max`.
fn jitter(ctx: &mut SpawnContext, half: f32, z_min: f32, z_max: f32) -> Vec3 {
    Vec3::new(
        ctx.random_signed(half),
        ctx.random_signed(half),
        ctx.random_range(z_min, z_max),
    )
}
