//! Visual configuration for particle rendering.
//!
//! These types decide how a particle looks once it has been simulated and
//! projected: how it blends with what is already on screen, how its opacity
//! evolves over its life, and where its tint comes from.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;

/// How particles blend with the framebuffer.
///
/// Vertex colours are premultiplied by the fade multiplier, so every mode
/// operates on premultiplied colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Standard alpha blending. Good for smoke and soft particles.
    #[default]
    Alpha,
    /// Additive blending. Colors add together, creating glow effects.
    /// Great for fire, sparks, energy effects.
    Additive,
    /// Multiply blending. Darkens underlying colors.
    Multiply,
}

impl BlendMode {
    /// Every blend mode, in the order pipelines are created.
    pub const ALL: [BlendMode; 3] = [BlendMode::Alpha, BlendMode::Additive, BlendMode::Multiply];

    /// Position of this mode in [`BlendMode::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            BlendMode::Alpha => 0,
            BlendMode::Additive => 1,
            BlendMode::Multiply => 2,
        }
    }
}

/// Opacity as a function of normalized age (`age / lifespan`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LifeEnvelope {
    /// Full opacity for the whole life.
    Constant,
    /// Linear fade in over the first `fade_in` fraction of life and linear
    /// fade out over the last `fade_out` fraction.
    InOut { fade_in: f32, fade_out: f32 },
    /// `1 - rate^exponent`: bright at birth, falling off towards death.
    Power(f32),
}

impl LifeEnvelope {
    /// Opacity in `[0, 1]` at the given normalized age.
    pub fn alpha(&self, rate: f32) -> f32 {
        let rate = rate.clamp(0.0, 1.0);
        let alpha = match *self {
            LifeEnvelope::Constant => 1.0,
            LifeEnvelope::InOut { fade_in, fade_out } => {
                if fade_in > 0.0 && rate < fade_in {
                    rate / fade_in
                } else if fade_out > 0.0 && rate > 1.0 - fade_out {
                    (1.0 - rate) / fade_out
                } else {
                    1.0
                }
            }
            LifeEnvelope::Power(exponent) => 1.0 - rate.powf(exponent),
        };
        alpha.clamp(0.0, 1.0)
    }
}

/// Where a particle's tint comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMode {
    /// The colour rolled at spawn time.
    Base,
    /// Linear blend from `start` at birth to `end` at death.
    LifeGradient { start: Vec3, end: Vec3 },
    /// Blend from `far` to `near` by how close the particle is to the
    /// viewer, with a slow sinusoidal `shimmer` that sweeps the ramp over time.
    DepthGradient { near: Vec3, far: Vec3, shimmer: f32 },
}

impl ColorMode {
    /// Resolve the tint for one particle.
    ///
    /// `nearness` is 1 at the near end of the depth range and 0 at the far end;
    /// `time` is in seconds.
    pub fn tint(&self, base: Vec3, rate: f32, nearness: f32, time: f32) -> Vec3 {
        match *self {
            ColorMode::Base => base,
            ColorMode::LifeGradient { start, end } => start.lerp(end, rate.clamp(0.0, 1.0)),
            ColorMode::DepthGradient { near, far, shimmer } => {
                let t = (nearness + shimmer * (time * 0.8).sin()).clamp(0.0, 1.0);
                let eased = (t * FRAC_PI_2).sin();
                far.lerp(near, eased)
            }
        }
    }
}
