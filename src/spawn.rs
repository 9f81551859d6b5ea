//! Random draws for particle initialization.
//!
//! Every spawn-time random value comes from a single seeded [`SpawnContext`]
//! owned by the simulation, so a run is reproducible from its seed and the
//! sequence of triggers it receives.

use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Seeded random source with helpers for common spawn patterns.
///
/// ```ignore
/// let mut ctx = SpawnContext::new(7);
/// let offset = ctx.random_in_sphere(220.0);
/// let life = ctx.random_uint(80, 240);
/// ```
#[derive(Debug, Clone)]
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a context whose draws are fully determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    // ========== Random primitives ==========

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Random f32 in `[-magnitude, magnitude)`.
    #[inline]
    pub fn random_signed(&mut self, magnitude: f32) -> f32 {
        self.random_range(-magnitude, magnitude)
    }

    /// Random u32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_uint(&mut self, min: u32, max: u32) -> u32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// `true` with the given probability.
    #[inline]
    pub fn chance(&mut self, probability: f32) -> bool {
        probability > 0.0 && self.random() < probability
    }

    // ========== Position helpers ==========

    /// Random point inside a sphere of given radius, centered at origin.
    ///
    /// Distribution is uniform throughout the volume.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        let theta = self.random_range(0.0, TAU);
        // cos(phi) is uniform on [-1, 1].
        let cos_phi = self.random_range(-1.0, 1.0);
        let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
        // Cube root for uniform volume distribution
        let r = radius * self.random().cbrt();

        Vec3::new(
            r * sin_phi * theta.cos(),
            r * sin_phi * theta.sin(),
            r * cos_phi,
        )
    }

    /// Random point inside an axis-aligned square of given half-size in the XY plane.
    pub fn random_in_square(&mut self, half_size: f32) -> Vec3 {
        Vec3::new(
            self.random_signed(half_size),
            self.random_signed(half_size),
            0.0,
        )
    }

    /// Random point inside a rectangle spanning `min..max`.
    pub fn random_in_rect(&mut self, min: Vec2, max: Vec2) -> Vec2 {
        Vec2::new(self.random_range(min.x, max.x), self.random_range(min.y, max.y))
    }

    // ========== Direction/velocity helpers ==========

    /// Unit vector in the XY plane at a random angle.
    pub fn random_direction_2d(&mut self) -> Vec2 {
        Vec2::from_angle(self.random_range(0.0, TAU))
    }
}

impl Default for SpawnContext {
    fn default() -> Self {
        Self::new(0)
    }
}
