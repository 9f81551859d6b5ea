//! Fixed-step particle integration.
//!
//! One call to [`integrate`] advances every active particle by one tick:
//!
//! 1. `position += velocity`
//! 2. kind forces: `velocity += drift`, deterministic wobble on `x`,
//!    then `velocity *= damping`
//! 3. `angle += angular_velocity`
//! 4. `age += 1`
//!
//! A particle whose age reaches its lifespan, or whose position leaves the
//! [`Bounds`], is released back to the pool on the same tick.

use glam::Vec3;

use crate::particle::Particle;
use crate::pool::{ParticlePool, SlotId};

/// Axis-aligned region particles must stay inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds that never cull.
    pub const fn unbounded() -> Self {
        Self {
            min: Vec3::NEG_INFINITY,
            max: Vec3::INFINITY,
        }
    }

    /// A `width` x `height` screen grown by per-side margins. Depth is unbounded.
    pub fn screen(width: f32, height: f32, side: f32, top: f32, bottom: f32) -> Self {
        Self {
            min: Vec3::new(-side, -top, f32::NEG_INFINITY),
            max: Vec3::new(width + side, height + bottom, f32::INFINITY),
        }
    }

    /// A cube of the given half-extent around the origin.
    pub fn cube(half_extent: f32) -> Self {
        Self {
            min: Vec3::splat(-half_extent),
            max: Vec3::splat(half_extent),
        }
    }

    /// Whether `p` lies inside the bounds (edges included).
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// What happened during one integration step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Particles that were active at the start of the tick.
    pub updated: usize,
    /// Released because `age` reached `lifespan`.
    pub expired: usize,
    /// Released because they left the bounds.
    pub escaped: usize,
    /// Particles created this tick by emitters and bursts.
    pub spawned: usize,
    /// Spawn requests dropped because the pool was full.
    pub dropped: usize,
}

impl TickStats {
    /// Particles released this tick for any reason.
    #[inline]
    pub fn released(&self) -> usize {
        self.expired + self.escaped
    }
}

/// Advance every active particle by one tick.
pub fn integrate(pool: &mut ParticlePool, bounds: &Bounds, tick: u64) -> TickStats {
    let mut stats = TickStats::default();

    pool.retain_active(|slot, p| {
        stats.updated += 1;
        step(p, slot, tick);
        if p.is_expired() {
            stats.expired += 1;
            false
        } else if !bounds.contains(p.position) {
            stats.escaped += 1;
            false
        } else {
            true
        }
    });

    stats
}

/// Apply one tick of motion to a single particle.
#[inline]
pub fn step(p: &mut Particle, slot: SlotId, tick: u64) {
    let params = p.kind.params();

    p.position += p.velocity;

    p.velocity += params.drift;
    if params.wobble > 0.0 {
        p.velocity.x += hash_signed(slot.raw(), tick) * params.wobble;
    }
    p.velocity *= params.damping;

    p.angle += p.angular_velocity;
    p.age = p.age.saturating_add(1);
}

/// Deterministic value in `[-1, 1]` derived from a slot and a tick.
pub fn hash_signed(slot: u32, tick: u64) -> f32 {
    let t = (tick as u32) ^ ((tick >> 32) as u32);
    let mut n = slot
        .wrapping_mul(374_761_393)
        .wrapping_add(t.wrapping_mul(668_265_263));
    n = (n ^ (n >> 13)).wrapping_mul(1_274_126_177);
    n ^= n >> 16;
    (n & 0xffff) as f32 / 32_767.5 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleKind;

    fn spawn(pool: &mut ParticlePool, particle: Particle) -> SlotId {
        pool.spawn(particle).unwrap()
    }

    #[test]
    fn test_step_order() {
        let mut p = Particle {
            velocity: Vec3::new(1.0, 2.0, 0.0),
            angular_velocity: 0.5,
            lifespan: 10,
            kind: ParticleKind::Smoke,
            active: true,
            ..Particle::default()
        };
        step(&mut p, SlotId::new(0), 0);
        // Position moves by the velocity from before the forces.
        assert_eq!(p.position, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(p.angle, 0.5);
        assert_eq!(p.age, 1);
    }

    #[test]
    fn test_drift_and_damping() {
        let mut p = Particle {
            velocity: Vec3::new(1.0, 0.0, 1.0),
            lifespan: 10,
            kind: ParticleKind::Fire,
            active: true,
            ..Particle::default()
        };
        step(&mut p, SlotId::new(0), 0);
        assert!((p.velocity.x - 0.998).abs() < 1e-6);
        assert!((p.velocity.y - (-0.015 * 0.999)).abs() < 1e-6);
        assert!((p.velocity.z - 0.994).abs() < 1e-6);
    }

    #[test]
    fn test_expires_on_exact_tick() {
        let mut pool = ParticlePool::new(1);
        let slot = spawn(
            &mut pool,
            Particle {
                age: 4,
                lifespan: 5,
                ..Particle::default()
            },
        );
        let stats = integrate(&mut pool, &Bounds::unbounded(), 0);
        assert_eq!(stats.expired, 1);
        assert!(pool.get(slot).is_none());
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_escapes_bounds() {
        let mut pool = ParticlePool::new(2);
        spawn(
            &mut pool,
            Particle {
                position: Vec3::new(9.5, 0.0, 0.0),
                velocity: Vec3::new(1.0, 0.0, 0.0),
                lifespan: 100,
                ..Particle::default()
            },
        );
        spawn(
            &mut pool,
            Particle {
                lifespan: 100,
                ..Particle::default()
            },
        );
        let stats = integrate(&mut pool, &Bounds::cube(10.0), 0);
        assert_eq!(stats.updated, 2);
        assert_eq!(stats.escaped, 1);
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_screen_bounds() {
        let b = Bounds::screen(640.0, 480.0, 100.0, 200.0, 200.0);
        assert!(b.contains(Vec3::new(-100.0, -200.0, 5.0)));
        assert!(b.contains(Vec3::new(740.0, 680.0, -5.0)));
        assert!(!b.contains(Vec3::new(-101.0, 0.0, 0.0)));
        assert!(!b.contains(Vec3::new(0.0, 681.0, 0.0)));
    }

    #[test]
    fn test_hash_is_deterministic_and_bounded() {
        for slot in 0..64 {
            for tick in [0u64, 1, 7, 1 << 40] {
                let v = hash_signed(slot, tick);
                assert_eq!(v, hash_signed(slot, tick));
                assert!((-1.0..=1.0).contains(&v));
            }
        }
        assert_ne!(hash_signed(1, 1), hash_signed(2, 1));
    }

    #[test]
    fn test_integration_is_deterministic() {
        let make = || {
            let mut pool = ParticlePool::new(8);
            for i in 0..8 {
                pool.spawn(Particle {
                    velocity: Vec3::new(i as f32 * 0.1, -0.5, 0.0),
                    lifespan: 50,
                    kind: ParticleKind::Ember,
                    ..Particle::default()
                })
                .unwrap();
            }
            pool
        };
        let mut a = make();
        let mut b = make();
        for tick in 0..30 {
            integrate(&mut a, &Bounds::unbounded(), tick);
            integrate(&mut b, &Bounds::unbounded(), tick);
        }
        let pa: Vec<_> = a.iter_active().map(|(_, p)| p.position).collect();
        let pb: Vec<_> = b.iter_active().map(|(_, p)| p.position).collect();
        assert_eq!(pa, pb);
    }
}
