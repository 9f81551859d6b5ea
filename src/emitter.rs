//! Emitters and bursts.
//!
//! An [`Emitter`] moves along its [`EmitterPath`] and, once per tick, decides
//! how many particles to request from the pool according to its
//! [`SpawnPolicy`]. A [`Burst`] is the event-driven counterpart: a large,
//! one-off spawn at a point.
//!
//! Running out of pool slots is never an error here. Spawning stops early and
//! the shortfall is reported in [`EmitReport::dropped`].
//!
//! ```ignore
//! let emitter = Emitter::new(ParticleKind::Fire, EmitterPath::orbit(center, 300.0, 0.0, 0.004))
//!     .with_policy(SpawnPolicy::Pulsed { base: 12, frequency: 1.5, cap: 250 })
//!     .with_scatter(Scatter::Square(20.0))
//!     .with_surprise(SurpriseBurst { chance: 0.003, min: 220, max: 700 });
//! ```

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::particle::{Particle, ParticleKind};
use crate::pool::ParticlePool;
use crate::spawn::SpawnContext;

/// Where an emitter sits and how it moves between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmitterPath {
    /// Stationary.
    Fixed(Vec3),
    /// Random lateral jitter of up to `jitter` plus a constant `drift` per tick.
    Wander {
        position: Vec3,
        jitter: f32,
        drift: Vec3,
    },
    /// Elliptical orbit around `center`; `phase` advances by `speed` per tick.
    Orbit {
        center: Vec3,
        radius: f32,
        phase: f32,
        speed: f32,
        offset_y: f32,
    },
}

impl EmitterPath {
    /// Orbit path with no vertical offset.
    pub fn orbit(center: Vec3, radius: f32, phase: f32, speed: f32) -> Self {
        EmitterPath::Orbit {
            center,
            radius,
            phase,
            speed,
            offset_y: 0.0,
        }
    }

    /// Current emitter position.
    pub fn position(&self) -> Vec3 {
        match *self {
            EmitterPath::Fixed(position) => position,
            EmitterPath::Wander { position, .. } => position,
            EmitterPath::Orbit {
                center,
                radius,
                phase,
                offset_y,
                ..
            } => {
                let angle = phase * TAU + phase * 1.1;
                center
                    + Vec3::new(
                        angle.cos() * radius,
                        (angle * 0.9).sin() * radius * 0.55 + offset_y,
                        0.0,
                    )
            }
        }
    }

    /// Orbit phase, or zero for paths without one.
    pub fn phase(&self) -> f32 {
        match *self {
            EmitterPath::Orbit { phase, .. } => phase,
            _ => 0.0,
        }
    }

    /// Move one tick along the path.
    pub fn advance(&mut self, rng: &mut SpawnContext) {
        match self {
            EmitterPath::Fixed(_) => {}
            EmitterPath::Wander {
                position,
                jitter,
                drift,
            } => {
                position.x += rng.random_signed(*jitter);
                *position += *drift;
            }
            EmitterPath::Orbit { phase, speed, .. } => {
                *phase += *speed;
            }
        }
    }
}

/// Offset applied to each spawned particle around the emitter position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Scatter {
    #[default]
    Point,
    /// Uniform in a square of the given half-size in the XY plane.
    Square(f32),
    /// Uniform in a sphere of the given radius.
    Sphere(f32),
}

impl Scatter {
    pub fn sample(&self, rng: &mut SpawnContext) -> Vec3 {
        match *self {
            Scatter::Point => Vec3::ZERO,
            Scatter::Square(half) => rng.random_in_square(half),
            Scatter::Sphere(radius) => rng.random_in_sphere(radius),
        }
    }
}

/// How many particles an emitter requests each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnPolicy {
    /// `count` particles every `every` ticks.
    FixedInterval { count: u32, every: u32 },
    /// `count` particles with the given probability each tick.
    Chance { count: u32, probability: f32 },
    /// `round(base * pulse(t))`, at most `cap`, where
    /// `pulse(t) = (sin(t * frequency + phase * 4) + 1) / 2` and `t` is in seconds.
    Pulsed { base: u32, frequency: f32, cap: u32 },
    /// `count` particles whenever fewer than `below` are active.
    Refill { below: usize, count: u32 },
}

impl SpawnPolicy {
    /// Pulse factor in `[0, 1]` for the pulsed policy.
    pub fn pulse(frequency: f32, time: f32, phase: f32) -> f32 {
        ((time * frequency + phase * 4.0).sin() + 1.0) * 0.5
    }
}

/// A rare, emitter-local burst rolled every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurpriseBurst {
    pub chance: f32,
    pub min: u32,
    pub max: u32,
}

/// Counts reported by a spawn step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    pub spawned: usize,
    pub dropped: usize,
}

impl std::ops::AddAssign for EmitReport {
    fn add_assign(&mut self, rhs: Self) {
        self.spawned += rhs.spawned;
        self.dropped += rhs.dropped;
    }
}

/// What to spawn when a burst fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub origin: Vec3,
    pub count: u32,
    pub kind: ParticleKind,
    /// Replace the kind's launch velocity with a radial blast of speed in
    /// `min..max`, keeping the rolled depth velocity.
    pub blast: Option<(f32, f32)>,
}

impl Burst {
    pub fn new(origin: Vec3, count: u32, kind: ParticleKind) -> Self {
        Self {
            origin,
            count,
            kind,
            blast: None,
        }
    }

    pub fn with_blast(mut self, min_speed: f32, max_speed: f32) -> Self {
        self.blast = Some((min_speed, max_speed));
        self
    }
}

/// Spawn a burst, stopping early if the pool fills up.
pub fn spawn_burst(burst: &Burst, pool: &mut ParticlePool, rng: &mut SpawnContext) -> EmitReport {
    let mut report = EmitReport::default();

    for _ in 0..burst.count {
        let mut particle = Particle::spawn(burst.kind, burst.origin, Vec3::ZERO, rng);
        if let Some((min, max)) = burst.blast {
            let dir: Vec2 = rng.random_direction_2d();
            let speed = rng.random_range(min, max);
            particle.velocity = (dir * speed).extend(particle.velocity.z);
        }
        if pool.spawn(particle).is_err() {
            report.dropped = burst.count as usize - report.spawned;
            debug!(
                requested = burst.count,
                spawned = report.spawned,
                "pool exhausted, burst truncated"
            );
            break;
        }
        report.spawned += 1;
    }

    report
}

/// A moving source of particles of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    pub kind: ParticleKind,
    pub path: EmitterPath,
    pub policy: SpawnPolicy,
    pub scatter: Scatter,
    pub surprise: Option<SurpriseBurst>,
    /// Fixed lifespan in ticks, replacing the kind's random roll.
    pub lifespan: Option<u32>,
}

impl Emitter {
    /// Emitter that spawns one particle per tick until configured otherwise.
    pub fn new(kind: ParticleKind, path: EmitterPath) -> Self {
        Self {
            kind,
            path,
            policy: SpawnPolicy::FixedInterval { count: 1, every: 1 },
            scatter: Scatter::Point,
            surprise: None,
            lifespan: None,
        }
    }

    pub fn with_policy(mut self, policy: SpawnPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_scatter(mut self, scatter: Scatter) -> Self {
        self.scatter = scatter;
        self
    }

    pub fn with_surprise(mut self, surprise: SurpriseBurst) -> Self {
        self.surprise = Some(surprise);
        self
    }

    pub fn with_lifespan(mut self, ticks: u32) -> Self {
        self.lifespan = Some(ticks.max(1));
        self
    }

    /// Current position of the emitter.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.path.position()
    }

    /// Number of particles the policy asks for on this tick.
    ///
    /// `time` is `tick` expressed in seconds; `active` is the pool's active count.
    pub fn requested(&self, tick: u64, time: f32, active: usize, rng: &mut SpawnContext) -> u32 {
        match self.policy {
            SpawnPolicy::FixedInterval { count, every } => {
                if tick % u64::from(every.max(1)) == 0 {
                    count
                } else {
                    0
                }
            }
            SpawnPolicy::Chance { count, probability } => {
                if rng.chance(probability) {
                    count
                } else {
                    0
                }
            }
            SpawnPolicy::Pulsed {
                base,
                frequency,
                cap,
            } => {
                let pulse = SpawnPolicy::pulse(frequency, time, self.path.phase());
                ((base as f32 * pulse).round() as u32).min(cap)
            }
            SpawnPolicy::Refill { below, count } => {
                if active < below {
                    count
                } else {
                    0
                }
            }
        }
    }

    /// Advance the path and spawn this tick's particles.
    ///
    /// At most `budget` particles are spawned and the budget is reduced by the
    /// number actually created. Surprise bursts bypass the budget.
    pub fn update(
        &mut self,
        tick: u64,
        time: f32,
        pool: &mut ParticlePool,
        rng: &mut SpawnContext,
        budget: &mut u32,
    ) -> EmitReport {
        self.path.advance(rng);

        let mut report = EmitReport::default();
        let requested = self.requested(tick, time, pool.active_count(), rng);
        let allowed = requested.min(*budget);
        let origin = self.position();

        for i in 0..allowed {
            let offset = self.scatter.sample(rng);
            let mut particle = Particle::spawn(self.kind, origin, offset, rng);
            if let Some(lifespan) = self.lifespan {
                particle.lifespan = lifespan;
            }
            if pool.spawn(particle).is_err() {
                report.dropped += (allowed - i) as usize;
                break;
            }
            report.spawned += 1;
        }
        *budget -= report.spawned as u32;

        if let Some(surprise) = self.surprise {
            if rng.chance(surprise.chance) {
                let count = rng.random_uint(surprise.min, surprise.max);
                debug!(count, x = origin.x, y = origin.y, "surprise burst");
                report += spawn_burst(&Burst::new(origin, count, self.kind), pool, rng);
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_interval() {
        let mut rng = SpawnContext::new(0);
        let e = Emitter::new(ParticleKind::Smoke, EmitterPath::Fixed(Vec3::ZERO))
            .with_policy(SpawnPolicy::FixedInterval { count: 2, every: 3 });
        let counts: Vec<u32> = (0..6).map(|t| e.requested(t, 0.0, 0, &mut rng)).collect();
        assert_eq!(counts, vec![2, 0, 0, 2, 0, 0]);
    }

    #[test]
    fn test_pulse_range_and_cap() {
        let mut rng = SpawnContext::new(0);
        let e = Emitter::new(ParticleKind::Fire, EmitterPath::orbit(Vec3::ZERO, 10.0, 0.3, 0.01))
            .with_policy(SpawnPolicy::Pulsed {
                base: 40,
                frequency: 1.7,
                cap: 25,
            });
        for t in 0..600 {
            let time = t as f32 / 60.0;
            let pulse = SpawnPolicy::pulse(1.7, time, 0.3);
            assert!((0.0..=1.0).contains(&pulse));
            assert!(e.requested(t, time, 0, &mut rng) <= 25);
        }
    }

    #[test]
    fn test_pulsed_count_rounds() {
        let mut rng = SpawnContext::new(0);
        let e = Emitter::new(ParticleKind::Fire, EmitterPath::Fixed(Vec3::ZERO)).with_policy(
            SpawnPolicy::Pulsed {
                base: 10,
                frequency: 1.0,
                cap: 100,
            },
        );
        // sin(0) = 0, so the pulse is exactly one half.
        assert_eq!(e.requested(0, 0.0, 0, &mut rng), 5);
    }

    #[test]
    fn test_refill() {
        let mut rng = SpawnContext::new(0);
        let e = Emitter::new(ParticleKind::Mote, EmitterPath::Fixed(Vec3::ZERO))
            .with_policy(SpawnPolicy::Refill {
                below: 400,
                count: 40,
            });
        assert_eq!(e.requested(1, 0.0, 399, &mut rng), 40);
        assert_eq!(e.requested(1, 0.0, 400, &mut rng), 0);
    }

    #[test]
    fn test_orbit_advances() {
        let mut rng = SpawnContext::new(0);
        let mut path = EmitterPath::orbit(Vec3::new(100.0, 100.0, 0.0), 50.0, 0.0, 0.01);
        let start = path.position();
        assert_eq!(start, Vec3::new(150.0, 100.0, 0.0));
        path.advance(&mut rng);
        assert!((path.phase() - 0.01).abs() < 1e-6);
        assert_ne!(path.position(), start);
    }

    #[test]
    fn test_wander_drifts() {
        let mut rng = SpawnContext::new(0);
        let mut path = EmitterPath::Wander {
            position: Vec3::new(320.0, 400.0, 0.0),
            jitter: 0.0,
            drift: Vec3::new(0.0, -0.1, 0.0),
        };
        for _ in 0..10 {
            path.advance(&mut rng);
        }
        assert!((path.position().y - 399.0).abs() < 1e-3);
    }

    #[test]
    fn test_update_respects_budget() {
        let mut rng = SpawnContext::new(0);
        let mut pool = ParticlePool::new(100);
        let mut e = Emitter::new(ParticleKind::Smoke, EmitterPath::Fixed(Vec3::ZERO))
            .with_policy(SpawnPolicy::FixedInterval {
                count: 30,
                every: 1,
            });
        let mut budget = 12;
        let report = e.update(0, 0.0, &mut pool, &mut rng, &mut budget);
        assert_eq!(report.spawned, 12);
        assert_eq!(budget, 0);
        assert_eq!(pool.active_count(), 12);
    }

    #[test]
    fn test_burst_truncates_without_error() {
        let mut rng = SpawnContext::new(0);
        let mut pool = ParticlePool::new(3);
        let report = spawn_burst(
            &Burst::new(Vec3::ZERO, 20, ParticleKind::Spark),
            &mut pool,
            &mut rng,
        );
        assert_eq!(report.spawned, 3);
        assert_eq!(report.dropped, 17);
        assert_eq!(pool.active_count(), 3);
    }

    #[test]
    fn test_blast_overrides_velocity() {
        let mut rng = SpawnContext::new(4);
        let mut pool = ParticlePool::new(50);
        spawn_burst(
            &Burst::new(Vec3::ZERO, 50, ParticleKind::Flare).with_blast(3.0, 10.0),
            &mut pool,
            &mut rng,
        );
        for (_, p) in pool.iter_active() {
            let speed = p.velocity.truncate().length();
            assert!((3.0 - 1e-3..=10.0 + 1e-3).contains(&speed));
        }
    }
}
