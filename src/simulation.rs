//! The simulation context that ties the pipeline together.
//!
//! A [`Simulation`] owns the pool, the emitters, the projector and the
//! per-frame scratch buffers. The host drives it with two calls per frame:
//!
//! ```ignore
//! let mut sim = Simulation::new(SimConfig::new(1280.0, 720.0).with_capacity(14_000))
//!     .with_emitter(Emitter::new(
//!         ParticleKind::Fire,
//!         EmitterPath::Fixed(Vec3::new(640.0, 600.0, 0.0)),
//!     ))
//!     .with_burst(BurstConfig::new(ParticleKind::Fire, 900));
//!
//! loop {
//!     sim.tick();
//!     let frame = sim.build_frame();
//!     submit(&frame, &mut renderer)?;
//! }
//! ```
//!
//! Within a tick, particles alive at the start are integrated first; queued
//! triggers and emitters spawn afterwards, so new particles start moving on
//! the following tick.

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::batch::{Batch, BatchBuilder, DEFAULT_DROP_THRESHOLD};
use crate::camera::{CameraControl, Projector};
use crate::compositor::{DepthCompositor, FadeConfig};
use crate::emitter::{spawn_burst, Burst, EmitReport, Emitter};
use crate::integrator::{integrate, Bounds, TickStats};
use crate::particle::ParticleKind;
use crate::pool::ParticlePool;
use crate::spawn::SpawnContext;
use crate::textures::SpriteSet;

/// Static parameters of a simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Maximum number of live particles.
    pub capacity: usize,
    /// Screen size in pixels.
    pub screen: Vec2,
    /// Particles leaving these bounds are released.
    pub bounds: Bounds,
    /// Maximum particles all emitters together may spawn per tick.
    pub spawn_budget: u32,
    pub fade: FadeConfig,
    pub drop_threshold: f32,
    /// Converts ticks to seconds for time-based effects.
    pub ticks_per_second: f32,
    pub seed: u64,
}

impl SimConfig {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            capacity: 10_000,
            screen: Vec2::new(width, height),
            bounds: Bounds::unbounded(),
            spawn_budget: 200,
            fade: FadeConfig::default(),
            drop_threshold: DEFAULT_DROP_THRESHOLD,
            ticks_per_second: 60.0,
            seed: 0,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_spawn_budget(mut self, budget: u32) -> Self {
        self.spawn_budget = budget;
        self
    }

    pub fn with_fade(mut self, fade: FadeConfig) -> Self {
        self.fade = fade;
        self
    }

    pub fn with_drop_threshold(mut self, threshold: f32) -> Self {
        self.drop_threshold = threshold;
        self
    }

    pub fn with_ticks_per_second(mut self, tps: f32) -> Self {
        self.ticks_per_second = tps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// What user-triggered bursts spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstConfig {
    pub kind: ParticleKind,
    /// Particles per [`Trigger::Burst`].
    pub count: u32,
    /// Particles per [`Trigger::SuperBurst`].
    pub super_count: u32,
    /// Radial blast speed range overriding the kind's launch velocity.
    pub blast: Option<(f32, f32)>,
}

impl BurstConfig {
    pub fn new(kind: ParticleKind, count: u32) -> Self {
        Self {
            kind,
            count,
            super_count: count,
            blast: None,
        }
    }

    pub fn with_super_count(mut self, count: u32) -> Self {
        self.super_count = count;
        self
    }

    pub fn with_blast(mut self, min_speed: f32, max_speed: f32) -> Self {
        self.blast = Some((min_speed, max_speed));
        self
    }
}

/// External event delivered to the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Burst at a screen position.
    Burst { at: Vec2 },
    /// Larger burst at a random spot in the middle band of the screen.
    SuperBurst,
    Camera(CameraControl),
}

/// The draw data for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    batches: &'a [Batch],
    /// Tick the frame was built after.
    pub tick: u64,
    pub active: usize,
    pub capacity: usize,
}

impl<'a> Frame<'a> {
    /// Non-empty groups in draw order.
    pub fn batches(&self) -> impl Iterator<Item = &'a Batch> + 'a {
        let batches = self.batches;
        batches.iter().filter(|b| !b.is_empty())
    }

    /// Quads across all groups.
    pub fn quad_count(&self) -> usize {
        self.batches.iter().map(Batch::quad_count).sum()
    }
}

/// A running particle show.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    pool: ParticlePool,
    emitters: Vec<Emitter>,
    projector: Projector,
    compositor: DepthCompositor,
    batches: BatchBuilder,
    burst: Option<BurstConfig>,
    rng: SpawnContext,
    pending: Vec<Trigger>,
    tick: u64,
    last_stats: TickStats,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self {
            pool: ParticlePool::new(config.capacity),
            emitters: Vec::new(),
            projector: Projector::default(),
            compositor: DepthCompositor::new(config.fade),
            batches: BatchBuilder::new(SpriteSet::default())
                .with_drop_threshold(config.drop_threshold),
            burst: None,
            rng: SpawnContext::new(config.seed),
            pending: Vec::new(),
            tick: 0,
            last_stats: TickStats::default(),
            config,
        }
    }

    pub fn with_emitter(mut self, emitter: Emitter) -> Self {
        self.emitters.push(emitter);
        self
    }

    pub fn with_projector(mut self, projector: Projector) -> Self {
        self.projector = projector;
        self
    }

    pub fn with_burst(mut self, burst: BurstConfig) -> Self {
        self.burst = Some(burst);
        self
    }

    pub fn with_sprites(mut self, sprites: SpriteSet) -> Self {
        self.batches.set_sprites(sprites);
        self
    }

    /// Replace the sprite table, e.g. once the renderer has uploaded textures.
    pub fn set_sprites(&mut self, sprites: SpriteSet) {
        self.batches.set_sprites(sprites);
    }

    /// Queue an external event; it takes effect on the next [`tick`](Self::tick).
    pub fn trigger(&mut self, trigger: Trigger) {
        self.pending.push(trigger);
    }

    /// Spawn a burst immediately.
    pub fn burst(&mut self, burst: &Burst) -> EmitReport {
        spawn_burst(burst, &mut self.pool, &mut self.rng)
    }

    /// Advance the show by one tick.
    pub fn tick(&mut self) -> TickStats {
        let tick = self.tick;
        let time = self.time();

        self.projector.advance(tick);
        let mut stats = integrate(&mut self.pool, &self.config.bounds, tick);

        let mut report = EmitReport::default();
        let mut pending = std::mem::take(&mut self.pending);
        for trigger in pending.drain(..) {
            report += self.apply_trigger(trigger);
        }
        self.pending = pending;

        let mut budget = self.config.spawn_budget;
        for emitter in &mut self.emitters {
            report += emitter.update(tick, time, &mut self.pool, &mut self.rng, &mut budget);
        }

        stats.spawned = report.spawned;
        stats.dropped = report.dropped;
        self.last_stats = stats;
        self.tick += 1;
        stats
    }

    fn apply_trigger(&mut self, trigger: Trigger) -> EmitReport {
        match trigger {
            Trigger::Camera(control) => {
                self.projector.apply(control);
                EmitReport::default()
            }
            Trigger::Burst { at } => {
                let Some(config) = self.burst else {
                    return EmitReport::default();
                };
                let origin = self.projector.unproject(at);
                debug!(x = at.x, y = at.y, count = config.count, "burst");
                self.spawn_configured(config, origin, config.count)
            }
            Trigger::SuperBurst => {
                let Some(config) = self.burst else {
                    return EmitReport::default();
                };
                let screen = self.config.screen;
                let at = self.rng.random_in_rect(
                    Vec2::new(0.0, screen.y / 3.0),
                    Vec2::new(screen.x, screen.y / 3.0 + screen.y / 2.0),
                );
                let origin = self.projector.unproject(at);
                debug!(x = at.x, y = at.y, count = config.super_count, "super burst");
                self.spawn_configured(config, origin, config.super_count)
            }
        }
    }

    fn spawn_configured(&mut self, config: BurstConfig, origin: Vec3, count: u32) -> EmitReport {
        let mut burst = Burst::new(origin, count, config.kind);
        burst.blast = config.blast;
        spawn_burst(&burst, &mut self.pool, &mut self.rng)
    }

    /// Project, sort and batch the current particles.
    pub fn build_frame(&mut self) -> Frame<'_> {
        let time = self.time();
        let items = self.compositor.compose(&self.pool, &self.projector, time);
        let batches = self.batches.build(items);
        Frame {
            batches,
            tick: self.tick,
            active: self.pool.active_count(),
            capacity: self.pool.capacity(),
        }
    }

    /// Ticks run so far.
    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulated time in seconds.
    #[inline]
    pub fn time(&self) -> f32 {
        self.tick as f32 / self.config.ticks_per_second.max(f32::EPSILON)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ParticlePool {
        &mut self.pool
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn last_stats(&self) -> TickStats {
        self.last_stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FlatView;
    use crate::emitter::{EmitterPath, SpawnPolicy};

    fn fixed(kind: ParticleKind) -> Emitter {
        Emitter::new(kind, EmitterPath::Fixed(Vec3::new(100.0, 100.0, 0.0)))
    }

    #[test]
    fn test_spawn_budget_is_shared() {
        let eight = SpawnPolicy::FixedInterval { count: 8, every: 1 };
        let mut sim = Simulation::new(SimConfig::new(640.0, 480.0).with_spawn_budget(10))
            .with_emitter(fixed(ParticleKind::Smoke).with_policy(eight))
            .with_emitter(fixed(ParticleKind::Smoke).with_policy(eight));
        let stats = sim.tick();
        assert_eq!(stats.spawned, 10);
    }

    #[test]
    fn test_burst_trigger_applies_next_tick() {
        let mut sim = Simulation::new(SimConfig::new(640.0, 480.0))
            .with_burst(BurstConfig::new(ParticleKind::Spark, 50));
        sim.trigger(Trigger::Burst {
            at: Vec2::new(320.0, 240.0),
        });
        assert_eq!(sim.pool().active_count(), 0);
        let stats = sim.tick();
        assert_eq!(stats.spawned, 50);
        assert_eq!(sim.pool().active_count(), 50);
    }

    #[test]
    fn test_burst_without_config_is_ignored() {
        let mut sim = Simulation::new(SimConfig::new(640.0, 480.0));
        sim.trigger(Trigger::SuperBurst);
        assert_eq!(sim.tick().spawned, 0);
    }

    #[test]
    fn test_super_burst_lands_in_middle_band() {
        let mut sim = Simulation::new(SimConfig::new(600.0, 600.0).with_seed(3))
            .with_burst(BurstConfig::new(ParticleKind::Flare, 1).with_super_count(4));
        sim.trigger(Trigger::SuperBurst);
        assert_eq!(sim.tick().spawned, 4);
        for (_, p) in sim.pool().iter_active() {
            // Flares jitter by up to two pixels around the burst origin.
            assert!(p.position.y >= 198.0 && p.position.y <= 502.0);
        }
    }

    #[test]
    fn test_camera_trigger() {
        let mut sim = Simulation::new(SimConfig::new(640.0, 480.0))
            .with_projector(Projector::Flat(FlatView::new()));
        sim.trigger(Trigger::Camera(CameraControl::Pan(Vec2::new(5.0, 0.0))));
        sim.tick();
        let Projector::Flat(view) = sim.projector() else {
            panic!("expected flat projector");
        };
        assert_eq!(view.pan, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_build_frame_counts() {
        let mut sim = Simulation::new(SimConfig::new(640.0, 480.0).with_fade(FadeConfig::flat()))
            .with_projector(Projector::Flat(FlatView::new()))
            .with_burst(BurstConfig::new(ParticleKind::Fire, 20));
        sim.trigger(Trigger::Burst {
            at: Vec2::new(320.0, 240.0),
        });
        sim.tick();
        let frame = sim.build_frame();
        assert_eq!(frame.active, 20);
        assert_eq!(frame.quad_count(), 20);
        assert_eq!(frame.batches().count(), 1);
    }

    #[test]
    fn test_same_seed_same_show() {
        let run = || {
            let mut sim = Simulation::new(SimConfig::new(640.0, 480.0).with_seed(99))
                .with_emitter(fixed(ParticleKind::Ember).with_policy(SpawnPolicy::Chance {
                    count: 3,
                    probability: 0.5,
                }));
            for _ in 0..120 {
                sim.tick();
            }
            sim.pool().iter_active().map(|(_, p)| p.position).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
