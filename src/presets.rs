//! Ready-made particle shows.
//!
//! Each [`Show`] assembles a [`Simulation`] from emitters, a projector and a
//! burst configuration. The layout of randomised shows is derived from the
//! seed, so the same seed always produces the same show.
//!
//! A [`ShowConfig`] selects a show and overrides its defaults. It can be
//! deserialized from JSON:
//!
//! ```json
//! { "show": "concert", "width": 1920, "height": 1080, "seed": 7 }
//! ```

use std::f32::consts::TAU;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::camera::{Camera, FlatView, Oscillator, Projector};
use crate::compositor::FadeConfig;
use crate::emitter::{Emitter, EmitterPath, Scatter, SpawnPolicy, SurpriseBurst};
use crate::error::ShowError;
use crate::integrator::Bounds;
use crate::particle::ParticleKind;
use crate::simulation::{BurstConfig, SimConfig, Simulation};
use crate::spawn::SpawnContext;
use crate::textures::Fallback;

/// The built-in shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Show {
    /// A single wandering smoke column.
    Smoke,
    /// Steady smoke with clickable flare explosions.
    Fireworks,
    /// Clickable spark explosions coloured by depth.
    DepthFire,
    /// Orbiting fire emitters, embers and surprise bursts.
    #[default]
    Concert,
    /// A rotating 3D cloud of motes under a perspective camera.
    Cloud,
    /// A steady radial spray of pale puffs from the centre of the screen.
    Spray,
}

impl Show {
    pub const ALL: [Show; 6] = [
        Show::Smoke,
        Show::Fireworks,
        Show::DepthFire,
        Show::Concert,
        Show::Cloud,
        Show::Spray,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Show::Smoke => "smoke",
            Show::Fireworks => "fireworks",
            Show::DepthFire => "depth_fire",
            Show::Concert => "concert",
            Show::Cloud => "cloud",
            Show::Spray => "spray",
        }
    }

    /// Window size the show was laid out for.
    pub const fn screen_size(self) -> (u32, u32) {
        match self {
            Show::Smoke | Show::Fireworks => (640, 480),
            Show::DepthFire | Show::Spray => (800, 600),
            Show::Concert => (1280, 720),
            Show::Cloud => (1024, 768),
        }
    }

    /// Clear colour, RGBA in `[0, 1]`.
    pub fn background(self) -> [f32; 4] {
        let rgb = |r: u8, g: u8, b: u8| {
            [f32::from(r) / 255.0, f32::from(g) / 255.0, f32::from(b) / 255.0, 1.0]
        };
        match self {
            Show::Smoke => rgb(0x66, 0x99, 0xcc),
            Show::Fireworks => rgb(0x10, 0x10, 0x18),
            Show::DepthFire => rgb(10, 10, 20),
            Show::Concert => rgb(10, 6, 26),
            Show::Cloud => rgb(10, 14, 28),
            Show::Spray => rgb(0x10, 0x18, 0x30),
        }
    }

    /// Sprite image the show tries to load before falling back.
    pub fn texture_path(self) -> &'static Path {
        match self {
            Show::Smoke | Show::Fireworks | Show::Cloud | Show::Spray => {
                Path::new("assets/smoke.png")
            }
            Show::DepthFire | Show::Concert => Path::new("assets/fire.png"),
        }
    }

    /// Procedural sprite used when the texture cannot be loaded.
    pub fn fallback(self) -> Fallback {
        match self {
            Show::Concert => Fallback {
                width: 36,
                height: 36,
                exponent: 2.0,
            },
            _ => Fallback::default(),
        }
    }

    /// Simulation parameters for a `width` x `height` screen.
    pub fn sim_config(self, width: f32, height: f32) -> SimConfig {
        let config = SimConfig::new(width, height);
        match self {
            Show::Smoke => config.with_capacity(8_000),
            Show::Fireworks => config
                .with_capacity(10_000)
                .with_bounds(Bounds::screen(width, height, 100.0, 200.0, 200.0)),
            Show::DepthFire => config.with_capacity(8_000).with_fade(FadeConfig::flat()),
            Show::Concert => config
                .with_capacity(14_000)
                .with_spawn_budget(200)
                .with_fade(FadeConfig::flat())
                .with_bounds(Bounds::screen(width, height, 200.0, 300.0, 400.0)),
            Show::Cloud => config.with_capacity(1_200).with_fade(FadeConfig::perspective()),
            Show::Spray => config.with_capacity(800),
        }
    }

    /// The show at its native size.
    pub fn simulation(self, seed: u64) -> Simulation {
        let (width, height) = self.screen_size();
        self.build(self.sim_config(width as f32, height as f32).with_seed(seed))
    }

    /// Lay the show out for `config.screen`.
    pub fn build(self, config: SimConfig) -> Simulation {
        let screen = config.screen;
        // Layout randomness is kept apart from the simulation's own stream.
        let mut layout = SpawnContext::new(config.seed ^ 0x5eed_1a70);
        let sim = Simulation::new(config);

        match self {
            Show::Smoke => sim
                .with_projector(Projector::Flat(FlatView::new()))
                .with_emitter(
                    Emitter::new(
                        ParticleKind::Smoke,
                        EmitterPath::Wander {
                            position: (screen * 0.5).extend(0.0),
                            jitter: 0.25,
                            drift: Vec3::new(0.0, -0.1, 0.0),
                        },
                    )
                    .with_policy(SpawnPolicy::Chance {
                        count: 1,
                        probability: 2.0 / 3.0,
                    }),
                ),
            Show::Fireworks => sim
                .with_projector(Projector::Flat(FlatView::new()))
                .with_emitter(
                    Emitter::new(
                        ParticleKind::Smoke,
                        EmitterPath::Fixed(Vec3::new(screen.x * 0.5, screen.y - 50.0, 0.0)),
                    )
                    .with_policy(SpawnPolicy::FixedInterval { count: 2, every: 3 }),
                )
                .with_burst(BurstConfig::new(ParticleKind::Flare, 500).with_blast(3.0, 10.0)),
            Show::DepthFire => sim
                .with_projector(Projector::Flat(FlatView::new().with_depth_scale(0.5)))
                .with_burst(BurstConfig::new(ParticleKind::Spark, 600)),
            Show::Concert => {
                let view = FlatView::new()
                    .with_depth_scale(0.6)
                    .with_parallax(Oscillator::new(0.18, 0.25 / 60.0));
                let mut sim = sim
                    .with_projector(Projector::Flat(view))
                    .with_burst(BurstConfig::new(ParticleKind::Fire, 900).with_super_count(1200));
                for emitter in concert_emitters(screen, &mut layout) {
                    sim = sim.with_emitter(emitter);
                }
                sim
            }
            Show::Cloud => {
                let camera = Camera::new(screen * 0.5)
                    .with_yaw_rate(0.004)
                    .with_sway(Oscillator::new(0.15, 0.002));
                let capacity = sim.config().capacity;
                sim.with_projector(Projector::Perspective(camera))
                    .with_emitter(
                        Emitter::new(ParticleKind::Mote, EmitterPath::Fixed(Vec3::ZERO))
                            .with_policy(SpawnPolicy::FixedInterval { count: 8, every: 2 })
                            .with_scatter(Scatter::Sphere(220.0)),
                    )
                    .with_emitter(
                        Emitter::new(ParticleKind::Mote, EmitterPath::Fixed(Vec3::ZERO))
                            .with_policy(SpawnPolicy::Refill {
                                below: capacity / 3,
                                count: 40,
                            })
                            .with_scatter(Scatter::Sphere(220.0)),
                    )
            }
            Show::Spray => sim
                .with_projector(Projector::Flat(FlatView::new()))
                .with_emitter(
                    Emitter::new(
                        ParticleKind::Spray,
                        EmitterPath::Fixed((screen * 0.5).extend(0.0)),
                    )
                    .with_policy(SpawnPolicy::FixedInterval { count: 5, every: 2 }),
                ),
        }
    }
}

/// Six orbiting fire emitters across the stage and three slow ember emitters.
fn concert_emitters(screen: Vec2, rng: &mut SpawnContext) -> Vec<Emitter> {
    let mut emitters = Vec::with_capacity(9);

    for _ in 0..6 {
        let center = Vec3::new(
            screen.x * 0.5 + rng.random_signed(100.0),
            screen.y * 0.5 + rng.random_signed(60.0),
            0.0,
        );
        let path = EmitterPath::Orbit {
            center,
            radius: rng.random_range(120.0, 540.0),
            phase: rng.random_range(0.0, TAU),
            speed: rng.random_range(0.002, 0.008),
            offset_y: rng.random_signed(20.0),
        };
        let base = rng.random_uint(6, 18) * 2;
        emitters.push(
            Emitter::new(ParticleKind::Fire, path)
                .with_policy(SpawnPolicy::Pulsed {
                    base,
                    frequency: rng.random_range(0.8, 2.6),
                    cap: 250,
                })
                .with_scatter(Scatter::Square(20.0))
                .with_surprise(SurpriseBurst {
                    chance: 0.003,
                    min: 220,
                    max: 700,
                }),
        );
    }

    for _ in 0..3 {
        let center = Vec3::new(
            screen.x * rng.random_range(0.2, 0.8),
            screen.y * rng.random_range(0.6, 0.8),
            0.0,
        );
        let path = EmitterPath::orbit(
            center,
            rng.random_range(10.0, 70.0),
            rng.random_range(0.0, TAU),
            rng.random_range(0.001, 0.005),
        );
        emitters.push(
            Emitter::new(ParticleKind::Ember, path)
                .with_policy(SpawnPolicy::Pulsed {
                    base: rng.random_uint(2, 5),
                    frequency: rng.random_range(3.0, 9.0),
                    cap: 250,
                })
                .with_scatter(Scatter::Square(20.0)),
        );
    }

    emitters
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Show {
    type Err = ShowError;

    /// Case-insensitive; `-` and `_` are ignored, so `depth-fire` works too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Show::ALL
            .into_iter()
            .find(|show| show.name().replace('_', "") == wanted)
            .ok_or_else(|| ShowError::UnknownShow(s.to_string()))
    }
}

/// Which show to run and what to override.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowConfig {
    pub show: Show,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub capacity: Option<usize>,
    pub seed: Option<u64>,
    pub ticks_per_second: Option<f32>,
    /// Sprite image replacing the show's default.
    pub texture: Option<PathBuf>,
    /// Where to write the procedural sprite when the fallback is used.
    pub dump_fallback: Option<PathBuf>,
}

impl ShowConfig {
    pub fn new(show: Show) -> Self {
        Self {
            show,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ShowError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShowError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Window size after overrides.
    pub fn screen_size(&self) -> (u32, u32) {
        let (width, height) = self.show.screen_size();
        (self.width.unwrap_or(width).max(1), self.height.unwrap_or(height).max(1))
    }

    pub fn texture_path(&self) -> &Path {
        self.texture.as_deref().unwrap_or_else(|| self.show.texture_path())
    }

    pub fn sim_config(&self) -> SimConfig {
        let (width, height) = self.screen_size();
        let mut config = self.show.sim_config(width as f32, height as f32);
        if let Some(capacity) = self.capacity {
            config = config.with_capacity(capacity);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(tps) = self.ticks_per_second {
            config = config.with_ticks_per_second(tps);
        }
        config
    }

    /// Build the configured show.
    pub fn simulation(&self) -> Simulation {
        let config = self.sim_config();
        info!(
            show = %self.show,
            width = config.screen.x,
            height = config.screen.y,
            capacity = config.capacity,
            seed = config.seed,
            "starting show"
        );
        self.show.build(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("concert".parse::<Show>().unwrap(), Show::Concert);
        assert_eq!("Depth-Fire".parse::<Show>().unwrap(), Show::DepthFire);
        assert_eq!("depth_fire".parse::<Show>().unwrap(), Show::DepthFire);
        assert!(matches!("ballpit".parse::<Show>(), Err(ShowError::UnknownShow(_))));
        for show in Show::ALL {
            assert_eq!(show.to_string().parse::<Show>().unwrap(), show);
        }
    }

    #[test]
    fn test_concert_layout() {
        let sim = Show::Concert.simulation(1);
        assert_eq!(sim.config().capacity, 14_000);
        assert_eq!(sim.emitters().len(), 9);
        let fire = sim.emitters().iter().filter(|e| e.kind == ParticleKind::Fire).count();
        assert_eq!(fire, 6);
        assert!(sim.emitters().iter().take(6).all(|e| e.surprise.is_some()));
    }

    #[test]
    fn test_layout_follows_seed() {
        let positions = |seed| {
            Show::Concert
                .simulation(seed)
                .emitters()
                .iter()
                .map(Emitter::position)
                .collect::<Vec<_>>()
        };
        assert_eq!(positions(5), positions(5));
        assert_ne!(positions(5), positions(6));
    }

    #[test]
    fn test_every_show_runs() {
        for show in Show::ALL {
            let mut sim = show.simulation(0);
            for _ in 0..30 {
                sim.tick();
            }
            assert!(sim.pool().active_count() <= sim.pool().capacity(), "{show}");
            let frame = sim.build_frame();
            assert!(frame.quad_count() <= frame.active);
        }
    }

    #[test]
    fn test_cloud_refill_threshold() {
        let sim = Show::Cloud.simulation(0);
        assert!(matches!(
            sim.emitters()[1].policy,
            SpawnPolicy::Refill {
                below: 400,
                count: 40
            }
        ));
        assert!(matches!(sim.projector(), Projector::Perspective(_)));
    }

    #[test]
    fn test_spray_fills_to_capacity() {
        let mut sim = Show::Spray.simulation(0);
        assert_eq!(sim.config().capacity, 800);
        for _ in 0..4 {
            sim.tick();
        }
        assert_eq!(sim.pool().active_count(), 10);
        for _ in 0..400 {
            sim.tick();
        }
        assert!(sim.pool().active_count() <= 800);
        assert!(sim.pool().iter_active().all(|(_, p)| p.kind == ParticleKind::Spray));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "show": "cloud",
            "width": 800,
            "capacity": 500,
            "seed": 3,
            "texture": "mote.png"
        }"#;
        let config = ShowConfig::from_json_str(json).unwrap();
        assert_eq!(config.show, Show::Cloud);
        assert_eq!(config.screen_size(), (800, 768));
        assert_eq!(config.texture_path(), Path::new("mote.png"));

        let sim_config = config.sim_config();
        assert_eq!(sim_config.capacity, 500);
        assert_eq!(sim_config.seed, 3);
        assert_eq!(sim_config.screen, Vec2::new(800.0, 768.0));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ShowConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ShowConfig::default());
        assert_eq!(config.texture_path(), Show::Concert.texture_path());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            ShowConfig::from_json_str(r#"{ "show": "nope" }"#),
            Err(ShowError::Config(_))
        ));
    }
}
