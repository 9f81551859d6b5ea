//! # Pyre - pooled particle shows
//!
//! CPU-simulated sprite particles with depth-sorted projection and batched
//! quad rendering.
//!
//! Pyre owns a fixed-capacity particle pool and runs a deterministic,
//! tick-driven pipeline over it. Drawing is left to a [`Renderer`]: the
//! crate hands over ready-made vertex and index buffers, one per
//! (blend mode, texture) group.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pyre::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::new(1280.0, 720.0).with_capacity(14_000))
//!     .with_emitter(
//!         Emitter::new(
//!             ParticleKind::Fire,
//!             EmitterPath::orbit(Vec3::new(640.0, 360.0, 0.0), 200.0, 0.0, 0.004),
//!         )
//!         .with_policy(SpawnPolicy::Pulsed { base: 20, frequency: 1.5, cap: 250 }),
//!     )
//!     .with_burst(BurstConfig::new(ParticleKind::Fire, 900));
//!
//! sim.trigger(Trigger::Burst { at: Vec2::new(640.0, 360.0) });
//! sim.tick();
//!
//! let mut renderer = RecordingRenderer::new();
//! submit(&sim.build_frame(), &mut renderer)?;
//! ```
//!
//! ## Pipeline
//!
//! Each [`Simulation::tick`] runs, in order:
//!
//! 1. **Integrate** - move every live particle, age it, and release it when
//!    it expires or leaves the bounds ([`integrator`]).
//! 2. **Triggers** - apply queued bursts and camera controls ([`Trigger`]).
//! 3. **Emit** - advance every [`Emitter`] and spawn within the shared
//!    per-tick budget ([`emitter`]).
//!
//! [`Simulation::build_frame`] then projects live particles
//! ([`camera`]), sorts them far to near and computes their fade
//! ([`compositor`]), and groups their quads ([`batch`]).
//!
//! ## Feature Overview
//!
//! | Area | Types |
//! |------|-------|
//! | Storage | [`ParticlePool`], [`SlotId`], [`PoolExhausted`] |
//! | Behaviour | [`ParticleKind`], [`Particle`] |
//! | Spawning | [`Emitter`], [`EmitterPath`], [`SpawnPolicy`], [`Burst`] |
//! | Projection | [`Camera`], [`FlatView`], [`Projector`] |
//! | Drawing | [`DepthCompositor`], [`BatchBuilder`], [`Renderer`] |
//! | Host | [`TickClock`], [`InputMapper`], [`Show`], [`gpu::GpuRenderer`] |

pub mod batch;
pub mod camera;
pub mod compositor;
pub mod emitter;
pub mod error;
pub mod gpu;
pub mod input;
pub mod integrator;
pub mod particle;
pub mod pool;
pub mod presets;
pub mod renderer;
pub mod simulation;
pub mod spawn;
pub mod textures;
pub mod time;
pub mod visuals;

pub use batch::{Batch, BatchBuilder, GroupKey, Vertex};
pub use bytemuck;
pub use camera::{Camera, CameraControl, FlatView, Oscillator, Projected, Projector};
pub use compositor::{DepthCompositor, DrawItem, FadeConfig};
pub use emitter::{
    spawn_burst, Burst, EmitReport, Emitter, EmitterPath, Scatter, SpawnPolicy, SurpriseBurst,
};
pub use error::{GpuError, ShowError, TextureError};
pub use glam::{Vec2, Vec3, Vec4};
pub use input::InputMapper;
pub use integrator::{integrate, Bounds, TickStats};
pub use particle::{KindParams, Particle, ParticleKind};
pub use pool::{ParticlePool, PoolExhausted, SlotId};
pub use presets::{Show, ShowConfig};
pub use renderer::{submit, RecordingRenderer, Renderer, Submission};
pub use simulation::{BurstConfig, Frame, SimConfig, Simulation, Trigger};
pub use spawn::SpawnContext;
pub use textures::{
    Fallback, FilterMode, Sprite, SpriteSet, TextureData, TextureHandle, TextureSource,
};
pub use time::TickClock;
pub use visuals::{BlendMode, ColorMode, LifeEnvelope};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use pyre::prelude::*;
/// ```
pub mod prelude {
    pub use crate::batch::{Batch, BatchBuilder};
    pub use crate::camera::{Camera, CameraControl, FlatView, Oscillator, Projector};
    pub use crate::compositor::FadeConfig;
    pub use crate::emitter::{Burst, Emitter, EmitterPath, Scatter, SpawnPolicy, SurpriseBurst};
    pub use crate::input::InputMapper;
    pub use crate::integrator::Bounds;
    pub use crate::particle::ParticleKind;
    pub use crate::presets::{Show, ShowConfig};
    pub use crate::renderer::{submit, RecordingRenderer, Renderer};
    pub use crate::simulation::{BurstConfig, SimConfig, Simulation, Trigger};
    pub use crate::textures::{Fallback, Sprite, SpriteSet, TextureData};
    pub use crate::time::TickClock;
    pub use crate::visuals::BlendMode;
    pub use crate::{Vec2, Vec3, Vec4};
}
