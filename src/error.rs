//! Error types for pyre.
//!
//! The simulation core never fails per tick: pool exhaustion is reported as
//! [`PoolExhausted`](crate::pool::PoolExhausted) and recovered locally by the
//! spawners. The types here cover the outer layers: texture loading, GPU
//! setup and the demo host.

use std::path::PathBuf;

use thiserror::Error;

use crate::textures::TextureHandle;

/// Errors that can occur during GPU initialization and rendering.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found (Vulkan, Metal, DX12 or WebGPU required)")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface could not produce a frame.
    #[error("failed to acquire surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    /// A batch referenced a texture that was never uploaded.
    #[error("unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),
}

/// Errors that can occur while loading or generating sprite textures.
#[derive(Debug, Error)]
pub enum TextureError {
    /// Failed to read or decode an image file.
    #[error("failed to load image {}: {source}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// Failed to encode or write an image file.
    #[error("failed to save image {}: {source}", .path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// A texture with zero area was requested.
    #[error("invalid texture dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// Raw pixel data does not match the declared dimensions.
    #[error("RGBA data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    /// The asset failed to load and the procedural fallback failed as well.
    #[error("asset {} is missing and no fallback could be built: {reason}", .path.display())]
    AssetMissing {
        path: PathBuf,
        #[source]
        reason: Box<TextureError>,
    },
}

/// Errors that stop the demo host.
#[derive(Debug, Error)]
pub enum ShowError {
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to read show config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid show config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("unknown show {0:?}")]
    UnknownShow(String),
}
