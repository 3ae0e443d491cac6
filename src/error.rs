use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Rejected sphere parameters. Raised before any geometry or GPU memory exists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
  #[error("horizontal segments must be at least 4, got {0}")]
  TooFewHorizontalSegments(u32),

  #[error("vertical segments must be at least 2, got {0}")]
  TooFewVerticalSegments(u32),

  #[error("sphere radius must be positive and finite, got {0}")]
  InvalidRadius(f32),

  #[error("{vertices} vertices do not fit in 16-bit indices")]
  IndexCapacity { vertices: usize },
}

#[derive(Error, Debug)]
pub enum Error {
  #[error("invalid sphere parameters: {0}")]
  Mesh(#[from] MeshError),

  #[error("failed to load image {path}: {source}")]
  ImageLoad {
    path: PathBuf,
    #[source]
    source: image::ImageError,
  },

  #[error("{path} has {channels} channels, expected 3 or 4")]
  UnsupportedChannels { path: PathBuf, channels: u8 },

  #[error("{path} is {width}x{height}, the device allows at most {max} texels per side")]
  TextureTooLarge {
    path: PathBuf,
    width: u32,
    height: u32,
    max: u32,
  },

  #[error("cubemap face {path}: {reason}")]
  CubemapFace { path: PathBuf, reason: String },

  #[error("shader `{label}` failed validation: {message}")]
  Shader { label: String, message: String },

  #[error("invalid scene: {0}")]
  Scene(String),

  #[error("event loop error: {0}")]
  EventLoop(#[from] winit::error::EventLoopError),

  #[error("window creation failed: {0}")]
  Window(#[from] winit::error::OsError),

  #[error("surface creation failed: {0}")]
  Surface(#[from] wgpu::CreateSurfaceError),

  #[error("surface is not supported by the selected adapter")]
  SurfaceUnsupported,

  #[error("no suitable GPU adapter found")]
  NoAdapter,

  #[error("device request failed: {0}")]
  Device(#[from] wgpu::RequestDeviceError),

  #[error("failed to install signal handler: {0}")]
  Signal(#[from] ctrlc::Error),
}
