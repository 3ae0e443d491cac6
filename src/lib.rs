pub mod assets;
pub mod bodies;
pub mod camera;
pub mod error;
pub mod frame;
pub mod input;
pub mod lighting;
pub mod render;
pub mod sphere;
pub mod state;
pub mod texture;

pub use error::{Error, MeshError, Result};

use std::path::PathBuf;

pub struct AppConfig {
  pub width: u32,
  pub height: u32,
  pub assets: PathBuf,
  pub sphere: SphereParams,
  pub camera: CameraParams,
  pub light: LightParams,
  pub vsync: bool,
  /// Shade planets with the Phong program instead of the unlit textured one.
  pub lit: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      width: 1024,
      height: 768,
      assets: PathBuf::from("assets"),
      sphere: SphereParams::default(),
      camera: CameraParams::default(),
      light: LightParams::default(),
      vsync: false,
      lit: false,
    }
  }
}

#[derive(Copy, Clone, Debug)]
pub struct SphereParams {
  pub radius: f32,
  pub horizontal_segments: u32,
  pub vertical_segments: u32,
}

impl Default for SphereParams {
  fn default() -> Self {
    Self {
      radius: 1.0,
      horizontal_segments: 100,
      vertical_segments: 100,
    }
  }
}

#[derive(Copy, Clone, Debug)]
pub struct CameraParams {
  pub position: [f32; 3],
  pub speed: f32,
  pub sensitivity: f32,
}

impl Default for CameraParams {
  fn default() -> Self {
    Self {
      position: [0.0, 30.0, 30.0],
      speed: 2.5,
      sensitivity: 0.1,
    }
  }
}

#[derive(Copy, Clone, Debug)]
pub struct LightParams {
  pub position: [f32; 3],
  pub ambient: [f32; 3],
  pub diffuse: [f32; 3],
  pub specular: [f32; 3],
  pub shininess_color: [f32; 4],
  pub shininess: f32,
}

impl Default for LightParams {
  fn default() -> Self {
    Self {
      position: [0.0, 0.0, 0.0],
      ambient: [0.4, 0.4, 0.4],
      diffuse: [0.9, 0.7, 0.7],
      specular: [0.0, 0.0, 0.0],
      shininess_color: [1.0, 1.0, 1.0, 1.0],
      shininess: 32.0,
    }
  }
}
