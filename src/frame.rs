use crate::bodies::CelestialBody;
use crate::camera::{Camera, Projection};
use crate::lighting::LightingUniform;
use crate::LightParams;
use cgmath::{Matrix3, Matrix4};

/// Seconds since start and since the previous tick.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FrameClock {
  pub current_time: f32,
  pub delta_time: f32,
}

impl FrameClock {
  pub fn tick(&mut self, now: f32) {
    self.delta_time = now - self.current_time;
    self.current_time = now;
  }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxUniform {
  pub view: [[f32; 4]; 4],
  pub proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceUniform {
  pub model: [[f32; 4]; 4],
  pub view: [[f32; 4]; 4],
  pub proj: [[f32; 4]; 4],
}

/// Drops the translation of a view matrix so the skybox follows the camera.
#[must_use]
pub fn rotation_only(view: &Matrix4<f32>) -> Matrix4<f32> {
  Matrix4::from(Matrix3::from_cols(
    view.x.truncate(),
    view.y.truncate(),
    view.z.truncate(),
  ))
}

/// Everything one frame uploads, in draw order.
#[derive(Clone, Debug)]
pub struct FramePlan {
  pub skybox: SkyboxUniform,
  pub instances: Vec<InstanceUniform>,
  pub lighting: LightingUniform,
}

impl FramePlan {
  #[must_use]
  pub fn build(
    bodies: &[CelestialBody],
    camera: &Camera,
    projection: &Projection,
    light: &LightParams,
    elapsed: f32,
  ) -> Self {
    let view = camera.view_matrix();
    let proj: [[f32; 4]; 4] = projection.matrix(camera.zoom()).into();
    let skybox = SkyboxUniform {
      view: rotation_only(&view).into(),
      proj,
    };
    let view: [[f32; 4]; 4] = view.into();
    let instances = bodies
      .iter()
      .map(|body| InstanceUniform {
        model: body.model_matrix(elapsed).into(),
        view,
        proj,
      })
      .collect();
    Self {
      skybox,
      instances,
      lighting: LightingUniform::new(light, camera.position),
    }
  }
}
