use crate::LightParams;
use cgmath::Point3;

/// Light, material and eye values read by the Phong fragment stage.
/// vec3 members are padded to 16 bytes to match WGSL uniform layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
  pub light_position: [f32; 4],
  pub ambient: [f32; 4],
  pub diffuse: [f32; 4],
  pub specular: [f32; 4],
  pub shininess_color: [f32; 4],
  pub camera_position: [f32; 3],
  pub shininess: f32,
}

fn pad(v: [f32; 3]) -> [f32; 4] {
  [v[0], v[1], v[2], 0.0]
}

impl LightingUniform {
  pub fn new(light: &LightParams, camera_position: Point3<f32>) -> Self {
    Self {
      light_position: pad(light.position),
      ambient: pad(light.ambient),
      diffuse: pad(light.diffuse),
      specular: pad(light.specular),
      shininess_color: light.shininess_color,
      camera_position: camera_position.into(),
      shininess: light.shininess,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn layout_matches_wgsl() {
    assert_eq!(std::mem::size_of::<LightingUniform>(), 96);
    assert_eq!(std::mem::align_of::<LightingUniform>(), 4);
  }

  #[test]
  fn carries_camera_and_light() {
    let uniform = LightingUniform::new(&LightParams::default(), Point3::new(1.0, 2.0, 3.0));
    assert_eq!(uniform.camera_position, [1.0, 2.0, 3.0]);
    assert_eq!(uniform.ambient, [0.4, 0.4, 0.4, 0.0]);
    assert_eq!(uniform.diffuse, [0.9, 0.7, 0.7, 0.0]);
    assert_eq!(uniform.shininess, 32.0);
  }
}
