use crate::error::{Error, Result};
use cgmath::{InnerSpace, Matrix4, Rad, SquareMatrix, Vector3};
use std::path::PathBuf;

/// Static description of one orbiting body. Index 0 of a [`SolarSystem`] is the sun.
#[derive(Clone, Debug, PartialEq)]
pub struct CelestialBody {
  pub name: &'static str,
  pub orbit_distance: f32,
  pub orbit_speed: f32,
  pub size: f32,
  pub rotation_speed: f32,
  /// Texture path relative to the assets directory.
  pub texture: PathBuf,
}

impl CelestialBody {
  pub fn new(
    name: &'static str,
    orbit_distance: f32,
    orbit_speed: f32,
    size: f32,
    rotation_speed: f32,
    texture: impl Into<PathBuf>,
  ) -> Self {
    Self {
      name,
      orbit_distance,
      orbit_speed,
      size,
      rotation_speed,
      texture: texture.into(),
    }
  }

  /// Model matrix at `elapsed` seconds.
  ///
  /// The sphere is scaled, spun about its own axis, pushed out to
  /// `(d, 0, -d)` and then carried around the world Y axis, so the body
  /// circles the origin at radius `d * sqrt(2)`. The spin axis is
  /// `(0, rotation_speed, 0)`; a zero speed leaves the body unspun.
  #[must_use]
  pub fn model_matrix(&self, elapsed: f32) -> Matrix4<f32> {
    let orbit = Matrix4::from_angle_y(Rad(elapsed * self.orbit_speed));
    let offset = Matrix4::from_translation(Vector3::new(
      self.orbit_distance,
      0.0,
      -self.orbit_distance,
    ));
    let spin_axis = Vector3::new(0.0, self.rotation_speed, 0.0);
    let spin = if spin_axis.magnitude2() > 0.0 {
      Matrix4::from_axis_angle(spin_axis.normalize(), Rad(elapsed * self.rotation_speed))
    } else {
      Matrix4::identity()
    };
    let scale = Matrix4::from_scale(self.size);
    orbit * offset * spin * scale
  }
}

/// Ordered, non-empty body table with the sun first.
#[derive(Clone, Debug)]
pub struct SolarSystem {
  bodies: Vec<CelestialBody>,
}

impl SolarSystem {
  pub fn new(bodies: Vec<CelestialBody>) -> Result<Self> {
    let Some(sun) = bodies.first() else {
      return Err(Error::Scene("at least one body is required".into()));
    };
    if sun.orbit_distance != 0.0 {
      return Err(Error::Scene(format!(
        "first body `{}` must sit at the origin, orbit distance is {}",
        sun.name, sun.orbit_distance
      )));
    }
    Ok(Self { bodies })
  }

  pub fn bodies(&self) -> &[CelestialBody] {
    &self.bodies
  }

  pub fn len(&self) -> usize {
    self.bodies.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bodies.is_empty()
  }

  pub fn sun(&self) -> &CelestialBody {
    &self.bodies[0]
  }
}

impl Default for SolarSystem {
  fn default() -> Self {
    Self {
      bodies: vec![
        CelestialBody::new("sun", 0.0, 0.0, 2.0, 0.3, "planets/sun.jpg"),
        CelestialBody::new("mercury", 10.0, 0.2, 0.7, 0.2, "planets/mercury.png"),
        CelestialBody::new("venus", 15.0, 0.18, 1.0, 0.1, "planets/venus.jpg"),
        CelestialBody::new("earth", 20.0, 0.14, 1.0, 0.3, "planets/earth.jpg"),
        CelestialBody::new("mars", 30.0, 0.12, 0.8, 0.28, "planets/mars.jpg"),
        CelestialBody::new("jupiter", 35.0, 0.10, 1.7, 0.8, "planets/jupiter.jpg"),
        CelestialBody::new("saturn", 40.0, 0.08, 1.6, 0.6, "planets/saturn.jpg"),
        CelestialBody::new("uranus", 45.0, 0.06, 1.2, 0.3, "planets/uranus.jpg"),
        CelestialBody::new("neptune", 50.0, 0.04, 1.2, 0.3, "planets/neptune.jpg"),
      ],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::Vector4;

  fn translation(m: &Matrix4<f32>) -> Vector3<f32> {
    m.w.truncate()
  }

  #[test]
  fn static_body_sits_at_offset() {
    let body = CelestialBody::new("probe", 10.0, 0.0, 2.0, 0.0, "x.png");
    let model = body.model_matrix(0.0);
    let t = translation(&model);
    assert!((t - Vector3::new(10.0, 0.0, -10.0)).magnitude() < 1e-5);
    // Size scales the geometry, not the offset.
    let surface = model * Vector4::new(1.0, 0.0, 0.0, 1.0);
    assert!((surface.x - 12.0).abs() < 1e-5);
  }

  #[test]
  fn frozen_orbit_keeps_radius() {
    let body = CelestialBody::new("probe", 7.0, 0.0, 1.3, 0.5, "x.png");
    for elapsed in [0.0, 1.0, 12.5, 300.0] {
      let t = translation(&body.model_matrix(elapsed));
      let xz = (t.x * t.x + t.z * t.z).sqrt();
      assert!((xz - 7.0 * 2f32.sqrt()).abs() < 1e-4);
      assert!(t.y.abs() < 1e-6);
    }
  }

  #[test]
  fn orbit_traces_circle_about_y() {
    let body = CelestialBody::new("probe", 5.0, 0.25, 1.0, 0.0, "x.png");
    let start = translation(&body.model_matrix(0.0));
    let quarter = translation(&body.model_matrix(std::f32::consts::FRAC_PI_2 / 0.25));
    assert!((start.magnitude() - quarter.magnitude()).abs() < 1e-4);
    // Rotating (5, 0, -5) by 90 degrees about +Y gives (-5, 0, -5).
    assert!((quarter - Vector3::new(-5.0, 0.0, -5.0)).magnitude() < 1e-4);
  }

  #[test]
  fn spin_does_not_move_the_body() {
    let body = CelestialBody::new("probe", 3.0, 0.0, 1.0, 0.9, "x.png");
    let a = translation(&body.model_matrix(0.0));
    let b = translation(&body.model_matrix(4.0));
    assert!((a - b).magnitude() < 1e-5);
    // Upper 3x3 rotates about Y, so the Y column is untouched.
    let m = body.model_matrix(4.0);
    assert!((m.y.truncate() - Vector3::unit_y()).magnitude() < 1e-5);
  }

  #[test]
  fn negative_spin_turns_the_same_way() {
    let forward = CelestialBody::new("a", 0.0, 0.0, 1.0, 0.5, "x.png");
    let backward = CelestialBody::new("b", 0.0, 0.0, 1.0, -0.5, "x.png");
    let (m1, m2) = (forward.model_matrix(2.0), backward.model_matrix(2.0));
    for (c1, c2) in [(m1.x, m2.x), (m1.z, m2.z)] {
      assert!((c1 - c2).magnitude() < 1e-5);
    }
  }

  #[test]
  fn composition_is_deterministic() {
    let system = SolarSystem::default();
    for body in system.bodies() {
      let a = body.model_matrix(42.125);
      let b = body.model_matrix(42.125);
      let (a, b): ([[f32; 4]; 4], [[f32; 4]; 4]) = (a.into(), b.into());
      for (ra, rb) in a.iter().zip(b.iter()) {
        for (x, y) in ra.iter().zip(rb.iter()) {
          assert_eq!(x.to_bits(), y.to_bits());
        }
      }
    }
  }

  #[test]
  fn default_system_starts_with_sun() {
    let system = SolarSystem::default();
    assert_eq!(system.len(), 9);
    assert_eq!(system.sun().orbit_distance, 0.0);
    assert_eq!(system.bodies()[3].name, "earth");
  }

  #[test]
  fn rejects_bad_tables() {
    assert!(matches!(SolarSystem::new(vec![]), Err(Error::Scene(_))));
    let offset = vec![CelestialBody::new("sun", 4.0, 0.0, 1.0, 0.0, "s.png")];
    assert!(matches!(SolarSystem::new(offset), Err(Error::Scene(_))));
  }
}
