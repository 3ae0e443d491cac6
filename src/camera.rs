use crate::input::{InputSource, Key};
use crate::CameraParams;
use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub const PITCH_LIMIT: f32 = 89.0;
pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 45.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
  Forward,
  Backward,
  Left,
  Right,
}

/// Free-fly camera oriented by yaw/pitch in degrees.
#[derive(Clone, Debug)]
pub struct Camera {
  pub position: Point3<f32>,
  front: Vector3<f32>,
  up: Vector3<f32>,
  right: Vector3<f32>,
  world_up: Vector3<f32>,
  yaw: f32,
  pitch: f32,
  pub movement_speed: f32,
  pub mouse_sensitivity: f32,
  zoom: f32,
}

impl Camera {
  pub fn new(position: Point3<f32>, params: &CameraParams) -> Self {
    let mut camera = Self {
      position,
      front: -Vector3::unit_z(),
      up: Vector3::unit_y(),
      right: Vector3::unit_x(),
      world_up: Vector3::unit_y(),
      yaw: -90.0,
      pitch: 0.0,
      movement_speed: params.speed,
      mouse_sensitivity: params.sensitivity,
      zoom: MAX_ZOOM,
    };
    camera.update_vectors();
    camera
  }

  pub fn front(&self) -> Vector3<f32> {
    self.front
  }

  pub fn up(&self) -> Vector3<f32> {
    self.up
  }

  pub fn right(&self) -> Vector3<f32> {
    self.right
  }

  pub fn yaw(&self) -> f32 {
    self.yaw
  }

  pub fn pitch(&self) -> f32 {
    self.pitch
  }

  /// Vertical field of view in degrees.
  pub fn zoom(&self) -> f32 {
    self.zoom
  }

  #[must_use]
  pub fn view_matrix(&self) -> Matrix4<f32> {
    Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
  }

  /// Moves along `front`/`right`. Held keys add up; diagonals are not normalized.
  pub fn process_keyboard(&mut self, direction: Direction, delta_time: f32) {
    let velocity = self.movement_speed * delta_time;
    match direction {
      Direction::Forward => self.position += self.front * velocity,
      Direction::Backward => self.position -= self.front * velocity,
      Direction::Left => self.position -= self.right * velocity,
      Direction::Right => self.position += self.right * velocity,
    }
  }

  pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32) {
    self.yaw += x_offset * self.mouse_sensitivity;
    self.pitch = (self.pitch + y_offset * self.mouse_sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    self.update_vectors();
  }

  pub fn process_mouse_scroll(&mut self, y_offset: f32) {
    self.zoom = (self.zoom - y_offset).clamp(MIN_ZOOM, MAX_ZOOM);
  }

  fn update_vectors(&mut self) {
    let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
    self.front = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
    self.right = self.front.cross(self.world_up).normalize();
    self.up = self.right.cross(self.front).normalize();
  }
}

pub struct Projection {
  pub aspect: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Projection {
  pub fn new(width: u32, height: u32) -> Self {
    let mut projection = Self {
      aspect: 1.0,
      znear: 0.1,
      zfar: 1000.0,
    };
    projection.resize(width, height);
    projection
  }

  pub fn resize(&mut self, width: u32, height: u32) {
    self.aspect = width as f32 / height.max(1) as f32;
  }

  #[must_use]
  pub fn matrix(&self, fovy: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::perspective(Deg(fovy), self.aspect, self.znear, self.zfar)
  }
}

/// Routes input into the camera. Relative motion turns the camera directly;
/// for absolute cursor samples the first one only seeds the reference position.
pub struct CameraController {
  pub camera: Camera,
  last_cursor: Option<(f32, f32)>,
}

impl CameraController {
  pub fn init(camera: Camera) -> Self {
    Self {
      camera,
      last_cursor: None,
    }
  }

  pub fn process_keyboard(&mut self, direction: Direction, delta_time: f32) {
    self.camera.process_keyboard(direction, delta_time);
  }

  /// Takes an absolute cursor position; y grows downwards as in window coordinates.
  pub fn process_mouse_movement(&mut self, x: f32, y: f32) {
    let (last_x, last_y) = self.last_cursor.unwrap_or((x, y));
    self.last_cursor = Some((x, y));
    self.camera.process_mouse_movement(x - last_x, last_y - y);
  }

  pub fn update_camera(&mut self, input: &dyn InputSource, delta_time: f32) {
    for (key, direction) in [
      (Key::Forward, Direction::Forward),
      (Key::Backward, Direction::Backward),
      (Key::Left, Direction::Left),
      (Key::Right, Direction::Right),
    ] {
      if input.is_key_down(key) {
        self.process_keyboard(direction, delta_time);
      }
    }
    for &(x, y) in input.cursor_samples() {
      self.process_mouse_movement(x, y);
    }
    let (dx, dy) = input.cursor_delta();
    if dx != 0.0 || dy != 0.0 {
      self.camera.process_mouse_movement(dx, -dy);
    }
    let scroll = input.scroll_delta();
    if scroll != 0.0 {
      self.camera.process_mouse_scroll(scroll);
    }
  }
}
