use std::collections::{HashSet, VecDeque};
use winit::{
  event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
  Forward,
  Backward,
  Left,
  Right,
  Quit,
}

impl Key {
  pub fn from_keycode(keycode: KeyCode) -> Option<Self> {
    match keycode {
      KeyCode::KeyW | KeyCode::ArrowUp => Some(Key::Forward),
      KeyCode::KeyS | KeyCode::ArrowDown => Some(Key::Backward),
      KeyCode::KeyA | KeyCode::ArrowLeft => Some(Key::Left),
      KeyCode::KeyD | KeyCode::ArrowRight => Some(Key::Right),
      KeyCode::Escape => Some(Key::Quit),
      _ => None,
    }
  }
}

/// Per-frame view of user input.
///
/// `poll_events` latches whatever arrived since the previous call; the
/// accessors then describe that frame until the next poll.
pub trait InputSource {
  fn poll_events(&mut self);
  fn is_key_down(&self, key: Key) -> bool;
  /// Absolute cursor positions reported this frame, oldest first.
  fn cursor_samples(&self) -> &[(f32, f32)];
  /// Relative pointer motion this frame in window axes (x right, y down).
  /// Unbounded by the window edge.
  fn cursor_delta(&self) -> (f32, f32);
  fn scroll_delta(&self) -> f32;
}

/// Input gathered from winit events. Mouse look comes from raw device
/// motion so a grabbed cursor never runs into the window edge.
pub struct WinitInput {
  held: HashSet<Key>,
  focused: bool,
  pending_delta: (f32, f32),
  pending_scroll: f32,
  delta: (f32, f32),
  scroll: f32,
}

impl Default for WinitInput {
  fn default() -> Self {
    Self {
      held: HashSet::new(),
      focused: true,
      pending_delta: (0.0, 0.0),
      pending_scroll: 0.0,
      delta: (0.0, 0.0),
      scroll: 0.0,
    }
  }
}

impl WinitInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Records `event`; returns true when it was an input event this source consumed.
  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => match Key::from_keycode(*keycode) {
        Some(key) => {
          if *state == ElementState::Pressed {
            self.held.insert(key);
          } else {
            self.held.remove(&key);
          }
          true
        }
        None => false,
      },
      WindowEvent::Focused(focused) => {
        self.focused = *focused;
        if !focused {
          // Releases that happen elsewhere never reach us.
          self.held.clear();
          self.pending_delta = (0.0, 0.0);
        }
        false
      }
      WindowEvent::MouseWheel { delta, .. } => {
        self.pending_scroll += match delta {
          MouseScrollDelta::LineDelta(_, y) => *y,
          MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
        };
        true
      }
      _ => false,
    }
  }

  /// Accumulates raw mouse motion while the window has focus.
  pub fn process_device_event(&mut self, event: &DeviceEvent) {
    if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
      if self.focused {
        self.pending_delta.0 += *dx as f32;
        self.pending_delta.1 += *dy as f32;
      }
    }
  }
}

impl InputSource for WinitInput {
  fn poll_events(&mut self) {
    self.delta = std::mem::take(&mut self.pending_delta);
    self.scroll = std::mem::take(&mut self.pending_scroll);
  }

  fn is_key_down(&self, key: Key) -> bool {
    self.held.contains(&key)
  }

  fn cursor_samples(&self) -> &[(f32, f32)] {
    &[]
  }

  fn cursor_delta(&self) -> (f32, f32) {
    self.delta
  }

  fn scroll_delta(&self) -> f32 {
    self.scroll
  }
}

#[derive(Clone, Debug, Default)]
pub struct InputFrame {
  pub keys: Vec<Key>,
  pub cursor: Vec<(f32, f32)>,
  pub delta: (f32, f32),
  pub scroll: f32,
}

/// Replays a fixed list of frames; once exhausted every frame is empty.
#[derive(Default)]
pub struct ScriptedInput {
  frames: VecDeque<InputFrame>,
  current: InputFrame,
}

impl ScriptedInput {
  pub fn new(frames: Vec<InputFrame>) -> Self {
    Self {
      frames: frames.into(),
      current: InputFrame::default(),
    }
  }

  pub fn remaining(&self) -> usize {
    self.frames.len()
  }
}

impl InputSource for ScriptedInput {
  fn poll_events(&mut self) {
    self.current = self.frames.pop_front().unwrap_or_default();
  }

  fn is_key_down(&self, key: Key) -> bool {
    self.current.keys.contains(&key)
  }

  fn cursor_samples(&self) -> &[(f32, f32)] {
    &self.current.cursor
  }

  fn cursor_delta(&self) -> (f32, f32) {
    self.current.delta
  }

  fn scroll_delta(&self) -> f32 {
    self.current.scroll
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_movement_keys() {
    assert_eq!(Key::from_keycode(KeyCode::KeyW), Some(Key::Forward));
    assert_eq!(Key::from_keycode(KeyCode::ArrowLeft), Some(Key::Left));
    assert_eq!(Key::from_keycode(KeyCode::Escape), Some(Key::Quit));
    assert_eq!(Key::from_keycode(KeyCode::KeyQ), None);
  }

  #[test]
  fn scripted_frames_run_out() {
    let mut input = ScriptedInput::new(vec![InputFrame {
      keys: vec![Key::Quit],
      ..Default::default()
    }]);
    assert!(!input.is_key_down(Key::Quit));
    input.poll_events();
    assert!(input.is_key_down(Key::Quit));
    assert_eq!(input.remaining(), 0);
    input.poll_events();
    assert!(!input.is_key_down(Key::Quit));
    assert!(input.cursor_samples().is_empty());
  }

  fn motion(dx: f64, dy: f64) -> DeviceEvent {
    DeviceEvent::MouseMotion { delta: (dx, dy) }
  }

  #[test]
  fn winit_input_latches_on_poll() {
    let mut input = WinitInput::new();
    input.process_device_event(&motion(1.0, 2.0));
    input.process_device_event(&motion(3.0, -1.0));
    input.pending_scroll = 1.5;
    assert_eq!(input.cursor_delta(), (0.0, 0.0));
    input.poll_events();
    assert_eq!(input.cursor_delta(), (4.0, 1.0));
    assert_eq!(input.scroll_delta(), 1.5);
    input.poll_events();
    assert_eq!(input.cursor_delta(), (0.0, 0.0));
    assert_eq!(input.scroll_delta(), 0.0);
  }

  #[test]
  fn losing_focus_releases_keys() {
    let mut input = WinitInput::new();
    input.held.insert(Key::Forward);
    input.process_device_event(&motion(5.0, 0.0));
    assert!(!input.process_events(&WindowEvent::Focused(false)));
    input.poll_events();
    assert!(!input.is_key_down(Key::Forward));
    assert_eq!(input.cursor_delta(), (0.0, 0.0));

    input.process_device_event(&motion(5.0, 0.0));
    input.poll_events();
    assert_eq!(input.cursor_delta(), (0.0, 0.0));

    input.process_events(&WindowEvent::Focused(true));
    input.process_device_event(&motion(5.0, 0.0));
    input.poll_events();
    assert_eq!(input.cursor_delta(), (5.0, 0.0));
  }
}
