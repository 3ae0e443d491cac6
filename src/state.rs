use crate::assets::{cubemap_paths, load_cubemap, load_image};
use crate::bodies::SolarSystem;
use crate::camera::{Camera, CameraController, Projection};
use crate::error::{Error, Result};
use crate::frame::{FrameClock, FramePlan};
use crate::input::{InputSource, Key, WinitInput};
use crate::render::{RenderContext, Shading};
use crate::sphere::generate_sphere;
use crate::{AppConfig, LightParams};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use winit::{
  dpi::PhysicalSize,
  event::{Event, StartCause, WindowEvent},
  event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
  window::{CursorGrabMode, Window},
};

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
    let event_loop = EventLoop::new()?;
    let builder = winit::window::WindowBuilder::new()
      .with_title(title)
      .with_inner_size(PhysicalSize::new(width, height));
    let window = Arc::new(builder.build(&event_loop)?);

    Ok(Self { event_loop, window })
  }
}

struct SurfaceWrapper {
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
}

impl SurfaceWrapper {
  fn new(
    context: &State,
    surface: wgpu::Surface<'static>,
    size: PhysicalSize<u32>,
    vsync: bool,
  ) -> Result<Self> {
    let mut config = surface
      .get_default_config(&context.adapter, size.width.max(1), size.height.max(1))
      .ok_or(Error::SurfaceUnsupported)?;
    config.present_mode = if vsync {
      wgpu::PresentMode::AutoVsync
    } else {
      wgpu::PresentMode::AutoNoVsync
    };
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(&context.device, &config);
    Ok(Self { surface, config })
  }

  fn resize(&mut self, context: &State, size: PhysicalSize<u32>) {
    self.config.width = size.width.max(1);
    self.config.height = size.height.max(1);
    self.surface.configure(&context.device, &self.config);
  }

  fn acquire(&mut self, context: &State) -> Option<wgpu::SurfaceTexture> {
    match self.surface.get_current_texture() {
      Ok(frame) => Some(frame),
      Err(wgpu::SurfaceError::Timeout) => self.surface.get_current_texture().ok(),
      Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
        self.surface.configure(&context.device, &self.config);
        self.surface.get_current_texture().ok()
      }
      Err(err) => {
        log::error!("failed to acquire frame: {err}");
        None
      }
    }
  }

  fn config(&self) -> &wgpu::SurfaceConfiguration {
    &self.config
  }
}

struct State {
  adapter: wgpu::Adapter,
  device: wgpu::Device,
  queue: wgpu::Queue,
}

impl State {
  async fn init(window: Arc<Window>) -> Result<(Self, wgpu::Surface<'static>)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });
    let surface = instance.create_surface(window)?;

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
      })
      .await
      .ok_or(Error::NoAdapter)?;
    log::info!("using adapter {:?}", adapter.get_info().name);

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await?;

    Ok((
      Self {
        adapter,
        device,
        queue,
      },
      surface,
    ))
  }
}

/// Everything the frame loop mutates.
struct Scene {
  system: SolarSystem,
  controller: CameraController,
  input: WinitInput,
  projection: Projection,
  light: LightParams,
  clock: FrameClock,
  started: Instant,
  render: RenderContext,
}

impl Scene {
  fn resize(&mut self, context: &State, surface: &mut SurfaceWrapper, size: PhysicalSize<u32>) {
    log::debug!("resized to {}x{}", size.width, size.height);
    surface.resize(context, size);
    self.render.resize(&context.device, surface.config());
    self.projection.resize(size.width, size.height);
  }

  /// One iteration: latch input, advance time, move the camera, draw.
  fn frame(&mut self, context: &State, surface: &mut SurfaceWrapper, exit: &AtomicBool) {
    self.input.poll_events();
    if self.input.is_key_down(Key::Quit) {
      exit.store(true, Ordering::Relaxed);
      return;
    }
    self.clock.tick(self.started.elapsed().as_secs_f32());
    self
      .controller
      .update_camera(&self.input, self.clock.delta_time);

    let plan = FramePlan::build(
      self.system.bodies(),
      &self.controller.camera,
      &self.projection,
      &self.light,
      self.clock.current_time,
    );

    let Some(frame) = surface.acquire(context) else {
      return;
    };
    let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
      format: surface.config().view_formats.first().copied(),
      ..wgpu::TextureViewDescriptor::default()
    });
    self
      .render
      .render(&view, &context.device, &context.queue, &plan);
    frame.present();
  }
}

/// Hides and pins the pointer. Mouse look reads raw device motion, so either
/// grab mode works; locked keeps the pointer from drifting.
fn grab_cursor(window: &Window) {
  let grabbed = window
    .set_cursor_grab(CursorGrabMode::Locked)
    .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
  if let Err(err) = grabbed {
    log::warn!("cursor grab unavailable: {err}");
  }
  window.set_cursor_visible(false);
}

async fn start(config: AppConfig) -> Result<()> {
  // Geometry is validated before any window or GPU resource exists.
  let sphere = config.sphere;
  let mesh = generate_sphere(
    sphere.radius,
    sphere.horizontal_segments,
    sphere.vertical_segments,
  )?;
  log::info!(
    "generated sphere: {} vertices, {} triangles",
    mesh.vertex_count(),
    mesh.triangle_count()
  );

  let system = SolarSystem::default();
  let body_textures = system
    .bodies()
    .iter()
    .map(|body| load_image(&config.assets.join(&body.texture)))
    .collect::<Result<Vec<_>>>()?;
  let cubemap = load_cubemap(&cubemap_paths(&config.assets))?;
  log::info!("loaded {} body textures and skybox", body_textures.len());

  let exit = Arc::new(AtomicBool::new(false));
  {
    let exit = exit.clone();
    ctrlc::set_handler(move || exit.store(true, Ordering::Relaxed))?;
  }

  let window_loop = EventLoopWrapper::new("Solar System", config.width, config.height)?;
  let (context, surface) = State::init(window_loop.window.clone()).await?;
  let size = window_loop.window.inner_size();
  let mut surface = SurfaceWrapper::new(&context, surface, size, config.vsync)?;

  let shading = if config.lit {
    Shading::Phong
  } else {
    Shading::Textured
  };
  let render = RenderContext::init(
    surface.config(),
    &context.device,
    &context.queue,
    &mesh,
    &body_textures,
    &cubemap,
    shading,
  )?;
  drop(body_textures);

  let [x, y, z] = config.camera.position;
  let mut scene = Scene {
    system,
    controller: CameraController::init(Camera::new((x, y, z).into(), &config.camera)),
    input: WinitInput::new(),
    projection: Projection::new(size.width, size.height),
    light: config.light,
    clock: FrameClock::default(),
    started: Instant::now(),
    render,
  };

  let window = window_loop.window;
  window_loop.event_loop.run(
    move |event, target: &EventLoopWindowTarget<()>| match event {
      Event::NewEvents(StartCause::Init) => {
        target.set_control_flow(ControlFlow::Poll);
        grab_cursor(&window);
      }
      Event::WindowEvent { event, window_id } if window_id == window.id() => {
        if scene.input.process_events(&event) {
          return;
        }
        match event {
          WindowEvent::CloseRequested => exit.store(true, Ordering::Relaxed),
          WindowEvent::Resized(size) => scene.resize(&context, &mut surface, size),
          WindowEvent::Focused(true) => grab_cursor(&window),
          WindowEvent::RedrawRequested => scene.frame(&context, &mut surface, &exit),
          _ => {}
        }
      }
      Event::DeviceEvent { event, .. } => scene.input.process_device_event(&event),
      Event::AboutToWait => {
        if exit.load(Ordering::Relaxed) {
          log::info!("exiting");
          target.exit();
        } else {
          window.request_redraw();
        }
      }
      _ => {}
    },
  )?;
  Ok(())
}

pub fn run(config: AppConfig) -> Result<()> {
  pollster::block_on(start(config))
}
