use crate::camera::{Camera, CameraController, CameraUniform};
use crate::error::{Error, Result};
use crate::gesture::{CursorHand, HandSource};
use crate::physics::{Interaction, PointCloud};
use crate::render::{ParticleUniform, Render};
use crate::shapes::Shape;
use crate::{CameraParams, Mode, Rgb, Settings};
use rand::{rngs::SmallRng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::{
  dpi::{LogicalSize, PhysicalSize},
  event::{Event, KeyEvent, WindowEvent},
  event_loop::{EventLoop, EventLoopWindowTarget},
  window::Window,
};

const SIZE_STEP: f32 = 1.25;
const STATS_INTERVAL: u64 = 60;

/// Everything that changes from frame to frame, independent of any window.
pub struct Simulation {
  pub settings: Settings,
  pub cloud: PointCloud,
  pub interaction: Interaction,
  /// Accumulated rotation of the whole cloud about +Y.
  pub rotation: f32,
}

impl Simulation {
  #[must_use]
  pub fn new(settings: Settings) -> Self {
    let rng = settings
      .seed
      .map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);
    let cloud = PointCloud::new(settings.particle_count as usize, settings.shape, rng);
    let interaction = Interaction::new(settings.mode);
    log::info!(
      "{} particles as {:?} in {:?} mode",
      cloud.len(),
      settings.shape,
      settings.mode
    );
    Self {
      settings,
      cloud,
      interaction,
      rotation: 0.0,
    }
  }

  /// Advances one frame. The hand source is only consulted in camera mode.
  pub fn frame(&mut self, hand: Option<&mut dyn HandSource>) {
    if self.interaction.mode == Mode::Camera {
      let landmarks = hand.and_then(|source| source.poll());
      self
        .interaction
        .observe_hand(landmarks.as_ref(), self.settings.sensitivity);
    }
    self.cloud.tick(&mut self.interaction);
    self.rotation += self.settings.rotation;
  }

  pub fn set_shape(&mut self, shape: Shape) {
    log::info!("shape -> {shape:?}");
    self.settings.shape = shape;
    self.cloud.set_shape(shape);
  }

  pub fn set_mode(&mut self, mode: Mode) {
    log::info!("mode -> {mode:?}");
    self.settings.mode = mode;
    self.interaction.mode = mode;
  }

  pub fn explode(&mut self) {
    log::info!("explode");
    self.interaction.explode();
  }

  pub fn firework(&mut self) {
    if let Some([x, y, z]) = self.cloud.firework(&mut self.interaction) {
      log::info!("firework at ({x:.1}, {y:.1}, {z:.1})");
    }
  }

  pub fn set_color(&mut self, color: Rgb) {
    log::info!("color -> ({:.2}, {:.2}, {:.2})", color.r, color.g, color.b);
    self.settings.color = color;
  }

  /// Appearance of the cloud for the next draw.
  #[must_use]
  pub fn uniform(&self, fovy: f32, aspect: f32) -> ParticleUniform {
    ParticleUniform::new(
      self.rotation,
      self.settings.color,
      self.settings.size,
      fovy,
      aspect,
    )
  }

  pub fn scale_size(&mut self, factor: f32) {
    self.settings.size = (self.settings.size * factor).clamp(0.01, 5.0);
    log::debug!("size -> {:.3}", self.settings.size);
  }

  /// Applies a pressed key. Returns true if the key meant something.
  pub fn key(&mut self, keycode: KeyCode) -> bool {
    if let Some(shape) = digit(keycode).and_then(Shape::from_digit) {
      self.set_shape(shape);
      return true;
    }
    match keycode {
      KeyCode::Tab => self.set_shape(self.settings.shape.next()),
      KeyCode::KeyM => self.set_mode(self.settings.mode.toggled()),
      KeyCode::Space => self.explode(),
      KeyCode::KeyF => self.firework(),
      KeyCode::KeyC => self.set_color(self.settings.color.next_in_palette()),
      KeyCode::Equal | KeyCode::NumpadAdd => self.scale_size(SIZE_STEP),
      KeyCode::Minus | KeyCode::NumpadSubtract => self.scale_size(1.0 / SIZE_STEP),
      _ => return false,
    }
    true
  }

  fn title(&self) -> String {
    format!(
      "Particle Shapes - {:?} ({:?} mode)",
      self.settings.shape, self.settings.mode
    )
  }
}

fn digit(keycode: KeyCode) -> Option<u32> {
  Some(match keycode {
    KeyCode::Digit1 | KeyCode::Numpad1 => 1,
    KeyCode::Digit2 | KeyCode::Numpad2 => 2,
    KeyCode::Digit3 | KeyCode::Numpad3 => 3,
    KeyCode::Digit4 | KeyCode::Numpad4 => 4,
    KeyCode::Digit5 | KeyCode::Numpad5 => 5,
    KeyCode::Digit6 | KeyCode::Numpad6 => 6,
    KeyCode::Digit7 | KeyCode::Numpad7 => 7,
    _ => return None,
  })
}

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str) -> Result<Self> {
    let event_loop = EventLoop::new()?;
    let window = winit::window::WindowBuilder::new()
      .with_title(title)
      .with_inner_size(LogicalSize::new(1280.0, 720.0))
      .build(&event_loop)?;
    Ok(Self {
      event_loop,
      window: Arc::new(window),
    })
  }
}

struct SurfaceWrapper {
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
}

impl SurfaceWrapper {
  fn new(surface: wgpu::Surface<'static>, context: &State, size: PhysicalSize<u32>) -> Result<Self> {
    let mut config = surface
      .get_default_config(&context.adapter, size.width.max(1), size.height.max(1))
      .ok_or(Error::SurfaceConfig)?;
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

  /// Next frame to draw into, or None when this frame should be skipped.
  fn acquire(&mut self, context: &State) -> Option<wgpu::SurfaceTexture> {
    match self.surface.get_current_texture() {
      Ok(frame) => Some(frame),
      Err(wgpu::SurfaceError::Timeout) => {
        log::warn!("surface timed out, skipping frame");
        None
      }
      Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
        self.surface.configure(&context.device, &self.config);
        self
          .surface
          .get_current_texture()
          .map_err(|e| log::warn!("surface unavailable after reconfigure: {e}"))
          .ok()
      }
      Err(e) => {
        log::error!("failed to acquire frame: {e}");
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
  camera: Camera,
  camera_uniform: CameraUniform,
  camera_buffer: wgpu::Buffer,
  camera_bind_group: wgpu::BindGroup,
  camera_controller: CameraController,
  camera_bind_group_layout: wgpu::BindGroupLayout,
}

impl State {
  fn input(&mut self, event: &WindowEvent) -> bool {
    self.camera_controller.process_events(event)
  }

  fn update(&mut self) {
    self.camera_controller.update_camera(&mut self.camera);
    self.camera_uniform.update_view_proj(&self.camera);
    self.queue.write_buffer(
      &self.camera_buffer,
      0,
      bytemuck::cast_slice(&[self.camera_uniform]),
    );
  }

  async fn init(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'static>,
    size: &PhysicalSize<u32>,
  ) -> Result<Self> {
    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(surface),
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

    let camera = Camera::new(size.width.max(1) as f32 / size.height.max(1) as f32);
    let mut camera_uniform = CameraUniform::default();
    camera_uniform.update_view_proj(&camera);

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Camera Buffer"),
      contents: bytemuck::cast_slice(&[camera_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let camera_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        }],
        label: Some("camera_bind_group_layout"),
      });
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &camera_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: camera_buffer.as_entire_binding(),
      }],
      label: Some("camera_bind_group"),
    });
    let camera_controller = CameraController::init(&CameraParams::default());

    Ok(Self {
      adapter,
      device,
      queue,
      camera,
      camera_uniform,
      camera_buffer,
      camera_bind_group,
      camera_controller,
      camera_bind_group_layout,
    })
  }
}

/// Mouse events feeding explosions and the cursor-driven hand.
fn pointer_input(sim: &mut Simulation, hand: &mut CursorHand, event: &WindowEvent, size: PhysicalSize<u32>) {
  match event {
    WindowEvent::MouseInput {
      state: ElementState::Pressed,
      button: MouseButton::Left,
      ..
    } if sim.interaction.mode == Mode::Mouse => sim.explode(),
    WindowEvent::CursorMoved { position, .. } => {
      hand.cursor_moved(position.x, position.y, size.width, size.height);
    }
    WindowEvent::CursorLeft { .. } => hand.cursor_left(),
    WindowEvent::MouseWheel { delta, .. } => {
      let lines = match delta {
        MouseScrollDelta::LineDelta(_, y) => *y,
        MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
      };
      hand.scroll(lines);
    }
    _ => {}
  }
}

async fn start(settings: Settings) -> Result<()> {
  let EventLoopWrapper { event_loop, window } = EventLoopWrapper::new("Particle Shapes")?;
  let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
    #[cfg(not(target_arch = "wasm32"))]
    backends: wgpu::Backends::PRIMARY,
    ..Default::default()
  });
  let size = window.inner_size();
  let surface = instance.create_surface(window.clone())?;
  let mut context = State::init(&instance, &surface, &size).await?;
  let mut surface = SurfaceWrapper::new(surface, &context, size)?;

  let mut sim = Simulation::new(settings);
  let mut hand = CursorHand::new();
  let mut render = Render::init(
    surface.config(),
    &context.device,
    &context.camera_bind_group_layout,
    sim.cloud.len(),
  );
  window.set_title(&sim.title());

  event_loop.run(move |event, target: &EventLoopWindowTarget<()>| match event {
    Event::WindowEvent { event, window_id } if window_id == window.id() => {
      pointer_input(&mut sim, &mut hand, &event, window.inner_size());
      if context.input(&event) {
        return;
      }
      match event {
        WindowEvent::CloseRequested
        | WindowEvent::KeyboardInput {
          event:
            KeyEvent {
              state: ElementState::Pressed,
              physical_key: PhysicalKey::Code(KeyCode::Escape),
              ..
            },
          ..
        } => target.exit(),
        WindowEvent::KeyboardInput {
          event:
            KeyEvent {
              state: ElementState::Pressed,
              physical_key: PhysicalKey::Code(keycode),
              repeat: false,
              ..
            },
          ..
        } => {
          if sim.key(keycode) {
            window.set_title(&sim.title());
          }
        }
        WindowEvent::Resized(new_size) => {
          surface.resize(&context, new_size);
          context.camera.resize(new_size.width, new_size.height);
        }
        WindowEvent::RedrawRequested => {
          sim.frame(Some(&mut hand));
          context.update();
          let params = sim.uniform(context.camera.fovy, context.camera.aspect);
          render.update(&context.device, &context.queue, sim.cloud.positions(), &params);
          if let Some(frame) = surface.acquire(&context) {
            let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
              format: Some(surface.config().view_formats[0]),
              ..wgpu::TextureViewDescriptor::default()
            });
            render.render(&view, &context.device, &context.queue, &context.camera_bind_group);
            frame.present();
          }
        }
        _ => {}
      }
    }
    Event::AboutToWait => window.request_redraw(),
    _ => {}
  })?;
  Ok(())
}

/// Opens a window and runs until it is closed.
pub fn run(settings: Settings) -> Result<()> {
  pollster::block_on(start(settings))
}

/// Runs the simulation without a window for `frames` frames, or until Ctrl-C
/// when `frames` is zero.
pub fn run_headless(settings: Settings, frames: u64) -> Result<()> {
  let running = Arc::new(AtomicBool::new(true));
  let handler_flag = running.clone();
  ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

  let mut sim = Simulation::new(settings);
  let mut frame = 0u64;
  while running.load(Ordering::SeqCst) && (frames == 0 || frame < frames) {
    sim.frame(None);
    frame += 1;
    if frame % STATS_INTERVAL == 0 {
      let stats = sim.cloud.stats();
      log::info!(
        "frame {frame}: centroid {:?}, mean error {:.4}, factor {:.4}",
        stats.centroid,
        stats.mean_error,
        sim.interaction.factor()
      );
    }
  }

  let stats = sim.cloud.stats();
  println!(
    "{:?}: {} particles after {frame} frames, centroid [{:.3}, {:.3}, {:.3}], mean error {:.4}",
    sim.settings.shape,
    sim.cloud.len(),
    stats.centroid[0],
    stats.centroid[1],
    stats.centroid[2],
    stats.mean_error
  );
  Ok(())
}
