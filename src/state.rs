use crate::field::ParticleField;
use crate::render::Render;
use crate::screen::ScreenUniform;
use crate::FieldParams;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wgpu::util::DeviceExt;
use winit::{
  dpi::PhysicalSize,
  event::{ElementState, Event, KeyEvent, StartCause, WindowEvent},
  event_loop::{EventLoop, EventLoopWindowTarget},
  keyboard::{KeyCode, PhysicalKey},
  window::Window,
};

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str, width: u32, height: u32) -> Self {
    let event_loop = EventLoop::new().unwrap();
    let mut builder = winit::window::WindowBuilder::new();
    builder = builder
      .with_title(title)
      .with_inner_size(PhysicalSize::new(width, height));
    let window = Arc::new(builder.build(&event_loop).unwrap());

    Self { event_loop, window }
  }
}

struct SurfaceWrapper {
  surface: Option<wgpu::Surface<'static>>,
  config: Option<wgpu::SurfaceConfiguration>,
}

impl SurfaceWrapper {
  fn new() -> Self {
    Self {
      surface: None,
      config: None,
    }
  }

  fn resume(&mut self, context: &State, window: Arc<Window>) {
    let window_size = window.inner_size();
    let width = window_size.width.max(1);
    let height = window_size.height.max(1);
    self.surface = Some(context.instance.create_surface(window).unwrap());
    let surface = self.surface.as_ref().unwrap();
    let mut config = surface
      .get_default_config(&context.adapter, width, height)
      .unwrap();
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(&context.device, &config);
    self.config = Some(config);
  }

  fn resize(&mut self, context: &State, size: PhysicalSize<u32>) {
    let config = self.config.as_mut().unwrap();
    config.width = size.width.max(1);
    config.height = size.height.max(1);
    self
      .surface
      .as_ref()
      .unwrap()
      .configure(&context.device, config);
  }

  fn acquire(&mut self, context: &State) -> wgpu::SurfaceTexture {
    let surface = self.surface.as_ref().unwrap();

    match surface.get_current_texture() {
      Ok(frame) => frame,
      Err(wgpu::SurfaceError::Timeout) => surface.get_current_texture().unwrap(),
      Err(
        wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost | wgpu::SurfaceError::OutOfMemory,
      ) => {
        surface.configure(&context.device, self.config());
        surface.get_current_texture().unwrap()
      }
    }
  }

  fn config(&self) -> &wgpu::SurfaceConfiguration {
    self.config.as_ref().unwrap()
  }
}

struct State {
  instance: wgpu::Instance,
  adapter: wgpu::Adapter,
  device: wgpu::Device,
  queue: wgpu::Queue,
  field: ParticleField,
  screen_uniform: ScreenUniform,
  screen_buffer: wgpu::Buffer,
  screen_bind_group: wgpu::BindGroup,
  screen_bind_group_layout: wgpu::BindGroupLayout,
}

impl State {
  /// Window resize: reproject and rebuild the field at the new size.
  fn resize(&mut self, size: PhysicalSize<u32>) {
    let width = size.width.max(1) as f32;
    let height = size.height.max(1) as f32;
    self.field.resize(width, height);
    self.screen_uniform.update(width, height);
    self.queue.write_buffer(
      &self.screen_buffer,
      0,
      bytemuck::cast_slice(&[self.screen_uniform]),
    );
  }

  fn pointer_moved(&mut self, x: f32, y: f32) {
    self.field.pointer_moved(x, y);
  }

  fn update(&mut self) {
    self.field.tick();
  }

  async fn init(surface: &SurfaceWrapper, size: &PhysicalSize<u32>, params: FieldParams) -> Self {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: surface.surface.as_ref(),
        force_fallback_adapter: false,
      })
      .await
      .unwrap();

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
      .await
      .unwrap();

    let width = size.width.max(1) as f32;
    let height = size.height.max(1) as f32;
    let field = ParticleField::new(width, height, params);

    let mut screen_uniform = ScreenUniform::new();
    screen_uniform.update(width, height);

    let screen_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Screen Buffer"),
      contents: bytemuck::cast_slice(&[screen_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let screen_bind_group_layout =
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
        label: Some("screen_bind_group_layout"),
      });
    let screen_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &screen_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: screen_buffer.as_entire_binding(),
      }],
      label: Some("screen_bind_group"),
    });

    Self {
      instance,
      adapter,
      device,
      queue,
      field,
      screen_uniform,
      screen_buffer,
      screen_bind_group,
      screen_bind_group_layout,
    }
  }
}

async fn start(params: FieldParams, width: u32, height: u32) {
  let window_loop = EventLoopWrapper::new("Plexus", width, height);
  let mut surface = SurfaceWrapper::new();
  let mut context = State::init(&surface, &window_loop.window.inner_size(), params).await;
  let event_loop_function = EventLoop::run;
  let mut renderer = None;

  let _ = (event_loop_function)(
    window_loop.event_loop,
    move |event, target: &EventLoopWindowTarget<()>| match event {
      Event::NewEvents(StartCause::Init) => {
        surface.resume(&context, window_loop.window.clone());
        if renderer.is_none() {
          renderer = Some(Render::init(
            surface.config(),
            &context.adapter,
            &context.device,
            &context.queue,
            &context.screen_bind_group_layout,
          ));
        }
        window_loop.window.request_redraw();
      }
      Event::WindowEvent { event, window_id } if window_id == window_loop.window.id() => {
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
          WindowEvent::Resized(size) => {
            if surface.surface.is_some() {
              surface.resize(&context, size);
            }
            context.resize(size);
          }
          WindowEvent::CursorMoved { position, .. } => {
            context.pointer_moved(position.x as f32, position.y as f32);
          }
          WindowEvent::RedrawRequested => {
            // Re-arm the next frame before doing this one, the same
            // request-from-within-the-frame loop the effect was built on.
            window_loop.window.request_redraw();
            if renderer.is_none() {
              return;
            }
            context.update();
            if let Some(renderer) = &mut renderer {
              let frame = surface.acquire(&context);
              let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
                format: Some(surface.config().view_formats[0]),
                ..wgpu::TextureViewDescriptor::default()
              });
              renderer.render(
                &view,
                &context.device,
                &context.queue,
                &context.screen_bind_group,
                &context.field.particles,
                context.field.links(),
              );
              frame.present();
            }
          }
          _ => {}
        }
      }
      _ => {}
    },
  );
}

/// Window-less run loop at a fixed timestep, for smoke runs and profiling.
fn run_headless(params: FieldParams, width: u32, height: u32, frames: Option<u64>) {
  let mut field = ParticleField::new(width.max(1) as f32, height.max(1) as f32, params);
  let running = Arc::new(AtomicBool::new(true));
  {
    let running = running.clone();
    ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
      .expect("failed to install ctrl-c handler");
  }

  let mut frame: u64 = 0;
  while running.load(Ordering::SeqCst) {
    if let Some(frames) = frames {
      if frame >= frames {
        break;
      }
    }
    field.tick();
    if frame % 60 == 0 {
      log::info!(
        "frame {}: {} particles, {} links",
        frame,
        field.particles.len(),
        field.links().len()
      );
    }
    frame += 1;
    std::thread::sleep(Duration::from_millis(16));
  }
  log::info!("headless run finished after {} frames", frame);
}

pub fn run(params: FieldParams, width: u32, height: u32, headless: bool, frames: Option<u64>) {
  env_logger::init();
  if headless {
    run_headless(params, width, height, frames);
  } else {
    pollster::block_on(start(params, width, height));
  }
}
