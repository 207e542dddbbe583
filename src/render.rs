use crate::{Link, Particle};
use std::borrow::Cow;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

/// Backdrop behind the network, a near-black navy.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
  r: 0.012,
  g: 0.016,
  b: 0.045,
  a: 1.0,
};

/// One endpoint of a connection line.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct LinkVertex {
  pos: [f32; 2],
  alpha: f32,
}

fn link_vertices(links: &[Link]) -> Vec<LinkVertex> {
  let mut vertices = Vec::with_capacity(links.len() * 2);
  for link in links {
    vertices.push(LinkVertex {
      pos: link.a,
      alpha: link.alpha,
    });
    vertices.push(LinkVertex {
      pos: link.b,
      alpha: link.alpha,
    });
  }
  vertices
}

pub struct Render {
  dot_pipeline: wgpu::RenderPipeline,
  link_pipeline: wgpu::RenderPipeline,
  quad_buffer: wgpu::Buffer,
  particle_buffer: wgpu::Buffer,
  particle_capacity: usize,
  link_buffer: wgpu::Buffer,
  link_capacity: usize,
}

impl Render {
  #[must_use]
  pub fn init(
    config: &wgpu::SurfaceConfiguration,
    _adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    _queue: &wgpu::Queue,
    screen_bind_group_layout: &wgpu::BindGroupLayout,
  ) -> Self {
    let dot_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: None,
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/dots.wgsl"))),
    });
    let link_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: None,
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/links.wgsl"))),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("plexus"),
      bind_group_layouts: &[screen_bind_group_layout],
      push_constant_ranges: &[],
    });

    let target = wgpu::ColorTargetState {
      format: config.view_formats[0],
      blend: Some(wgpu::BlendState::ALPHA_BLENDING),
      write_mask: wgpu::ColorWrites::ALL,
    };

    let particle_layout = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<Particle>() as _, // pos2 + vel2 + radius
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32],
    };
    let quad_layout = wgpu::VertexBufferLayout {
      array_stride: 2 * 4,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![3 => Float32x2],
    };
    let dot_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Dot Pipeline"),
      layout: Some(&pipeline_layout),
      vertex: wgpu::VertexState {
        module: &dot_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[particle_layout, quad_layout],
      },
      fragment: Some(wgpu::FragmentState {
        module: &dot_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(target.clone())],
      }),
      primitive: wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleStrip,
        ..wgpu::PrimitiveState::default()
      },
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    let link_layout = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<LinkVertex>() as _,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32],
    };
    let link_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Link Pipeline"),
      layout: Some(&pipeline_layout),
      vertex: wgpu::VertexState {
        module: &link_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[link_layout],
      },
      fragment: Some(wgpu::FragmentState {
        module: &link_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(target)],
      }),
      primitive: wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::LineList,
        ..wgpu::PrimitiveState::default()
      },
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Quad Buffer"),
      contents: bytemuck::cast_slice(&[-1.0f32, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0]),
      usage: wgpu::BufferUsages::VERTEX,
    });

    let particle_capacity = 256;
    let particle_buffer = Self::vertex_buffer(
      device,
      "Particle Buffer",
      particle_capacity * std::mem::size_of::<Particle>(),
    );
    let link_capacity = 1024;
    let link_buffer = Self::vertex_buffer(
      device,
      "Link Buffer",
      link_capacity * 2 * std::mem::size_of::<LinkVertex>(),
    );

    Render {
      dot_pipeline,
      link_pipeline,
      quad_buffer,
      particle_buffer,
      particle_capacity,
      link_buffer,
      link_capacity,
    }
  }

  fn vertex_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
      label: Some(label),
      size: size as u64,
      usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    })
  }

  fn ensure_capacity(&mut self, device: &wgpu::Device, particles: usize, links: usize) {
    if particles > self.particle_capacity {
      self.particle_capacity = particles.next_power_of_two();
      self.particle_buffer = Self::vertex_buffer(
        device,
        "Particle Buffer",
        self.particle_capacity * std::mem::size_of::<Particle>(),
      );
    }
    if links > self.link_capacity {
      self.link_capacity = links.next_power_of_two();
      self.link_buffer = Self::vertex_buffer(
        device,
        "Link Buffer",
        self.link_capacity * 2 * std::mem::size_of::<LinkVertex>(),
      );
    }
  }

  pub fn render(
    &mut self,
    view: &wgpu::TextureView,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    screen_bind_group: &wgpu::BindGroup,
    particles: &[Particle],
    links: &[Link],
  ) {
    self.ensure_capacity(device, particles.len(), links.len());
    if !particles.is_empty() {
      queue.write_buffer(&self.particle_buffer, 0, bytemuck::cast_slice(particles));
    }
    let vertices = link_vertices(links);
    if !vertices.is_empty() {
      queue.write_buffer(&self.link_buffer, 0, bytemuck::cast_slice(&vertices));
    }

    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
        store: wgpu::StoreOp::Store,
      },
    })];
    let render_pass_descriptor = wgpu::RenderPassDescriptor {
      label: None,
      color_attachments: &color_attachments,
      depth_stencil_attachment: None,
      timestamp_writes: None,
      occlusion_query_set: None,
    };
    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);
      rpass.set_bind_group(0, screen_bind_group, &[]);
      // Links underneath, dots on top.
      if !vertices.is_empty() {
        rpass.set_pipeline(&self.link_pipeline);
        rpass.set_vertex_buffer(0, self.link_buffer.slice(..));
        rpass.draw(0..vertices.len() as u32, 0..1);
      }
      if !particles.is_empty() {
        rpass.set_pipeline(&self.dot_pipeline);
        rpass.set_vertex_buffer(0, self.particle_buffer.slice(..));
        rpass.set_vertex_buffer(1, self.quad_buffer.slice(..));
        rpass.draw(0..4, 0..particles.len() as u32);
      }
    }
    queue.submit(Some(command_encoder.finish()));
  }
}
