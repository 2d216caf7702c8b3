use crate::{Point, Rgb};
use std::borrow::Cow;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

/// Per-frame appearance of the cloud.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleUniform {
  model: [[f32; 4]; 4],
  color: [f32; 4],
  point_scale: [f32; 2],
  _pad: [f32; 2],
}

impl ParticleUniform {
  /// `size` is in world units; the quad is sized for a camera with vertical
  /// field of view `fovy` (degrees) and the given aspect ratio.
  #[must_use]
  pub fn new(rotation: f32, color: Rgb, size: f32, fovy: f32, aspect: f32) -> Self {
    let focal = 1.0 / (fovy.to_radians() / 2.0).tan();
    let [r, g, b] = color.to_array();
    Self {
      model: cgmath::Matrix4::from_angle_y(cgmath::Rad(rotation)).into(),
      color: [r, g, b, 1.0],
      point_scale: [size * focal / aspect.max(f32::EPSILON), size * focal],
      _pad: [0.0; 2],
    }
  }

  #[must_use]
  pub fn color(&self) -> [f32; 4] {
    self.color
  }
}

/// Corners of the billboard quad, drawn as a triangle strip.
const QUAD: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];

pub struct Render {
  render_pipeline: wgpu::RenderPipeline,
  instance_buffer: wgpu::Buffer,
  capacity: usize,
  count: u32,
  quad_buffer: wgpu::Buffer,
  params_buffer: wgpu::Buffer,
  params_bind_group: wgpu::BindGroup,
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
  device.create_buffer(&wgpu::BufferDescriptor {
    label: Some("Particle Positions"),
    size: (capacity.max(1) * std::mem::size_of::<Point>()) as u64,
    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    mapped_at_creation: false,
  })
}

impl Render {
  #[must_use]
  pub fn init(
    config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    capacity: usize,
  ) -> Self {
    let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("draw"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/draw.wgsl"))),
    });

    let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Particle Parameter Buffer"),
      size: std::mem::size_of::<ParticleUniform>() as u64,
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    let params_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ParticleUniform>() as _),
          },
          count: None,
        }],
        label: Some("particle_bind_group_layout"),
      });
    let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &params_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: params_buffer.as_entire_binding(),
      }],
      label: Some("particle_bind_group"),
    });

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("render"),
      bind_group_layouts: &[camera_bind_group_layout, &params_bind_group_layout],
      push_constant_ranges: &[],
    });
    let position_layout = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<Point>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![0 => Float32x3],
    };
    let quad_layout = wgpu::VertexBufferLayout {
      array_stride: 2 * 4,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![1 => Float32x2],
    };
    let additive = wgpu::BlendComponent {
      src_factor: wgpu::BlendFactor::One,
      dst_factor: wgpu::BlendFactor::One,
      operation: wgpu::BlendOperation::Add,
    };
    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Render Pipeline"),
      layout: Some(&render_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &draw_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[position_layout, quad_layout],
      },
      fragment: Some(wgpu::FragmentState {
        module: &draw_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(wgpu::ColorTargetState {
          format: config.view_formats[0],
          blend: Some(wgpu::BlendState {
            color: additive,
            alpha: additive,
          }),
          write_mask: wgpu::ColorWrites::ALL,
        })],
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

    let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Quad Buffer"),
      contents: bytemuck::cast_slice(&QUAD),
      usage: wgpu::BufferUsages::VERTEX,
    });

    Render {
      render_pipeline,
      instance_buffer: create_instance_buffer(device, capacity),
      capacity,
      count: 0,
      quad_buffer,
      params_buffer,
      params_bind_group,
    }
  }

  /// Uploads this frame's positions and appearance.
  pub fn update(
    &mut self,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    positions: &[Point],
    params: &ParticleUniform,
  ) {
    if positions.len() > self.capacity {
      log::debug!("growing particle buffer {} -> {}", self.capacity, positions.len());
      self.instance_buffer = create_instance_buffer(device, positions.len());
      self.capacity = positions.len();
    }
    queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(positions));
    queue.write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[*params]));
    self.count = u32::try_from(positions.len()).unwrap_or(u32::MAX);
  }

  pub fn render(
    &self,
    view: &wgpu::TextureView,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    camera_bind_group: &wgpu::BindGroup,
  ) {
    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
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
      rpass.set_pipeline(&self.render_pipeline);
      rpass.set_bind_group(0, camera_bind_group, &[]);
      rpass.set_bind_group(1, &self.params_bind_group, &[]);
      rpass.set_vertex_buffer(0, self.instance_buffer.slice(..));
      rpass.set_vertex_buffer(1, self.quad_buffer.slice(..));
      rpass.draw(0..QUAD.len() as u32, 0..self.count);
    }
    queue.submit(Some(command_encoder.finish()));
  }
}
