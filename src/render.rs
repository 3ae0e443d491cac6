use crate::assets::ImageData;
use crate::error::{Error, Result};
use crate::frame::{FramePlan, InstanceUniform, SkyboxUniform};
use crate::lighting::LightingUniform;
use crate::sphere::{Mesh, Vertex};
use crate::texture::{depth_view, Texture};
use std::borrow::Cow;
use std::mem::size_of;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

pub const SKYBOX_VERTEX_COUNT: u32 = 36;

#[rustfmt::skip]
pub const SKYBOX_VERTICES: [f32; 3 * SKYBOX_VERTEX_COUNT as usize] = [
  -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,
   1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,

  -1.0, -1.0,  1.0,  -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,
  -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,

   1.0, -1.0, -1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,
   1.0,  1.0,  1.0,   1.0,  1.0, -1.0,   1.0, -1.0, -1.0,

  -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,
   1.0,  1.0,  1.0,   1.0, -1.0,  1.0,  -1.0, -1.0,  1.0,

  -1.0,  1.0, -1.0,   1.0,  1.0, -1.0,   1.0,  1.0,  1.0,
   1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,

  -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0, -1.0,
   1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,
];

/// Which program shades the planets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shading {
  Textured,
  Phong,
}

/// Distance between per-instance uniform slots in the dynamic-offset buffer.
#[must_use]
pub fn instance_stride(alignment: u32) -> u64 {
  wgpu::util::align_to(size_of::<InstanceUniform>() as u64, u64::from(alignment.max(1)))
}

/// Packs instance uniforms into `stride`-spaced slots.
#[must_use]
pub fn pack_instances(instances: &[InstanceUniform], stride: u64) -> Vec<u8> {
  let stride = stride as usize;
  let mut bytes = vec![0u8; stride * instances.len()];
  for (slot, instance) in bytes.chunks_exact_mut(stride).zip(instances) {
    slot[..size_of::<InstanceUniform>()].copy_from_slice(bytemuck::bytes_of(instance));
  }
  bytes
}

/// Runs `create` inside a validation scope so shader and pipeline errors
/// come back as values instead of hitting the uncaptured error handler.
fn validated<T>(device: &wgpu::Device, label: &str, create: impl FnOnce() -> T) -> Result<T> {
  device.push_error_scope(wgpu::ErrorFilter::Validation);
  let value = create();
  match pollster::block_on(device.pop_error_scope()) {
    Some(err) => Err(Error::Shader {
      label: label.to_string(),
      message: err.to_string(),
    }),
    None => Ok(value),
  }
}

fn shader_module(device: &wgpu::Device, label: &str, source: &'static str) -> Result<wgpu::ShaderModule> {
  validated(device, label, || {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some(label),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
    })
  })
}

fn uniform_layout_entry(visibility: wgpu::ShaderStages, dynamic: bool, size: usize) -> wgpu::BindGroupLayoutEntry {
  wgpu::BindGroupLayoutEntry {
    binding: 0,
    visibility,
    ty: wgpu::BindingType::Buffer {
      ty: wgpu::BufferBindingType::Uniform,
      has_dynamic_offset: dynamic,
      min_binding_size: wgpu::BufferSize::new(size as _),
    },
    count: None,
  }
}

fn sampled_layout(device: &wgpu::Device, label: &str, dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayout {
  device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
    label: Some(label),
    entries: &[
      wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
          sample_type: wgpu::TextureSampleType::Float { filterable: true },
          view_dimension: dimension,
          multisampled: false,
        },
        count: None,
      },
      wgpu::BindGroupLayoutEntry {
        binding: 1,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
      },
    ],
  })
}

fn sampled_bind_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, texture: &Texture, label: &str) -> wgpu::BindGroup {
  device.create_bind_group(&wgpu::BindGroupDescriptor {
    label: Some(label),
    layout,
    entries: &[
      wgpu::BindGroupEntry {
        binding: 0,
        resource: wgpu::BindingResource::TextureView(&texture.view),
      },
      wgpu::BindGroupEntry {
        binding: 1,
        resource: wgpu::BindingResource::Sampler(&texture.sampler),
      },
    ],
  })
}

struct PipelineSpec<'a> {
  label: &'a str,
  module: &'a wgpu::ShaderModule,
  layout: &'a wgpu::PipelineLayout,
  buffer: wgpu::VertexBufferLayout<'a>,
  depth_write: bool,
  depth_compare: wgpu::CompareFunction,
  cull_mode: Option<wgpu::Face>,
}

fn render_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat, spec: PipelineSpec) -> Result<wgpu::RenderPipeline> {
  validated(device, spec.label, || {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some(spec.label),
      layout: Some(spec.layout),
      vertex: wgpu::VertexState {
        module: spec.module,
        entry_point: "vs_main",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[spec.buffer],
      },
      fragment: Some(wgpu::FragmentState {
        module: spec.module,
        entry_point: "fs_main",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(format.into())],
      }),
      primitive: wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: spec.cull_mode,
        ..Default::default()
      },
      depth_stencil: Some(wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        depth_write_enabled: spec.depth_write,
        depth_compare: spec.depth_compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
      }),
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    })
  })
}

/// GPU resources for the whole scene: three programs, one shared sphere mesh,
/// one texture per body and the skybox cubemap.
pub struct RenderContext {
  skybox_pipeline: wgpu::RenderPipeline,
  textured_pipeline: wgpu::RenderPipeline,
  phong_pipeline: wgpu::RenderPipeline,
  shading: Shading,
  skybox_vertices: wgpu::Buffer,
  skybox_buffer: wgpu::Buffer,
  skybox_bind_group: wgpu::BindGroup,
  cubemap_bind_group: wgpu::BindGroup,
  instance_buffer: wgpu::Buffer,
  instance_bind_group: wgpu::BindGroup,
  instance_stride: u64,
  lighting_buffer: wgpu::Buffer,
  lighting_bind_group: wgpu::BindGroup,
  body_bind_groups: Vec<wgpu::BindGroup>,
  vertex_buffer: wgpu::Buffer,
  index_buffer: wgpu::Buffer,
  index_count: u32,
  depth: wgpu::TextureView,
}

impl RenderContext {
  pub fn init(
    config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    mesh: &Mesh,
    body_textures: &[ImageData],
    cubemap: &[ImageData; 6],
    shading: Shading,
  ) -> Result<Self> {
    let format = config.view_formats.first().copied().unwrap_or(config.format);

    let skybox_shader = shader_module(device, "skybox", include_str!("shaders/skybox.wgsl"))?;
    let textured_shader = shader_module(device, "textured", include_str!("shaders/textured.wgsl"))?;
    let phong_shader = shader_module(device, "phong", include_str!("shaders/phong.wgsl"))?;

    // ========================================================================
    // bind group layouts
    // ========================================================================

    let skybox_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      label: Some("skybox_bind_group_layout"),
      entries: &[uniform_layout_entry(
        wgpu::ShaderStages::VERTEX,
        false,
        size_of::<SkyboxUniform>(),
      )],
    });
    let instance_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      label: Some("instance_bind_group_layout"),
      entries: &[uniform_layout_entry(
        wgpu::ShaderStages::VERTEX,
        true,
        size_of::<InstanceUniform>(),
      )],
    });
    let lighting_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      label: Some("lighting_bind_group_layout"),
      entries: &[uniform_layout_entry(
        wgpu::ShaderStages::FRAGMENT,
        false,
        size_of::<LightingUniform>(),
      )],
    });
    let cubemap_layout = sampled_layout(device, "cubemap_bind_group_layout", wgpu::TextureViewDimension::Cube);
    let body_layout = sampled_layout(device, "body_bind_group_layout", wgpu::TextureViewDimension::D2);

    // ========================================================================
    // pipelines
    // ========================================================================

    let skybox_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("skybox"),
      bind_group_layouts: &[&skybox_layout, &cubemap_layout],
      push_constant_ranges: &[],
    });
    let textured_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("textured"),
      bind_group_layouts: &[&instance_layout, &body_layout],
      push_constant_ranges: &[],
    });
    let phong_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("phong"),
      bind_group_layouts: &[&instance_layout, &body_layout, &lighting_layout],
      push_constant_ranges: &[],
    });

    // The skybox never writes depth and sits at depth 1.0, so it passes
    // LessEqual against the cleared buffer and everything drawn later wins.
    let skybox_pipeline = render_pipeline(
      device,
      format,
      PipelineSpec {
        label: "Skybox Pipeline",
        module: &skybox_shader,
        layout: &skybox_pipeline_layout,
        buffer: wgpu::VertexBufferLayout {
          array_stride: 3 * 4,
          step_mode: wgpu::VertexStepMode::Vertex,
          attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        },
        depth_write: false,
        depth_compare: wgpu::CompareFunction::LessEqual,
        cull_mode: None,
      },
    )?;
    let textured_pipeline = render_pipeline(
      device,
      format,
      PipelineSpec {
        label: "Textured Pipeline",
        module: &textured_shader,
        layout: &textured_pipeline_layout,
        buffer: Vertex::layout(),
        depth_write: true,
        depth_compare: wgpu::CompareFunction::Less,
        cull_mode: Some(wgpu::Face::Back),
      },
    )?;
    let phong_pipeline = render_pipeline(
      device,
      format,
      PipelineSpec {
        label: "Phong Pipeline",
        module: &phong_shader,
        layout: &phong_pipeline_layout,
        buffer: Vertex::layout(),
        depth_write: true,
        depth_compare: wgpu::CompareFunction::Less,
        cull_mode: Some(wgpu::Face::Back),
      },
    )?;

    // ========================================================================
    // buffers
    // ========================================================================

    let skybox_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Skybox Vertex Buffer"),
      contents: bytemuck::cast_slice(&SKYBOX_VERTICES),
      usage: wgpu::BufferUsages::VERTEX,
    });
    let skybox_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Skybox Uniform Buffer"),
      size: size_of::<SkyboxUniform>() as u64,
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    let skybox_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("skybox_bind_group"),
      layout: &skybox_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: skybox_buffer.as_entire_binding(),
      }],
    });

    let instance_stride = instance_stride(device.limits().min_uniform_buffer_offset_alignment);
    let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Instance Uniform Buffer"),
      size: instance_stride * body_textures.len().max(1) as u64,
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    let instance_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("instance_bind_group"),
      layout: &instance_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
          buffer: &instance_buffer,
          offset: 0,
          size: wgpu::BufferSize::new(size_of::<InstanceUniform>() as u64),
        }),
      }],
    });

    let lighting_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Lighting Uniform Buffer"),
      size: size_of::<LightingUniform>() as u64,
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    let lighting_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("lighting_bind_group"),
      layout: &lighting_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: lighting_buffer.as_entire_binding(),
      }],
    });

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Sphere Vertex Buffer"),
      contents: bytemuck::cast_slice(&mesh.vertices),
      usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Sphere Index Buffer"),
      contents: bytemuck::cast_slice(&mesh.indices),
      usage: wgpu::BufferUsages::INDEX,
    });

    // ========================================================================
    // textures
    // ========================================================================

    let body_bind_groups = body_textures
      .iter()
      .enumerate()
      .map(|(i, image)| {
        let label = format!("Body Texture {i}");
        let texture = Texture::from_image(device, queue, image, &label)?;
        Ok(sampled_bind_group(device, &body_layout, &texture, &label))
      })
      .collect::<Result<Vec<_>>>()?;
    let cubemap = Texture::cubemap(device, queue, cubemap)?;
    let cubemap_bind_group = sampled_bind_group(device, &cubemap_layout, &cubemap, "cubemap_bind_group");
    let depth = depth_view(device, config);

    log::info!(
      "render context ready: {} vertices, {} triangles, {} bodies, {:?} shading",
      mesh.vertex_count(),
      mesh.triangle_count(),
      body_textures.len(),
      shading
    );

    Ok(Self {
      skybox_pipeline,
      textured_pipeline,
      phong_pipeline,
      shading,
      skybox_vertices,
      skybox_buffer,
      skybox_bind_group,
      cubemap_bind_group,
      instance_buffer,
      instance_bind_group,
      instance_stride,
      lighting_buffer,
      lighting_bind_group,
      body_bind_groups,
      vertex_buffer,
      index_buffer,
      index_count: mesh.indices.len() as u32,
      depth,
    })
  }

  pub fn resize(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) {
    self.depth = depth_view(device, config);
  }

  /// Records the skybox pass, then one indexed draw per body in plan order.
  pub fn render(
    &mut self,
    view: &wgpu::TextureView,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    plan: &FramePlan,
  ) {
    queue.write_buffer(&self.skybox_buffer, 0, bytemuck::bytes_of(&plan.skybox));
    let instances = &plan.instances[..plan.instances.len().min(self.body_bind_groups.len())];
    queue.write_buffer(
      &self.instance_buffer,
      0,
      &pack_instances(instances, self.instance_stride),
    );

    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Scene Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
          view,
          resolve_target: None,
          ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            store: wgpu::StoreOp::Store,
          },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
          view: &self.depth,
          depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
          }),
          stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
      });

      // Skybox
      rpass.set_pipeline(&self.skybox_pipeline);
      rpass.set_bind_group(0, &self.skybox_bind_group, &[]);
      rpass.set_bind_group(1, &self.cubemap_bind_group, &[]);
      rpass.set_vertex_buffer(0, self.skybox_vertices.slice(..));
      rpass.draw(0..SKYBOX_VERTEX_COUNT, 0..1);

      // Opaque bodies
      let pipeline = match self.shading {
        Shading::Textured => &self.textured_pipeline,
        Shading::Phong => &self.phong_pipeline,
      };
      for (slot, bind_group) in self.body_bind_groups.iter().enumerate().take(instances.len()) {
        let offset = (slot as u64 * self.instance_stride) as wgpu::DynamicOffset;
        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        rpass.set_bind_group(0, &self.instance_bind_group, &[offset]);
        rpass.set_bind_group(1, bind_group, &[]);
        if self.shading == Shading::Phong {
          rpass.set_bind_group(2, &self.lighting_bind_group, &[]);
        }
        rpass.draw_indexed(0..self.index_count, 0, 0..1);
      }
    }
    // Shared by every body, written once per frame after the draws are recorded.
    queue.write_buffer(&self.lighting_buffer, 0, bytemuck::bytes_of(&plan.lighting));
    queue.submit(Some(command_encoder.finish()));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::{Matrix4, SquareMatrix};

  #[test]
  fn skybox_is_a_closed_unit_cube() {
    assert_eq!(SKYBOX_VERTICES.len(), 36 * 3);
    assert!(SKYBOX_VERTICES.iter().all(|c| c.abs() == 1.0));
  }

  #[test]
  fn instance_slots_respect_alignment() {
    assert_eq!(size_of::<InstanceUniform>(), 192);
    assert_eq!(instance_stride(256), 256);
    assert_eq!(instance_stride(64), 192);
    assert_eq!(instance_stride(0), 192);
  }

  #[test]
  fn packs_each_instance_at_its_slot() {
    let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
    let mut second = InstanceUniform {
      model: identity,
      view: identity,
      proj: identity,
    };
    second.model[3] = [7.0, 8.0, 9.0, 1.0];
    let first = InstanceUniform {
      model: identity,
      view: identity,
      proj: identity,
    };
    let bytes = pack_instances(&[first, second], 256);
    assert_eq!(bytes.len(), 512);
    assert_eq!(&bytes[..192], bytemuck::bytes_of(&first));
    assert!(bytes[192..256].iter().all(|b| *b == 0));
    let slot: InstanceUniform = bytemuck::pod_read_unaligned(&bytes[256..448]);
    assert_eq!(slot.model[3], [7.0, 8.0, 9.0, 1.0]);
  }
}
