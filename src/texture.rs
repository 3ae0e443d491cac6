use crate::assets::ImageData;
use crate::error::Result;
use image::RgbaImage;

/// A sampled texture. The view keeps the underlying GPU texture alive.
pub struct Texture {
  pub view: wgpu::TextureView,
  pub sampler: wgpu::Sampler,
}

impl Texture {
  pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

  /// Uploads a planet texture with its full mip chain; sampled with repeat wrap.
  pub fn from_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &ImageData,
    label: &str,
  ) -> Result<Self> {
    image.check_size(device.limits().max_texture_dimension_2d)?;
    let levels = image.mip_chain();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
      label: Some(label),
      size: wgpu::Extent3d {
        width: image.width(),
        height: image.height(),
        depth_or_array_layers: 1,
      },
      mip_level_count: levels.len() as u32,
      sample_count: 1,
      dimension: wgpu::TextureDimension::D2,
      format: wgpu::TextureFormat::Rgba8UnormSrgb,
      usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
      view_formats: &[],
    });
    for (level, pixels) in levels.iter().enumerate() {
      write_layer(queue, &texture, level as u32, 0, pixels);
    }
    log::debug!(
      "uploaded texture {label} ({}x{}, {} mips)",
      image.width(),
      image.height(),
      levels.len()
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
      label: Some(label),
      address_mode_u: wgpu::AddressMode::Repeat,
      address_mode_v: wgpu::AddressMode::Repeat,
      address_mode_w: wgpu::AddressMode::Repeat,
      mag_filter: wgpu::FilterMode::Linear,
      min_filter: wgpu::FilterMode::Linear,
      mipmap_filter: wgpu::FilterMode::Linear,
      ..Default::default()
    });
    Ok(Self { view, sampler })
  }

  /// Six faces in +X, -X, +Y, -Y, +Z, -Z order.
  pub fn cubemap(device: &wgpu::Device, queue: &wgpu::Queue, faces: &[ImageData; 6]) -> Result<Self> {
    let max = device.limits().max_texture_dimension_2d;
    for face in faces {
      face.check_size(max)?;
    }
    let size = faces[0].width();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
      label: Some("Skybox Cubemap"),
      size: wgpu::Extent3d {
        width: size,
        height: size,
        depth_or_array_layers: 6,
      },
      mip_level_count: 1,
      sample_count: 1,
      dimension: wgpu::TextureDimension::D2,
      format: wgpu::TextureFormat::Rgba8UnormSrgb,
      usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
      view_formats: &[],
    });
    for (layer, face) in faces.iter().enumerate() {
      write_layer(queue, &texture, 0, layer as u32, face.rgba8());
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
      label: Some("Skybox Cubemap View"),
      dimension: Some(wgpu::TextureViewDimension::Cube),
      ..Default::default()
    });
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
      label: Some("Skybox Sampler"),
      address_mode_u: wgpu::AddressMode::ClampToEdge,
      address_mode_v: wgpu::AddressMode::ClampToEdge,
      address_mode_w: wgpu::AddressMode::ClampToEdge,
      mag_filter: wgpu::FilterMode::Linear,
      min_filter: wgpu::FilterMode::Linear,
      ..Default::default()
    });
    Ok(Self { view, sampler })
  }
}

/// Render-target depth buffer; only its view is ever bound.
pub fn depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
  device
    .create_texture(&wgpu::TextureDescriptor {
      label: Some("Depth Texture"),
      size: wgpu::Extent3d {
        width: config.width.max(1),
        height: config.height.max(1),
        depth_or_array_layers: 1,
      },
      mip_level_count: 1,
      sample_count: 1,
      dimension: wgpu::TextureDimension::D2,
      format: Texture::DEPTH_FORMAT,
      usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
      view_formats: &[],
    })
    .create_view(&wgpu::TextureViewDescriptor::default())
}

fn write_layer(
  queue: &wgpu::Queue,
  texture: &wgpu::Texture,
  mip_level: u32,
  layer: u32,
  pixels: &RgbaImage,
) {
  let (width, height) = pixels.dimensions();
  queue.write_texture(
    wgpu::ImageCopyTexture {
      texture,
      mip_level,
      origin: wgpu::Origin3d {
        x: 0,
        y: 0,
        z: layer,
      },
      aspect: wgpu::TextureAspect::All,
    },
    pixels.as_raw(),
    wgpu::ImageDataLayout {
      offset: 0,
      bytes_per_row: Some(4 * width),
      rows_per_image: Some(height),
    },
    wgpu::Extent3d {
      width,
      height,
      depth_or_array_layers: 1,
    },
  );
}
