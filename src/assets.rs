//! Image decoding for planet textures and skybox faces.
//!
//! Only 8-bit RGB and RGBA sources are accepted. Everything is expanded to
//! RGBA8 before upload since wgpu has no three-channel formats.

use crate::error::{Error, Result};
use image::{imageops::FilterType, DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};

/// Face file stems in GPU layer order: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBEMAP_FACES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];
pub const CUBEMAP_DIR: &str = "cubemap/v1";

/// Decoded pixels as handed to the GPU layer, already expanded to RGBA8.
///
/// Only [`ImageData::from_dynamic`] builds one, so the pixel buffer always
/// matches the reported size.
#[derive(Clone, Debug)]
pub struct ImageData {
  path: PathBuf,
  channels: u8,
  pixels: RgbaImage,
}

impl ImageData {
  pub fn from_dynamic(path: &Path, image: DynamicImage) -> Result<Self> {
    let (pixels, channels) = match image {
      DynamicImage::ImageRgb8(rgb) => (DynamicImage::ImageRgb8(rgb).into_rgba8(), 3),
      DynamicImage::ImageRgba8(rgba) => (rgba, 4),
      other => {
        return Err(Error::UnsupportedChannels {
          path: path.to_path_buf(),
          channels: other.color().channel_count(),
        })
      }
    };
    Ok(Self {
      path: path.to_path_buf(),
      channels,
      pixels,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn width(&self) -> u32 {
    self.pixels.width()
  }

  pub fn height(&self) -> u32 {
    self.pixels.height()
  }

  /// Channel count of the source file, 3 or 4.
  pub fn channels(&self) -> u8 {
    self.channels
  }

  pub fn rgba8(&self) -> &RgbaImage {
    &self.pixels
  }

  /// Fails when either side exceeds `max_dimension`, the device's 2D texture limit.
  pub fn check_size(&self, max_dimension: u32) -> Result<()> {
    let (width, height) = self.pixels.dimensions();
    if width > max_dimension || height > max_dimension {
      return Err(Error::TextureTooLarge {
        path: self.path.clone(),
        width,
        height,
        max: max_dimension,
      });
    }
    Ok(())
  }

  /// Full RGBA8 mip chain, level 0 first, down to 1x1.
  #[must_use]
  pub fn mip_chain(&self) -> Vec<RgbaImage> {
    let mut levels = vec![self.pixels.clone()];
    let (mut width, mut height) = self.pixels.dimensions();
    while width > 1 || height > 1 {
      width = (width / 2).max(1);
      height = (height / 2).max(1);
      let previous = &levels[levels.len() - 1];
      levels.push(image::imageops::resize(previous, width, height, FilterType::Triangle));
    }
    levels
  }
}

pub fn load_image(path: &Path) -> Result<ImageData> {
  let image = image::open(path).map_err(|source| Error::ImageLoad {
    path: path.to_path_buf(),
    source,
  })?;
  let data = ImageData::from_dynamic(path, image)?;
  log::debug!(
    "loaded {} ({}x{}, {} channels)",
    path.display(),
    data.width(),
    data.height(),
    data.channels()
  );
  Ok(data)
}

pub fn cubemap_paths(assets: &Path) -> [PathBuf; 6] {
  CUBEMAP_FACES.map(|face| assets.join(CUBEMAP_DIR).join(format!("{face}.png")))
}

/// Loads six square faces of one common size.
pub fn load_cubemap(paths: &[PathBuf; 6]) -> Result<[ImageData; 6]> {
  let mut faces: Vec<ImageData> = Vec::with_capacity(6);
  for path in paths {
    let face = load_image(path)?;
    if face.width() != face.height() {
      return Err(Error::CubemapFace {
        path: path.clone(),
        reason: format!("face is {}x{}, expected a square", face.width(), face.height()),
      });
    }
    if let Some(first) = faces.first() {
      if first.width() != face.width() {
        return Err(Error::CubemapFace {
          path: path.clone(),
          reason: format!("face is {0}x{0}, other faces are {1}x{1}", face.width(), first.width()),
        });
      }
    }
    faces.push(face);
  }
  faces.try_into().map_err(|_| Error::CubemapFace {
    path: PathBuf::new(),
    reason: "expected six faces".into(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{GrayImage, Rgb, RgbImage, Rgba};

  fn write_rgb(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
      .save(path)
      .unwrap();
  }

  #[test]
  fn loads_rgb_and_rgba() {
    let dir = tempfile::tempdir().unwrap();
    let rgb = dir.path().join("rgb.png");
    let rgba = dir.path().join("rgba.png");
    write_rgb(&rgb, 4, 2);
    RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 4]))
      .save(&rgba)
      .unwrap();

    let rgb = load_image(&rgb).unwrap();
    assert_eq!((rgb.width(), rgb.height(), rgb.channels()), (4, 2, 3));
    assert_eq!(rgb.rgba8().as_raw().len(), 4 * 2 * 4);
    assert_eq!(rgb.rgba8().get_pixel(3, 1), &Rgba([10, 20, 30, 255]));

    let rgba = load_image(&rgba).unwrap();
    assert_eq!(rgba.channels(), 4);
    assert_eq!(rgba.rgba8().get_pixel(0, 0), &Rgba([1, 2, 3, 4]));
  }

  #[test]
  fn rejects_grayscale() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.png");
    GrayImage::new(2, 2).save(&path).unwrap();
    match load_image(&path) {
      Err(Error::UnsupportedChannels { channels, .. }) => assert_eq!(channels, 1),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_image(&dir.path().join("nope.jpg")).unwrap_err();
    assert!(matches!(err, Error::ImageLoad { .. }));
  }

  #[test]
  fn mip_chain_reaches_one_texel() {
    let image = ImageData::from_dynamic(
      Path::new("strip.png"),
      DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 2, Rgb([128; 3]))),
    )
    .unwrap();
    let sizes: Vec<_> = image.mip_chain().iter().map(|l| l.dimensions()).collect();
    assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
  }

  #[test]
  fn cubemap_requires_matching_square_faces() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(CUBEMAP_DIR)).unwrap();
    let paths = cubemap_paths(dir.path());
    for path in &paths {
      write_rgb(path, 4, 4);
    }
    let faces = load_cubemap(&paths).unwrap();
    assert!(faces.iter().all(|f| f.width() == 4));

    write_rgb(&paths[4], 8, 8);
    assert!(matches!(load_cubemap(&paths), Err(Error::CubemapFace { .. })));

    write_rgb(&paths[4], 4, 2);
    assert!(matches!(load_cubemap(&paths), Err(Error::CubemapFace { .. })));

    std::fs::remove_file(&paths[5]).unwrap();
    write_rgb(&paths[4], 4, 4);
    assert!(matches!(load_cubemap(&paths), Err(Error::ImageLoad { .. })));
  }

  #[test]
  fn oversized_images_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.png");
    write_rgb(&path, 16, 2);
    let image = load_image(&path).unwrap();
    assert!(image.check_size(16).is_ok());
    match image.check_size(8) {
      Err(Error::TextureTooLarge {
        width, height, max, ..
      }) => assert_eq!((width, height, max), (16, 2, 8)),
      other => panic!("unexpected {other:?}"),
    }
    // A tall image trips the same limit through its height.
    write_rgb(&path, 2, 9000);
    let tall = load_image(&path).unwrap();
    let limit = wgpu::Limits::default().max_texture_dimension_2d;
    assert!(matches!(tall.check_size(limit), Err(Error::TextureTooLarge { .. })));
  }
}
