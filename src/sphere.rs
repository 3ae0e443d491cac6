use crate::error::MeshError;
use std::f32::consts::PI;

pub const MIN_HORIZONTAL_SEGMENTS: u32 = 4;
pub const MIN_VERTICAL_SEGMENTS: u32 = 2;

/// Interleaved vertex: position, normal, uv (8 floats).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
  pub position: [f32; 3],
  pub normal: [f32; 3],
  pub uv: [f32; 2],
}

impl Vertex {
  pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

  pub fn layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &Self::ATTRIBUTES,
    }
  }
}

/// Immutable UV-sphere geometry shared by every body.
#[derive(Clone, Debug)]
pub struct Mesh {
  pub vertices: Vec<Vertex>,
  pub indices: Vec<u16>,
}

impl Mesh {
  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  pub fn triangles(&self) -> impl Iterator<Item = [u16; 3]> + '_ {
    self
      .indices
      .chunks_exact(3)
      .map(|tri| [tri[0], tri[1], tri[2]])
  }
}

/// Builds a UV sphere of `radius` with `horizontal` longitude divisions and
/// `vertical` latitude bands.
///
/// The layout is: top pole, `vertical - 1` rings of `horizontal` vertices
/// each (top to bottom), bottom pole. Triangles wind counter-clockwise when
/// seen from outside the sphere.
pub fn generate_sphere(radius: f32, horizontal: u32, vertical: u32) -> Result<Mesh, MeshError> {
  if horizontal < MIN_HORIZONTAL_SEGMENTS {
    return Err(MeshError::TooFewHorizontalSegments(horizontal));
  }
  if vertical < MIN_VERTICAL_SEGMENTS {
    return Err(MeshError::TooFewVerticalSegments(vertical));
  }
  if !(radius.is_finite() && radius > 0.0) {
    return Err(MeshError::InvalidRadius(radius));
  }

  let h = horizontal as usize;
  let v = vertical as usize;
  let vertex_count = h * (v - 1) + 2;
  if vertex_count > usize::from(u16::MAX) + 1 {
    return Err(MeshError::IndexCapacity {
      vertices: vertex_count,
    });
  }

  let d_theta = PI / vertical as f32;
  let d_phi = 2.0 * PI / horizontal as f32;

  let mut vertices = Vec::with_capacity(vertex_count);
  vertices.push(Vertex {
    position: [0.0, radius, 0.0],
    normal: [0.0, 1.0, 0.0],
    uv: [0.5, 1.0],
  });

  for i in 0..v - 1 {
    let theta = d_theta * (i + 1) as f32;
    for j in 0..h {
      let phi = d_phi * j as f32;
      let normal = [phi.sin() * theta.sin(), theta.cos(), phi.cos() * theta.sin()];
      // Inverse-sine projection; seams away from the equator are expected.
      let uv = [normal[0].asin() / PI + 0.5, normal[1].asin() / PI + 0.5];
      vertices.push(Vertex {
        position: normal.map(|c| c * radius),
        normal,
        uv,
      });
    }
  }

  vertices.push(Vertex {
    position: [0.0, -radius, 0.0],
    normal: [0.0, -1.0, 0.0],
    uv: [0.5, 0.0],
  });

  let ring = |i: usize, j: usize| (i * h + j % h + 1) as u16;
  let bottom = (vertex_count - 1) as u16;

  let mut indices = Vec::with_capacity(2 * h * (v - 1) * 3);
  for j in 0..h {
    indices.extend_from_slice(&[0, ring(0, j), ring(0, j + 1)]);
  }
  for i in 0..v - 2 {
    for j in 0..h {
      indices.extend_from_slice(&[ring(i, j), ring(i + 1, j), ring(i + 1, j + 1)]);
      indices.extend_from_slice(&[ring(i + 1, j + 1), ring(i, j + 1), ring(i, j)]);
    }
  }
  let last = v - 2;
  for j in 0..h {
    indices.extend_from_slice(&[ring(last, j), bottom, ring(last, j + 1)]);
  }

  Ok(Mesh { vertices, indices })
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::{InnerSpace, Vector3};

  fn vec(a: [f32; 3]) -> Vector3<f32> {
    Vector3::new(a[0], a[1], a[2])
  }

  #[test]
  fn smallest_sphere_has_expected_counts() {
    let mesh = generate_sphere(1.0, 4, 2).unwrap();
    assert_eq!(mesh.vertex_count(), 6);
    assert_eq!(mesh.triangle_count(), 8);
    for vertex in &mesh.vertices {
      assert!((vec(vertex.position).magnitude() - 1.0).abs() < 1e-5);
    }
  }

  #[test]
  fn vertices_lie_on_the_sphere() {
    for &(radius, h, v) in &[(0.5, 4, 2), (2.5, 7, 5), (10.0, 32, 16), (1.0, 100, 100)] {
      let mesh = generate_sphere(radius, h, v).unwrap();
      assert_eq!(mesh.vertex_count(), (h * (v - 1) + 2) as usize);
      for vertex in &mesh.vertices {
        let p = vec(vertex.position);
        let n = vec(vertex.normal);
        assert!((p.magnitude() - radius).abs() < 1e-4 * radius);
        assert!((p / radius - n).magnitude() < 1e-5);
        assert!((n.magnitude() - 1.0).abs() < 1e-5);
      }
    }
  }

  #[test]
  fn indices_cover_every_vertex() {
    let (h, v) = (9, 6);
    let mesh = generate_sphere(1.0, h, v).unwrap();
    assert_eq!(mesh.triangle_count(), (2 * h * (v - 1)) as usize);
    let mut seen = vec![false; mesh.vertex_count()];
    for index in &mesh.indices {
      assert!((*index as usize) < mesh.vertex_count());
      seen[*index as usize] = true;
    }
    assert!(seen.iter().all(|s| *s));
  }

  #[test]
  fn triangles_face_outward() {
    let mesh = generate_sphere(3.0, 12, 8).unwrap();
    for [a, b, c] in mesh.triangles() {
      let pa = vec(mesh.vertices[a as usize].position);
      let pb = vec(mesh.vertices[b as usize].position);
      let pc = vec(mesh.vertices[c as usize].position);
      let face = (pb - pa).cross(pc - pa);
      let centroid = (pa + pb + pc) / 3.0;
      assert!(face.dot(centroid) > 0.0, "inward triangle {a} {b} {c}");
    }
  }

  #[test]
  fn poles_and_uv_projection() {
    let mesh = generate_sphere(2.0, 8, 4).unwrap();
    let top = mesh.vertices[0];
    let bottom = mesh.vertices[mesh.vertex_count() - 1];
    assert_eq!(top.position, [0.0, 2.0, 0.0]);
    assert_eq!(top.uv, [0.5, 1.0]);
    assert_eq!(bottom.normal, [0.0, -1.0, 0.0]);
    assert_eq!(bottom.uv, [0.5, 0.0]);

    // Equator ring, azimuth 0: normal (0, ~0, 1) maps to the centre of the texture.
    let equator = mesh.vertices[1 + 8];
    assert!((equator.uv[0] - 0.5).abs() < 1e-5);
    assert!((equator.uv[1] - 0.5).abs() < 1e-5);
    for vertex in &mesh.vertices[1..mesh.vertex_count() - 1] {
      let n = vertex.normal;
      assert_eq!(vertex.uv[0], n[0].asin() / PI + 0.5);
      assert_eq!(vertex.uv[1], n[1].asin() / PI + 0.5);
    }
  }

  #[test]
  fn rejects_degenerate_segments() {
    assert_eq!(
      generate_sphere(1.0, 3, 10).unwrap_err(),
      MeshError::TooFewHorizontalSegments(3)
    );
    assert_eq!(
      generate_sphere(1.0, 10, 1).unwrap_err(),
      MeshError::TooFewVerticalSegments(1)
    );
    assert!(matches!(
      generate_sphere(0.0, 10, 10),
      Err(MeshError::InvalidRadius(_))
    ));
  }

  #[test]
  fn refuses_meshes_beyond_u16_indices() {
    assert_eq!(
      generate_sphere(1.0, 300, 300).unwrap_err(),
      MeshError::IndexCapacity {
        vertices: 300 * 299 + 2
      }
    );
    // 65536 vertices is the last size that still fits.
    assert!(generate_sphere(1.0, 65534, 2).is_ok());
  }
}
