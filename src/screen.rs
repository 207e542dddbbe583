use cgmath::SquareMatrix;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Maps surface pixels to clip space, y-down with the origin at the top
/// left, so the field can work in the same coordinates the pointer events
/// arrive in.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ScreenUniform {
  proj: [[f32; 4]; 4],
}

impl ScreenUniform {
  #[must_use]
  pub fn new() -> Self {
    Self {
      proj: cgmath::Matrix4::identity().into(),
    }
  }

  pub fn update(&mut self, width: f32, height: f32) {
    let proj = cgmath::ortho(0.0, width.max(1.0), height.max(1.0), 0.0, -1.0, 1.0);
    self.proj = (OPENGL_TO_WGPU_MATRIX * proj).into();
  }
}

impl Default for ScreenUniform {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::{Matrix4, Vector4};

  fn project(u: &ScreenUniform, x: f32, y: f32) -> (f32, f32) {
    let m: Matrix4<f32> = u.proj.into();
    let v = m * Vector4::new(x, y, 0.0, 1.0);
    (v.x, v.y)
  }

  #[test]
  fn corners_map_to_clip_space() {
    let mut u = ScreenUniform::new();
    u.update(800.0, 600.0);
    let (x, y) = project(&u, 0.0, 0.0);
    assert!((x - -1.0).abs() < 1e-6 && (y - 1.0).abs() < 1e-6);
    let (x, y) = project(&u, 800.0, 600.0);
    assert!((x - 1.0).abs() < 1e-6 && (y - -1.0).abs() < 1e-6);
    let (x, y) = project(&u, 400.0, 300.0);
    assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
  }
}
