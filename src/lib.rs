pub mod field;
pub mod render;
pub mod screen;
pub mod state;

/// One simulated point. Doubles as the per-instance GPU record, so the
/// layout is fixed and the whole particle list can be uploaded as-is.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Particle {
  pub pos: [f32; 2],
  pub vel: [f32; 2],
  pub radius: f32,
}

#[derive(Copy, Clone, Debug)]
pub struct FieldParams {
  /// Surface area (in square pixels) per particle.
  pub density: f32,
  /// Velocity components are drawn uniformly from [-max_speed, max_speed].
  pub max_speed: f32,
  pub min_radius: f32,
  pub max_radius: f32,
  /// Cutoff for both link drawing and pointer repulsion.
  pub link_distance: f32,
  /// Displacement per tick applied to particles near the pointer.
  pub repulsion_step: f32,
  /// Link opacity at distance zero, fading linearly to zero at the cutoff.
  pub link_alpha: f32,
}

impl Default for FieldParams {
  fn default() -> Self {
    Self {
      density: 15_000.0,
      max_speed: 0.25,
      min_radius: 1.0,
      max_radius: 3.0,
      link_distance: 150.0,
      repulsion_step: 2.0,
      link_alpha: 0.2,
    }
  }
}

/// A connection between two particles for one frame, already resolved to
/// endpoint positions and an opacity.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Link {
  pub a: [f32; 2],
  pub b: [f32; 2],
  pub alpha: f32,
}
