use crate::{FieldParams, Link, Particle};
use cgmath::{InnerSpace, Vector2};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Number of particles for a surface of the given size: one particle per
/// `density` square pixels, rounded down.
#[must_use]
pub fn particle_count(width: f32, height: f32, density: f32) -> usize {
  (width * height / density).floor() as usize
}

fn seed_particles(rng: &mut SmallRng, width: f32, height: f32, params: &FieldParams) -> Vec<Particle> {
  let count = particle_count(width, height, params.density);
  let mut particles = Vec::with_capacity(count);
  for _ in 0..count {
    particles.push(Particle {
      pos: [rng.gen::<f32>() * width, rng.gen::<f32>() * height],
      vel: [
        rng.gen_range(-params.max_speed..=params.max_speed),
        rng.gen_range(-params.max_speed..=params.max_speed),
      ],
      radius: rng.gen_range(params.min_radius..params.max_radius),
    });
  }
  particles
}

/// The particle network: an owned state record mutated in place by the
/// event handlers and advanced once per frame by [`ParticleField::tick`].
pub struct ParticleField {
  pub particles: Vec<Particle>,
  pub width: f32,
  pub height: f32,
  /// Last observed pointer position. Repulsion stays off until the first
  /// pointer event arrives.
  pub pointer: Option<Vector2<f32>>,
  pub params: FieldParams,
  rng: SmallRng,
  links: Vec<Link>,
}

impl ParticleField {
  #[must_use]
  pub fn new(width: f32, height: f32, params: FieldParams) -> Self {
    let mut rng = SmallRng::from_entropy();
    let particles = seed_particles(&mut rng, width, height, &params);
    log::info!(
      "field initialized: {}x{} px, {} particles",
      width,
      height,
      particles.len()
    );
    Self {
      particles,
      width,
      height,
      pointer: None,
      params,
      rng,
      links: Vec::new(),
    }
  }

  /// Rebuilds the whole particle set at the new density target. Nothing
  /// carries over from the old generation except the pointer position.
  pub fn resize(&mut self, width: f32, height: f32) {
    self.width = width;
    self.height = height;
    self.particles = seed_particles(&mut self.rng, width, height, &self.params);
    log::debug!(
      "field resized: {}x{} px, {} particles",
      width,
      height,
      self.particles.len()
    );
  }

  pub fn pointer_moved(&mut self, x: f32, y: f32) {
    self.pointer = Some(Vector2::new(x, y));
  }

  /// Connection lines computed by the most recent [`ParticleField::tick`].
  #[must_use]
  pub fn links(&self) -> &[Link] {
    &self.links
  }

  /// Advances every particle by one frame and rebuilds the connection
  /// lines for it.
  ///
  /// Per particle, in stored order: move by velocity, reflect off the
  /// surface edges, push away from the pointer, then link against every
  /// particle later in the list. Partners later in the list have not moved
  /// yet when the link distance is measured; each unordered pair is visited
  /// exactly once.
  pub fn tick(&mut self) {
    self.links.clear();
    let cutoff = self.params.link_distance;
    for i in 0..self.particles.len() {
      let mut p = self.particles[i];

      p.pos[0] += p.vel[0];
      p.pos[1] += p.vel[1];

      // Reflection flips velocity only. The position is left where it
      // landed, so a particle can overshoot the edge for one frame; the
      // original effect does the same and it reads as part of the look.
      if p.pos[0] < 0.0 || p.pos[0] > self.width {
        p.vel[0] = -p.vel[0];
      }
      if p.pos[1] < 0.0 || p.pos[1] > self.height {
        p.vel[1] = -p.vel[1];
      }

      if let Some(pointer) = self.pointer {
        let away = Vector2::from(p.pos) - pointer;
        let dist = away.magnitude();
        // dist == 0 would normalize to NaN; skip repulsion for that tick.
        if dist > 0.0 && dist < cutoff {
          let pushed = Vector2::from(p.pos) + away / dist * self.params.repulsion_step;
          p.pos = pushed.into();
        }
      }

      self.particles[i] = p;

      for j in (i + 1)..self.particles.len() {
        let other = self.particles[j];
        let dist = (Vector2::from(p.pos) - Vector2::from(other.pos)).magnitude();
        if dist < cutoff {
          self.links.push(Link {
            a: p.pos,
            b: other.pos,
            alpha: self.params.link_alpha * (1.0 - dist / cutoff),
          });
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn field(width: f32, height: f32) -> ParticleField {
    ParticleField::new(width, height, FieldParams::default())
  }

  /// Field with exactly the given particles, bypassing random seeding.
  fn field_with(width: f32, height: f32, particles: Vec<Particle>) -> ParticleField {
    let mut f = field(0.0, 0.0);
    f.width = width;
    f.height = height;
    f.particles = particles;
    f
  }

  fn particle(x: f32, y: f32, vx: f32, vy: f32) -> Particle {
    Particle {
      pos: [x, y],
      vel: [vx, vy],
      radius: 2.0,
    }
  }

  #[test]
  fn count_follows_density_target() {
    assert_eq!(particle_count(800.0, 600.0, 15_000.0), 32);
    assert_eq!(particle_count(1920.0, 1080.0, 15_000.0), 138);
    assert_eq!(particle_count(100.0, 100.0, 15_000.0), 0);
    assert_eq!(particle_count(0.0, 600.0, 15_000.0), 0);
    assert_eq!(particle_count(0.0, 0.0, 15_000.0), 0);
  }

  #[test]
  fn seeding_respects_ranges() {
    let f = field(800.0, 600.0);
    assert_eq!(f.particles.len(), 32);
    for p in &f.particles {
      assert!(p.pos[0] >= 0.0 && p.pos[0] < 800.0);
      assert!(p.pos[1] >= 0.0 && p.pos[1] < 600.0);
      assert!(p.vel[0].abs() <= 0.25);
      assert!(p.vel[1].abs() <= 0.25);
      assert!(p.radius >= 1.0 && p.radius < 3.0);
    }
  }

  #[test]
  fn interior_move_does_not_reflect() {
    let mut f = field_with(800.0, 600.0, vec![particle(5.0, 300.0, -0.5, 0.0)]);
    f.tick();
    let p = f.particles[0];
    assert_eq!(p.pos[0], 4.5);
    assert_eq!(p.vel[0], -0.5);
  }

  #[test]
  fn edge_crossing_flips_only_that_axis() {
    let mut f = field_with(800.0, 600.0, vec![particle(0.2, 300.0, -0.5, 0.1)]);
    f.tick();
    let p = f.particles[0];
    // Position keeps the overshoot; only the velocity reflects.
    assert!((p.pos[0] - -0.3).abs() < 1e-6);
    assert_eq!(p.vel[0], 0.5);
    assert_eq!(p.vel[1], 0.1);
  }

  #[test]
  fn far_edge_reflects_too() {
    let mut f = field_with(800.0, 600.0, vec![particle(400.0, 599.9, 0.0, 0.2)]);
    f.tick();
    let p = f.particles[0];
    assert!(p.pos[1] > 600.0);
    assert_eq!(p.vel[1], -0.2);
  }

  #[test]
  fn no_repulsion_before_first_pointer_event() {
    let mut f = field_with(800.0, 600.0, vec![particle(100.0, 100.0, 0.0, 0.0)]);
    f.tick();
    assert_eq!(f.particles[0].pos, [100.0, 100.0]);
  }

  #[test]
  fn repulsion_pushes_exactly_step_away_from_pointer() {
    let mut f = field_with(800.0, 600.0, vec![particle(100.0, 100.0, 0.0, 0.0)]);
    f.pointer_moved(40.0, 100.0);
    f.tick();
    // Pointer is 60 px to the left; the particle moves 2 px further right.
    assert_eq!(f.particles[0].pos, [102.0, 100.0]);
  }

  #[test]
  fn repulsion_magnitude_is_fixed_along_diagonals() {
    let mut f = field_with(800.0, 600.0, vec![particle(130.0, 140.0, 0.0, 0.0)]);
    f.pointer_moved(100.0, 100.0);
    f.tick();
    let p = f.particles[0];
    let moved = ((p.pos[0] - 130.0).powi(2) + (p.pos[1] - 140.0).powi(2)).sqrt();
    assert!((moved - 2.0).abs() < 1e-5);
    // Displacement points away from the pointer: 3-4-5 triangle.
    assert!((p.pos[0] - 131.2).abs() < 1e-5);
    assert!((p.pos[1] - 141.6).abs() < 1e-5);
  }

  #[test]
  fn repulsion_inactive_at_and_beyond_cutoff() {
    let mut f = field_with(800.0, 600.0, vec![particle(300.0, 100.0, 0.0, 0.0)]);
    f.pointer_moved(150.0, 100.0);
    f.tick();
    assert_eq!(f.particles[0].pos, [300.0, 100.0]);
  }

  #[test]
  fn pointer_on_particle_is_a_noop() {
    let mut f = field_with(800.0, 600.0, vec![particle(100.0, 100.0, 0.0, 0.0)]);
    f.pointer_moved(100.0, 100.0);
    f.tick();
    let p = f.particles[0];
    assert!(p.pos[0].is_finite() && p.pos[1].is_finite());
    assert_eq!(p.pos, [100.0, 100.0]);
  }

  #[test]
  fn links_fade_linearly_and_cut_off_at_threshold() {
    let mut f = field_with(
      800.0,
      600.0,
      vec![
        particle(0.0, 0.0, 0.0, 0.0),
        particle(100.0, 0.0, 0.0, 0.0),
        particle(500.0, 0.0, 0.0, 0.0),
      ],
    );
    f.tick();
    let links = f.links();
    // Only the 100 px pair connects; 400 px and 500 px pairs are beyond 150.
    assert_eq!(links.len(), 1);
    assert!((links[0].alpha - 0.2 * (1.0 - 100.0 / 150.0)).abs() < 1e-6);
    assert!((links[0].alpha - 0.0667).abs() < 1e-3);
  }

  #[test]
  fn coincident_particles_link_at_full_alpha() {
    let mut f = field_with(
      800.0,
      600.0,
      vec![particle(50.0, 50.0, 0.0, 0.0), particle(50.0, 50.0, 0.0, 0.0)],
    );
    f.tick();
    let links = f.links();
    assert_eq!(links.len(), 1);
    assert!((links[0].alpha - 0.2).abs() < 1e-6);
  }

  #[test]
  fn each_pair_links_at_most_once() {
    let particles = (0..5).map(|i| particle(i as f32 * 10.0, 0.0, 0.0, 0.0)).collect();
    let mut f = field_with(800.0, 600.0, particles);
    f.tick();
    // All 5 particles are within 150 px of each other: C(5, 2) pairs.
    assert_eq!(f.links().len(), 10);
  }

  #[test]
  fn resize_regenerates_wholesale() {
    let mut f = field(800.0, 600.0);
    f.pointer_moved(10.0, 10.0);
    let before: Vec<[f32; 2]> = f.particles.iter().map(|p| p.pos).collect();
    f.resize(400.0, 300.0);
    assert_eq!(f.particles.len(), 8);
    for p in &f.particles {
      assert!(p.pos[0] >= 0.0 && p.pos[0] < 400.0);
      assert!(p.pos[1] >= 0.0 && p.pos[1] < 300.0);
    }
    // No particle survives a resize.
    assert!(f.particles.iter().all(|p| !before.contains(&p.pos)));
    // The pointer does.
    assert_eq!(f.pointer, Some(Vector2::new(10.0, 10.0)));
  }

  #[test]
  fn empty_field_ticks_without_work() {
    let mut f = field(100.0, 50.0);
    assert!(f.particles.is_empty());
    f.tick();
    assert!(f.links().is_empty());
  }
}
