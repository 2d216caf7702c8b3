use crate::shapes::{fill_targets, Shape};
use crate::{Mode, Point};
use cgmath::{MetricSpace, Point3, Vector3};
use rand::{rngs::SmallRng, Rng};
use std::f32::consts::{PI, TAU};

/// Fraction of the remaining distance covered per frame.
pub const EASING: f32 = 0.1;
pub const CLICK_DECAY: f32 = 0.92;
pub const EXPLOSION_PEAK: f32 = 2.0;
const SCATTER_EXTENT: f32 = 100.0;

/// Scalars mutated by input callbacks and read by the frame loop.
#[derive(Clone, Debug)]
pub struct Interaction {
  pub mode: Mode,
  pub hand_open: f32,
  pub click: f32,
  pub hand_pos: Point,
}

impl Interaction {
  #[must_use]
  pub fn new(mode: Mode) -> Self {
    Self {
      mode,
      hand_open: 0.0,
      click: 0.0,
      hand_pos: [0.0; 3],
    }
  }

  /// Factor driving scale and jitter for the current mode.
  #[must_use]
  pub fn factor(&self) -> f32 {
    match self.mode {
      Mode::Camera => self.hand_open,
      Mode::Mouse => self.click,
    }
  }

  pub fn explode(&mut self) {
    self.click = EXPLOSION_PEAK;
  }

  pub fn decay(&mut self) {
    if self.click > 0.0 {
      self.click *= CLICK_DECAY;
    }
  }
}

/// Eases every point a fixed fraction toward its scaled and offset target.
pub fn step(current: &mut [Point], target: &[Point], factor: f32, offset: Point, rng: &mut impl Rng) {
  let scale = 1.0 + factor;
  let offset = Vector3::from(offset);
  for (cur, tgt) in current.iter_mut().zip(target) {
    let pos = Vector3::from(*cur);
    let goal = Vector3::from(*tgt) * scale + offset;
    let jitter = centered_unit(rng) * factor;
    *cur = (pos + (goal - pos) * EASING + jitter).into();
  }
}

/// Points retargeted by one firework: a twentieth of the cloud, rounded up.
fn burst_count(len: usize) -> usize {
  len.div_ceil(20)
}

/// Uniform sample of the cube [-0.5, 0.5)^3.
fn centered_unit(rng: &mut impl Rng) -> Vector3<f32> {
  Vector3::new(rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()) - Vector3::new(0.5, 0.5, 0.5)
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CloudStats {
  pub centroid: Point,
  /// Mean distance from each point to its unscaled target.
  pub mean_error: f32,
}

/// The rendered cloud plus the shape it is easing toward.
pub struct PointCloud {
  current: Vec<Point>,
  target: Vec<Point>,
  shape: Shape,
  rng: SmallRng,
}

impl PointCloud {
  #[must_use]
  pub fn new(count: usize, shape: Shape, mut rng: SmallRng) -> Self {
    let current = (0..count)
      .map(|_| (centered_unit(&mut rng) * SCATTER_EXTENT).into())
      .collect();
    let mut cloud = Self {
      current,
      target: vec![[0.0; 3]; count],
      shape,
      rng,
    };
    cloud.set_shape(shape);
    cloud
  }

  pub fn set_shape(&mut self, shape: Shape) {
    self.shape = shape;
    fill_targets(shape, &mut self.target, &mut self.rng);
    log::debug!("rebuilt {} targets as {:?}", self.target.len(), shape);
  }

  /// One frame: step toward the targets, then let the click factor fade.
  pub fn tick(&mut self, interaction: &mut Interaction) {
    step(
      &mut self.current,
      &self.target,
      interaction.factor(),
      interaction.hand_pos,
      &mut self.rng,
    );
    interaction.decay();
  }

  /// Sends a random twentieth of the points to a burst shell and triggers an
  /// explosion. Returns the burst center, or None for an empty cloud.
  pub fn firework(&mut self, interaction: &mut Interaction) -> Option<Point> {
    if self.target.is_empty() {
      return None;
    }
    let rng = &mut self.rng;
    let spread = Vector3::new(40.0, 30.0, 40.0);
    let jitter = centered_unit(rng);
    let center = Point3::new(jitter.x * spread.x, jitter.y * spread.y + 10.0, jitter.z * spread.z);
    let count = burst_count(self.target.len());
    for _ in 0..count {
      let idx = rng.gen_range(0..self.target.len());
      let u = rng.gen::<f32>() * TAU;
      let v = rng.gen::<f32>() * PI;
      let radius = rng.gen::<f32>() * 5.0 + 5.0;
      let dir = Vector3::new(v.sin() * u.cos(), v.sin() * u.sin(), v.cos());
      self.target[idx] = (center + dir * radius).into();
    }
    log::debug!("firework moved {count} points");
    interaction.explode();
    Some(center.into())
  }

  #[must_use]
  pub fn stats(&self) -> CloudStats {
    let n = self.current.len().max(1) as f32;
    let mut centroid = Vector3::new(0.0, 0.0, 0.0);
    let mut error = 0.0f32;
    for (cur, tgt) in self.current.iter().zip(&self.target) {
      centroid += Vector3::from(*cur);
      error += Point3::from(*cur).distance(Point3::from(*tgt));
    }
    CloudStats {
      centroid: (centroid / n).into(),
      mean_error: error / n,
    }
  }

  #[must_use]
  pub fn positions(&self) -> &[Point] {
    &self.current
  }

  #[must_use]
  pub fn targets(&self) -> &[Point] {
    &self.target
  }

  #[must_use]
  pub fn shape(&self) -> Shape {
    self.shape
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.current.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.current.is_empty()
  }
}
