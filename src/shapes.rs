use crate::Point;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Parametric forms the cloud can take.
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Shape {
  Heart,
  Saturn,
  Buddha,
  Spiral,
  Sphere,
  Flower,
  Galaxy,
}

impl Shape {
  pub const ALL: [Shape; 7] = [
    Shape::Heart,
    Shape::Saturn,
    Shape::Buddha,
    Shape::Spiral,
    Shape::Sphere,
    Shape::Flower,
    Shape::Galaxy,
  ];

  #[must_use]
  pub fn next(self) -> Self {
    let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
    Self::ALL[(i + 1) % Self::ALL.len()]
  }

  /// Shape bound to the digit keys 1..=7.
  #[must_use]
  pub fn from_digit(digit: u32) -> Option<Self> {
    let i = usize::try_from(digit).ok()?.checked_sub(1)?;
    Self::ALL.get(i).copied()
  }
}

const HEART_OUTLINE_JITTER: f32 = 0.5;
const HEART_DEPTH: f32 = 6.0;
const SPIRAL_STEP: f32 = 0.3;
/// Radial growth per point; the spiral widens without bound as the cloud grows.
const SPIRAL_GROWTH: f32 = 0.09;
const FLOWER_RADIUS: f32 = 15.0;
const SPHERE_RADIUS: f32 = 20.0;
const GALAXY_BULGE_FRACTION: f32 = 0.2;
const GALAXY_ARMS: u32 = 3;
const GALAXY_RADIUS: f32 = 25.0;
const GALAXY_WINDING: f32 = 0.25;

/// Classic 2D heart curve.
fn heart_curve(t: f32) -> (f32, f32) {
  let x = 16.0 * t.sin().powi(3);
  let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
  (x, y)
}

fn spherical(r: f32, u: f32, v: f32) -> Point {
  [r * v.sin() * u.cos(), r * v.sin() * u.sin(), r * v.cos()]
}

fn centered(rng: &mut impl Rng, span: f32) -> f32 {
  (rng.gen::<f32>() - 0.5) * span
}

/// Overwrites every slot of `targets` with a sample of `shape`.
///
/// Each point draws its own randomness and never looks at its neighbours, so the
/// result only depends on the index, the buffer length and the RNG stream.
pub fn fill_targets(shape: Shape, targets: &mut [Point], rng: &mut impl Rng) {
  let n = targets.len();
  if n == 0 {
    return;
  }
  // a tenth of the heart is outline, two fifths of saturn is the ball
  let outline = n.div_ceil(10);
  let ball = (2 * n).div_ceil(5);
  let bulge = (n as f32 * GALAXY_BULGE_FRACTION) as usize;

  for (k, slot) in targets.iter_mut().enumerate() {
    let u = rng.gen::<f32>() * TAU;
    let v = rng.gen::<f32>() * PI;

    *slot = match shape {
      Shape::Heart if k < outline => {
        let t = k as f32 / outline as f32 * TAU;
        let (x, y) = heart_curve(t);
        [
          x + centered(rng, HEART_OUTLINE_JITTER),
          y + centered(rng, HEART_OUTLINE_JITTER),
          centered(rng, HEART_OUTLINE_JITTER),
        ]
      }
      Shape::Heart => {
        // cube root keeps the fill uniform by volume
        let r = rng.gen::<f32>().cbrt();
        let scale = r * v.sin();
        let (x, y) = heart_curve(u);
        [x * scale, y * scale, HEART_DEPTH * v.cos() * r]
      }
      Shape::Saturn if k < ball => spherical(10.0 * rng.gen::<f32>().cbrt(), u, v),
      Shape::Saturn => {
        let r = 18.0 + rng.gen::<f32>() * 6.0;
        let x = r * u.cos();
        let y = centered(rng, 1.5);
        let z = r * u.sin();
        [x, y * 0.86 - z * 0.5, y * 0.5 + z * 0.86]
      }
      Shape::Buddha => {
        let r = 15.0 * (0.7 + 0.3 * (v * 3.0).sin());
        [
          r * v.sin() * u.cos() * 0.8,
          r * v.cos() * 1.2 + 5.0,
          r * v.sin() * u.sin() * 0.8,
        ]
      }
      Shape::Spiral => {
        let angle = k as f32 * SPIRAL_STEP;
        let r = k as f32 * SPIRAL_GROWTH;
        [angle.cos() * r, centered(rng, 5.0), angle.sin() * r]
      }
      Shape::Sphere => spherical(SPHERE_RADIUS, u, v),
      Shape::Flower => {
        let t = k as f32 * SPIRAL_STEP;
        let r = FLOWER_RADIUS * (5.0 * t).sin();
        [r * t.cos(), centered(rng, 2.0), r * t.sin()]
      }
      Shape::Galaxy if k < bulge => {
        let [x, y, z] = spherical(4.0 * rng.gen::<f32>().cbrt(), u, v);
        [x, y * 0.5, z]
      }
      Shape::Galaxy => {
        let arm = (k % GALAXY_ARMS as usize) as f32;
        let r = rng.gen::<f32>().sqrt() * GALAXY_RADIUS;
        let theta = arm * TAU / GALAXY_ARMS as f32 + r * GALAXY_WINDING + centered(rng, 0.6);
        let thickness = 1.5 * (1.0 - r / GALAXY_RADIUS) + 0.3;
        [r * theta.cos(), centered(rng, thickness), r * theta.sin()]
      }
    };
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::{InnerSpace, Vector3};
  use rand::{rngs::SmallRng, SeedableRng};

  const N: usize = 5_000;

  fn sample(shape: Shape) -> Vec<Point> {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut targets = vec![[f32::NAN; 3]; N];
    fill_targets(shape, &mut targets, &mut rng);
    targets
  }

  fn length(p: &Point) -> f32 {
    Vector3::from(*p).magnitude()
  }

  fn planar(p: &Point) -> f32 {
    Vector3::new(p[0], 0.0, p[2]).magnitude()
  }

  #[test]
  fn every_shape_fills_every_point() {
    for shape in Shape::ALL {
      let targets = sample(shape);
      assert!(
        targets.iter().flatten().all(|c| c.is_finite()),
        "{shape:?} left a non-finite coordinate"
      );
    }
  }

  #[test]
  fn heart_outline_follows_the_curve() {
    let targets = sample(Shape::Heart);
    let outline = N / 10;
    let tolerance = HEART_OUTLINE_JITTER / 2.0 + 1e-4;
    for (k, p) in targets[..outline].iter().enumerate() {
      let (x, y) = heart_curve(k as f32 / outline as f32 * TAU);
      assert!((p[0] - x).abs() <= tolerance, "x at {k}");
      assert!((p[1] - y).abs() <= tolerance, "y at {k}");
      assert!(p[2].abs() <= tolerance, "z at {k}");
    }
  }

  #[test]
  fn heart_fill_stays_within_depth() {
    let targets = sample(Shape::Heart);
    assert!(targets[N / 10..].iter().all(|p| p[2].abs() <= HEART_DEPTH));
  }

  #[test]
  fn sphere_is_a_shell_of_radius_twenty() {
    for p in sample(Shape::Sphere) {
      assert!((length(&p) - SPHERE_RADIUS).abs() < 1e-3);
    }
  }

  #[test]
  fn saturn_splits_into_ball_and_ring() {
    let targets = sample(Shape::Saturn);
    let ball = N * 2 / 5;
    assert!(targets[..ball].iter().all(|p| length(p) <= 10.0 + 1e-3));
    // the tilt is a near-rotation, so ring points keep roughly their radius
    for p in &targets[ball..] {
      let r = length(p);
      assert!(r > 17.0 && r < 25.5, "ring radius {r}");
    }
  }

  #[test]
  fn spiral_radius_grows_with_index() {
    let targets = sample(Shape::Spiral);
    assert!(planar(&targets[0]) < 1e-6);
    for (k, p) in targets.iter().enumerate() {
      let r = k as f32 * SPIRAL_GROWTH;
      assert!((planar(p) - r).abs() <= r * 1e-4 + 1e-4, "radius at {k}");
      assert!(p[1].abs() <= 2.5);
    }
  }

  #[test]
  fn full_size_spiral_reaches_far_out() {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut targets = vec![[0.0; 3]; 20_000];
    fill_targets(Shape::Spiral, &mut targets, &mut rng);
    assert!((planar(&targets[19_999]) - 1799.91).abs() < 0.5);
  }

  #[test]
  fn flower_follows_the_rose_curve() {
    let targets = sample(Shape::Flower);
    for (k, p) in targets.iter().enumerate() {
      let t = k as f32 * SPIRAL_STEP;
      let r = FLOWER_RADIUS * (5.0 * t).sin();
      assert!((p[0] - r * t.cos()).abs() < 1e-3, "x at {k}");
      assert!((p[2] - r * t.sin()).abs() < 1e-3, "z at {k}");
      assert!(p[1].abs() <= 1.0);
    }
  }

  #[test]
  fn buddha_radius_stays_in_band() {
    for p in sample(Shape::Buddha) {
      let unscaled = Vector3::new(p[0] / 0.8, (p[1] - 5.0) / 1.2, p[2] / 0.8);
      let r = unscaled.magnitude();
      assert!((6.0 - 1e-3..=15.0 + 1e-3).contains(&r), "buddha radius {r}");
    }
  }

  #[test]
  fn partial_fractions_round_up() {
    let mut rng = SmallRng::seed_from_u64(5);
    // 13 points: 2 outline points on the heart, 6 ball points on saturn
    let mut targets = vec![[0.0; 3]; 13];
    fill_targets(Shape::Heart, &mut targets, &mut rng);
    let (x, y) = heart_curve(TAU / 2.0);
    assert!((targets[1][0] - x).abs() <= 0.25 + 1e-4);
    assert!((targets[1][1] - y).abs() <= 0.25 + 1e-4);
    fill_targets(Shape::Saturn, &mut targets, &mut rng);
    assert!(targets[..6].iter().all(|p| length(p) <= 10.0 + 1e-3));
    assert!(targets[6..].iter().all(|p| length(p) > 17.0));
  }

  #[test]
  fn galaxy_stays_inside_its_disc() {
    let targets = sample(Shape::Galaxy);
    for p in &targets {
      assert!(planar(p) <= GALAXY_RADIUS + 1e-3);
      assert!(p[1].abs() <= 2.5);
    }
  }

  #[test]
  fn seeded_generation_is_deterministic() {
    assert_eq!(sample(Shape::Buddha), sample(Shape::Buddha));
    assert_ne!(sample(Shape::Buddha), sample(Shape::Sphere));
  }

  #[test]
  fn empty_and_tiny_buffers_are_fine() {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut empty: Vec<Point> = Vec::new();
    fill_targets(Shape::Heart, &mut empty, &mut rng);
    let mut one = vec![[0.0; 3]; 1];
    for shape in Shape::ALL {
      fill_targets(shape, &mut one, &mut rng);
      assert!(one[0].iter().all(|c| c.is_finite()));
    }
  }

  #[test]
  fn shapes_cycle_and_map_to_digits() {
    assert_eq!(Shape::Galaxy.next(), Shape::Heart);
    assert_eq!(Shape::Heart.next(), Shape::Saturn);
    assert_eq!(Shape::from_digit(1), Some(Shape::Heart));
    assert_eq!(Shape::from_digit(7), Some(Shape::Galaxy));
    assert_eq!(Shape::from_digit(0), None);
    assert_eq!(Shape::from_digit(8), None);
  }
}
