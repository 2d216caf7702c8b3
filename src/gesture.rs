//! Hand gesture interpretation.
//!
//! Landmark detection itself happens elsewhere; this module only turns one
//! hand's normalized landmarks into the interaction scalars.

use crate::error::{Error, Result};
use crate::physics::Interaction;
use crate::{Mode, Point};

pub const LANDMARK_COUNT: usize = 21;
const WRIST: usize = 0;
const THUMB_TIP: usize = 4;
const PINKY_TIP: usize = 20;
/// Thumb-to-pinky span of a relaxed, closed hand.
const CLOSED_SPAN: f32 = 0.15;
const MAX_SPAN: f32 = 0.6;
const OFFSET_SCALE_X: f32 = -100.0;
const OFFSET_SCALE_Y: f32 = -60.0;

/// One hand's landmarks in normalized image coordinates (0..1, y down).
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks([[f32; 2]; LANDMARK_COUNT]);

impl HandLandmarks {
  /// Takes the first 21 landmarks; extra entries are ignored.
  pub fn from_slice(points: &[[f32; 2]]) -> Result<Self> {
    let head = points
      .get(..LANDMARK_COUNT)
      .ok_or(Error::Landmarks(points.len()))?;
    let mut landmarks = [[0.0; 2]; LANDMARK_COUNT];
    landmarks.copy_from_slice(head);
    Ok(Self(landmarks))
  }

  #[must_use]
  pub fn get(&self, index: usize) -> Option<[f32; 2]> {
    self.0.get(index).copied()
  }

  fn span(&self) -> f32 {
    let [tx, ty] = self.0[THUMB_TIP];
    let [px, py] = self.0[PINKY_TIP];
    (tx - px).hypot(ty - py)
  }
}

/// How far open the hand is, zero for a closed fist.
#[must_use]
pub fn openness(hand: &HandLandmarks, sensitivity: f32) -> f32 {
  ((hand.span() - CLOSED_SPAN) * sensitivity).max(0.0)
}

/// World-space translation for a hand, mirrored so it follows the user.
#[must_use]
pub fn hand_offset(hand: &HandLandmarks) -> Point {
  let [x, y] = hand.0[WRIST];
  [(x - 0.5) * OFFSET_SCALE_X, (y - 0.5) * OFFSET_SCALE_Y, 0.0]
}

impl Interaction {
  /// Feeds one tracker result. A lost hand drops openness but keeps the last offset.
  pub fn observe_hand(&mut self, hand: Option<&HandLandmarks>, sensitivity: f32) {
    match hand {
      Some(hand) => {
        self.hand_open = openness(hand, sensitivity);
        if self.mode == Mode::Camera {
          self.hand_pos = hand_offset(hand);
        }
        log::trace!("hand open {:.3} at {:?}", self.hand_open, self.hand_pos);
      }
      None => {
        if self.hand_open != 0.0 {
          log::debug!("hand lost");
        }
        self.hand_open = 0.0;
      }
    }
  }
}

/// Anything that can report at most one tracked hand per frame.
pub trait HandSource {
  fn poll(&mut self) -> Option<HandLandmarks>;
}

/// Stand-in tracker driven by the mouse: the cursor is the wrist and the
/// scroll wheel opens or closes the hand.
#[derive(Debug)]
pub struct CursorHand {
  cursor: Option<[f32; 2]>,
  span: f32,
}

impl Default for CursorHand {
  fn default() -> Self {
    Self {
      cursor: None,
      span: CLOSED_SPAN,
    }
  }
}

impl CursorHand {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cursor_moved(&mut self, x: f64, y: f64, width: u32, height: u32) {
    let nx = (x / f64::from(width.max(1))) as f32;
    let ny = (y / f64::from(height.max(1))) as f32;
    self.cursor = Some([nx.clamp(0.0, 1.0), ny.clamp(0.0, 1.0)]);
  }

  pub fn cursor_left(&mut self) {
    self.cursor = None;
  }

  /// Positive deltas open the hand.
  pub fn scroll(&mut self, delta: f32) {
    self.span = (self.span + delta * 0.02).clamp(0.0, MAX_SPAN);
  }
}

impl HandSource for CursorHand {
  fn poll(&mut self) -> Option<HandLandmarks> {
    let [x, y] = self.cursor?;
    let mut landmarks = [[x, y]; LANDMARK_COUNT];
    let half = self.span / 2.0;
    landmarks[THUMB_TIP] = [x - half, y - 0.1];
    landmarks[PINKY_TIP] = [x + half, y - 0.1];
    Some(HandLandmarks(landmarks))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn hand(wrist: [f32; 2], thumb: [f32; 2], pinky: [f32; 2]) -> HandLandmarks {
    let mut points = vec![wrist; LANDMARK_COUNT];
    points[THUMB_TIP] = thumb;
    points[PINKY_TIP] = pinky;
    HandLandmarks::from_slice(&points).unwrap()
  }

  #[test]
  fn openness_is_clamped_at_zero() {
    let fist = hand([0.5, 0.5], [0.5, 0.4], [0.55, 0.4]);
    assert_eq!(openness(&fist, 4.0), 0.0);
  }

  #[test]
  fn openness_scales_span_past_threshold() {
    let open = hand([0.5, 0.5], [0.3, 0.4], [0.6, 0.4]);
    assert!((openness(&open, 4.0) - 0.6).abs() < 1e-5);
    assert!((openness(&open, 2.0) - 0.3).abs() < 1e-5);
  }

  #[test]
  fn wrist_maps_to_mirrored_offset() {
    let h = hand([0.25, 1.0], [0.0; 2], [0.0; 2]);
    assert_eq!(hand_offset(&h), [25.0, -30.0, 0.0]);
    let centered = hand([0.5, 0.5], [0.0; 2], [0.0; 2]);
    assert_eq!(hand_offset(&centered), [0.0, 0.0, 0.0]);
  }

  #[test]
  fn too_few_landmarks_is_an_error() {
    let err = HandLandmarks::from_slice(&[[0.0; 2]; 5]).unwrap_err();
    assert!(matches!(err, Error::Landmarks(5)));
    assert!(HandLandmarks::from_slice(&[[0.0; 2]; 30]).is_ok());
  }

  #[test]
  fn lost_hand_resets_openness_but_keeps_position() {
    let mut interaction = Interaction::new(Mode::Camera);
    let open = hand([0.0, 0.0], [0.0, 0.0], [0.5, 0.0]);
    interaction.observe_hand(Some(&open), 4.0);
    assert!(interaction.hand_open > 0.0);
    assert_eq!(interaction.hand_pos, [50.0, 30.0, 0.0]);
    interaction.observe_hand(None, 4.0);
    assert_eq!(interaction.hand_open, 0.0);
    assert_eq!(interaction.hand_pos, [50.0, 30.0, 0.0]);
  }

  #[test]
  fn mouse_mode_ignores_hand_position() {
    let mut interaction = Interaction::new(Mode::Mouse);
    let open = hand([0.0, 0.0], [0.0, 0.0], [0.5, 0.0]);
    interaction.observe_hand(Some(&open), 4.0);
    assert!(interaction.hand_open > 0.0);
    assert_eq!(interaction.hand_pos, [0.0; 3]);
  }

  #[test]
  fn cursor_hand_reports_span_and_wrist() {
    let mut source = CursorHand::new();
    assert!(source.poll().is_none());
    source.cursor_moved(200.0, 150.0, 800, 600);
    source.scroll(10.0);
    let h = source.poll().unwrap();
    assert_eq!(h.get(WRIST), Some([0.25, 0.25]));
    assert!((openness(&h, 4.0) - (0.35 - CLOSED_SPAN) * 4.0).abs() < 1e-5);
    source.scroll(100.0);
    assert!((source.poll().unwrap().span() - MAX_SPAN).abs() < 1e-6);
    source.cursor_left();
    assert!(source.poll().is_none());
  }
}
