pub mod camera;
pub mod error;
pub mod gesture;
pub mod physics;
pub mod render;
pub mod shapes;
pub mod state;

use crate::error::{Error, Result};
use crate::shapes::Shape;
use std::str::FromStr;

/// A single particle position, laid out so a `&[Point]` can be uploaded as is.
pub type Point = [f32; 3];

/// Which input drives the interaction factor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
  /// Hand openness from the hand tracker.
  Camera,
  /// Click-triggered explosions.
  Mouse,
}

impl Mode {
  #[must_use]
  pub fn toggled(self) -> Self {
    match self {
      Mode::Camera => Mode::Mouse,
      Mode::Mouse => Mode::Camera,
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rgb {
  pub r: f32,
  pub g: f32,
  pub b: f32,
}

impl Rgb {
  pub const CYAN: Rgb = Rgb { r: 0.0, g: 251.0 / 255.0, b: 1.0 };
  pub const MAGENTA: Rgb = Rgb { r: 1.0, g: 0.0, b: 200.0 / 255.0 };
  pub const GOLD: Rgb = Rgb { r: 1.0, g: 200.0 / 255.0, b: 40.0 / 255.0 };
  pub const LIME: Rgb = Rgb { r: 120.0 / 255.0, g: 1.0, b: 80.0 / 255.0 };
  pub const VIOLET: Rgb = Rgb { r: 150.0 / 255.0, g: 90.0 / 255.0, b: 1.0 };
  pub const WHITE: Rgb = Rgb { r: 1.0, g: 1.0, b: 1.0 };

  /// Colors the color key cycles through.
  pub const PALETTE: [Rgb; 6] = [
    Rgb::CYAN,
    Rgb::MAGENTA,
    Rgb::GOLD,
    Rgb::LIME,
    Rgb::VIOLET,
    Rgb::WHITE,
  ];

  #[must_use]
  pub fn to_array(self) -> [f32; 3] {
    [self.r, self.g, self.b]
  }

  /// The palette entry after this one; colors outside the palette start it over.
  #[must_use]
  pub fn next_in_palette(self) -> Self {
    match Self::PALETTE.iter().position(|c| *c == self) {
      Some(i) => Self::PALETTE[(i + 1) % Self::PALETTE.len()],
      None => Self::PALETTE[0],
    }
  }
}

impl FromStr for Rgb {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
      return Err(Error::Color(s.to_string()));
    }
    let channel = |i: usize| {
      u8::from_str_radix(&hex[i..i + 2], 16)
        .map(|c| f32::from(c) / 255.0)
        .map_err(|_| Error::Color(s.to_string()))
    };
    Ok(Self {
      r: channel(0)?,
      g: channel(2)?,
      b: channel(4)?,
    })
  }
}

pub struct Settings {
  pub mode: Mode,
  pub shape: Shape,
  pub color: Rgb,
  pub size: f32,
  /// Radians per frame about +Y.
  pub rotation: f32,
  pub sensitivity: f32,
  pub particle_count: u32,
  pub seed: Option<u64>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      mode: Mode::Camera,
      shape: Shape::Heart,
      color: Rgb::CYAN,
      size: 0.15,
      rotation: 0.003,
      sensitivity: 4.0,
      particle_count: 20_000,
      seed: None,
    }
  }
}

impl Settings {
  pub fn validate(&self) -> Result<()> {
    if self.particle_count == 0 {
      return Err(Error::Settings("particle count must be positive".into()));
    }
    if !(self.size.is_finite() && self.size > 0.0) {
      return Err(Error::Settings(format!("point size {} must be positive", self.size)));
    }
    if !(self.sensitivity.is_finite() && self.sensitivity >= 0.0) {
      return Err(Error::Settings(format!(
        "sensitivity {} must be non-negative",
        self.sensitivity
      )));
    }
    if !self.rotation.is_finite() {
      return Err(Error::Settings("rotation must be finite".into()));
    }
    Ok(())
  }
}

pub struct CameraParams {
  pub speed: f32,
  pub rotational_speed: f32,
}

impl Default for CameraParams {
  fn default() -> Self {
    Self {
      speed: 1.0,
      rotational_speed: 0.02,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_hex_color() {
    let c: Rgb = "#00fbff".parse().unwrap();
    assert_eq!(c.r, 0.0);
    assert!((c.g - 251.0 / 255.0).abs() < 1e-6);
    assert_eq!(c.b, 1.0);
    assert_eq!("ff0000".parse::<Rgb>().unwrap().to_array(), [1.0, 0.0, 0.0]);
  }

  #[test]
  fn rejects_bad_colors() {
    for bad in ["", "#fff", "#gg0000", "#00fbff0", "#ééé", "#+1+2+3", "+1+2+3"] {
      assert!(matches!(bad.parse::<Rgb>(), Err(Error::Color(_))), "{bad}");
    }
  }

  #[test]
  fn default_settings_are_valid() {
    let settings = Settings::default();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.color, "#00fbff".parse::<Rgb>().unwrap());
  }

  #[test]
  fn validate_rejects_out_of_range_values() {
    let zero = Settings {
      particle_count: 0,
      ..Settings::default()
    };
    assert!(zero.validate().is_err());
    let negative = Settings {
      sensitivity: -1.0,
      ..Settings::default()
    };
    assert!(negative.validate().is_err());
    let tiny = Settings {
      size: 0.0,
      ..Settings::default()
    };
    assert!(tiny.validate().is_err());
  }

  #[test]
  fn palette_cycles_and_restarts_for_custom_colors() {
    assert_eq!(Rgb::CYAN.next_in_palette(), Rgb::MAGENTA);
    assert_eq!(Rgb::WHITE.next_in_palette(), Rgb::CYAN);
    let custom: Rgb = "#123456".parse().unwrap();
    assert_eq!(custom.next_in_palette(), Rgb::CYAN);
  }

  #[test]
  fn mode_toggles() {
    assert_eq!(Mode::Camera.toggled(), Mode::Mouse);
    assert_eq!(Mode::Mouse.toggled(), Mode::Camera);
  }
}
