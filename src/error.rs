use std::fmt;

/// Everything in the app that can fail. The simulation math itself never does.
#[derive(Debug)]
pub enum Error {
  /// A color string that is not `#rrggbb`.
  Color(String),
  /// Hand landmark slice too short to contain the tracked joints.
  Landmarks(usize),
  /// Rejected settings, with a description of the offending field.
  Settings(String),
  EventLoop(winit::error::EventLoopError),
  Window(winit::error::OsError),
  Surface(wgpu::CreateSurfaceError),
  /// The surface reported no configuration compatible with the adapter.
  SurfaceConfig,
  NoAdapter,
  Device(wgpu::RequestDeviceError),
  Signal(ctrlc::Error),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Error::Color(s) => write!(f, "invalid color {s:?}, expected #rrggbb"),
      Error::Landmarks(n) => write!(f, "expected at least 21 hand landmarks, got {n}"),
      Error::Settings(msg) => write!(f, "invalid settings: {msg}"),
      Error::EventLoop(e) => write!(f, "event loop failed: {e}"),
      Error::Window(e) => write!(f, "failed to create window: {e}"),
      Error::Surface(e) => write!(f, "failed to create GPU surface: {e}"),
      Error::SurfaceConfig => write!(f, "surface is not supported by the selected adapter"),
      Error::NoAdapter => write!(f, "no compatible GPU adapter found"),
      Error::Device(e) => write!(f, "failed to create GPU device: {e}"),
      Error::Signal(e) => write!(f, "failed to install Ctrl-C handler: {e}"),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Error::EventLoop(e) => Some(e),
      Error::Window(e) => Some(e),
      Error::Surface(e) => Some(e),
      Error::Device(e) => Some(e),
      Error::Signal(e) => Some(e),
      _ => None,
    }
  }
}

impl From<winit::error::EventLoopError> for Error {
  fn from(e: winit::error::EventLoopError) -> Self {
    Error::EventLoop(e)
  }
}

impl From<winit::error::OsError> for Error {
  fn from(e: winit::error::OsError) -> Self {
    Error::Window(e)
  }
}

impl From<wgpu::CreateSurfaceError> for Error {
  fn from(e: wgpu::CreateSurfaceError) -> Self {
    Error::Surface(e)
  }
}

impl From<wgpu::RequestDeviceError> for Error {
  fn from(e: wgpu::RequestDeviceError) -> Self {
    Error::Device(e)
  }
}

impl From<ctrlc::Error> for Error {
  fn from(e: ctrlc::Error) -> Self {
    Error::Signal(e)
  }
}

pub type Result<T> = std::result::Result<T, Error>;
