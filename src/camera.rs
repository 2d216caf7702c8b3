use crate::CameraParams;
use cgmath::{InnerSpace, Rad, Rotation, Rotation3, SquareMatrix};
use winit::{
  event::{ElementState, KeyEvent, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub struct Camera {
  pub eye: cgmath::Point3<f32>,
  pub target: cgmath::Point3<f32>,
  pub up: cgmath::Vector3<f32>,
  pub aspect: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Camera {
  /// Looks at the origin from slightly above, far enough back to frame every shape.
  #[must_use]
  pub fn new(aspect: f32) -> Self {
    Self {
      eye: (0.0, 10.0, 60.0).into(),
      target: (0.0, 0.0, 0.0).into(),
      up: cgmath::Vector3::unit_y(),
      aspect,
      fovy: 75.0,
      znear: 0.1,
      zfar: 2000.0,
    }
  }

  pub fn resize(&mut self, width: u32, height: u32) {
    self.aspect = width.max(1) as f32 / height.max(1) as f32;
  }

  fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
    let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
    let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
    OPENGL_TO_WGPU_MATRIX * proj * view
  }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
  view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
  fn default() -> Self {
    Self {
      view_proj: cgmath::Matrix4::identity().into(),
    }
  }
}

impl CameraUniform {
  pub fn update_view_proj(&mut self, camera: &Camera) {
    self.view_proj = camera.build_view_projection_matrix().into();
  }
}

pub struct CameraController {
  speed: f32,
  rotation_speed: f32,
  is_forward_pressed: bool,
  is_backward_pressed: bool,
  is_left_pressed: bool,
  is_right_pressed: bool,
  is_rotate_up_pressed: bool,
  is_rotate_down_pressed: bool,
}

impl CameraController {
  #[must_use]
  pub fn init(params: &CameraParams) -> Self {
    Self {
      speed: params.speed,
      rotation_speed: params.rotational_speed,
      is_forward_pressed: false,
      is_backward_pressed: false,
      is_left_pressed: false,
      is_right_pressed: false,
      is_rotate_up_pressed: false,
      is_rotate_down_pressed: false,
    }
  }

  /// Returns true when the key belongs to the camera.
  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => self.process_key(*keycode, *state == ElementState::Pressed),
      _ => false,
    }
  }

  fn process_key(&mut self, keycode: KeyCode, is_pressed: bool) -> bool {
    let flag = match keycode {
      KeyCode::KeyW | KeyCode::ArrowUp => &mut self.is_forward_pressed,
      KeyCode::KeyA | KeyCode::ArrowLeft => &mut self.is_left_pressed,
      KeyCode::KeyS | KeyCode::ArrowDown => &mut self.is_backward_pressed,
      KeyCode::KeyD | KeyCode::ArrowRight => &mut self.is_right_pressed,
      KeyCode::KeyQ => &mut self.is_rotate_up_pressed,
      KeyCode::KeyE => &mut self.is_rotate_down_pressed,
      _ => return false,
    };
    *flag = is_pressed;
    true
  }

  pub fn update_camera(&self, camera: &mut Camera) {
    let forward = camera.target - camera.eye;
    let forward_norm = forward.normalize();
    let forward_mag = forward.magnitude();

    if self.is_forward_pressed && forward_mag > self.speed {
      camera.eye += forward_norm * self.speed;
    }
    if self.is_backward_pressed {
      camera.eye -= forward_norm * self.speed;
    }

    let right = forward_norm.cross(camera.up);
    let forward = camera.target - camera.eye;
    let forward_mag = forward.magnitude();

    if self.is_right_pressed {
      camera.eye = camera.target - (forward + right * self.speed).normalize() * forward_mag;
    }
    if self.is_left_pressed {
      camera.eye = camera.target - (forward - right * self.speed).normalize() * forward_mag;
    }

    for (pressed, angle) in [
      (self.is_rotate_up_pressed, self.rotation_speed),
      (self.is_rotate_down_pressed, -self.rotation_speed),
    ] {
      if pressed {
        let forward = camera.target - camera.eye;
        let rotation = cgmath::Quaternion::from_axis_angle(right.normalize(), Rad(angle));
        camera.eye = camera.target - rotation.rotate_vector(forward);
        camera.up = rotation.rotate_vector(camera.up);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cgmath::{MetricSpace, Vector4};

  #[test]
  fn target_projects_to_screen_center() {
    let camera = Camera::new(16.0 / 9.0);
    let clip = camera.build_view_projection_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert!((clip.x / clip.w).abs() < 1e-5);
    assert!((clip.y / clip.w).abs() < 1e-5);
    let depth = clip.z / clip.w;
    assert!((0.0..=1.0).contains(&depth));
  }

  #[test]
  fn resize_guards_against_zero_height() {
    let mut camera = Camera::new(1.0);
    camera.resize(800, 0);
    assert_eq!(camera.aspect, 800.0);
  }

  #[test]
  fn dolly_and_orbit_keep_looking_at_target() {
    let mut camera = Camera::new(1.0);
    let mut controller = CameraController::init(&CameraParams::default());
    let start = camera.eye.distance(camera.target);

    assert!(controller.process_key(KeyCode::KeyW, true));
    controller.update_camera(&mut camera);
    assert!(camera.eye.distance(camera.target) < start);
    controller.process_key(KeyCode::KeyW, false);

    let before = camera.eye.distance(camera.target);
    controller.process_key(KeyCode::KeyD, true);
    controller.update_camera(&mut camera);
    assert!((camera.eye.distance(camera.target) - before).abs() < 1e-3);
    assert_ne!(camera.eye.x, 0.0);
  }

  #[test]
  fn unrelated_keys_pass_through() {
    let mut controller = CameraController::init(&CameraParams::default());
    assert!(!controller.process_key(KeyCode::Space, true));
    assert!(!controller.process_key(KeyCode::Digit1, true));
  }
}
