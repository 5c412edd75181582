use super::camera_utils::{Camera, CameraUniform};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Camera orbiting `target` on a sphere, Y up
///
/// `pitch` is the elevation above the XZ plane and `yaw` the angle around Y
/// measured from +Z toward +X. With damping enabled, rotation input is
/// queued and bled into the orientation a fraction at a time by
/// [`OrbitCamera::update_damping`].
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Fraction of pending rotation applied per update; `None` applies input immediately
    pub damping_factor: Option<f32>,
    pending_yaw: f32,
    pending_pitch: f32,
    pub uniform: CameraUniform,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Will be auto-calculted in `update()` nevertheless.
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Deg(75.0).into(),
            znear: 0.1,
            zfar: 100.0,
            damping_factor: None,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            uniform: CameraUniform::default(),
        };
        camera.update();
        camera
    }

    /// Places the camera at `eye` looking at `target`
    pub fn looking_at(eye: Vector3<f32>, target: Vector3<f32>, aspect: f32) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude();
        let pitch = if distance > 0.0 {
            (offset.y / distance).clamp(-1.0, 1.0).asin()
        } else {
            0.0
        };
        let yaw = offset.x.atan2(offset.z);
        Self::new(distance, pitch, yaw, target, aspect)
    }

    pub fn with_bounds(mut self, bounds: OrbitCameraBounds) -> Self {
        self.bounds = bounds;
        self.set_distance(self.distance);
        self.set_pitch(self.pitch);
        self
    }

    pub fn with_damping(mut self, factor: f32) -> Self {
        self.damping_factor = Some(factor.clamp(f32::EPSILON, 1.0));
        self
    }

    pub fn with_fovy(mut self, fovy: impl Into<Rad<f32>>) -> Self {
        self.fovy = fovy.into();
        self
    }

    pub fn with_clip_planes(mut self, znear: f32, zfar: f32) -> Self {
        self.znear = znear;
        self.zfar = zfar;
        self
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    pub fn add_distance(&mut self, delta: f32) {
        let corrected_zoom = f32::log10(self.distance.max(1.0 + f32::EPSILON)) * delta;
        self.set_distance(self.distance + corrected_zoom);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.max(min_yaw);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.min(max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Rotation input from the controller, damped if damping is enabled
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        match self.damping_factor {
            Some(_) => {
                self.pending_yaw += yaw_delta;
                self.pending_pitch += pitch_delta;
            }
            None => {
                self.add_yaw(yaw_delta);
                self.add_pitch(pitch_delta);
            }
        }
    }

    /// Applies one frame's share of the queued rotation
    pub fn update_damping(&mut self) {
        let Some(factor) = self.damping_factor else {
            return;
        };
        if self.pending_yaw == 0.0 && self.pending_pitch == 0.0 {
            return;
        }
        self.add_yaw(self.pending_yaw * factor);
        self.add_pitch(self.pending_pitch * factor);
        self.pending_yaw *= 1.0 - factor;
        self.pending_pitch *= 1.0 - factor;
        if self.pending_yaw.abs() < 1e-6 && self.pending_pitch.abs() < 1e-6 {
            self.pending_yaw = 0.0;
            self.pending_pitch = 0.0;
        }
    }

    /// Pans the camera relative to the current view direction
    /// delta.0 = horizontal pan (left/right relative to camera view)
    /// delta.1 = vertical pan (up/down relative to camera view)
    pub fn pan(&mut self, delta: (f32, f32)) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        // Scale by distance for consistent feel at all zoom levels
        let pan_scale = self.distance * 0.1;
        let movement = right * delta.0 * pan_scale + up * delta.1 * pan_scale;

        self.target += movement;
        self.update();
    }

    /// Updates the camera after changing `distance`, `pitch` or `yaw`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    /// Zero-sized surfaces keep the previous aspect
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = self.build_view_projection_matrix().into();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: Some(16.0),
            min_pitch: -std::f32::consts::PI / 2.0 + f32::EPSILON,
            max_pitch: std::f32::consts::PI / 2.0 - f32::EPSILON,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

impl OrbitCameraBounds {
    /// Keeps the camera above the ground: the angle from straight up may not
    /// exceed `max_polar_angle`
    pub fn above_ground(max_distance: f32, max_polar_angle: f32) -> Self {
        Self {
            max_distance: Some(max_distance),
            min_pitch: std::f32::consts::FRAC_PI_2 - max_polar_angle,
            ..Default::default()
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn looking_at_reproduces_eye() {
        let camera = OrbitCamera::looking_at(Vector3::new(6.0, 3.0, 6.0), Vector3::zero(), 1.5);
        assert!((camera.eye - Vector3::new(6.0, 3.0, 6.0)).magnitude() < 1e-4);
        assert!((camera.distance - 9.0).abs() < 1e-5);
        assert_eq!(camera.up, Vector3::unit_y());
    }

    #[test]
    fn bounds_clamp_distance_and_keep_camera_above_ground() {
        let mut camera = OrbitCamera::looking_at(Vector3::new(6.0, 3.0, 6.0), Vector3::zero(), 1.0)
            .with_bounds(OrbitCameraBounds::above_ground(13.0, FRAC_PI_2 - 0.05));

        camera.set_distance(50.0);
        assert_eq!(camera.distance, 13.0);

        camera.add_pitch(-10.0);
        assert!((camera.pitch - 0.05).abs() < 1e-6);
        assert!(camera.eye.y > 0.0);
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let mut camera = OrbitCamera::new(9.0, 0.3, 0.0, Vector3::zero(), 1.0).with_damping(0.05);
        camera.rotate(1.0, 0.0);
        assert_eq!(camera.yaw, 0.0);

        camera.update_damping();
        assert!((camera.yaw - 0.05).abs() < 1e-6);
        for _ in 0..500 {
            camera.update_damping();
        }
        assert!((camera.yaw - 1.0).abs() < 1e-3);
    }

    #[test]
    fn resize_sets_aspect_and_ignores_zero() {
        let mut camera = OrbitCamera::new(9.0, 0.3, 0.0, Vector3::zero(), 1.0);
        camera.resize_projection(1200, 800);
        assert_eq!(camera.aspect, 1.5);
        camera.resize_projection(0, 800);
        assert_eq!(camera.aspect, 1.5);
    }
}
