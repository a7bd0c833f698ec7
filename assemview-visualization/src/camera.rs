//! Camera and orbit controls for 3D visualization

use std::f32::consts::PI;

use assemview_core::{Bounds, Point3f, Vector3f};
use nalgebra::{Matrix4, Perspective3, Point3, Vector3};

use crate::config::{CameraConfig, ControlsConfig};

/// Maps OpenGL clip depth (-1..1) to the 0..1 range wgpu expects
#[rustfmt::skip]
const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// A perspective camera looking at a target
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Camera described by a viewer configuration
    pub fn from_config(config: &CameraConfig, aspect_ratio: f32) -> Self {
        let [px, py, pz] = config.position;
        let [tx, ty, tz] = config.target;
        Self::new(
            Point3::new(px, py, pz),
            Point3::new(tx, ty, tz),
            Vector3::y(),
            config.fov_degrees.to_radians(),
            aspect_ratio,
            config.near,
            config.far,
        )
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix in wgpu clip space
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        OPENGL_TO_WGPU_MATRIX * perspective.into_inner()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 16.0 / 9.0)
    }
}

/// Orbit controls: rotate around a target, pan it, dolly towards it.
///
/// Input handlers only accumulate deltas; [`OrbitControls::update`] applies
/// them to the camera once per frame. With damping the accumulated delta is
/// applied a fraction at a time and decays geometrically, which gives the
/// camera inertia after the mouse is released.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits, measured from +Y
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    theta_delta: f32,
    phi_delta: f32,
    pan_offset: Vector3f,
    scale: f32,
}

const EPS: f32 = 1e-6;

impl OrbitControls {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            enable_zoom: config.enable_zoom,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            theta_delta: 0.0,
            phi_delta: 0.0,
            pan_offset: Vector3f::zeros(),
            scale: 1.0,
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.theta_delta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.phi_delta -= angle;
    }

    /// Rotate by a mouse drag of `(dx, dy)` pixels; a drag across the full
    /// viewport height turns one full circle
    pub fn rotate_drag(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
        self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
    }

    /// Pan by a mouse drag so the point under the cursor follows it
    pub fn pan_drag(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &Camera) {
        let height = viewport_height.max(1.0);
        let target_distance = camera.distance() * (camera.fov / 2.0).tan();
        let view = camera.view_matrix();
        // rows of the view rotation are the camera axes in world space
        let right = Vector3f::new(view[(0, 0)], view[(0, 1)], view[(0, 2)]);
        let up = Vector3f::new(view[(1, 0)], view[(1, 1)], view[(1, 2)]);

        let left_amount = 2.0 * dx * target_distance / height * self.pan_speed;
        let up_amount = 2.0 * dy * target_distance / height * self.pan_speed;
        self.pan_offset += -right * left_amount + up * up_amount;
    }

    /// Dolly by a wheel step; positive moves closer. Ignored when zoom is
    /// disabled.
    pub fn dolly(&mut self, wheel_delta: f32) {
        if !self.enable_zoom || wheel_delta == 0.0 {
            return;
        }
        let zoom_scale = 0.95f32.powf(self.zoom_speed * wheel_delta.abs());
        if wheel_delta > 0.0 {
            self.scale *= zoom_scale;
        } else {
            self.scale /= zoom_scale;
        }
    }

    /// Advance one step. Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - camera.target;
        let radius = offset.norm();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.theta_delta * factor;
        phi += self.phi_delta * factor;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        let target = camera.target + self.pan_offset * factor;

        let new_offset = Vector3f::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        let new_position = target + new_offset;
        let moved = (new_position - camera.position).norm_squared() > EPS
            || (target - camera.target).norm_squared() > EPS;

        camera.position = new_position;
        camera.target = target;

        if self.enable_damping {
            self.theta_delta *= 1.0 - self.damping_factor;
            self.phi_delta *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vector3f::zeros();
        }
        self.scale = 1.0;
        moved
    }

    /// Drop any motion still in flight
    pub fn stop(&mut self) {
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.pan_offset = Vector3f::zeros();
        self.scale = 1.0;
    }

    /// Put the camera back at its configured home pose
    pub fn reset(&mut self, camera: &mut Camera, home: &CameraConfig) {
        self.stop();
        *camera = Camera::from_config(home, camera.aspect_ratio);
    }

    /// Aim at the center of `bounds` from far enough away to see all of it,
    /// keeping the current viewing direction
    pub fn frame(&mut self, camera: &mut Camera, bounds: Bounds) {
        self.stop();
        let (min, max) = bounds;
        let center = Point3f::from((min.coords + max.coords) / 2.0);
        let radius = ((max - min).norm() / 2.0).max(EPS);
        let distance = radius / (camera.fov / 2.0).sin();

        let direction = (camera.position - camera.target)
            .try_normalize(EPS)
            .unwrap_or_else(Vector3f::z);
        camera.target = center;
        camera.position = center + direction * distance;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(&ControlsConfig::default())
    }
}
