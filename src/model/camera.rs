use glam::{Mat3, Mat4, Vec2, Vec3};

use crate::model::Viewport;

pub const MAX_PITCH: f32 = 89.0;
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Tuning for keyboard/mouse driven camera motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    /// World units per frame for each held movement key
    pub move_speed: f32,
    /// Degrees per pixel of cursor travel
    pub rotation_speed: f32,
    pub default_position: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            move_speed: 0.05,
            rotation_speed: 0.8,
            default_position: Vec3::new(0.0, 0.0, 3.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionSettings {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            z_near: 0.01,
            z_far: 30.0,
        }
    }
}

/// Camera position plus yaw/pitch in degrees.
///
/// Yaw always lies in `[0, 360)` and pitch in `[-89, 89]`; every mutation
/// goes through [`wrap_yaw`] / [`clamp_pitch`] so the invariants hold after
/// each individual increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new(CameraSettings::default().default_position)
    }
}

impl CameraPose {
    pub fn new(position: Vec3) -> Self {
        Self { position, yaw: 0.0, pitch: 0.0 }
    }

    pub fn yaw(&self) -> f32 { self.yaw }

    pub fn pitch(&self) -> f32 { self.pitch }

    pub fn set_yaw(&mut self, degrees: f32) {
        if degrees.is_finite() {
            self.yaw = wrap_yaw(degrees);
        }
    }

    pub fn set_pitch(&mut self, degrees: f32) {
        if degrees.is_finite() {
            self.pitch = clamp_pitch(degrees);
        }
    }

    /// Adds a translation and a `(yaw, pitch)` rotation in degrees.
    pub fn apply_deltas(&mut self, translation: Vec3, rotation: Vec2) {
        if translation.is_finite() {
            self.position += translation;
        }
        self.set_yaw(self.yaw + rotation.x);
        self.set_pitch(self.pitch + rotation.y);
    }

    pub fn reset_to_default(&mut self, default_position: Vec3) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.position = default_position;
    }

    /// Unit view direction: yaw about world Y applied outside pitch about X, on -Z.
    pub fn front(&self) -> Vec3 {
        let rotation = Mat3::from_rotation_y(self.yaw.to_radians())
            * Mat3::from_rotation_x(self.pitch.to_radians());
        (rotation * Vec3::NEG_Z).normalize()
    }

    pub fn right(&self) -> Vec3 {
        WORLD_UP.cross(-self.front()).normalize()
    }

    pub fn up(&self) -> Vec3 {
        (-self.front()).cross(self.right()).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), WORLD_UP)
    }
}

/// Wraps any finite angle into `[0, 360)`.
pub fn wrap_yaw(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

pub fn clamp_pitch(degrees: f32) -> f32 {
    degrees.clamp(-MAX_PITCH, MAX_PITCH)
}

pub fn projection_matrix(settings: &ProjectionSettings, viewport: &Viewport) -> Mat4 {
    Mat4::perspective_rh(
        settings.fov_y_degrees.to_radians(),
        viewport.aspect(),
        settings.z_near,
        settings.z_far,
    )
}

/// View and projection for one frame. Pure; safe to call any number of times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewProjection {
    pub view: Mat4,
    pub projection: Mat4,
}

impl ViewProjection {
    pub fn derive(pose: &CameraPose, viewport: &Viewport, settings: &ProjectionSettings) -> Self {
        Self {
            view: pose.view_matrix(),
            projection: projection_matrix(settings, viewport),
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn yaw_wraps_into_range() {
        for input in [-720.5, -360.0, -0.0001, 0.0, 359.9999, 360.0, 725.0, 1.0e6] {
            let w = wrap_yaw(input);
            assert!((0.0..360.0).contains(&w), "{input} wrapped to {w}");
        }
        assert!((wrap_yaw(370.0) - 10.0).abs() < 1e-4);
        assert!((wrap_yaw(-10.0) - 350.0).abs() < 1e-4);
    }

    #[test]
    fn pitch_never_leaves_bounds() {
        let mut pose = CameraPose::default();
        pose.apply_deltas(Vec3::ZERO, Vec2::new(0.0, 500.0));
        assert_eq!(pose.pitch(), MAX_PITCH);
        pose.apply_deltas(Vec3::ZERO, Vec2::new(0.0, -10_000.0));
        assert_eq!(pose.pitch(), -MAX_PITCH);
    }

    #[test]
    fn small_increments_match_one_large_delta() {
        let mut stepped = CameraPose::default();
        for _ in 0..10 {
            stepped.apply_deltas(Vec3::new(0.1, 0.0, 0.0), Vec2::new(2.0, 3.0));
        }
        let mut single = CameraPose::default();
        single.apply_deltas(Vec3::new(1.0, 0.0, 0.0), Vec2::new(20.0, 30.0));

        assert!(approx(stepped.position, single.position));
        assert!((stepped.yaw() - single.yaw()).abs() < 1e-4);
        assert!((stepped.pitch() - single.pitch()).abs() < 1e-4);
    }

    #[test]
    fn non_finite_rotation_is_ignored() {
        let mut pose = CameraPose::default();
        pose.apply_deltas(Vec3::ZERO, Vec2::new(f32::NAN, f32::INFINITY));
        assert_eq!(pose.yaw(), 0.0);
        assert_eq!(pose.pitch(), 0.0);
    }

    #[test]
    fn default_pose_looks_down_negative_z() {
        let pose = CameraPose::default();
        assert!(approx(pose.front(), Vec3::NEG_Z));
        assert!(approx(pose.right(), Vec3::X));
        assert!(approx(pose.up(), Vec3::Y));
    }

    #[test]
    fn yaw_turns_left_about_world_up() {
        let mut pose = CameraPose::default();
        pose.set_yaw(90.0);
        assert!(approx(pose.front(), Vec3::NEG_X));
    }

    #[test]
    fn yaw_is_outer_rotation() {
        let mut pose = CameraPose::default();
        pose.set_yaw(90.0);
        pose.set_pitch(45.0);
        let front = pose.front();
        // pitching up must not introduce any z drift once yawed onto -X
        assert!(front.z.abs() < 1e-5);
        assert!(front.y > 0.0 && front.x < 0.0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut pose = CameraPose::default();
        pose.apply_deltas(Vec3::new(4.0, -2.0, 9.0), Vec2::new(123.0, -40.0));
        pose.reset_to_default(Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(pose, CameraPose::default());
    }

    #[test]
    fn view_projection_is_deterministic() {
        let pose = CameraPose::default();
        let viewport = Viewport::new(800, 600);
        let settings = ProjectionSettings::default();
        let a = ViewProjection::derive(&pose, &viewport, &settings);
        let b = ViewProjection::derive(&pose, &viewport, &settings);
        assert_eq!(a, b);

        // the camera position maps to the view-space origin
        let origin = a.view.transform_point3(pose.position);
        assert!(approx(origin, Vec3::ZERO));
    }
}
