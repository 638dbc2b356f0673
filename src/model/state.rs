use glam::Vec3;
use tracing::info;

use crate::model::{
    CameraPose, CameraSettings, LightKind, LightModel, MaterialModel, ProjectionSettings, Viewport,
};
use crate::model::light::clamp_color;

pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.1, 0.2, 0.3, 0.0];

/// Everything one rendering context owns: camera, light, material and viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub camera: CameraPose,
    pub camera_settings: CameraSettings,
    pub projection: ProjectionSettings,
    pub light: LightModel,
    pub material: MaterialModel,
    pub viewport: Viewport,
    clear_color: [f32; 4],
    /// Exposed on the panel; nothing animates yet.
    pub animation: bool,
}

impl RenderState {
    pub fn new(material: MaterialModel, viewport: Viewport) -> Self {
        let camera_settings = CameraSettings::default();
        Self {
            camera: CameraPose::new(camera_settings.default_position),
            camera_settings,
            projection: ProjectionSettings::default(),
            light: LightModel::default(),
            material,
            viewport,
            clear_color: DEFAULT_CLEAR_COLOR,
            animation: false,
        }
    }

    pub fn clear_color(&self) -> [f32; 4] { self.clear_color }

    pub fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_color = rgba.map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) });
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset_to_default(self.camera_settings.default_position);
        info!(position = ?self.camera.position, "camera reset");
    }

    /// Snapshot of the values the debug panel may edit this frame.
    pub fn panel_values(&self) -> PanelValues {
        PanelValues {
            clear_color: self.clear_color,
            camera_position: self.camera.position,
            camera_yaw: self.camera.yaw(),
            camera_pitch: self.camera.pitch(),
            reset_camera: false,
            light_kind: self.light.kind,
            light_position: self.light.position,
            light_direction: self.light.direction,
            light_distance: self.light.distance(),
            light_cutoff: [self.light.cutoff_inner(), self.light.cutoff_offset()],
            light_ambient: self.light.ambient().to_array(),
            light_diffuse: self.light.diffuse().to_array(),
            light_specular: self.light.specular().to_array(),
            flashlight_mode: self.light.flashlight_mode,
            shininess: self.material.shininess(),
            animation: self.animation,
        }
    }

    /// Writes edited panel values back. Everything is re-validated here, so a
    /// misbehaving widget cannot break the camera or light invariants.
    pub fn apply_panel(&mut self, values: PanelValues) {
        self.set_clear_color(values.clear_color);

        if values.camera_position.is_finite() {
            self.camera.position = values.camera_position;
        }
        self.camera.set_yaw(values.camera_yaw);
        self.camera.set_pitch(values.camera_pitch);
        if values.reset_camera {
            self.reset_camera();
        }

        self.light.kind = values.light_kind;
        if values.light_position.is_finite() {
            self.light.position = values.light_position;
        }
        if values.light_direction.is_finite() {
            self.light.direction = values.light_direction;
        }
        self.light.set_distance(values.light_distance);
        self.light.set_cutoff(values.light_cutoff[0], values.light_cutoff[1]);
        self.light.set_colors(
            clamp_color(Vec3::from_array(values.light_ambient)),
            clamp_color(Vec3::from_array(values.light_diffuse)),
            clamp_color(Vec3::from_array(values.light_specular)),
        );
        if self.light.flashlight_mode != values.flashlight_mode {
            info!(enabled = values.flashlight_mode, "flashlight mode toggled");
            self.light.flashlight_mode = values.flashlight_mode;
        }

        self.material.set_shininess(values.shininess);
        self.animation = values.animation;
    }
}

/// Plain-data copy of the panel-editable parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelValues {
    pub clear_color: [f32; 4],
    pub camera_position: Vec3,
    pub camera_yaw: f32,
    pub camera_pitch: f32,
    /// One-shot "reset camera" button
    pub reset_camera: bool,
    pub light_kind: LightKind,
    pub light_position: Vec3,
    pub light_direction: Vec3,
    pub light_distance: f32,
    /// Inner angle and outer offset, degrees
    pub light_cutoff: [f32; 2],
    pub light_ambient: [f32; 3],
    pub light_diffuse: [f32; 3],
    pub light_specular: [f32; 3],
    pub flashlight_mode: bool,
    pub shininess: f32,
    pub animation: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextureHandle;

    fn state() -> RenderState {
        RenderState::new(
            MaterialModel::new(TextureHandle(0), TextureHandle(1)),
            Viewport::new(800, 600),
        )
    }

    #[test]
    fn untouched_panel_round_trips_state() {
        let mut s = state();
        let before = s.clone();
        let values = s.panel_values();
        s.apply_panel(values);
        assert_eq!(s, before);
    }

    #[test]
    fn panel_edits_are_revalidated() {
        let mut s = state();
        let mut values = s.panel_values();
        values.camera_yaw = -30.0;
        values.camera_pitch = 120.0;
        values.light_distance = 5000.0;
        values.shininess = 0.0;
        values.light_ambient = [2.0, -1.0, 0.5];
        values.clear_color = [1.5, 0.5, 0.5, 1.0];
        s.apply_panel(values);

        assert!((s.camera.yaw() - 330.0).abs() < 1e-4);
        assert_eq!(s.camera.pitch(), 89.0);
        assert_eq!(s.light.distance(), 3000.0);
        assert_eq!(s.material.shininess(), 1.0);
        assert_eq!(s.light.ambient(), Vec3::new(1.0, 0.0, 0.5));
        assert_eq!(s.clear_color(), [1.0, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn reset_button_wins_over_same_frame_edits() {
        let mut s = state();
        let mut values = s.panel_values();
        values.camera_position = Vec3::new(10.0, 10.0, 10.0);
        values.camera_yaw = 45.0;
        values.reset_camera = true;
        s.apply_panel(values);

        assert_eq!(s.camera, CameraPose::new(Vec3::new(0.0, 0.0, 3.0)));
    }
}
