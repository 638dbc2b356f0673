use glam::{Vec2, Vec3};

use crate::model::CameraPose;

pub const MAX_LIGHT_DISTANCE: f32 = 3000.0;
pub const MAX_CUTOFF_DEGREES: f32 = 180.0;

/// How the shading stage interprets the light.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightKind {
    /// Omnidirectional; the cone is forced open to 180 degrees.
    Point = 0,
    /// Parallel rays along `direction`, no attenuation.
    Directional = 1,
    #[default]
    Spot = 2,
}

impl LightKind {
    pub const ALL: [LightKind; 3] = [LightKind::Point, LightKind::Directional, LightKind::Spot];

    pub fn label(self) -> &'static str {
        match self {
            LightKind::Point => "point",
            LightKind::Directional => "directional",
            LightKind::Spot => "spot",
        }
    }
}

/// Light placement, colours and cone. `position`/`direction` hold the user's
/// placement and are never overwritten by flashlight mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightModel {
    pub kind: LightKind,
    pub position: Vec3,
    pub direction: Vec3,
    distance: f32,
    cutoff_inner: f32,
    cutoff_offset: f32,
    ambient: Vec3,
    diffuse: Vec3,
    specular: Vec3,
    pub flashlight_mode: bool,
}

impl Default for LightModel {
    fn default() -> Self {
        Self {
            kind: LightKind::Spot,
            position: Vec3::new(1.0, 4.0, 4.0),
            direction: Vec3::new(-1.0, -1.0, -1.0),
            distance: 128.0,
            cutoff_inner: 120.0,
            cutoff_offset: 5.0,
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::splat(1.0),
            flashlight_mode: false,
        }
    }
}

impl LightModel {
    pub fn distance(&self) -> f32 { self.distance }
    pub fn cutoff_inner(&self) -> f32 { self.cutoff_inner }
    pub fn cutoff_offset(&self) -> f32 { self.cutoff_offset }
    pub fn ambient(&self) -> Vec3 { self.ambient }
    pub fn diffuse(&self) -> Vec3 { self.diffuse }
    pub fn specular(&self) -> Vec3 { self.specular }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = clamp_distance(distance);
    }

    /// `offset` is relative to `inner`; the outer edge sits at `inner + offset`.
    pub fn set_cutoff(&mut self, inner: f32, offset: f32) {
        self.cutoff_inner = clamp_cutoff(inner);
        self.cutoff_offset = clamp_cutoff(offset);
    }

    pub fn set_colors(&mut self, ambient: Vec3, diffuse: Vec3, specular: Vec3) {
        self.ambient = clamp_color(ambient);
        self.diffuse = clamp_color(diffuse);
        self.specular = clamp_color(specular);
    }

    pub fn effective(&self, pose: &CameraPose) -> EffectiveLight {
        effective_light(self, pose, self.flashlight_mode)
    }

    pub fn attenuation(&self) -> Vec3 {
        match self.kind {
            LightKind::Directional => Vec3::X,
            LightKind::Point | LightKind::Spot => attenuation_coefficients(self.distance),
        }
    }

    /// Cone cosines as consumed by the shader; a point light is a 180 degree cone.
    pub fn cutoff_cosines(&self) -> Vec2 {
        match self.kind {
            LightKind::Spot => spot_cutoff_cosines(self.cutoff_inner, self.cutoff_offset),
            LightKind::Point | LightKind::Directional => {
                spot_cutoff_cosines(MAX_CUTOFF_DEGREES, 0.0)
            }
        }
    }

    /// Flat colour for the light-source marker box.
    pub fn marker_color(&self) -> Vec3 {
        self.ambient + self.diffuse
    }
}

/// Position and direction actually used for shading this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveLight {
    pub position: Vec3,
    pub direction: Vec3,
}

pub fn effective_light(light: &LightModel, pose: &CameraPose, flashlight_mode: bool) -> EffectiveLight {
    if flashlight_mode {
        EffectiveLight { position: pose.position, direction: pose.front() }
    } else {
        EffectiveLight { position: light.position, direction: light.direction }
    }
}

// (distance, linear, quadratic); the constant term is always 1.
const ATTENUATION_TABLE: [(f32, f32, f32); 12] = [
    (7.0, 0.7, 1.8),
    (13.0, 0.35, 0.44),
    (20.0, 0.22, 0.20),
    (32.0, 0.14, 0.07),
    (50.0, 0.09, 0.032),
    (65.0, 0.07, 0.017),
    (100.0, 0.045, 0.0075),
    (160.0, 0.027, 0.0028),
    (200.0, 0.022, 0.0019),
    (325.0, 0.014, 0.0007),
    (600.0, 0.007, 0.0002),
    (3250.0, 0.0014, 0.000007),
];

/// `(constant, linear, quadratic)` falloff for a light meant to reach `distance`
/// units, interpolated linearly between table rows.
pub fn attenuation_coefficients(distance: f32) -> Vec3 {
    let d = clamp_distance(distance);
    let (first_d, first_l, first_q) = ATTENUATION_TABLE[0];
    if d <= first_d {
        return Vec3::new(1.0, first_l, first_q);
    }
    for pair in ATTENUATION_TABLE.windows(2) {
        let (d0, l0, q0) = pair[0];
        let (d1, l1, q1) = pair[1];
        if d <= d1 {
            let t = (d - d0) / (d1 - d0);
            return Vec3::new(1.0, l0 + (l1 - l0) * t, q0 + (q1 - q0) * t);
        }
    }
    let (_, last_l, last_q) = ATTENUATION_TABLE[ATTENUATION_TABLE.len() - 1];
    Vec3::new(1.0, last_l, last_q)
}

/// Returns `(cos(inner), cos(inner + offset))` with the angles in degrees.
/// The outer edge is capped at 180 degrees so the cone cannot fold back.
pub fn spot_cutoff_cosines(inner: f32, offset: f32) -> Vec2 {
    let inner = clamp_cutoff(inner);
    let outer = (inner + clamp_cutoff(offset)).min(MAX_CUTOFF_DEGREES);
    Vec2::new(inner.to_radians().cos(), outer.to_radians().cos())
}

fn clamp_distance(distance: f32) -> f32 {
    if distance.is_nan() { 0.0 } else { distance.clamp(0.0, MAX_LIGHT_DISTANCE) }
}

fn clamp_cutoff(degrees: f32) -> f32 {
    if degrees.is_nan() { 0.0 } else { degrees.clamp(0.0, MAX_CUTOFF_DEGREES) }
}

pub fn clamp_color(color: Vec3) -> Vec3 {
    let color = Vec3::select(color.is_nan_mask(), Vec3::ZERO, color);
    color.clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flashlight_follows_camera_exactly() {
        let mut pose = CameraPose::default();
        pose.apply_deltas(Vec3::new(2.0, 1.0, -5.0), Vec2::new(33.0, -12.0));
        let light = LightModel::default();

        let effective = effective_light(&light, &pose, true);
        assert_eq!(effective.position, pose.position);
        assert_eq!(effective.direction, pose.front());
    }

    #[test]
    fn stored_placement_survives_flashlight_toggle() {
        let pose = CameraPose::default();
        let mut light = LightModel::default();
        let before = light.effective(&pose);

        light.flashlight_mode = true;
        let lit = light.effective(&pose);
        assert_eq!(lit.position, pose.position);

        light.flashlight_mode = false;
        assert_eq!(light.effective(&pose), before);
        assert_eq!(light.position, Vec3::new(1.0, 4.0, 4.0));
    }

    #[test]
    fn cutoff_offset_is_added_to_inner() {
        let c = spot_cutoff_cosines(30.0, 10.0);
        assert!((c.x - 30f32.to_radians().cos()).abs() < 1e-6);
        assert!((c.y - 40f32.to_radians().cos()).abs() < 1e-6);
    }

    #[test]
    fn outer_cosine_never_exceeds_inner() {
        for inner in [0.0, 15.0, 45.0, 90.0, 170.0] {
            for offset in [0.0, 1.0, 10.0, 90.0, 180.0] {
                let c = spot_cutoff_cosines(inner, offset);
                assert!(c.y <= c.x + 1e-6, "inner {inner} offset {offset}");
            }
        }
    }

    #[test]
    fn attenuation_is_monotonic() {
        let mut previous = attenuation_coefficients(0.0);
        let mut d = 0.0;
        while d <= MAX_LIGHT_DISTANCE {
            let current = attenuation_coefficients(d);
            assert_eq!(current.x, 1.0);
            assert!(current.y <= previous.y, "linear increased at {d}");
            assert!(current.z <= previous.z, "quadratic increased at {d}");
            previous = current;
            d += 2.5;
        }
    }

    #[test]
    fn attenuation_hits_table_rows() {
        let c = attenuation_coefficients(50.0);
        assert!((c.y - 0.09).abs() < 1e-6);
        assert!((c.z - 0.032).abs() < 1e-6);
        assert_eq!(attenuation_coefficients(-10.0), attenuation_coefficients(0.0));
        assert_eq!(attenuation_coefficients(1.0e9), attenuation_coefficients(MAX_LIGHT_DISTANCE));
    }

    #[test]
    fn setters_clamp_external_input() {
        let mut light = LightModel::default();
        light.set_distance(9000.0);
        assert_eq!(light.distance(), MAX_LIGHT_DISTANCE);
        light.set_distance(-1.0);
        assert_eq!(light.distance(), 0.0);

        light.set_colors(Vec3::new(-0.5, 2.0, 0.5), Vec3::splat(f32::NAN), Vec3::ONE);
        assert_eq!(light.ambient(), Vec3::new(0.0, 1.0, 0.5));
        assert_eq!(light.diffuse(), Vec3::ZERO);

        light.set_cutoff(200.0, -3.0);
        assert_eq!((light.cutoff_inner(), light.cutoff_offset()), (180.0, 0.0));
    }

    #[test]
    fn point_and_directional_kinds_open_the_cone() {
        let mut light = LightModel::default();
        light.kind = LightKind::Point;
        assert!((light.cutoff_cosines() - Vec2::splat(-1.0)).length() < 1e-6);
        light.kind = LightKind::Directional;
        assert_eq!(light.attenuation(), Vec3::X);
    }
}
