use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::model::TextureHandle;

// Uniform names shared with the shading stage.
pub const TRANSFORM: &str = "transform";
pub const MODEL_TRANSFORM: &str = "modelTransform";
pub const VIEW_POS: &str = "viewPos";
pub const COLOR: &str = "color";
pub const LIGHT_KIND: &str = "light.kind";
pub const LIGHT_POSITION: &str = "light.position";
pub const LIGHT_DIRECTION: &str = "light.direction";
pub const LIGHT_ATTENUATION: &str = "light.attenuation";
pub const LIGHT_CUTOFF: &str = "light.cutoff";
pub const LIGHT_AMBIENT: &str = "light.ambient";
pub const LIGHT_DIFFUSE: &str = "light.diffuse";
pub const LIGHT_SPECULAR: &str = "light.specular";
pub const MATERIAL_DIFFUSE: &str = "material.diffuse";
pub const MATERIAL_SPECULAR: &str = "material.specular";
pub const MATERIAL_SHININESS: &str = "material.shininess";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

/// Anything that accepts named uniforms, e.g. a shader program's uniform block.
pub trait UniformSink {
    /// Returns false when `name` (or its value type) is not part of this sink.
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// Single flat colour, used for the light marker
    FlatColor,
    /// Textured Phong shading with the configurable light
    Lighting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshSlot {
    LightMarker,
    Model,
}

/// One draw: which program, which mesh, which textures, which uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: Program,
    pub mesh: MeshSlot,
    /// Bound to texture units 0 and 1 when present
    pub textures: Option<[TextureHandle; 2]>,
    pub uniforms: Vec<(&'static str, UniformValue)>,
}

impl DrawCall {
    pub fn new(program: Program, mesh: MeshSlot) -> Self {
        Self { program, mesh, textures: None, uniforms: Vec::new() }
    }

    pub fn with_textures(mut self, diffuse: TextureHandle, specular: TextureHandle) -> Self {
        self.textures = Some([diffuse, specular]);
        self
    }

    pub fn set(&mut self, name: &'static str, value: UniformValue) {
        self.uniforms.push((name, value));
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Feeds every uniform to `sink`, returning the names it rejected.
    pub fn apply(&self, sink: &mut impl UniformSink) -> Vec<&'static str> {
        self.uniforms
            .iter()
            .filter(|(name, value)| !sink.set_uniform(name, *value))
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Everything the renderer needs for one frame, in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub clear_color: [f32; 4],
    /// Absent in flashlight mode
    pub marker: Option<DrawCall>,
    pub main: DrawCall,
}

impl FramePlan {
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.marker.iter().chain(std::iter::once(&self.main))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Recorder(HashMap<String, UniformValue>);

    impl UniformSink for Recorder {
        fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
            if name.starts_with("light.") {
                self.0.insert(name.to_string(), value);
                true
            } else {
                false
            }
        }
    }

    #[test]
    fn apply_reports_rejected_names() {
        let mut call = DrawCall::new(Program::Lighting, MeshSlot::Model);
        call.set(LIGHT_POSITION, UniformValue::Vec3(Vec3::ONE));
        call.set(VIEW_POS, UniformValue::Vec3(Vec3::ZERO));

        let mut recorder = Recorder::default();
        let rejected = call.apply(&mut recorder);
        assert_eq!(rejected, vec![VIEW_POS]);
        assert_eq!(recorder.0.get(LIGHT_POSITION), Some(&UniformValue::Vec3(Vec3::ONE)));
    }

    #[test]
    fn later_uniform_shadows_earlier() {
        let mut call = DrawCall::new(Program::FlatColor, MeshSlot::LightMarker);
        call.set(COLOR, UniformValue::Vec4(Vec4::ZERO));
        call.set(COLOR, UniformValue::Vec4(Vec4::ONE));
        assert_eq!(call.uniform(COLOR), Some(UniformValue::Vec4(Vec4::ONE)));
    }
}
