use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use tracing::warn;

use crate::controller::draw::{self, UniformSink, UniformValue};

/// Uniform block of the lighting shader. Field order mirrors the WGSL
/// `Uniforms` struct in `shaders/lighting.wgsl`, padded to 16-byte rows.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightingUniform {
    pub transform: [[f32; 4]; 4],
    pub model_transform: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    pub light_kind: u32,
    pub light_position: [f32; 3],
    pad0: f32,
    pub light_direction: [f32; 3],
    pad1: f32,
    pub light_attenuation: [f32; 3],
    pad2: f32,
    pub light_ambient: [f32; 3],
    pad3: f32,
    pub light_diffuse: [f32; 3],
    pad4: f32,
    pub light_specular: [f32; 3],
    pub material_shininess: f32,
    pub light_cutoff: [f32; 2],
    pub material_diffuse: u32,
    pub material_specular: u32,
}

impl Default for LightingUniform {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY.to_cols_array_2d(),
            model_transform: Mat4::IDENTITY.to_cols_array_2d(),
            ..Self::zeroed()
        }
    }
}

impl UniformSink for LightingUniform {
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        use UniformValue as U;
        match (name, value) {
            (draw::TRANSFORM, U::Mat4(m)) => self.transform = m.to_cols_array_2d(),
            (draw::MODEL_TRANSFORM, U::Mat4(m)) => self.model_transform = m.to_cols_array_2d(),
            (draw::VIEW_POS, U::Vec3(v)) => self.view_pos = v.to_array(),
            (draw::LIGHT_KIND, U::Int(k)) => self.light_kind = k.max(0) as u32,
            (draw::LIGHT_POSITION, U::Vec3(v)) => self.light_position = v.to_array(),
            (draw::LIGHT_DIRECTION, U::Vec3(v)) => self.light_direction = v.to_array(),
            (draw::LIGHT_ATTENUATION, U::Vec3(v)) => self.light_attenuation = v.to_array(),
            (draw::LIGHT_CUTOFF, U::Vec2(v)) => self.light_cutoff = v.to_array(),
            (draw::LIGHT_AMBIENT, U::Vec3(v)) => self.light_ambient = v.to_array(),
            (draw::LIGHT_DIFFUSE, U::Vec3(v)) => self.light_diffuse = v.to_array(),
            (draw::LIGHT_SPECULAR, U::Vec3(v)) => self.light_specular = v.to_array(),
            (draw::MATERIAL_DIFFUSE, U::Int(unit)) => self.material_diffuse = unit.max(0) as u32,
            (draw::MATERIAL_SPECULAR, U::Int(unit)) => self.material_specular = unit.max(0) as u32,
            (draw::MATERIAL_SHININESS, U::Float(s)) => self.material_shininess = s,
            _ => {
                warn!(name, ?value, "lighting program has no such uniform");
                return false;
            }
        }
        true
    }
}

/// Uniform block of the flat colour shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FlatColorUniform {
    pub transform: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl Default for FlatColorUniform {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY.to_cols_array_2d(),
            color: Vec3::ONE.extend(1.0).to_array(),
        }
    }
}

impl UniformSink for FlatColorUniform {
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        match (name, value) {
            (draw::TRANSFORM, UniformValue::Mat4(m)) => self.transform = m.to_cols_array_2d(),
            (draw::COLOR, UniformValue::Vec4(c)) => self.color = c.to_array(),
            _ => {
                warn!(name, ?value, "flat colour program has no such uniform");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec4};

    #[test]
    fn block_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<LightingUniform>(), 256);
        assert_eq!(std::mem::size_of::<FlatColorUniform>(), 80);
    }

    #[test]
    fn lighting_block_accepts_light_and_material() {
        let mut block = LightingUniform::default();
        assert!(block.set_uniform(draw::LIGHT_KIND, UniformValue::Int(2)));
        assert!(block.set_uniform(draw::LIGHT_CUTOFF, UniformValue::Vec2(Vec2::new(0.5, 0.4))));
        assert!(block.set_uniform(draw::MATERIAL_SPECULAR, UniformValue::Int(1)));
        assert!(block.set_uniform(draw::MATERIAL_SHININESS, UniformValue::Float(32.0)));

        assert_eq!(block.light_kind, 2);
        assert_eq!(block.light_cutoff, [0.5, 0.4]);
        assert_eq!(block.material_specular, 1);
        assert_eq!(block.material_shininess, 32.0);
    }

    #[test]
    fn wrong_name_or_type_is_rejected() {
        let mut block = LightingUniform::default();
        assert!(!block.set_uniform(draw::COLOR, UniformValue::Vec4(Vec4::ONE)));
        assert!(!block.set_uniform(draw::VIEW_POS, UniformValue::Float(1.0)));

        let mut flat = FlatColorUniform::default();
        assert!(!flat.set_uniform(draw::VIEW_POS, UniformValue::Vec3(Vec3::ZERO)));
        assert!(flat.set_uniform(draw::COLOR, UniformValue::Vec4(Vec4::new(0.9, 0.9, 0.9, 1.0))));
        assert_eq!(flat.color, [0.9, 0.9, 0.9, 1.0]);
    }
}
