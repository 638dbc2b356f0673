pub const MIN_SHININESS: f32 = 1.0;
pub const MAX_SHININESS: f32 = 256.0;

/// Texture slots the lit shader samples the material maps from.
pub const DIFFUSE_TEXTURE_UNIT: i32 = 0;
pub const SPECULAR_TEXTURE_UNIT: i32 = 1;

/// Index of a texture owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialModel {
    shininess: f32,
    pub diffuse_texture: TextureHandle,
    pub specular_texture: TextureHandle,
}

impl MaterialModel {
    pub fn new(diffuse_texture: TextureHandle, specular_texture: TextureHandle) -> Self {
        Self { shininess: 64.0, diffuse_texture, specular_texture }
    }

    pub fn shininess(&self) -> f32 { self.shininess }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = if shininess.is_nan() {
            MIN_SHININESS
        } else {
            shininess.clamp(MIN_SHININESS, MAX_SHININESS)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shininess_is_clamped() {
        let mut material = MaterialModel::new(TextureHandle(0), TextureHandle(1));
        material.set_shininess(0.0);
        assert_eq!(material.shininess(), MIN_SHININESS);
        material.set_shininess(1000.0);
        assert_eq!(material.shininess(), MAX_SHININESS);
        material.set_shininess(32.0);
        assert_eq!(material.shininess(), 32.0);
    }
}
