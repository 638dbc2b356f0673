use anyhow::Result;
use image::RgbaImage;
use tracing::info;

use crate::config::AppConfig;
use crate::view::mesh::Mesh;
use crate::view::texture::{load_image, single_color_image, ColorSpace};

const FALLBACK_TEXTURE_SIZE: u32 = 4;
const FALLBACK_DIFFUSE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const FALLBACK_SPECULAR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// One material map with the colour space it must be sampled in.
pub struct MaterialMap<'a> {
    pub image: &'a RgbaImage,
    pub color_space: ColorSpace,
    pub label: &'static str,
}

/// CPU-side scene content, ready to be uploaded by the renderer.
pub struct SceneAssets {
    pub model: Mesh,
    pub marker: Mesh,
    pub diffuse: RgbaImage,
    pub specular: RgbaImage,
}

impl SceneAssets {
    /// Loads configured files; anything unconfigured falls back to the
    /// built-in box and single-colour maps.
    pub fn load(config: &AppConfig) -> Result<Self> {
        let model = match &config.model_path {
            Some(path) => Mesh::load_obj(path)?,
            None => {
                info!("no model configured, using the built-in box");
                Mesh::cube()
            }
        };
        let diffuse = match &config.diffuse_path {
            Some(path) => load_image(path)?,
            None => fallback_image(FALLBACK_DIFFUSE),
        };
        let specular = match &config.specular_path {
            Some(path) => load_image(path)?,
            None => fallback_image(FALLBACK_SPECULAR),
        };

        Ok(Self { model, marker: Mesh::cube(), diffuse, specular })
    }

    /// Diffuse then specular, in texture-unit order. The specular map is a
    /// mask and stays linear.
    pub fn material_maps(&self) -> [MaterialMap<'_>; 2] {
        [
            MaterialMap { image: &self.diffuse, color_space: ColorSpace::Srgb, label: "diffuse_map" },
            MaterialMap { image: &self.specular, color_space: ColorSpace::Linear, label: "specular_map" },
        ]
    }
}

fn fallback_image(color: [f32; 4]) -> RgbaImage {
    single_color_image(FALLBACK_TEXTURE_SIZE, FALLBACK_TEXTURE_SIZE, color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_need_no_files() {
        let assets = SceneAssets::load(&AppConfig::default()).expect("built-in assets");
        assert_eq!(assets.model.vertices.len(), 24);
        assert_eq!(assets.marker.indices.len(), 36);
        assert_eq!(assets.diffuse.dimensions(), (4, 4));
        assert_eq!(assets.specular.get_pixel(0, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn specular_map_is_sampled_linear() {
        let assets = SceneAssets::load(&AppConfig::default()).expect("built-in assets");
        let [diffuse, specular] = assets.material_maps();
        assert_eq!(diffuse.color_space, ColorSpace::Srgb);
        assert_eq!(specular.color_space, ColorSpace::Linear);
        assert_eq!(specular.color_space.format(), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(specular.image.get_pixel(0, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn missing_model_aborts_loading() {
        let config = AppConfig {
            model_path: Some(PathBuf::from("no/such/model.obj")),
            ..AppConfig::default()
        };
        assert!(SceneAssets::load(&config).is_err());
    }
}
