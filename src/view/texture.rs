use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use tracing::info;
use wgpu::util::DeviceExt;

/// How texel values are interpreted when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Colour images, decoded to linear on sampling.
    Srgb,
    /// Data maps such as specular masks, sampled as stored.
    Linear,
}

impl ColorSpace {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        color_space: ColorSpace,
        label: &str,
    ) -> Self {
        let (width, height) = image.dimensions();
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: color_space.format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            image.as_raw(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view, width, height }
    }
}

/// Shared sampler for the material maps.
pub fn create_material_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("material_sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Decodes an image file into RGBA8.
pub fn load_image(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let path = path.as_ref();
    let image = image::open(path).with_context(|| format!("failed to load image {}", path.display()))?;
    info!(
        "image: {}x{}, {} channels",
        image.width(),
        image.height(),
        image.color().channel_count()
    );
    Ok(image.to_rgba8())
}

/// Solid image from a linear `[0, 1]` RGBA colour.
pub fn single_color_image(width: u32, height: u32, color: [f32; 4]) -> RgbaImage {
    let texel = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    RgbaImage::from_pixel(width.max(1), height.max(1), Rgba(texel))
}

/// Black/white checkerboard with `grid_x` by `grid_y` pixel cells.
pub fn checker_image(width: u32, height: u32, grid_x: u32, grid_y: u32) -> RgbaImage {
    let (gx, gy) = (grid_x.max(1), grid_y.max(1));
    RgbaImage::from_fn(width.max(1), height.max(1), |x, y| {
        let even = ((x / gx) + (y / gy)) % 2 == 0;
        let v = if even { 255 } else { 0 };
        Rgba([v, v, v, 255])
    })
}
