use image::RgbaImage;
use tracing::{debug, error};
use wgpu::util::DeviceExt;

use crate::controller::draw::{DrawCall, FramePlan, MeshSlot, Program};
use crate::model::TextureHandle;
use crate::view::assets::SceneAssets;
use crate::view::mesh::{MeshBuffer, Vertex};
use crate::view::texture::{create_material_sampler, ColorSpace, Texture};
use crate::view::uniforms::{FlatColorUniform, LightingUniform};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

/// Egui output for one frame, drawn over the scene.
pub struct EguiFrame<'a> {
    pub primitives: &'a [egui::ClippedPrimitive],
    pub textures_delta: &'a egui::TexturesDelta,
    pub screen: egui_wgpu::ScreenDescriptor,
}

/// Uniform buffer plus its bind group for one program.
struct UniformBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

fn uniform_binding<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, initial: &T) -> (wgpu::BindGroupLayout, UniformBinding) {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(initial),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &layout,
        entries: &[wgpu::BindGroupEntry { binding: 0, resource: buffer.as_entire_binding() }],
    });
    (layout, UniformBinding { buffer, bind_group })
}

fn create_material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("material_bind_group_layout"),
        entries: &[
            texture_entry(0),
            texture_entry(1),
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader_src: &str,
    format: wgpu::TextureFormat,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(shader_src.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// The panel colour is what ends up on screen. An sRGB surface encodes on
/// write, so its clear value is decoded first. Alpha is never encoded.
pub fn clear_color(color: [f32; 4], srgb_surface: bool) -> wgpu::Color {
    let [r, g, b, a] = color.map(f64::from);
    if !srgb_surface {
        return wgpu::Color { r, g, b, a };
    }
    wgpu::Color { r: srgb_to_linear(r), g: srgb_to_linear(g), b: srgb_to_linear(b), a }
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Owns every GPU resource of the scene and executes `FramePlan`s.
pub struct Renderer {
    flat_pipeline: wgpu::RenderPipeline,
    lighting_pipeline: wgpu::RenderPipeline,
    flat: UniformBinding,
    flat_block: FlatColorUniform,
    lighting: UniformBinding,
    lighting_block: LightingUniform,

    material_layout: wgpu::BindGroupLayout,
    material_sampler: wgpu::Sampler,
    material_bind_group: Option<([TextureHandle; 2], wgpu::BindGroup)>,
    textures: Vec<Texture>,

    marker_mesh: MeshBuffer,
    model_mesh: MeshBuffer,

    #[allow(dead_code)]
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    srgb_surface: bool,

    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        assets: &SceneAssets,
    ) -> Self {
        let flat_block = FlatColorUniform::default();
        let lighting_block = LightingUniform::default();
        let (flat_layout, flat) = uniform_binding(device, "flat_uniforms", &flat_block);
        let (lighting_layout, lighting) = uniform_binding(device, "lighting_uniforms", &lighting_block);
        let material_layout = create_material_layout(device);

        let flat_pipeline = create_pipeline(
            device,
            "flat_color",
            include_str!("shaders/flat.wgsl"),
            format,
            &[&flat_layout],
        );
        let lighting_pipeline = create_pipeline(
            device,
            "lighting",
            include_str!("shaders/lighting.wgsl"),
            format,
            &[&lighting_layout, &material_layout],
        );

        let (depth_texture, depth_view) = create_depth_texture(device, width, height);
        let egui_renderer = egui_wgpu::Renderer::new(device, format, egui_wgpu::RendererOptions::default());

        Self {
            flat_pipeline,
            lighting_pipeline,
            flat,
            flat_block,
            lighting,
            lighting_block,
            material_layout,
            material_sampler: create_material_sampler(device),
            material_bind_group: None,
            textures: Vec::new(),
            marker_mesh: assets.marker.upload(device, "light_marker"),
            model_mesh: assets.model.upload(device, "model"),
            depth_texture,
            depth_view,
            srgb_surface: format.is_srgb(),
            egui_renderer,
        }
    }

    /// Uploads an image and returns the handle draw calls refer to it by.
    pub fn add_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        color_space: ColorSpace,
        label: &str,
    ) -> TextureHandle {
        let handle = TextureHandle(self.textures.len());
        self.textures.push(Texture::from_image(device, queue, image, color_space, label));
        debug!(handle = handle.0, label, ?color_space, "texture registered");
        handle
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (depth_texture, depth_view) = create_depth_texture(device, width, height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    fn mesh(&self, slot: MeshSlot) -> &MeshBuffer {
        match slot {
            MeshSlot::LightMarker => &self.marker_mesh,
            MeshSlot::Model => &self.model_mesh,
        }
    }

    /// Rebuilds the material bind group when the requested pair changes.
    fn bind_material(&mut self, device: &wgpu::Device, handles: [TextureHandle; 2]) -> bool {
        if matches!(&self.material_bind_group, Some((bound, _)) if *bound == handles) {
            return true;
        }
        let (Some(diffuse), Some(specular)) = (self.textures.get(handles[0].0), self.textures.get(handles[1].0)) else {
            error!(?handles, "draw call references an unknown texture");
            return false;
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&diffuse.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&specular.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&self.material_sampler) },
            ],
        });
        self.material_bind_group = Some((handles, bind_group));
        true
    }

    /// Feeds a draw call's uniforms into its program block and uploads it.
    /// Returns false when the call cannot be drawn.
    fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, call: &DrawCall) -> bool {
        let rejected = match call.program {
            Program::FlatColor => {
                let rejected = call.apply(&mut self.flat_block);
                queue.write_buffer(&self.flat.buffer, 0, bytemuck::bytes_of(&self.flat_block));
                rejected
            }
            Program::Lighting => {
                let rejected = call.apply(&mut self.lighting_block);
                queue.write_buffer(&self.lighting.buffer, 0, bytemuck::bytes_of(&self.lighting_block));
                rejected
            }
        };
        if !rejected.is_empty() {
            debug!(program = ?call.program, ?rejected, "uniforms ignored");
        }

        match (call.program, call.textures) {
            (Program::Lighting, Some(handles)) => self.bind_material(device, handles),
            (Program::Lighting, None) => {
                error!("lit draw call without material textures");
                false
            }
            (Program::FlatColor, _) => true,
        }
    }

    pub fn draw_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface: &wgpu::Surface,
        plan: &FramePlan,
        egui: Option<EguiFrame<'_>>,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // each program is used at most once per frame, so one buffer each is enough
        let drawable: Vec<&DrawCall> = plan
            .draw_calls()
            .filter(|call| self.prepare(device, queue, call))
            .collect();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let clear = clear_color(plan.clear_color, self.srgb_surface);
            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for call in drawable {
                match call.program {
                    Program::FlatColor => {
                        rp.set_pipeline(&self.flat_pipeline);
                        rp.set_bind_group(0, &self.flat.bind_group, &[]);
                    }
                    Program::Lighting => {
                        let Some((_, material)) = &self.material_bind_group else {
                            continue;
                        };
                        rp.set_pipeline(&self.lighting_pipeline);
                        rp.set_bind_group(0, &self.lighting.bind_group, &[]);
                        rp.set_bind_group(1, material, &[]);
                    }
                }
                self.mesh(call.mesh).draw(&mut rp);
            }
        }

        if let Some(egui) = egui {
            for (id, image_delta) in &egui.textures_delta.set {
                self.egui_renderer.update_texture(device, queue, *id, image_delta);
            }
            self.egui_renderer
                .update_buffers(device, queue, &mut encoder, egui.primitives, &egui.screen);

            {
                let egui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_render_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                self.egui_renderer
                    .render(&mut egui_pass.forget_lifetime(), egui.primitives, &egui.screen);
            }

            for id in &egui.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::state::DEFAULT_CLEAR_COLOR;

    #[test]
    fn clear_colour_passes_through_on_linear_surfaces() {
        let c = clear_color(DEFAULT_CLEAR_COLOR, false);
        assert!((c.r - 0.1).abs() < 1e-6 && (c.g - 0.2).abs() < 1e-6 && (c.b - 0.3).abs() < 1e-6);
        assert_eq!(c.a, 0.0);
    }

    #[test]
    fn clear_colour_is_decoded_for_srgb_surfaces() {
        let c = clear_color(DEFAULT_CLEAR_COLOR, true);
        // re-encoding on write must give back the panel colour
        assert!((c.r - 0.010_022_6).abs() < 1e-6);
        assert!((c.g - 0.033_104_8).abs() < 1e-6);
        assert!((c.b - 0.073_238_9).abs() < 1e-6);
        assert_eq!(c.a, 0.0);
        let white = clear_color([1.0; 4], true);
        assert!((white.r - 1.0).abs() < 1e-12);
    }
}
