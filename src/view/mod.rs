// VIEW: GPU resources and drawing
pub mod assets;
pub mod gpu_init;
pub mod mesh;
pub mod render;
pub mod texture;
pub mod uniforms;

pub use assets::{MaterialMap, SceneAssets};
pub use gpu_init::GpuContext;
pub use mesh::{Mesh, MeshBuffer, Vertex};
pub use render::{EguiFrame, Renderer};
pub use texture::{checker_image, load_image, single_color_image, ColorSpace, Texture};
pub use uniforms::{FlatColorUniform, LightingUniform};
