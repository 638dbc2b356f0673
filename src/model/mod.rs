// MODEL: camera, light and material state
pub mod camera;
pub mod light;
pub mod material;
pub mod state;
pub mod viewport;

pub use camera::{CameraPose, CameraSettings, ProjectionSettings, ViewProjection};
pub use light::{EffectiveLight, LightKind, LightModel};
pub use material::{MaterialModel, TextureHandle};
pub use state::{PanelValues, RenderState};
pub use viewport::Viewport;
