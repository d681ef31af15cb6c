//! Core library for terrascene.
//!
//! Turns named raster and vector layers into a lit 3-D scene, renders it
//! once off-screen and writes the frame to an image file. Each module owns
//! one stage of that pipeline; the storage, rendering and encoding
//! collaborators sit behind traits so the stages can be driven with stubs.

pub mod binding;
pub mod color;
pub mod config;
pub mod error;
pub mod light;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod store;
pub mod view;

pub use binding::{bind_color, BindingKind, ColorBinding, ColorSources};
pub use color::Rgba;
pub use config::{AppConfig, OutputConfig, StoreConfig, ViewConfig};
pub use error::{Result, SceneError};
pub use light::{configure_lights, Light, LightRig};
pub use output::{encode, FrameEncoder, ImageEncoder, OutputFormat, OutputSpec};
pub use pipeline::{run, Collaborators, RunReport};
pub use render::{Frame, RenderContext, RenderEngine, SoftwareEngine};
pub use scene::{
    LayerPlan, LayerRequest, Scene, SceneObject, Surface, SurfaceId, VectorId, VectorObject,
};
pub use store::{resolve, LayerKind, LayerStore, LocationStore, MemoryStore, ResolvedLocation};
pub use view::{configure_viewpoint, HeightDerivation, ViewParams, Viewpoint};
