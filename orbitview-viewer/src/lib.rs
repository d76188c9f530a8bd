//! Interactive core of the orbitview model viewer
//!
//! This crate holds everything between the UI shell and the renderer:
//! - [`CameraController`]: drag and zoom handling under the active [`InteractionMode`]
//! - [`SceneModel`]: immutable snapshots of asset, material, lighting and view toggles
//! - [`RenderPipeline`]: coalescing state machine that keeps one render in flight
//! - [`ViewerCore`]: the context struct the shell calls into
//!
//! A CPU [`SoftwareRenderer`] is included for headless rendering and tests.

pub mod camera;
pub mod config;
pub mod export;
pub mod interaction;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod software;
pub mod viewer;
pub mod worker;

pub use camera::{CameraController, CameraState};
pub use config::{CameraConfig, SceneDefaults, ViewerConfig};
pub use export::{export_frame, ImageFormat};
pub use interaction::{CursorHint, DragOutcome, InteractionMode};
pub use pipeline::{Completion, PipelineState, RenderPipeline};
pub use render::{Frame, RenderError, RenderRequest, Renderer, Viewport};
pub use scene::{
    AssetRef, LightingParams, LightingProfile, MaterialDescriptor, MaterialKind, MaterialPreset, PresetParams, Rgb,
    SceneModel, Toggle,
};
pub use software::{SoftwareRenderConfig, SoftwareRenderer};
pub use viewer::{ViewerCore, ViewerEvent};
pub use worker::BackgroundWorker;
