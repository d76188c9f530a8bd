//! # orbitview
//!
//! The interactive core of a desktop 3D model viewer: camera control, scene
//! snapshots, a coalescing render-request pipeline and mesh loading.
//!
//! This is the umbrella crate that re-exports the individual crates. Use the
//! individual crates for finer control over dependencies.
//!
//! ## Quick Start
//!
//! ```rust
//! use orbitview::prelude::*;
//! use std::time::Duration;
//!
//! let mut viewer = ViewerCore::new(ViewerConfig::default(), SoftwareRenderer::default())?;
//! viewer.load_asset_now(&AssetSource::Sample(SampleModel::Cube))?;
//! viewer.set_mode(InteractionMode::Arcball);
//! viewer.on_drag_start(300.0, 200.0);
//! viewer.on_drag_move(360.0, 200.0);
//! viewer.on_drag_end();
//!
//! for event in viewer.wait_idle(Duration::from_secs(5)) {
//!     if let ViewerEvent::FrameReady(frame) = event {
//!         assert_eq!(frame.pixels.len(), 4 * 600 * 400);
//!     }
//! }
//! # Ok::<(), orbitview::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `io`: mesh formats and built-in samples
//! - `viewer`: camera, scene, render pipeline and `ViewerCore` (implies `io`)
//! - `all`: everything

// Re-export core functionality
pub use orbitview_core::*;

#[cfg(feature = "io")]
pub use orbitview_io as io;

#[cfg(feature = "viewer")]
pub use orbitview_viewer as viewer;

/// Convenient imports for common use cases
pub mod prelude {
    pub use orbitview_core::{Asset, Drawable, Error, ErrorKind, Point3f, Result, Rotation3f, Vector3f, Vertex};

    #[cfg(feature = "io")]
    pub use orbitview_io::{read_asset, write_asset, AssetFormat, AssetLoader, AssetSource, SampleModel};

    #[cfg(feature = "viewer")]
    pub use orbitview_viewer::{
        CameraController, Frame, InteractionMode, LightingProfile, MaterialDescriptor, MaterialKind, MaterialPreset,
        Renderer, Rgb, SceneModel, SoftwareRenderer, Toggle, ViewerConfig, ViewerCore, ViewerEvent, Viewport,
    };
}
