//! Render requests, frames and the renderer seam

use crate::camera::CameraState;
use crate::scene::SceneModel;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Size of the drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(600, 400)
    }
}

/// Everything one frame is drawn from. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub id: u64,
    pub camera: CameraState,
    pub scene: Arc<SceneModel>,
    pub viewport: Viewport,
}

/// RGBA8 pixels, row-major, top row first
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Id of the request this frame was rendered for
    pub request_id: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Transparent black frame
    pub fn new(request_id: u64, width: u32, height: u32) -> Self {
        Self {
            request_id,
            width,
            height,
            pixels: vec![0; 4 * width as usize * height as usize],
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    /// Pixel at `(x, y)`, or `None` outside the frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = 4 * (y as usize * self.width as usize + x as usize);
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }
}

/// Failure reported by a [`Renderer`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// This frame failed; later requests may succeed
    #[error("render failed: {0}")]
    Transient(String),

    /// The renderer handle is permanently unusable
    #[error("renderer lost: {0}")]
    Fatal(String),
}

impl RenderError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::Fatal(_))
    }
}

impl From<RenderError> for orbitview_core::Error {
    fn from(err: RenderError) -> Self {
        orbitview_core::Error::RenderDispatch(err.to_string())
    }
}

/// Turns render requests into frames.
///
/// Implementations run on the render worker thread, one request at a time.
pub trait Renderer: Send {
    fn render(&mut self, request: &RenderRequest) -> Result<Frame, RenderError>;

    /// Short name used in log messages
    fn name(&self) -> &str {
        "renderer"
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&mut self, request: &RenderRequest) -> Result<Frame, RenderError> {
        (**self).render(request)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_pixel_access() {
        let mut frame = Frame::new(7, 3, 2);
        assert_eq!(frame.pixels.len(), 24);
        frame.pixels[4 * 4..4 * 5].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(frame.pixel(1, 1), Some([1, 2, 3, 4]));
        assert_eq!(frame.pixel(3, 0), None);
        assert_eq!(frame.viewport(), Viewport::new(3, 2));
    }

    #[test]
    fn test_render_error_maps_to_dispatch_kind() {
        let err: orbitview_core::Error = RenderError::Fatal("device lost".into()).into();
        assert_eq!(err.kind(), orbitview_core::ErrorKind::RenderDispatch);
        assert!(err.to_string().contains("device lost"));
    }

    #[test]
    fn test_viewport_aspect() {
        assert_eq!(Viewport::default().aspect(), 1.5);
        assert!(Viewport::new(0, 10).is_empty());
    }
}
