//! Coalescing render request pipeline
//!
//! Mutations overwrite a single pending slot, so however many arrive while a
//! render is in flight, exactly one request is dispatched afterwards and it
//! carries the latest snapshot.

use crate::camera::CameraState;
use crate::render::{Frame, RenderError, RenderRequest, Viewport};
use crate::scene::SceneModel;
use orbitview_core::{Error, Result};
use std::sync::Arc;

/// Observable pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    /// A snapshot is waiting for the renderer
    Pending,
    /// A request is being rendered; a newer snapshot may be waiting behind it
    InFlight,
    /// The last render failed and nothing newer has been submitted
    Failed,
}

/// What became of a finished render
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Frame reflects the latest committed state
    Delivered(Frame),
    /// A newer snapshot arrived while rendering; the frame was dropped
    Superseded,
    Failed(RenderError),
    /// The id does not match the request in flight
    Stale,
}

#[derive(Debug, Clone)]
struct Snapshot {
    camera: CameraState,
    scene: Arc<SceneModel>,
    viewport: Viewport,
}

#[derive(Debug, Default)]
pub struct RenderPipeline {
    pending: Option<Snapshot>,
    in_flight: Option<u64>,
    failed: bool,
    renderer_lost: bool,
    next_id: u64,
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        if self.in_flight.is_some() {
            PipelineState::InFlight
        } else if self.pending.is_some() {
            PipelineState::Pending
        } else if self.failed {
            PipelineState::Failed
        } else {
            PipelineState::Idle
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// True after a fatal renderer error until [`reset_renderer`](Self::reset_renderer)
    pub fn is_renderer_lost(&self) -> bool {
        self.renderer_lost
    }

    /// Record the latest committed state, replacing any older pending one
    pub fn submit(&mut self, camera: CameraState, scene: Arc<SceneModel>, viewport: Viewport) {
        if self.pending.is_some() {
            log::trace!("Coalescing pending render at scene revision {}", scene.revision());
        }
        self.failed = false;
        self.pending = Some(Snapshot { camera, scene, viewport });
    }

    /// Take the pending snapshot as a request if the renderer is free.
    ///
    /// Fails with [`Error::RenderDispatch`] when work is pending but the
    /// renderer has been lost.
    pub fn take_dispatch(&mut self) -> Result<Option<RenderRequest>> {
        if self.in_flight.is_some() || self.pending.is_none() {
            return Ok(None);
        }
        if self.renderer_lost {
            return Err(Error::RenderDispatch(
                "renderer is unavailable; restart the render surface".to_string(),
            ));
        }
        let Some(snapshot) = self.pending.take() else {
            return Ok(None);
        };
        let id = self.next_id;
        self.next_id += 1;
        self.in_flight = Some(id);
        log::debug!("Dispatching render {} ({}x{})", id, snapshot.viewport.width, snapshot.viewport.height);
        Ok(Some(RenderRequest {
            id,
            camera: snapshot.camera,
            scene: snapshot.scene,
            viewport: snapshot.viewport,
        }))
    }

    /// Settle the in-flight request
    pub fn complete(&mut self, id: u64, result: std::result::Result<Frame, RenderError>) -> Completion {
        if self.in_flight != Some(id) {
            log::debug!("Ignoring completion of stale render {}", id);
            return Completion::Stale;
        }
        self.in_flight = None;
        match result {
            Ok(_) if self.pending.is_some() => {
                log::debug!("Render {} superseded before delivery", id);
                Completion::Superseded
            }
            Ok(frame) => Completion::Delivered(frame),
            Err(err) => {
                if err.is_fatal() {
                    log::warn!("Render {} lost the renderer: {}", id, err);
                    self.renderer_lost = true;
                } else {
                    log::warn!("Render {} failed: {}", id, err);
                }
                self.failed = true;
                Completion::Failed(err)
            }
        }
    }

    /// Forget a lost renderer after the shell recreated the render surface
    pub fn reset_renderer(&mut self) {
        self.renderer_lost = false;
        self.failed = false;
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::scene::Rgb;

    fn camera() -> CameraState {
        CameraState::from_config(&CameraConfig::default()).unwrap()
    }

    fn submit(pipeline: &mut RenderPipeline, scene: &Arc<SceneModel>) {
        pipeline.submit(camera(), scene.clone(), Viewport::new(4, 4));
    }

    #[test]
    fn test_idle_to_delivered() {
        let mut pipeline = RenderPipeline::new();
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert!(pipeline.take_dispatch().unwrap().is_none());

        submit(&mut pipeline, &Arc::new(SceneModel::default()));
        assert_eq!(pipeline.state(), PipelineState::Pending);
        let request = pipeline.take_dispatch().unwrap().unwrap();
        assert_eq!(pipeline.state(), PipelineState::InFlight);
        assert!(pipeline.take_dispatch().unwrap().is_none());

        let completion = pipeline.complete(request.id, Ok(Frame::new(request.id, 4, 4)));
        assert!(matches!(completion, Completion::Delivered(_)));
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn test_mutations_in_flight_coalesce() {
        let mut pipeline = RenderPipeline::new();
        let mut scene = Arc::new(SceneModel::default());
        submit(&mut pipeline, &scene);
        let first = pipeline.take_dispatch().unwrap().unwrap();

        for i in 0..10u8 {
            scene = Arc::new(scene.set_background(Rgb::new(i, i, i)));
            submit(&mut pipeline, &scene);
        }
        assert!(pipeline.has_pending());
        assert_eq!(pipeline.complete(first.id, Ok(Frame::new(first.id, 4, 4))), Completion::Superseded);

        let second = pipeline.take_dispatch().unwrap().unwrap();
        assert_eq!(second.scene.background(), Rgb::new(9, 9, 9));
        assert!(Arc::ptr_eq(&second.scene, &scene));
        assert!(pipeline.complete(second.id, Ok(Frame::new(second.id, 4, 4))) != Completion::Superseded);
        assert!(pipeline.take_dispatch().unwrap().is_none());
    }

    #[test]
    fn test_transient_failure_then_recovery() {
        let mut pipeline = RenderPipeline::new();
        let scene = Arc::new(SceneModel::default());
        submit(&mut pipeline, &scene);
        let request = pipeline.take_dispatch().unwrap().unwrap();
        let completion = pipeline.complete(request.id, Err(RenderError::Transient("oom".into())));
        assert!(matches!(completion, Completion::Failed(RenderError::Transient(_))));
        assert_eq!(pipeline.state(), PipelineState::Failed);

        submit(&mut pipeline, &scene);
        assert_eq!(pipeline.state(), PipelineState::Pending);
        assert!(pipeline.take_dispatch().unwrap().is_some());
    }

    #[test]
    fn test_fatal_failure_blocks_dispatch_until_reset() {
        let mut pipeline = RenderPipeline::new();
        let scene = Arc::new(SceneModel::default());
        submit(&mut pipeline, &scene);
        let request = pipeline.take_dispatch().unwrap().unwrap();
        pipeline.complete(request.id, Err(RenderError::Fatal("device lost".into())));
        assert!(pipeline.is_renderer_lost());

        submit(&mut pipeline, &scene);
        let err = pipeline.take_dispatch().unwrap_err();
        assert!(matches!(err, Error::RenderDispatch(_)));

        pipeline.reset_renderer();
        assert!(pipeline.take_dispatch().unwrap().is_some());
    }

    #[test]
    fn test_stale_completion_ignored() {
        let mut pipeline = RenderPipeline::new();
        submit(&mut pipeline, &Arc::new(SceneModel::default()));
        let request = pipeline.take_dispatch().unwrap().unwrap();
        assert_eq!(pipeline.complete(request.id + 1, Ok(Frame::new(0, 1, 1))), Completion::Stale);
        assert_eq!(pipeline.state(), PipelineState::InFlight);
    }

    #[test]
    fn test_request_snapshot_is_isolated() {
        let mut pipeline = RenderPipeline::new();
        let scene = Arc::new(SceneModel::default());
        submit(&mut pipeline, &scene);
        let request = pipeline.take_dispatch().unwrap().unwrap();
        let _newer = scene.set_background(Rgb::BLACK);
        assert_eq!(request.scene.background(), Rgb::WHITE);
    }
}
