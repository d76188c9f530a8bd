//! The viewer context the UI shell drives
//!
//! [`ViewerCore`] owns the camera, the current scene snapshot and the render
//! pipeline. Input handlers never block: renders and asset loads run on
//! background workers and their results come back through [`ViewerCore::pump`].

use crate::camera::CameraController;
use crate::config::ViewerConfig;
use crate::export::export_frame;
use crate::interaction::{CursorHint, DragOutcome, InteractionMode};
use crate::pipeline::{Completion, PipelineState, RenderPipeline};
use crate::render::{Frame, RenderError, RenderRequest, Renderer, Viewport};
use crate::scene::{AssetRef, LightingProfile, MaterialDescriptor, MaterialKind, MaterialPreset, Rgb, SceneModel, Toggle};
use crate::worker::BackgroundWorker;
use orbitview_core::{Asset, Drawable, Error, ErrorKind, Result};
use orbitview_io::{AssetLoader, AssetSource, LoaderRegistry, SampleModel};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Notification for the UI shell
#[derive(Debug, Clone)]
pub enum ViewerEvent {
    FrameReady(Arc<Frame>),
    AssetLoaded {
        name: String,
        vertices: usize,
        triangles: usize,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl ViewerEvent {
    fn error(err: &Error) -> Self {
        ViewerEvent::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

type RenderResult = (u64, std::result::Result<Frame, RenderError>);

struct LoadJob {
    generation: u64,
    source: AssetSource,
}

struct LoadResult {
    generation: u64,
    source: AssetSource,
    result: Result<Asset>,
}

pub struct ViewerCore {
    config: ViewerConfig,
    camera: CameraController,
    scene: Arc<SceneModel>,
    pipeline: RenderPipeline,
    render_worker: BackgroundWorker<RenderRequest, RenderResult>,
    load_worker: BackgroundWorker<LoadJob, LoadResult>,
    loader: Arc<AssetLoader>,
    load_generation: u64,
    loads_in_flight: usize,
    last_frame: Option<Arc<Frame>>,
    events: Vec<ViewerEvent>,
}

fn spawn_render_worker<R: Renderer + 'static>(
    renderer: R,
) -> std::io::Result<BackgroundWorker<RenderRequest, RenderResult>> {
    let mut renderer = renderer;
    BackgroundWorker::spawn("orbitview-render", move |request: RenderRequest| {
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| renderer.render(&request)))
            .unwrap_or_else(|_| Err(RenderError::Fatal(format!("{} renderer panicked", renderer.name()))));
        (request.id, result)
    })
}

impl ViewerCore {
    /// Create the viewer and queue its first frame
    pub fn new<R: Renderer + 'static>(config: ViewerConfig, renderer: R) -> Result<Self> {
        config.validate()?;
        let camera = CameraController::new(config.camera.clone(), config.viewport)?;
        let scene = Arc::new(config.scene.build());
        let loader = Arc::new(AssetLoader::new(LoaderRegistry::with_defaults(), config.samples_dir.clone()));

        let render_worker = spawn_render_worker(renderer)?;
        let worker_loader = loader.clone();
        let load_worker = BackgroundWorker::spawn("orbitview-loader", move |job: LoadJob| LoadResult {
            generation: job.generation,
            result: worker_loader.load(&job.source),
            source: job.source,
        })?;

        let mut viewer = Self {
            config,
            camera,
            scene,
            pipeline: RenderPipeline::new(),
            render_worker,
            load_worker,
            loader,
            load_generation: 0,
            loads_in_flight: 0,
            last_frame: None,
            events: Vec::new(),
        };
        viewer.commit();
        Ok(viewer)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    /// The current scene snapshot
    pub fn scene(&self) -> &Arc<SceneModel> {
        &self.scene
    }

    pub fn pipeline_state(&self) -> PipelineState {
        self.pipeline.state()
    }

    pub fn mode(&self) -> InteractionMode {
        self.camera.mode()
    }

    pub fn cursor(&self) -> CursorHint {
        self.camera.mode().cursor()
    }

    /// Most recently delivered frame
    pub fn last_frame(&self) -> Option<&Arc<Frame>> {
        self.last_frame.as_ref()
    }

    /// True when no load is running and no render is pending or in flight
    pub fn is_idle(&self) -> bool {
        let render_idle = match self.pipeline.state() {
            PipelineState::Idle | PipelineState::Failed => true,
            PipelineState::Pending => self.pipeline.is_renderer_lost(),
            PipelineState::InFlight => false,
        };
        render_idle && self.loads_in_flight == 0
    }

    pub fn on_drag_start(&mut self, x: f32, y: f32) {
        self.camera.begin_drag(x, y);
    }

    pub fn on_drag_move(&mut self, x: f32, y: f32) {
        let Some(outcome) = self.camera.update_drag(x, y) else {
            return;
        };
        match outcome {
            DragOutcome::Camera => {}
            DragOutcome::ModelRotation(delta) => self.scene = Arc::new(self.scene.rotate_model(delta)),
            DragOutcome::SunRotation(delta) => self.scene = Arc::new(self.scene.rotate_sun(delta)),
            DragOutcome::EnvironmentRotation(yaw) => self.scene = Arc::new(self.scene.rotate_environment(yaw)),
        }
        self.commit();
    }

    pub fn on_drag_end(&mut self) {
        self.camera.end_drag();
    }

    /// Zoom by raw wheel units; one notch is `wheel_notch` units
    pub fn on_scroll(&mut self, raw_delta: f32) {
        let notches = raw_delta / self.config.camera.wheel_notch;
        if self.camera.zoom(notches) {
            self.commit();
        }
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.camera.set_mode(mode);
    }

    pub fn reset_view(&mut self) {
        self.camera.reset();
        self.commit();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let viewport = Viewport::new(width, height);
        if viewport.is_empty() || viewport == self.camera.viewport() {
            return;
        }
        self.camera.set_viewport(viewport);
        self.commit();
    }

    pub fn set_material(&mut self, descriptor: MaterialDescriptor) {
        self.update_scene(|scene| scene.set_material(descriptor));
    }

    pub fn set_material_kind(&mut self, kind: MaterialKind) {
        let material = MaterialDescriptor {
            kind,
            ..self.scene.material()
        };
        self.set_material(material);
    }

    pub fn set_material_preset(&mut self, preset: MaterialPreset) {
        let material = MaterialDescriptor {
            preset,
            ..self.scene.material()
        };
        self.set_material(material);
    }

    pub fn set_material_color(&mut self, color: Rgb) {
        let material = MaterialDescriptor {
            base_color: color,
            ..self.scene.material()
        };
        self.set_material(material);
    }

    pub fn set_point_size(&mut self, point_size: f32) {
        let material = MaterialDescriptor {
            point_size,
            ..self.scene.material()
        };
        self.set_material(material);
    }

    pub fn set_lighting(&mut self, profile: LightingProfile) {
        self.update_scene(|scene| scene.set_lighting(profile));
    }

    pub fn set_background(&mut self, color: Rgb) {
        self.update_scene(|scene| scene.set_background(color));
    }

    pub fn set_toggle(&mut self, toggle: Toggle, value: bool) {
        self.update_scene(|scene| scene.set_toggle(toggle, value));
    }

    /// Start loading a file in the background; returns the load generation
    pub fn open_file<P: Into<PathBuf>>(&mut self, path: P) -> u64 {
        self.open(AssetSource::File(path.into()))
    }

    /// Start loading a built-in sample in the background
    pub fn open_sample(&mut self, sample: SampleModel) -> u64 {
        self.open(AssetSource::Sample(sample))
    }

    /// Start loading any source in the background.
    ///
    /// Only the newest open is installed; results of older ones are dropped.
    pub fn open(&mut self, source: AssetSource) -> u64 {
        self.load_generation += 1;
        let generation = self.load_generation;
        log::info!("Opening {}", source.display_name());
        match self.load_worker.dispatch(LoadJob { generation, source }) {
            Ok(()) => self.loads_in_flight += 1,
            Err(_) => self.events.push(ViewerEvent::Error {
                kind: ErrorKind::Io,
                message: "asset loader is not running".to_string(),
            }),
        }
        generation
    }

    /// Load on the calling thread and install the asset.
    ///
    /// Any background load still running is superseded. On failure the
    /// current asset stays active.
    pub fn load_asset_now(&mut self, source: &AssetSource) -> Result<()> {
        self.load_generation += 1;
        let asset = self.loader.load(source)?;
        self.install_asset(source, asset);
        Ok(())
    }

    /// Write the last delivered frame to a PNG or JPEG file
    pub fn export_image<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if self.scene.asset().is_none() {
            return Err(Error::InvalidData("no model loaded to export".to_string()));
        }
        let frame = self
            .last_frame
            .as_ref()
            .ok_or_else(|| Error::InvalidData("no frame has been rendered yet".to_string()))?;
        export_frame(frame, path)
    }

    /// Replace a lost renderer and re-render the current state.
    /// A render still running on the old renderer is abandoned, not awaited.
    pub fn restart_renderer<R: Renderer + 'static>(&mut self, renderer: R) -> Result<()> {
        let old = std::mem::replace(&mut self.render_worker, spawn_render_worker(renderer)?);
        old.detach();
        self.pipeline.reset_renderer();
        log::info!("Renderer restarted");
        self.commit();
        Ok(())
    }

    /// Collect finished work and dispatch pending renders. Never blocks.
    pub fn pump(&mut self) -> Vec<ViewerEvent> {
        while let Some(result) = self.load_worker.try_recv() {
            self.handle_load(result);
        }
        while let Some((id, result)) = self.render_worker.try_recv() {
            self.handle_render(id, result);
        }
        self.check_render_worker();
        self.dispatch_pending();
        std::mem::take(&mut self.events)
    }

    /// Pump until idle or until `timeout` passes, blocking between results
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<ViewerEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = self.pump();
        while !self.is_idle() {
            let now = Instant::now();
            if now >= deadline {
                log::warn!("Viewer still busy after {:?}", timeout);
                break;
            }
            let slice = (deadline - now).min(Duration::from_millis(50));
            if self.loads_in_flight > 0 {
                if let Some(result) = self.load_worker.recv_timeout(slice) {
                    self.handle_load(result);
                }
            } else if let Some((id, result)) = self.render_worker.recv_timeout(slice) {
                self.handle_render(id, result);
            }
            events.extend(self.pump());
        }
        events
    }

    fn update_scene(&mut self, change: impl FnOnce(&SceneModel) -> SceneModel) {
        self.scene = Arc::new(change(&self.scene));
        self.commit();
    }

    /// Hand the latest state to the pipeline and dispatch if the renderer is free
    fn commit(&mut self) {
        self.pipeline
            .submit(self.camera.state().clone(), self.scene.clone(), self.camera.viewport());
        self.dispatch_pending();
    }

    fn dispatch_pending(&mut self) {
        if self.pipeline.is_renderer_lost() {
            return;
        }
        match self.pipeline.take_dispatch() {
            Ok(Some(request)) => {
                if let Err(flume::SendError(request)) = self.render_worker.dispatch(request) {
                    let completion = self
                        .pipeline
                        .complete(request.id, Err(RenderError::Fatal("render worker is not running".to_string())));
                    self.handle_completion(completion);
                }
            }
            Ok(None) => {}
            Err(e) => self.events.push(ViewerEvent::error(&e)),
        }
    }

    fn check_render_worker(&mut self) {
        if let Some(id) = self.pipeline.in_flight() {
            if !self.render_worker.is_alive() {
                let completion = self
                    .pipeline
                    .complete(id, Err(RenderError::Fatal("render worker stopped".to_string())));
                self.handle_completion(completion);
            }
        }
    }

    fn handle_render(&mut self, id: u64, result: std::result::Result<Frame, RenderError>) {
        let completion = self.pipeline.complete(id, result);
        self.handle_completion(completion);
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Delivered(frame) => {
                let frame = Arc::new(frame);
                self.last_frame = Some(frame.clone());
                self.events.push(ViewerEvent::FrameReady(frame));
            }
            Completion::Failed(err) => self.events.push(ViewerEvent::error(&err.into())),
            Completion::Superseded | Completion::Stale => {}
        }
    }

    fn handle_load(&mut self, load: LoadResult) {
        self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
        if load.generation != self.load_generation {
            log::debug!(
                "Dropping stale load of {} (generation {}, current {})",
                load.source.display_name(),
                load.generation,
                self.load_generation
            );
            return;
        }
        match load.result {
            Ok(asset) => self.install_asset(&load.source, asset),
            Err(e) => {
                log::warn!("Failed to load {}: {}", load.source.display_name(), e);
                self.events.push(ViewerEvent::error(&e));
            }
        }
    }

    fn install_asset(&mut self, source: &AssetSource, asset: Asset) {
        if self.config.camera.frame_on_load && !asset.is_empty() {
            if let Err(e) = self.camera.frame(asset.center(), asset.bounding_radius()) {
                log::warn!("Could not frame {}: {}", asset.name(), e);
            }
        }
        self.events.push(ViewerEvent::AssetLoaded {
            name: asset.name().to_string(),
            vertices: asset.vertex_count(),
            triangles: asset.triangle_count(),
        });
        self.scene = Arc::new(self.scene.with_asset(AssetRef::from(source), Arc::new(asset)));
        self.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::SoftwareRenderer;

    fn viewer() -> ViewerCore {
        let mut config = ViewerConfig::default();
        config.viewport = Viewport::new(64, 48);
        ViewerCore::new(config, SoftwareRenderer::default()).unwrap()
    }

    fn frames(events: &[ViewerEvent]) -> usize {
        events.iter().filter(|e| matches!(e, ViewerEvent::FrameReady(_))).count()
    }

    #[test]
    fn test_first_frame_delivered() {
        let mut viewer = viewer();
        let events = viewer.wait_idle(Duration::from_secs(10));
        assert_eq!(frames(&events), 1);
        let frame = viewer.last_frame().unwrap();
        assert_eq!((frame.width, frame.height), (64, 48));
        assert_eq!(viewer.pipeline_state(), PipelineState::Idle);
    }

    #[test]
    fn test_open_sample_installs_asset() {
        let mut viewer = viewer();
        viewer.open_sample(SampleModel::Cube);
        let events = viewer.wait_idle(Duration::from_secs(10));
        assert!(events.iter().any(|e| matches!(
            e,
            ViewerEvent::AssetLoaded { vertices: 8, triangles: 12, .. }
        )));
        assert_eq!(viewer.scene().asset().unwrap().index_count(), 36);
    }

    #[test]
    fn test_stale_load_dropped() {
        let mut viewer = viewer();
        viewer.open_sample(SampleModel::Cube);
        viewer.open_sample(SampleModel::Sphere);
        let events = viewer.wait_idle(Duration::from_secs(10));
        let loaded: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ViewerEvent::AssetLoaded { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(loaded, vec!["Sphere"]);
    }

    #[test]
    fn test_failed_open_reports_error() {
        let mut viewer = viewer();
        viewer.open_sample(SampleModel::Cube);
        viewer.wait_idle(Duration::from_secs(10));
        viewer.open_file("/nonexistent/orbitview/model.obj");
        let events = viewer.wait_idle(Duration::from_secs(10));
        assert!(events
            .iter()
            .any(|e| matches!(e, ViewerEvent::Error { kind: ErrorKind::Io, .. })));
        assert_eq!(viewer.scene().asset().unwrap().name(), "Cube");
    }

    #[test]
    fn test_scroll_uses_wheel_notches() {
        let mut viewer = viewer();
        viewer.on_scroll(120.0);
        assert!((viewer.camera().state().distance() - 4.5).abs() < 1e-4);
        viewer.reset_view();
        assert!((viewer.camera().state().distance() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_export_requires_model() {
        let mut viewer = viewer();
        viewer.wait_idle(Duration::from_secs(10));
        let err = viewer.export_image(std::env::temp_dir().join("orbitview-empty.png")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid data: no model loaded to export");
    }

    #[test]
    fn test_cursor_follows_mode() {
        let mut viewer = viewer();
        assert_eq!(viewer.cursor(), CursorHint::Arrow);
        viewer.set_mode(InteractionMode::Sun);
        assert_eq!(viewer.cursor(), CursorHint::Crosshair);
    }
}
