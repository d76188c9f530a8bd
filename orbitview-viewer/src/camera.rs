//! Camera state and the drag/zoom controller

use crate::config::CameraConfig;
use crate::interaction::{DragOutcome, InteractionMode};
use crate::render::Viewport;
use orbitview_core::math::{camera_basis, perspective, rotation_about};
use orbitview_core::{Error, Matrix4, Matrix4f, Point3f, Result, Rotation3f, Vector3f};

/// Viewpoint of the camera.
///
/// `up` is kept orthonormal to the view direction; constructors reject poses
/// where it is parallel to `target - position`.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    position: Point3f,
    target: Point3f,
    up: Vector3f,
    fov_y: f32,
    near: f32,
    far: f32,
}

impl CameraState {
    pub fn new(position: Point3f, target: Point3f, up: Vector3f, fov_y: f32, near: f32, far: f32) -> Result<Self> {
        let (_, _, up) = camera_basis(&(target - position), &up)?;
        Ok(Self {
            position,
            target,
            up,
            fov_y,
            near,
            far,
        })
    }

    pub fn from_config(config: &CameraConfig) -> Result<Self> {
        Self::new(
            config.position(),
            config.target(),
            config.up(),
            config.fov_y,
            config.near,
            config.far,
        )
    }

    pub fn position(&self) -> Point3f {
        self.position
    }

    pub fn target(&self) -> Point3f {
        self.target
    }

    pub fn up(&self) -> Vector3f {
        self.up
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Distance from the camera to its target
    pub fn distance(&self) -> f32 {
        (self.target - self.position).norm()
    }

    /// Orthonormal `(forward, right, up)` basis
    pub fn basis(&self) -> Result<(Vector3f, Vector3f, Vector3f)> {
        camera_basis(&(self.target - self.position), &self.up)
    }

    pub fn view_matrix(&self) -> Matrix4f {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Result<Matrix4f> {
        perspective(aspect, self.fov_y, self.near, self.far)
    }

    /// Combined projection * view for a viewport
    pub fn view_projection(&self, viewport: Viewport) -> Result<Matrix4f> {
        Ok(self.projection_matrix(viewport.aspect())? * self.view_matrix())
    }

    /// Same view direction and up, re-aimed at `target` from `distance`
    fn with_target_distance(&self, target: Point3f, distance: f32) -> Result<Self> {
        let (forward, _, up) = self.basis()?;
        Self::new(target - forward * distance, target, up, self.fov_y, self.near, self.far)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    x: f32,
    y: f32,
}

/// Interprets pointer drags and wheel zoom under the active [`InteractionMode`].
///
/// Drags are incremental: each `update_drag` applies the delta since the
/// previous pointer position and moves the anchor there.
#[derive(Debug, Clone)]
pub struct CameraController {
    config: CameraConfig,
    default_state: CameraState,
    state: CameraState,
    mode: InteractionMode,
    drag: Option<DragAnchor>,
    viewport: Viewport,
}

impl CameraController {
    pub fn new(config: CameraConfig, viewport: Viewport) -> Result<Self> {
        if !(config.min_distance > 0.0) {
            return Err(Error::Config(format!(
                "min_distance must be positive, got {}",
                config.min_distance
            )));
        }
        let default_state = CameraState::from_config(&config)?;
        Ok(Self {
            state: default_state.clone(),
            default_state,
            config,
            mode: InteractionMode::default(),
            drag: None,
            viewport,
        })
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Switch mode; an active drag ends
    pub fn set_mode(&mut self, mode: InteractionMode) {
        if mode != self.mode {
            log::debug!("Interaction mode {} -> {}", self.mode, mode);
        }
        self.drag = None;
        self.mode = mode;
    }

    /// Set the viewport used to scale drags; empty sizes are ignored
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            log::debug!("Ignoring empty viewport {}x{}", viewport.width, viewport.height);
            return;
        }
        self.viewport = viewport;
    }

    /// Record the drag anchor; the pose is not touched
    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag = Some(DragAnchor { x, y });
    }

    /// Apply the drag from the anchor to `(x, y)`.
    ///
    /// Returns `None` when no drag is active, or when the delta could not be
    /// applied, in which case every piece of state is left as it was.
    pub fn update_drag(&mut self, x: f32, y: f32) -> Option<DragOutcome> {
        let anchor = self.drag?;
        self.drag = Some(DragAnchor { x, y });
        let (dx, dy) = (x - anchor.x, y - anchor.y);
        if !(dx.is_finite() && dy.is_finite()) {
            return None;
        }

        match self.apply_drag(dx, dy) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                log::warn!("Discarding {} drag ({}, {}): {}", self.mode, dx, dy, e);
                None
            }
        }
    }

    /// Clear the drag anchor; a no-op without an active drag
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    fn apply_drag(&mut self, dx: f32, dy: f32) -> Result<DragOutcome> {
        let width = self.viewport.width.max(1) as f32;
        let radians_per_pixel = self.config.arcball_radians_per_width / width;

        match self.mode {
            InteractionMode::Arcball => {
                let (_, right, up) = self.state.basis()?;
                let rotation =
                    rotation_about(&up, -dx * radians_per_pixel)? * rotation_about(&right, -dy * radians_per_pixel)?;
                self.orbit(&rotation)?;
                Ok(DragOutcome::Camera)
            }
            InteractionMode::Fly => {
                let (_, right, up) = self.state.basis()?;
                let scale = self.config.fly_speed * self.state.distance() / width;
                let shift = (-right * dx + up * dy) * scale;
                if !shift.iter().all(|c| c.is_finite()) {
                    return Err(Error::InvalidData(format!("fly shift {:?} is not finite", shift)));
                }
                let (position, target) = (self.state.position + shift, self.state.target + shift);
                if !position.iter().chain(target.iter()).all(|c| c.is_finite()) {
                    return Err(Error::InvalidData("fly moved the camera out of range".to_string()));
                }
                self.state.position = position;
                self.state.target = target;
                Ok(DragOutcome::Camera)
            }
            InteractionMode::Model => Ok(DragOutcome::ModelRotation(self.screen_rotation(dx, dy, radians_per_pixel)?)),
            InteractionMode::Sun => Ok(DragOutcome::SunRotation(self.screen_rotation(dx, dy, radians_per_pixel)?)),
            InteractionMode::Environment => {
                let yaw = dx * radians_per_pixel;
                if !yaw.is_finite() {
                    return Err(Error::InvalidData(format!("environment yaw {} is not finite", yaw)));
                }
                Ok(DragOutcome::EnvironmentRotation(yaw))
            }
        }
    }

    /// Rotation that turns world content the way the pointer moved
    fn screen_rotation(&self, dx: f32, dy: f32, radians_per_pixel: f32) -> Result<Rotation3f> {
        let (_, right, up) = self.state.basis()?;
        Ok(rotation_about(&up, dx * radians_per_pixel)? * rotation_about(&right, dy * radians_per_pixel)?)
    }

    fn orbit(&mut self, rotation: &Rotation3f) -> Result<()> {
        let distance = self.state.distance();
        let offset = rotation * (self.state.position - self.state.target);
        let up = rotation * self.state.up;
        // rescale so float drift never changes the orbit radius
        let offset = offset * (distance / offset.norm());
        let (_, _, up) = camera_basis(&-offset, &up)?;
        self.state.position = self.state.target + offset;
        self.state.up = up;
        Ok(())
    }

    /// Move along the view direction by `delta` notches.
    ///
    /// Positive values zoom in. Each notch scales the distance by
    /// `1 - zoom_step`; the result is clamped to the configured range.
    /// Returns whether the pose changed.
    pub fn zoom(&mut self, delta: f32) -> bool {
        if !delta.is_finite() || delta == 0.0 {
            return false;
        }
        let distance = self.state.distance();
        let wanted = distance * (1.0 - self.config.zoom_step).powf(delta);
        let clamped = if wanted.is_nan() {
            distance
        } else {
            wanted.clamp(self.config.min_distance, self.config.max_distance)
        };
        if (clamped - distance).abs() <= distance * 1e-6 {
            return false;
        }
        match self.state.with_target_distance(self.state.target, clamped) {
            Ok(state) => {
                self.state = state;
                true
            }
            Err(e) => {
                log::warn!("Zoom discarded: {}", e);
                false
            }
        }
    }

    /// Restore the configured default pose
    pub fn reset(&mut self) {
        self.drag = None;
        self.state = self.default_state.clone();
    }

    /// Aim at a bounding sphere so it fills the view, keeping the direction.
    ///
    /// The reset pose is not changed.
    pub fn frame(&mut self, center: Point3f, radius: f32) -> Result<()> {
        if !(radius.is_finite() && center.iter().all(|c| c.is_finite())) {
            return Err(Error::InvalidData("cannot frame a non-finite bounding sphere".to_string()));
        }
        let half_fov = (self.state.fov_y * 0.5).sin().max(f32::EPSILON);
        let distance =
            (radius.max(0.0) * 1.1 / half_fov).clamp(self.config.min_distance, self.config.max_distance);
        self.state = self.state.with_target_distance(center, distance)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn controller() -> CameraController {
        CameraController::new(CameraConfig::default(), Viewport::new(600, 400)).unwrap()
    }

    #[test]
    fn test_default_pose() {
        let camera = controller();
        assert_eq!(camera.state().position(), Point3f::new(0.0, 0.0, 5.0));
        assert_relative_eq!(camera.state().distance(), 5.0);
        assert_eq!(camera.mode(), InteractionMode::Arcball);
    }

    #[test]
    fn test_parallel_up_rejected() {
        let result = CameraState::new(
            Point3f::new(0.0, 5.0, 0.0),
            Point3f::origin(),
            Vector3f::y(),
            1.0,
            0.1,
            10.0,
        );
        assert!(matches!(result, Err(Error::DegenerateVector { .. })));
    }

    #[test]
    fn test_update_without_begin_is_noop() {
        let mut camera = controller();
        let before = camera.state().clone();
        assert_eq!(camera.update_drag(100.0, 40.0), None);
        assert_eq!(camera.state(), &before);
        camera.end_drag();
        camera.end_drag();
        assert!(!camera.is_dragging());
    }

    #[test]
    fn test_begin_drag_does_not_move_camera() {
        let mut camera = controller();
        let before = camera.state().clone();
        camera.begin_drag(10.0, 10.0);
        assert_eq!(camera.state(), &before);
        assert!(camera.is_dragging());
    }

    #[test]
    fn test_arcball_full_width_is_half_turn() {
        let mut camera = controller();
        camera.begin_drag(0.0, 200.0);
        assert_eq!(camera.update_drag(600.0, 200.0), Some(DragOutcome::Camera));
        let position = camera.state().position();
        assert_relative_eq!(position, Point3f::new(0.0, 0.0, -5.0), epsilon = 1e-4);
        assert_relative_eq!(camera.state().up(), Vector3f::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_arcball_over_the_pole_keeps_basis() {
        let mut camera = controller();
        camera.begin_drag(0.0, 0.0);
        // exactly straight up, where a fixed world up would degenerate
        camera.update_drag(0.0, 300.0);
        let state = camera.state();
        assert_relative_eq!(state.distance(), 5.0, epsilon = 1e-4);
        assert!(state.basis().is_ok());
        assert_relative_eq!(state.up().dot(&(state.target() - state.position())), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_fly_moves_position_and_target_together() {
        let mut camera = controller();
        camera.set_mode(InteractionMode::Fly);
        camera.begin_drag(300.0, 200.0);
        camera.update_drag(360.0, 200.0);
        let state = camera.state();
        assert!(state.position().x < 0.0);
        assert_relative_eq!(state.position() - state.target(), Vector3f::new(0.0, 0.0, 5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_overflowing_fly_drag_is_discarded() {
        let config = CameraConfig {
            fly_speed: 1000.0,
            ..CameraConfig::default()
        };
        let mut camera = CameraController::new(config, Viewport::new(600, 400)).unwrap();
        camera.set_mode(InteractionMode::Fly);
        let before = camera.state().clone();
        camera.begin_drag(0.0, 0.0);
        assert_eq!(camera.update_drag(3.0e38, 0.0), None);
        assert_eq!(camera.state(), &before);

        camera.end_drag();
        camera.begin_drag(300.0, 200.0);
        assert_eq!(camera.update_drag(301.0, 200.0), Some(DragOutcome::Camera));
        assert!(camera.state().position().x < 0.0);
        assert!(camera.state().basis().is_ok());
    }

    #[test]
    fn test_scene_modes_leave_camera_alone() {
        let mut camera = controller();
        let before = camera.state().clone();
        for mode in [InteractionMode::Model, InteractionMode::Sun, InteractionMode::Environment] {
            camera.set_mode(mode);
            camera.begin_drag(0.0, 0.0);
            let outcome = camera.update_drag(50.0, 0.0).unwrap();
            camera.end_drag();
            assert_eq!(camera.state(), &before);
            match (mode, outcome) {
                (InteractionMode::Model, DragOutcome::ModelRotation(q)) => {
                    assert!(q.angle() > 0.0);
                }
                (InteractionMode::Sun, DragOutcome::SunRotation(_)) => {}
                (InteractionMode::Environment, DragOutcome::EnvironmentRotation(yaw)) => {
                    assert_relative_eq!(yaw, 50.0 / 600.0 * std::f32::consts::PI);
                }
                other => panic!("unexpected outcome {:?}", other),
            }
        }
    }

    #[test]
    fn test_set_mode_ends_drag() {
        let mut camera = controller();
        camera.begin_drag(0.0, 0.0);
        camera.set_mode(InteractionMode::Fly);
        assert!(!camera.is_dragging());
    }

    #[test]
    fn test_zoom_is_multiplicative_and_clamped() {
        let mut camera = controller();
        assert!(camera.zoom(1.0));
        assert_relative_eq!(camera.state().distance(), 4.5, epsilon = 1e-5);
        camera.zoom(1e6);
        assert_relative_eq!(camera.state().distance(), 0.05, epsilon = 1e-6);
        assert!(!camera.zoom(1.0));
        camera.zoom(-1e6);
        assert_relative_eq!(camera.state().distance(), 1000.0, epsilon = 1e-2);
        assert!(!camera.zoom(f32::NAN));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut camera = controller();
        camera.begin_drag(0.0, 0.0);
        camera.update_drag(123.0, 45.0);
        camera.zoom(3.0);
        camera.frame(Point3f::new(1.0, 2.0, 3.0), 2.0).unwrap();
        camera.reset();
        assert_eq!(camera.state(), &CameraState::from_config(&CameraConfig::default()).unwrap());
        assert!(!camera.is_dragging());
    }

    #[test]
    fn test_frame_fits_sphere() {
        let mut camera = controller();
        camera.frame(Point3f::new(1.0, 0.0, 0.0), 1.0).unwrap();
        let state = camera.state();
        assert_eq!(state.target(), Point3f::new(1.0, 0.0, 0.0));
        let expected = 1.1 / (std::f32::consts::FRAC_PI_8).sin();
        assert_relative_eq!(state.distance(), expected, epsilon = 1e-4);
    }

    #[test]
    fn test_view_projection_maps_target_to_center() {
        let camera = controller();
        let vp = camera.state().view_projection(Viewport::new(600, 400)).unwrap();
        let clip = vp * camera.state().target().to_homogeneous();
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-6);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-6);
    }
}
