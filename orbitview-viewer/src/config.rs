//! Viewer configuration
//!
//! Plain data loaded from and saved to JSON. Every field has a default, so a
//! partial file only overrides what it names.

use crate::render::Viewport;
use crate::scene::{LightingProfile, MaterialDescriptor, MaterialKind, MaterialPreset, Rgb, SceneModel};
use orbitview_core::{Error, Point3f, Result, Vector3f};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Camera defaults and input sensitivities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Arcball rotation for a drag across the full viewport width
    pub arcball_radians_per_width: f32,
    /// Fly translation per viewport width, as a fraction of the target distance
    pub fly_speed: f32,
    /// Fraction of the distance covered by one wheel notch
    pub zoom_step: f32,
    /// Raw wheel units per notch
    pub wheel_notch: f32,
    /// Move the camera to fit each newly loaded asset
    pub frame_on_load: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_y: std::f32::consts::FRAC_PI_4,
            near: 0.1,
            far: 100.0,
            min_distance: 0.05,
            max_distance: 1000.0,
            arcball_radians_per_width: std::f32::consts::PI,
            fly_speed: 1.0,
            zoom_step: 0.1,
            wheel_notch: 120.0,
            frame_on_load: false,
        }
    }
}

impl CameraConfig {
    pub fn position(&self) -> Point3f {
        Point3f::from(self.position)
    }

    pub fn target(&self) -> Point3f {
        Point3f::from(self.target)
    }

    pub fn up(&self) -> Vector3f {
        Vector3f::from(self.up)
    }
}

/// Initial sidebar state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDefaults {
    pub background: Rgb,
    pub material_color: Rgb,
    pub point_size: f32,
    pub show_skymap: bool,
    pub show_axes: bool,
    pub material_kind: MaterialKind,
    pub material_preset: MaterialPreset,
    pub lighting: LightingProfile,
}

impl Default for SceneDefaults {
    fn default() -> Self {
        let material = MaterialDescriptor::default();
        Self {
            background: Rgb::WHITE,
            material_color: material.base_color,
            point_size: material.point_size,
            show_skymap: false,
            show_axes: true,
            material_kind: material.kind,
            material_preset: material.preset,
            lighting: LightingProfile::BrightDay,
        }
    }
}

impl SceneDefaults {
    pub fn material(&self) -> MaterialDescriptor {
        MaterialDescriptor {
            kind: self.material_kind,
            preset: self.material_preset,
            base_color: self.material_color,
            point_size: self.point_size,
        }
        .normalized()
    }

    /// Empty scene with these settings
    pub fn build(&self) -> SceneModel {
        SceneModel::new(self.material(), self.lighting, self.background, self.show_skymap, self.show_axes)
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub camera: CameraConfig,
    pub scene: SceneDefaults,
    pub viewport: Viewport,
    /// Directory holding the file-backed samples
    pub samples_dir: Option<PathBuf>,
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid viewer config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded viewer config from {}", path.display());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json_string()?)?;
        Ok(())
    }

    /// Check the invariants the camera and renderer rely on
    pub fn validate(&self) -> Result<()> {
        let c = &self.camera;
        let fail = |msg: String| Err(Error::Config(msg));
        if !(c.min_distance > 0.0) {
            return fail(format!("min_distance must be positive, got {}", c.min_distance));
        }
        if c.min_distance > c.max_distance {
            return fail(format!(
                "min_distance {} exceeds max_distance {}",
                c.min_distance, c.max_distance
            ));
        }
        if !(c.near > 0.0) || c.far <= c.near {
            return fail(format!("clip planes must satisfy 0 < near < far, got {} and {}", c.near, c.far));
        }
        if !(c.fov_y > 0.0 && c.fov_y < std::f32::consts::PI) {
            return fail(format!("fov_y must be in (0, pi), got {}", c.fov_y));
        }
        if !(c.zoom_step > 0.0 && c.zoom_step < 1.0) {
            return fail(format!("zoom_step must be in (0, 1), got {}", c.zoom_step));
        }
        if !(c.wheel_notch > 0.0) {
            return fail(format!("wheel_notch must be positive, got {}", c.wheel_notch));
        }
        if !(c.fly_speed.is_finite() && c.fly_speed > 0.0) {
            return fail(format!("fly_speed must be finite and positive, got {}", c.fly_speed));
        }
        if !(c.arcball_radians_per_width.is_finite() && c.arcball_radians_per_width > 0.0) {
            return fail(format!(
                "arcball_radians_per_width must be finite and positive, got {}",
                c.arcball_radians_per_width
            ));
        }
        if self.viewport.is_empty() {
            return fail("viewport must be non-empty".to_string());
        }
        let offset = c.position() - c.target();
        if offset.norm() < c.min_distance {
            return fail("default camera position is too close to its target".to_string());
        }
        if offset.cross(&c.up()).norm() < orbitview_core::math::DEGENERATE_EPSILON {
            return fail("default camera up vector is parallel to the view direction".to_string());
        }
        Ok(())
    }
}
