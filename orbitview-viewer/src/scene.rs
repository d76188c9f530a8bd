//! Scene model snapshots
//!
//! A [`SceneModel`] is an immutable value. Every setter returns a new
//! snapshot and leaves `self` untouched, so a render request holding an
//! `Arc<SceneModel>` keeps seeing exactly the state it was issued with.

use orbitview_core::{Asset, Error, Result, Rotation3f, Vector3f};
use orbitview_io::{AssetLoader, AssetSource, SampleModel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Color as three 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse the three text-entry channel fields of a color row
    pub fn parse_channels(r: &str, g: &str, b: &str) -> Result<Self> {
        fn channel(name: &str, text: &str) -> Result<u8> {
            text.trim().parse::<u8>().map_err(|_| {
                Error::InvalidData(format!("{} channel must be an integer in 0..=255, got '{}'", name, text))
            })
        }
        Ok(Self::new(channel("R", r)?, channel("G", g)?, channel("B", b)?))
    }

    /// Channels scaled to `0.0..=1.0`
    pub fn to_f32(self) -> [f32; 3] {
        [self.r as f32 / 255.0, self.g as f32 / 255.0, self.b as f32 / 255.0]
    }

    /// Hex form used by color pickers, e.g. `#e6e6e6`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Shading model applied to the asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Lit,
    Unlit,
    Pbr,
    Wireframe,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 4] = [MaterialKind::Lit, MaterialKind::Unlit, MaterialKind::Pbr, MaterialKind::Wireframe];

    pub fn label(&self) -> &'static str {
        match self {
            MaterialKind::Lit => "Lit",
            MaterialKind::Unlit => "Unlit",
            MaterialKind::Pbr => "PBR",
            MaterialKind::Wireframe => "Wireframe",
        }
    }
}

impl FromStr for MaterialKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidData(format!("unknown material type '{}'", s)))
    }
}

/// Surface parameters of a material preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetParams {
    pub roughness: f32,
    pub metallic: f32,
    pub opacity: f32,
}

/// Named material presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialPreset {
    PolishedCeramic,
    RoughMetal,
    Plastic,
    Glass,
    Wood,
}

impl MaterialPreset {
    pub const ALL: [MaterialPreset; 5] = [
        MaterialPreset::PolishedCeramic,
        MaterialPreset::RoughMetal,
        MaterialPreset::Plastic,
        MaterialPreset::Glass,
        MaterialPreset::Wood,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MaterialPreset::PolishedCeramic => "Polished ceramic [default]",
            MaterialPreset::RoughMetal => "Rough metal",
            MaterialPreset::Plastic => "Plastic",
            MaterialPreset::Glass => "Glass",
            MaterialPreset::Wood => "Wood",
        }
    }

    pub fn params(&self) -> PresetParams {
        let (roughness, metallic, opacity) = match self {
            MaterialPreset::PolishedCeramic => (0.1, 0.0, 1.0),
            MaterialPreset::RoughMetal => (0.7, 1.0, 1.0),
            MaterialPreset::Plastic => (0.4, 0.0, 1.0),
            MaterialPreset::Glass => (0.05, 0.0, 0.35),
            MaterialPreset::Wood => (0.8, 0.0, 1.0),
        };
        PresetParams { roughness, metallic, opacity }
    }
}

impl FromStr for MaterialPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| {
                let label = p.label();
                let short = label.trim_end_matches(" [default]");
                label.eq_ignore_ascii_case(wanted) || short.eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| Error::InvalidData(format!("unknown material preset '{}'", s)))
    }
}

/// Material settings from the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialDescriptor {
    pub kind: MaterialKind,
    pub preset: MaterialPreset,
    pub base_color: Rgb,
    pub point_size: f32,
}

impl MaterialDescriptor {
    pub const MIN_POINT_SIZE: f32 = 0.1;
    pub const MAX_POINT_SIZE: f32 = 10.0;

    /// Copy of this descriptor with `point_size` clamped to the slider range
    pub fn normalized(mut self) -> Self {
        self.point_size = if self.point_size.is_finite() {
            self.point_size.clamp(Self::MIN_POINT_SIZE, Self::MAX_POINT_SIZE)
        } else {
            1.0
        };
        self
    }
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Lit,
            preset: MaterialPreset::PolishedCeramic,
            base_color: Rgb::new(230, 230, 230),
            point_size: 1.0,
        }
    }
}

/// Light setup derived from a lighting profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingParams {
    /// Unit vector pointing from the scene towards the sun
    pub sun_direction: Vector3f,
    pub sun_color: [f32; 3],
    pub sun_intensity: f32,
    pub ambient: f32,
    pub sky_zenith: [f32; 3],
    pub sky_horizon: [f32; 3],
}

/// Lighting profiles offered in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightingProfile {
    BrightDay,
    Studio,
    Overcast,
    Night,
}

impl LightingProfile {
    pub const ALL: [LightingProfile; 4] = [
        LightingProfile::BrightDay,
        LightingProfile::Studio,
        LightingProfile::Overcast,
        LightingProfile::Night,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LightingProfile::BrightDay => "Bright day with sun at +Y [default]",
            LightingProfile::Studio => "Studio lighting",
            LightingProfile::Overcast => "Outdoor overcast",
            LightingProfile::Night => "Night scene",
        }
    }

    pub fn params(&self) -> LightingParams {
        match self {
            LightingProfile::BrightDay => LightingParams {
                sun_direction: Vector3f::new(0.2, 1.0, 0.4).normalize(),
                sun_color: [1.0, 0.98, 0.92],
                sun_intensity: 1.0,
                ambient: 0.35,
                sky_zenith: [0.36, 0.58, 0.9],
                sky_horizon: [0.85, 0.9, 0.97],
            },
            LightingProfile::Studio => LightingParams {
                sun_direction: Vector3f::new(0.5, 0.7, 0.8).normalize(),
                sun_color: [1.0, 1.0, 1.0],
                sun_intensity: 0.9,
                ambient: 0.45,
                sky_zenith: [0.25, 0.25, 0.27],
                sky_horizon: [0.6, 0.6, 0.62],
            },
            LightingProfile::Overcast => LightingParams {
                sun_direction: Vector3f::new(0.0, 1.0, 0.1).normalize(),
                sun_color: [0.85, 0.88, 0.92],
                sun_intensity: 0.45,
                ambient: 0.6,
                sky_zenith: [0.62, 0.65, 0.7],
                sky_horizon: [0.8, 0.82, 0.84],
            },
            LightingProfile::Night => LightingParams {
                sun_direction: Vector3f::new(-0.3, 0.8, -0.4).normalize(),
                sun_color: [0.55, 0.6, 0.85],
                sun_intensity: 0.25,
                ambient: 0.12,
                sky_zenith: [0.01, 0.02, 0.06],
                sky_horizon: [0.07, 0.09, 0.16],
            },
        }
    }
}

impl FromStr for LightingProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        let short = |p: &LightingProfile| match p {
            LightingProfile::BrightDay => "bright-day",
            LightingProfile::Studio => "studio",
            LightingProfile::Overcast => "overcast",
            LightingProfile::Night => "night",
        };
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted) || short(p).eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidData(format!("unknown lighting profile '{}'", s)))
    }
}

/// Boolean view options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Toggle {
    ShowSkymap,
    ShowAxes,
}

impl FromStr for Toggle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "show-skymap" | "skymap" => Ok(Toggle::ShowSkymap),
            "show-axes" | "axes" => Ok(Toggle::ShowAxes),
            _ => Err(Error::InvalidData(format!("unknown toggle '{}'", s))),
        }
    }
}

/// What the current asset was loaded from
#[derive(Debug, Clone, PartialEq)]
pub enum AssetRef {
    Path(PathBuf),
    Sample(SampleModel),
    Memory(String),
}

impl From<&AssetSource> for AssetRef {
    fn from(source: &AssetSource) -> Self {
        match source {
            AssetSource::File(path) => AssetRef::Path(path.clone()),
            AssetSource::Sample(sample) => AssetRef::Sample(*sample),
            AssetSource::Bytes { name, .. } => AssetRef::Memory(name.clone()),
        }
    }
}

/// Immutable snapshot of everything the renderer needs besides the camera
#[derive(Debug, Clone, PartialEq)]
pub struct SceneModel {
    asset: Option<Arc<Asset>>,
    asset_ref: Option<AssetRef>,
    material: MaterialDescriptor,
    lighting: LightingProfile,
    background: Rgb,
    show_skymap: bool,
    show_axes: bool,
    model_rotation: Rotation3f,
    sun_rotation: Rotation3f,
    environment_rotation: f32,
    revision: u64,
}

impl SceneModel {
    pub fn new(
        material: MaterialDescriptor,
        lighting: LightingProfile,
        background: Rgb,
        show_skymap: bool,
        show_axes: bool,
    ) -> Self {
        Self {
            asset: None,
            asset_ref: None,
            material: material.normalized(),
            lighting,
            background,
            show_skymap,
            show_axes,
            model_rotation: Rotation3f::identity(),
            sun_rotation: Rotation3f::identity(),
            environment_rotation: 0.0,
            revision: 0,
        }
    }

    pub fn asset(&self) -> Option<&Arc<Asset>> {
        self.asset.as_ref()
    }

    pub fn asset_ref(&self) -> Option<&AssetRef> {
        self.asset_ref.as_ref()
    }

    pub fn material(&self) -> MaterialDescriptor {
        self.material
    }

    pub fn lighting(&self) -> LightingProfile {
        self.lighting
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn toggle(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::ShowSkymap => self.show_skymap,
            Toggle::ShowAxes => self.show_axes,
        }
    }

    /// Rotation of the asset about its bounding-box center
    pub fn model_rotation(&self) -> Rotation3f {
        self.model_rotation
    }

    /// Rotation applied on top of the profile's sun direction
    pub fn sun_rotation(&self) -> Rotation3f {
        self.sun_rotation
    }

    /// Yaw of the skymap about world +Y, in radians
    pub fn environment_rotation(&self) -> f32 {
        self.environment_rotation
    }

    /// Monotonic counter bumped by every change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Lighting of the active profile with the sun rotation applied
    pub fn lighting_params(&self) -> LightingParams {
        let mut params = self.lighting.params();
        params.sun_direction = self.sun_rotation * params.sun_direction;
        params
    }

    fn next(&self) -> Self {
        let mut next = self.clone();
        next.revision += 1;
        next
    }

    /// Load an asset and return the snapshot with it installed.
    ///
    /// On failure the error is returned and no snapshot is produced, so the
    /// caller's current scene stays active.
    pub fn load_asset(&self, source: &AssetSource, loader: &AssetLoader) -> Result<Self> {
        let asset = loader.load(source)?;
        Ok(self.with_asset(AssetRef::from(source), Arc::new(asset)))
    }

    /// Snapshot with a new asset installed wholesale; resets the model rotation
    pub fn with_asset(&self, asset_ref: AssetRef, asset: Arc<Asset>) -> Self {
        let mut next = self.next();
        next.asset = Some(asset);
        next.asset_ref = Some(asset_ref);
        next.model_rotation = Rotation3f::identity();
        next
    }

    pub fn set_material(&self, descriptor: MaterialDescriptor) -> Self {
        let mut next = self.next();
        next.material = descriptor.normalized();
        next
    }

    pub fn set_lighting(&self, profile: LightingProfile) -> Self {
        let mut next = self.next();
        next.lighting = profile;
        next
    }

    pub fn set_background(&self, color: Rgb) -> Self {
        let mut next = self.next();
        next.background = color;
        next
    }

    pub fn set_toggle(&self, toggle: Toggle, value: bool) -> Self {
        let mut next = self.next();
        match toggle {
            Toggle::ShowSkymap => next.show_skymap = value,
            Toggle::ShowAxes => next.show_axes = value,
        }
        next
    }

    /// Compose a delta rotation onto the asset rotation
    pub fn rotate_model(&self, delta: Rotation3f) -> Self {
        let mut next = self.next();
        next.model_rotation = renormalized(delta * self.model_rotation);
        next
    }

    /// Compose a delta rotation onto the sun direction
    pub fn rotate_sun(&self, delta: Rotation3f) -> Self {
        let mut next = self.next();
        next.sun_rotation = renormalized(delta * self.sun_rotation);
        next
    }

    /// Add a yaw delta to the skymap rotation, wrapped to `(-pi, pi]`
    pub fn rotate_environment(&self, yaw: f32) -> Self {
        use std::f32::consts::{PI, TAU};
        let mut next = self.next();
        let mut angle = (self.environment_rotation + yaw).rem_euclid(TAU);
        if angle > PI {
            angle -= TAU;
        }
        next.environment_rotation = angle;
        next
    }
}

// repeated composition drifts off unit length
fn renormalized(mut rotation: Rotation3f) -> Rotation3f {
    rotation.renormalize_fast();
    rotation
}

impl Default for SceneModel {
    fn default() -> Self {
        Self::new(MaterialDescriptor::default(), LightingProfile::BrightDay, Rgb::WHITE, false, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use orbitview_core::ErrorKind;
    use std::sync::Arc;

    #[test]
    fn test_rgb_parse_channels() {
        assert_eq!(Rgb::parse_channels("255", " 0", "12").unwrap(), Rgb::new(255, 0, 12));
        assert!(Rgb::parse_channels("256", "0", "0").is_err());
        assert!(Rgb::parse_channels("-1", "0", "0").is_err());
        assert!(Rgb::parse_channels("red", "0", "0").is_err());
        assert_eq!(Rgb::new(230, 230, 230).to_hex(), "#e6e6e6");
    }

    #[test]
    fn test_point_size_clamped() {
        let scene = SceneModel::default();
        let huge = MaterialDescriptor { point_size: 50.0, ..MaterialDescriptor::default() };
        assert_eq!(scene.set_material(huge).material().point_size, 10.0);
        let tiny = MaterialDescriptor { point_size: 0.0, ..MaterialDescriptor::default() };
        assert_eq!(scene.set_material(tiny).material().point_size, 0.1);
    }

    #[test]
    fn test_setters_leave_previous_snapshot_untouched() {
        let before = Arc::new(SceneModel::default());
        let after = before
            .set_background(Rgb::BLACK)
            .set_lighting(LightingProfile::Night)
            .set_toggle(Toggle::ShowSkymap, true);

        assert_eq!(before.background(), Rgb::WHITE);
        assert_eq!(before.lighting(), LightingProfile::BrightDay);
        assert!(!before.toggle(Toggle::ShowSkymap));
        assert_eq!(after.background(), Rgb::BLACK);
        assert!(after.toggle(Toggle::ShowSkymap));
        assert_eq!(after.revision(), before.revision() + 3);
    }

    #[test]
    fn test_failed_load_produces_no_snapshot() {
        let loader = AssetLoader::default();
        let scene = SceneModel::default()
            .load_asset(&AssetSource::Sample(SampleModel::Cube), &loader)
            .unwrap();
        let bad = AssetSource::Bytes {
            name: "bad".into(),
            bytes: Arc::from(&b"v 1 2\n"[..]),
            hint: None,
        };
        let err = scene.load_asset(&bad, &loader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(scene.asset().unwrap().name(), "Cube");
    }

    #[test]
    fn test_new_asset_resets_model_rotation() {
        let loader = AssetLoader::default();
        let rotated = SceneModel::default()
            .rotate_model(Rotation3f::from_euler_angles(0.0, 1.0, 0.0))
            .load_asset(&AssetSource::Sample(SampleModel::Sphere), &loader)
            .unwrap();
        assert_eq!(rotated.model_rotation(), Rotation3f::identity());
        assert_eq!(rotated.asset_ref(), Some(&AssetRef::Sample(SampleModel::Sphere)));
    }

    #[test]
    fn test_sun_rotation_moves_light_only() {
        let scene = SceneModel::default();
        let rotated = scene.rotate_sun(Rotation3f::from_euler_angles(0.0, 0.0, 0.5));
        assert_ne!(rotated.lighting_params().sun_direction, scene.lighting_params().sun_direction);
        assert_relative_eq!(rotated.lighting_params().sun_direction.norm(), 1.0, epsilon = 1e-5);
        assert_eq!(rotated.model_rotation(), scene.model_rotation());
        assert_eq!(rotated.environment_rotation(), scene.environment_rotation());
    }

    #[test]
    fn test_environment_rotation_wraps() {
        let scene = SceneModel::default().rotate_environment(3.0).rotate_environment(3.0);
        assert_relative_eq!(scene.environment_rotation(), 6.0 - std::f32::consts::TAU, epsilon = 1e-5);
    }

    #[test]
    fn test_labels_parse() {
        assert_eq!("pbr".parse::<MaterialKind>().unwrap(), MaterialKind::Pbr);
        assert_eq!("Rough metal".parse::<MaterialPreset>().unwrap(), MaterialPreset::RoughMetal);
        assert_eq!(
            "Polished ceramic".parse::<MaterialPreset>().unwrap(),
            MaterialPreset::PolishedCeramic
        );
        assert_eq!(
            "Bright day with sun at +Y [default]".parse::<LightingProfile>().unwrap(),
            LightingProfile::BrightDay
        );
        assert_eq!("show_axes".parse::<Toggle>().unwrap(), Toggle::ShowAxes);
        assert!("grid".parse::<Toggle>().is_err());
    }
}
