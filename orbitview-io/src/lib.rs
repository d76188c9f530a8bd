//! Mesh loading for orbitview
//!
//! This crate turns bytes into [`Asset`]s. Every format is a pure decoding
//! function from a byte slice; file access is a thin layer on top. Supported
//! formats are OBJ, PLY (ASCII and binary) and STL (ASCII and binary). FBX is
//! recognised so it can be rejected with a clear error.

pub mod obj;
pub mod ply;
pub mod registry;
pub mod samples;
pub mod stl;

#[cfg(test)]
mod tests;

pub use registry::{AssetDecoder, AssetEncoder, LoaderRegistry};
pub use samples::SampleModel;

use orbitview_core::{Asset, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Mesh file formats known to the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetFormat {
    Obj,
    Ply,
    Stl,
    Fbx,
}

impl AssetFormat {
    pub const ALL: [AssetFormat; 4] = [AssetFormat::Obj, AssetFormat::Ply, AssetFormat::Stl, AssetFormat::Fbx];

    /// Resolve a format from a file extension, case-insensitively
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "obj" => Some(AssetFormat::Obj),
            "ply" => Some(AssetFormat::Ply),
            "stl" => Some(AssetFormat::Stl),
            "fbx" => Some(AssetFormat::Fbx),
            _ => None,
        }
    }

    /// Resolve a format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AssetFormat::Obj => "obj",
            AssetFormat::Ply => "ply",
            AssetFormat::Stl => "stl",
            AssetFormat::Fbx => "fbx",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetFormat::Obj => "OBJ",
            AssetFormat::Ply => "PLY",
            AssetFormat::Stl => "STL",
            AssetFormat::Fbx => "FBX",
        }
    }

    /// Guess the format of a byte buffer from its leading bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"Kaydara FBX Binary") || bytes.starts_with(b"; FBX") {
            return Some(AssetFormat::Fbx);
        }
        if ply::looks_like_ply(bytes) {
            return Some(AssetFormat::Ply);
        }
        // binary STL is checked before ASCII because many exporters start the
        // 80 byte binary header with "solid"
        if stl::looks_like_binary_stl(bytes) || stl::looks_like_ascii_stl(bytes) {
            return Some(AssetFormat::Stl);
        }
        if obj::looks_like_obj(bytes) {
            return Some(AssetFormat::Obj);
        }
        None
    }
}

impl std::fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where an asset comes from
#[derive(Debug, Clone, PartialEq)]
pub enum AssetSource {
    /// A mesh file on disk
    File(PathBuf),
    /// One of the built-in sample models
    Sample(SampleModel),
    /// An in-memory buffer, e.g. from a drag-and-drop
    Bytes {
        name: String,
        bytes: Arc<[u8]>,
        hint: Option<AssetFormat>,
    },
}

impl AssetSource {
    /// Human readable name of the source
    pub fn display_name(&self) -> String {
        match self {
            AssetSource::File(path) => path.display().to_string(),
            AssetSource::Sample(sample) => sample.label().to_string(),
            AssetSource::Bytes { name, .. } => name.clone(),
        }
    }
}

/// Decode `bytes` into an asset using the default registry.
///
/// `hint` takes precedence over magic-byte sniffing.
pub fn parse(bytes: &[u8], hint: Option<AssetFormat>) -> Result<Asset> {
    LoaderRegistry::with_defaults().decode("asset", bytes, hint)
}

/// Encode `asset` in `format` using the default registry
pub fn serialize(asset: &Asset, format: AssetFormat) -> Result<Vec<u8>> {
    LoaderRegistry::with_defaults().encode(asset, format)
}

/// Auto-detect format and read an asset from disk
pub fn read_asset<P: AsRef<Path>>(path: P) -> Result<Asset> {
    AssetLoader::default().load(&AssetSource::File(path.as_ref().to_path_buf()))
}

/// Write an asset to disk in the format implied by the extension
pub fn write_asset<P: AsRef<Path>>(asset: &Asset, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = AssetFormat::from_path(path).ok_or_else(|| {
        Error::UnsupportedFormat(format!("cannot infer mesh format from {}", path.display()))
    })?;
    let bytes = serialize(asset, format)?;
    std::fs::write(path, bytes)?;
    log::info!("Wrote {} ({} vertices) to {}", asset.name(), asset.vertex_count(), path.display());
    Ok(())
}

/// Resolves [`AssetSource`]s into assets.
///
/// Holds the decoder registry and the directory of file-backed samples.
pub struct AssetLoader {
    registry: LoaderRegistry,
    samples_dir: Option<PathBuf>,
}

impl AssetLoader {
    pub fn new(registry: LoaderRegistry, samples_dir: Option<PathBuf>) -> Self {
        Self { registry, samples_dir }
    }

    pub fn with_samples_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.samples_dir = Some(dir.into());
        self
    }

    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Load an asset; on failure nothing outside the returned error is produced
    pub fn load(&self, source: &AssetSource) -> Result<Asset> {
        let asset = match source {
            AssetSource::File(path) => {
                let bytes = std::fs::read(path)?;
                let name = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("asset");
                self.registry.decode(name, &bytes, AssetFormat::from_path(path))?
            }
            AssetSource::Sample(sample) => match sample.generate() {
                Some(asset) => asset,
                None => {
                    let path = sample.resolve_path(self.samples_dir.as_deref())?;
                    let bytes = std::fs::read(&path)?;
                    self.registry.decode(sample.label(), &bytes, AssetFormat::from_path(&path))?
                }
            },
            AssetSource::Bytes { name, bytes, hint } => self.registry.decode(name, bytes, *hint)?,
        };
        log::info!(
            "Loaded {} ({} vertices, {} triangles)",
            source.display_name(),
            asset.vertex_count(),
            asset.triangle_count()
        );
        Ok(asset)
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new(LoaderRegistry::with_defaults(), None)
    }
}
