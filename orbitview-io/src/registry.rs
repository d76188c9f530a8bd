//! Format registry for format-agnostic decoding and encoding
//!
//! Downstream code asks the registry for "an asset from these bytes" and never
//! needs to know which decoder handled it.

use crate::{obj, ply, stl, AssetFormat};
use orbitview_core::{Asset, Error, Result};
use std::collections::HashMap;

/// Pure decoding function from bytes to an asset
pub trait AssetDecoder: Send + Sync {
    /// Decode a complete buffer; never returns a partially built asset
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<Asset>;

    /// Get the format this decoder handles
    fn format(&self) -> AssetFormat;
}

/// Pure encoding function from an asset to bytes
pub trait AssetEncoder: Send + Sync {
    fn encode(&self, asset: &Asset) -> Result<Vec<u8>>;

    /// Get the format this encoder produces
    fn format(&self) -> AssetFormat;
}

/// Registry that manages format handlers and provides unified access
pub struct LoaderRegistry {
    decoders: HashMap<AssetFormat, Box<dyn AssetDecoder>>,
    encoders: HashMap<AssetFormat, Box<dyn AssetEncoder>>,
}

impl LoaderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
            encoders: HashMap::new(),
        }
    }

    /// Registry with the OBJ, PLY and STL handlers installed
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_decoder(Box::new(obj::ObjCodec));
        registry.register_encoder(Box::new(obj::ObjCodec));
        registry.register_decoder(Box::new(ply::PlyCodec));
        registry.register_encoder(Box::new(ply::PlyCodec));
        registry.register_decoder(Box::new(stl::StlCodec));
        registry.register_encoder(Box::new(stl::StlCodec));
        registry
    }

    /// Register a decoder, replacing any previous one for the same format
    pub fn register_decoder(&mut self, decoder: Box<dyn AssetDecoder>) {
        self.decoders.insert(decoder.format(), decoder);
    }

    /// Register an encoder, replacing any previous one for the same format
    pub fn register_encoder(&mut self, encoder: Box<dyn AssetEncoder>) {
        self.encoders.insert(encoder.format(), encoder);
    }

    pub fn can_decode(&self, format: AssetFormat) -> bool {
        self.decoders.contains_key(&format)
    }

    pub fn can_encode(&self, format: AssetFormat) -> bool {
        self.encoders.contains_key(&format)
    }

    /// Formats with a registered decoder, in a stable order
    pub fn decodable_formats(&self) -> Vec<AssetFormat> {
        AssetFormat::ALL
            .into_iter()
            .filter(|f| self.can_decode(*f))
            .collect()
    }

    /// Resolve the format for a buffer: the hint if given, otherwise sniffed
    pub fn detect(&self, bytes: &[u8], hint: Option<AssetFormat>) -> Result<AssetFormat> {
        if let Some(format) = hint {
            return Ok(format);
        }
        AssetFormat::sniff(bytes).ok_or_else(|| {
            Error::UnsupportedFormat("unable to detect mesh format from file contents".to_string())
        })
    }

    /// Decode an asset
    pub fn decode(&self, name: &str, bytes: &[u8], hint: Option<AssetFormat>) -> Result<Asset> {
        let format = self.detect(bytes, hint)?;
        log::debug!("Decoding {} as {} ({} bytes)", name, format, bytes.len());
        let decoder = self.decoders.get(&format).ok_or_else(|| {
            Error::UnsupportedFormat(format!("no decoder available for {} files", format))
        })?;
        decoder.decode(name, bytes)
    }

    /// Encode an asset
    pub fn encode(&self, asset: &Asset, format: AssetFormat) -> Result<Vec<u8>> {
        let encoder = self.encoders.get(&format).ok_or_else(|| {
            Error::UnsupportedFormat(format!("no encoder available for {} files", format))
        })?;
        encoder.encode(asset)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbitview_core::ErrorKind;

    #[test]
    fn test_empty_registry_rejects_everything() {
        let registry = LoaderRegistry::new();
        let err = registry.decode("x", b"v 0 0 0\n", Some(AssetFormat::Obj)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_fbx_is_recognised_but_unsupported() {
        let registry = LoaderRegistry::with_defaults();
        let mut bytes = b"Kaydara FBX Binary  \x00".to_vec();
        bytes.extend_from_slice(&[0u8; 32]);
        let err = registry.decode("model", &bytes, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert!(err.to_string().contains("FBX"));
    }

    #[test]
    fn test_unknown_bytes() {
        let registry = LoaderRegistry::with_defaults();
        let err = registry.decode("blob", &[0xde, 0xad, 0xbe, 0xef], None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_decodable_formats() {
        let registry = LoaderRegistry::with_defaults();
        assert_eq!(
            registry.decodable_formats(),
            vec![AssetFormat::Obj, AssetFormat::Ply, AssetFormat::Stl]
        );
        assert!(!registry.can_encode(AssetFormat::Fbx));
    }
}
