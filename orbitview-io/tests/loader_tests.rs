//! Integration tests for orbitview-io
//!
//! These exercise the loader through files on disk and the sample catalogue.

use orbitview_core::{Drawable, ErrorKind};
use orbitview_io::{read_asset, write_asset, AssetFormat, AssetLoader, AssetSource, SampleModel};
use std::path::PathBuf;
use std::sync::Arc;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("orbitview-io-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_cube_sample_scenario() {
    let asset = AssetLoader::default()
        .load(&AssetSource::Sample(SampleModel::Cube))
        .unwrap();
    assert_eq!(asset.vertex_count(), 8);
    assert_eq!(asset.index_count(), 36);
    assert!(asset.indices().iter().all(|&i| (i as usize) < asset.vertex_count()));
    assert_eq!(asset.name(), "Cube");
}

#[test]
fn test_file_round_trip_through_disk() {
    let dir = temp_dir("disk");
    let path = dir.join("cube.ply");
    let cube = orbitview_io::samples::cube();
    write_asset(&cube, &path).unwrap();

    let loaded = read_asset(&path).unwrap();
    assert_eq!(loaded.name(), "cube");
    assert_eq!(loaded.vertices(), cube.vertices());
    assert_eq!(loaded.bounding_box(), cube.bounding_box());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_file_backed_sample_from_directory() {
    let dir = temp_dir("samples");
    std::fs::write(dir.join("teapot.obj"), "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

    let loader = AssetLoader::default().with_samples_dir(&dir);
    let teapot = loader.load(&AssetSource::Sample(SampleModel::Teapot)).unwrap();
    assert_eq!(teapot.name(), "Teapot");
    assert_eq!(teapot.triangle_count(), 1);

    let err = loader.load(&AssetSource::Sample(SampleModel::Dragon)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = read_asset("/definitely/not/here.obj").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_malformed_bytes_are_parse_errors() {
    let loader = AssetLoader::default();
    let source = AssetSource::Bytes {
        name: "broken".to_string(),
        bytes: Arc::from(&b"v 0 0 0\nf 1 2 3\n"[..]),
        hint: Some(AssetFormat::Obj),
    };
    let err = loader.load(&source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_extension_hint_wins_over_sniffing() {
    let loader = AssetLoader::default();
    // valid OBJ text forced through the PLY decoder
    let source = AssetSource::Bytes {
        name: "mislabelled".to_string(),
        bytes: Arc::from(&b"v 0 0 0\n"[..]),
        hint: Some(AssetFormat::Ply),
    };
    assert_eq!(loader.load(&source).unwrap_err().kind(), ErrorKind::Parse);
}

#[test]
fn test_write_unknown_extension() {
    let err = write_asset(&orbitview_io::samples::cube(), "/tmp/cube.xyz").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}
