//! Built-in sample models

use orbitview_core::{Asset, Error, Point3f, Result, Vector3f, Vertex};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

/// Sample models offered by the "Open Samples" dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleModel {
    Cube,
    Sphere,
    Teapot,
    Bunny,
    Dragon,
}

impl SampleModel {
    pub const ALL: [SampleModel; 5] = [
        SampleModel::Cube,
        SampleModel::Sphere,
        SampleModel::Teapot,
        SampleModel::Bunny,
        SampleModel::Dragon,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SampleModel::Cube => "Cube",
            SampleModel::Sphere => "Sphere",
            SampleModel::Teapot => "Teapot",
            SampleModel::Bunny => "Bunny",
            SampleModel::Dragon => "Dragon",
        }
    }

    /// Parse a sample name, case-insensitively
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Build the sample procedurally, or `None` for file-backed samples
    pub fn generate(&self) -> Option<Asset> {
        match self {
            SampleModel::Cube => Some(cube()),
            SampleModel::Sphere => Some(uv_sphere(0.5, 16, 32)),
            _ => None,
        }
    }

    /// Location of a file-backed sample: `<dir>/<name>.obj`
    pub fn resolve_path(&self, samples_dir: Option<&Path>) -> Result<PathBuf> {
        let dir = samples_dir.ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("sample '{}' needs a samples directory", self.label()),
            ))
        })?;
        Ok(dir.join(format!("{}.obj", self.label().to_ascii_lowercase())))
    }
}

impl std::str::FromStr for SampleModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s).ok_or_else(|| Error::InvalidData(format!("unknown sample model '{}'", s)))
    }
}

/// Unit cube centred on the origin: 8 shared corners, 12 outward-facing triangles
pub fn cube() -> Asset {
    let corners: [[f32; 3]; 8] = [
        [-0.5, -0.5, -0.5],
        [0.5, -0.5, -0.5],
        [0.5, 0.5, -0.5],
        [-0.5, 0.5, -0.5],
        [-0.5, -0.5, 0.5],
        [0.5, -0.5, 0.5],
        [0.5, 0.5, 0.5],
        [-0.5, 0.5, 0.5],
    ];
    let vertices = corners
        .iter()
        .map(|&c| {
            let position = Point3f::from(c);
            Vertex::new(position, position.coords.normalize())
        })
        .collect();
    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1, 0, 3, 2, // -z
        4, 5, 6, 4, 6, 7, // +z
        0, 4, 7, 0, 7, 3, // -x
        1, 2, 6, 1, 6, 5, // +x
        0, 1, 5, 0, 5, 4, // -y
        3, 7, 6, 3, 6, 2, // +y
    ];
    build("Cube", vertices, indices)
}

/// Latitude/longitude sphere with texture coordinates
pub fn uv_sphere(radius: f32, stacks: u32, slices: u32) -> Asset {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
    for i in 0..=stacks {
        let phi = PI * i as f32 / stacks as f32;
        for j in 0..=slices {
            let theta = 2.0 * PI * j as f32 / slices as f32;
            let normal = Vector3f::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            let position = Point3f::from(normal * radius);
            vertices.push(
                Vertex::new(position, normal)
                    .with_uv([j as f32 / slices as f32, i as f32 / stacks as f32]),
            );
        }
    }

    let row = slices + 1;
    let mut indices = Vec::new();
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = a + row;
            // the first and last rings collapse to a pole
            if i != 0 {
                indices.extend_from_slice(&[a, a + 1, b]);
            }
            if i != stacks - 1 {
                indices.extend_from_slice(&[a + 1, b + 1, b]);
            }
        }
    }
    build("Sphere", vertices, indices)
}

fn build(name: &str, vertices: Vec<Vertex>, indices: Vec<u32>) -> Asset {
    match Asset::new(name, vertices, indices) {
        Ok(asset) => asset,
        Err(e) => unreachable!("procedural sample {} is invalid: {}", name, e),
    }
}
