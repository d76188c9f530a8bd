//! Mesh asset data structures

use crate::error::{Error, Result};
use crate::math::{Point3f, Vector3f};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A mesh vertex with position, normal and optional texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3f,
    pub normal: Vector3f,
    pub uv: Option<[f32; 2]>,
}

impl Vertex {
    pub fn new(position: Point3f, normal: Vector3f) -> Self {
        Self { position, normal, uv: None }
    }

    pub fn with_uv(mut self, uv: [f32; 2]) -> Self {
        self.uv = Some(uv);
        self
    }
}

/// Interleaved vertex layout for handing an asset to a GPU renderer
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PackedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// A parsed mesh: an ordered vertex list plus triangle indices.
///
/// Every index is smaller than the vertex count and the index count is a
/// multiple of three. Both are checked at construction, so an `Asset` can
/// never exist in a partially valid state. An asset with no triangles is a
/// point cloud.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Asset {
    /// Create an asset, validating indices and positions
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if vertices.len() > u32::MAX as usize {
            return Err(Error::InvalidData(format!("too many vertices: {}", vertices.len())));
        }
        let count = vertices.len() as u32;
        if let Some(bad) = indices.iter().find(|&&i| i >= count) {
            return Err(Error::InvalidData(format!(
                "index {} out of range for {} vertices",
                bad, count
            )));
        }
        if let Some(pos) = vertices.iter().position(|v| !v.position.iter().all(|c| c.is_finite())) {
            return Err(Error::InvalidData(format!("vertex {} has a non-finite position", pos)));
        }
        Ok(Self {
            name: name.into(),
            vertices,
            indices,
        })
    }

    /// Create an asset from bare positions, computing smooth vertex normals
    pub fn from_positions(name: impl Into<String>, positions: Vec<Point3f>, indices: Vec<u32>) -> Result<Self> {
        let vertices = positions
            .into_iter()
            .map(|p| Vertex::new(p, Vector3f::z()))
            .collect();
        let mut asset = Self::new(name, vertices, indices)?;
        asset.recompute_normals();
        Ok(asset)
    }

    /// Name of the asset, usually the file stem or sample name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangle indices (three per triangle)
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when the asset has vertices but no triangles
    pub fn is_point_cloud(&self) -> bool {
        !self.vertices.is_empty() && self.indices.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// True when every vertex carries a texture coordinate
    pub fn has_uvs(&self) -> bool {
        !self.vertices.is_empty() && self.vertices.iter().all(|v| v.uv.is_some())
    }

    /// Iterate triangles as index triplets
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Calculate face normals, one per triangle; degenerate faces get +Z
    pub fn face_normals(&self) -> Vec<Vector3f> {
        self.triangles()
            .map(|[a, b, c]| {
                let v0 = self.vertices[a as usize].position;
                let v1 = self.vertices[b as usize].position;
                let v2 = self.vertices[c as usize].position;
                (v1 - v0)
                    .cross(&(v2 - v0))
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vector3f::z)
            })
            .collect()
    }

    /// Replace vertex normals with area-weighted averages of adjacent faces
    pub fn recompute_normals(&mut self) {
        let mut accum = vec![Vector3f::zeros(); self.vertices.len()];
        for t in self.indices.chunks_exact(3) {
            let [a, b, c] = [t[0] as usize, t[1] as usize, t[2] as usize];
            let v0 = self.vertices[a].position;
            let v1 = self.vertices[b].position;
            let v2 = self.vertices[c].position;
            // cross product length is twice the area, which is the weight we want
            let n = (v1 - v0).cross(&(v2 - v0));
            accum[a] += n;
            accum[b] += n;
            accum[c] += n;
        }
        for (vertex, n) in self.vertices.iter_mut().zip(accum) {
            vertex.normal = n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::z);
        }
    }

    /// Interleave vertices for upload; missing UVs become `[0, 0]`
    pub fn packed_vertices(&self) -> Vec<PackedVertex> {
        self.vertices
            .iter()
            .map(|v| PackedVertex {
                position: [v.position.x, v.position.y, v.position.z],
                normal: [v.normal.x, v.normal.y, v.normal.z],
                uv: v.uv.unwrap_or([0.0, 0.0]),
            })
            .collect()
    }
}
