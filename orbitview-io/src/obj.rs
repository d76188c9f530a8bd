//! OBJ format support

use crate::registry::{AssetDecoder, AssetEncoder};
use crate::AssetFormat;
use orbitview_core::{Asset, Error, Point3f, Result, Vector3f, Vertex};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Wavefront OBJ reader and writer
pub struct ObjCodec;

const KEYWORDS: [&str; 11] = ["v", "vn", "vt", "f", "o", "g", "s", "usemtl", "mtllib", "l", "p"];

/// True if the first meaningful line starts with an OBJ keyword
pub fn looks_like_obj(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(4096)]);
    head.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .and_then(|line| line.split_whitespace().next())
        .is_some_and(|keyword| KEYWORDS.contains(&keyword))
}

/// One corner of a face: position, texcoord and normal indices (0-based)
type Corner = (usize, Option<usize>, Option<usize>);

#[derive(Default)]
struct ObjData {
    positions: Vec<Point3f>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<Vector3f>,
    faces: Vec<Vec<Corner>>,
}

impl AssetDecoder for ObjCodec {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<Asset> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::parse(format!("OBJ is not valid UTF-8: {}", e)))?;
        let data = parse_obj(text)?;
        build_asset(name, data).map_err(|e| e.invalid_as_parse("OBJ"))
    }

    fn format(&self) -> AssetFormat {
        AssetFormat::Obj
    }
}

impl AssetEncoder for ObjCodec {
    fn encode(&self, asset: &Asset) -> Result<Vec<u8>> {
        let mut out = String::new();
        let with_uvs = asset.has_uvs();
        let _ = writeln!(out, "# {}", asset.name());
        for v in asset.vertices() {
            let _ = writeln!(out, "v {} {} {}", v.position.x, v.position.y, v.position.z);
        }
        if with_uvs {
            for v in asset.vertices() {
                let [s, t] = v.uv.unwrap_or([0.0, 0.0]);
                let _ = writeln!(out, "vt {} {}", s, t);
            }
        }
        for v in asset.vertices() {
            let _ = writeln!(out, "vn {} {} {}", v.normal.x, v.normal.y, v.normal.z);
        }
        for [a, b, c] in asset.triangles() {
            let (a, b, c) = (a + 1, b + 1, c + 1);
            if with_uvs {
                let _ = writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}");
            } else {
                let _ = writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}");
            }
        }
        Ok(out.into_bytes())
    }

    fn format(&self) -> AssetFormat {
        AssetFormat::Obj
    }
}

fn parse_obj(text: &str) -> Result<ObjData> {
    let mut data = ObjData::default();
    for (line_no, raw) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&mut tokens, line_no, "v")?;
                data.positions.push(Point3f::new(x, y, z));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(&mut tokens, line_no, "vn")?;
                data.normals.push(Vector3f::new(x, y, z));
            }
            "vt" => {
                let u = parse_float(tokens.next(), line_no, "vt")?;
                let v = match tokens.next() {
                    Some(tok) => parse_float(Some(tok), line_no, "vt")?,
                    None => 0.0,
                };
                data.texcoords.push([u, v]);
            }
            "f" => {
                let corners = tokens
                    .map(|tok| parse_corner(tok, &data, line_no))
                    .collect::<Result<Vec<_>>>()?;
                if corners.len() < 3 {
                    return Err(Error::parse(format!(
                        "line {}: face needs at least 3 vertices, got {}",
                        line_no,
                        corners.len()
                    )));
                }
                data.faces.push(corners);
            }
            // grouping, smoothing and material statements carry nothing we render
            _ => {}
        }
    }
    Ok(data)
}

fn parse_float(token: Option<&str>, line_no: usize, keyword: &str) -> Result<f32> {
    let token = token.ok_or_else(|| Error::parse(format!("line {}: '{}' is missing a coordinate", line_no, keyword)))?;
    token
        .parse::<f32>()
        .map_err(|_| Error::parse(format!("line {}: invalid number '{}'", line_no, token)))
}

fn parse_floats<'a, const N: usize>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
    keyword: &str,
) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for slot in out.iter_mut() {
        *slot = parse_float(tokens.next(), line_no, keyword)?;
    }
    Ok(out)
}

/// Resolve a 1-based (or negative, relative) OBJ index against `len` elements
fn resolve_index(token: &str, len: usize, line_no: usize) -> Result<usize> {
    let raw: i64 = token
        .parse()
        .map_err(|_| Error::parse(format!("line {}: invalid index '{}'", line_no, token)))?;
    let resolved = match raw {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => (len as i64 + i).try_into().ok(),
    };
    match resolved {
        Some(index) if index < len => Ok(index),
        _ => Err(Error::parse(format!(
            "line {}: index {} out of range ({} elements defined)",
            line_no, raw, len
        ))),
    }
}

fn parse_corner(token: &str, data: &ObjData, line_no: usize) -> Result<Corner> {
    let mut parts = token.split('/');
    let position = resolve_index(parts.next().unwrap_or(""), data.positions.len(), line_no)?;
    let texcoord = match parts.next() {
        Some(t) if !t.is_empty() => Some(resolve_index(t, data.texcoords.len(), line_no)?),
        _ => None,
    };
    let normal = match parts.next() {
        Some(n) if !n.is_empty() => Some(resolve_index(n, data.normals.len(), line_no)?),
        _ => None,
    };
    Ok((position, texcoord, normal))
}

fn build_asset(name: &str, data: ObjData) -> Result<Asset> {
    if data.faces.is_empty() {
        // point cloud: attributes pair up by position when counts agree
        let normals_match = data.normals.len() == data.positions.len();
        let uvs_match = data.texcoords.len() == data.positions.len();
        let vertices = data
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| Vertex {
                position: *p,
                normal: if normals_match { data.normals[i] } else { Vector3f::z() },
                uv: uvs_match.then(|| data.texcoords[i]),
            })
            .collect();
        return Asset::new(name, vertices, Vec::new());
    }

    if let Some(asset) = build_aligned(name, &data) {
        return asset;
    }

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut lookup: HashMap<Corner, u32> = HashMap::new();
    let mut missing_normals = false;

    for face in &data.faces {
        let mut face_indices = Vec::with_capacity(face.len());
        for corner in face {
            let index = *lookup.entry(*corner).or_insert_with(|| {
                let (p, t, n) = *corner;
                missing_normals |= n.is_none();
                vertices.push(Vertex {
                    position: data.positions[p],
                    normal: n.map(|n| data.normals[n]).unwrap_or_else(Vector3f::z),
                    uv: t.map(|t| data.texcoords[t]),
                });
                (vertices.len() - 1) as u32
            });
            face_indices.push(index);
        }
        // fan triangulation
        for i in 1..face_indices.len() - 1 {
            indices.extend_from_slice(&[face_indices[0], face_indices[i], face_indices[i + 1]]);
        }
    }

    let mut asset = Asset::new(name, vertices, indices)?;
    if missing_normals {
        asset.recompute_normals();
    }
    Ok(asset)
}

/// Fast path for files where every corner uses the same index for position,
/// texcoord and normal (what most exporters, and our writer, produce). Keeps
/// the file's vertex order, including unreferenced vertices.
fn build_aligned(name: &str, data: &ObjData) -> Option<Result<Asset>> {
    let count = data.positions.len();
    let normals_aligned = data.normals.len() == count;
    let uvs_aligned = data.texcoords.len() == count || data.texcoords.is_empty();
    if !normals_aligned || !uvs_aligned {
        return None;
    }
    let corners_aligned = data
        .faces
        .iter()
        .flatten()
        .all(|&(p, t, n)| n == Some(p) && t.map_or(data.texcoords.is_empty(), |t| t == p));
    if !corners_aligned {
        return None;
    }

    let vertices = (0..count)
        .map(|i| Vertex {
            position: data.positions[i],
            normal: data.normals[i],
            uv: data.texcoords.get(i).copied(),
        })
        .collect();
    let mut indices = Vec::new();
    for face in &data.faces {
        for k in 1..face.len() - 1 {
            indices.extend_from_slice(&[face[0].0 as u32, face[k].0 as u32, face[k + 1].0 as u32]);
        }
    }
    Some(Asset::new(name, vertices, indices))
}
