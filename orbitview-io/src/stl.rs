//! STL format support
//!
//! STL stores an unindexed triangle soup, so every facet contributes three
//! vertices carrying the facet normal.

use crate::registry::{AssetDecoder, AssetEncoder};
use crate::AssetFormat;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use orbitview_core::{Asset, Error, Point3f, Result, Vector3f, Vertex};
use std::io::Cursor;

/// STL reader (ASCII and binary) and binary writer
pub struct StlCodec;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// True if the size matches the triangle count in a binary STL header
pub fn looks_like_binary_stl(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    count
        .checked_mul(FACET_LEN)
        .and_then(|body| body.checked_add(HEADER_LEN + 4))
        .is_some_and(|expected| expected == bytes.len())
}

/// True for text starting with `solid` that also contains a facet
pub fn looks_like_ascii_stl(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
    let trimmed = head.trim_start();
    trimmed.starts_with("solid") && (trimmed.contains("facet") || trimmed.contains("endsolid"))
}

impl AssetDecoder for StlCodec {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<Asset> {
        let triangles = if looks_like_binary_stl(bytes) {
            read_binary(bytes)?
        } else if looks_like_ascii_stl(bytes) {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| Error::parse(format!("ASCII STL is not valid UTF-8: {}", e)))?;
            read_ascii(text)?
        } else {
            return Err(Error::parse("STL: neither a valid binary body nor an ASCII 'solid'"));
        };
        build_asset(name, triangles).map_err(|e| e.invalid_as_parse("STL"))
    }

    fn format(&self) -> AssetFormat {
        AssetFormat::Stl
    }
}

impl AssetEncoder for StlCodec {
    fn encode(&self, asset: &Asset) -> Result<Vec<u8>> {
        let count = u32::try_from(asset.triangle_count())
            .map_err(|_| Error::InvalidData("too many triangles for STL".to_string()))?;
        let mut out = Vec::with_capacity(HEADER_LEN + 4 + FACET_LEN * count as usize);
        let mut header = format!("orbitview {}", asset.name()).into_bytes();
        // a header starting with "solid" confuses ASCII detection in other tools
        header.resize(HEADER_LEN, b' ');
        out.extend_from_slice(&header);
        out.write_u32::<LittleEndian>(count)?;

        let normals = asset.face_normals();
        for (tri, normal) in asset.triangles().zip(normals) {
            for c in normal.iter() {
                out.write_f32::<LittleEndian>(*c)?;
            }
            for index in tri {
                let p = asset.vertices()[index as usize].position;
                for c in p.iter() {
                    out.write_f32::<LittleEndian>(*c)?;
                }
            }
            out.write_u16::<LittleEndian>(0)?;
        }
        Ok(out)
    }

    fn format(&self) -> AssetFormat {
        AssetFormat::Stl
    }
}

struct Facet {
    normal: Vector3f,
    corners: [Point3f; 3],
}

fn read_binary(bytes: &[u8]) -> Result<Vec<Facet>> {
    let mut cursor = Cursor::new(&bytes[HEADER_LEN..]);
    let count = cursor.read_u32::<LittleEndian>()? as usize;
    let mut facets = Vec::with_capacity(count);
    fn read_vec(cursor: &mut Cursor<&[u8]>) -> std::io::Result<[f32; 3]> {
        Ok([
            cursor.read_f32::<LittleEndian>()?,
            cursor.read_f32::<LittleEndian>()?,
            cursor.read_f32::<LittleEndian>()?,
        ])
    }
    for _ in 0..count {
        let n = read_vec(&mut cursor)?;
        let a = read_vec(&mut cursor)?;
        let b = read_vec(&mut cursor)?;
        let c = read_vec(&mut cursor)?;
        let _attributes = cursor.read_u16::<LittleEndian>()?;
        facets.push(Facet {
            normal: Vector3f::from(n),
            corners: [Point3f::from(a), Point3f::from(b), Point3f::from(c)],
        });
    }
    Ok(facets)
}

fn read_ascii(text: &str) -> Result<Vec<Facet>> {
    let mut facets = Vec::new();
    let mut normal = Vector3f::zeros();
    let mut corners: Vec<Point3f> = Vec::with_capacity(3);
    let mut in_facet = false;

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("facet") => {
                if in_facet {
                    return Err(Error::parse(format!("line {}: nested facet", line_no)));
                }
                in_facet = true;
                corners.clear();
                normal = match tokens.next() {
                    Some("normal") => Vector3f::from(floats(&mut tokens, line_no)?),
                    _ => Vector3f::zeros(),
                };
            }
            Some("vertex") => {
                if !in_facet {
                    return Err(Error::parse(format!("line {}: vertex outside of a facet", line_no)));
                }
                corners.push(Point3f::from(floats(&mut tokens, line_no)?));
            }
            Some("endfacet") => {
                if corners.len() != 3 {
                    return Err(Error::parse(format!(
                        "line {}: facet has {} vertices, expected 3",
                        line_no,
                        corners.len()
                    )));
                }
                facets.push(Facet {
                    normal,
                    corners: [corners[0], corners[1], corners[2]],
                });
                in_facet = false;
            }
            _ => {}
        }
    }
    if in_facet {
        return Err(Error::parse("ASCII STL ends inside a facet"));
    }
    Ok(facets)
}

fn floats<'a>(tokens: &mut impl Iterator<Item = &'a str>, line_no: usize) -> Result<[f32; 3]> {
    let mut out = [0.0f32; 3];
    for slot in out.iter_mut() {
        let token = tokens
            .next()
            .ok_or_else(|| Error::parse(format!("line {}: expected 3 numbers", line_no)))?;
        *slot = token
            .parse()
            .map_err(|_| Error::parse(format!("line {}: invalid number '{}'", line_no, token)))?;
    }
    Ok(out)
}

fn build_asset(name: &str, facets: Vec<Facet>) -> Result<Asset> {
    let mut vertices = Vec::with_capacity(facets.len() * 3);
    for facet in &facets {
        let [a, b, c] = facet.corners;
        // exporters often leave the stored normal zeroed
        let normal = facet
            .normal
            .try_normalize(f32::EPSILON)
            .or_else(|| (b - a).cross(&(c - a)).try_normalize(f32::EPSILON))
            .unwrap_or_else(Vector3f::z);
        vertices.extend(facet.corners.iter().map(|p| Vertex::new(*p, normal)));
    }
    let indices = (0..vertices.len() as u32).collect();
    Asset::new(name, vertices, indices)
}
