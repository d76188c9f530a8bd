//! PLY format support

use crate::registry::{AssetDecoder, AssetEncoder};
use crate::AssetFormat;
use orbitview_core::{Asset, Error, Point3f, Result, Vector3f, Vertex};
use ply_rs::{
    parser::Parser,
    ply::{Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};

/// Stanford PLY reader (ASCII and binary) and ASCII writer
pub struct PlyCodec;

/// True if the buffer starts with the PLY magic line
pub fn looks_like_ply(bytes: &[u8]) -> bool {
    bytes.starts_with(b"ply\n") || bytes.starts_with(b"ply\r\n")
}

const UV_NAMES: [(&str, &str); 3] = [("s", "t"), ("u", "v"), ("texture_u", "texture_v")];

impl AssetDecoder for PlyCodec {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<Asset> {
        let mut reader = bytes;
        let parser = Parser::<DefaultElement>::new();
        let ply = parser
            .read_ply(&mut reader)
            .map_err(|e| Error::parse(format!("PLY: {}", e)))?;

        let empty = Vec::new();
        let vertex_elements = ply.payload.get("vertex").unwrap_or(&empty);
        let with_normals = vertex_elements
            .first()
            .is_some_and(|v| ["nx", "ny", "nz"].iter().all(|k| v.contains_key(*k)));
        let uv_names = vertex_elements
            .first()
            .and_then(|v| UV_NAMES.into_iter().find(|(s, t)| v.contains_key(*s) && v.contains_key(*t)));

        let mut vertices = Vec::with_capacity(vertex_elements.len());
        for (i, element) in vertex_elements.iter().enumerate() {
            let position = Point3f::new(
                scalar(element, "x", i)?,
                scalar(element, "y", i)?,
                scalar(element, "z", i)?,
            );
            let normal = if with_normals {
                Vector3f::new(scalar(element, "nx", i)?, scalar(element, "ny", i)?, scalar(element, "nz", i)?)
            } else {
                Vector3f::z()
            };
            let uv = match uv_names {
                Some((s, t)) => Some([scalar(element, s, i)?, scalar(element, t, i)?]),
                None => None,
            };
            vertices.push(Vertex { position, normal, uv });
        }

        let mut indices = Vec::new();
        if let Some(faces) = ply.payload.get("face") {
            for (i, face) in faces.iter().enumerate() {
                let corners = face_indices(face, i)?;
                if corners.len() < 3 {
                    return Err(Error::parse(format!("PLY face {} has only {} vertices", i, corners.len())));
                }
                for k in 1..corners.len() - 1 {
                    indices.extend_from_slice(&[corners[0], corners[k], corners[k + 1]]);
                }
            }
        }

        let mut asset = Asset::new(name, vertices, indices).map_err(|e| e.invalid_as_parse("PLY"))?;
        if !with_normals {
            asset.recompute_normals();
        }
        Ok(asset)
    }

    fn format(&self) -> AssetFormat {
        AssetFormat::Ply
    }
}

impl AssetEncoder for PlyCodec {
    fn encode(&self, asset: &Asset) -> Result<Vec<u8>> {
        let mut ply = Ply::<DefaultElement>::new();
        ply.header.encoding = Encoding::Ascii;
        ply.header.comments.push(format!("orbitview asset {}", asset.name()));

        let with_uvs = asset.has_uvs();
        let mut names = vec!["x", "y", "z", "nx", "ny", "nz"];
        if with_uvs {
            names.extend(["s", "t"]);
        }

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = asset.vertex_count();
        for name in &names {
            vertex_element
                .properties
                .add(PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::Float)));
        }
        ply.header.elements.add(vertex_element);

        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = asset.triangle_count();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::UInt),
        ));
        ply.header.elements.add(face_element);

        let vertices = asset
            .vertices()
            .iter()
            .map(|v| {
                let mut values = vec![
                    v.position.x,
                    v.position.y,
                    v.position.z,
                    v.normal.x,
                    v.normal.y,
                    v.normal.z,
                ];
                if with_uvs {
                    values.extend(v.uv.unwrap_or([0.0, 0.0]));
                }
                let mut element = DefaultElement::new();
                for (name, value) in names.iter().zip(values) {
                    element.insert(name.to_string(), Property::Float(value));
                }
                element
            })
            .collect();
        ply.payload.insert("vertex".to_string(), vertices);

        let faces = asset
            .triangles()
            .map(|tri| {
                let mut element = DefaultElement::new();
                element.insert("vertex_indices".to_string(), Property::ListUInt(tri.to_vec()));
                element
            })
            .collect();
        ply.payload.insert("face".to_string(), faces);

        let mut out = Vec::new();
        Writer::new().write_ply(&mut out, &mut ply)?;
        Ok(out)
    }

    fn format(&self) -> AssetFormat {
        AssetFormat::Ply
    }
}

/// Extract a scalar property as f32
fn scalar(element: &DefaultElement, name: &str, index: usize) -> Result<f32> {
    let value = match element.get(name) {
        Some(Property::Float(v)) => *v,
        Some(Property::Double(v)) => *v as f32,
        Some(Property::Char(v)) => *v as f32,
        Some(Property::UChar(v)) => *v as f32,
        Some(Property::Short(v)) => *v as f32,
        Some(Property::UShort(v)) => *v as f32,
        Some(Property::Int(v)) => *v as f32,
        Some(Property::UInt(v)) => *v as f32,
        _ => {
            return Err(Error::parse(format!(
                "PLY vertex {}: property '{}' missing or not a scalar",
                index, name
            )))
        }
    };
    Ok(value)
}

/// Extract face indices, accepting any integer list type
fn face_indices(element: &DefaultElement, index: usize) -> Result<Vec<u32>> {
    fn convert<T: Copy + TryInto<u32>>(values: &[T], index: usize) -> Result<Vec<u32>> {
        values
            .iter()
            .map(|&v| {
                v.try_into()
                    .map_err(|_| Error::parse(format!("PLY face {} has a negative index", index)))
            })
            .collect()
    }

    match element.get("vertex_indices").or_else(|| element.get("vertex_index")) {
        Some(Property::ListChar(v)) => convert(v, index),
        Some(Property::ListUChar(v)) => convert(v, index),
        Some(Property::ListShort(v)) => convert(v, index),
        Some(Property::ListUShort(v)) => convert(v, index),
        Some(Property::ListInt(v)) => convert(v, index),
        Some(Property::ListUInt(v)) => Ok(v.clone()),
        _ => Err(Error::parse(format!("PLY face {}: vertex indices not found", index))),
    }
}
