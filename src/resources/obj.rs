//! Wavefront OBJ text to [`MeshData`].
//!
//! Only the geometry subset the city assets use is read: `v`, `vt`, `vn`,
//! `f`, `mtllib` and `usemtl`. Faces keep only their vertex index; polygons
//! with more than three corners are split into a triangle fan.

use crate::{
    data_structures::mesh::MeshData,
    error::{Error, Result},
};

/// An HTML error page served in place of an asset.
pub(crate) fn looks_like_markup(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with('<'))
}

fn parse_floats<'a>(
    tokens: impl Iterator<Item = &'a str>,
    name: &str,
    line_no: usize,
) -> Result<Vec<f32>> {
    tokens
        .map(|token| {
            token.parse::<f32>().map_err(|_| {
                Error::parse(name, format!("line {line_no}: `{token}` is not a number"))
            })
        })
        .collect()
}

/// Resolves a 1-based or negative (relative) OBJ index against `count` vertices read so far.
fn resolve_index(token: &str, count: usize, name: &str, line_no: usize) -> Result<u32> {
    let raw = token.split('/').next().unwrap_or_default();
    let index: i64 = raw
        .parse()
        .map_err(|_| Error::parse(name, format!("line {line_no}: bad face index `{token}`")))?;
    let resolved = match index {
        0 => {
            return Err(Error::parse(
                name,
                format!("line {line_no}: face index 0 is not valid"),
            ));
        }
        i if i > 0 => i - 1,
        i => count as i64 + i,
    };
    u32::try_from(resolved).map_err(|_| {
        Error::parse(
            name,
            format!("line {line_no}: face index {index} is out of range"),
        )
    })
}

pub fn parse_obj(text: &str, name: &str) -> Result<MeshData> {
    if looks_like_markup(text) {
        return Err(Error::parse(name, "received markup instead of OBJ text"));
    }

    let mut mesh = MeshData {
        name: name.to_string(),
        ..Default::default()
    };

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        match keyword {
            "v" => {
                let values = parse_floats(tokens, name, line_no)?;
                if values.len() < 3 {
                    return Err(Error::parse(
                        name,
                        format!("line {line_no}: vertex needs three coordinates"),
                    ));
                }
                // A fourth (w) component is allowed and dropped
                mesh.positions.extend_from_slice(&values[..3]);
            }
            "vn" => {
                let values = parse_floats(tokens, name, line_no)?;
                if values.len() < 3 {
                    return Err(Error::parse(
                        name,
                        format!("line {line_no}: normal needs three components"),
                    ));
                }
                mesh.normals.extend_from_slice(&values[..3]);
            }
            "vt" => {
                let values = parse_floats(tokens, name, line_no)?;
                let Some(&u) = values.first() else {
                    return Err(Error::parse(
                        name,
                        format!("line {line_no}: texture coordinate without values"),
                    ));
                };
                mesh.tex_coords.push(u);
                mesh.tex_coords.push(values.get(1).copied().unwrap_or(0.0));
            }
            "f" => {
                let count = mesh.vertex_count();
                let corners = tokens
                    .map(|token| resolve_index(token, count, name, line_no))
                    .collect::<Result<Vec<u32>>>()?;
                if corners.len() < 3 {
                    log::warn!(
                        "{name} line {line_no}: skipping face with {} vertices",
                        corners.len()
                    );
                    continue;
                }
                for i in 1..corners.len() - 1 {
                    mesh.indices
                        .extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
                }
            }
            "mtllib" => {
                if mesh.material_library.is_none() {
                    mesh.material_library = tokens.next().map(str::to_string);
                }
            }
            "usemtl" => {
                if mesh.material.is_none() {
                    mesh.material = tokens.next().map(str::to_string);
                }
            }
            // o, g, s, l and the rest carry nothing we draw
            _ => {}
        }
    }

    if mesh.positions.is_empty() {
        return Err(Error::parse(name, "no vertex positions"));
    }
    if mesh.indices.is_empty() {
        return Err(Error::parse(name, "no faces"));
    }
    let vertex_count = mesh.vertex_count();
    if let Some(bad) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(Error::parse(
            name,
            format!("face index {} exceeds the {vertex_count} vertices", bad + 1),
        ));
    }

    mesh.center();
    log::debug!(
        "Parsed {name}: {} vertices, {} triangles",
        vertex_count,
        mesh.triangle_count()
    );
    Ok(mesh)
}
