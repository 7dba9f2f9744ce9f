//! MTL text to a [`MaterialLibrary`], on top of `tobj`'s MTL reader.

use std::io::{BufReader, Cursor};

use crate::{
    data_structures::material::{Material, MaterialLibrary},
    error::{Error, Result},
    resources::obj::looks_like_markup,
};

fn rgba(rgb: Option<[f32; 3]>, alpha: f32, default: [f32; 4]) -> [f32; 4] {
    rgb.map_or(default, |[r, g, b]| [r, g, b, alpha])
}

fn to_material(material: tobj::Material) -> Material {
    let defaults = Material::default();
    let alpha = material.dissolve.unwrap_or(1.0);
    Material {
        ambient: rgba(material.ambient, alpha, defaults.ambient),
        diffuse: rgba(material.diffuse, alpha, defaults.diffuse),
        specular: rgba(material.specular, alpha, defaults.specular),
        shininess: material.shininess.unwrap_or(defaults.shininess),
        name: material.name,
    }
}

pub fn parse_mtl(text: &str, name: &str) -> Result<MaterialLibrary> {
    if looks_like_markup(text) {
        return Err(Error::parse(name, "received markup instead of MTL text"));
    }
    let mut reader = BufReader::new(Cursor::new(text.as_bytes()));
    let (materials, _) =
        tobj::load_mtl_buf(&mut reader).map_err(|e| Error::parse(name, e.to_string()))?;
    if materials.is_empty() {
        return Err(Error::parse(name, "no materials declared"));
    }
    Ok(materials.into_iter().map(to_material).collect())
}
