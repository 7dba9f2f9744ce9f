//! Material colors loaded from MTL files.

use std::collections::HashMap;

/// Named Phong material: RGBA ambient/diffuse/specular plus shininess.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
}

impl Material {
    pub fn new(
        name: &str,
        ambient: [f32; 4],
        diffuse: [f32; 4],
        specular: [f32; 4],
        shininess: f32,
    ) -> Self {
        Self {
            name: name.to_string(),
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    /// Same material with the diffuse color replaced, e.g. for signal tinting.
    pub fn with_diffuse(&self, diffuse: [f32; 4]) -> Self {
        Self {
            diffuse,
            ..self.clone()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(
            "default",
            [0.5, 0.5, 0.5, 1.0],
            [0.5, 0.5, 0.5, 1.0],
            [0.5, 0.5, 0.5, 1.0],
            100.0,
        )
    }
}

/// All materials known to the session, keyed by their `newmtl` name.
///
/// Filled once at startup and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct MaterialLibrary {
    materials: HashMap<String, Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later insertions shadow earlier ones with the same name.
    pub fn insert(&mut self, material: Material) {
        if let Some(old) = self.materials.insert(material.name.clone(), material) {
            log::warn!("Material {} was declared twice, keeping the latest.", old.name);
        }
    }

    pub fn extend(&mut self, other: MaterialLibrary) {
        other
            .materials
            .into_values()
            .for_each(|material| self.insert(material));
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// First name in `candidates` that this library knows, in order.
    pub fn resolve<'a, I>(&self, candidates: I) -> Option<&Material>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        candidates
            .into_iter()
            .flatten()
            .find_map(|name| self.materials.get(name))
    }
}

impl FromIterator<Material> for MaterialLibrary {
    fn from_iter<T: IntoIterator<Item = Material>>(iter: T) -> Self {
        let mut library = MaterialLibrary::new();
        iter.into_iter().for_each(|material| library.insert(material));
        library
    }
}
