//! Scene data: entities, transforms, meshes and materials.
//!
//! - `entity` holds the categories, ids and per-category extras of simulation objects
//! - `instance` turns a transform into the per-draw uniform
//! - `material` and `mesh` hold parsed assets and their GPU buffers
//! - `scene` owns the entity lists of a session
//! - `texture` is the depth buffer

pub mod entity;
pub mod instance;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod texture;
