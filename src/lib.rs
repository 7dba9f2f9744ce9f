//! city-viz
//!
//! A cross-platform 3D client for an agent-based city simulation. The city
//! topology and the car positions are polled from the simulation server over
//! HTTP and drawn with one Phong pipeline, natively or in the browser.
//!
//! High-level modules
//! - `camera`: look-at camera, projection, keyboard controller and uniforms
//! - `config`: runtime configuration read from `config.json`
//! - `context`: GPU device, surface and the shared per-session uniforms
//! - `data_structures`: entities, transforms, meshes, materials and the scene state
//! - `error`: the error kinds of loading, syncing and pipeline setup
//! - `flow`: the event loop tying rendering and server sync together
//! - `pipelines`: the Phong render pipeline and the light uniform
//! - `render`: per-frame draw of every category
//! - `resources`: OBJ/MTL loading from the asset root
//! - `sync`: HTTP client and wire types of the simulation server
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod sync;

pub use error::{Error, Result};
