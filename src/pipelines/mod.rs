//! Render pipelines: the shared Phong program and the light uniform it reads.

pub mod light;
pub mod phong;
