//! Per-entity transformation data for GPU rendering.
//!
//! Position, Euler rotation and scale are turned into a world matrix every
//! frame and packed with the entity's material colors into an
//! [`EntityUniform`]. One uniform slot backs one draw call.

use cgmath::{Matrix, Rad, SquareMatrix};

use crate::data_structures::material::Material;

/// Position, rotation (Euler angles in radians) and scale of one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Vector3<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Vector3::new(0.0, 0.0, 0.0),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// translate * rotateX * rotateY * rotateZ * scale
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from_angle_x(Rad(self.rotation.x))
            * cgmath::Matrix4::from_angle_y(Rad(self.rotation.y))
            * cgmath::Matrix4::from_angle_z(Rad(self.rotation.z))
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// The world matrix composed against the camera's view-projection.
    ///
    /// Never cached: callers recompute it from the current fields each frame.
    pub fn derived_matrix(&self, view_projection: &cgmath::Matrix4<f32>) -> cgmath::Matrix4<f32> {
        view_projection * self.to_matrix()
    }

    pub fn to_raw(
        &self,
        view_projection: &cgmath::Matrix4<f32>,
        material: &Material,
    ) -> EntityUniform {
        let world = self.to_matrix();
        // A degenerate scale has no inverse; fall back to the plain world matrix.
        let world_inverse_transpose = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(world);
        EntityUniform {
            world_view_projection: (view_projection * world).into(),
            world: world.into(),
            world_inverse_transpose: world_inverse_transpose.into(),
            ambient: material.ambient,
            diffuse: material.diffuse,
            specular: material.specular,
            shininess: material.shininess,
            _padding: [0.0; 3],
        }
    }
}

impl From<cgmath::Vector3<f32>> for Transform {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw uniform is the actual data stored on the GPU for one draw call.
 *
 * Its size is exactly 256 bytes so consecutive slots line up with the usual
 * `min_uniform_buffer_offset_alignment` for dynamic offsets.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EntityUniform {
    pub world_view_projection: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
    pub world_inverse_transpose: [[f32; 4]; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
    // WGSL rounds the struct up to a multiple of 16 bytes
    _padding: [f32; 3],
}

impl EntityUniform {
    pub const SIZE: wgpu::BufferAddress = std::mem::size_of::<EntityUniform>() as wgpu::BufferAddress;
}
