//! Mesh geometry: the parsed CPU-side record and its GPU buffers.

use wgpu::util::DeviceExt;

/// Implemented by everything that is uploaded as a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Geometry of one visual asset as parsed from an OBJ file.
///
/// `positions` and `normals` have stride 3, `tex_coords` stride 2 and
/// `indices` stride 3 (one triangle each). Every index is a valid offset
/// into `positions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub indices: Vec<u32>,
    /// `mtllib` referenced by the file, if any.
    pub material_library: Option<String>,
    /// First `usemtl` of the file, used as the mesh's default material.
    pub material: Option<String>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn centroid(&self) -> [f32; 3] {
        let count = self.vertex_count();
        if count == 0 {
            return [0.0; 3];
        }
        let mut sum = [0.0f64; 3];
        for vertex in self.positions.chunks_exact(3) {
            sum[0] += vertex[0] as f64;
            sum[1] += vertex[1] as f64;
            sum[2] += vertex[2] as f64;
        }
        let count = count as f64;
        [
            (sum[0] / count) as f32,
            (sum[1] / count) as f32,
            (sum[2] / count) as f32,
        ]
    }

    /// Moves the mesh so its origin is the centroid of its positions.
    pub fn center(&mut self) {
        let centroid = self.centroid();
        for vertex in self.positions.chunks_exact_mut(3) {
            vertex[0] -= centroid[0];
            vertex[1] -= centroid[1];
            vertex[2] -= centroid[2];
        }
    }

    /**
     * Normals per position.
     *
     * Only vertex indices are read from faces, so file normals are usable only
     * when there is exactly one per position. Otherwise they are rebuilt from
     * the triangles, weighted by triangle area.
     */
    pub fn vertex_normals(&self) -> Vec<[f32; 3]> {
        let count = self.vertex_count();
        if self.normals.len() == self.positions.len() {
            return self
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect();
        }
        let position = |i: u32| -> cgmath::Vector3<f32> {
            let i = i as usize * 3;
            cgmath::Vector3::new(
                self.positions[i],
                self.positions[i + 1],
                self.positions[i + 2],
            )
        };
        let mut normals = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); count];
        for triangle in self.indices.chunks_exact(3) {
            let (p0, p1, p2) = (
                position(triangle[0]),
                position(triangle[1]),
                position(triangle[2]),
            );
            // Cross product length is twice the area, which gives the weighting for free
            let face_normal = (p1 - p0).cross(p2 - p0);
            for &i in triangle {
                normals[i as usize] += face_normal;
            }
        }
        normals
            .into_iter()
            .map(|n| {
                use cgmath::InnerSpace;
                if n.magnitude2() > f32::EPSILON {
                    n.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect()
    }

    pub fn to_vertices(&self) -> Vec<ModelVertex> {
        let normals = self.vertex_normals();
        // Same rule as normals: texture coordinates only line up one per position
        let has_tex_coords = self.tex_coords.len() / 2 == self.vertex_count();
        self.positions
            .chunks_exact(3)
            .zip(normals)
            .enumerate()
            .map(|(i, (p, normal))| ModelVertex {
                position: [p[0], p[1], p[2]],
                normal,
                tex_coords: if has_tex_coords {
                    [self.tex_coords[i * 2], 1.0 - self.tex_coords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                },
            })
            .collect()
    }
}

/// Uploaded vertex and index buffers for one mesh.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: Option<String>,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, mesh: &MeshData) -> Self {
        let vertices = mesh.to_vertices();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: mesh.name.clone(),
            vertex_buffer,
            index_buffer,
            num_elements: mesh.indices.len() as u32,
            material: mesh.material.clone(),
        }
    }
}
