//! Per-frame draw of the city.
//!
//! Every category owns one mesh and one uniform buffer with a slot per entity.
//! Each frame the slots are rewritten from the current transforms, the mesh is
//! bound once per category and every entity gets its own `draw_indexed` with
//! its slot selected through a dynamic offset.

use std::iter;

use crate::{
    camera::view_projection,
    config::Config,
    context::Context,
    data_structures::{
        entity::Category,
        instance::EntityUniform,
        material::{Material, MaterialLibrary},
        mesh::GpuMesh,
        scene::SceneState,
    },
    error::Result,
    pipelines::phong::{mk_entity_bind_group_layout, mk_phong_pipeline},
};

/// Rounds `size` up to the next multiple of `alignment`.
pub fn align_to(size: wgpu::BufferAddress, alignment: wgpu::BufferAddress) -> wgpu::BufferAddress {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

/// Why a frame was not presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The surface no longer matches the window and must be reconfigured.
    Outdated,
    /// Nothing was acquired this time, retry on the next redraw.
    Skipped,
    /// Acquiring the frame raised a validation error.
    Validation,
    /// The surface is gone.
    Lost,
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Outdated => write!(f, "surface is outdated"),
            FrameError::Skipped => write!(f, "no surface texture available"),
            FrameError::Validation => write!(f, "surface texture failed validation"),
            FrameError::Lost => write!(f, "surface was lost"),
        }
    }
}

/// True when the surface has to be (re)configured before the next frame.
pub fn needs_reconfigure(configured: bool, surface: [u32; 2], window: [u32; 2]) -> bool {
    !configured || surface != window
}

/// Packs `uniforms` into one byte buffer with a slot every `stride` bytes.
pub fn pack_uniforms(uniforms: &[EntityUniform], stride: wgpu::BufferAddress) -> Vec<u8> {
    let stride = stride as usize;
    let mut bytes = vec![0u8; uniforms.len() * stride];
    for (slot, uniform) in bytes.chunks_exact_mut(stride).zip(uniforms) {
        slot[..EntityUniform::SIZE as usize].copy_from_slice(bytemuck::bytes_of(uniform));
    }
    bytes
}

/// GPU side of one category: its mesh and the uniform slots of its entities.
#[derive(Debug)]
pub struct CategoryBatch {
    pub category: Category,
    pub mesh: GpuMesh,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
    stride: wgpu::BufferAddress,
}

fn mk_uniform_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    category: Category,
    capacity: usize,
    stride: wgpu::BufferAddress,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("{} Uniform Buffer", category.label())),
        size: capacity.max(1) as wgpu::BufferAddress * stride,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(EntityUniform::SIZE),
            }),
        }],
        label: Some(&format!("{} Bind Group", category.label())),
    });
    (buffer, bind_group)
}

impl CategoryBatch {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        category: Category,
        mesh: GpuMesh,
        capacity: usize,
    ) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as wgpu::BufferAddress;
        let stride = align_to(EntityUniform::SIZE, alignment);
        let (uniform_buffer, bind_group) =
            mk_uniform_buffer(device, layout, category, capacity, stride);
        Self {
            category,
            mesh,
            uniform_buffer,
            bind_group,
            capacity: capacity.max(1),
            stride,
        }
    }

    /// Grows the uniform buffer when the category holds more entities than slots.
    fn ensure_capacity(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        count: usize,
    ) {
        if count <= self.capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        log::debug!(
            "Growing {} uniform slots from {} to {}",
            self.category.label(),
            self.capacity,
            capacity
        );
        let (buffer, bind_group) =
            mk_uniform_buffer(device, layout, self.category, capacity, self.stride);
        self.uniform_buffer = buffer;
        self.bind_group = bind_group;
        self.capacity = capacity;
    }
}

/// Inputs to the frame that are fixed for the session.
#[derive(Clone, Debug)]
pub struct DrawStyle {
    pub fallback: Material,
    pub signals: crate::config::SignalColours,
}

impl From<&Config> for DrawStyle {
    fn from(config: &Config) -> Self {
        Self {
            fallback: config.fallback_material.to_material(),
            signals: config.signal_colours.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Renderer {
    pipeline: wgpu::RenderPipeline,
    entity_layout: wgpu::BindGroupLayout,
    batches: Vec<CategoryBatch>,
    style: DrawStyle,
}

impl Renderer {
    /// Fails with a shader link error when the Phong program does not build.
    pub async fn new(ctx: &Context, style: DrawStyle) -> Result<Self> {
        let entity_layout = mk_entity_bind_group_layout(&ctx.device);
        let pipeline = mk_phong_pipeline(
            &ctx.device,
            ctx.config.format,
            &ctx.camera.bind_group_layout,
            &ctx.light.bind_group_layout,
            &entity_layout,
        )
        .await?;
        Ok(Self {
            pipeline,
            entity_layout,
            batches: Vec::new(),
            style,
        })
    }

    /// Registers the mesh of `category`. A category without mesh is not drawn.
    pub fn add_batch(&mut self, ctx: &Context, category: Category, mesh: GpuMesh, capacity: usize) {
        self.batches.retain(|batch| batch.category != category);
        self.batches.push(CategoryBatch::new(
            &ctx.device,
            &self.entity_layout,
            category,
            mesh,
            capacity,
        ));
        self.batches.sort_by_key(|batch| {
            Category::ALL
                .iter()
                .position(|c| *c == batch.category)
                .unwrap_or(usize::MAX)
        });
    }

    pub fn draw(
        &mut self,
        ctx: &mut Context,
        scene: &SceneState,
        materials: &MaterialLibrary,
    ) -> std::result::Result<(), FrameError> {
        // Window size may change between frames without a resize event (browser canvas)
        let size = ctx.window.inner_size();
        if needs_reconfigure(
            ctx.is_surface_configured,
            [ctx.config.width, ctx.config.height],
            [size.width, size.height],
        ) {
            ctx.resize(size.width, size.height);
        }
        // Rendering requires the surface to be configured
        if !ctx.is_surface_configured {
            return Ok(());
        }
        ctx.write_camera();
        let view_proj = view_projection(&ctx.camera.camera, &ctx.projection);

        let mut counts = vec![0usize; self.batches.len()];
        for (batch, count) in self.batches.iter_mut().zip(counts.iter_mut()) {
            let uniforms = scene.frame_uniforms(
                batch.category,
                &view_proj,
                materials,
                batch.mesh.material.as_deref(),
                &self.style.fallback,
                &self.style.signals,
            );
            if uniforms.is_empty() {
                continue;
            }
            batch.ensure_capacity(&ctx.device, &self.entity_layout, uniforms.len());
            ctx.queue.write_buffer(
                &batch.uniform_buffer,
                0,
                &pack_uniforms(&uniforms, batch.stride),
            );
            *count = uniforms.len();
        }

        let (output, suboptimal) = match ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output) => (output, false),
            wgpu::CurrentSurfaceTexture::Suboptimal(output) => (output, true),
            wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => {
                return Err(FrameError::Skipped);
            }
            wgpu::CurrentSurfaceTexture::Outdated => return Err(FrameError::Outdated),
            wgpu::CurrentSurfaceTexture::Lost => return Err(FrameError::Lost),
            wgpu::CurrentSurfaceTexture::Validation => return Err(FrameError::Validation),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("City Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
            render_pass.set_bind_group(1, &ctx.light.bind_group, &[]);
            for (batch, &count) in self.batches.iter().zip(&counts) {
                if count == 0 {
                    continue;
                }
                render_pass.set_vertex_buffer(0, batch.mesh.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(batch.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                for i in 0..count {
                    let offset = (i as wgpu::BufferAddress * batch.stride) as wgpu::DynamicOffset;
                    render_pass.set_bind_group(2, &batch.bind_group, &[offset]);
                    render_pass.draw_indexed(0..batch.mesh.num_elements, 0, 0..1);
                }
            }
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        ctx.window.pre_present_notify();
        output.present();
        if suboptimal {
            return Err(FrameError::Outdated);
        }
        Ok(())
    }
}
