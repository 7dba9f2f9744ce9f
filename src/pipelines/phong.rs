use crate::{
    data_structures::{
        instance::EntityUniform,
        mesh::{ModelVertex, Vertex},
        texture::Texture,
    },
    error::{Error, Result},
};

pub const PHONG_LABEL: &str = "Phong Shader";

/// Group 2: one [`EntityUniform`] slot, selected per draw through a dynamic offset.
pub fn mk_entity_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(EntityUniform::SIZE),
            },
            count: None,
        }],
        label: Some("entity_bind_group_layout"),
    })
}

/**
 * Builds the one program every category is drawn with.
 *
 * Shader and pipeline creation run inside a validation error scope, so a
 * broken shader or a layout mismatch surfaces as [`Error::ShaderLink`]
 * instead of reaching the device's uncaptured error handler.
 */
pub async fn mk_phong_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
    entity_bind_group_layout: &wgpu::BindGroupLayout,
) -> Result<wgpu::RenderPipeline> {
    let shader = mk_shader_module(device, PHONG_LABEL, include_str!("phong.wgsl")).await?;

    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Phong Pipeline Layout"),
        bind_group_layouts: &[
            Some(camera_bind_group_layout),
            Some(light_bind_group_layout),
            Some(entity_bind_group_layout),
        ],
        immediate_size: 0,
    });
    let pipeline = mk_render_pipeline(
        device,
        &layout,
        color_format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        &[ModelVertex::desc()],
        &shader,
    );
    link_result(scope.pop().await, PHONG_LABEL)?;
    Ok(pipeline)
}

/// Compiles WGSL `source`, failing with [`Error::ShaderLink`] on any parse or validation error.
pub async fn mk_shader_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    link_result(scope.pop().await, label)?;
    check_compilation(&shader, label).await?;
    Ok(shader)
}

fn link_result(error: Option<wgpu::Error>, label: &str) -> Result<()> {
    match error {
        None => Ok(()),
        Some(error) => Err(Error::ShaderLink {
            label: label.to_string(),
            reason: error.to_string(),
        }),
    }
}

/// Fails with [`Error::ShaderLink`] when the compiler reported any error for `shader`.
pub async fn check_compilation(shader: &wgpu::ShaderModule, label: &str) -> Result<()> {
    let info = shader.get_compilation_info().await;
    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|message| message.message_type == wgpu::CompilationMessageType::Error)
        .map(|message| message.message.clone())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::ShaderLink {
            label: label.to_string(),
            reason: errors.join("; "),
        })
    }
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Phong Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // OBJ winding in the wild is inconsistent
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: Some(true),
            depth_compare: Some(wgpu::CompareFunction::Less),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
