#![cfg(feature = "integration-tests")]

use city_viz::{
    camera::CameraUniform,
    config::LightConfig,
    data_structures::mesh::GpuMesh,
    pipelines::{
        light::{LightResources, LightUniform},
        phong::{check_compilation, mk_entity_bind_group_layout, mk_phong_pipeline, mk_shader_module},
    },
    Error,
    resources::obj::parse_obj,
};

async fn headless_device() -> (wgpu::Device, wgpu::Queue) {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .expect("integration tests need a graphics adapter");
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("test device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
            ..Default::default()
        })
        .await
        .expect("integration tests need a graphics device")
}

fn camera_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<CameraUniform>() as u64
                ),
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

#[tokio::test]
async fn should_link_phong_pipeline() {
    let (device, _queue) = headless_device().await;
    let light = LightResources::new(&device, LightUniform::from(&LightConfig::default()));
    let entity_layout = mk_entity_bind_group_layout(&device);

    let pipeline = mk_phong_pipeline(
        &device,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        &camera_layout(&device),
        &light.bind_group_layout,
        &entity_layout,
    )
    .await;

    assert!(pipeline.is_ok(), "{:?}", pipeline.err());
}

#[tokio::test]
async fn should_report_clean_compilation() {
    let (device, _queue) = headless_device().await;
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("trivial"),
        source: wgpu::ShaderSource::Wgsl(
            "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }"
                .into(),
        ),
    });

    assert!(check_compilation(&shader, "trivial").await.is_ok());
}

#[tokio::test]
async fn should_report_broken_shader_as_link_error() {
    let (device, _queue) = headless_device().await;

    let result = mk_shader_module(&device, "broken", "@vertex fn vs_main( -> {").await;

    assert!(matches!(result, Err(Error::ShaderLink { ref label, .. }) if label == "broken"));
}

#[tokio::test]
async fn should_upload_parsed_mesh() {
    let (device, _queue) = headless_device().await;
    let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n", "quad").unwrap();

    let gpu_mesh = GpuMesh::new(&device, &mesh);

    assert_eq!(gpu_mesh.num_elements, 6);
    assert_eq!(gpu_mesh.name, "quad");
}
