//! Application event loop.
//!
//! The loop owns one [`AppState`]: GPU context, renderer, materials and the
//! [`SceneState`]. Every scene mutation happens on the loop thread. The car
//! refresh runs as a background task and hands its result back through a
//! user event, so it is serialized with frames without any locking.
//!
//! # Lifecycle
//!
//! 1. Create window and GPU context, build the Phong pipeline
//! 2. Load meshes and material libraries
//! 3. `/init`, `/get-city` and the first `/get-cars` populate the scene
//! 4. Each redraw: update camera, draw, advance the frame clock
//! 5. Every `refresh_every_frames` frames: spawn a car refresh

use std::{collections::HashMap, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::Config,
    context::Context,
    data_structures::{
        entity::Category,
        material::MaterialLibrary,
        mesh::{GpuMesh, MeshData},
        scene::{SceneState, SceneStyle},
    },
    error::Result,
    render::{DrawStyle, FrameError, Renderer},
    resources::{AssetSource, load_materials, load_mesh},
    sync::{CarsSnapshot, CityClient},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub const CANVAS_ID: &str = "city-canvas";

/// Counts rendered frames and fires once every `cadence` frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameClock {
    count: u32,
    cadence: u32,
}

impl FrameClock {
    /// A cadence of 0 is treated as 1.
    pub fn new(cadence: u32) -> Self {
        Self {
            count: 0,
            cadence: cadence.max(1),
        }
    }

    /// Advances by one frame. Returns `true` and resets when the cadence is reached.
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.cadence {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Everything one session needs to draw and sync.
#[derive(Debug)]
pub struct AppState {
    ctx: Context,
    renderer: Renderer,
    materials: MaterialLibrary,
    scene: SceneState,
    client: CityClient,
    clock: FrameClock,
    advance_on_refresh: bool,
    refresh_in_flight: bool,
    last_time: Instant,
}

async fn load_meshes(config: &Config) -> HashMap<String, MeshData> {
    let mut files: Vec<&str> = Category::ALL
        .iter()
        .map(|category| config.categories.get(*category).mesh.as_str())
        .collect();
    files.sort_unstable();
    files.dedup();

    let loads = files.into_iter().map(|file| async move {
        (file, load_mesh(&AssetSource::location(file), file).await)
    });
    futures::future::join_all(loads)
        .await
        .into_iter()
        .filter_map(|(file, result)| match result {
            Ok(mesh) => {
                log::info!(
                    "Loaded mesh {file}: {} vertices, {} triangles",
                    mesh.vertex_count(),
                    mesh.triangle_count()
                );
                Some((file.to_string(), mesh))
            }
            Err(e) => {
                log::warn!("{e}. Categories drawn with {file} stay invisible.");
                None
            }
        })
        .collect()
}

async fn load_material_libraries<'a>(
    files: impl IntoIterator<Item = &'a str>,
) -> MaterialLibrary {
    let mut files: Vec<&str> = files.into_iter().collect();
    files.sort_unstable();
    files.dedup();

    let loads = files.into_iter().map(|file| async move {
        (file, load_materials(&AssetSource::location(file)).await)
    });
    let mut library = MaterialLibrary::new();
    for (file, result) in futures::future::join_all(loads).await {
        match result {
            Ok(materials) => {
                log::info!("Loaded {} materials from {file}", materials.len());
                library.extend(materials);
            }
            Err(e) => log::warn!("{e}. Falling back to default colors."),
        }
    }
    library
}

/// Startup sequence of one session: GPU, assets, then the server.
async fn populate_scene(client: &CityClient, ctx: &mut Context, config: &Config) -> SceneState {
    let style = SceneStyle::from(config);
    match client.init(&config.simulation).await {
        Ok(reply) => {
            if let Some(message) = &reply.message {
                log::info!("Server: {message}");
            }
            if let (true, Some(width), Some(height)) =
                (config.camera.center_on_world, reply.width, reply.height)
            {
                let center = cgmath::Point3::new(width as f32 / 2.0, 0.0, height as f32 / 2.0);
                ctx.camera.camera.recenter(center);
            }
        }
        Err(e) => log::warn!("{e}. Continuing with the server's current model."),
    }

    let mut scene = match client.fetch_city_snapshot().await {
        Ok(city) => SceneState::from_city(style, &city),
        Err(e) => {
            log::warn!("{e}. Starting with an empty city.");
            SceneState::new(style)
        }
    };
    match client.fetch_car_positions().await {
        Ok(cars) => {
            scene.apply_cars(&cars);
        }
        Err(e) => log::warn!("{e}. Cars appear with the first successful refresh."),
    }
    scene
}

impl AppState {
    pub async fn new(window: Arc<Window>, config: Config) -> anyhow::Result<Self> {
        let mut ctx = Context::new(window, &config).await?;
        let mut renderer = Renderer::new(&ctx, DrawStyle::from(&config)).await?;

        let meshes = load_meshes(&config).await;
        let libraries = config
            .material_libraries
            .iter()
            .map(String::as_str)
            .chain(meshes.values().filter_map(|m| m.material_library.as_deref()));
        let materials = load_material_libraries(libraries).await;

        let client = CityClient::new(&config.server_url)?;
        log::info!("Syncing with {}", client.base_url());
        let scene = populate_scene(&client, &mut ctx, &config).await;

        for category in Category::ALL {
            let file = &config.categories.get(category).mesh;
            if let Some(mesh) = meshes.get(file) {
                let capacity = scene.entities(category).len();
                renderer.add_batch(&ctx, category, GpuMesh::new(&ctx.device, mesh), capacity);
            }
        }
        ctx.write_camera();

        Ok(Self {
            ctx,
            renderer,
            materials,
            scene,
            client,
            clock: FrameClock::new(config.refresh_every_frames),
            advance_on_refresh: config.advance_on_refresh,
            refresh_in_flight: false,
            last_time: Instant::now(),
        })
    }

    fn apply_refresh(&mut self, result: Result<CarsSnapshot>) {
        self.refresh_in_flight = false;
        match result {
            Ok(snapshot) => {
                let report = self.scene.apply_cars(&snapshot);
                log::debug!("Car refresh: {report:?}");
            }
            Err(e) => log::warn!("{e}. Keeping previous car positions."),
        }
    }
}

pub(crate) enum VizEvent {
    #[allow(dead_code)]
    Initialized(Box<AppState>),
    #[allow(dead_code)]
    InitFailed,
    CarsRefreshed(Result<CarsSnapshot>),
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<VizEvent>,
    config: Option<Config>,
    state: Option<AppState>,
}

impl App {
    fn new(event_loop: &EventLoop<VizEvent>, config: Option<Config>) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            state: None,
        })
    }

    fn spawn_refresh(&mut self) {
        let Some(state) = &mut self.state else {
            return;
        };
        if state.refresh_in_flight {
            log::debug!("Previous car refresh still pending, skipping this one");
            return;
        }
        state.refresh_in_flight = true;
        let client = state.client.clone();
        let advance = state.advance_on_refresh;
        let proxy = self.proxy.clone();
        let refresh = async move {
            let result = client.refresh(advance).await;
            // The loop may be gone by now; then there is nothing to update
            if proxy.send_event(VizEvent::CarsRefreshed(result)).is_err() {
                log::debug!("Car refresh finished after the event loop closed");
            }
        };
        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(refresh);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(refresh);
    }
}

impl ApplicationHandler<VizEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("City Simulation");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        let config = self.config.take();
        let init_future = async move {
            let config = match config {
                Some(config) => config,
                None => Config::load().await,
            };
            AppState::new(window, config).await
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(mut state) => {
                    let size = state.ctx.window().inner_size();
                    state.ctx.resize(size.width, size.height);
                    state.ctx.window().request_redraw();
                    self.state = Some(state);
                }
                Err(e) => {
                    log::error!("Startup failed: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(state) => VizEvent::Initialized(Box::new(state)),
                    Err(e) => {
                        log::error!("Startup failed: {e:#}");
                        VizEvent::InitFailed
                    }
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed during startup");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: VizEvent) {
        match event {
            VizEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                let mut state = *state;
                let size = state.ctx.window().inner_size();
                state.ctx.resize(size.width, size.height);
                state.ctx.window().request_redraw();
                self.state = Some(state);
            }
            VizEvent::InitFailed => event_loop.exit(),
            VizEvent::CarsRefreshed(result) => match &mut self.state {
                Some(state) => state.apply_refresh(result),
                None => log::debug!("Car refresh arrived without a scene, dropping it"),
            },
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                state.ctx.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let dt = state.last_time.elapsed();
                state.last_time = Instant::now();
                let camera = &mut state.ctx.camera;
                camera.controller.update(&mut camera.camera, dt);

                match state
                    .renderer
                    .draw(&mut state.ctx, &state.scene, &state.materials)
                {
                    Ok(()) | Err(FrameError::Skipped) => {}
                    Err(FrameError::Outdated) => {
                        let size = state.ctx.window().inner_size();
                        state.ctx.resize(size.width, size.height);
                    }
                    Err(FrameError::Lost) => {
                        log::error!("Render surface was lost, shutting down");
                        event_loop.exit();
                        return;
                    }
                    Err(e) => log::warn!("Unable to render {e}"),
                }

                let refresh_due = state.clock.tick();
                state.ctx.window().request_redraw();
                if refresh_due {
                    self.spawn_refresh();
                }
            }
            _ => {}
        }
    }
}

/// Runs with `config.json` from the asset root.
pub fn run() -> anyhow::Result<()> {
    run_with(None)
}

/// Runs with the given configuration, or `config.json` when `None`.
pub fn run_with(config: Option<Config>) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<VizEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> std::result::Result<(), wasm_bindgen::JsValue> {
    run().map_err(|e| wasm_bindgen::JsValue::from_str(&e.to_string()))
}
