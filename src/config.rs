//! Runtime configuration.
//!
//! Everything is defaulted, so `config.json` in the asset root only has to
//! name the fields it wants to change. A missing or broken file is not fatal.

use serde::Deserialize;

use crate::{
    data_structures::{
        entity::{Category, RotationConfig},
        material::Material,
    },
    error::{Error, Result},
    resources::load_string,
};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the simulation server, with trailing slash.
    pub server_url: String,
    /// Frames between two car refreshes.
    pub refresh_every_frames: u32,
    /// Call `/update` before each `/get-cars` so the simulation advances with the view.
    pub advance_on_refresh: bool,
    pub simulation: SimulationConfig,
    pub clear_colour: [f64; 4],
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub categories: CategoryStyles,
    /// MTL files loaded at startup, relative to the asset root.
    pub material_libraries: Vec<String>,
    /// Material names assigned to buildings round-robin.
    pub building_palette: Vec<String>,
    pub fallback_material: MaterialConfig,
    pub rotations: RotationConfig,
    pub signal_colours: SignalColours,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8585/".to_string(),
            refresh_every_frames: 30,
            advance_on_refresh: true,
            simulation: SimulationConfig::default(),
            clear_colour: [0.96, 0.95, 0.96, 1.0],
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            categories: CategoryStyles::default(),
            material_libraries: vec!["city.mtl".to_string()],
            building_palette: vec![
                "building_brick".to_string(),
                "building_glass".to_string(),
                "building_concrete".to_string(),
            ],
            fallback_material: MaterialConfig::default(),
            rotations: RotationConfig::default(),
            signal_colours: SignalColours::default(),
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::parse(CONFIG_FILE, e.to_string()))
    }

    /// Reads `config.json` from the asset root, falling back to defaults.
    pub async fn load() -> Self {
        let text = match load_string(CONFIG_FILE).await {
            Ok(text) => text,
            Err(e) => {
                log::info!("No config loaded ({e}), using defaults.");
                return Self::default();
            }
        };
        match Self::from_json(&text) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}. Using default configuration.");
                Self::default()
            }
        }
    }
}

/// Body of the `/init` request.
#[derive(Clone, Debug, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    #[serde(rename = "NAgents")]
    pub agents: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agents: 500,
            width: 100,
            height: 100,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second for keyboard movement.
    pub speed: f32,
    /// Shift position and target once so the target is the world center reported by `/init`.
    pub center_on_world: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 35.0, 30.0],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 60.0,
            near: 1.0,
            far: 200.0,
            speed: 15.0,
            center_on_world: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [10.0, 10.0, 10.0],
            ambient: [0.5, 0.5, 0.5, 1.0],
            diffuse: [0.5, 0.5, 0.5, 1.0],
            specular: [0.5, 0.5, 0.5, 1.0],
        }
    }
}

/// How entities of one category are drawn.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CategoryStyle {
    /// OBJ file relative to the asset root.
    pub mesh: String,
    pub scale: [f32; 3],
    /// Added to the server's y coordinate.
    pub y_offset: f32,
    pub material: Option<String>,
}

impl Default for CategoryStyle {
    fn default() -> Self {
        Self {
            mesh: "cube.obj".to_string(),
            scale: [1.0; 3],
            y_offset: 0.0,
            material: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CategoryStyles {
    pub buildings: CategoryStyle,
    pub roads: CategoryStyle,
    pub traffic_lights: CategoryStyle,
    pub destinations: CategoryStyle,
    pub cars: CategoryStyle,
}

impl CategoryStyles {
    pub fn get(&self, category: Category) -> &CategoryStyle {
        match category {
            Category::Building => &self.buildings,
            Category::Road => &self.roads,
            Category::TrafficLight => &self.traffic_lights,
            Category::Destination => &self.destinations,
            Category::Car => &self.cars,
        }
    }
}

impl Default for CategoryStyles {
    fn default() -> Self {
        Self {
            buildings: CategoryStyle {
                mesh: "cube.obj".to_string(),
                scale: [1.0, 2.0, 1.0],
                y_offset: 1.0,
                material: None,
            },
            roads: CategoryStyle {
                mesh: "cube.obj".to_string(),
                scale: [1.0, 0.1, 1.0],
                y_offset: 0.0,
                material: Some("asphalt".to_string()),
            },
            traffic_lights: CategoryStyle {
                mesh: "traffic_light.obj".to_string(),
                scale: [0.3, 0.3, 0.3],
                y_offset: 0.5,
                material: Some("signal_pole".to_string()),
            },
            destinations: CategoryStyle {
                mesh: "cube.obj".to_string(),
                scale: [0.8, 0.2, 0.8],
                y_offset: 0.1,
                material: Some("destination".to_string()),
            },
            cars: CategoryStyle {
                mesh: "car.obj".to_string(),
                scale: [0.4, 0.4, 0.4],
                y_offset: 0.3,
                material: Some("car_paint".to_string()),
            },
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
}

impl MaterialConfig {
    pub fn to_material(&self) -> Material {
        Material::new(
            "fallback",
            self.ambient,
            self.diffuse,
            self.specular,
            self.shininess,
        )
    }
}

impl Default for MaterialConfig {
    fn default() -> Self {
        let material = Material::default();
        Self {
            ambient: material.ambient,
            diffuse: material.diffuse,
            specular: material.specular,
            shininess: material.shininess,
        }
    }
}

/// Diffuse tint of traffic lights by signal state.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SignalColours {
    pub go: [f32; 4],
    pub stop: [f32; 4],
}

impl Default for SignalColours {
    fn default() -> Self {
        Self {
            go: [0.1, 0.8, 0.2, 1.0],
            stop: [0.9, 0.1, 0.1, 1.0],
        }
    }
}
