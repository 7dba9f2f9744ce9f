//! Renderable simulation objects and their category specific extras.

use std::fmt::Display;

use serde::{Deserialize, Deserializer};

use crate::data_structures::instance::Transform;

/// The five kinds of objects the server reports. Draw order follows [`Category::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Building,
    Road,
    TrafficLight,
    Destination,
    Car,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Road,
        Category::Building,
        Category::Destination,
        Category::TrafficLight,
        Category::Car,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Building => "buildings",
            Category::Road => "roads",
            Category::TrafficLight => "traffic lights",
            Category::Destination => "destinations",
            Category::Car => "cars",
        }
    }
}

/// Server assigned id. The server sends strings like `"c_12"` but plain numbers are accepted too.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RawId")]
pub struct EntityId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for EntityId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => EntityId(text),
            RawId::Number(number) => EntityId(number.to_string()),
        }
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId(id.to_string())
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Heading of a road cell, traffic light or car as reported by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum Direction {
    #[serde(alias = "^", alias = "up")]
    Up,
    #[serde(alias = "v", alias = "down")]
    Down,
    #[serde(alias = "<", alias = "left")]
    Left,
    #[serde(alias = ">", alias = "right")]
    Right,
    #[serde(other)]
    Unknown,
}

/// Rotation in degrees about the vertical axis for each [`Direction`].
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionTable {
    pub up: f32,
    pub down: f32,
    pub left: f32,
    pub right: f32,
}

impl DirectionTable {
    pub const TRAFFIC_LIGHT: DirectionTable = DirectionTable {
        up: 0.0,
        down: 180.0,
        left: 90.0,
        right: 270.0,
    };

    // Up and Down are swapped relative to traffic lights. Kept as reported until
    // checked against the server's heading convention.
    pub const CAR: DirectionTable = DirectionTable {
        up: 180.0,
        down: 0.0,
        left: 90.0,
        right: 270.0,
    };

    pub fn degrees(&self, direction: Direction) -> f32 {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Unknown => 0.0,
        }
    }

    /// Euler rotation (radians) turning an entity to face `direction`.
    pub fn rotation(&self, direction: Direction) -> cgmath::Vector3<f32> {
        cgmath::Vector3::new(0.0, self.degrees(direction).to_radians(), 0.0)
    }
}

/// A table as written in the config. Missing directions keep the angle of the base table.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
struct DirectionOverrides {
    up: Option<f32>,
    down: Option<f32>,
    left: Option<f32>,
    right: Option<f32>,
}

impl DirectionOverrides {
    fn over(self, base: &DirectionTable) -> DirectionTable {
        DirectionTable {
            up: self.up.unwrap_or(base.up),
            down: self.down.unwrap_or(base.down),
            left: self.left.unwrap_or(base.left),
            right: self.right.unwrap_or(base.right),
        }
    }
}

fn traffic_light_table<'de, D>(deserializer: D) -> Result<DirectionTable, D::Error>
where
    D: Deserializer<'de>,
{
    DirectionOverrides::deserialize(deserializer).map(|o| o.over(&DirectionTable::TRAFFIC_LIGHT))
}

fn car_table<'de, D>(deserializer: D) -> Result<DirectionTable, D::Error>
where
    D: Deserializer<'de>,
{
    DirectionOverrides::deserialize(deserializer).map(|o| o.over(&DirectionTable::CAR))
}

/// Both direction tables plus the fixed angle for lights between two alike cells.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    #[serde(deserialize_with = "traffic_light_table")]
    pub traffic_light: DirectionTable,
    #[serde(deserialize_with = "car_table")]
    pub car: DirectionTable,
    pub shared_cell_degrees: f32,
}

impl RotationConfig {
    pub fn traffic_light_rotation(
        &self,
        direction: Direction,
        shared_cell: bool,
    ) -> cgmath::Vector3<f32> {
        if shared_cell {
            cgmath::Vector3::new(0.0, self.shared_cell_degrees.to_radians(), 0.0)
        } else {
            self.traffic_light.rotation(direction)
        }
    }

    pub fn car_rotation(&self, direction: Direction) -> cgmath::Vector3<f32> {
        self.car.rotation(direction)
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            traffic_light: DirectionTable::TRAFFIC_LIGHT,
            car: DirectionTable::CAR,
            shared_cell_degrees: 90.0,
        }
    }
}

/// Data only some categories carry.
#[derive(Clone, Debug, PartialEq)]
pub enum Extras {
    None,
    TrafficLight {
        direction: Direction,
        /// Both adjacent cells carry the same directional character.
        shared_cell: bool,
        /// `true` is green. `None` until the server reports a state.
        state: Option<bool>,
    },
    Car {
        direction: Direction,
    },
}

/// One renderable simulation object.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    /// Material name looked up in the session's material library.
    pub material_id: Option<String>,
    pub extras: Extras,
}

impl Entity {
    pub fn new(id: EntityId, transform: Transform) -> Self {
        Self {
            id,
            transform,
            material_id: None,
            extras: Extras::None,
        }
    }

    pub fn with_material(mut self, material_id: Option<String>) -> Self {
        self.material_id = material_id;
        self
    }

    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = extras;
        self
    }
}
