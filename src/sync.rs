//! HTTP client for the simulation server.
//!
//! The server is only ever read from (plus the `/init` and `/update`
//! commands). Network and status failures become [`Error::Fetch`], bodies that
//! are not the expected JSON become [`Error::Parse`].

use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::SimulationConfig,
    data_structures::entity::{Direction, EntityId},
    error::{Error, Result},
};

/// Position of a static city object.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EntityDto {
    pub id: EntityId,
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TrafficLightDto {
    pub id: EntityId,
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default = "unknown_direction")]
    pub direction: Direction,
    #[serde(default)]
    pub cell1: Option<String>,
    #[serde(default)]
    pub cell2: Option<String>,
    #[serde(default)]
    pub state: Option<bool>,
}

impl TrafficLightDto {
    /// Both neighbours are known and carry the same directional character.
    ///
    /// A light whose cells are both missing does not count as sharing a cell and
    /// keeps its direction-table rotation.
    pub fn shares_cell(&self) -> bool {
        matches!((&self.cell1, &self.cell2), (Some(a), Some(b)) if a == b)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CarDto {
    pub id: EntityId,
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default = "unknown_direction", alias = "direction")]
    pub dir: Direction,
}

/// Signal state of a traffic light as sent with car updates.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SignalDto {
    pub id: EntityId,
    #[serde(default)]
    pub state: Option<bool>,
}

fn unknown_direction() -> Direction {
    Direction::Unknown
}

/// Reply of `/get-city`: the static topology.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CitySnapshot {
    pub buildings: Vec<EntityDto>,
    pub roads: Vec<EntityDto>,
    pub traffic_lights: Vec<TrafficLightDto>,
    pub destinations: Vec<EntityDto>,
}

/// Reply of `/get-cars`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarsSnapshot {
    pub cars: Vec<CarDto>,
    pub traffic_lights: Vec<SignalDto>,
}

/// Reply of `/init`. Older servers only send a message.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InitReply {
    pub message: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Cheap to clone; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct CityClient {
    http: reqwest::Client,
    base: reqwest::Url,
}

impl CityClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = reqwest::Url::parse(base_url)
            .map_err(|e| Error::parse(base_url, format!("invalid server url: {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn url(&self, path: &str) -> Result<reqwest::Url> {
        self.base
            .join(path)
            .map_err(|e| Error::parse(path, format!("invalid endpoint: {e}")))
    }

    async fn read_text(&self, request: reqwest::RequestBuilder, location: &str) -> Result<String> {
        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| Error::fetch(location, e))?;
        response.text().await.map_err(|e| Error::fetch(location, e))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        let location = url.to_string();
        let body = self.read_text(self.http.get(url), &location).await?;
        serde_json::from_str(&body).map_err(|e| Error::parse(location, e.to_string()))
    }

    /// `POST /init`: creates the simulation with the given parameters.
    pub async fn init(&self, params: &SimulationConfig) -> Result<InitReply> {
        let url = self.url("init")?;
        let location = url.to_string();
        let body = self
            .read_text(self.http.post(url).json(params), &location)
            .await?;
        serde_json::from_str(&body).map_err(|e| Error::parse(location, e.to_string()))
    }

    /// `GET /get-city`: static topology. Called once per session.
    pub async fn fetch_city_snapshot(&self) -> Result<CitySnapshot> {
        self.get_json("get-city").await
    }

    /// `GET /get-cars`: current car positions and signal states.
    pub async fn fetch_car_positions(&self) -> Result<CarsSnapshot> {
        self.get_json("get-cars").await
    }

    /// `GET /update`: advances the simulation by one step. The body is ignored.
    pub async fn advance(&self) -> Result<()> {
        let url = self.url("update")?;
        let location = url.to_string();
        self.read_text(self.http.get(url), &location).await?;
        Ok(())
    }

    /// One refresh cycle: optionally step the simulation, then read the cars.
    pub async fn refresh(self, advance: bool) -> Result<CarsSnapshot> {
        if advance {
            if let Err(e) = self.advance().await {
                log::warn!("Simulation step failed, reading cars anyway: {e}");
            }
        }
        self.fetch_car_positions().await
    }
}
