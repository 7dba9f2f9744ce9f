//! Scene state: the entity lists of one session.
//!
//! Owned by the app state and handed by reference to the renderer and the
//! sync routines. The city topology is written once; afterwards only car
//! transforms and signal states change.

use std::collections::HashMap;

use crate::{
    config::{CategoryStyle, CategoryStyles, Config, SignalColours},
    data_structures::{
        entity::{Category, Entity, EntityId, Extras, RotationConfig},
        instance::{EntityUniform, Transform},
        material::{Material, MaterialLibrary},
    },
    sync::{CarDto, CarsSnapshot, CitySnapshot, EntityDto, TrafficLightDto},
};

/// Outcome of applying one `/get-cars` reply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub cars_updated: usize,
    pub cars_ignored: usize,
    pub signals_updated: usize,
}

/// Styling inputs needed to turn server records into entities.
#[derive(Clone, Debug, Default)]
pub struct SceneStyle {
    pub categories: CategoryStyles,
    pub rotations: RotationConfig,
    pub building_palette: Vec<String>,
}

impl From<&Config> for SceneStyle {
    fn from(config: &Config) -> Self {
        Self {
            categories: config.categories.clone(),
            rotations: config.rotations.clone(),
            building_palette: config.building_palette.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SceneState {
    style: SceneStyle,
    buildings: Vec<Entity>,
    roads: Vec<Entity>,
    traffic_lights: Vec<Entity>,
    destinations: Vec<Entity>,
    cars: Vec<Entity>,
    cars_seeded: bool,
    // id -> index, for refresh matching
    car_index: HashMap<EntityId, usize>,
    signal_index: HashMap<EntityId, usize>,
}

fn transform_for(style: &CategoryStyle, x: f32, y: f32, z: f32) -> Transform {
    Transform {
        position: cgmath::Vector3::new(x, y + style.y_offset, z),
        scale: style.scale.into(),
        ..Default::default()
    }
}

impl SceneState {
    pub fn new(style: SceneStyle) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    /// Builds the static topology from the one `/get-city` reply of the session.
    pub fn from_city(style: SceneStyle, city: &CitySnapshot) -> Self {
        let mut scene = Self::new(style);
        let categories = &scene.style.categories;
        let palette = &scene.style.building_palette;

        scene.buildings = city
            .buildings
            .iter()
            .enumerate()
            .map(|(i, dto)| {
                // Only palette buildings carry their own material
                let material = (!palette.is_empty()).then(|| palette[i % palette.len()].clone());
                plain_entity(&categories.buildings, dto).with_material(material)
            })
            .collect();
        scene.roads = city
            .roads
            .iter()
            .map(|dto| plain_entity(&categories.roads, dto))
            .collect();
        scene.destinations = city
            .destinations
            .iter()
            .map(|dto| plain_entity(&categories.destinations, dto))
            .collect();
        scene.traffic_lights = city
            .traffic_lights
            .iter()
            .map(|dto| traffic_light_entity(&categories.traffic_lights, &scene.style.rotations, dto))
            .collect();
        scene.signal_index = scene
            .traffic_lights
            .iter()
            .enumerate()
            .map(|(i, light)| (light.id.clone(), i))
            .collect();

        log::info!(
            "City loaded: {} buildings, {} roads, {} traffic lights, {} destinations",
            scene.buildings.len(),
            scene.roads.len(),
            scene.traffic_lights.len(),
            scene.destinations.len()
        );
        scene
    }

    pub fn entities(&self, category: Category) -> &[Entity] {
        match category {
            Category::Building => &self.buildings,
            Category::Road => &self.roads,
            Category::TrafficLight => &self.traffic_lights,
            Category::Destination => &self.destinations,
            Category::Car => &self.cars,
        }
    }

    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.entities(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cars_seeded(&self) -> bool {
        self.cars_seeded
    }

    /**
     * Applies a `/get-cars` reply.
     *
     * The first reply seeds the car list. Every later reply only overwrites
     * position and rotation of cars whose id is already known; other ids are
     * skipped and the list length never changes.
     */
    pub fn apply_cars(&mut self, snapshot: &CarsSnapshot) -> RefreshReport {
        let mut report = RefreshReport::default();
        if !self.cars_seeded {
            self.seed_cars(&snapshot.cars);
            report.cars_updated = self.cars.len();
            self.cars_seeded = true;
        } else {
            for car in &snapshot.cars {
                match self.car_index.get(&car.id) {
                    Some(&i) => {
                        let style = &self.style.categories.cars;
                        let entity = &mut self.cars[i];
                        entity.transform.position =
                            cgmath::Vector3::new(car.x, car.y + style.y_offset, car.z);
                        entity.transform.rotation = self.style.rotations.car_rotation(car.dir);
                        entity.extras = Extras::Car { direction: car.dir };
                        report.cars_updated += 1;
                    }
                    None => {
                        log::debug!("Ignoring car {} that was not in the initial car list", car.id);
                        report.cars_ignored += 1;
                    }
                }
            }
        }
        for signal in &snapshot.traffic_lights {
            let Some(&i) = self.signal_index.get(&signal.id) else {
                continue;
            };
            if let Extras::TrafficLight { state, .. } = &mut self.traffic_lights[i].extras {
                if signal.state.is_some() {
                    *state = signal.state;
                    report.signals_updated += 1;
                }
            }
        }
        report
    }

    fn seed_cars(&mut self, cars: &[CarDto]) {
        let style = &self.style.categories.cars;
        for car in cars {
            if self.car_index.contains_key(&car.id) {
                log::warn!("Car {} listed twice in the initial reply", car.id);
                continue;
            }
            let mut transform = transform_for(style, car.x, car.y, car.z);
            transform.rotation = self.style.rotations.car_rotation(car.dir);
            let entity = Entity::new(car.id.clone(), transform)
                .with_extras(Extras::Car { direction: car.dir });
            self.car_index.insert(car.id.clone(), self.cars.len());
            self.cars.push(entity);
        }
        log::info!("Seeded {} cars", self.cars.len());
    }

    /**
     * Per-draw uniforms for one category, in entity order.
     *
     * Material lookup goes entity material, then mesh material, then category
     * material, then `fallback`. Traffic lights with a known signal state get
     * their diffuse color replaced by the signal color.
     */
    pub fn frame_uniforms(
        &self,
        category: Category,
        view_projection: &cgmath::Matrix4<f32>,
        materials: &MaterialLibrary,
        mesh_material: Option<&str>,
        fallback: &Material,
        signals: &SignalColours,
    ) -> Vec<EntityUniform> {
        let category_material = self.style.categories.get(category).material.as_deref();
        self.entities(category)
            .iter()
            .map(|entity| {
                let material = materials
                    .resolve([entity.material_id.as_deref(), mesh_material, category_material])
                    .unwrap_or(fallback);
                match entity.extras {
                    Extras::TrafficLight {
                        state: Some(go), ..
                    } => {
                        let tinted = material.with_diffuse(if go { signals.go } else { signals.stop });
                        entity.transform.to_raw(view_projection, &tinted)
                    }
                    _ => entity.transform.to_raw(view_projection, material),
                }
            })
            .collect()
    }
}

fn plain_entity(style: &CategoryStyle, dto: &EntityDto) -> Entity {
    Entity::new(dto.id.clone(), transform_for(style, dto.x, dto.y, dto.z))
}

fn traffic_light_entity(
    style: &CategoryStyle,
    rotations: &RotationConfig,
    dto: &TrafficLightDto,
) -> Entity {
    let shared_cell = dto.shares_cell();
    let mut transform = transform_for(style, dto.x, dto.y, dto.z);
    transform.rotation = rotations.traffic_light_rotation(dto.direction, shared_cell);
    Entity::new(dto.id.clone(), transform).with_extras(Extras::TrafficLight {
        direction: dto.direction,
        shared_cell,
        state: dto.state,
    })
}

