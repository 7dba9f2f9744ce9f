use approx::assert_relative_eq;
use city_viz::{
    config::{Config, SignalColours},
    data_structures::{
        entity::{Category, Direction, DirectionTable, EntityId, Extras, RotationConfig},
        material::{Material, MaterialLibrary},
        scene::{SceneState, SceneStyle},
    },
    sync::{CarsSnapshot, CitySnapshot, CityClient, TrafficLightDto},
};

const CITY: &str = r#"{
    "buildings": [
        {"id": "b_1", "x": 1, "y": 0, "z": 2},
        {"id": "b_2", "x": 2, "y": 0, "z": 2}
    ],
    "roads": [{"id": "r_1", "x": 0, "y": 0, "z": 0}],
    "trafficLights": [
        {"id": "t_1", "x": 3, "y": 0, "z": 4, "direction": "Up", "cell1": ">", "cell2": ">", "state": true},
        {"id": "t_2", "x": 5, "y": 0, "z": 6, "direction": "Up", "cell1": "^", "cell2": ">"}
    ],
    "destinations": [{"id": 7, "x": 9, "y": 0, "z": 9}]
}"#;

const CARS: &str = r#"{
    "cars": [
        {"id": "c_1", "x": 0, "y": 0, "z": 1, "dir": "Up"},
        {"id": "c_2", "x": 4, "y": 0, "z": 1, "dir": "Right"}
    ]
}"#;

fn city_scene() -> SceneState {
    let city: CitySnapshot = serde_json::from_str(CITY).unwrap();
    SceneState::from_city(SceneStyle::from(&Config::default()), &city)
}

fn cars(json: &str) -> CarsSnapshot {
    serde_json::from_str(json).unwrap()
}

#[test]
fn should_parse_city_snapshot() {
    let city: CitySnapshot = serde_json::from_str(CITY).unwrap();

    assert_eq!(city.buildings.len(), 2);
    assert_eq!(city.traffic_lights[0].direction, Direction::Up);
    assert!(city.traffic_lights[0].shares_cell());
    assert!(!city.traffic_lights[1].shares_cell());
    assert_eq!(city.traffic_lights[1].state, None);
    // numeric ids are accepted as text
    assert_eq!(city.destinations[0].id, EntityId::from("7"));
}

#[test]
fn should_populate_every_category() {
    let scene = city_scene();

    assert_eq!(scene.entities(Category::Building).len(), 2);
    assert_eq!(scene.entities(Category::Road).len(), 1);
    assert_eq!(scene.entities(Category::TrafficLight).len(), 2);
    assert_eq!(scene.entities(Category::Destination).len(), 1);
    assert!(scene.entities(Category::Car).is_empty());
    assert_eq!(scene.len(), 6);
}

#[test]
fn should_apply_category_style() {
    let scene = city_scene();
    let style = Config::default().categories.buildings;
    let building = &scene.entities(Category::Building)[0];

    assert_relative_eq!(building.transform.position.x, 1.0);
    assert_relative_eq!(building.transform.position.y, style.y_offset);
    assert_relative_eq!(building.transform.position.z, 2.0);
    assert_relative_eq!(building.transform.scale.y, style.scale[1]);
}

#[test]
fn should_assign_building_palette_round_robin() {
    let scene = city_scene();
    let palette = Config::default().building_palette;
    let buildings = scene.entities(Category::Building);

    assert_eq!(buildings[0].material_id.as_ref(), Some(&palette[0]));
    assert_eq!(buildings[1].material_id.as_ref(), Some(&palette[1]));
}

#[test]
fn should_rotate_lights_between_alike_cells_by_ninety_degrees() {
    let scene = city_scene();
    let lights = scene.entities(Category::TrafficLight);

    // both face Up, only the first sits between two alike cells
    assert_relative_eq!(lights[0].transform.rotation.y, 90f32.to_radians());
    assert_relative_eq!(lights[1].transform.rotation.y, 0.0);
    assert!(matches!(
        lights[0].extras,
        Extras::TrafficLight {
            shared_cell: true,
            state: Some(true),
            ..
        }
    ));
}

#[test]
fn should_keep_both_direction_tables() {
    let rotations = RotationConfig::default();

    assert_relative_eq!(DirectionTable::TRAFFIC_LIGHT.degrees(Direction::Up), 0.0);
    assert_relative_eq!(DirectionTable::TRAFFIC_LIGHT.degrees(Direction::Down), 180.0);
    assert_relative_eq!(DirectionTable::CAR.degrees(Direction::Up), 180.0);
    assert_relative_eq!(DirectionTable::CAR.degrees(Direction::Down), 0.0);
    assert_relative_eq!(DirectionTable::CAR.degrees(Direction::Right), 270.0);
    assert_relative_eq!(
        rotations.traffic_light_rotation(Direction::Left, true).y,
        90f32.to_radians()
    );
    assert_relative_eq!(
        rotations.car_rotation(Direction::Left).y,
        90f32.to_radians()
    );
}

#[test]
fn should_keep_car_table_base_for_partial_override() {
    let config = Config::from_json(r#"{"rotations": {"car": {"up": 170}}}"#).unwrap();
    let rotations = &config.rotations;

    assert_relative_eq!(rotations.car.up, 170.0);
    assert_relative_eq!(rotations.car.down, 0.0);
    assert_relative_eq!(rotations.car.left, 90.0);
    assert_eq!(rotations.traffic_light, DirectionTable::TRAFFIC_LIGHT);
    assert_relative_eq!(rotations.shared_cell_degrees, 90.0);
}

#[test]
fn should_not_share_cell_without_neighbours() {
    let light: TrafficLightDto =
        serde_json::from_str(r#"{"id": "t_9", "x": 1, "direction": "Down"}"#).unwrap();

    assert!(!light.shares_cell());
}

#[test]
fn should_seed_cars_from_first_reply() {
    let mut scene = city_scene();
    let report = scene.apply_cars(&cars(CARS));

    assert!(scene.cars_seeded());
    assert_eq!(report.cars_updated, 2);
    let car = &scene.entities(Category::Car)[0];
    assert_eq!(car.id, EntityId::from("c_1"));
    assert_relative_eq!(car.transform.rotation.y, 180f32.to_radians());
}

#[test]
fn should_ignore_unknown_cars_on_refresh() {
    let mut scene = city_scene();
    scene.apply_cars(&cars(CARS));

    let report = scene.apply_cars(&cars(
        r#"{"cars": [
            {"id": "c_1", "x": 7, "y": 0, "z": 8, "dir": "Left"},
            {"id": "c_9", "x": 1, "y": 0, "z": 1, "dir": "Up"}
        ]}"#,
    ));

    assert_eq!(report.cars_updated, 1);
    assert_eq!(report.cars_ignored, 1);
    let cars = scene.entities(Category::Car);
    assert_eq!(cars.len(), 2);
    assert_relative_eq!(cars[0].transform.position.x, 7.0);
    assert_relative_eq!(cars[0].transform.position.z, 8.0);
    assert_relative_eq!(cars[0].transform.rotation.y, 90f32.to_radians());
    // untouched car keeps its position
    assert_relative_eq!(cars[1].transform.position.x, 4.0);
}

#[test]
fn should_update_signal_states() {
    let mut scene = city_scene();
    scene.apply_cars(&cars(CARS));

    let report = scene.apply_cars(&cars(
        r#"{"cars": [], "trafficLights": [{"id": "t_2", "state": false}, {"id": "t_x", "state": true}]}"#,
    ));

    assert_eq!(report.signals_updated, 1);
    assert!(matches!(
        scene.entities(Category::TrafficLight)[1].extras,
        Extras::TrafficLight {
            state: Some(false),
            ..
        }
    ));
}

#[test]
fn should_resolve_materials_in_order() {
    let scene = city_scene();
    let library: MaterialLibrary = [
        Material::new("asphalt", [0.0; 4], [0.25, 0.25, 0.25, 1.0], [0.0; 4], 10.0),
        Material::new("building_brick", [0.0; 4], [0.7, 0.3, 0.2, 1.0], [0.0; 4], 20.0),
        Material::new("from_mesh", [0.0; 4], [0.0, 0.0, 1.0, 1.0], [0.0; 4], 5.0),
    ]
    .into_iter()
    .collect();
    let fallback = Material::default();
    let signals = SignalColours::default();
    let identity = cgmath::Matrix4::from_scale(1.0);

    let roads = scene.frame_uniforms(Category::Road, &identity, &library, None, &fallback, &signals);
    assert_eq!(roads[0].diffuse, [0.25, 0.25, 0.25, 1.0]);

    // entity material beats the mesh material, unknown names fall through
    let buildings = scene.frame_uniforms(
        Category::Building,
        &identity,
        &library,
        Some("from_mesh"),
        &fallback,
        &signals,
    );
    assert_eq!(buildings[0].diffuse, [0.7, 0.3, 0.2, 1.0]);
    assert_eq!(buildings[1].diffuse, [0.0, 0.0, 1.0, 1.0]);

    let destinations = scene.frame_uniforms(
        Category::Destination,
        &identity,
        &MaterialLibrary::new(),
        None,
        &fallback,
        &signals,
    );
    assert_eq!(destinations[0].diffuse, fallback.diffuse);
}

#[test]
fn should_prefer_mesh_material_over_category_material() {
    let mut scene = city_scene();
    scene.apply_cars(&cars(CARS));
    let library: MaterialLibrary = [
        Material::new("car_paint", [0.0; 4], [1.0, 0.0, 0.0, 1.0], [0.0; 4], 10.0),
        Material::new("mesh_body", [0.0; 4], [0.0, 1.0, 0.0, 1.0], [0.0; 4], 10.0),
    ]
    .into_iter()
    .collect();
    let identity = cgmath::Matrix4::from_scale(1.0);

    assert_eq!(scene.entities(Category::Car)[0].material_id, None);
    let with_mesh = scene.frame_uniforms(
        Category::Car,
        &identity,
        &library,
        Some("mesh_body"),
        &Material::default(),
        &SignalColours::default(),
    );
    assert_eq!(with_mesh[0].diffuse, [0.0, 1.0, 0.0, 1.0]);

    let without_mesh = scene.frame_uniforms(
        Category::Car,
        &identity,
        &library,
        None,
        &Material::default(),
        &SignalColours::default(),
    );
    assert_eq!(without_mesh[0].diffuse, [1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn should_tint_lights_by_signal_state() {
    let scene = city_scene();
    let signals = SignalColours::default();
    let identity = cgmath::Matrix4::from_scale(1.0);

    let lights = scene.frame_uniforms(
        Category::TrafficLight,
        &identity,
        &MaterialLibrary::new(),
        None,
        &Material::default(),
        &signals,
    );

    assert_eq!(lights[0].diffuse, signals.go);
    assert_eq!(lights[1].diffuse, Material::default().diffuse);
}

#[test]
fn should_fill_config_defaults() {
    let config = Config::from_json(r#"{"refresh_every_frames": 10, "camera": {"fov_degrees": 45}}"#)
        .unwrap();

    assert_eq!(config.refresh_every_frames, 10);
    assert_relative_eq!(config.camera.fov_degrees, 45.0);
    assert_relative_eq!(config.camera.far, 200.0);
    assert_eq!(config.server_url, "http://localhost:8585/");
    assert!(Config::from_json("{ not json").unwrap_err().is_parse());
}

#[test]
fn should_send_init_parameters_in_server_casing() {
    let body = serde_json::to_value(Config::default().simulation).unwrap();

    assert_eq!(
        body,
        serde_json::json!({"NAgents": 500, "width": 100, "height": 100})
    );
}

#[test]
fn should_reject_invalid_server_url() {
    assert!(CityClient::new("not a url").unwrap_err().is_parse());
    assert_eq!(
        CityClient::new("http://localhost:8585/").unwrap().base_url(),
        "http://localhost:8585/"
    );
}

#[tokio::test]
async fn should_report_unreachable_server_as_fetch_error() {
    let client = CityClient::new("http://127.0.0.1:9/").unwrap();

    assert!(client.fetch_car_positions().await.unwrap_err().is_fetch());
    // the refresh cycle swallows the /update failure and still reports the read
    assert!(client.clone().refresh(true).await.unwrap_err().is_fetch());
}
