use approx::assert_relative_eq;
use city_viz::{
    data_structures::material::{Material, MaterialLibrary},
    resources::{AssetSource, load_materials, mtl::parse_mtl},
};

const LIBRARY: &str = "\
# two materials
newmtl red
Ka 0.1 0.0 0.0
Kd 0.8 0.1 0.1
Ks 0.5 0.5 0.5
Ns 32
d 0.5

newmtl plain
Kd 0.2 0.3 0.4
";

#[test]
fn should_parse_colors_and_alpha() {
    let library = parse_mtl(LIBRARY, "inline").unwrap();
    assert_eq!(library.len(), 2);

    let red = library.get("red").unwrap();
    assert_eq!(red.diffuse, [0.8, 0.1, 0.1, 0.5]);
    assert_eq!(red.ambient, [0.1, 0.0, 0.0, 0.5]);
    assert_relative_eq!(red.shininess, 32.0);
}

#[test]
fn should_default_missing_values() {
    let library = parse_mtl(LIBRARY, "inline").unwrap();
    let plain = library.get("plain").unwrap();
    let defaults = Material::default();

    assert_eq!(plain.diffuse, [0.2, 0.3, 0.4, 1.0]);
    assert_eq!(plain.specular, defaults.specular);
    assert_relative_eq!(plain.shininess, defaults.shininess);
}

#[test]
fn should_reject_empty_or_markup_libraries() {
    assert!(parse_mtl("", "empty").unwrap_err().is_parse());
    assert!(parse_mtl("# only a comment\n", "comment").unwrap_err().is_parse());
    assert!(parse_mtl("<html></html>", "page").unwrap_err().is_parse());
}

#[test]
fn should_resolve_first_known_candidate() {
    let library: MaterialLibrary = [
        Material::new("a", [0.0; 4], [1.0, 0.0, 0.0, 1.0], [0.0; 4], 1.0),
        Material::new("b", [0.0; 4], [0.0, 1.0, 0.0, 1.0], [0.0; 4], 1.0),
    ]
    .into_iter()
    .collect();

    let found = library.resolve([None, Some("missing"), Some("b"), Some("a")]);
    assert_eq!(found.map(|m| m.name.as_str()), Some("b"));
    assert!(library.resolve([None, Some("missing")]).is_none());
}

#[tokio::test]
async fn should_load_bundled_library() {
    let library = load_materials(&AssetSource::location("city.mtl"))
        .await
        .unwrap();

    for name in [
        "asphalt",
        "building_brick",
        "building_glass",
        "building_concrete",
        "destination",
        "signal_pole",
        "car_paint",
    ] {
        assert!(library.get(name).is_some(), "{name} missing");
    }
}

#[tokio::test]
async fn should_report_missing_library_as_fetch_error() {
    let err = load_materials(&AssetSource::location("nope.mtl"))
        .await
        .unwrap_err();
    assert!(err.is_fetch());
}
