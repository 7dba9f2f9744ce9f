use approx::assert_relative_eq;
use city_viz::resources::{AssetSource, load_mesh, obj::parse_obj};

const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

fn assert_positions(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_relative_eq!(*a, *e, epsilon = 1e-3);
    }
}

#[test]
fn should_center_single_triangle() {
    let mesh = parse_obj(TRIANGLE, "triangle").unwrap();

    assert_positions(
        &mesh.positions,
        &[-0.333, -0.333, 0.0, 0.667, -0.333, 0.0, -0.333, 0.667, 0.0],
    );
    assert_eq!(mesh.indices, vec![0, 1, 2]);
    assert_eq!(mesh.name, "triangle");
}

#[test]
fn should_fan_triangulate_polygons() {
    let text = "v 0 0 0\nv 1 0 0\nv 2 1 0\nv 1 2 0\nv 0 1 0\nf 1 2 3 4 5\n";
    let mesh = parse_obj(text, "pentagon").unwrap();

    assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3, 0, 3, 4]);
}

#[test]
fn should_emit_three_indices_per_fan_triangle() {
    let text = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
f 1 2 3
f 1 2 3 4
f 2 3 4 5
";
    let mesh = parse_obj(text, "mixed").unwrap();

    // one triangle plus two quads
    assert_eq!(mesh.indices.len(), 3 * (1 + 2 + 2));
    assert_eq!(mesh.triangle_count(), 5);
}

#[test]
fn should_have_zero_centroid_after_parsing() {
    let text = "v 10 20 30\nv 12 20 30\nv 12 24 30\nv 10 24 36\nf 1 2 3\nf 1 3 4\n";
    let mesh = parse_obj(text, "offset").unwrap();

    let centroid = mesh.centroid();
    for axis in centroid {
        assert_relative_eq!(axis, 0.0, epsilon = 1e-4);
    }
}

#[test]
fn should_reject_markup() {
    let err = parse_obj("<html><body>404</body></html>", "page").unwrap_err();
    assert!(err.is_parse());

    let err = parse_obj("\n\n   <!DOCTYPE html>\nv 0 0 0\n", "page").unwrap_err();
    assert!(err.is_parse());
}

#[test]
fn should_reject_empty_sources() {
    assert!(parse_obj("", "empty").unwrap_err().is_parse());
    assert!(parse_obj("# nothing here\n\n", "comments").unwrap_err().is_parse());
    // vertices without faces
    assert!(
        parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\n", "points")
            .unwrap_err()
            .is_parse()
    );
}

#[test]
fn should_use_vertex_part_of_face_tokens() {
    let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
f 3//1 2//1 1//1
";
    let mesh = parse_obj(text, "slashes").unwrap();

    assert_eq!(mesh.indices, vec![0, 1, 2, 2, 1, 0]);
    assert_eq!(mesh.tex_coords.len(), 6);
    assert_eq!(mesh.normals, vec![0.0, 0.0, 1.0]);
}

#[test]
fn should_resolve_negative_indices() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\nv 1 1 0\nf -4 -2 -1\n";
    let mesh = parse_obj(text, "relative").unwrap();

    assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
}

#[test]
fn should_reject_out_of_range_indices() {
    let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n", "bad").unwrap_err();
    assert!(err.is_parse());

    let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n", "zero").unwrap_err();
    assert!(err.is_parse());

    let err = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -4 1 2\n", "negative").unwrap_err();
    assert!(err.is_parse());
}

#[test]
fn should_skip_degenerate_faces() {
    let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2\nf 1 2 3\n";
    let mesh = parse_obj(text, "line").unwrap();

    assert_eq!(mesh.indices, vec![0, 1, 2]);
}

#[test]
fn should_capture_material_references() {
    let text = "mtllib city.mtl\nusemtl car_paint\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl other\nf 1 2 3\n";
    let mesh = parse_obj(text, "car").unwrap();

    assert_eq!(mesh.material_library.as_deref(), Some("city.mtl"));
    assert_eq!(mesh.material.as_deref(), Some("car_paint"));
}

#[test]
fn should_compute_normals_when_missing() {
    let mesh = parse_obj(TRIANGLE, "triangle").unwrap();

    for normal in mesh.vertex_normals() {
        assert_relative_eq!(normal[0], 0.0, epsilon = 1e-5);
        assert_relative_eq!(normal[1], 0.0, epsilon = 1e-5);
        assert_relative_eq!(normal[2], 1.0, epsilon = 1e-5);
    }
    assert_eq!(mesh.to_vertices().len(), 3);
}

#[tokio::test]
async fn should_load_inline_source() {
    let mesh = load_mesh(&AssetSource::Inline(TRIANGLE.to_string()), "inline")
        .await
        .unwrap();

    assert_eq!(mesh.vertex_count(), 3);
}

#[tokio::test]
async fn should_load_bundled_meshes() {
    let cube = load_mesh(&AssetSource::location("cube.obj"), "cube.obj")
        .await
        .unwrap();
    assert_eq!(cube.vertex_count(), 8);
    assert_eq!(cube.indices.len(), 36);

    let car = load_mesh(&AssetSource::location("car.obj"), "car.obj")
        .await
        .unwrap();
    assert_eq!(car.vertex_count(), 16);
    assert_eq!(car.triangle_count(), 22);
    assert_eq!(car.material.as_deref(), Some("car_paint"));
}

#[tokio::test]
async fn should_report_missing_files_as_fetch_errors() {
    let err = load_mesh(&AssetSource::location("does_not_exist.obj"), "missing")
        .await
        .unwrap_err();

    assert!(err.is_fetch());
}
