//! Parsing models and their companion files

use glam::Vec3;
use noggit_m2::files::skin_path;
use noggit_m2::test_utils::ModelBuilder;
use noggit_m2::{LoadError, LoadOptions, Model, PixelShader};
use pretty_assertions::assert_eq;

use crate::common::{MODEL_PATH, approx_eq, init_logging, load};

#[test]
fn test_triangle_geometry_in_editor_coordinates() {
    let model = load(&ModelBuilder::triangle());

    assert!(model.finished_loading());
    assert!(!model.is_animated());
    assert!(model.warnings().is_empty());
    assert_eq!(model.indices(), &[0, 1, 2]);

    let positions: Vec<Vec3> = model.vertices().iter().map(|v| v.position).collect();
    assert_eq!(positions, vec![Vec3::ZERO, Vec3::X, Vec3::new(0.0, 0.0, -1.0)]);
    // File Z-up normals point along editor Y
    assert!(approx_eq(model.vertices()[0].normal, Vec3::Y));

    let bounds = model.bounding_box();
    assert_eq!(bounds.min, Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(bounds.max, Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn test_single_pass_from_skin() {
    let model = load(&ModelBuilder::triangle());

    assert_eq!(model.passes().len(), 1);
    let pass = &model.passes()[0];
    assert_eq!(pass.index_start, 0);
    assert_eq!(pass.index_count, 3);
    assert_eq!(pass.vertex_end, 3);
    assert_eq!(pass.color_index, None);
    assert_eq!(pass.pixel_shader, PixelShader::Opaque);
    assert_eq!(model.geoset_count(), 1);
}

#[test]
fn test_texture_names() {
    let model = load(&ModelBuilder::triangle());
    assert_eq!(model.textures().len(), 1);
    assert_eq!(model.textures()[0].filename, "world/generic/test.blp");
    assert!(!model.textures()[0].is_replaceable());
}

#[test]
fn test_replaceable_texture_uses_placeholder() {
    let mut builder = ModelBuilder::triangle();
    builder.textures = vec![(11, String::new())];
    let built = builder.build();
    let files = built.files(MODEL_PATH);

    let default = Model::load(MODEL_PATH, &built.m2, &files).unwrap();
    assert_eq!(default.textures()[0].filename, "tileset/generic/black.blp");

    let options = LoadOptions {
        placeholder_texture: "textures/white.blp".to_string(),
        ..LoadOptions::default()
    };
    let custom = Model::load_with(MODEL_PATH, &built.m2, &files, &options).unwrap();
    assert_eq!(custom.textures()[0].filename, "textures/white.blp");
    assert!(custom.textures()[0].is_replaceable());
}

#[test]
fn test_missing_skin_degrades_to_no_geometry() {
    init_logging();
    let built = ModelBuilder::triangle().build();
    let mut files = built.files(MODEL_PATH);
    files.remove(&skin_path(MODEL_PATH));

    let model = Model::load(MODEL_PATH, &built.m2, &files).unwrap();
    assert!(model.finished_loading());
    assert!(model.passes().is_empty());
    assert!(model.indices().is_empty());
    assert_eq!(model.warnings().len(), 1);
    assert!(model.warnings()[0].contains("00.skin"));
}

#[test]
fn test_wrong_magic() {
    let mut builder = ModelBuilder::triangle();
    builder.magic = *b"MD21";
    let built = builder.build();
    let result = Model::load(MODEL_PATH, &built.m2, &built.files(MODEL_PATH));
    assert!(matches!(result, Err(LoadError::InvalidMagic { .. })));
}

#[test]
fn test_old_version_is_unsupported() {
    let mut builder = ModelBuilder::triangle();
    builder.version = 256;
    let built = builder.build();
    let result = Model::load(MODEL_PATH, &built.m2, &built.files(MODEL_PATH));
    assert_eq!(result.unwrap_err(), LoadError::UnsupportedVersion(256));
}

#[test]
fn test_vertex_weighted_to_missing_bone() {
    let mut builder = ModelBuilder::triangle();
    builder.bones.clear();
    let built = builder.build();
    let result = Model::load(MODEL_PATH, &built.m2, &built.files(MODEL_PATH));
    assert!(matches!(result, Err(LoadError::CorruptModelData(_))));
}

#[test]
fn test_submesh_past_the_index_list() {
    let mut builder = ModelBuilder::triangle();
    if let Some(skin) = builder.skin.as_mut() {
        skin.submeshes[0].index_count = 6;
    }
    let built = builder.build();
    let result = Model::load(MODEL_PATH, &built.m2, &built.files(MODEL_PATH));
    assert!(matches!(result, Err(LoadError::CorruptModelData(_))));
}

#[test]
fn test_batch_with_unknown_render_flag() {
    let mut builder = ModelBuilder::triangle();
    if let Some(skin) = builder.skin.as_mut() {
        skin.batches[0].render_flag_index = 4;
    }
    let built = builder.build();
    let result = Model::load(MODEL_PATH, &built.m2, &built.files(MODEL_PATH));
    assert!(matches!(result, Err(LoadError::CorruptModelData(_))));
}

#[test]
fn test_load_or_empty_recovers() {
    init_logging();
    let built = ModelBuilder::triangle().build();
    let files = built.files(MODEL_PATH);

    let model = Model::load_or_empty(MODEL_PATH, &built.m2[..64], &files, &LoadOptions::default());
    assert!(model.finished_loading());
    assert!(model.vertices().is_empty());
    assert_eq!(model.path(), MODEL_PATH);
}
