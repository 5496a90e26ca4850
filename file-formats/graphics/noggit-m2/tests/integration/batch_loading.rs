//! Parallel loading from a directory tree

use std::fs;
use std::path::Path;

use noggit_m2::files::{anim_path, skin_path};
use noggit_m2::test_utils::{BuiltModel, ModelBuilder, SequenceSpec};
use noggit_m2::{DirectoryFiles, FileProvider, LoadOptions, load_model, load_models};

fn write(root: &Path, game_path: &str, data: &[u8]) {
    let path = game_path
        .split(['/', '\\'])
        .fold(root.to_path_buf(), |path, part| path.join(part));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
}

fn install(root: &Path, game_path: &str, built: &BuiltModel) {
    write(root, game_path, &built.m2);
    if let Some(skin) = &built.skin {
        write(root, &skin_path(game_path), skin);
    }
    for (id, sub_id, data) in &built.anims {
        write(root, &anim_path(game_path, *id, *sub_id), data);
    }
}

#[test]
fn test_load_from_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let built = ModelBuilder::triangle()
        .sequence(SequenceSpec::external(0, 1000))
        .build();
    install(temp_dir.path(), "World/Doodads/Crate.m2", &built);

    let files = DirectoryFiles::new(temp_dir.path());
    assert!(files.exists("World\\Doodads\\Crate00.skin"));

    let model = load_model("World\\Doodads\\Crate.m2", &files, &LoadOptions::default()).unwrap();
    assert_eq!(model.passes().len(), 1);
    assert_eq!(model.clips().len(), 1);
}

#[test]
fn test_parallel_batch() {
    let temp_dir = tempfile::tempdir().unwrap();
    let paths: Vec<String> = (0..8).map(|i| format!("World/Batch/Model{i}.m2")).collect();
    for path in &paths {
        install(temp_dir.path(), path, &ModelBuilder::triangle().build());
    }
    // Corrupt one of them
    write(temp_dir.path(), &paths[3], b"MD20\x08\x01");

    let files = DirectoryFiles::new(temp_dir.path());
    let models = load_models(&paths, &files, &LoadOptions::default());

    assert_eq!(models.len(), paths.len());
    for (index, (model, path)) in models.iter().zip(&paths).enumerate() {
        assert_eq!(model.path(), path);
        assert!(model.finished_loading());
        let expected = if index == 3 { 0 } else { 3 };
        assert_eq!(model.vertices().len(), expected);
    }
}
