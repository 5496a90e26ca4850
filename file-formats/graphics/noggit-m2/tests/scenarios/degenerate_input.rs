//! Zero-length clips and truncated files

use noggit_m2::test_utils::{BoneSpec, Keys, ModelBuilder, SequenceSpec};
use noggit_m2::{LoadError, LoadOptions, Model};

use crate::common::{MODEL_PATH, init_logging, load, wide_view};

#[test]
fn test_zero_length_clip_loops_on_one_frame() {
    let builder = ModelBuilder::triangle()
        .sequence(SequenceSpec::embedded(0, 0))
        .with_bone(
            0,
            BoneSpec::root().translation(Keys::linear(&[(0, glam::Vec3::ZERO)])),
        );
    let mut model = load(&builder);
    assert_eq!(model.clips()[0].length, 1);

    model.animate(0, u32::MAX, &wide_view(0));
    assert_eq!(model.current_time().time, 0);
    assert_eq!(model.current_time().global_time, u32::MAX);
}

#[test]
fn test_truncated_header() {
    init_logging();
    let built = ModelBuilder::triangle().build();
    let files = built.files(MODEL_PATH);

    let result = Model::load(MODEL_PATH, &built.m2[..32], &files);
    assert!(matches!(result, Err(LoadError::Truncated { .. })));

    let model = Model::load_or_empty(MODEL_PATH, &built.m2[..32], &files, &LoadOptions::default());
    assert!(model.finished_loading());
    assert!(model.vertices().is_empty());
    assert!(model.passes().is_empty());
    assert!(model.clips().is_empty());
}

#[test]
fn test_empty_input() {
    let result = Model::load(MODEL_PATH, &[], &noggit_m2::MemoryFiles::new());
    assert!(matches!(result, Err(LoadError::Truncated { .. })));
}
