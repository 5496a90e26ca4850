//! Skeletal animation, side files and pose caching

use glam::Vec3;
use noggit_m2::backend::BufferUsage;
use noggit_m2::files::anim_path;
use noggit_m2::test_utils::{BoneSpec, Keys, ModelBuilder, SequenceSpec};
use noggit_m2::{DrawOptions, Model};
use pretty_assertions::assert_eq;

use crate::common::{
    MODEL_PATH, approx_eq, init_logging, instance_at, load, load_built, uploaded, wide_view,
};

/// Triangle whose bone rises two units over a one second clip
fn rising(sequence: SequenceSpec) -> ModelBuilder {
    ModelBuilder::triangle().sequence(sequence).with_bone(
        0,
        BoneSpec::root().translation(Keys::linear(&[
            (0, Vec3::ZERO),
            (1000, Vec3::new(0.0, 0.0, 2.0)),
        ])),
    )
}

fn tip(model: &Model) -> Vec3 {
    model.vertices()[1].position
}

#[test]
fn test_bone_animation_moves_vertices() {
    let mut model = load(&rising(SequenceSpec::embedded(0, 1000)));
    let flags = model.animation_flags();
    assert!(flags.animated && flags.geometry && flags.bones);
    assert!(!model.is_per_instance());

    model.animate(0, 500, &wide_view(0));
    assert!(approx_eq(tip(&model), Vec3::new(1.0, 1.0, 0.0)));
    // Bind pose is untouched
    assert_eq!(model.bind_vertices()[1].position, Vec3::X);

    model.animate(0, 0, &wide_view(0));
    assert!(approx_eq(tip(&model), Vec3::X));
}

#[test]
fn test_time_wraps_at_clip_length() {
    let mut model = load(&rising(SequenceSpec::embedded(0, 1000)));

    model.animate(0, 250, &wide_view(0));
    let early = tip(&model);
    model.animate(0, 3250, &wide_view(0));
    assert!(approx_eq(tip(&model), early));
    assert_eq!(model.current_time().time, 250);
    assert_eq!(model.current_time().global_time, 3250);
}

#[test]
fn test_unknown_animation_is_ignored() {
    let mut model = load(&rising(SequenceSpec::embedded(0, 1000)));
    model.animate(0, 500, &wide_view(0));
    let before = tip(&model);

    model.animate(7, 100, &wide_view(0));
    assert_eq!(tip(&model), before);
    assert_eq!(model.current_time().animation, 0);
}

#[test]
fn test_second_clip_uses_its_own_keys() {
    let builder = ModelBuilder::triangle()
        .sequence(SequenceSpec::embedded(0, 1000))
        .sequence(SequenceSpec::embedded(4, 1000))
        .with_bone(
            0,
            BoneSpec::root().translation(Keys::per_clip(&[
                &[(0, Vec3::ZERO)],
                &[(0, Vec3::new(3.0, 0.0, 0.0))],
            ])),
        );
    let mut model = load(&builder);

    model.animate(0, 10, &wide_view(0));
    assert!(approx_eq(tip(&model), Vec3::X));
    model.animate(1, 10, &wide_view(0));
    assert!(approx_eq(tip(&model), Vec3::new(4.0, 0.0, 0.0)));
}

#[test]
fn test_global_sequence_follows_absolute_time() {
    let builder = ModelBuilder::triangle()
        .global_sequence(100)
        .sequence(SequenceSpec::embedded(0, 1000))
        .with_bone(
            0,
            BoneSpec::root().translation(Keys::global(
                0,
                &[(0, Vec3::ZERO), (100, Vec3::new(10.0, 0.0, 0.0))],
            )),
        );
    let mut model = load(&builder);

    model.animate(0, 1050, &wide_view(0));
    // Global time 1050 wraps to 50 in a 100 ms sequence
    assert!(approx_eq(tip(&model), Vec3::new(6.0, 0.0, 0.0)));
}

#[test]
fn test_external_clip_reads_side_file() {
    let built = rising(SequenceSpec::external(0, 1000)).build();
    assert_eq!(built.anims.len(), 1);

    let mut model = load_built(&built);
    assert!(model.warnings().is_empty());
    model.animate(0, 500, &wide_view(0));
    assert!(approx_eq(tip(&model), Vec3::new(1.0, 1.0, 0.0)));
}

#[test]
fn test_missing_side_file_keeps_bind_pose() {
    init_logging();
    let built = rising(SequenceSpec::external(0, 1000)).build();
    let mut files = built.files(MODEL_PATH);
    files.remove(&anim_path(MODEL_PATH, 0, 0));

    let mut model = Model::load(MODEL_PATH, &built.m2, &files).unwrap();
    assert_eq!(model.warnings().len(), 1);
    assert!(model.warnings()[0].contains("0000-00.anim"));

    model.animate(0, 500, &wide_view(0));
    assert!(approx_eq(tip(&model), Vec3::X));
}

#[test]
fn test_animated_geometry_streams_once_per_frame() {
    let mut model = load(&rising(SequenceSpec::embedded(0, 1000)));
    let mut gfx = uploaded(&mut model);
    assert_eq!(gfx.vertex_buffers[0].usage, BufferUsage::Stream);
    let instances = [instance_at(1, 0.0), instance_at(2, 5.0)];
    let options = DrawOptions::default();

    model.draw(&mut gfx, &instances, &wide_view(1), 500, &options);
    assert_eq!(gfx.vertex_updates.len(), 1);
    assert!(approx_eq(gfx.vertex_updates[0].1[1].position, Vec3::new(1.0, 1.0, 0.0)));

    // Same frame and time: the cached pose is reused
    model.draw(&mut gfx, &instances, &wide_view(1), 500, &options);
    assert_eq!(gfx.vertex_updates.len(), 1);

    model.draw(&mut gfx, &instances, &wide_view(2), 500, &options);
    assert_eq!(gfx.vertex_updates.len(), 2);
    assert_eq!(gfx.draws.len(), 3);
}

#[test]
fn test_billboard_keeps_pose_per_instance() {
    let builder = ModelBuilder::triangle()
        .sequence(SequenceSpec::embedded(0, 1000))
        .with_bone(0, BoneSpec::root().billboard());
    let mut model = load(&builder);
    assert!(model.is_per_instance());

    let mut gfx = uploaded(&mut model);
    let instances = [instance_at(1, -5.0), instance_at(2, 5.0)];
    let stats = model.draw(&mut gfx, &instances, &wide_view(1), 0, &DrawOptions::default());

    // One draw per instance, each with its own skinned vertices
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(gfx.vertex_updates.len(), 2);
    assert!(gfx.draws.iter().all(|draw| draw.transforms.len() == 1));
    assert!(model.pose(Some(1)).is_some());
    assert!(model.pose(Some(2)).is_some());

    model.retain_instances(|id| id == 2);
    assert!(model.pose(Some(1)).is_none());
    assert!(model.pose(Some(2)).is_some());
}

#[test]
fn test_draw_drops_poses_of_removed_instances() {
    let builder = ModelBuilder::triangle()
        .sequence(SequenceSpec::embedded(0, 1000))
        .with_bone(0, BoneSpec::root().billboard());
    let mut model = load(&builder);
    let mut gfx = uploaded(&mut model);
    let options = DrawOptions::default();

    // A stream of short-lived placements keeps only the current ones
    for frame in 1..=50u32 {
        let instances = [instance_at(frame, -5.0), instance_at(1000 + frame, 5.0)];
        model.draw(&mut gfx, &instances, &wide_view(u64::from(frame)), 0, &options);
    }
    assert!(model.pose(Some(50)).is_some());
    assert!(model.pose(Some(1050)).is_some());
    assert!(model.pose(Some(49)).is_none());
    assert!(model.pose(Some(1)).is_none());

    model.draw(&mut gfx, &[], &wide_view(51), 0, &options);
    assert!(model.pose(Some(50)).is_none());
    assert!(model.pose(Some(1050)).is_none());
}
