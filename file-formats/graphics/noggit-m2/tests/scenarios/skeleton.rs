//! Track sampling and bone hierarchies through the public API

use glam::Vec3;
use noggit_m2::animation::{Bone, BoneHierarchy, Interpolation};
use noggit_m2::{AnimationTime, AnimationTrack, BillboardBasis, BonePose};

fn stepped() -> AnimationTrack<f32> {
    AnimationTrack::new(Interpolation::Linear, None).with_keys(
        Some(1000),
        &[(0, 1.0), (500, 3.0), (1000, 5.0)],
    )
}

fn offset(parent: Option<usize>, by: Vec3) -> Bone {
    let mut bone = Bone::new(parent, Vec3::ZERO);
    bone.translation =
        AnimationTrack::new(Interpolation::Linear, None).with_keys(Some(100), &[(0, by)]);
    bone
}

fn origins(hierarchy: &BoneHierarchy) -> Vec<Vec3> {
    let mut pose = BonePose::default();
    hierarchy.compute(AnimationTime::default(), &BillboardBasis::IDENTITY, &mut pose);
    (0..hierarchy.len())
        .map(|index| pose.world(index).transform_point3(Vec3::ZERO))
        .collect()
}

#[test]
fn test_exact_keyframe_values() {
    let track = stepped();
    assert_eq!(track.value_at(0, 0, 0), Some(1.0));
    assert_eq!(track.value_at(0, 500, 500), Some(3.0));
    assert_eq!(track.value_at(0, 250, 250), Some(2.0));
}

#[test]
fn test_sampling_is_periodic() {
    let track = stepped();
    for time in [0, 125, 499, 750] {
        assert_eq!(track.value_at(0, time, 0), track.value_at(0, time + 1000, 0));
    }
}

#[test]
fn test_parent_order_does_not_matter() {
    // Child listed before its parent
    let child_first = BoneHierarchy::new(vec![offset(Some(1), Vec3::X), offset(None, Vec3::Y)]);
    let parent_first = BoneHierarchy::new(vec![offset(None, Vec3::Y), offset(Some(0), Vec3::X)]);

    let a = origins(&child_first);
    let b = origins(&parent_first);
    assert!((a[0] - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    assert!((a[0] - b[1]).length() < 1e-5);
    assert!((a[1] - b[0]).length() < 1e-5);
}

#[test]
fn test_parent_cycle_terminates() {
    let hierarchy = BoneHierarchy::new(vec![offset(Some(1), Vec3::X), offset(Some(0), Vec3::Y)]);
    assert_eq!(hierarchy.cyclic_bones(), vec![0, 1]);

    let origins = origins(&hierarchy);
    assert_eq!(origins.len(), 2);
    assert!(origins.iter().all(|origin| origin.is_finite()));
}
