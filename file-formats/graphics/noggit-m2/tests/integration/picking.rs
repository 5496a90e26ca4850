//! Ray picking against posed geometry

use glam::Vec3;
use noggit_m2::test_utils::{BoneSpec, Keys, ModelBuilder, SequenceSpec};
use noggit_m2::{DrawOptions, Ray};

use crate::common::{instance_at, load, uploaded, wide_view};

fn down_at(x: f32, z: f32) -> Ray {
    Ray::new(Vec3::new(x, 5.0, z), Vec3::NEG_Y)
}

#[test]
fn test_hit_distance() {
    let mut model = load(&ModelBuilder::triangle());
    let hits = model.intersect(&down_at(0.25, -0.25), 0, &wide_view(0));
    assert_eq!(hits.len(), 1);
    assert!((hits[0] - 5.0).abs() < 1e-4);
}

#[test]
fn test_miss() {
    let mut model = load(&ModelBuilder::triangle());
    assert!(model.intersect(&down_at(2.0, 2.0), 0, &wide_view(0)).is_empty());
    // Pointing away from the triangle
    let up = Ray::new(Vec3::new(0.25, 5.0, -0.25), Vec3::Y);
    assert!(model.intersect(&up, 0, &wide_view(0)).is_empty());
}

#[test]
fn test_pending_model_has_no_hits() {
    let mut model = noggit_m2::Model::pending("world/loading.m2");
    assert!(model.intersect(&down_at(0.25, -0.25), 0, &wide_view(0)).is_empty());
}

#[test]
fn test_picking_uses_animated_pose() {
    let builder = ModelBuilder::triangle()
        .sequence(SequenceSpec::embedded(0, 1000))
        .with_bone(
            0,
            BoneSpec::root().translation(Keys::linear(&[
                (0, Vec3::ZERO),
                (1000, Vec3::new(0.0, 0.0, 2.0)),
            ])),
        );
    let mut model = load(&builder);

    let hits = model.intersect(&down_at(0.25, -0.25), 500, &wide_view(0));
    assert_eq!(hits.len(), 1);
    assert!((hits[0] - 4.0).abs() < 1e-4);
}

#[test]
fn test_picking_forces_next_draw_to_animate() {
    let builder = ModelBuilder::triangle()
        .sequence(SequenceSpec::embedded(0, 1000))
        .with_bone(
            0,
            BoneSpec::root().translation(Keys::linear(&[
                (0, Vec3::ZERO),
                (1000, Vec3::new(0.0, 0.0, 2.0)),
            ])),
        );
    let mut model = load(&builder);
    let mut gfx = uploaded(&mut model);
    let instances = [instance_at(1, 0.0)];

    model.draw(&mut gfx, &instances, &wide_view(1), 0, &DrawOptions::default());
    assert_eq!(gfx.vertex_updates.len(), 1);

    model.intersect(&down_at(0.25, -0.25), 500, &wide_view(1));
    model.draw(&mut gfx, &instances, &wide_view(1), 0, &DrawOptions::default());
    assert_eq!(gfx.vertex_updates.len(), 2);
    // The redraw restored the frame's pose
    assert!((gfx.vertex_updates[1].1[1].position - Vec3::X).length() < 1e-4);
}
