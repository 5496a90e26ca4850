//! Lights, the model camera and texture transforms

use glam::{Mat4, Vec3, Vec4};
use noggit_m2::test_utils::{CameraSpec, Keys, LightSpec, ModelBuilder, SequenceSpec};
use noggit_m2::{AnimationTime, DrawOptions};
use pretty_assertions::assert_eq;

use crate::common::{instance_at, load, uploaded, wide_view};

fn mat_eq(a: Mat4, b: Mat4) -> bool {
    a.abs_diff_eq(b, 1e-5)
}

#[test]
fn test_point_light_state() {
    let model = load(
        &ModelBuilder::triangle()
            .sequence(SequenceSpec::embedded(0, 1000))
            .light(LightSpec::point(0, Vec3::new(0.0, 0.0, 3.0), Vec3::new(1.0, 0.5, 0.25))),
    );

    assert_eq!(model.lights().len(), 1);
    let state = model.light_states()[0];
    assert_eq!(state.position, Vec4::new(0.0, 3.0, 0.0, 1.0));
    assert_eq!(state.diffuse, Vec4::new(1.0, 0.5, 0.25, 1.0));
    // No ambient keys
    assert_eq!(state.ambient, Vec4::new(0.0, 0.0, 0.0, 1.0));
}

#[test]
fn test_lights_reach_draw_calls() {
    let mut model = load(
        &ModelBuilder::triangle()
            .sequence(SequenceSpec::embedded(0, 1000))
            .light(LightSpec::point(0, Vec3::ZERO, Vec3::ONE)),
    );
    let mut gfx = uploaded(&mut model);
    model.draw(&mut gfx, &[instance_at(1, 0.0)], &wide_view(1), 0, &DrawOptions::default());

    assert_eq!(gfx.draws[0].lights, model.light_states().to_vec());
    assert_eq!(gfx.draws[0].lights.len(), 1);
}

#[test]
fn test_model_without_camera() {
    let model = load(&ModelBuilder::triangle());
    assert!(model.camera().is_none());
}

#[test]
fn test_camera_default_field_of_view() {
    let model = load(&ModelBuilder::triangle().camera(CameraSpec::new(
        Vec3::new(10.0, 0.0, 0.0),
        Vec3::ZERO,
    )));
    let camera = model.camera().expect("camera");
    assert_eq!(camera.position, Vec3::new(10.0, 0.0, 0.0));

    let (projection, view) = camera.matrices(1.5, AnimationTime::default());
    assert!(mat_eq(
        projection,
        Mat4::perspective_rh_gl(0.95 * 0.6, 1.5, 0.1, 100.0)
    ));
    assert!(mat_eq(
        view,
        Mat4::look_at_rh(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y)
    ));
}

#[test]
fn test_camera_field_of_view_keys() {
    let mut camera = CameraSpec::new(Vec3::new(0.0, -5.0, 0.0), Vec3::ZERO);
    camera.field_of_view = Keys::constant([0.8, 0.0, 0.0]);
    let model = load(
        &ModelBuilder::triangle()
            .sequence(SequenceSpec::embedded(0, 1000))
            .camera(camera),
    );

    let camera = model.camera().expect("camera");
    // File -Y is editor +Z
    assert_eq!(camera.position, Vec3::new(0.0, 0.0, 5.0));
    let (projection, _) = camera.matrices(1.0, AnimationTime::default());
    assert!(mat_eq(
        projection,
        Mat4::perspective_rh_gl(0.8 * 0.6, 1.0, 0.1, 100.0)
    ));
}

#[test]
fn test_texture_animation_matrix() {
    let mut builder = ModelBuilder::triangle().sequence(SequenceSpec::embedded(0, 1000));
    builder.texture_animations = vec![(
        Keys::linear(&[(0, Vec3::ZERO), (1000, Vec3::new(1.0, 0.0, 0.0))]),
        Keys::none(),
    )];
    builder.texture_animation_lookup = vec![0];
    let mut model = load(&builder);
    assert!(model.animation_flags().textures);
    assert_eq!(model.texture_animations().len(), 1);

    let mut gfx = uploaded(&mut model);
    model.draw(&mut gfx, &[instance_at(1, 0.0)], &wide_view(1), 250, &DrawOptions::default());

    let expected = Mat4::from_translation(Vec3::new(0.25, 0.0, 0.0));
    assert!(mat_eq(gfx.draws[0].texture_matrix, expected));
    assert!(mat_eq(model.texture_matrix(0), expected));
    assert_eq!(model.texture_matrix(5), Mat4::IDENTITY);
}
