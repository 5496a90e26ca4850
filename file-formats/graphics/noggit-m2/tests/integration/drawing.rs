//! Upload, culling and draw-call contents

use glam::{Mat4, Vec3, Vec4};
use noggit_m2::backend::BufferUsage;
use noggit_m2::chunks::M2RenderFlags;
use noggit_m2::model::BOX_LINE_INDICES;
use noggit_m2::render::{BlendFactor, BlendState};
use noggit_m2::test_utils::{ColorSpec, Keys, ModelBuilder, RecordingBackend};
use noggit_m2::{DrawOptions, Model, PixelShader, TextureHandle};
use pretty_assertions::assert_eq;
use test_case::test_case;

use crate::common::{instance_at, load, uploaded, wide_view};

fn draw_one(model: &mut Model, gfx: &mut RecordingBackend) -> noggit_m2::DrawStats {
    model.draw(
        gfx,
        &[instance_at(1, 0.0)],
        &wide_view(1),
        0,
        &DrawOptions::default(),
    )
}

#[test]
fn test_pending_model_draws_nothing() {
    let mut model = Model::pending("world/loading.m2");
    let mut gfx = RecordingBackend::new();
    let stats = draw_one(&mut model, &mut gfx);

    assert_eq!(stats, noggit_m2::DrawStats::default());
    assert!(gfx.vertex_buffers.is_empty());
}

#[test]
fn test_first_draw_only_uploads() {
    let mut model = load(&ModelBuilder::triangle());
    let mut gfx = RecordingBackend::new();
    let stats = draw_one(&mut model, &mut gfx);

    assert!(stats.uploaded);
    assert_eq!(stats.draw_calls, 0);
    assert!(gfx.draws.is_empty());
    assert!(model.is_uploaded());

    assert_eq!(gfx.requested_textures, vec!["world/generic/test.blp".to_string()]);
    assert_eq!(gfx.vertex_buffers.len(), 1);
    assert_eq!(gfx.vertex_buffers[0].usage, BufferUsage::Static);
    assert_eq!(gfx.vertex_buffers[0].vertices.len(), 3);
    assert_eq!(gfx.index_buffers[0].1, vec![0, 1, 2]);
    assert_eq!(gfx.point_buffers[0].1, model.box_points().to_vec());
}

#[test]
fn test_opaque_pass_draw_call() {
    let mut model = load(&ModelBuilder::triangle());
    let mut gfx = uploaded(&mut model);
    let stats = draw_one(&mut model, &mut gfx);

    assert_eq!(stats.visible_instances, 1);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.skipped_passes, 0);

    let draw = &gfx.draws[0];
    assert_eq!(draw.vertex_buffer, gfx.vertex_buffers[0].handle);
    assert_eq!(draw.index_buffer, gfx.index_buffers[0].0);
    assert_eq!((draw.index_start, draw.index_count), (0, 3));
    assert_eq!(draw.pixel_shader, PixelShader::Opaque);
    assert_eq!(draw.blend, BlendState::Disabled);
    assert_eq!(draw.alpha_test, None);
    assert_eq!(draw.diffuse, Vec4::ONE);
    assert_eq!(draw.emissive, Vec4::ZERO);
    assert_eq!(draw.texture_matrix, Mat4::IDENTITY);
    assert_eq!(draw.textures.len(), 1);
    assert_ne!(draw.textures[0], TextureHandle::default());
    assert!(draw.cull_faces && draw.depth_write && draw.fog && draw.lighting);
    assert_eq!(draw.transforms, vec![Mat4::IDENTITY]);
}

#[test]
fn test_instances_share_one_draw_call() {
    let mut model = load(&ModelBuilder::triangle());
    let mut gfx = uploaded(&mut model);
    let instances = [instance_at(1, -10.0), instance_at(2, 10.0), instance_at(3, 500.0)];
    let stats = model.draw(&mut gfx, &instances, &wide_view(1), 0, &DrawOptions::default());

    // The third instance is outside the view volume
    assert_eq!(stats.visible_instances, 2);
    assert_eq!(gfx.draws.len(), 1);
    assert_eq!(
        gfx.draws[0].transforms,
        vec![instances[0].transform, instances[1].transform]
    );
}

#[test]
fn test_fully_culled_draws_nothing() {
    let mut model = load(&ModelBuilder::triangle());
    let mut gfx = uploaded(&mut model);
    let stats = model.draw(
        &mut gfx,
        &[instance_at(1, -500.0)],
        &wide_view(1),
        0,
        &DrawOptions::default(),
    );
    assert_eq!(stats.visible_instances, 0);
    assert!(gfx.draws.is_empty());
}

#[test_case(1, BlendState::Disabled, true ; "alpha key")]
#[test_case(2, BlendState::Enabled { src: BlendFactor::SrcAlpha, dst: BlendFactor::OneMinusSrcAlpha }, false ; "alpha")]
#[test_case(3, BlendState::Enabled { src: BlendFactor::SrcAlpha, dst: BlendFactor::One }, false ; "additive")]
#[test_case(5, BlendState::Enabled { src: BlendFactor::DstColor, dst: BlendFactor::SrcColor }, true ; "modulate")]
fn test_blend_state_of_material(blend_mode: u16, expected: BlendState, alpha_tested: bool) {
    let mut builder = ModelBuilder::triangle();
    builder.materials[0].blend_mode = blend_mode;
    let mut model = load(&builder);
    let mut gfx = uploaded(&mut model);
    draw_one(&mut model, &mut gfx);

    assert_eq!(gfx.draws[0].blend, expected);
    assert_eq!(gfx.draws[0].alpha_test.is_some(), alpha_tested);
    assert_eq!(gfx.draws[0].pixel_shader, PixelShader::Mod);
}

#[test]
fn test_render_flags() {
    let mut builder = ModelBuilder::triangle();
    builder.materials[0].flags =
        M2RenderFlags::UNLIT | M2RenderFlags::TWO_SIDED | M2RenderFlags::NO_DEPTH_WRITE;
    let mut model = load(&builder);
    let mut gfx = uploaded(&mut model);
    draw_one(&mut model, &mut gfx);

    let draw = &gfx.draws[0];
    assert!(!draw.lighting);
    assert!(!draw.cull_faces);
    assert!(!draw.depth_write);
    assert!(draw.fog);
}

#[test]
fn test_fog_option_and_unfogged_flag() {
    let mut builder = ModelBuilder::triangle();
    builder.materials[0].flags = M2RenderFlags::UNFOGGED;
    let mut model = load(&builder);
    let mut gfx = uploaded(&mut model);
    draw_one(&mut model, &mut gfx);
    assert!(!gfx.draws[0].fog);

    let mut model = load(&ModelBuilder::triangle());
    let mut gfx = uploaded(&mut model);
    let options = DrawOptions {
        fog: false,
        ..DrawOptions::default()
    };
    model.draw(&mut gfx, &[instance_at(1, 0.0)], &wide_view(1), 0, &options);
    assert!(!gfx.draws[0].fog);
}

#[test]
fn test_hidden_geoset_is_skipped() {
    let mut model = load(&ModelBuilder::triangle());
    let mut gfx = uploaded(&mut model);
    model.set_geoset_visible(0, false);
    let stats = draw_one(&mut model, &mut gfx);

    assert_eq!(stats.skipped_passes, 1);
    assert_eq!(stats.draw_calls, 0);
    assert!(gfx.draws.is_empty());
}

#[test]
fn test_zero_transparency_is_skipped() {
    let mut builder = ModelBuilder::triangle();
    builder.transparencies = vec![Keys::constant(0i16)];
    let mut model = load(&builder);
    let mut gfx = uploaded(&mut model);
    let stats = draw_one(&mut model, &mut gfx);

    assert_eq!(stats.skipped_passes, 1);
    assert!(gfx.draws.is_empty());
}

#[test]
fn test_half_transparency_scales_alpha() {
    let mut builder = ModelBuilder::triangle();
    builder.transparencies = vec![Keys::constant(i16::MAX / 2)];
    let mut model = load(&builder);
    let mut gfx = uploaded(&mut model);
    draw_one(&mut model, &mut gfx);

    assert!((gfx.draws[0].diffuse.w - 0.5).abs() < 1e-3);
}

#[test]
fn test_model_alpha_multiplies_into_passes() {
    let mut model = load(&ModelBuilder::triangle());
    let mut gfx = uploaded(&mut model);
    model.set_alpha(0.25);
    draw_one(&mut model, &mut gfx);
    assert_eq!(gfx.draws[0].diffuse.w, 0.25);
}

fn colored(unlit: bool) -> ModelBuilder {
    let mut builder = ModelBuilder::triangle().color(ColorSpec {
        color: Keys::constant(Vec3::new(0.5, 0.25, 1.0)),
        opacity: Keys::constant(i16::MAX),
    });
    if unlit {
        builder.materials[0].flags = M2RenderFlags::UNLIT;
    }
    if let Some(skin) = builder.skin.as_mut() {
        skin.batches[0].color_index = 0;
    }
    builder
}

#[test]
fn test_lit_color_goes_to_emissive() {
    let mut model = load(&colored(false));
    let mut gfx = uploaded(&mut model);
    draw_one(&mut model, &mut gfx);

    let draw = &gfx.draws[0];
    assert_eq!(draw.diffuse, Vec4::new(0.0, 0.0, 0.0, 1.0));
    assert_eq!(draw.emissive, Vec4::new(0.5, 0.25, 1.0, 1.0));
}

#[test]
fn test_unlit_color_goes_to_diffuse() {
    let mut model = load(&colored(true));
    let mut gfx = uploaded(&mut model);
    draw_one(&mut model, &mut gfx);

    assert_eq!(gfx.draws[0].diffuse, Vec4::new(0.5, 0.25, 1.0, 1.0));
}

#[test]
fn test_transparent_color_is_skipped() {
    let mut builder = colored(false);
    builder.colors[0].opacity = Keys::constant(0i16);
    let mut model = load(&builder);
    let mut gfx = uploaded(&mut model);
    let stats = draw_one(&mut model, &mut gfx);
    assert_eq!(stats.skipped_passes, 1);
}

#[test]
fn test_draw_boxes() {
    let mut model = load(&ModelBuilder::triangle());
    let mut gfx = RecordingBackend::new();

    // Nothing to draw before upload
    model.draw_boxes(&mut gfx, &[Mat4::IDENTITY], Vec4::ONE);
    assert!(gfx.boxes.is_empty());

    let mut gfx = uploaded(&mut model);
    let color = Vec4::new(1.0, 1.0, 0.0, 1.0);
    model.draw_boxes(&mut gfx, &[Mat4::IDENTITY, Mat4::from_scale(Vec3::splat(2.0))], color);

    assert_eq!(gfx.boxes.len(), 1);
    assert_eq!(gfx.boxes[0].vertex_buffer, gfx.point_buffers[0].0);
    assert_eq!(gfx.boxes[0].indices, BOX_LINE_INDICES.to_vec());
    assert_eq!(gfx.boxes[0].transforms.len(), 2);
    assert_eq!(gfx.boxes[0].color, color);
}

#[test]
fn test_release_then_upload_again() {
    let mut model = load(&ModelBuilder::triangle());
    let mut gfx = uploaded(&mut model);
    draw_one(&mut model, &mut gfx);
    let texture = gfx.draws[0].textures[0];

    model.release(&mut gfx);
    assert!(!model.is_uploaded());
    assert_eq!(gfx.deleted_buffers.len(), 3);
    assert_eq!(gfx.released_textures, vec![texture]);

    // Releasing twice is harmless
    model.release(&mut gfx);
    assert_eq!(gfx.deleted_buffers.len(), 3);

    let stats = draw_one(&mut model, &mut gfx);
    assert!(stats.uploaded);
    assert_eq!(gfx.vertex_buffers.len(), 2);
}
