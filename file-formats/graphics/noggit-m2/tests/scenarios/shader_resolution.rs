//! Shader ids as seen through a loaded model

use noggit_m2::skin::SkinBatch;
use noggit_m2::test_utils::{ModelBuilder, SkinSpec};
use noggit_m2::{BlendMode, DrawOptions, PixelShader};
use pretty_assertions::assert_eq;

use crate::common::{instance_at, load, uploaded, wide_view};

#[test]
fn test_single_texture_opaque() {
    let model = load(&ModelBuilder::triangle());
    let pass = &model.passes()[0];

    assert_eq!(pass.blend_mode, BlendMode::Opaque);
    assert_eq!(pass.pixel_shader, PixelShader::Opaque);
    assert_ne!(pass.shader_id & 0x4000, 0);
    assert_eq!(pass.shader_id & 0x70, 0);
}

#[test]
fn test_blended_single_texture() {
    let mut builder = ModelBuilder::triangle();
    builder.materials[0].blend_mode = 2;
    let model = load(&builder);
    let pass = &model.passes()[0];

    assert_eq!(pass.shader_id, 0x4010);
    assert_eq!(pass.pixel_shader, PixelShader::Mod);
    assert_eq!(pass.blend_mode, BlendMode::Alpha);
}

#[test]
fn test_blend_override_table() {
    let mut builder = ModelBuilder::triangle().blend_override(vec![3]);
    builder.materials[0].blend_mode = 2;
    let model = load(&builder);
    let pass = &model.passes()[0];

    assert_eq!(pass.shader_id, 0x30);
    assert_eq!(pass.pixel_shader, PixelShader::Mod);
}

#[test]
fn test_derivation_is_repeatable() {
    let mut builder = ModelBuilder::triangle();
    builder.materials[0].blend_mode = 1;
    let first = load(&builder);
    let second = load(&builder);

    let ids = |model: &noggit_m2::Model| -> Vec<(u16, PixelShader)> {
        model
            .passes()
            .iter()
            .map(|pass| (pass.shader_id, pass.pixel_shader))
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn test_repeated_render_flag_becomes_duplicate() {
    let builder = ModelBuilder::triangle().batch(SkinBatch {
        material_layer: 1,
        ..SkinSpec::batch(0)
    });
    let mut model = load(&builder);

    let passes = model.passes();
    assert_eq!(passes.len(), 2);
    assert_eq!(passes.iter().filter(|pass| pass.duplicate).count(), 1);
    assert_eq!(passes[0].shader_id, passes[1].shader_id);
    assert_eq!(passes[0].index_start, passes[1].index_start);
    assert_eq!(passes[0].index_count, passes[1].index_count);

    // Both are still drawn
    let mut gfx = uploaded(&mut model);
    let stats = model.draw(&mut gfx, &[instance_at(1, 0.0)], &wide_view(1), 0, &DrawOptions::default());
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(gfx.draws.len(), 2);
}
