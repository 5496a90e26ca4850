use std::cmp::Ordering;

use crate::chunks::M2Material;
use crate::render::blend::BlendMode;
use crate::render::shader::PixelShader;
use crate::skin::{SkinBatch, SkinSubmesh};

/// One draw of a submesh with one texture unit
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct RenderPass {
    pub flags: u8,
    pub priority_plane: i8,
    /// Derived shader id; holds the raw batch value until derivation runs
    pub shader_id: u16,
    pub submesh: u16,
    /// Index into the model's geoset visibility list
    pub geoset: u16,
    /// Color record, `None` when the batch has none
    pub color_index: Option<u16>,
    pub render_flag_index: u16,
    pub material_layer: u16,
    pub texture_count: u16,
    pub texture_combo_index: u16,
    pub texture_coord_combo_index: u16,
    pub transparency_combo_index: u16,
    pub texture_animation_combo_index: u16,
    pub index_start: u32,
    pub index_count: u32,
    pub vertex_start: u32,
    pub vertex_end: u32,
    pub blend_mode: BlendMode,
    /// Sort key within the opaque or translucent group
    pub ordering_key: f32,
    pub pixel_shader: PixelShader,
    /// Shares its geometry and shader with the preceding pass
    pub duplicate: bool,
}

impl RenderPass {
    pub fn from_batch(
        batch: &SkinBatch,
        submesh: &SkinSubmesh,
        material: &M2Material,
    ) -> Self {
        let vertex_start = u32::from(submesh.vertex_start);
        Self {
            flags: batch.flags,
            priority_plane: batch.priority_plane,
            shader_id: batch.shader_id,
            submesh: batch.submesh,
            geoset: batch.submesh,
            color_index: u16::try_from(batch.color_index).ok(),
            render_flag_index: batch.render_flag_index,
            material_layer: batch.material_layer,
            texture_count: batch.texture_count,
            texture_combo_index: batch.texture_combo_index,
            texture_coord_combo_index: batch.texture_coord_combo_index,
            transparency_combo_index: batch.transparency_combo_index,
            texture_animation_combo_index: batch.texture_animation_combo_index,
            index_start: submesh.first_index(),
            index_count: u32::from(submesh.index_count),
            vertex_start,
            vertex_end: vertex_start + u32::from(submesh.vertex_count),
            blend_mode: BlendMode::from_raw(material.blend_mode),
            ordering_key: submesh.center_position.x,
            pixel_shader: PixelShader::default(),
            duplicate: false,
        }
    }

    pub fn is_translucent(&self) -> bool {
        self.blend_mode.is_translucent()
    }

    fn draw_order(&self, other: &Self) -> Ordering {
        self.is_translucent()
            .cmp(&other.is_translucent())
            .then_with(|| self.ordering_key.total_cmp(&other.ordering_key))
            .then_with(|| self.blend_mode.cmp(&other.blend_mode))
    }
}

/// Stable sort: opaque before translucent, then ordering key, then blend mode
pub fn sort_passes(passes: &mut [RenderPass]) {
    passes.sort_by(RenderPass::draw_order);
}
