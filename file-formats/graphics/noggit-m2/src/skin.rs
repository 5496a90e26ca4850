//! `.skin` level-of-detail files
//!
//! A skin file remaps the model's vertex table into an index list and splits
//! it into submeshes. Texture units (batches) pair a submesh with a material
//! and the textures used to draw it.

use bytes::Buf;
use glam::Vec3;

use crate::error::{LoadError, Result};
use crate::reader::{M2Array, Record, RecordReader};

/// Magic signature of a skin file
pub const SKIN_MAGIC: [u8; 4] = *b"SKIN";

/// Skin header (48 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinHeader {
    pub magic: [u8; 4],
    /// `u16` indices into the model vertex table
    pub vertex_lookup: M2Array,
    /// `u16` indices into `vertex_lookup`, three per triangle
    pub triangles: M2Array,
    pub bone_indices: M2Array,
    pub submeshes: M2Array,
    pub batches: M2Array,
    pub bone_count_max: u32,
}

impl Record for SkinHeader {
    const SIZE: usize = 48;

    fn read(buf: &mut &[u8]) -> Self {
        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);
        Self {
            magic,
            vertex_lookup: M2Array::read(buf),
            triangles: M2Array::read(buf),
            bone_indices: M2Array::read(buf),
            submeshes: M2Array::read(buf),
            batches: M2Array::read(buf),
            bone_count_max: buf.get_u32_le(),
        }
    }
}

/// Submesh record (48 bytes)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinSubmesh {
    pub id: u16,
    /// High 16 bits of `index_start` for large meshes
    pub level: u16,
    pub vertex_start: u16,
    pub vertex_count: u16,
    pub index_start: u16,
    pub index_count: u16,
    pub bone_count: u16,
    pub bone_combo_index: u16,
    pub bone_influences: u16,
    pub center_bone_index: u16,
    pub center_position: Vec3,
    pub sort_center_position: Vec3,
    pub sort_radius: f32,
}

impl SkinSubmesh {
    pub fn first_index(&self) -> u32 {
        u32::from(self.index_start) + (u32::from(self.level) << 16)
    }
}

impl Record for SkinSubmesh {
    const SIZE: usize = 48;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            id: buf.get_u16_le(),
            level: buf.get_u16_le(),
            vertex_start: buf.get_u16_le(),
            vertex_count: buf.get_u16_le(),
            index_start: buf.get_u16_le(),
            index_count: buf.get_u16_le(),
            bone_count: buf.get_u16_le(),
            bone_combo_index: buf.get_u16_le(),
            bone_influences: buf.get_u16_le(),
            center_bone_index: buf.get_u16_le(),
            center_position: Vec3::read(buf),
            sort_center_position: Vec3::read(buf),
            sort_radius: buf.get_f32_le(),
        }
    }
}

/// Texture unit record (24 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkinBatch {
    pub flags: u8,
    pub priority_plane: i8,
    /// Raw shader id, an index into the blend-override table when present
    pub shader_id: u16,
    pub submesh: u16,
    pub geoset_index: u16,
    pub color_index: i16,
    pub render_flag_index: u16,
    pub material_layer: u16,
    pub texture_count: u16,
    pub texture_combo_index: u16,
    pub texture_coord_combo_index: u16,
    pub transparency_combo_index: u16,
    pub texture_animation_combo_index: u16,
}

impl Record for SkinBatch {
    const SIZE: usize = 24;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            flags: buf.get_u8(),
            priority_plane: buf.get_i8(),
            shader_id: buf.get_u16_le(),
            submesh: buf.get_u16_le(),
            geoset_index: buf.get_u16_le(),
            color_index: buf.get_i16_le(),
            render_flag_index: buf.get_u16_le(),
            material_layer: buf.get_u16_le(),
            texture_count: buf.get_u16_le(),
            texture_combo_index: buf.get_u16_le(),
            texture_coord_combo_index: buf.get_u16_le(),
            transparency_combo_index: buf.get_u16_le(),
            texture_animation_combo_index: buf.get_u16_le(),
        }
    }
}

/// Parsed first level of detail
#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub vertex_lookup: Vec<u16>,
    pub triangles: Vec<u16>,
    pub submeshes: Vec<SkinSubmesh>,
    pub batches: Vec<SkinBatch>,
}

impl Skin {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let reader = RecordReader::new(data);
        let header: SkinHeader = reader.record(0, "skin header")?;

        if header.magic != SKIN_MAGIC {
            return Err(LoadError::InvalidMagic {
                expected: String::from_utf8_lossy(&SKIN_MAGIC).into_owned(),
                actual: String::from_utf8_lossy(&header.magic).into_owned(),
            });
        }

        Ok(Self {
            vertex_lookup: reader.array(header.vertex_lookup, "skin vertex lookup")?,
            triangles: reader.array(header.triangles, "skin triangles")?,
            submeshes: reader.array(header.submeshes, "skin submeshes")?,
            batches: reader.array(header.batches, "skin texture units")?,
        })
    }

    /// Resolve triangles into model vertex indices
    pub fn resolve_indices(&self, vertex_count: usize) -> Result<Vec<u16>> {
        self.triangles
            .iter()
            .map(|&triangle| {
                let vertex = *self.vertex_lookup.get(triangle as usize).ok_or_else(|| {
                    LoadError::corrupt(format!(
                        "skin triangle references lookup entry {triangle} of {}",
                        self.vertex_lookup.len()
                    ))
                })?;
                if vertex as usize >= vertex_count {
                    return Err(LoadError::corrupt(format!(
                        "skin references vertex {vertex} of {vertex_count}"
                    )));
                }
                Ok(vertex)
            })
            .collect()
    }
}
