use bytes::Buf;
use glam::Vec3;

use crate::chunks::track::M2Track;
use crate::reader::{M2Array, Record};

/// Ribbon emitter record (176 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct M2RibbonEmitter {
    pub id: i32,
    pub bone: i32,
    pub position: Vec3,
    /// `u16` indices into the texture table
    pub textures: M2Array,
    /// `u16` indices into the render flag table
    pub materials: M2Array,
    pub color: M2Track,
    /// Fixed16 keys
    pub alpha: M2Track,
    pub height_above: M2Track,
    pub height_below: M2Track,
    pub edges_per_second: f32,
    pub edge_lifetime: f32,
    pub gravity: f32,
    pub texture_rows: u16,
    pub texture_columns: u16,
    /// `u16` keys
    pub texture_slot: M2Track,
    /// `u8` keys
    pub visibility: M2Track,
    pub priority_plane: i16,
}

impl Record for M2RibbonEmitter {
    const SIZE: usize = 176;

    fn read(buf: &mut &[u8]) -> Self {
        let emitter = Self {
            id: buf.get_i32_le(),
            bone: buf.get_i32_le(),
            position: Vec3::read(buf),
            textures: M2Array::read(buf),
            materials: M2Array::read(buf),
            color: M2Track::read(buf),
            alpha: M2Track::read(buf),
            height_above: M2Track::read(buf),
            height_below: M2Track::read(buf),
            edges_per_second: buf.get_f32_le(),
            edge_lifetime: buf.get_f32_le(),
            gravity: buf.get_f32_le(),
            texture_rows: buf.get_u16_le(),
            texture_columns: buf.get_u16_le(),
            texture_slot: M2Track::read(buf),
            visibility: M2Track::read(buf),
            priority_plane: buf.get_i16_le(),
        };
        buf.advance(2);
        emitter
    }
}
