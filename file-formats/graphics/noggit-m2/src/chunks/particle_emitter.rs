use bitflags::bitflags;
use bytes::Buf;
use glam::{Vec2, Vec3};

use crate::chunks::track::{M2FakeTrack, M2Track};
use crate::reader::{M2Array, Record};

bitflags! {
    /// Particle emitter flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct M2ParticleFlags: u32 {
        /// Sphere emitters launch along the bone's Y axis
        const BONE_DIRECTION = 0x0000_0100;
        /// Lit by scene lights
        const LIGHTING = 0x0000_0400;
        /// Quads keep the emitter orientation instead of facing the camera
        const NOT_BILLBOARDED = 0x0000_1000;
    }
}

/// Emitter shape identifiers
pub mod emitter_type {
    pub const PLANE: u8 = 1;
    pub const SPHERE: u8 = 2;
    pub const SPLINE: u8 = 3;
}

/// Particle emitter record (476 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct M2ParticleEmitter {
    pub id: i32,
    pub flags: M2ParticleFlags,
    pub position: Vec3,
    pub bone: u16,
    pub texture: u16,
    pub geometry_model: M2Array,
    pub recursion_model: M2Array,
    pub blend_mode: u8,
    pub emitter_type: u8,
    pub color_index: u16,
    pub particle_type: u8,
    pub head_or_tail: u8,
    pub texture_tile_rotation: u16,
    pub texture_rows: u16,
    pub texture_columns: u16,
    pub emission_speed: M2Track,
    pub speed_variation: M2Track,
    pub vertical_range: M2Track,
    pub horizontal_range: M2Track,
    pub gravity: M2Track,
    pub lifespan: M2Track,
    pub lifespan_variation: f32,
    pub emission_rate: M2Track,
    pub emission_rate_variation: f32,
    pub emission_area_length: M2Track,
    pub emission_area_width: M2Track,
    pub z_source: M2Track,
    /// `Vec3` colors in 0..255
    pub color: M2FakeTrack,
    /// Fixed16 alpha
    pub alpha: M2FakeTrack,
    /// `Vec2` sizes
    pub scale: M2FakeTrack,
    pub scale_variation: Vec2,
    pub head_cell: M2FakeTrack,
    pub tail_cell: M2FakeTrack,
    pub tail_length: f32,
    pub twinkle_speed: f32,
    pub twinkle_percent: f32,
    pub twinkle_scale: Vec2,
    pub burst_multiplier: f32,
    pub drag: f32,
    pub base_spin: f32,
    pub base_spin_variation: f32,
    pub spin: f32,
    pub spin_variation: f32,
    pub tumble_min: Vec3,
    pub tumble_max: Vec3,
    pub wind_vector: Vec3,
    pub wind_time: f32,
    /// `(speed, scale)` pairs
    pub follow: [(f32, f32); 2],
    pub spline_points: M2Array,
    /// `u8` keys
    pub enabled: M2Track,
}

impl M2ParticleEmitter {
    pub fn is_billboarded(&self) -> bool {
        !self.flags.contains(M2ParticleFlags::NOT_BILLBOARDED)
    }
}

impl Record for M2ParticleEmitter {
    const SIZE: usize = 476;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            id: buf.get_i32_le(),
            flags: M2ParticleFlags::from_bits_retain(buf.get_u32_le()),
            position: Vec3::read(buf),
            bone: buf.get_u16_le(),
            texture: buf.get_u16_le(),
            geometry_model: M2Array::read(buf),
            recursion_model: M2Array::read(buf),
            blend_mode: buf.get_u8(),
            emitter_type: buf.get_u8(),
            color_index: buf.get_u16_le(),
            particle_type: buf.get_u8(),
            head_or_tail: buf.get_u8(),
            texture_tile_rotation: buf.get_u16_le(),
            texture_rows: buf.get_u16_le(),
            texture_columns: buf.get_u16_le(),
            emission_speed: M2Track::read(buf),
            speed_variation: M2Track::read(buf),
            vertical_range: M2Track::read(buf),
            horizontal_range: M2Track::read(buf),
            gravity: M2Track::read(buf),
            lifespan: M2Track::read(buf),
            lifespan_variation: buf.get_f32_le(),
            emission_rate: M2Track::read(buf),
            emission_rate_variation: buf.get_f32_le(),
            emission_area_length: M2Track::read(buf),
            emission_area_width: M2Track::read(buf),
            z_source: M2Track::read(buf),
            color: M2FakeTrack::read(buf),
            alpha: M2FakeTrack::read(buf),
            scale: M2FakeTrack::read(buf),
            scale_variation: Vec2::read(buf),
            head_cell: M2FakeTrack::read(buf),
            tail_cell: M2FakeTrack::read(buf),
            tail_length: buf.get_f32_le(),
            twinkle_speed: buf.get_f32_le(),
            twinkle_percent: buf.get_f32_le(),
            twinkle_scale: Vec2::read(buf),
            burst_multiplier: buf.get_f32_le(),
            drag: buf.get_f32_le(),
            base_spin: buf.get_f32_le(),
            base_spin_variation: buf.get_f32_le(),
            spin: buf.get_f32_le(),
            spin_variation: buf.get_f32_le(),
            tumble_min: Vec3::read(buf),
            tumble_max: Vec3::read(buf),
            wind_vector: Vec3::read(buf),
            wind_time: buf.get_f32_le(),
            follow: [
                (buf.get_f32_le(), buf.get_f32_le()),
                (buf.get_f32_le(), buf.get_f32_le()),
            ],
            spline_points: M2Array::read(buf),
            enabled: M2Track::read(buf),
        }
    }
}
