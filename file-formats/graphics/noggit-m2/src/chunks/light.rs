use bytes::Buf;
use glam::Vec3;

use crate::chunks::track::M2Track;
use crate::reader::Record;

/// Light kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum M2LightType {
    Directional,
    Point,
}

impl M2LightType {
    pub fn from_raw(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::Directional),
            1 => Some(Self::Point),
            _ => None,
        }
    }
}

/// Light record (156 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct M2Light {
    pub light_type: u16,
    /// Attachment bone, -1 when unattached
    pub bone: i16,
    pub position: Vec3,
    pub ambient_color: M2Track,
    pub ambient_intensity: M2Track,
    pub diffuse_color: M2Track,
    pub diffuse_intensity: M2Track,
    pub attenuation_start: M2Track,
    pub attenuation_end: M2Track,
    /// `u8` keys
    pub visibility: M2Track,
}

impl Record for M2Light {
    const SIZE: usize = 156;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            light_type: buf.get_u16_le(),
            bone: buf.get_i16_le(),
            position: Vec3::read(buf),
            ambient_color: M2Track::read(buf),
            ambient_intensity: M2Track::read(buf),
            diffuse_color: M2Track::read(buf),
            diffuse_intensity: M2Track::read(buf),
            attenuation_start: M2Track::read(buf),
            attenuation_end: M2Track::read(buf),
            visibility: M2Track::read(buf),
        }
    }
}
