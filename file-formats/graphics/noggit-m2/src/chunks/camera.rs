use bytes::Buf;
use glam::Vec3;

use crate::chunks::track::M2Track;
use crate::reader::Record;

/// Camera record (116 bytes)
///
/// Position and target tracks hold spline keys relative to their base
/// position.
#[derive(Debug, Clone, PartialEq)]
pub struct M2Camera {
    pub camera_type: u32,
    pub far_clip: f32,
    pub near_clip: f32,
    pub positions: M2Track,
    pub position_base: Vec3,
    pub target_positions: M2Track,
    pub target_position_base: Vec3,
    pub roll: M2Track,
    pub field_of_view: M2Track,
}

impl Record for M2Camera {
    const SIZE: usize = 116;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            camera_type: buf.get_u32_le(),
            far_clip: buf.get_f32_le(),
            near_clip: buf.get_f32_le(),
            positions: M2Track::read(buf),
            position_base: Vec3::read(buf),
            target_positions: M2Track::read(buf),
            target_position_base: Vec3::read(buf),
            roll: M2Track::read(buf),
            field_of_view: M2Track::read(buf),
        }
    }
}
