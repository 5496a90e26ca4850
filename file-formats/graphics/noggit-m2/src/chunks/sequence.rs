use bitflags::bitflags;
use bytes::Buf;

use crate::header::BoundingBox;
use crate::reader::Record;

bitflags! {
    /// Animation sequence flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct M2SequenceFlags: u32 {
        /// Sets 0x80 when loaded
        const INIT_BLEND = 0x1;
        /// Keyframes live in the `.m2` instead of a `.anim` file
        const EMBEDDED = 0x20;
        /// Sequence is an alias of another one
        const ALIAS = 0x40;
        /// Blended animation
        const BLENDED = 0x80;
    }
}

/// Animation sequence record (64 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct M2Sequence {
    pub animation_id: u16,
    pub sub_animation_id: u16,
    /// Length in milliseconds; 0 is stored by some assets
    pub length: u32,
    pub move_speed: f32,
    pub flags: M2SequenceFlags,
    pub frequency: i16,
    pub replay_min: u32,
    pub replay_max: u32,
    pub blend_time: u32,
    pub bounds: BoundingBox,
    pub bounds_radius: f32,
    pub next_animation: i16,
    pub alias_next: u16,
}

impl Record for M2Sequence {
    const SIZE: usize = 64;

    fn read(buf: &mut &[u8]) -> Self {
        let animation_id = buf.get_u16_le();
        let sub_animation_id = buf.get_u16_le();
        let length = buf.get_u32_le();
        let move_speed = buf.get_f32_le();
        let flags = M2SequenceFlags::from_bits_retain(buf.get_u32_le());
        let frequency = buf.get_i16_le();
        buf.advance(2);
        let replay_min = buf.get_u32_le();
        let replay_max = buf.get_u32_le();
        let blend_time = buf.get_u32_le();
        let bounds = BoundingBox::read(buf);
        let bounds_radius = buf.get_f32_le();
        let next_animation = buf.get_i16_le();
        let alias_next = buf.get_u16_le();

        Self {
            animation_id,
            sub_animation_id,
            length,
            move_speed,
            flags,
            frequency,
            replay_min,
            replay_max,
            blend_time,
            bounds,
            bounds_radius,
            next_animation,
            alias_next,
        }
    }
}
