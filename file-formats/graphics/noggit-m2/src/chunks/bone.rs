use bitflags::bitflags;
use bytes::Buf;
use glam::Vec3;

use crate::chunks::track::M2Track;
use crate::reader::Record;

bitflags! {
    /// Bone flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct M2BoneFlags: u32 {
        /// Always faces the camera
        const SPHERICAL_BILLBOARD = 0x8;
        const CYLINDRICAL_BILLBOARD_LOCK_X = 0x10;
        const CYLINDRICAL_BILLBOARD_LOCK_Y = 0x20;
        const CYLINDRICAL_BILLBOARD_LOCK_Z = 0x40;
        const TRANSFORMED = 0x200;
    }
}

/// Bone record (88 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct M2Bone {
    pub key_bone_id: i32,
    pub flags: M2BoneFlags,
    /// Parent bone index, -1 for roots
    pub parent: i16,
    pub submesh_id: u16,
    pub bone_name_crc: u32,
    /// `Vec3` keys
    pub translation: M2Track,
    /// Compressed quaternion keys
    pub rotation: M2Track,
    /// `Vec3` keys
    pub scale: M2Track,
    pub pivot: Vec3,
}

impl M2Bone {
    pub fn is_billboard(&self) -> bool {
        self.flags.contains(M2BoneFlags::SPHERICAL_BILLBOARD)
    }

    /// Whether any of the three tracks declares interpolation
    pub fn has_animated_track(&self) -> bool {
        self.translation.interpolation != 0
            || self.rotation.interpolation != 0
            || self.scale.interpolation != 0
    }
}

impl Record for M2Bone {
    const SIZE: usize = 88;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            key_bone_id: buf.get_i32_le(),
            flags: M2BoneFlags::from_bits_retain(buf.get_u32_le()),
            parent: buf.get_i16_le(),
            submesh_id: buf.get_u16_le(),
            bone_name_crc: buf.get_u32_le(),
            translation: M2Track::read(buf),
            rotation: M2Track::read(buf),
            scale: M2Track::read(buf),
            pivot: Vec3::read(buf),
        }
    }
}
