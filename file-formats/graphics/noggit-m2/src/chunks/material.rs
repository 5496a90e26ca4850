use bitflags::bitflags;
use bytes::Buf;

use crate::reader::Record;

bitflags! {
    /// Render flags as defined in the M2 format
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct M2RenderFlags: u16 {
        /// Unlit
        const UNLIT = 0x01;
        /// Unfogged
        const UNFOGGED = 0x02;
        /// No backface culling
        const TWO_SIDED = 0x04;
        /// Billboarded
        const BILLBOARD = 0x08;
        /// Depth writes disabled
        const NO_DEPTH_WRITE = 0x10;
    }
}

/// Render flag record (4 bytes)
///
/// The blend mode stays raw: shader derivation compares exact values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct M2Material {
    pub flags: M2RenderFlags,
    pub blend_mode: u16,
}

impl M2Material {
    pub fn is_unlit(&self) -> bool {
        self.flags.contains(M2RenderFlags::UNLIT)
    }
}

impl Record for M2Material {
    const SIZE: usize = 4;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            flags: M2RenderFlags::from_bits_retain(buf.get_u16_le()),
            blend_mode: buf.get_u16_le(),
        }
    }
}
