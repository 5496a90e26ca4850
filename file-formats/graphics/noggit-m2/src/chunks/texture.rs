use bytes::Buf;

use crate::reader::{M2Array, Record};

/// Texture record (16 bytes)
///
/// Type 0 textures are loaded by filename; every other type is replaced at
/// runtime (skins, capes, monster textures).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct M2Texture {
    pub texture_type: u32,
    pub flags: u32,
    pub filename: M2Array,
}

impl M2Texture {
    pub fn is_replaceable(&self) -> bool {
        self.texture_type != 0
    }
}

impl Record for M2Texture {
    const SIZE: usize = 16;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            texture_type: buf.get_u32_le(),
            flags: buf.get_u32_le(),
            filename: M2Array::read(buf),
        }
    }
}
