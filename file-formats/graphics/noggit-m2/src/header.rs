use bitflags::bitflags;
use bytes::Buf;
use glam::Vec3;

use crate::error::{LoadError, Result};
use crate::reader::{M2Array, Record, RecordReader};

/// Magic signature of an M2 model
pub const M2_MAGIC: [u8; 4] = *b"MD20";

/// Header version written by the 3.3.5 client
pub const VERSION_WOTLK: u32 = 264;

/// Size of the fixed header; the blend-override reference follows it
pub const HEADER_SIZE: usize = 0x130;

/// Byte offsets of the header fields
pub mod offsets {
    pub const MAGIC: usize = 0x00;
    pub const VERSION: usize = 0x04;
    pub const NAME: usize = 0x08;
    pub const FLAGS: usize = 0x10;
    pub const GLOBAL_SEQUENCES: usize = 0x14;
    pub const ANIMATIONS: usize = 0x1C;
    pub const ANIMATION_LOOKUP: usize = 0x24;
    pub const BONES: usize = 0x2C;
    pub const KEY_BONE_LOOKUP: usize = 0x34;
    pub const VERTICES: usize = 0x3C;
    pub const VIEWS: usize = 0x44;
    pub const COLORS: usize = 0x48;
    pub const TEXTURES: usize = 0x50;
    pub const TRANSPARENCY: usize = 0x58;
    pub const TEXTURE_ANIMATIONS: usize = 0x60;
    pub const TEXTURE_REPLACE: usize = 0x68;
    pub const RENDER_FLAGS: usize = 0x70;
    pub const BONE_LOOKUP: usize = 0x78;
    pub const TEXTURE_LOOKUP: usize = 0x80;
    pub const TEXTURE_UNIT_LOOKUP: usize = 0x88;
    pub const TRANSPARENCY_LOOKUP: usize = 0x90;
    pub const TEXTURE_ANIMATION_LOOKUP: usize = 0x98;
    pub const BOUNDING_BOX: usize = 0xA0;
    pub const BOUNDING_RADIUS: usize = 0xB8;
    pub const COLLISION_BOX: usize = 0xBC;
    pub const COLLISION_RADIUS: usize = 0xD4;
    pub const BOUNDING_TRIANGLES: usize = 0xD8;
    pub const BOUNDING_VERTICES: usize = 0xE0;
    pub const BOUNDING_NORMALS: usize = 0xE8;
    pub const ATTACHMENTS: usize = 0xF0;
    pub const ATTACHMENT_LOOKUP: usize = 0xF8;
    pub const EVENTS: usize = 0x100;
    pub const LIGHTS: usize = 0x108;
    pub const CAMERAS: usize = 0x110;
    pub const CAMERA_LOOKUP: usize = 0x118;
    pub const RIBBON_EMITTERS: usize = 0x120;
    pub const PARTICLE_EMITTERS: usize = 0x128;
    pub const BLEND_OVERRIDE: usize = 0x130;
}

bitflags! {
    /// Global model flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModelFlags: u32 {
        /// Tilt on the X axis
        const TILT_X = 0x1;
        /// Tilt on the Y axis
        const TILT_Y = 0x2;
        /// Header is followed by a blend-override table
        const BLEND_OVERRIDE = 0x8;
    }
}

/// Axis-aligned box in file coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Record for BoundingBox {
    const SIZE: usize = 24;

    fn read(buf: &mut &[u8]) -> Self {
        let min = Vec3::read(buf);
        let max = Vec3::read(buf);
        Self { min, max }
    }
}

/// M2 model header (3.3.5 layout)
#[derive(Debug, Clone)]
pub struct ModelHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub name: M2Array,
    pub flags: ModelFlags,
    pub global_sequences: M2Array,
    pub animations: M2Array,
    pub animation_lookup: M2Array,
    pub bones: M2Array,
    pub key_bone_lookup: M2Array,
    pub vertices: M2Array,
    /// Number of `.skin` level-of-detail files
    pub views: u32,
    pub colors: M2Array,
    pub textures: M2Array,
    pub transparency: M2Array,
    pub texture_animations: M2Array,
    pub texture_replace: M2Array,
    pub render_flags: M2Array,
    pub bone_lookup: M2Array,
    pub texture_lookup: M2Array,
    pub texture_unit_lookup: M2Array,
    pub transparency_lookup: M2Array,
    pub texture_animation_lookup: M2Array,
    pub bounding_box: BoundingBox,
    pub bounding_radius: f32,
    pub collision_box: BoundingBox,
    pub collision_radius: f32,
    pub bounding_triangles: M2Array,
    pub bounding_vertices: M2Array,
    pub bounding_normals: M2Array,
    pub attachments: M2Array,
    pub attachment_lookup: M2Array,
    pub events: M2Array,
    pub lights: M2Array,
    pub cameras: M2Array,
    pub camera_lookup: M2Array,
    pub ribbon_emitters: M2Array,
    pub particle_emitters: M2Array,
}

impl Record for ModelHeader {
    const SIZE: usize = HEADER_SIZE;

    fn read(buf: &mut &[u8]) -> Self {
        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);

        Self {
            magic,
            version: buf.get_u32_le(),
            name: M2Array::read(buf),
            flags: ModelFlags::from_bits_retain(buf.get_u32_le()),
            global_sequences: M2Array::read(buf),
            animations: M2Array::read(buf),
            animation_lookup: M2Array::read(buf),
            bones: M2Array::read(buf),
            key_bone_lookup: M2Array::read(buf),
            vertices: M2Array::read(buf),
            views: buf.get_u32_le(),
            colors: M2Array::read(buf),
            textures: M2Array::read(buf),
            transparency: M2Array::read(buf),
            texture_animations: M2Array::read(buf),
            texture_replace: M2Array::read(buf),
            render_flags: M2Array::read(buf),
            bone_lookup: M2Array::read(buf),
            texture_lookup: M2Array::read(buf),
            texture_unit_lookup: M2Array::read(buf),
            transparency_lookup: M2Array::read(buf),
            texture_animation_lookup: M2Array::read(buf),
            bounding_box: BoundingBox::read(buf),
            bounding_radius: buf.get_f32_le(),
            collision_box: BoundingBox::read(buf),
            collision_radius: buf.get_f32_le(),
            bounding_triangles: M2Array::read(buf),
            bounding_vertices: M2Array::read(buf),
            bounding_normals: M2Array::read(buf),
            attachments: M2Array::read(buf),
            attachment_lookup: M2Array::read(buf),
            events: M2Array::read(buf),
            lights: M2Array::read(buf),
            cameras: M2Array::read(buf),
            camera_lookup: M2Array::read(buf),
            ribbon_emitters: M2Array::read(buf),
            particle_emitters: M2Array::read(buf),
        }
    }
}

impl ModelHeader {
    /// Parse and validate the header at the start of `reader`
    pub fn parse(reader: &RecordReader<'_>) -> Result<Self> {
        let header: Self = reader.record(0, "model header")?;

        if header.magic != M2_MAGIC {
            return Err(LoadError::InvalidMagic {
                expected: String::from_utf8_lossy(&M2_MAGIC).into_owned(),
                actual: String::from_utf8_lossy(&header.magic).into_owned(),
            });
        }

        if header.version < VERSION_WOTLK {
            return Err(LoadError::UnsupportedVersion(header.version));
        }

        Ok(header)
    }

    /// Read the blend-override table when the header announces one
    pub fn blend_override(&self, reader: &RecordReader<'_>) -> Result<Option<Vec<u16>>> {
        if !self.flags.contains(ModelFlags::BLEND_OVERRIDE) {
            return Ok(None);
        }

        let table: M2Array = reader.record(offsets::BLEND_OVERRIDE, "blend override reference")?;
        reader.array(table, "blend override table").map(Some)
    }
}
