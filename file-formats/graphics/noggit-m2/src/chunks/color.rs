use crate::chunks::track::M2Track;
use crate::reader::Record;

/// Color animation record (40 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct M2Color {
    /// RGB keys, `Vec3` in 0..1
    pub color: M2Track,
    /// Fixed16 alpha keys
    pub opacity: M2Track,
}

impl Record for M2Color {
    const SIZE: usize = 40;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            color: M2Track::read(buf),
            opacity: M2Track::read(buf),
        }
    }
}

/// Transparency animation record (20 bytes), fixed16 keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct M2Transparency {
    pub alpha: M2Track,
}

impl Record for M2Transparency {
    const SIZE: usize = 20;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            alpha: M2Track::read(buf),
        }
    }
}

/// Texture transform record (60 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct M2TextureTransform {
    /// `Vec3` keys
    pub translation: M2Track,
    /// Float quaternion keys
    pub rotation: M2Track,
    /// `Vec3` keys
    pub scale: M2Track,
}

impl Record for M2TextureTransform {
    const SIZE: usize = 60;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            translation: M2Track::read(buf),
            rotation: M2Track::read(buf),
            scale: M2Track::read(buf),
        }
    }
}
