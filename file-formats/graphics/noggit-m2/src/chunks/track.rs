use bytes::Buf;

use crate::reader::{M2Array, Record};

/// On-disk animation track header
///
/// `timestamps` and `values` both reference an array of per-animation
/// sub-arrays. The sub-array for animation `i` holds `u32` timestamps and
/// values respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct M2Track {
    /// Interpolation kind (0 none, 1 linear, 2 hermite, 3 bezier)
    pub interpolation: u16,
    /// Global sequence index, -1 when the track follows the animation clip
    pub global_sequence: i16,
    pub timestamps: M2Array,
    pub values: M2Array,
}

impl M2Track {
    pub fn global_sequence(&self) -> Option<usize> {
        usize::try_from(self.global_sequence).ok()
    }
}

impl Record for M2Track {
    const SIZE: usize = 20;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            interpolation: buf.get_u16_le(),
            global_sequence: buf.get_i16_le(),
            timestamps: M2Array::read(buf),
            values: M2Array::read(buf),
        }
    }
}

/// Track without interpolation metadata, used by particle ramps
///
/// Timestamps are fixed-point fractions of the particle lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct M2FakeTrack {
    pub timestamps: M2Array,
    pub values: M2Array,
}

impl Record for M2FakeTrack {
    const SIZE: usize = 16;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            timestamps: M2Array::read(buf),
            values: M2Array::read(buf),
        }
    }
}
