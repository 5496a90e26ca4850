//! Bounds-checked access to fixed-layout little-endian records
//!
//! M2 files are a header followed by tables that the header points at with
//! `(count, offset)` pairs. [`RecordReader`] maps those references onto an
//! in-memory buffer. It validates nothing except that every record lies
//! inside the buffer.

use bytes::Buf;
use glam::{Quat, Vec2, Vec3};

use crate::error::{LoadError, Result};

/// A fixed-size little-endian record
pub trait Record: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Decode one record from the front of `buf`
    ///
    /// Callers guarantee that `buf` holds at least `SIZE` bytes.
    fn read(buf: &mut &[u8]) -> Self;
}

/// Array reference as stored in M2 headers and records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct M2Array {
    pub count: u32,
    pub offset: u32,
}

impl M2Array {
    pub const fn new(count: u32, offset: u32) -> Self {
        Self { count, offset }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Record for M2Array {
    const SIZE: usize = 8;

    fn read(buf: &mut &[u8]) -> Self {
        let count = buf.get_u32_le();
        let offset = buf.get_u32_le();
        Self { count, offset }
    }
}

impl Record for u8 {
    const SIZE: usize = 1;

    fn read(buf: &mut &[u8]) -> Self {
        buf.get_u8()
    }
}

impl Record for u16 {
    const SIZE: usize = 2;

    fn read(buf: &mut &[u8]) -> Self {
        buf.get_u16_le()
    }
}

impl Record for i16 {
    const SIZE: usize = 2;

    fn read(buf: &mut &[u8]) -> Self {
        buf.get_i16_le()
    }
}

impl Record for u32 {
    const SIZE: usize = 4;

    fn read(buf: &mut &[u8]) -> Self {
        buf.get_u32_le()
    }
}

impl Record for f32 {
    const SIZE: usize = 4;

    fn read(buf: &mut &[u8]) -> Self {
        buf.get_f32_le()
    }
}

impl Record for Vec2 {
    const SIZE: usize = 8;

    fn read(buf: &mut &[u8]) -> Self {
        let x = buf.get_f32_le();
        let y = buf.get_f32_le();
        Self::new(x, y)
    }
}

impl Record for Vec3 {
    const SIZE: usize = 12;

    fn read(buf: &mut &[u8]) -> Self {
        let x = buf.get_f32_le();
        let y = buf.get_f32_le();
        let z = buf.get_f32_le();
        Self::new(x, y, z)
    }
}

/// Uncompressed quaternion as used by texture animations
impl Record for Quat {
    const SIZE: usize = 16;

    fn read(buf: &mut &[u8]) -> Self {
        let x = buf.get_f32_le();
        let y = buf.get_f32_le();
        let z = buf.get_f32_le();
        let w = buf.get_f32_le();
        Self::from_xyzw(x, y, z, w)
    }
}

/// Quaternion packed into four signed 16-bit components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressedQuat {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub w: i16,
}

impl CompressedQuat {
    fn component(value: i16) -> f32 {
        let value = i32::from(value);
        let shifted = if value < 0 { value + 32768 } else { value - 32767 };
        shifted as f32 / 32767.0
    }

    /// Expand to a float quaternion in file coordinates
    pub fn expand(self) -> Quat {
        Quat::from_xyzw(
            Self::component(self.x),
            Self::component(self.y),
            Self::component(self.z),
            Self::component(self.w),
        )
    }
}

impl Record for CompressedQuat {
    const SIZE: usize = 8;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            x: buf.get_i16_le(),
            y: buf.get_i16_le(),
            z: buf.get_i16_le(),
            w: buf.get_i16_le(),
        }
    }
}

impl<T: Record, const N: usize> Record for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn read(buf: &mut &[u8]) -> Self {
        std::array::from_fn(|_| T::read(buf))
    }
}

/// Read-only view over one file buffer
#[derive(Debug, Clone, Copy)]
pub struct RecordReader<'a> {
    data: &'a [u8],
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow `len` bytes starting at `offset`
    pub fn slice(&self, offset: usize, len: usize, what: &'static str) -> Result<&'a [u8]> {
        let truncated = || LoadError::Truncated {
            what,
            needed: offset.saturating_add(len),
            available: self.data.len(),
        };
        let end = offset.checked_add(len).ok_or_else(truncated)?;
        self.data.get(offset..end).ok_or_else(truncated)
    }

    /// Decode a single record at `offset`
    pub fn record<T: Record>(&self, offset: usize, what: &'static str) -> Result<T> {
        let mut buf = self.slice(offset, T::SIZE, what)?;
        Ok(T::read(&mut buf))
    }

    /// Decode every element of an array reference
    pub fn array<T: Record>(&self, array: M2Array, what: &'static str) -> Result<Vec<T>> {
        if array.is_empty() {
            return Ok(Vec::new());
        }

        let count = array.count as usize;
        let len = count.checked_mul(T::SIZE).ok_or(LoadError::Truncated {
            what,
            needed: usize::MAX,
            available: self.data.len(),
        })?;
        let mut buf = self.slice(array.offset as usize, len, what)?;
        Ok((0..count).map(|_| T::read(&mut buf)).collect())
    }

    /// Decode a NUL-terminated (or length-bounded) string
    pub fn string(&self, array: M2Array, what: &'static str) -> Result<String> {
        let bytes = self.slice(array.offset as usize, array.count as usize, what)?;
        let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}
