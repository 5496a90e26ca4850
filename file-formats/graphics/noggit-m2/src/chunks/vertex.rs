use glam::{Vec2, Vec3};

use crate::reader::Record;

/// Vertex record (48 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct M2Vertex {
    pub position: Vec3,
    /// Bone weights, summing to 255
    pub bone_weights: [u8; 4],
    /// Indices into the model's bone table
    pub bone_indices: [u8; 4],
    pub normal: Vec3,
    pub tex_coords: [Vec2; 2],
}

impl M2Vertex {
    /// `(bone, weight)` pairs with a non-zero weight
    pub fn influences(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.bone_indices
            .iter()
            .zip(self.bone_weights.iter())
            .filter(|(_, weight)| **weight > 0)
            .map(|(bone, weight)| (*bone as usize, *weight))
    }
}

impl Record for M2Vertex {
    const SIZE: usize = 48;

    fn read(buf: &mut &[u8]) -> Self {
        Self {
            position: Vec3::read(buf),
            bone_weights: <[u8; 4]>::read(buf),
            bone_indices: <[u8; 4]>::read(buf),
            normal: Vec3::read(buf),
            tex_coords: <[Vec2; 2]>::read(buf),
        }
    }
}
