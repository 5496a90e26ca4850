use crate::chunks::{M2Sequence, M2SequenceFlags};

/// One animation clip of a model
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub animation_id: u16,
    pub sub_animation_id: u16,
    /// Length in milliseconds, never 0
    pub length: u32,
    pub move_speed: f32,
    pub flags: M2SequenceFlags,
    pub next_animation: Option<usize>,
}

impl AnimationClip {
    /// Keyframes of this clip are stored inside the `.m2`
    pub fn is_embedded(&self) -> bool {
        self.flags.contains(M2SequenceFlags::EMBEDDED)
    }

    /// Wrap an absolute time into the clip
    pub fn wrap(&self, time: u32) -> u32 {
        time % self.length
    }
}

impl From<&M2Sequence> for AnimationClip {
    fn from(sequence: &M2Sequence) -> Self {
        Self {
            animation_id: sequence.animation_id,
            sub_animation_id: sequence.sub_animation_id,
            // Some assets ship zero-length clips; they loop on a single frame
            length: sequence.length.max(1),
            move_speed: sequence.move_speed,
            flags: sequence.flags,
            next_animation: usize::try_from(sequence.next_animation).ok(),
        }
    }
}
