//! Bone hierarchy evaluation
//!
//! Bones may be stored in any order. Evaluation walks each bone's pending
//! ancestors onto an explicit stack and resolves them root first, so a bone
//! is computed exactly once per pass no matter where its parent sits in the
//! table or how deep the chain runs.

use glam::{Mat4, Quat, Vec3};

use crate::animation::track::{AnimationTrack, TrackSource};
use crate::chunks::M2Bone;
use crate::coordinate::{fix_quat, fix_scale, fix_vector};
use crate::error::Result;
use crate::reader::CompressedQuat;

/// Camera axes injected into billboarded bones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillboardBasis {
    pub right: Vec3,
    pub up: Vec3,
}

impl BillboardBasis {
    /// Basis of an unrotated camera
    pub const IDENTITY: Self = Self {
        right: Vec3::X,
        up: Vec3::Y,
    };

    /// Extract the camera axes from a view (or model-view) matrix
    pub fn from_view(view: &Mat4) -> Self {
        Self {
            right: view.row(0).truncate(),
            up: view.row(1).truncate(),
        }
    }
}

impl Default for BillboardBasis {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Point in animation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationTime {
    pub animation: usize,
    /// Clip-relative time in milliseconds
    pub time: u32,
    /// Time driving global sequences
    pub global_time: u32,
}

impl AnimationTime {
    pub fn new(animation: usize, time: u32, global_time: u32) -> Self {
        Self {
            animation,
            time,
            global_time,
        }
    }
}

/// A single bone
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub parent: Option<usize>,
    pub pivot: Vec3,
    pub billboard: bool,
    pub translation: AnimationTrack<Vec3>,
    pub rotation: AnimationTrack<Quat>,
    pub scale: AnimationTrack<Vec3>,
}

impl Bone {
    /// Static bone without tracks
    pub fn new(parent: Option<usize>, pivot: Vec3) -> Self {
        Self {
            parent,
            pivot,
            billboard: false,
            translation: AnimationTrack::default(),
            rotation: AnimationTrack::default(),
            scale: AnimationTrack::default(),
        }
    }

    /// Decode a bone record
    pub fn read(record: &M2Bone, source: &TrackSource<'_>) -> Result<Self> {
        Ok(Self {
            parent: usize::try_from(record.parent).ok(),
            pivot: fix_vector(record.pivot),
            billboard: record.is_billboard(),
            translation: AnimationTrack::read(&record.translation, source, fix_vector)?,
            rotation: AnimationTrack::read(&record.rotation, source, |q: CompressedQuat| {
                fix_quat(q.expand()).normalize()
            })?,
            scale: AnimationTrack::read(&record.scale, source, fix_scale)?,
        })
    }

    /// Any track declares interpolation
    pub fn is_animated(&self) -> bool {
        self.translation.is_animated() || self.rotation.is_animated() || self.scale.is_animated()
    }

    /// Local transform and local rotation at `at`
    fn local(&self, at: AnimationTime, basis: &BillboardBasis) -> (Mat4, Quat) {
        let AnimationTime {
            animation,
            time,
            global_time,
        } = at;

        let translation = self.translation.value_at(animation, time, global_time);
        let rotation = self.rotation.value_at(animation, time, global_time);
        let scale = self.scale.value_at(animation, time, global_time);

        if translation.is_none() && rotation.is_none() && scale.is_none() && !self.billboard {
            return (Mat4::IDENTITY, Quat::IDENTITY);
        }

        let mut m = Mat4::from_translation(self.pivot);
        if let Some(translation) = translation {
            m *= Mat4::from_translation(translation);
        }
        if let Some(rotation) = rotation {
            m *= Mat4::from_quat(rotation);
        }
        if let Some(scale) = scale {
            m *= Mat4::from_scale(scale);
        }
        if self.billboard {
            let right = -basis.right;
            m.z_axis = right.extend(m.z_axis.w);
            m.y_axis = basis.up.extend(m.y_axis.w);
        }
        m *= Mat4::from_translation(-self.pivot);

        (m, rotation.unwrap_or(Quat::IDENTITY))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    InProgress,
    Done,
}

/// Evaluated bone matrices of one pose
#[derive(Debug, Clone, Default)]
pub struct BonePose {
    world: Vec<Mat4>,
    rotation: Vec<Mat4>,
    visits: Vec<Visit>,
}

impl BonePose {
    pub fn with_bones(count: usize) -> Self {
        Self {
            world: vec![Mat4::IDENTITY; count],
            rotation: vec![Mat4::IDENTITY; count],
            visits: vec![Visit::Pending; count],
        }
    }

    pub fn len(&self) -> usize {
        self.world.len()
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    /// World transform of bone `index`, identity when out of range
    pub fn world(&self, index: usize) -> Mat4 {
        self.world.get(index).copied().unwrap_or(Mat4::IDENTITY)
    }

    /// World rotation of bone `index`, identity when out of range
    pub fn rotation(&self, index: usize) -> Mat4 {
        self.rotation.get(index).copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn world_matrices(&self) -> &[Mat4] {
        &self.world
    }
}

/// Bones of a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneHierarchy {
    bones: Vec<Bone>,
}

impl BoneHierarchy {
    pub fn new(bones: Vec<Bone>) -> Self {
        let hierarchy = Self { bones };
        for bone in hierarchy.cyclic_bones() {
            log::warn!("Bone {bone} is part of a parent cycle; it is evaluated as a root");
        }
        hierarchy
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn get(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Bones whose parent chain loops back onto itself, in index order
    pub fn cyclic_bones(&self) -> Vec<usize> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unseen,
            OnPath(usize),
            Seen,
        }

        let mut marks = vec![Mark::Unseen; self.bones.len()];
        let mut cyclic = vec![false; self.bones.len()];
        let mut path = Vec::new();

        for start in 0..self.bones.len() {
            let mut current = Some(start);
            while let Some(index) = current.filter(|&i| i < self.bones.len()) {
                match marks[index] {
                    Mark::Unseen => {
                        marks[index] = Mark::OnPath(path.len());
                        path.push(index);
                        current = self.bones[index].parent;
                    }
                    Mark::OnPath(position) => {
                        for &member in &path[position..] {
                            cyclic[member] = true;
                        }
                        break;
                    }
                    Mark::Seen => break,
                }
            }
            for index in path.drain(..) {
                marks[index] = Mark::Seen;
            }
        }

        (0..self.bones.len()).filter(|&i| cyclic[i]).collect()
    }

    /// Evaluate every bone at `at` into `pose`
    pub fn compute(&self, at: AnimationTime, basis: &BillboardBasis, pose: &mut BonePose) {
        if pose.len() != self.bones.len() {
            *pose = BonePose::with_bones(self.bones.len());
        }
        pose.visits.fill(Visit::Pending);

        let mut chain = Vec::new();
        for index in 0..self.bones.len() {
            self.resolve(index, at, basis, pose, &mut chain);
        }
    }

    /// Resolve `index` after every pending ancestor, nearest root first
    fn resolve(
        &self,
        index: usize,
        at: AnimationTime,
        basis: &BillboardBasis,
        pose: &mut BonePose,
        chain: &mut Vec<usize>,
    ) {
        let mut current = Some(index);
        while let Some(bone) = current.filter(|&i| i < self.bones.len()) {
            if pose.visits[bone] != Visit::Pending {
                break;
            }
            pose.visits[bone] = Visit::InProgress;
            chain.push(bone);
            current = self.bones[bone].parent;
        }

        while let Some(index) = chain.pop() {
            let bone = &self.bones[index];
            let (parent_world, parent_rotation) = match bone.parent {
                Some(parent) if parent < self.bones.len() => {
                    if pose.visits[parent] == Visit::Done {
                        (pose.world[parent], pose.rotation[parent])
                    } else {
                        log::trace!("Bone {index} closes a parent cycle through bone {parent}");
                        (Mat4::IDENTITY, Mat4::IDENTITY)
                    }
                }
                _ => (Mat4::IDENTITY, Mat4::IDENTITY),
            };

            let (local, rotation) = bone.local(at, basis);
            pose.world[index] = parent_world * local;
            pose.rotation[index] = parent_rotation * Mat4::from_quat(rotation);
            pose.visits[index] = Visit::Done;
        }
    }
}
