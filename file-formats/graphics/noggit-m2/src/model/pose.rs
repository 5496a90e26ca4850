//! Storage for evaluated bone poses
//!
//! Models without billboarded geometry share one pose between all of their
//! placements and evaluate it at most once per frame. Models whose skinned
//! vertices depend on the camera keep one pose per instance.

use std::collections::HashMap;

use crate::animation::BonePose;

/// Key under which a shared pose was last evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameStamp {
    pub animation: usize,
    pub time: u32,
    pub frame: u64,
}

impl FrameStamp {
    pub fn new(animation: usize, time: u32, frame: u64) -> Self {
        Self {
            animation,
            time,
            frame,
        }
    }
}

/// Pose storage chosen when the model is loaded
#[derive(Debug, Clone)]
pub enum PoseStore {
    Shared {
        pose: BonePose,
        stamp: Option<FrameStamp>,
    },
    PerInstance {
        /// Pose used for emitters, lights and picking
        model: BonePose,
        model_stamp: Option<FrameStamp>,
        instances: HashMap<u32, BonePose>,
    },
}

impl PoseStore {
    pub fn new(per_instance: bool, bone_count: usize) -> Self {
        if per_instance {
            Self::PerInstance {
                model: BonePose::with_bones(bone_count),
                model_stamp: None,
                instances: HashMap::new(),
            }
        } else {
            Self::Shared {
                pose: BonePose::with_bones(bone_count),
                stamp: None,
            }
        }
    }

    pub fn is_per_instance(&self) -> bool {
        matches!(self, Self::PerInstance { .. })
    }

    /// Pose of `instance`, or the model-level pose for `None`
    ///
    /// Shared storage returns the same pose for every instance.
    pub fn pose(&self, instance: Option<u32>) -> Option<&BonePose> {
        match (self, instance) {
            (Self::Shared { pose, .. }, _) => Some(pose),
            (Self::PerInstance { model, .. }, None) => Some(model),
            (Self::PerInstance { instances, .. }, Some(id)) => instances.get(&id),
        }
    }

    pub fn pose_mut(&mut self, instance: Option<u32>) -> &mut BonePose {
        match (self, instance) {
            (Self::Shared { pose, .. }, _) => pose,
            (Self::PerInstance { model, .. }, None) => model,
            (Self::PerInstance { instances, .. }, Some(id)) => instances.entry(id).or_default(),
        }
    }

    /// Record `stamp` and report whether the model-level pose needs to be
    /// evaluated for it
    pub fn refresh(&mut self, stamp: FrameStamp) -> bool {
        let current = match self {
            Self::Shared { stamp, .. } => stamp,
            Self::PerInstance { model_stamp, .. } => model_stamp,
        };
        if *current == Some(stamp) {
            return false;
        }
        *current = Some(stamp);
        true
    }

    /// Forget every stamp so the next draw evaluates again
    pub fn invalidate(&mut self) {
        match self {
            Self::Shared { stamp, .. } => *stamp = None,
            Self::PerInstance { model_stamp, .. } => *model_stamp = None,
        }
    }

    /// Drop the poses of instances that no longer exist
    pub fn retain_instances(&mut self, mut keep: impl FnMut(u32) -> bool) {
        if let Self::PerInstance { instances, .. } = self {
            instances.retain(|id, _| keep(*id));
        }
    }

    pub fn instance_count(&self) -> usize {
        match self {
            Self::Shared { .. } => 0,
            Self::PerInstance { instances, .. } => instances.len(),
        }
    }
}
