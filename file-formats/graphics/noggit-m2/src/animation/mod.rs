//! Animation system for M2 models
//!
//! This module evaluates keyframed tracks and the bone hierarchy.
//!
//! # Architecture
//!
//! - `AnimationTrack`: per-clip keyframes with none, linear or hermite
//!   interpolation, optionally bound to a global sequence
//! - `BoneHierarchy`: memoized parent-first evaluation of bone matrices
//! - `AnimationClip`: clip length and side-file location
//!
//! # Usage
//!
//! ```rust,ignore
//! use noggit_m2::animation::{AnimationTime, BillboardBasis, BonePose};
//!
//! let mut pose = BonePose::default();
//! hierarchy.compute(AnimationTime::new(0, 250, 250), &BillboardBasis::IDENTITY, &mut pose);
//! let root = pose.world(0);
//! ```

mod bones;
mod clip;
mod track;

pub use bones::{AnimationTime, BillboardBasis, Bone, BoneHierarchy, BonePose};
pub use clip::AnimationClip;
pub use track::{AnimationTrack, Interpolate, Interpolation, TrackSource};
