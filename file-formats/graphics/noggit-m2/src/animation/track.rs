//! Keyframed animation tracks
//!
//! A track holds one keyframe list per animation clip. Tracks bound to a
//! global sequence ignore the clip and loop on their own timer instead.

use glam::{Quat, Vec2, Vec3, Vec4};

use crate::animation::clip::AnimationClip;
use crate::chunks::M2Track;
use crate::error::{LoadError, Result};
use crate::reader::{Record, RecordReader};

/// Interpolation between two keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Hold the earlier keyframe
    #[default]
    None,
    Linear,
    /// Cubic hermite with stored tangents
    Hermite,
    /// Stored like hermite; evaluated as hermite
    Bezier,
}

impl Interpolation {
    pub fn from_raw(value: u16) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Linear,
            2 => Self::Hermite,
            3 => Self::Bezier,
            other => {
                log::debug!("Unknown interpolation type {other}, using linear");
                Self::Linear
            }
        }
    }

    /// Keyframes are stored as `(value, in_tangent, out_tangent)` triplets
    pub fn has_tangents(self) -> bool {
        matches!(self, Self::Hermite | Self::Bezier)
    }
}

/// Values that can be blended between keyframes
pub trait Interpolate: Copy {
    fn lerp(a: Self, b: Self, t: f32) -> Self;

    fn hermite(v1: Self, v2: Self, in_tangent: Self, out_tangent: Self, t: f32) -> Self;
}

macro_rules! impl_interpolate_linear {
    ($($ty:ty),*) => {
        $(
            impl Interpolate for $ty {
                #[inline]
                fn lerp(a: Self, b: Self, t: f32) -> Self {
                    a + (b - a) * t
                }

                #[inline]
                fn hermite(v1: Self, v2: Self, in_tangent: Self, out_tangent: Self, t: f32) -> Self {
                    let t2 = t * t;
                    let t3 = t2 * t;
                    let h1 = 2.0 * t3 - 3.0 * t2 + 1.0;
                    let h2 = -2.0 * t3 + 3.0 * t2;
                    let h3 = t3 - 2.0 * t2 + t;
                    let h4 = t3 - t2;
                    v1 * h1 + v2 * h2 + in_tangent * h3 + out_tangent * h4
                }
            }
        )*
    };
}

impl_interpolate_linear!(f32, Vec2, Vec3, Vec4);

impl Interpolate for Quat {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a.slerp(b, t)
    }

    fn hermite(v1: Self, v2: Self, _in_tangent: Self, _out_tangent: Self, t: f32) -> Self {
        v1.slerp(v2, t)
    }
}

/// Integer tracks (visibility, texture slots) step between keyframes
macro_rules! impl_interpolate_step {
    ($($ty:ty),*) => {
        $(
            impl Interpolate for $ty {
                fn lerp(a: Self, b: Self, t: f32) -> Self {
                    if t < 1.0 { a } else { b }
                }

                fn hermite(v1: Self, v2: Self, _in: Self, _out: Self, t: f32) -> Self {
                    Self::lerp(v1, v2, t)
                }
            }
        )*
    };
}

impl_interpolate_step!(u8, u16);

/// Keyframes of one animation
#[derive(Debug, Clone, PartialEq)]
struct Keyframes<T> {
    times: Vec<u32>,
    values: Vec<T>,
    in_tangents: Vec<T>,
    out_tangents: Vec<T>,
    /// `Some(0)` pins time at 0, `None` disables wrapping
    period: Option<u32>,
}

impl<T: Interpolate> Keyframes<T> {
    fn sample(&self, time: u32, interpolation: Interpolation) -> Option<T> {
        let last = self.times.len().checked_sub(1)?;
        let time = match self.period {
            Some(0) => 0,
            Some(period) => time % period,
            None => time,
        };

        if last == 0 || time <= self.times[0] {
            return Some(self.values[0]);
        }
        if time >= self.times[last] {
            return Some(self.values[last]);
        }

        // First keyframe strictly after `time`, in 1..=last
        let next = self.times.partition_point(|&key| key <= time);
        let prev = next - 1;
        let (t1, t2) = (self.times[prev], self.times[next]);
        if t1 == time {
            return Some(self.values[prev]);
        }

        let r = (time - t1) as f32 / (t2 - t1) as f32;
        let (v1, v2) = (self.values[prev], self.values[next]);

        Some(match interpolation {
            Interpolation::None => v1,
            Interpolation::Linear => T::lerp(v1, v2, r),
            Interpolation::Hermite | Interpolation::Bezier => {
                match (self.in_tangents.get(prev), self.out_tangents.get(prev)) {
                    (Some(&in_tangent), Some(&out_tangent)) => {
                        T::hermite(v1, v2, in_tangent, out_tangent, r)
                    }
                    _ => T::lerp(v1, v2, r),
                }
            }
        })
    }
}

/// Buffers a track's keyframes can be read from
#[derive(Debug, Clone, Copy)]
pub struct TrackSource<'a> {
    /// The `.m2` buffer
    pub main: RecordReader<'a>,
    /// Per-clip `.anim` buffers, indexed like `clips`
    pub side: &'a [Option<RecordReader<'a>>],
    pub clips: &'a [AnimationClip],
    pub global_sequences: &'a [u32],
}

impl<'a> TrackSource<'a> {
    /// Source over a single buffer without clips or side files
    pub fn main_only(main: RecordReader<'a>) -> Self {
        Self {
            main,
            side: &[],
            clips: &[],
            global_sequences: &[],
        }
    }

    /// Buffer holding the keyframes of `animation`
    ///
    /// `None` when the clip's `.anim` file was not available.
    fn buffer_for(&self, animation: usize) -> Option<RecordReader<'a>> {
        match self.clips.get(animation) {
            Some(clip) if !clip.is_embedded() => self.side.get(animation).copied().flatten(),
            _ => Some(self.main),
        }
    }
}

/// Keyframed value of type `T`
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrack<T> {
    interpolation: Interpolation,
    global_sequence: Option<usize>,
    keyframes: Vec<Keyframes<T>>,
}

impl<T> Default for AnimationTrack<T> {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::None,
            global_sequence: None,
            keyframes: Vec::new(),
        }
    }
}

impl<T: Interpolate> AnimationTrack<T> {
    /// Track without keyframes
    pub fn new(interpolation: Interpolation, global_sequence: Option<usize>) -> Self {
        Self {
            interpolation,
            global_sequence,
            keyframes: Vec::new(),
        }
    }

    /// Append the keyframes of the next animation
    ///
    /// `period` is the clip or global sequence length used to wrap time.
    pub fn with_keys(mut self, period: Option<u32>, keys: &[(u32, T)]) -> Self {
        self.keyframes.push(Keyframes {
            times: keys.iter().map(|(time, _)| *time).collect(),
            values: keys.iter().map(|(_, value)| *value).collect(),
            in_tangents: Vec::new(),
            out_tangents: Vec::new(),
            period,
        });
        self
    }

    /// Append hermite keyframes `(time, value, in_tangent, out_tangent)`
    pub fn with_hermite_keys(mut self, period: Option<u32>, keys: &[(u32, T, T, T)]) -> Self {
        self.keyframes.push(Keyframes {
            times: keys.iter().map(|key| key.0).collect(),
            values: keys.iter().map(|key| key.1).collect(),
            in_tangents: keys.iter().map(|key| key.2).collect(),
            out_tangents: keys.iter().map(|key| key.3).collect(),
            period,
        });
        self
    }

    /// Decode a track, converting each stored value with `convert`
    pub fn read<R: Record>(
        track: &M2Track,
        source: &TrackSource<'_>,
        convert: impl Fn(R) -> T,
    ) -> Result<Self> {
        let interpolation = Interpolation::from_raw(track.interpolation);
        let global_sequence = track.global_sequence();

        let global_period = match global_sequence {
            Some(index) => Some(*source.global_sequences.get(index).ok_or_else(|| {
                LoadError::corrupt(format!(
                    "track references global sequence {index} of {}",
                    source.global_sequences.len()
                ))
            })?),
            None => None,
        };

        let timestamp_lists = source.main.array(track.timestamps, "track timestamp lists")?;
        let value_lists = source.main.array(track.values, "track value lists")?;
        let stride = if interpolation.has_tangents() { 3 } else { 1 };

        let mut keyframes = Vec::with_capacity(timestamp_lists.len());
        for (animation, (times_ref, values_ref)) in
            timestamp_lists.iter().zip(value_lists.iter()).enumerate()
        {
            let period = global_period.or_else(|| source.clips.get(animation).map(|c| c.length));

            let Some(buffer) = source.buffer_for(animation) else {
                keyframes.push(Keyframes {
                    times: Vec::new(),
                    values: Vec::new(),
                    in_tangents: Vec::new(),
                    out_tangents: Vec::new(),
                    period,
                });
                continue;
            };

            let mut times: Vec<u32> = buffer.array(*times_ref, "track timestamps")?;
            let raw: Vec<R> = buffer.array(*values_ref, "track values")?;

            if times.windows(2).any(|pair| pair[1] < pair[0]) {
                return Err(LoadError::corrupt(format!(
                    "track timestamps of animation {animation} decrease"
                )));
            }

            let mut values = Vec::with_capacity(raw.len() / stride);
            let mut in_tangents = Vec::new();
            let mut out_tangents = Vec::new();
            let mut raw = raw.into_iter().map(&convert);
            while let Some(value) = raw.next() {
                values.push(value);
                if stride == 3 {
                    match (raw.next(), raw.next()) {
                        (Some(in_tangent), Some(out_tangent)) => {
                            in_tangents.push(in_tangent);
                            out_tangents.push(out_tangent);
                        }
                        _ => {
                            values.pop();
                            break;
                        }
                    }
                }
            }

            if times.len() != values.len() {
                log::debug!(
                    "Track of animation {animation} has {} timestamps for {} values",
                    times.len(),
                    values.len()
                );
                let count = times.len().min(values.len());
                times.truncate(count);
                values.truncate(count);
                in_tangents.truncate(count);
                out_tangents.truncate(count);
            }

            keyframes.push(Keyframes {
                times,
                values,
                in_tangents,
                out_tangents,
                period,
            });
        }

        Ok(Self {
            interpolation,
            global_sequence,
            keyframes,
        })
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn global_sequence(&self) -> Option<usize> {
        self.global_sequence
    }

    /// Whether the stored header declares interpolation at all
    pub fn is_animated(&self) -> bool {
        self.interpolation != Interpolation::None
    }

    fn keyframes_for(&self, animation: usize) -> Option<&Keyframes<T>> {
        let index = if self.global_sequence.is_some() { 0 } else { animation };
        self.keyframes.get(index)
    }

    /// Whether the track has keyframes for `animation`
    pub fn uses(&self, animation: usize) -> bool {
        self.keyframes_for(animation)
            .is_some_and(|keys| !keys.times.is_empty())
    }

    /// Evaluate the track
    ///
    /// `time` is the clip-relative time, `global_time` drives global
    /// sequences. Returns `None` when there are no keyframes.
    pub fn value_at(&self, animation: usize, time: u32, global_time: u32) -> Option<T> {
        let time = if self.global_sequence.is_some() {
            global_time
        } else {
            time
        };
        self.keyframes_for(animation)?
            .sample(time, self.interpolation)
    }

    /// Evaluate the track or fall back to `default`
    pub fn value_or(&self, animation: usize, time: u32, global_time: u32, default: T) -> T {
        self.value_at(animation, time, global_time)
            .unwrap_or(default)
    }
}
