//! Ribbon emitters
//!
//! A ribbon trails its attachment point as a strip of segments. The newest
//! segment sits at the front and grows until it exceeds the segment length,
//! then a new one starts; segments past the total length fall off the back.

use std::collections::VecDeque;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::animation::{AnimationTime, AnimationTrack, BonePose, TrackSource};
use crate::backend::ColoredVertex;
use crate::chunks::M2RibbonEmitter;
use crate::coordinate::fix_vector;
use crate::error::Result;
use crate::render::{BlendFactor, BlendState};

/// Piece of a ribbon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonSegment {
    pub position: Vec3,
    pub up: Vec3,
    /// Direction towards the previous attachment point
    pub back: Vec3,
    pub length: f32,
    /// Length when the segment was closed
    pub closed_length: f32,
}

impl RibbonSegment {
    fn new(position: Vec3, up: Vec3, length: f32) -> Self {
        Self {
            position,
            up,
            back: Vec3::ZERO,
            length,
            closed_length: 0.0,
        }
    }
}

/// One ribbon emitter of a model
#[derive(Debug, Clone)]
pub struct RibbonEmitter {
    pub color: AnimationTrack<Vec3>,
    pub opacity: AnimationTrack<f32>,
    pub above: AnimationTrack<f32>,
    pub below: AnimationTrack<f32>,
    bone: usize,
    position: Vec3,
    texture: Option<u16>,
    segment_length: f32,
    length: f32,
    segments: VecDeque<RibbonSegment>,
    tip: Vec3,
    tip_color: Vec4,
    tip_above: f32,
    tip_below: f32,
}

impl RibbonEmitter {
    pub fn new(bone: usize, position: Vec3, edges_per_second: f32, edge_lifetime: f32) -> Self {
        let segment_length = edge_lifetime;
        Self {
            color: AnimationTrack::default(),
            opacity: AnimationTrack::default(),
            above: AnimationTrack::default(),
            below: AnimationTrack::default(),
            bone,
            position,
            texture: None,
            segment_length,
            length: edges_per_second * segment_length,
            segments: VecDeque::from([RibbonSegment::new(position, Vec3::Y, 0.0)]),
            tip: position,
            tip_color: Vec4::ONE,
            tip_above: 0.0,
            tip_below: 0.0,
        }
    }

    pub fn read(record: &M2RibbonEmitter, source: &TrackSource<'_>) -> Result<Self> {
        let mut ribbon = Self::new(
            usize::try_from(record.bone).unwrap_or(0),
            fix_vector(record.position),
            record.edges_per_second,
            record.edge_lifetime,
        );
        let textures: Vec<u16> = source.main.array(record.textures, "ribbon textures")?;
        ribbon.texture = textures.first().copied();

        ribbon.color = AnimationTrack::read(&record.color, source, |c: Vec3| c)?;
        ribbon.opacity = AnimationTrack::read(&record.alpha, source, |a: i16| {
            f32::from(a) / 32767.0
        })?;
        ribbon.above = AnimationTrack::read(&record.height_above, source, |v: f32| v)?;
        ribbon.below = AnimationTrack::read(&record.height_below, source, |v: f32| v)?;
        Ok(ribbon)
    }

    pub fn bone(&self) -> usize {
        self.bone
    }

    /// Index into the model texture table
    pub fn texture(&self) -> Option<u16> {
        self.texture
    }

    pub fn segments(&self) -> &VecDeque<RibbonSegment> {
        &self.segments
    }

    /// Total trail length
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn blend_state(&self) -> BlendState {
        BlendState::Enabled {
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::One,
        }
    }

    /// Follow the parent bone and evaluate the ribbon's tracks
    pub fn setup(&mut self, at: AnimationTime, pose: &BonePose) {
        self.follow(&pose.world(self.bone));

        let AnimationTime {
            animation,
            time,
            global_time,
        } = at;
        let color = self.color.value_or(animation, time, global_time, Vec3::ONE);
        let opacity = self.opacity.value_or(animation, time, global_time, 1.0);
        self.tip_color = color.extend(opacity);
        self.tip_above = self.above.value_or(animation, time, global_time, 0.0);
        self.tip_below = self.below.value_or(animation, time, global_time, 0.0);
    }

    fn follow(&mut self, world: &Mat4) {
        let tip = world.transform_point3(self.position);
        let up = (world.transform_point3(self.position + Vec3::Z) - tip).normalize_or_zero();
        let moved = tip.distance(self.tip);

        let previous_tip = self.tip;
        let closed = match self.segments.front_mut() {
            Some(front) if front.length <= self.segment_length => {
                front.position = tip;
                front.up = up;
                front.length += moved;
                false
            }
            Some(front) => {
                front.back = (previous_tip - tip).normalize_or_zero();
                front.closed_length = front.length;
                true
            }
            None => true,
        };
        if closed {
            self.segments.push_front(RibbonSegment::new(tip, up, moved));
        }

        let mut total = 0.0;
        let mut keep = self.segments.len();
        for (index, segment) in self.segments.iter_mut().enumerate() {
            total += segment.length;
            if total > self.length {
                segment.length -= total - self.length;
                keep = index + 1;
                break;
            }
        }
        self.segments.truncate(keep);
        self.tip = tip;
    }

    /// Top and bottom vertex of a strip edge
    fn edge(&self, segment: &RibbonSegment, offset: Vec3, u: f32) -> [ColoredVertex; 2] {
        let anchor = segment.position + offset;
        [
            ColoredVertex {
                position: anchor + segment.up * self.tip_above,
                color: self.tip_color,
                tex_coord: Vec2::new(u, 0.0),
            },
            ColoredVertex {
                position: anchor - segment.up * self.tip_below,
                color: self.tip_color,
                tex_coord: Vec2::new(u, 1.0),
            },
        ]
    }

    /// Append the ribbon as a triangle strip
    pub fn draw(&self, out: &mut Vec<ColoredVertex>) {
        let mut travelled = 0.0;
        for segment in &self.segments {
            let u = if self.length > 0.0 {
                travelled / self.length
            } else {
                0.0
            };
            out.extend(self.edge(segment, Vec3::ZERO, u));
            travelled += segment.length;
        }

        if self.segments.len() > 1
            && let Some(last) = self.segments.back()
        {
            let extent = if last.closed_length > 0.0 {
                last.length / last.closed_length
            } else {
                0.0
            };
            out.extend(self.edge(last, last.back * extent, 1.0));
        }
    }
}
