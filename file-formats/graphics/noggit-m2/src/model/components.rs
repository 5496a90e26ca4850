//! Animated sub-objects of a model: colors, transparency, texture
//! transforms, lights and the model camera

use glam::{Mat4, Quat, Vec3};

use crate::animation::{
    AnimationTime, AnimationTrack, BonePose, Interpolate, Interpolation, TrackSource,
};
use crate::backend::LightState;
use crate::chunks::{
    M2Camera, M2Color, M2Light, M2LightType, M2Texture, M2TextureTransform, M2Track,
    M2Transparency,
};
use crate::coordinate::fix_vector;
use crate::error::Result;
use crate::reader::{Record, RecordReader};

/// Vertical field of view used when a camera has no FoV keys
pub const DEFAULT_FIELD_OF_VIEW: f32 = 0.95;

/// Fraction of the stored (diagonal) field of view used as vertical FoV
const VERTICAL_FOV_FACTOR: f32 = 0.6;

fn fixed16(value: i16) -> f32 {
    f32::from(value) / 32767.0
}

/// Texture table entry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct ModelTexture {
    pub filename: String,
    pub texture_type: u32,
}

impl ModelTexture {
    /// Decode a texture record, substituting `placeholder` for replaceable
    /// textures
    pub fn read(record: &M2Texture, reader: &RecordReader<'_>, placeholder: &str) -> Result<Self> {
        let filename = if record.is_replaceable() {
            placeholder.to_string()
        } else {
            reader.string(record.filename, "texture filename")?
        };
        Ok(Self {
            filename,
            texture_type: record.texture_type,
        })
    }

    pub fn is_replaceable(&self) -> bool {
        self.texture_type != 0
    }
}

/// Color and opacity animation referenced by render passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelColor {
    pub color: AnimationTrack<Vec3>,
    pub opacity: AnimationTrack<f32>,
}

impl ModelColor {
    pub fn read(record: &M2Color, source: &TrackSource<'_>) -> Result<Self> {
        Ok(Self {
            color: AnimationTrack::read(&record.color, source, |c: Vec3| c)?,
            opacity: AnimationTrack::read(&record.opacity, source, fixed16)?,
        })
    }

    pub fn is_animated(&self) -> bool {
        self.color.is_animated() || self.opacity.is_animated()
    }
}

/// Opacity animation referenced through the transparency lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelTransparency {
    pub alpha: AnimationTrack<f32>,
}

impl ModelTransparency {
    pub fn read(record: &M2Transparency, source: &TrackSource<'_>) -> Result<Self> {
        Ok(Self {
            alpha: AnimationTrack::read(&record.alpha, source, fixed16)?,
        })
    }

    pub fn is_animated(&self) -> bool {
        self.alpha.is_animated()
    }
}

/// Texture coordinate transform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureAnimation {
    pub translation: AnimationTrack<Vec3>,
    pub rotation: AnimationTrack<Quat>,
    pub scale: AnimationTrack<Vec3>,
}

impl TextureAnimation {
    pub fn read(record: &M2TextureTransform, source: &TrackSource<'_>) -> Result<Self> {
        Ok(Self {
            translation: AnimationTrack::read(&record.translation, source, |v: Vec3| v)?,
            rotation: AnimationTrack::read(&record.rotation, source, |q: Quat| q.normalize())?,
            scale: AnimationTrack::read(&record.scale, source, |v: Vec3| v)?,
        })
    }

    /// `T * R * S`, each factor only when its track has keys for the clip
    pub fn matrix(&self, at: AnimationTime) -> Mat4 {
        let AnimationTime {
            animation,
            time,
            global_time,
        } = at;

        let mut m = Mat4::IDENTITY;
        if let Some(translation) = self.translation.value_at(animation, time, global_time) {
            m *= Mat4::from_translation(translation);
        }
        if let Some(rotation) = self.rotation.value_at(animation, time, global_time) {
            m *= Mat4::from_quat(rotation);
        }
        if let Some(scale) = self.scale.value_at(animation, time, global_time) {
            m *= Mat4::from_scale(scale);
        }
        m
    }
}

/// Model light, optionally attached to a bone
#[derive(Debug, Clone, PartialEq)]
pub struct ModelLight {
    pub light_type: M2LightType,
    pub bone: Option<usize>,
    pub position: Vec3,
    pub direction: Vec3,
    pub ambient_color: AnimationTrack<Vec3>,
    pub ambient_intensity: AnimationTrack<f32>,
    pub diffuse_color: AnimationTrack<Vec3>,
    pub diffuse_intensity: AnimationTrack<f32>,
}

impl ModelLight {
    pub fn new(light_type: M2LightType, bone: Option<usize>, position: Vec3) -> Self {
        Self {
            light_type,
            bone,
            position,
            direction: Vec3::Y,
            ambient_color: AnimationTrack::default(),
            ambient_intensity: AnimationTrack::default(),
            diffuse_color: AnimationTrack::default(),
            diffuse_intensity: AnimationTrack::default(),
        }
    }

    pub fn read(record: &M2Light, source: &TrackSource<'_>) -> Result<Self> {
        let light_type = M2LightType::from_raw(record.light_type).unwrap_or_else(|| {
            log::warn!("Light type {} is unknown, using a point light", record.light_type);
            M2LightType::Point
        });

        let mut light = Self::new(
            light_type,
            usize::try_from(record.bone).ok(),
            fix_vector(record.position),
        );
        light.ambient_color = AnimationTrack::read(&record.ambient_color, source, |c: Vec3| c)?;
        light.ambient_intensity =
            AnimationTrack::read(&record.ambient_intensity, source, |v: f32| v)?;
        light.diffuse_color = AnimationTrack::read(&record.diffuse_color, source, |c: Vec3| c)?;
        light.diffuse_intensity =
            AnimationTrack::read(&record.diffuse_intensity, source, |v: f32| v)?;
        Ok(light)
    }

    /// Evaluate colors and placement; unkeyed colors contribute nothing
    pub fn state(&self, at: AnimationTime, pose: &BonePose) -> LightState {
        let AnimationTime {
            animation,
            time,
            global_time,
        } = at;

        let ambient = self.ambient_color.value_or(animation, time, global_time, Vec3::ZERO)
            * self.ambient_intensity.value_or(animation, time, global_time, 0.0);
        let diffuse = self.diffuse_color.value_or(animation, time, global_time, Vec3::ZERO)
            * self.diffuse_intensity.value_or(animation, time, global_time, 0.0);

        let (position, direction) = match self.bone {
            Some(bone) => (
                pose.world(bone).transform_point3(self.position),
                pose.rotation(bone).transform_vector3(self.direction),
            ),
            None => (self.position, self.direction),
        };

        LightState {
            position: match self.light_type {
                M2LightType::Directional => direction.extend(0.0),
                M2LightType::Point => position.extend(1.0),
            },
            ambient: ambient.extend(1.0),
            diffuse: diffuse.extend(1.0),
        }
    }
}

/// Decode a track of spline keys, keeping only the key values
///
/// Camera tracks always store `(value, in, out)` keys. Tangent-interpolated
/// tracks hand the triplets to the track reader as they are.
fn spline_track<R, T>(
    track: &M2Track,
    source: &TrackSource<'_>,
    convert: impl Fn(R) -> T,
) -> Result<AnimationTrack<T>>
where
    R: Record + Copy,
    [R; 3]: Record,
    T: Interpolate,
{
    if Interpolation::from_raw(track.interpolation).has_tangents() {
        AnimationTrack::read(track, source, convert)
    } else {
        AnimationTrack::read(track, source, |key: [R; 3]| convert(key[0]))
    }
}

/// First camera of a model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub near_clip: f32,
    pub far_clip: f32,
    pub positions: AnimationTrack<Vec3>,
    pub targets: AnimationTrack<Vec3>,
    pub roll: AnimationTrack<f32>,
    pub field_of_view: AnimationTrack<f32>,
}

impl ModelCamera {
    pub fn new(position: Vec3, target: Vec3, near_clip: f32, far_clip: f32) -> Self {
        Self {
            position,
            target,
            near_clip,
            far_clip,
            positions: AnimationTrack::default(),
            targets: AnimationTrack::default(),
            roll: AnimationTrack::default(),
            field_of_view: AnimationTrack::default(),
        }
    }

    pub fn read(record: &M2Camera, source: &TrackSource<'_>) -> Result<Self> {
        let mut camera = Self::new(
            fix_vector(record.position_base),
            fix_vector(record.target_position_base),
            record.near_clip,
            record.far_clip,
        );
        camera.positions = spline_track(&record.positions, source, fix_vector)?;
        camera.targets = spline_track(&record.target_positions, source, fix_vector)?;
        camera.roll = spline_track(&record.roll, source, |v: f32| v)?;
        camera.field_of_view = spline_track(&record.field_of_view, source, |v: f32| v)?;
        Ok(camera)
    }

    /// Projection and view matrices at `at`
    pub fn matrices(&self, aspect_ratio: f32, at: AnimationTime) -> (Mat4, Mat4) {
        let AnimationTime {
            animation,
            time,
            global_time,
        } = at;

        let fov = self
            .field_of_view
            .value_or(animation, time, global_time, DEFAULT_FIELD_OF_VIEW);
        let near = self.near_clip.max(f32::EPSILON);
        let far = self.far_clip.max(near * 2.0);
        let projection = Mat4::perspective_rh_gl(
            fov * VERTICAL_FOV_FACTOR,
            aspect_ratio.max(f32::EPSILON),
            near,
            far,
        );

        let eye = self.position + self.positions.value_or(animation, time, global_time, Vec3::ZERO);
        let target = self.target + self.targets.value_or(animation, time, global_time, Vec3::ZERO);
        let roll = self.roll.value_or(animation, time, global_time, 0.0);
        let forward = (target - eye).normalize_or_zero();
        let up = if forward == Vec3::ZERO {
            Vec3::Y
        } else {
            Quat::from_axis_angle(forward, roll) * Vec3::Y
        };
        let view = Mat4::look_at_rh(eye, target, up);

        (projection, view)
    }
}
