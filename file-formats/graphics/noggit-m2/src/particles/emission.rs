//! Particle emission for the supported emitter shapes

use glam::{Mat4, Vec3};
use rand::Rng;

use super::particle::Particle;
use crate::chunks::particle_emitter::emitter_type;
use crate::error::{LoadError, Result};

/// Where new particles appear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterShape {
    /// Rectangle in the emitter's XZ plane
    Plane,
    /// Shell around the emitter, scaled by the area
    Sphere,
}

impl EmitterShape {
    pub fn from_raw(value: u8) -> Result<Self> {
        match value {
            emitter_type::PLANE => Ok(Self::Plane),
            emitter_type::SPHERE => Ok(Self::Sphere),
            emitter_type::SPLINE => Err(LoadError::corrupt(
                "spline particle emitters are unsupported",
            )),
            other => Err(LoadError::corrupt(format!(
                "unknown particle emitter type {other}"
            ))),
        }
    }

    /// Create one particle
    pub fn spawn<R: Rng>(
        &self,
        params: &EmissionParams,
        frame: &EmitterFrame,
        rng: &mut R,
    ) -> Particle {
        match self {
            Self::Plane => spawn_plane(params, frame, rng),
            Self::Sphere => spawn_sphere(params, frame, rng),
        }
    }
}

/// Emission parameters evaluated for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionParams {
    /// Half extent along X
    pub half_length: f32,
    /// Half extent along Z
    pub half_width: f32,
    pub speed: f32,
    pub speed_variation: f32,
    /// Vertical spread angle
    pub spread: f32,
    /// Horizontal spread angle
    pub lateral: f32,
    pub lifespan: f32,
    pub lifespan_variation: f32,
    /// Number of texture atlas tiles
    pub tiles: usize,
    pub billboard: bool,
    /// Launch along the bone Y axis instead of radially
    pub bone_direction: bool,
}

impl Default for EmissionParams {
    fn default() -> Self {
        Self {
            half_length: 0.5,
            half_width: 0.5,
            speed: 1.0,
            speed_variation: 0.0,
            spread: 0.0,
            lateral: 0.0,
            lifespan: 1.0,
            lifespan_variation: 0.0,
            tiles: 1,
            billboard: true,
            bone_direction: false,
        }
    }
}

/// Emitter placement captured from the parent bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterFrame {
    pub world: Mat4,
    pub rotation: Mat4,
    /// Emitter offset in bone space
    pub position: Vec3,
}

impl Default for EmitterFrame {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY,
            rotation: Mat4::IDENTITY,
            position: Vec3::ZERO,
        }
    }
}

/// Uniform value in `[low, high]`; degenerate or non-finite ranges give `low`
pub fn random_between<R: Rng>(rng: &mut R, low: f32, high: f32) -> f32 {
    if !(low.is_finite() && high.is_finite()) || high <= low {
        return if low.is_finite() { low } else { 0.0 };
    }
    rng.random_range(low..=high)
}

/// Uniform value in `[-extent, extent]`
pub fn random_spread<R: Rng>(rng: &mut R, extent: f32) -> f32 {
    let extent = extent.abs();
    random_between(rng, -extent, extent)
}

/// Random rotation within the spread angles, scaled by the emission area
fn spread_matrix<R: Rng>(
    rng: &mut R,
    vertical: f32,
    horizontal: f32,
    width: f32,
    length: f32,
) -> Mat4 {
    let a0 = random_spread(rng, vertical) / 2.0;
    let a1 = random_spread(rng, horizontal) / 2.0;

    let size = a0.cos().abs() * length + a0.sin().abs() * width;
    Mat4::from_rotation_x(a0) * Mat4::from_rotation_z(a1) * Mat4::from_scale(Vec3::splat(size))
}

fn launch_speed<R: Rng>(direction: Vec3, params: &EmissionParams, rng: &mut R) -> Vec3 {
    direction.normalize_or_zero()
        * params.speed
        * (1.0 + random_spread(rng, params.speed_variation))
}

fn finish<R: Rng>(mut particle: Particle, params: &EmissionParams, rng: &mut R) -> Particle {
    particle.max_life = params.lifespan + random_spread(rng, params.lifespan_variation);
    particle.tile = if params.tiles > 1 {
        rng.random_range(0..params.tiles)
    } else {
        0
    };
    particle
}

fn spawn_plane<R: Rng>(params: &EmissionParams, frame: &EmitterFrame, rng: &mut R) -> Particle {
    let rotation = frame.rotation * spread_matrix(rng, params.spread, params.spread, 1.0, 1.0);

    let offset = Vec3::new(
        random_spread(rng, params.half_length),
        0.0,
        random_spread(rng, params.half_width),
    );
    let position = frame.world.transform_point3(frame.position + offset);
    let direction = rotation.transform_vector3(Vec3::Y);
    let speed = launch_speed(direction, params, rng);

    let mut particle = Particle::new(position, speed, direction.normalize_or_zero(), 0.0);
    if !params.billboard {
        particle.corners = [
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(-1.0, 0.0, -1.0),
        ]
        .map(|corner| rotation.transform_vector3(corner));
    }
    finish(particle, params, rng)
}

fn spawn_sphere<R: Rng>(params: &EmissionParams, frame: &EmitterFrame, rng: &mut R) -> Particle {
    let radius = random_between(rng, 0.0, 1.0);
    let rotation = frame.rotation
        * spread_matrix(
            rng,
            params.spread * 2.0,
            params.lateral * 2.0,
            params.half_width,
            params.half_length,
        );

    let offset = rotation.transform_vector3(Vec3::Y) * radius;
    let position = frame.world.transform_point3(frame.position) + offset;
    let bone_up = frame.rotation.transform_vector3(Vec3::Y);

    let (direction, speed) = if params.bone_direction {
        (bone_up, launch_speed(bone_up, params, rng))
    } else if offset.length_squared() == 0.0 {
        (bone_up, Vec3::ZERO)
    } else {
        let direction = offset.normalize();
        (direction, launch_speed(direction, params, rng))
    };

    let particle = Particle::new(position, speed, direction.normalize_or_zero(), 0.0);
    finish(particle, params, rng)
}
