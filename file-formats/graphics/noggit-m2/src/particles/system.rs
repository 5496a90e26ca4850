//! Particle system runtime state

use glam::{Vec2, Vec3, Vec4};
use rand::rngs::StdRng;

use super::emission::{
    EmissionParams, EmitterFrame, EmitterShape, random_between, random_spread,
};
use super::particle::{Particle, life_ramp};
use crate::animation::{AnimationTime, AnimationTrack, BillboardBasis, BonePose, TrackSource};
use crate::backend::ColoredVertex;
use crate::chunks::{M2ParticleEmitter, M2ParticleFlags, M2Track};
use crate::coordinate::fix_vector;
use crate::error::{LoadError, Result};
use crate::render::{BlendFactor, BlendState};

/// Live particles per system unless configured otherwise
pub const DEFAULT_MAX_PARTICLES: usize = 10_000;

/// Largest texture atlas an emitter may declare
pub const MAX_ATLAS_TILES: usize = 1024;

/// Ramp position of the middle color and size stop
const RAMP_MID: f32 = 0.5;

/// Alpha-test threshold of alpha-keyed particles
const ALPHA_KEY_THRESHOLD: f32 = 0.501_960_8;

/// Animated emission parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitterTracks {
    pub speed: AnimationTrack<f32>,
    pub speed_variation: AnimationTrack<f32>,
    /// Vertical spread angle
    pub spread: AnimationTrack<f32>,
    /// Horizontal spread angle
    pub lateral: AnimationTrack<f32>,
    pub gravity: AnimationTrack<f32>,
    pub lifespan: AnimationTrack<f32>,
    pub rate: AnimationTrack<f32>,
    pub area_length: AnimationTrack<f32>,
    pub area_width: AnimationTrack<f32>,
    pub deceleration: AnimationTrack<f32>,
    pub enabled: AnimationTrack<u8>,
}

impl EmitterTracks {
    fn read(record: &M2ParticleEmitter, source: &TrackSource<'_>) -> Result<Self> {
        let scalar = |track: &M2Track| AnimationTrack::read(track, source, |v: f32| v);
        Ok(Self {
            speed: scalar(&record.emission_speed)?,
            speed_variation: scalar(&record.speed_variation)?,
            spread: scalar(&record.vertical_range)?,
            lateral: scalar(&record.horizontal_range)?,
            gravity: scalar(&record.gravity)?,
            lifespan: scalar(&record.lifespan)?,
            rate: scalar(&record.emission_rate)?,
            area_length: scalar(&record.emission_area_length)?,
            area_width: scalar(&record.emission_area_width)?,
            deceleration: scalar(&record.z_source)?,
            enabled: AnimationTrack::read(&record.enabled, source, |v: u8| v)?,
        })
    }
}

/// First three entries of a ramp, repeating the last one when short
fn ramp<T: Copy>(values: &[T], default: T) -> [T; 3] {
    [0, 1, 2].map(|i| values.get(i).or(values.last()).copied().unwrap_or(default))
}

/// Texture coordinates of every atlas tile, rotated by `order`
///
/// Atlases above [`MAX_ATLAS_TILES`] tiles are corrupt.
fn atlas_tiles(rows: u16, columns: u16, order: i32) -> Result<Vec<[Vec2; 4]>> {
    let rows = rows.max(1);
    let columns = columns.max(1);
    let count = usize::from(rows) * usize::from(columns);
    if count > MAX_ATLAS_TILES {
        return Err(LoadError::corrupt(format!(
            "particle atlas of {rows}x{columns} tiles exceeds {MAX_ATLAS_TILES}"
        )));
    }
    let (w, h) = (1.0 / f32::from(columns), 1.0 / f32::from(rows));

    let tiles = (0..count)
        .map(|tile| {
            let x = (tile % usize::from(columns)) as f32;
            let y = (tile / usize::from(columns)) as f32;
            let a = Vec2::new(x * w, y * h);
            let b = Vec2::new((x + 1.0) * w, (y + 1.0) * h);
            let corners = [a, Vec2::new(b.x, a.y), b, Vec2::new(a.x, b.y)];

            let mut coords = [Vec2::ZERO; 4];
            for (i, corner) in corners.into_iter().enumerate() {
                coords[(i as i32 + 4 - order).rem_euclid(4) as usize] = corner;
            }
            coords
        })
        .collect();
    Ok(tiles)
}

/// One particle emitter of a model
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    shape: EmitterShape,
    pub tracks: EmitterTracks,
    pub lifespan_variation: f32,
    pub rate_variation: f32,
    pub colors: [Vec4; 3],
    pub sizes: [f32; 3],
    /// Exponential speed damping over life
    pub slowdown: f32,
    /// Emitter offset in bone space
    pub position: Vec3,
    bone: usize,
    texture: u16,
    blend: u8,
    particle_type: u8,
    tiles: Vec<[Vec2; 4]>,
    billboard: bool,
    bone_direction: bool,
    time_offset: f32,
    max_particles: usize,
    particles: Vec<Particle>,
    remainder: f32,
    rng: StdRng,
    at: AnimationTime,
    frame: EmitterFrame,
}

impl ParticleSystem {
    /// Emitter with static defaults
    pub fn new(shape: EmitterShape, mut rng: StdRng, max_particles: usize) -> Self {
        let time_offset = random_between(&mut rng, 0.0, 1.0);
        Self {
            shape,
            tracks: EmitterTracks::default(),
            lifespan_variation: 0.0,
            rate_variation: 0.0,
            colors: [Vec4::ONE; 3],
            sizes: [1.0; 3],
            slowdown: 0.0,
            position: Vec3::ZERO,
            bone: 0,
            texture: 0,
            blend: 0,
            particle_type: 0,
            tiles: vec![[Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y]],
            billboard: true,
            bone_direction: false,
            time_offset,
            max_particles,
            particles: Vec::new(),
            remainder: 0.0,
            rng,
            at: AnimationTime::default(),
            frame: EmitterFrame::default(),
        }
    }

    /// Decode an emitter record; unsupported shapes are rejected
    pub fn read(
        record: &M2ParticleEmitter,
        source: &TrackSource<'_>,
        rng: StdRng,
        max_particles: usize,
    ) -> Result<Self> {
        let shape = EmitterShape::from_raw(record.emitter_type)?;
        let mut system = Self::new(shape, rng, max_particles);

        let colors: Vec<Vec3> = source.main.array(record.color.values, "particle colors")?;
        let alphas: Vec<i16> = source.main.array(record.alpha.values, "particle opacity")?;
        let scales: Vec<Vec2> = source.main.array(record.scale.values, "particle sizes")?;

        let colors = ramp(&colors, Vec3::splat(255.0));
        let alphas = ramp(&alphas, i16::MAX);
        system.colors =
            [0, 1, 2].map(|i| (colors[i] / 255.0).extend(f32::from(alphas[i]) / 32767.0));
        system.sizes = ramp(&scales, Vec2::ONE).map(|scale| scale.x);

        system.tracks = EmitterTracks::read(record, source)?;
        system.lifespan_variation = record.lifespan_variation;
        system.rate_variation = record.emission_rate_variation;
        system.slowdown = record.drag;
        system.position = fix_vector(record.position);
        system.bone = usize::from(record.bone);
        system.texture = record.texture;
        system.blend = record.blend_mode;
        system.particle_type = record.particle_type;
        system.billboard = record.is_billboarded();
        system.bone_direction = record.flags.contains(M2ParticleFlags::BONE_DIRECTION);

        let order = if record.particle_type > 0 { -1 } else { 0 };
        system.tiles = atlas_tiles(record.texture_rows, record.texture_columns, order)?;
        Ok(system)
    }

    pub fn shape(&self) -> EmitterShape {
        self.shape
    }

    /// Parent bone index
    pub fn bone(&self) -> usize {
        self.bone
    }

    /// Index into the model texture table
    pub fn texture(&self) -> u16 {
        self.texture
    }

    /// Random fraction of the clip length added to the animation time
    pub fn time_offset(&self) -> f32 {
        self.time_offset
    }

    pub fn is_billboarded(&self) -> bool {
        self.billboard
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Blend equation and alpha test for the particle blend value
    pub fn blend_state(&self) -> (BlendState, Option<f32>) {
        let additive = |src| BlendState::Enabled {
            src,
            dst: BlendFactor::One,
        };
        match self.blend {
            1 => (additive(BlendFactor::SrcColor), None),
            2 | 4 => (additive(BlendFactor::SrcAlpha), None),
            3 => (BlendState::Disabled, Some(ALPHA_KEY_THRESHOLD)),
            _ => (BlendState::Disabled, None),
        }
    }

    /// Capture the evaluation time and the parent bone placement
    pub fn setup(&mut self, at: AnimationTime, pose: &BonePose) {
        self.at = at;
        self.frame = EmitterFrame {
            world: pose.world(self.bone),
            rotation: pose.rotation(self.bone),
            position: self.position,
        };
    }

    fn value(&self, track: &AnimationTrack<f32>) -> f32 {
        let AnimationTime {
            animation,
            time,
            global_time,
        } = self.at;
        track.value_or(animation, time, global_time, 0.0)
    }

    fn is_enabled(&self) -> bool {
        let AnimationTime {
            animation,
            time,
            global_time,
        } = self.at;
        if !self.tracks.enabled.uses(animation) {
            return true;
        }
        self.tracks
            .enabled
            .value_at(animation, time, global_time)
            .is_none_or(|value| value != 0)
    }

    /// Spawn and age particles by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let gravity = self.value(&self.tracks.gravity);
        let deceleration = self.value(&self.tracks.deceleration);
        let lifespan = self.value(&self.tracks.lifespan);
        let rate =
            self.value(&self.tracks.rate) + random_spread(&mut self.rng, self.rate_variation);

        let to_spawn = if lifespan != 0.0 {
            dt * rate / lifespan + self.remainder
        } else {
            self.remainder
        };

        if to_spawn < 1.0 {
            self.remainder = to_spawn.max(0.0);
        } else {
            let whole = to_spawn.floor();
            self.remainder = to_spawn - whole;
            let capacity = self.max_particles.saturating_sub(self.particles.len());
            let count = (whole as usize).min(capacity);

            if count > 0 && self.is_enabled() {
                let params = EmissionParams {
                    half_length: self.value(&self.tracks.area_length) * 0.5,
                    half_width: self.value(&self.tracks.area_width) * 0.5,
                    speed: self.value(&self.tracks.speed),
                    speed_variation: self.value(&self.tracks.speed_variation),
                    spread: self.value(&self.tracks.spread),
                    lateral: self.value(&self.tracks.lateral),
                    lifespan,
                    lifespan_variation: self.lifespan_variation,
                    tiles: self.tiles.len(),
                    billboard: self.billboard,
                    bone_direction: self.bone_direction,
                };
                log::trace!("Spawning {count} particles");
                for _ in 0..count {
                    let particle = self.shape.spawn(&params, &self.frame, &mut self.rng);
                    self.particles.push(particle);
                }
            }
        }

        let (colors, sizes, slowdown) = (self.colors, self.sizes, self.slowdown);
        self.particles.retain_mut(|particle| {
            particle.integrate(dt, gravity, deceleration, slowdown);
            let life = particle.relative_life();
            particle.size = life_ramp(life, RAMP_MID, &sizes);
            particle.color = life_ramp(life, RAMP_MID, &colors);
            life < 1.0
        });
    }

    /// Append one quad (four vertices) per live particle
    pub fn draw(&self, basis: &BillboardBasis, out: &mut Vec<ColoredVertex>) {
        let (right, up) = (basis.right, basis.up);

        for particle in &self.particles {
            let Some(tile) = self.tiles.get(particle.tile) else {
                continue;
            };
            let size = particle.size;
            let positions = if self.particle_type == 1 {
                let (low, high) = (-up * size, up * size);
                [
                    particle.position + low,
                    particle.position + high,
                    particle.origin + high,
                    particle.origin + low,
                ]
            } else if self.billboard {
                [
                    particle.position - (right + up) * size,
                    particle.position + (right - up) * size,
                    particle.position + (right + up) * size,
                    particle.position - (right - up) * size,
                ]
            } else {
                particle.corners.map(|corner| particle.position + corner * size)
            };

            out.extend(
                positions
                    .into_iter()
                    .zip(tile.iter())
                    .map(|(position, &tex_coord)| ColoredVertex {
                        position,
                        color: particle.color,
                        tex_coord,
                    }),
            );
        }
    }
}
