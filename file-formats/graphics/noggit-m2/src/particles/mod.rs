//! Particle and ribbon emitters for M2 models
//!
//! Emitters are attached to bones. Each frame the model calls `setup` with
//! the evaluated pose, then `update` ages the live particles in seconds and
//! `draw` writes camera-facing quads or ribbon strips for the backend.
//!
//! # Architecture
//!
//! - `Particle`: one live particle with position, speed, life, color, size
//! - `EmitterShape`: plane and sphere emission
//! - `ParticleSystem`: runtime state of a single emitter
//! - `RibbonEmitter`: trailing segment strip
//!
//! # Usage
//!
//! ```rust,ignore
//! use noggit_m2::particles::ParticleSystem;
//!
//! system.setup(AnimationTime::new(0, 500, 500), &pose);
//! system.update(dt);
//!
//! let mut vertices = Vec::new();
//! system.draw(&view.billboard_basis(), &mut vertices);
//! ```

mod emission;
mod particle;
mod ribbon;
mod system;

pub use emission::{EmissionParams, EmitterFrame, EmitterShape};
pub use particle::{Particle, life_ramp};
pub use ribbon::{RibbonEmitter, RibbonSegment};
pub use system::{DEFAULT_MAX_PARTICLES, EmitterTracks, MAX_ATLAS_TILES, ParticleSystem};
