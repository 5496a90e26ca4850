//! Test utilities for the model runtime
//!
//! # Model synthesis
//!
//! The [`model_builder`] module writes `.m2`, `.skin` and `.anim` bytes from
//! a compact description, so tests exercise the real parser without shipping
//! game assets.
//!
//! # Draw capture
//!
//! The [`recording_backend`] module provides a [`GraphicsBackend`] that keeps
//! owned copies of every upload and draw for later inspection.
//!
//! [`GraphicsBackend`]: crate::backend::GraphicsBackend
pub mod model_builder;
pub mod recording_backend;

pub use model_builder::{
    BoneSpec, BuiltModel, CameraSpec, ColorSpec, Keys, LightSpec, ModelBuilder, ParticleSpec,
    RibbonSpec, SequenceSpec, SkinSpec, SubmeshSpec, compress_quat,
};
pub use recording_backend::{
    RecordedBoxes, RecordedDraw, RecordedParticles, RecordedRibbon, RecordedVertexBuffer,
    RecordingBackend,
};
