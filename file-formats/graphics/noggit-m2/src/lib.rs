//! Runtime for World of Warcraft 3.3.5 M2 models as used by a map editor
//!
//! This crate parses `MD20` model files together with their `.skin` and
//! `.anim` companions, evaluates skeletal, colour and texture animation,
//! simulates particle and ribbon emitters and turns every model into draw
//! calls for a caller-provided [`GraphicsBackend`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use noggit_m2::{DirectoryFiles, FileProvider, Model};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let files = DirectoryFiles::new("Data");
//! let data = files.read("World/Generic/Human/Passive Doodads/Lamps/Lamp01.m2")?;
//! let model = Model::load("World/Generic/Human/Passive Doodads/Lamps/Lamp01.m2", &data, &files)?;
//!
//! for pass in model.passes() {
//!     println!("{:?} shader 0x{:04x}", pass.pixel_shader, pass.shader_id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod backend;
pub mod chunks;
pub mod coordinate;
pub mod error;
pub mod files;
pub mod header;
pub mod loader;
pub mod model;
pub mod particles;
pub mod reader;
pub mod render;
pub mod skin;
pub mod view;

#[cfg(any(test, feature = "test-utils", doc))]
pub mod test_utils;

// Re-export common types
pub use animation::{AnimationClip, AnimationTime, AnimationTrack, BillboardBasis, BonePose};
pub use backend::{
    BufferHandle, DrawCall, GraphicsBackend, LightState, ModelVertex, TextureCache, TextureHandle,
};
pub use error::{LoadError, Result};
pub use files::{DirectoryFiles, FileProvider, MemoryFiles};
pub use header::{BoundingBox, ModelFlags};
pub use loader::{load_model, load_models};
pub use model::{DrawOptions, DrawStats, LoadOptions, Model};
pub use render::{BlendMode, PixelShader, RenderPass};
pub use view::{Frustum, Instance, Ray, ViewState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
