//! Render passes and the state used to draw them

pub mod blend;
pub mod pass;
pub mod shader;

pub use blend::{BlendFactor, BlendMode, BlendState};
pub use pass::{RenderPass, sort_passes};
pub use shader::{PixelShader, ShaderTables, derive_shader_ids, pixel_shader};
