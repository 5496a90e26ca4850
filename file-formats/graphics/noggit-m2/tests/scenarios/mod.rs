//! End-to-end scenarios over synthesized assets

pub mod degenerate_input;
pub mod shader_resolution;
pub mod skeleton;
