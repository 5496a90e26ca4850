//! Feature integration tests

pub mod animation;
pub mod batch_loading;
pub mod drawing;
pub mod emitters;
pub mod loading;
pub mod picking;
pub mod scene_objects;
