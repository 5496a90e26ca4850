//! Interface to the renderer
//!
//! The model never talks to a graphics API directly. It uploads buffers and
//! emits draw descriptions through [`GraphicsBackend`], which the render
//! thread implements on top of whatever API it uses.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::render::{BlendState, PixelShader};

/// GPU buffer owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Texture owned by the texture cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextureHandle(pub u32);

/// How often a vertex buffer is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Uploaded once
    Static,
    /// Rewritten whenever the pose changes
    Stream,
}

/// Vertex layout of model geometry
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct ModelVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: [Vec2; 2],
}

/// Vertex layout of particle quads and ribbon strips
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct ColoredVertex {
    pub position: Vec3,
    pub color: Vec4,
    pub tex_coord: Vec2,
}

/// Fixed-function light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    /// `w == 0` for directional lights
    pub position: Vec4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
}

/// One render pass over a set of instances
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall<'a> {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_start: u32,
    pub index_count: u32,
    pub vertex_start: u32,
    pub vertex_end: u32,
    /// One instance per transform
    pub transforms: &'a [Mat4],
    pub textures: &'a [TextureHandle],
    pub texture_matrix: Mat4,
    pub pixel_shader: PixelShader,
    pub blend: BlendState,
    pub alpha_test: Option<f32>,
    pub cull_faces: bool,
    pub depth_write: bool,
    pub fog: bool,
    pub lighting: bool,
    pub diffuse: Vec4,
    pub emissive: Vec4,
    pub lights: &'a [LightState],
}

/// Particle quads, four vertices per particle
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleBatch<'a> {
    pub texture: TextureHandle,
    pub blend: BlendState,
    pub alpha_test: Option<f32>,
    /// Model-space vertices, drawn once per transform
    pub vertices: &'a [ColoredVertex],
    pub transforms: &'a [Mat4],
}

/// Ribbon triangle strip
#[derive(Debug, Clone, PartialEq)]
pub struct RibbonStrip<'a> {
    pub texture: TextureHandle,
    pub blend: BlendState,
    pub vertices: &'a [ColoredVertex],
    pub transforms: &'a [Mat4],
}

/// Instanced bounding-box line strip
#[derive(Debug, Clone, PartialEq)]
pub struct BoxDraw<'a> {
    pub vertex_buffer: BufferHandle,
    pub indices: &'a [u16],
    pub transforms: &'a [Mat4],
    pub color: Vec4,
}

/// Filename to texture resolution
pub trait TextureCache {
    /// Look up or load a texture; the cache supplies its own fallback for
    /// files it cannot load
    fn texture(&mut self, filename: &str) -> TextureHandle;

    fn release_texture(&mut self, texture: TextureHandle);
}

/// Render-thread side of the model runtime
pub trait GraphicsBackend: TextureCache {
    fn create_vertex_buffer(&mut self, vertices: &[ModelVertex], usage: BufferUsage)
    -> BufferHandle;

    fn update_vertex_buffer(&mut self, buffer: BufferHandle, vertices: &[ModelVertex]);

    fn create_index_buffer(&mut self, indices: &[u16]) -> BufferHandle;

    fn create_point_buffer(&mut self, points: &[Vec3]) -> BufferHandle;

    fn delete_buffer(&mut self, buffer: BufferHandle);

    fn draw(&mut self, call: &DrawCall<'_>);

    fn draw_particles(&mut self, batch: &ParticleBatch<'_>);

    fn draw_ribbon(&mut self, strip: &RibbonStrip<'_>);

    fn draw_boxes(&mut self, boxes: &BoxDraw<'_>);
}
