//! Graphics backend that records instead of rendering

use glam::{Mat4, Vec3, Vec4};

use crate::backend::{
    BoxDraw, BufferHandle, BufferUsage, ColoredVertex, DrawCall, GraphicsBackend, LightState,
    ModelVertex, ParticleBatch, RibbonStrip, TextureCache, TextureHandle,
};
use crate::render::{BlendState, PixelShader};

/// Owned copy of a [`DrawCall`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_start: u32,
    pub index_count: u32,
    pub vertex_start: u32,
    pub vertex_end: u32,
    pub transforms: Vec<Mat4>,
    pub textures: Vec<TextureHandle>,
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
    pub lights: Vec<LightState>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedVertexBuffer {
    pub handle: BufferHandle,
    pub usage: BufferUsage,
    pub vertices: Vec<ModelVertex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedParticles {
    pub texture: TextureHandle,
    pub blend: BlendState,
    pub alpha_test: Option<f32>,
    pub vertices: Vec<ColoredVertex>,
    pub instances: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRibbon {
    pub texture: TextureHandle,
    pub blend: BlendState,
    pub vertices: Vec<ColoredVertex>,
    pub instances: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBoxes {
    pub vertex_buffer: BufferHandle,
    pub indices: Vec<u16>,
    pub transforms: Vec<Mat4>,
    pub color: Vec4,
}

/// Backend keeping everything it is handed
///
/// Handles are allocated from one counter starting at 1, so buffers and
/// textures never share a value.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    next_handle: u32,
    pub requested_textures: Vec<String>,
    pub released_textures: Vec<TextureHandle>,
    pub vertex_buffers: Vec<RecordedVertexBuffer>,
    /// `(buffer, vertices)` for every rewrite
    pub vertex_updates: Vec<(BufferHandle, Vec<ModelVertex>)>,
    pub index_buffers: Vec<(BufferHandle, Vec<u16>)>,
    pub point_buffers: Vec<(BufferHandle, Vec<Vec3>)>,
    pub deleted_buffers: Vec<BufferHandle>,
    pub draws: Vec<RecordedDraw>,
    pub particles: Vec<RecordedParticles>,
    pub ribbons: Vec<RecordedRibbon>,
    pub boxes: Vec<RecordedBoxes>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Forget recorded draws, keeping uploads
    pub fn clear_draws(&mut self) {
        self.draws.clear();
        self.particles.clear();
        self.ribbons.clear();
        self.boxes.clear();
        self.vertex_updates.clear();
    }
}

impl TextureCache for RecordingBackend {
    fn texture(&mut self, filename: &str) -> TextureHandle {
        self.requested_textures.push(filename.to_string());
        TextureHandle(self.allocate())
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.released_textures.push(texture);
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_vertex_buffer(
        &mut self,
        vertices: &[ModelVertex],
        usage: BufferUsage,
    ) -> BufferHandle {
        let handle = BufferHandle(self.allocate());
        self.vertex_buffers.push(RecordedVertexBuffer {
            handle,
            usage,
            vertices: vertices.to_vec(),
        });
        handle
    }

    fn update_vertex_buffer(&mut self, buffer: BufferHandle, vertices: &[ModelVertex]) {
        self.vertex_updates.push((buffer, vertices.to_vec()));
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> BufferHandle {
        let handle = BufferHandle(self.allocate());
        self.index_buffers.push((handle, indices.to_vec()));
        handle
    }

    fn create_point_buffer(&mut self, points: &[Vec3]) -> BufferHandle {
        let handle = BufferHandle(self.allocate());
        self.point_buffers.push((handle, points.to_vec()));
        handle
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.deleted_buffers.push(buffer);
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        self.draws.push(RecordedDraw {
            vertex_buffer: call.vertex_buffer,
            index_buffer: call.index_buffer,
            index_start: call.index_start,
            index_count: call.index_count,
            vertex_start: call.vertex_start,
            vertex_end: call.vertex_end,
            transforms: call.transforms.to_vec(),
            textures: call.textures.to_vec(),
            texture_matrix: call.texture_matrix,
            pixel_shader: call.pixel_shader,
            blend: call.blend,
            alpha_test: call.alpha_test,
            cull_faces: call.cull_faces,
            depth_write: call.depth_write,
            fog: call.fog,
            lighting: call.lighting,
            diffuse: call.diffuse,
            emissive: call.emissive,
            lights: call.lights.to_vec(),
        });
    }

    fn draw_particles(&mut self, batch: &ParticleBatch<'_>) {
        self.particles.push(RecordedParticles {
            texture: batch.texture,
            blend: batch.blend,
            alpha_test: batch.alpha_test,
            vertices: batch.vertices.to_vec(),
            instances: batch.transforms.len(),
        });
    }

    fn draw_ribbon(&mut self, strip: &RibbonStrip<'_>) {
        self.ribbons.push(RecordedRibbon {
            texture: strip.texture,
            blend: strip.blend,
            vertices: strip.vertices.to_vec(),
            instances: strip.transforms.len(),
        });
    }

    fn draw_boxes(&mut self, boxes: &BoxDraw<'_>) {
        self.boxes.push(RecordedBoxes {
            vertex_buffer: boxes.vertex_buffer,
            indices: boxes.indices.to_vec(),
            transforms: boxes.transforms.to_vec(),
            color: boxes.color,
        });
    }
}
