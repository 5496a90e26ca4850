//! M2 model runtime
//!
//! A [`Model`] is parsed once from file bytes, uploaded once to the render
//! thread and then animated and drawn every frame for all of its placements.
//!
//! # Lifecycle
//!
//! 1. [`Model::pending`] stands in for a model while its bytes are loading
//! 2. [`Model::load`] parses the `.m2` with its `.skin` and `.anim` companions
//! 3. the first [`Model::draw`] uploads buffers and textures and returns
//! 4. later draws animate, cull and issue one draw call per render pass
//!
//! # Usage
//!
//! ```rust,ignore
//! use noggit_m2::{DirectoryFiles, DrawOptions, Instance, Model, ViewState};
//!
//! let files = DirectoryFiles::new("data");
//! let bytes = files.read("world/generic/tree.m2")?;
//! let mut model = Model::load("world/generic/tree.m2", &bytes, &files)?;
//!
//! let instances = [Instance::new(1, Mat4::IDENTITY)];
//! model.draw(&mut backend, &instances, &view, time, &DrawOptions::default());
//! ```

mod animate;
mod components;
mod draw;
mod load;
mod pose;

use glam::{Mat4, Vec3};

pub use components::{
    DEFAULT_FIELD_OF_VIEW, ModelCamera, ModelColor, ModelLight, ModelTexture, ModelTransparency,
    TextureAnimation,
};
pub use draw::BOX_LINE_INDICES;
pub use pose::{FrameStamp, PoseStore};

use crate::animation::{AnimationClip, AnimationTime, BoneHierarchy, BonePose};
use crate::backend::{BufferHandle, LightState, ModelVertex, TextureHandle};
use crate::chunks::M2Material;
use crate::header::{BoundingBox, ModelFlags};
use crate::particles::{DEFAULT_MAX_PARTICLES, ParticleSystem, RibbonEmitter};
use crate::render::RenderPass;

/// Filename drawn in place of replaceable (skin, cape, ...) textures
pub const DEFAULT_PLACEHOLDER_TEXTURE: &str = "tileset/generic/black.blp";

/// Loading configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub placeholder_texture: String,
    /// Live particle limit per emitter
    pub max_particles: usize,
    /// Seed for particle randomness; `None` seeds from the thread RNG
    pub seed: Option<u64>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            placeholder_texture: DEFAULT_PLACEHOLDER_TEXTURE.to_string(),
            max_particles: DEFAULT_MAX_PARTICLES,
            seed: None,
        }
    }
}

/// Per-draw configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOptions {
    /// Clip index to animate
    pub animation: usize,
    pub fog: bool,
    pub particles: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            animation: 0,
            fog: true,
            particles: true,
        }
    }
}

/// What a draw did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct DrawStats {
    pub visible_instances: usize,
    pub draw_calls: usize,
    /// Passes hidden by geoset visibility or zero opacity
    pub skipped_passes: usize,
    pub particle_batches: usize,
    pub ribbon_strips: usize,
    /// The call uploaded the model instead of drawing it
    pub uploaded: bool,
}

/// Which parts of a model change over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct AnimationFlags {
    /// Any of the other flags, or animated colors and transparency
    pub animated: bool,
    /// Weighted vertices follow an animated or billboarded bone
    pub geometry: bool,
    /// Skinned geometry depends on the camera
    pub per_instance: bool,
    /// Bone matrices are needed at all
    pub bones: bool,
    pub textures: bool,
}

/// Bone indices and weights of one vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexWeights {
    pub bones: [u8; 4],
    /// Sum to 255
    pub weights: [u8; 4],
}

impl VertexWeights {
    pub fn influences(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.bones
            .iter()
            .zip(self.weights.iter())
            .filter(|(_, weight)| **weight > 0)
            .map(|(bone, weight)| (usize::from(*bone), f32::from(*weight) / 255.0))
    }
}

/// Buffers and textures owned by the backend
#[derive(Debug, Clone, PartialEq)]
struct GpuResources {
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    box_buffer: BufferHandle,
    textures: Vec<TextureHandle>,
}

/// Loaded M2 model with its per-frame state
#[derive(Debug)]
pub struct Model {
    path: String,
    finished: bool,
    flags: ModelFlags,
    global_sequences: Vec<u32>,
    clips: Vec<AnimationClip>,
    /// Bind-pose vertices
    vertices: Vec<ModelVertex>,
    weights: Vec<VertexWeights>,
    /// Vertices of the last evaluated pose
    current_vertices: Vec<ModelVertex>,
    indices: Vec<u16>,
    passes: Vec<RenderPass>,
    materials: Vec<M2Material>,
    textures: Vec<ModelTexture>,
    texture_lookup: Vec<u16>,
    texture_animation_lookup: Vec<u16>,
    transparency_lookup: Vec<u16>,
    colors: Vec<ModelColor>,
    transparencies: Vec<ModelTransparency>,
    texture_animations: Vec<TextureAnimation>,
    bones: BoneHierarchy,
    lights: Vec<ModelLight>,
    camera: Option<ModelCamera>,
    particles: Vec<ParticleSystem>,
    ribbons: Vec<RibbonEmitter>,
    geoset_visible: Vec<bool>,
    bounding_box: BoundingBox,
    bounding_radius: f32,
    animation: AnimationFlags,
    alpha: f32,
    warnings: Vec<String>,
    poses: PoseStore,
    at: AnimationTime,
    light_states: Vec<LightState>,
    texture_matrices: Vec<Mat4>,
    gpu: Option<GpuResources>,
}

impl Model {
    /// Placeholder for a model whose bytes are still loading
    ///
    /// Drawing a pending model does nothing.
    pub fn pending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            finished: false,
            flags: ModelFlags::empty(),
            global_sequences: Vec::new(),
            clips: Vec::new(),
            vertices: Vec::new(),
            weights: Vec::new(),
            current_vertices: Vec::new(),
            indices: Vec::new(),
            passes: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            texture_lookup: Vec::new(),
            texture_animation_lookup: Vec::new(),
            transparency_lookup: Vec::new(),
            colors: Vec::new(),
            transparencies: Vec::new(),
            texture_animations: Vec::new(),
            bones: BoneHierarchy::default(),
            lights: Vec::new(),
            camera: None,
            particles: Vec::new(),
            ribbons: Vec::new(),
            geoset_visible: Vec::new(),
            bounding_box: BoundingBox::default(),
            bounding_radius: 0.0,
            animation: AnimationFlags::default(),
            alpha: 1.0,
            warnings: Vec::new(),
            poses: PoseStore::new(false, 0),
            at: AnimationTime::default(),
            light_states: Vec::new(),
            texture_matrices: Vec::new(),
            gpu: None,
        }
    }

    /// Finished model without any content
    pub fn empty(path: impl Into<String>) -> Self {
        Self {
            finished: true,
            ..Self::pending(path)
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn finished_loading(&self) -> bool {
        self.finished
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn flags(&self) -> ModelFlags {
        self.flags
    }

    pub fn animation_flags(&self) -> AnimationFlags {
        self.animation
    }

    pub fn is_animated(&self) -> bool {
        self.animation.animated
    }

    pub fn global_sequences(&self) -> &[u32] {
        &self.global_sequences
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    /// Vertices of the last evaluated pose
    pub fn vertices(&self) -> &[ModelVertex] {
        &self.current_vertices
    }

    pub fn bind_vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn vertex_weights(&self) -> &[VertexWeights] {
        &self.weights
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Render passes in draw order
    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    pub fn materials(&self) -> &[M2Material] {
        &self.materials
    }

    pub fn textures(&self) -> &[ModelTexture] {
        &self.textures
    }

    pub fn colors(&self) -> &[ModelColor] {
        &self.colors
    }

    pub fn transparencies(&self) -> &[ModelTransparency] {
        &self.transparencies
    }

    pub fn texture_animations(&self) -> &[TextureAnimation] {
        &self.texture_animations
    }

    pub fn bones(&self) -> &BoneHierarchy {
        &self.bones
    }

    pub fn lights(&self) -> &[ModelLight] {
        &self.lights
    }

    pub fn camera(&self) -> Option<&ModelCamera> {
        self.camera.as_ref()
    }

    pub fn particles(&self) -> &[ParticleSystem] {
        &self.particles
    }

    pub fn ribbons(&self) -> &[RibbonEmitter] {
        &self.ribbons
    }

    /// Bounding box in editor coordinates
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    /// Corners of the bounding box in the order used by
    /// [`BOX_LINE_INDICES`]
    pub fn box_points(&self) -> [Vec3; 8] {
        box_points(self.bounding_box.min, self.bounding_box.max)
    }

    /// Problems that degraded the model without failing the load
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Opacity multiplied into every pass
    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn geoset_count(&self) -> usize {
        self.geoset_visible.len()
    }

    pub fn is_geoset_visible(&self, geoset: usize) -> bool {
        self.geoset_visible.get(geoset).copied().unwrap_or(true)
    }

    /// Show or hide one submesh; unknown submeshes are ignored
    pub fn set_geoset_visible(&mut self, geoset: usize, visible: bool) {
        if let Some(slot) = self.geoset_visible.get_mut(geoset) {
            *slot = visible;
        }
    }

    pub fn is_per_instance(&self) -> bool {
        self.poses.is_per_instance()
    }

    /// Pose of `instance`, or the model-level pose for `None`
    pub fn pose(&self, instance: Option<u32>) -> Option<&BonePose> {
        self.poses.pose(instance)
    }

    /// Time of the last evaluation
    pub fn current_time(&self) -> AnimationTime {
        self.at
    }

    /// Light states of the last evaluation
    pub fn light_states(&self) -> &[LightState] {
        &self.light_states
    }

    /// Texture matrix of texture animation `index`
    pub fn texture_matrix(&self, index: usize) -> Mat4 {
        self.texture_matrices
            .get(index)
            .copied()
            .unwrap_or(Mat4::IDENTITY)
    }
}

/// Corners of an axis-aligned box
///
/// Index bits: 4 selects `min.x`, 2 selects `min.y`, 1 selects `min.z`.
pub fn box_points(min: Vec3, max: Vec3) -> [Vec3; 8] {
    std::array::from_fn(|i| {
        Vec3::new(
            if i & 4 == 0 { max.x } else { min.x },
            if i & 2 == 0 { max.y } else { min.y },
            if i & 1 == 0 { max.z } else { min.z },
        )
    })
}
