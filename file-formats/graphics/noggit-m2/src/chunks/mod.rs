//! Fixed-layout records referenced from the M2 header (3.3.5 layout)

pub mod bone;
pub mod camera;
pub mod color;
pub mod light;
pub mod material;
pub mod particle_emitter;
pub mod ribbon_emitter;
pub mod sequence;
pub mod texture;
pub mod track;
pub mod vertex;

pub use bone::{M2Bone, M2BoneFlags};
pub use camera::M2Camera;
pub use color::{M2Color, M2TextureTransform, M2Transparency};
pub use light::{M2Light, M2LightType};
pub use material::{M2Material, M2RenderFlags};
pub use particle_emitter::{M2ParticleEmitter, M2ParticleFlags};
pub use ribbon_emitter::M2RibbonEmitter;
pub use sequence::{M2Sequence, M2SequenceFlags};
pub use texture::M2Texture;
pub use track::{M2FakeTrack, M2Track};
pub use vertex::M2Vertex;
