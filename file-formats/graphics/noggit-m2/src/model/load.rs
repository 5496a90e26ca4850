//! Parsing a model and its companion files

use glam::Mat4;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::animate::Target;
use super::components::{
    ModelCamera, ModelColor, ModelLight, ModelTexture, ModelTransparency, TextureAnimation,
};
use super::pose::PoseStore;
use super::{AnimationFlags, LoadOptions, Model, VertexWeights};
use crate::animation::{
    AnimationClip, AnimationTime, BillboardBasis, Bone, BoneHierarchy, TrackSource,
};
use crate::backend::ModelVertex;
use crate::chunks::{
    M2Bone, M2Camera, M2Color, M2Light, M2Material, M2ParticleEmitter, M2RibbonEmitter,
    M2Sequence, M2Texture, M2TextureTransform, M2Transparency, M2Vertex,
};
use crate::coordinate::fix_vector;
use crate::error::{LoadError, Result};
use crate::files::{FileProvider, anim_path, skin_path};
use crate::header::{BoundingBox, ModelHeader};
use crate::particles::{ParticleSystem, RibbonEmitter};
use crate::reader::RecordReader;
use crate::render::{RenderPass, ShaderTables, derive_shader_ids, sort_passes};
use crate::skin::Skin;

/// Classify which parts of the model animate
fn classify(
    vertices: &[M2Vertex],
    bones: &[M2Bone],
    header: &ModelHeader,
    colors: &[M2Color],
    transparencies: &[M2Transparency],
) -> Result<AnimationFlags> {
    let mut flags = AnimationFlags::default();

    'vertices: for vertex in vertices {
        for (index, _) in vertex.influences() {
            let bone = bones.get(index).ok_or_else(|| {
                LoadError::corrupt(format!(
                    "vertex references bone {index} of {}",
                    bones.len()
                ))
            })?;
            if bone.has_animated_track() || bone.is_billboard() {
                flags.geometry = true;
                flags.per_instance = bone.is_billboard();
                break 'vertices;
            }
        }
    }

    flags.bones = flags.geometry
        || !header.particle_emitters.is_empty()
        || !header.ribbon_emitters.is_empty()
        || !header.lights.is_empty()
        || !header.cameras.is_empty()
        || bones.iter().any(M2Bone::has_animated_track);
    flags.textures = !header.texture_animations.is_empty();

    let animated_colors = colors
        .iter()
        .any(|c| c.color.interpolation != 0 || c.opacity.interpolation != 0);
    let animated_transparency = transparencies.iter().any(|t| t.alpha.interpolation != 0);

    flags.animated = flags.geometry
        || flags.bones
        || flags.textures
        || animated_colors
        || animated_transparency;
    Ok(flags)
}

fn particle_rng(options: &LoadOptions, index: usize) -> StdRng {
    match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Bounding box converted into editor coordinates
fn editor_box(bounds: BoundingBox) -> BoundingBox {
    let a = fix_vector(bounds.min);
    let b = fix_vector(bounds.max);
    BoundingBox {
        min: a.min(b),
        max: a.max(b),
    }
}

impl Model {
    /// Parse a model with the default [`LoadOptions`]
    pub fn load(path: &str, data: &[u8], files: &dyn FileProvider) -> Result<Self> {
        Self::load_with(path, data, files, &LoadOptions::default())
    }

    /// Parse a model; companions are read from `files`
    ///
    /// A missing `.skin` or `.anim` file degrades the model and is recorded
    /// in [`Model::warnings`]. Malformed data fails the load.
    pub fn load_with(
        path: &str,
        data: &[u8],
        files: &dyn FileProvider,
        options: &LoadOptions,
    ) -> Result<Self> {
        log::debug!("Loading model \"{path}\"");

        let reader = RecordReader::new(data);
        let header = ModelHeader::parse(&reader)?;
        let blend_override = header.blend_override(&reader)?;

        let mut model = Self::pending(path);
        model.flags = header.flags;
        model.bounding_box = editor_box(header.bounding_box);
        model.bounding_radius = header.bounding_radius;
        let global_sequences: Vec<u32> =
            reader.array(header.global_sequences, "global sequences")?;
        let sequences: Vec<M2Sequence> = reader.array(header.animations, "animations")?;
        let clips: Vec<AnimationClip> = sequences.iter().map(AnimationClip::from).collect();

        let raw_vertices: Vec<M2Vertex> = reader.array(header.vertices, "vertices")?;
        let raw_bones: Vec<M2Bone> = reader.array(header.bones, "bones")?;
        let raw_colors: Vec<M2Color> = reader.array(header.colors, "colors")?;
        let raw_transparency: Vec<M2Transparency> =
            reader.array(header.transparency, "transparency")?;

        model.animation = classify(
            &raw_vertices,
            &raw_bones,
            &header,
            &raw_colors,
            &raw_transparency,
        )?;

        model.vertices = raw_vertices
            .iter()
            .map(|v| ModelVertex {
                position: fix_vector(v.position),
                normal: fix_vector(v.normal),
                tex_coords: v.tex_coords,
            })
            .collect();
        model.weights = raw_vertices
            .iter()
            .map(|v| VertexWeights {
                bones: v.bone_indices,
                weights: v.bone_weights,
            })
            .collect();
        model.current_vertices = model.vertices.clone();

        let raw_textures: Vec<M2Texture> = reader.array(header.textures, "textures")?;
        model.textures = raw_textures
            .iter()
            .map(|t| ModelTexture::read(t, &reader, &options.placeholder_texture))
            .collect::<Result<_>>()?;

        // Side files are only needed for per-frame animation
        let side_data: Vec<Option<Vec<u8>>> = if model.animation.animated {
            model.read_side_files(&clips, files)
        } else {
            Vec::new()
        };
        let side: Vec<Option<RecordReader<'_>>> = side_data
            .iter()
            .map(|data| data.as_deref().map(RecordReader::new))
            .collect();
        let source = TrackSource {
            main: reader,
            side: &side,
            clips: &clips,
            global_sequences: &global_sequences,
        };

        let colors = raw_colors
            .iter()
            .map(|c| ModelColor::read(c, &source))
            .collect::<Result<Vec<_>>>()?;
        let transparencies = raw_transparency
            .iter()
            .map(|t| ModelTransparency::read(t, &source))
            .collect::<Result<Vec<_>>>()?;

        let materials: Vec<M2Material> = reader.array(header.render_flags, "render flags")?;
        let texture_unit_lookup: Vec<u16> =
            reader.array(header.texture_unit_lookup, "texture unit lookup")?;
        let transparency_lookup: Vec<u16> =
            reader.array(header.transparency_lookup, "transparency lookup")?;
        let texture_lookup: Vec<u16> = reader.array(header.texture_lookup, "texture lookup")?;
        let texture_animation_lookup: Vec<u16> =
            reader.array(header.texture_animation_lookup, "texture animation lookup")?;

        if header.views > 0 {
            match files.read(&skin_path(path)) {
                Ok(skin_data) => {
                    let skin = Skin::parse(&skin_data)?;
                    model.indices = skin.resolve_indices(model.vertices.len())?;
                    model.passes = build_passes(&skin, &materials, model.indices.len())?;
                    model.geoset_visible = vec![true; skin.submeshes.len()];

                    let tables = ShaderTables {
                        materials: &materials,
                        texture_unit_lookup: &texture_unit_lookup,
                        transparency_lookup: &transparency_lookup,
                        blend_override: blend_override.as_deref(),
                    };
                    derive_shader_ids(&mut model.passes, &tables)?;
                    sort_passes(&mut model.passes);
                }
                Err(LoadError::MissingCompanionFile(name)) => {
                    model.warn(format!("Skin file {name} is missing, model has no geometry"));
                }
                Err(err) => return Err(err),
            }
        }

        if model.animation.animated {
            model.read_animated(&reader, &source, &header, &raw_bones, options)?;
        }

        model.global_sequences = global_sequences;
        model.clips = clips;
        model.colors = colors;
        model.transparencies = transparencies;
        model.materials = materials;
        model.texture_lookup = texture_lookup;
        model.texture_animation_lookup = texture_animation_lookup;
        model.transparency_lookup = transparency_lookup;

        model.poses = PoseStore::new(model.animation.per_instance, model.bones.len());
        if model.animation.animated {
            model.evaluate(AnimationTime::default(), &BillboardBasis::IDENTITY, Target::Model);
        }

        model.finished = true;
        log::debug!(
            "Loaded model \"{path}\": {} vertices, {} passes, {} bones, {} clips",
            model.vertices.len(),
            model.passes.len(),
            model.bones.len(),
            model.clips.len()
        );
        Ok(model)
    }

    /// Parse a model, falling back to an empty finished model on error
    pub fn load_or_empty(
        path: &str,
        data: &[u8],
        files: &dyn FileProvider,
        options: &LoadOptions,
    ) -> Self {
        match Self::load_with(path, data, files, options) {
            Ok(model) => model,
            Err(err) => {
                log::error!("Error loading model \"{path}\": {err}");
                Self::empty(path)
            }
        }
    }

    fn warn(&mut self, message: String) {
        log::warn!("{}: {message}", self.path);
        self.warnings.push(message);
    }

    /// Read the `.anim` file of every clip whose keyframes are not embedded
    fn read_side_files(
        &mut self,
        clips: &[AnimationClip],
        files: &dyn FileProvider,
    ) -> Vec<Option<Vec<u8>>> {
        let mut side = Vec::with_capacity(clips.len());
        for clip in clips {
            if clip.is_embedded() {
                side.push(None);
                continue;
            }
            let name = anim_path(&self.path, clip.animation_id, clip.sub_animation_id);
            match files.read(&name) {
                Ok(data) => side.push(Some(data)),
                Err(err) => {
                    self.warn(format!("Animation file {name} unavailable: {err}"));
                    side.push(None);
                }
            }
        }
        side
    }

    fn read_animated(
        &mut self,
        reader: &RecordReader<'_>,
        source: &TrackSource<'_>,
        header: &ModelHeader,
        raw_bones: &[M2Bone],
        options: &LoadOptions,
    ) -> Result<()> {
        if self.animation.bones {
            let bones = raw_bones
                .iter()
                .map(|b| Bone::read(b, source))
                .collect::<Result<Vec<_>>>()?;
            self.bones = BoneHierarchy::new(bones);
        }

        if self.animation.textures {
            let records: Vec<M2TextureTransform> =
                reader.array(header.texture_animations, "texture animations")?;
            self.texture_animations = records
                .iter()
                .map(|t| TextureAnimation::read(t, source))
                .collect::<Result<_>>()?;
            self.texture_matrices = vec![Mat4::IDENTITY; self.texture_animations.len()];
        }

        let emitters: Vec<M2ParticleEmitter> =
            reader.array(header.particle_emitters, "particle emitters")?;
        for (index, record) in emitters.iter().enumerate() {
            let rng = particle_rng(options, index);
            match ParticleSystem::read(record, source, rng, options.max_particles) {
                Ok(system) => self.particles.push(system),
                Err(LoadError::CorruptModelData(reason)) => {
                    self.warn(format!("Skipping particle emitter {index}: {reason}"));
                }
                Err(err) => return Err(err),
            }
        }

        let ribbons: Vec<M2RibbonEmitter> =
            reader.array(header.ribbon_emitters, "ribbon emitters")?;
        self.ribbons = ribbons
            .iter()
            .map(|r| RibbonEmitter::read(r, source))
            .collect::<Result<_>>()?;

        let cameras: Vec<M2Camera> = reader.array(header.cameras, "cameras")?;
        self.camera = cameras
            .first()
            .map(|c| ModelCamera::read(c, source))
            .transpose()?;

        let lights: Vec<M2Light> = reader.array(header.lights, "lights")?;
        self.lights = lights
            .iter()
            .map(|l| ModelLight::read(l, source))
            .collect::<Result<_>>()?;
        Ok(())
    }
}

/// One render pass per texture unit of the skin
fn build_passes(skin: &Skin, materials: &[M2Material], index_count: usize) -> Result<Vec<RenderPass>> {
    skin.batches
        .iter()
        .map(|batch| {
            let submesh = skin.submeshes.get(usize::from(batch.submesh)).ok_or_else(|| {
                LoadError::corrupt(format!(
                    "texture unit references submesh {} of {}",
                    batch.submesh,
                    skin.submeshes.len()
                ))
            })?;
            let material = materials
                .get(usize::from(batch.render_flag_index))
                .ok_or_else(|| {
                    LoadError::corrupt(format!(
                        "texture unit references render flag {} of {}",
                        batch.render_flag_index,
                        materials.len()
                    ))
                })?;

            let pass = RenderPass::from_batch(batch, submesh, material);
            let end = pass.index_start as usize + pass.index_count as usize;
            if end > index_count {
                return Err(LoadError::corrupt(format!(
                    "submesh {} indexes {end} of {index_count} triangles indices",
                    batch.submesh
                )));
            }
            Ok(pass)
        })
        .collect()
}
