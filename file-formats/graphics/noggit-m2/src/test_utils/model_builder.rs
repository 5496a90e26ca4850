//! Synthesized model files
//!
//! [`ModelBuilder`] lays out a 3.3.5 `MD20` file with its first `.skin` and
//! the `.anim` side files of clips whose keyframes are stored externally.
//! Positions and directions are given in file coordinates (Z up).

use bytes::BufMut;
use glam::{Quat, Vec2, Vec3};

use crate::chunks::{M2BoneFlags, M2FakeTrack, M2Material, M2RenderFlags, M2Track, M2Vertex};
use crate::files::{MemoryFiles, anim_path, skin_path};
use crate::header::{BoundingBox, HEADER_SIZE, M2_MAGIC, ModelFlags, VERSION_WOTLK, offsets};
use crate::reader::{CompressedQuat, M2Array};
use crate::skin::{SKIN_MAGIC, SkinBatch};

/// Value that can be written into a model file
pub trait Put {
    fn put(&self, out: &mut Vec<u8>);
}

impl Put for u8 {
    fn put(&self, out: &mut Vec<u8>) {
        out.put_u8(*self);
    }
}

impl Put for u16 {
    fn put(&self, out: &mut Vec<u8>) {
        out.put_u16_le(*self);
    }
}

impl Put for i16 {
    fn put(&self, out: &mut Vec<u8>) {
        out.put_i16_le(*self);
    }
}

impl Put for u32 {
    fn put(&self, out: &mut Vec<u8>) {
        out.put_u32_le(*self);
    }
}

impl Put for f32 {
    fn put(&self, out: &mut Vec<u8>) {
        out.put_f32_le(*self);
    }
}

impl Put for Vec2 {
    fn put(&self, out: &mut Vec<u8>) {
        self.x.put(out);
        self.y.put(out);
    }
}

impl Put for Vec3 {
    fn put(&self, out: &mut Vec<u8>) {
        self.x.put(out);
        self.y.put(out);
        self.z.put(out);
    }
}

impl Put for Quat {
    fn put(&self, out: &mut Vec<u8>) {
        for component in self.to_array() {
            component.put(out);
        }
    }
}

impl Put for CompressedQuat {
    fn put(&self, out: &mut Vec<u8>) {
        for component in [self.x, self.y, self.z, self.w] {
            component.put(out);
        }
    }
}

impl<T: Put, const N: usize> Put for [T; N] {
    fn put(&self, out: &mut Vec<u8>) {
        for item in self {
            item.put(out);
        }
    }
}

impl Put for M2Array {
    fn put(&self, out: &mut Vec<u8>) {
        self.count.put(out);
        self.offset.put(out);
    }
}

impl Put for M2Track {
    fn put(&self, out: &mut Vec<u8>) {
        self.interpolation.put(out);
        self.global_sequence.put(out);
        self.timestamps.put(out);
        self.values.put(out);
    }
}

impl Put for M2FakeTrack {
    fn put(&self, out: &mut Vec<u8>) {
        self.timestamps.put(out);
        self.values.put(out);
    }
}

impl Put for M2Vertex {
    fn put(&self, out: &mut Vec<u8>) {
        self.position.put(out);
        self.bone_weights.put(out);
        self.bone_indices.put(out);
        self.normal.put(out);
        self.tex_coords.put(out);
    }
}

impl Put for M2Material {
    fn put(&self, out: &mut Vec<u8>) {
        self.flags.bits().put(out);
        self.blend_mode.put(out);
    }
}

impl Put for SkinBatch {
    fn put(&self, out: &mut Vec<u8>) {
        self.flags.put(out);
        out.put_i8(self.priority_plane);
        self.shader_id.put(out);
        self.submesh.put(out);
        self.geoset_index.put(out);
        self.color_index.put(out);
        self.render_flag_index.put(out);
        self.material_layer.put(out);
        self.texture_count.put(out);
        self.texture_combo_index.put(out);
        self.texture_coord_combo_index.put(out);
        self.transparency_combo_index.put(out);
        self.texture_animation_combo_index.put(out);
    }
}

/// Pack a unit quaternion the way bone rotation keys store it
pub fn compress_quat(q: Quat) -> CompressedQuat {
    let pack = |value: f32| {
        let scaled = value * 32767.0;
        if value >= 0.0 {
            (scaled - 32768.0).round() as i16
        } else {
            (scaled + 32767.0).round() as i16
        }
    };
    CompressedQuat {
        x: pack(q.x),
        y: pack(q.y),
        z: pack(q.z),
        w: pack(q.w),
    }
}

/// Keyframes of one track
#[derive(Debug, Clone, PartialEq)]
pub struct Keys<T> {
    pub interpolation: u16,
    pub global_sequence: i16,
    /// `(timestamps, values)` per clip; hermite values hold triplets
    pub clips: Vec<(Vec<u32>, Vec<T>)>,
    /// Write the first list for every clip
    pub repeat: bool,
}

impl<T: Copy> Keys<T> {
    /// Track without interpolation or keys
    pub fn none() -> Self {
        Self {
            interpolation: 0,
            global_sequence: -1,
            clips: Vec::new(),
            repeat: false,
        }
    }

    /// Linear keys shared by every clip
    pub fn linear(keys: &[(u32, T)]) -> Self {
        Self {
            interpolation: 1,
            global_sequence: -1,
            clips: vec![Self::split(keys)],
            repeat: true,
        }
    }

    pub fn constant(value: T) -> Self {
        Self::linear(&[(0, value)])
    }

    /// Linear keys, one list per clip
    pub fn per_clip(clips: &[&[(u32, T)]]) -> Self {
        Self {
            interpolation: 1,
            global_sequence: -1,
            clips: clips.iter().map(|keys| Self::split(keys)).collect(),
            repeat: false,
        }
    }

    /// Linear keys driven by global sequence `sequence`
    pub fn global(sequence: i16, keys: &[(u32, T)]) -> Self {
        Self {
            interpolation: 1,
            global_sequence: sequence,
            clips: vec![Self::split(keys)],
            repeat: false,
        }
    }

    /// `(time, value, in_tangent, out_tangent)` keys shared by every clip
    pub fn hermite(keys: &[(u32, T, T, T)]) -> Self {
        Self {
            interpolation: 2,
            global_sequence: -1,
            clips: vec![(
                keys.iter().map(|key| key.0).collect(),
                keys.iter().flat_map(|key| [key.1, key.2, key.3]).collect(),
            )],
            repeat: true,
        }
    }

    #[must_use]
    pub fn with_interpolation(mut self, interpolation: u16) -> Self {
        self.interpolation = interpolation;
        self
    }

    fn split(keys: &[(u32, T)]) -> (Vec<u32>, Vec<T>) {
        (
            keys.iter().map(|key| key.0).collect(),
            keys.iter().map(|key| key.1).collect(),
        )
    }

    fn lists(&self, clip_count: usize) -> Vec<(Vec<u32>, Vec<T>)> {
        if self.repeat && self.global_sequence < 0 {
            let first = self.clips.first().cloned().unwrap_or_default();
            vec![first; clip_count.max(1)]
        } else {
            self.clips.clone()
        }
    }
}

/// Animation clip record
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSpec {
    pub animation_id: u16,
    pub sub_animation_id: u16,
    pub length: u32,
    /// Keyframes live in the `.m2` rather than an `.anim` file
    pub embedded: bool,
}

impl SequenceSpec {
    pub fn embedded(animation_id: u16, length: u32) -> Self {
        Self {
            animation_id,
            sub_animation_id: 0,
            length,
            embedded: true,
        }
    }

    pub fn external(animation_id: u16, length: u32) -> Self {
        Self {
            embedded: false,
            ..Self::embedded(animation_id, length)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneSpec {
    pub parent: i16,
    pub pivot: Vec3,
    pub flags: M2BoneFlags,
    pub translation: Keys<Vec3>,
    pub rotation: Keys<CompressedQuat>,
    pub scale: Keys<Vec3>,
}

impl BoneSpec {
    pub fn root() -> Self {
        Self::child(-1)
    }

    pub fn child(parent: i16) -> Self {
        Self {
            parent,
            pivot: Vec3::ZERO,
            flags: M2BoneFlags::empty(),
            translation: Keys::none(),
            rotation: Keys::none(),
            scale: Keys::none(),
        }
    }

    #[must_use]
    pub fn billboard(mut self) -> Self {
        self.flags |= M2BoneFlags::SPHERICAL_BILLBOARD;
        self
    }

    #[must_use]
    pub fn translation(mut self, keys: Keys<Vec3>) -> Self {
        self.translation = keys;
        self
    }

    #[must_use]
    pub fn rotation(mut self, keys: Keys<CompressedQuat>) -> Self {
        self.rotation = keys;
        self
    }
}

/// Color record: RGB in 0..1 and fixed16 opacity
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpec {
    pub color: Keys<Vec3>,
    pub opacity: Keys<i16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightSpec {
    pub light_type: u16,
    pub bone: i16,
    pub position: Vec3,
    pub ambient_color: Keys<Vec3>,
    pub ambient_intensity: Keys<f32>,
    pub diffuse_color: Keys<Vec3>,
    pub diffuse_intensity: Keys<f32>,
}

impl LightSpec {
    /// Point light with a constant diffuse color
    pub fn point(bone: i16, position: Vec3, diffuse: Vec3) -> Self {
        Self {
            light_type: 1,
            bone,
            position,
            ambient_color: Keys::none(),
            ambient_intensity: Keys::none(),
            diffuse_color: Keys::constant(diffuse),
            diffuse_intensity: Keys::constant(1.0),
        }
    }
}

/// Camera with static position and target; spline keys are `[value, in, out]`
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSpec {
    pub position: Vec3,
    pub target: Vec3,
    pub near_clip: f32,
    pub far_clip: f32,
    pub field_of_view: Keys<[f32; 3]>,
}

impl CameraSpec {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            near_clip: 0.1,
            far_clip: 100.0,
            field_of_view: Keys::none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSpec {
    pub flags: u32,
    pub emitter_type: u8,
    pub blend_mode: u8,
    pub bone: u16,
    pub texture: u16,
    pub position: Vec3,
    pub rows: u16,
    pub columns: u16,
    pub speed: Keys<f32>,
    pub gravity: Keys<f32>,
    pub lifespan: Keys<f32>,
    pub rate: Keys<f32>,
    pub area_length: Keys<f32>,
    pub area_width: Keys<f32>,
    pub enabled: Keys<u8>,
    /// Ramp colors in 0..255
    pub colors: Vec<Vec3>,
    pub sizes: Vec<Vec2>,
}

impl ParticleSpec {
    /// Emitter spawning `rate` particles per second living `lifespan` seconds
    pub fn new(emitter_type: u8, rate: f32, lifespan: f32) -> Self {
        Self {
            flags: 0,
            emitter_type,
            blend_mode: 2,
            bone: 0,
            texture: 0,
            position: Vec3::ZERO,
            rows: 1,
            columns: 1,
            speed: Keys::constant(1.0),
            gravity: Keys::none(),
            lifespan: Keys::constant(lifespan),
            rate: Keys::constant(rate),
            area_length: Keys::constant(1.0),
            area_width: Keys::constant(1.0),
            enabled: Keys::none(),
            colors: vec![Vec3::splat(255.0)],
            sizes: vec![Vec2::ONE],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RibbonSpec {
    pub bone: i32,
    pub position: Vec3,
    pub texture: u16,
    pub edges_per_second: f32,
    pub edge_lifetime: f32,
    pub color: Keys<Vec3>,
    pub opacity: Keys<i16>,
    pub above: Keys<f32>,
    pub below: Keys<f32>,
}

impl RibbonSpec {
    pub fn new(bone: i32, edges_per_second: f32, edge_lifetime: f32) -> Self {
        Self {
            bone,
            position: Vec3::ZERO,
            texture: 0,
            edges_per_second,
            edge_lifetime,
            color: Keys::constant(Vec3::ONE),
            opacity: Keys::constant(i16::MAX),
            above: Keys::constant(0.5),
            below: Keys::constant(0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubmeshSpec {
    pub level: u16,
    pub vertex_start: u16,
    pub vertex_count: u16,
    pub index_start: u16,
    pub index_count: u16,
    pub sort_center: Vec3,
}

/// First level-of-detail skin
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkinSpec {
    pub vertex_lookup: Vec<u16>,
    pub triangles: Vec<u16>,
    pub submeshes: Vec<SubmeshSpec>,
    pub batches: Vec<SkinBatch>,
}

impl SkinSpec {
    /// Identity vertex lookup over `vertex_count` vertices, one submesh
    /// covering `triangles`
    pub fn single(vertex_count: u16, triangles: Vec<u16>) -> Self {
        let index_count = u16::try_from(triangles.len()).unwrap_or(u16::MAX);
        Self {
            vertex_lookup: (0..vertex_count).collect(),
            triangles,
            submeshes: vec![SubmeshSpec {
                vertex_count,
                index_count,
                ..SubmeshSpec::default()
            }],
            batches: Vec::new(),
        }
    }

    /// Texture unit drawing submesh 0 with one texture
    pub fn batch(render_flag_index: u16) -> SkinBatch {
        SkinBatch {
            color_index: -1,
            render_flag_index,
            texture_count: 1,
            ..SkinBatch::default()
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut data = vec![0u8; 48];
        data[..4].copy_from_slice(&SKIN_MAGIC);

        let vertex_lookup = place(&mut data, &self.vertex_lookup);
        let triangles = place(&mut data, &self.triangles);
        let mut submeshes = Vec::new();
        for submesh in &self.submeshes {
            0u16.put(&mut submeshes);
            submesh.level.put(&mut submeshes);
            submesh.vertex_start.put(&mut submeshes);
            submesh.vertex_count.put(&mut submeshes);
            submesh.index_start.put(&mut submeshes);
            submesh.index_count.put(&mut submeshes);
            [0u16; 4].put(&mut submeshes);
            submesh.sort_center.put(&mut submeshes);
            submesh.sort_center.put(&mut submeshes);
            0.0f32.put(&mut submeshes);
        }
        let submesh_offset = data.len() as u32;
        data.extend_from_slice(&submeshes);
        let batches = place(&mut data, &self.batches);

        let mut header = Vec::with_capacity(44);
        vertex_lookup.put(&mut header);
        triangles.put(&mut header);
        M2Array::default().put(&mut header);
        M2Array::new(self.submeshes.len() as u32, submesh_offset).put(&mut header);
        batches.put(&mut header);
        0u32.put(&mut header);
        data[4..48].copy_from_slice(&header);
        data
    }
}

/// Append `values` to `buffer` and return the reference to them
fn place<T: Put>(buffer: &mut Vec<u8>, values: &[T]) -> M2Array {
    if values.is_empty() {
        return M2Array::default();
    }
    let offset = buffer.len() as u32;
    for value in values {
        value.put(buffer);
    }
    M2Array::new(values.len() as u32, offset)
}

/// Main file body plus the side file of every external clip
struct Blobs {
    main: Vec<u8>,
    side: Vec<Option<Vec<u8>>>,
}

impl Blobs {
    fn array<T: Put>(&mut self, values: &[T]) -> M2Array {
        place(&mut self.main, values)
    }

    fn track<T: Put + Copy>(&mut self, keys: &Keys<T>) -> M2Track {
        let mut times = Vec::new();
        let mut values = Vec::new();
        for (clip, (clip_times, clip_values)) in keys.lists(self.side.len()).iter().enumerate() {
            let buffer = match self.side.get_mut(clip) {
                Some(Some(side)) if keys.global_sequence < 0 => side,
                _ => &mut self.main,
            };
            times.push(place(buffer, clip_times));
            values.push(place(buffer, clip_values));
        }
        M2Track {
            interpolation: keys.interpolation,
            global_sequence: keys.global_sequence,
            timestamps: self.array(&times),
            values: self.array(&values),
        }
    }

    fn fake_track<T: Put>(&mut self, values: &[T]) -> M2FakeTrack {
        let times: Vec<i16> = (0..values.len())
            .map(|i| i16::try_from(i * 32767 / values.len().max(2).saturating_sub(1)).unwrap_or(0))
            .collect();
        M2FakeTrack {
            timestamps: self.array(&times),
            values: self.array(values),
        }
    }

    /// Append pre-encoded records and return the reference to them
    fn records(&mut self, count: usize, bytes: &[u8]) -> M2Array {
        if count == 0 {
            return M2Array::default();
        }
        let offset = self.main.len() as u32;
        self.main.extend_from_slice(bytes);
        M2Array::new(count as u32, offset)
    }
}

/// Bytes of a synthesized model and its companions
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltModel {
    pub m2: Vec<u8>,
    pub skin: Option<Vec<u8>>,
    /// `(animation_id, sub_animation_id, bytes)`
    pub anims: Vec<(u16, u16, Vec<u8>)>,
}

impl BuiltModel {
    /// Companion files keyed by the paths derived from `path`
    pub fn files(&self, path: &str) -> MemoryFiles {
        let mut files = MemoryFiles::new();
        files.insert(path, self.m2.clone());
        if let Some(skin) = &self.skin {
            files.insert(&skin_path(path), skin.clone());
        }
        for (animation_id, sub_animation_id, data) in &self.anims {
            files.insert(&anim_path(path, *animation_id, *sub_animation_id), data.clone());
        }
        files
    }
}

/// Description of a model to synthesize
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBuilder {
    pub magic: [u8; 4],
    pub version: u32,
    pub global_sequences: Vec<u32>,
    pub sequences: Vec<SequenceSpec>,
    pub bones: Vec<BoneSpec>,
    pub vertices: Vec<M2Vertex>,
    /// `(texture_type, filename)`
    pub textures: Vec<(u32, String)>,
    pub materials: Vec<M2Material>,
    pub colors: Vec<ColorSpec>,
    /// Fixed16 alpha tracks
    pub transparencies: Vec<Keys<i16>>,
    /// `(translation, scale)` tracks
    pub texture_animations: Vec<(Keys<Vec3>, Keys<Vec3>)>,
    pub texture_lookup: Vec<u16>,
    pub texture_unit_lookup: Vec<u16>,
    pub transparency_lookup: Vec<u16>,
    pub texture_animation_lookup: Vec<u16>,
    pub blend_override: Option<Vec<u16>>,
    pub bounding_box: BoundingBox,
    pub bounding_radius: f32,
    pub lights: Vec<LightSpec>,
    pub cameras: Vec<CameraSpec>,
    pub particles: Vec<ParticleSpec>,
    pub ribbons: Vec<RibbonSpec>,
    pub skin: Option<SkinSpec>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    /// Valid header with no content
    pub fn new() -> Self {
        Self {
            magic: M2_MAGIC,
            version: VERSION_WOTLK,
            global_sequences: Vec::new(),
            sequences: Vec::new(),
            bones: Vec::new(),
            vertices: Vec::new(),
            textures: Vec::new(),
            materials: Vec::new(),
            colors: Vec::new(),
            transparencies: Vec::new(),
            texture_animations: Vec::new(),
            texture_lookup: Vec::new(),
            texture_unit_lookup: Vec::new(),
            transparency_lookup: Vec::new(),
            texture_animation_lookup: Vec::new(),
            blend_override: None,
            bounding_box: BoundingBox::default(),
            bounding_radius: 0.0,
            lights: Vec::new(),
            cameras: Vec::new(),
            particles: Vec::new(),
            ribbons: Vec::new(),
            skin: None,
        }
    }

    /// One bone, one triangle, one opaque single-texture pass
    pub fn triangle() -> Self {
        let vertex = |position: Vec3| M2Vertex {
            position,
            bone_weights: [255, 0, 0, 0],
            normal: Vec3::Z,
            ..M2Vertex::default()
        };

        let mut skin = SkinSpec::single(3, vec![0, 1, 2]);
        skin.batches.push(SkinSpec::batch(0));

        Self {
            bones: vec![BoneSpec::root()],
            vertices: vec![vertex(Vec3::ZERO), vertex(Vec3::X), vertex(Vec3::Y)],
            textures: vec![(0, "world/generic/test.blp".to_string())],
            materials: vec![M2Material {
                flags: M2RenderFlags::empty(),
                blend_mode: 0,
            }],
            texture_lookup: vec![0],
            texture_unit_lookup: vec![0],
            transparency_lookup: vec![0],
            texture_animation_lookup: vec![0xFFFF],
            transparencies: vec![Keys::none()],
            bounding_box: BoundingBox {
                min: Vec3::ZERO,
                max: Vec3::new(1.0, 1.0, 0.0),
            },
            bounding_radius: 1.0,
            skin: Some(skin),
            ..Self::new()
        }
    }

    #[must_use]
    pub fn sequence(mut self, sequence: SequenceSpec) -> Self {
        self.sequences.push(sequence);
        self
    }

    #[must_use]
    pub fn global_sequence(mut self, length: u32) -> Self {
        self.global_sequences.push(length);
        self
    }

    #[must_use]
    pub fn bone(mut self, bone: BoneSpec) -> Self {
        self.bones.push(bone);
        self
    }

    /// Replace bone `index`
    #[must_use]
    pub fn with_bone(mut self, index: usize, bone: BoneSpec) -> Self {
        if let Some(slot) = self.bones.get_mut(index) {
            *slot = bone;
        }
        self
    }

    #[must_use]
    pub fn color(mut self, color: ColorSpec) -> Self {
        self.colors.push(color);
        self
    }

    #[must_use]
    pub fn light(mut self, light: LightSpec) -> Self {
        self.lights.push(light);
        self
    }

    #[must_use]
    pub fn camera(mut self, camera: CameraSpec) -> Self {
        self.cameras.push(camera);
        self
    }

    #[must_use]
    pub fn particle_emitter(mut self, emitter: ParticleSpec) -> Self {
        self.particles.push(emitter);
        self
    }

    #[must_use]
    pub fn ribbon(mut self, ribbon: RibbonSpec) -> Self {
        self.ribbons.push(ribbon);
        self
    }

    #[must_use]
    pub fn blend_override(mut self, table: Vec<u16>) -> Self {
        self.blend_override = Some(table);
        self
    }

    /// Add a texture unit to the skin
    #[must_use]
    pub fn batch(mut self, batch: SkinBatch) -> Self {
        self.skin.get_or_insert_with(SkinSpec::default).batches.push(batch);
        self
    }

    /// Write the model and its companions
    pub fn build(&self) -> BuiltModel {
        let mut blobs = Blobs {
            main: vec![0u8; HEADER_SIZE + 8],
            side: self
                .sequences
                .iter()
                .map(|s| (!s.embedded).then(Vec::new))
                .collect(),
        };
        let mut header = vec![0u8; HEADER_SIZE + 8];
        let mut set = |offset: usize, bytes: &[u8]| {
            header[offset..offset + bytes.len()].copy_from_slice(bytes);
        };
        let array = |value: M2Array| {
            let mut bytes = Vec::with_capacity(8);
            value.put(&mut bytes);
            bytes
        };

        set(offsets::MAGIC, &self.magic);
        set(offsets::VERSION, &self.version.to_le_bytes());
        let mut flags = ModelFlags::empty();
        if let Some(table) = &self.blend_override {
            flags |= ModelFlags::BLEND_OVERRIDE;
            set(offsets::BLEND_OVERRIDE, &array(blobs.array(table)));
        }
        set(offsets::FLAGS, &flags.bits().to_le_bytes());

        set(offsets::GLOBAL_SEQUENCES, &array(blobs.array(&self.global_sequences)));
        let mut sequences = Vec::new();
        for sequence in &self.sequences {
            sequence.animation_id.put(&mut sequences);
            sequence.sub_animation_id.put(&mut sequences);
            sequence.length.put(&mut sequences);
            0.0f32.put(&mut sequences);
            let flags: u32 = if sequence.embedded { 0x20 } else { 0 };
            flags.put(&mut sequences);
            [0u8; 44].put(&mut sequences);
            (-1i16).put(&mut sequences);
            0u16.put(&mut sequences);
        }
        set(offsets::ANIMATIONS, &array(blobs.records(self.sequences.len(), &sequences)));

        let mut bones = Vec::new();
        for bone in &self.bones {
            let translation = blobs.track(&bone.translation);
            let rotation = blobs.track(&bone.rotation);
            let scale = blobs.track(&bone.scale);
            (-1i32).to_le_bytes().put(&mut bones);
            bone.flags.bits().put(&mut bones);
            bone.parent.put(&mut bones);
            0u16.put(&mut bones);
            0u32.put(&mut bones);
            translation.put(&mut bones);
            rotation.put(&mut bones);
            scale.put(&mut bones);
            bone.pivot.put(&mut bones);
        }
        set(offsets::BONES, &array(blobs.records(self.bones.len(), &bones)));
        set(offsets::VERTICES, &array(blobs.array(&self.vertices)));
        let views = u32::from(self.skin.is_some());
        set(offsets::VIEWS, &views.to_le_bytes());

        let mut colors = Vec::new();
        for color in &self.colors {
            blobs.track(&color.color).put(&mut colors);
            blobs.track(&color.opacity).put(&mut colors);
        }
        set(offsets::COLORS, &array(blobs.records(self.colors.len(), &colors)));

        let mut textures = Vec::new();
        for (texture_type, filename) in &self.textures {
            let mut name = filename.as_bytes().to_vec();
            name.push(0);
            let name = blobs.array(&name);
            texture_type.put(&mut textures);
            0u32.put(&mut textures);
            name.put(&mut textures);
        }
        set(offsets::TEXTURES, &array(blobs.records(self.textures.len(), &textures)));

        let transparencies: Vec<M2Track> =
            self.transparencies.iter().map(|t| blobs.track(t)).collect();
        set(offsets::TRANSPARENCY, &array(blobs.array(&transparencies)));

        let mut texture_animations = Vec::new();
        for (translation, scale) in &self.texture_animations {
            blobs.track(translation).put(&mut texture_animations);
            blobs.track(&Keys::<Quat>::none()).put(&mut texture_animations);
            blobs.track(scale).put(&mut texture_animations);
        }
        set(
            offsets::TEXTURE_ANIMATIONS,
            &array(blobs.records(self.texture_animations.len(), &texture_animations)),
        );

        set(offsets::RENDER_FLAGS, &array(blobs.array(&self.materials)));
        set(offsets::TEXTURE_LOOKUP, &array(blobs.array(&self.texture_lookup)));
        set(offsets::TEXTURE_UNIT_LOOKUP, &array(blobs.array(&self.texture_unit_lookup)));
        set(offsets::TRANSPARENCY_LOOKUP, &array(blobs.array(&self.transparency_lookup)));
        set(
            offsets::TEXTURE_ANIMATION_LOOKUP,
            &array(blobs.array(&self.texture_animation_lookup)),
        );

        let mut bounds = Vec::new();
        self.bounding_box.min.put(&mut bounds);
        self.bounding_box.max.put(&mut bounds);
        self.bounding_radius.put(&mut bounds);
        set(offsets::BOUNDING_BOX, &bounds);

        let mut lights = Vec::new();
        for light in &self.lights {
            let tracks = [
                blobs.track(&light.ambient_color),
                blobs.track(&light.ambient_intensity),
                blobs.track(&light.diffuse_color),
                blobs.track(&light.diffuse_intensity),
                blobs.track(&Keys::<f32>::none()),
                blobs.track(&Keys::<f32>::none()),
                blobs.track(&Keys::<u8>::none()),
            ];
            light.light_type.put(&mut lights);
            light.bone.put(&mut lights);
            light.position.put(&mut lights);
            tracks.put(&mut lights);
        }
        set(offsets::LIGHTS, &array(blobs.records(self.lights.len(), &lights)));

        let mut cameras = Vec::new();
        for camera in &self.cameras {
            let positions = blobs.track(&Keys::<[Vec3; 3]>::none());
            let targets = blobs.track(&Keys::<[Vec3; 3]>::none());
            let roll = blobs.track(&Keys::<[f32; 3]>::none());
            let field_of_view = blobs.track(&camera.field_of_view);
            0u32.put(&mut cameras);
            camera.far_clip.put(&mut cameras);
            camera.near_clip.put(&mut cameras);
            positions.put(&mut cameras);
            camera.position.put(&mut cameras);
            targets.put(&mut cameras);
            camera.target.put(&mut cameras);
            roll.put(&mut cameras);
            field_of_view.put(&mut cameras);
        }
        set(offsets::CAMERAS, &array(blobs.records(self.cameras.len(), &cameras)));

        let mut ribbons = Vec::new();
        for ribbon in &self.ribbons {
            let texture = blobs.array(&[ribbon.texture]);
            let color = blobs.track(&ribbon.color);
            let opacity = blobs.track(&ribbon.opacity);
            let above = blobs.track(&ribbon.above);
            let below = blobs.track(&ribbon.below);
            (-1i32).to_le_bytes().put(&mut ribbons);
            ribbon.bone.to_le_bytes().put(&mut ribbons);
            ribbon.position.put(&mut ribbons);
            texture.put(&mut ribbons);
            M2Array::default().put(&mut ribbons);
            [color, opacity, above, below].put(&mut ribbons);
            ribbon.edges_per_second.put(&mut ribbons);
            ribbon.edge_lifetime.put(&mut ribbons);
            0.0f32.put(&mut ribbons);
            [1u16, 1u16].put(&mut ribbons);
            [M2Track::default(); 2].put(&mut ribbons);
            [0u16; 2].put(&mut ribbons);
        }
        set(offsets::RIBBON_EMITTERS, &array(blobs.records(self.ribbons.len(), &ribbons)));

        let mut particles = Vec::new();
        for emitter in &self.particles {
            let none = Keys::<f32>::none();
            let speed = blobs.track(&emitter.speed);
            let variation = blobs.track(&none);
            let vertical = blobs.track(&none);
            let horizontal = blobs.track(&none);
            let gravity = blobs.track(&emitter.gravity);
            let lifespan = blobs.track(&emitter.lifespan);
            let rate = blobs.track(&emitter.rate);
            let area_length = blobs.track(&emitter.area_length);
            let area_width = blobs.track(&emitter.area_width);
            let z_source = blobs.track(&none);
            let colors = blobs.fake_track(&emitter.colors);
            let alphas = blobs.fake_track(&[i16::MAX]);
            let sizes = blobs.fake_track(&emitter.sizes);
            let enabled = blobs.track(&emitter.enabled);

            (-1i32).to_le_bytes().put(&mut particles);
            emitter.flags.put(&mut particles);
            emitter.position.put(&mut particles);
            emitter.bone.put(&mut particles);
            emitter.texture.put(&mut particles);
            [M2Array::default(); 2].put(&mut particles);
            emitter.blend_mode.put(&mut particles);
            emitter.emitter_type.put(&mut particles);
            0u16.put(&mut particles);
            [0u8; 2].put(&mut particles);
            0u16.put(&mut particles);
            emitter.rows.put(&mut particles);
            emitter.columns.put(&mut particles);
            [speed, variation, vertical, horizontal, gravity, lifespan].put(&mut particles);
            0.0f32.put(&mut particles);
            rate.put(&mut particles);
            0.0f32.put(&mut particles);
            [area_length, area_width, z_source].put(&mut particles);
            [colors, alphas, sizes].put(&mut particles);
            Vec2::ZERO.put(&mut particles);
            [M2FakeTrack::default(); 2].put(&mut particles);
            // tail length, twinkle, burst, drag, spin, tumble, wind, follow
            [0.0f32; 25].put(&mut particles);
            M2Array::default().put(&mut particles);
            enabled.put(&mut particles);
        }
        set(
            offsets::PARTICLE_EMITTERS,
            &array(blobs.records(self.particles.len(), &particles)),
        );

        let mut m2 = blobs.main;
        m2[..HEADER_SIZE + 8].copy_from_slice(&header);

        let anims = self
            .sequences
            .iter()
            .zip(blobs.side)
            .filter_map(|(sequence, data)| {
                data.map(|data| (sequence.animation_id, sequence.sub_animation_id, data))
            })
            .collect();

        BuiltModel {
            m2,
            skin: self.skin.as_ref().map(SkinSpec::to_bytes),
            anims,
        }
    }
}
