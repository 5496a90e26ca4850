//! Uploading and drawing

use std::collections::HashSet;

use glam::{Mat4, Vec3, Vec4};

use super::animate::Target;
use super::pose::FrameStamp;
use super::{DrawOptions, DrawStats, GpuResources, Model};
use crate::backend::{
    BoxDraw, BufferHandle, BufferUsage, ColoredVertex, DrawCall, GraphicsBackend, LightState,
    ParticleBatch, RibbonStrip, TextureHandle,
};
use crate::chunks::M2RenderFlags;
use crate::render::{BlendState, RenderPass};
use crate::view::{Instance, ViewState};

/// Line strip over the corners of [`Model::box_points`]
pub const BOX_LINE_INDICES: [u16; 16] = [5, 7, 3, 2, 0, 1, 3, 1, 5, 4, 0, 4, 6, 2, 6, 7];

const NO_TEXTURE_ANIMATION: u16 = 0xFFFF;

/// Render state of one pass for the current frame
#[derive(Debug, Clone, PartialEq)]
struct PreparedPass {
    blend: BlendState,
    alpha_test: Option<f32>,
    diffuse: Vec4,
    emissive: Vec4,
    textures: Vec<TextureHandle>,
    texture_matrix: Mat4,
    cull_faces: bool,
    depth_write: bool,
    fog: bool,
    lighting: bool,
}

#[derive(Debug, Clone, Copy)]
struct Buffers {
    vertex: BufferHandle,
    index: BufferHandle,
}

fn issue<G: GraphicsBackend + ?Sized>(
    gfx: &mut G,
    pass: &RenderPass,
    prepared: &PreparedPass,
    buffers: Buffers,
    transforms: &[Mat4],
    lights: &[LightState],
) {
    gfx.draw(&DrawCall {
        vertex_buffer: buffers.vertex,
        index_buffer: buffers.index,
        index_start: pass.index_start,
        index_count: pass.index_count,
        vertex_start: pass.vertex_start,
        vertex_end: pass.vertex_end,
        transforms,
        textures: &prepared.textures,
        texture_matrix: prepared.texture_matrix,
        pixel_shader: pass.pixel_shader,
        blend: prepared.blend,
        alpha_test: prepared.alpha_test,
        cull_faces: prepared.cull_faces,
        depth_write: prepared.depth_write,
        fog: prepared.fog,
        lighting: prepared.lighting,
        diffuse: prepared.diffuse,
        emissive: prepared.emissive,
        lights,
    });
}

/// Largest axis scale of an instance transform
fn max_scale(transform: &Mat4) -> f32 {
    transform
        .x_axis
        .truncate()
        .length()
        .max(transform.y_axis.truncate().length())
        .max(transform.z_axis.truncate().length())
}

impl Model {
    /// Transfer textures and buffers to the backend
    ///
    /// Does nothing for unfinished or already uploaded models.
    pub fn upload<G: GraphicsBackend + ?Sized>(&mut self, gfx: &mut G) {
        if !self.finished || self.gpu.is_some() {
            return;
        }

        let textures = self
            .textures
            .iter()
            .map(|texture| gfx.texture(&texture.filename))
            .collect();
        let usage = if self.animation.geometry {
            BufferUsage::Stream
        } else {
            BufferUsage::Static
        };

        self.gpu = Some(GpuResources {
            vertex_buffer: gfx.create_vertex_buffer(&self.current_vertices, usage),
            index_buffer: gfx.create_index_buffer(&self.indices),
            box_buffer: gfx.create_point_buffer(&self.box_points()),
            textures,
        });
        log::debug!("Uploaded model \"{}\"", self.path);
    }

    /// Free the backend resources; the next draw uploads again
    pub fn release<G: GraphicsBackend + ?Sized>(&mut self, gfx: &mut G) {
        let Some(gpu) = self.gpu.take() else {
            return;
        };

        gfx.delete_buffer(gpu.vertex_buffer);
        gfx.delete_buffer(gpu.index_buffer);
        gfx.delete_buffer(gpu.box_buffer);
        for texture in gpu.textures {
            gfx.release_texture(texture);
        }
        self.poses.invalidate();
        log::debug!("Unloading model \"{}\"", self.path);
    }

    /// Bounding sphere of `instance` intersects the view
    pub fn is_instance_visible(&self, instance: &Instance, view: &ViewState) -> bool {
        let center = (self.bounding_box.min + self.bounding_box.max) * 0.5;
        view.is_visible(
            instance.transform.transform_point3(center),
            self.bounding_radius * max_scale(&instance.transform),
        )
    }

    /// Drop per-instance poses of placements for which `keep` is false
    pub fn retain_instances(&mut self, keep: impl FnMut(u32) -> bool) {
        self.poses.retain_instances(keep);
    }

    /// Draw every visible instance
    ///
    /// The first call on a finished model only uploads it. Per-instance
    /// poses of ids missing from `instances` are dropped.
    pub fn draw<G: GraphicsBackend + ?Sized>(
        &mut self,
        gfx: &mut G,
        instances: &[Instance],
        view: &ViewState,
        time: u32,
        options: &DrawOptions,
    ) -> DrawStats {
        let mut stats = DrawStats::default();
        if !self.finished {
            return stats;
        }
        if self.gpu.is_none() {
            self.upload(gfx);
            stats.uploaded = true;
            return stats;
        }

        if self.poses.is_per_instance() {
            let ids: HashSet<u32> = instances.iter().map(|instance| instance.id).collect();
            self.poses.retain_instances(|id| ids.contains(&id));
        }

        let visible: Vec<Instance> = instances
            .iter()
            .filter(|instance| self.is_instance_visible(instance, view))
            .copied()
            .collect();
        if visible.is_empty() {
            return stats;
        }
        stats.visible_instances = visible.len();

        let Some(buffers) = self.gpu.as_ref().map(|gpu| Buffers {
            vertex: gpu.vertex_buffer,
            index: gpu.index_buffer,
        }) else {
            return stats;
        };

        let animated = self.animation.animated && !self.clips.is_empty();
        if animated && self.poses.refresh(FrameStamp::new(options.animation, time, view.frame)) {
            self.animate(options.animation, time, view);
            if self.animation.geometry && !self.poses.is_per_instance() {
                gfx.update_vertex_buffer(buffers.vertex, &self.current_vertices);
            }
            log::trace!("{}: animated at {time} for frame {}", self.path, view.frame);
        }

        let prepared: Vec<Option<PreparedPass>> = self
            .passes
            .iter()
            .map(|pass| self.prepare_pass(pass, options.fog))
            .collect();
        stats.skipped_passes = prepared.iter().filter(|p| p.is_none()).count();

        if self.poses.is_per_instance() {
            for instance in &visible {
                let basis = view.billboard_basis_for(&instance.transform);
                self.evaluate(self.at, &basis, Target::Instance(instance.id));
                gfx.update_vertex_buffer(buffers.vertex, &self.current_vertices);

                let transforms = std::slice::from_ref(&instance.transform);
                for (pass, prepared) in self.passes.iter().zip(&prepared) {
                    if let Some(prepared) = prepared {
                        issue(gfx, pass, prepared, buffers, transforms, &self.light_states);
                        stats.draw_calls += 1;
                    }
                }
            }
        } else {
            let transforms: Vec<Mat4> = visible.iter().map(|i| i.transform).collect();
            for (pass, prepared) in self.passes.iter().zip(&prepared) {
                if let Some(prepared) = prepared {
                    issue(gfx, pass, prepared, buffers, &transforms, &self.light_states);
                    stats.draw_calls += 1;
                }
            }
        }

        if options.particles {
            let transforms: Vec<Mat4> = visible.iter().map(|i| i.transform).collect();
            self.draw_emitters(gfx, &transforms, view, &mut stats);
        }
        stats
    }

    fn draw_emitters<G: GraphicsBackend + ?Sized>(
        &self,
        gfx: &mut G,
        transforms: &[Mat4],
        view: &ViewState,
        stats: &mut DrawStats,
    ) {
        let basis = view.billboard_basis();
        let mut vertices: Vec<ColoredVertex> = Vec::new();

        for system in &self.particles {
            vertices.clear();
            system.draw(&basis, &mut vertices);
            if vertices.is_empty() {
                continue;
            }
            let (blend, alpha_test) = system.blend_state();
            gfx.draw_particles(&ParticleBatch {
                texture: self.texture_handle(Some(system.texture())),
                blend,
                alpha_test,
                vertices: &vertices,
                transforms,
            });
            stats.particle_batches += 1;
        }

        for ribbon in &self.ribbons {
            vertices.clear();
            ribbon.draw(&mut vertices);
            if vertices.is_empty() {
                continue;
            }
            gfx.draw_ribbon(&RibbonStrip {
                texture: self.texture_handle(ribbon.texture()),
                blend: ribbon.blend_state(),
                vertices: &vertices,
                transforms,
            });
            stats.ribbon_strips += 1;
        }
    }

    /// Draw the bounding box once per transform
    pub fn draw_boxes<G: GraphicsBackend + ?Sized>(
        &self,
        gfx: &mut G,
        transforms: &[Mat4],
        color: Vec4,
    ) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        if transforms.is_empty() {
            return;
        }
        gfx.draw_boxes(&BoxDraw {
            vertex_buffer: gpu.box_buffer,
            indices: &BOX_LINE_INDICES,
            transforms,
            color,
        });
    }

    fn texture_handle(&self, texture: Option<u16>) -> TextureHandle {
        texture
            .and_then(|index| self.gpu.as_ref()?.textures.get(usize::from(index)).copied())
            .unwrap_or_default()
    }

    /// Colors, blend state and textures of `pass`, `None` when it is hidden
    fn prepare_pass(&self, pass: &RenderPass, fog: bool) -> Option<PreparedPass> {
        if !self.is_geoset_visible(usize::from(pass.geoset)) {
            return None;
        }
        let material = self.materials.get(usize::from(pass.render_flag_index))?;
        let at = self.at;

        let mut diffuse = Vec4::new(1.0, 1.0, 1.0, self.alpha);
        let mut emissive = Vec4::ZERO;

        let color = pass
            .color_index
            .and_then(|index| self.colors.get(usize::from(index)))
            .filter(|color| color.color.uses(at.animation));
        if let Some(color) = color {
            let rgb = color
                .color
                .value_or(at.animation, at.time, at.global_time, Vec3::ONE);
            if color.opacity.uses(at.animation) {
                diffuse.w = color
                    .opacity
                    .value_or(at.animation, at.time, at.global_time, 1.0);
            }
            let base = if material.is_unlit() { rgb } else { Vec3::ZERO };
            diffuse = base.extend(diffuse.w);
            emissive = rgb.extend(diffuse.w);
        }

        let transparency = self
            .transparency_lookup
            .get(usize::from(pass.transparency_combo_index))
            .and_then(|index| self.transparencies.get(usize::from(*index)))
            .filter(|transparency| transparency.alpha.uses(at.animation));
        if let Some(transparency) = transparency {
            diffuse.w *= transparency
                .alpha
                .value_or(at.animation, at.time, at.global_time, 1.0);
        }

        if !(diffuse.w > 0.0 && (color.is_none() || emissive.w > 0.0)) {
            return None;
        }

        let (blend, alpha_test) = pass.blend_mode.state(diffuse.w);
        let textures = (0..usize::from(pass.texture_count))
            .map(|unit| {
                let lookup = usize::from(pass.texture_combo_index) + unit;
                self.texture_handle(self.texture_lookup.get(lookup).copied())
            })
            .collect();
        let texture_matrix = self
            .texture_animation_lookup
            .get(usize::from(pass.texture_animation_combo_index))
            .filter(|index| **index != NO_TEXTURE_ANIMATION)
            .map_or(Mat4::IDENTITY, |index| self.texture_matrix(usize::from(*index)));

        Some(PreparedPass {
            blend,
            alpha_test,
            diffuse,
            emissive,
            textures,
            texture_matrix,
            cull_faces: !material.flags.contains(M2RenderFlags::TWO_SIDED),
            depth_write: !material.flags.contains(M2RenderFlags::NO_DEPTH_WRITE),
            fog: fog && !material.flags.contains(M2RenderFlags::UNFOGGED),
            lighting: !material.is_unlit(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationTrack, Interpolation};
    use crate::backend::ModelVertex;
    use crate::chunks::M2Material;
    use crate::header::BoundingBox;
    use crate::model::{ModelColor, ModelTexture, ModelTransparency};
    use crate::render::{BlendFactor, BlendMode};
    use crate::test_utils::RecordingBackend;

    fn triangle_model() -> Model {
        let mut model = Model::empty("test/triangle.m2");
        model.vertices = vec![
            ModelVertex {
                position: Vec3::ZERO,
                ..ModelVertex::default()
            },
            ModelVertex {
                position: Vec3::X,
                ..ModelVertex::default()
            },
            ModelVertex {
                position: Vec3::Y,
                ..ModelVertex::default()
            },
        ];
        model.current_vertices = model.vertices.clone();
        model.indices = vec![0, 1, 2];
        model.materials = vec![M2Material {
            flags: M2RenderFlags::empty(),
            blend_mode: 0,
        }];
        model.textures = vec![ModelTexture {
            filename: "world/tree.blp".to_string(),
            texture_type: 0,
        }];
        model.texture_lookup = vec![0];
        model.texture_animation_lookup = vec![NO_TEXTURE_ANIMATION];
        model.passes = vec![RenderPass {
            texture_count: 1,
            index_count: 3,
            vertex_end: 3,
            ..RenderPass::default()
        }];
        model.geoset_visible = vec![true];
        model.bounding_box = BoundingBox {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        model.bounding_radius = 1.0;
        model
    }

    fn wide_view() -> ViewState {
        let projection = Mat4::orthographic_rh_gl(-50.0, 50.0, -50.0, 50.0, -50.0, 50.0);
        ViewState::new(Vec3::ZERO, Mat4::IDENTITY, projection, f32::MAX, 1)
    }

    fn instances() -> Vec<Instance> {
        vec![
            Instance::new(1, Mat4::IDENTITY),
            Instance::new(2, Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0))),
        ]
    }

    #[test]
    fn test_pending_model_draws_nothing() {
        let mut gfx = RecordingBackend::new();
        let mut model = Model::pending("test/pending.m2");
        let stats = model.draw(&mut gfx, &instances(), &wide_view(), 0, &DrawOptions::default());
        assert_eq!(stats, DrawStats::default());
        assert!(gfx.draws.is_empty());
        assert!(!model.is_uploaded());
    }

    #[test]
    fn test_first_draw_only_uploads() {
        let mut gfx = RecordingBackend::new();
        let mut model = triangle_model();
        let view = wide_view();

        let stats = model.draw(&mut gfx, &instances(), &view, 0, &DrawOptions::default());
        assert!(stats.uploaded);
        assert!(gfx.draws.is_empty());
        assert_eq!(gfx.requested_textures, vec!["world/tree.blp".to_string()]);
        assert_eq!(gfx.vertex_buffers[0].usage, BufferUsage::Static);

        let stats = model.draw(&mut gfx, &instances(), &view, 0, &DrawOptions::default());
        assert!(!stats.uploaded);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(gfx.draws[0].transforms.len(), 2);
        assert_eq!(gfx.draws[0].index_count, 3);
        assert_eq!(gfx.draws[0].blend, BlendState::Disabled);
        assert_eq!(gfx.draws[0].alpha_test, None);
    }

    #[test]
    fn test_hidden_geoset_is_skipped() {
        let mut gfx = RecordingBackend::new();
        let mut model = triangle_model();
        model.upload(&mut gfx);
        model.set_geoset_visible(0, false);

        let stats = model.draw(&mut gfx, &instances(), &wide_view(), 0, &DrawOptions::default());
        assert_eq!(stats.draw_calls, 0);
        assert_eq!(stats.skipped_passes, 1);
    }

    #[test]
    fn test_zero_alpha_is_skipped() {
        let mut gfx = RecordingBackend::new();
        let mut model = triangle_model();
        model.upload(&mut gfx);
        model.set_alpha(0.0);

        let stats = model.draw(&mut gfx, &instances(), &wide_view(), 0, &DrawOptions::default());
        assert_eq!(stats.draw_calls, 0);
    }

    #[test]
    fn test_color_and_transparency_prepare_alpha_blend() {
        let mut model = triangle_model();
        model.colors = vec![ModelColor {
            color: AnimationTrack::new(Interpolation::Linear, None)
                .with_keys(Some(1), &[(0, Vec3::new(1.0, 0.5, 0.0))]),
            opacity: AnimationTrack::new(Interpolation::Linear, None)
                .with_keys(Some(1), &[(0, 0.8)]),
        }];
        model.transparencies = vec![ModelTransparency {
            alpha: AnimationTrack::new(Interpolation::Linear, None).with_keys(Some(1), &[(0, 0.5)]),
        }];
        model.transparency_lookup = vec![0];
        model.passes[0].color_index = Some(0);
        model.passes[0].blend_mode = BlendMode::Alpha;

        let prepared = model
            .prepare_pass(&model.passes[0], true)
            .expect("pass is visible");
        assert!((prepared.diffuse.w - 0.4).abs() < 1e-6);
        assert_eq!(prepared.diffuse.truncate(), Vec3::ZERO);
        assert_eq!(prepared.emissive, Vec4::new(1.0, 0.5, 0.0, 0.8));
        assert!(prepared.lighting);
        assert_eq!(
            prepared.blend,
            BlendState::Enabled {
                src: BlendFactor::SrcAlpha,
                dst: BlendFactor::OneMinusSrcAlpha,
            }
        );
    }

    #[test]
    fn test_render_flags_map_to_state() {
        let mut model = triangle_model();
        model.materials[0].flags =
            M2RenderFlags::TWO_SIDED | M2RenderFlags::NO_DEPTH_WRITE | M2RenderFlags::UNFOGGED;
        model.passes[0].blend_mode = BlendMode::AlphaKey;

        let prepared = model
            .prepare_pass(&model.passes[0], true)
            .expect("pass is visible");
        assert!(!prepared.cull_faces);
        assert!(!prepared.depth_write);
        assert!(!prepared.fog);
        assert_eq!(prepared.alpha_test, Some(224.0 / 255.0));
    }

    #[test]
    fn test_culled_instances_are_not_drawn() {
        let mut gfx = RecordingBackend::new();
        let mut model = triangle_model();
        model.upload(&mut gfx);

        let view = ViewState {
            cull_distance: 5.0,
            ..wide_view()
        };
        let far = [Instance::new(3, Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0)))];
        let stats = model.draw(&mut gfx, &far, &view, 0, &DrawOptions::default());
        assert_eq!(stats.visible_instances, 0);
        assert!(gfx.draws.is_empty());
    }

    #[test]
    fn test_release_frees_resources() {
        let mut gfx = RecordingBackend::new();
        let mut model = triangle_model();
        model.upload(&mut gfx);
        model.draw_boxes(&mut gfx, &[Mat4::IDENTITY], Vec4::ONE);
        assert_eq!(gfx.boxes[0].indices, BOX_LINE_INDICES.to_vec());

        model.release(&mut gfx);
        assert!(!model.is_uploaded());
        assert_eq!(gfx.deleted_buffers.len(), 3);
        assert_eq!(gfx.released_textures.len(), 1);
    }
}
