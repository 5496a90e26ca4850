//! Per-frame evaluation: bones, skinning, lights, emitters and texture
//! transforms

use glam::Vec3;

use super::{Model, VertexWeights};
use crate::animation::{AnimationTime, BillboardBasis, BonePose};
use crate::backend::ModelVertex;
use crate::view::{Ray, ViewState};

/// Which derived state an evaluation refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Target {
    /// Model-level pose, lights, emitters and texture transforms
    Model,
    /// Pose and skinned vertices of one placement
    Instance(u32),
    /// Model-level pose and skinned vertices only
    Picking,
}

/// Blend the bind-pose vertices by their bone weights
pub fn skin_vertices(
    vertices: &[ModelVertex],
    weights: &[VertexWeights],
    pose: &BonePose,
    out: &mut Vec<ModelVertex>,
) {
    out.clear();
    out.extend(vertices.iter().zip(weights.iter()).map(|(vertex, weights)| {
        let mut position = Vec3::ZERO;
        let mut normal = Vec3::ZERO;
        for (bone, weight) in weights.influences() {
            position += pose.world(bone).transform_point3(vertex.position) * weight;
            normal += pose.rotation(bone).transform_vector3(vertex.normal) * weight;
        }
        ModelVertex {
            position,
            normal: normal.normalize_or_zero(),
            tex_coords: vertex.tex_coords,
        }
    }));
}

impl Model {
    /// Time of clip `animation` at absolute `time`, `None` for unknown clips
    pub(super) fn time_in_clip(&self, animation: usize, time: u32) -> Option<AnimationTime> {
        let clip = self.clips.get(animation)?;
        Some(AnimationTime::new(animation, clip.wrap(time), time))
    }

    /// Evaluate clip `animation` at `time` milliseconds
    ///
    /// Models without clips are left untouched. Unknown clips are ignored.
    pub fn animate(&mut self, animation: usize, time: u32, view: &ViewState) {
        if self.clips.is_empty() {
            return;
        }
        let Some(at) = self.time_in_clip(animation, time) else {
            log::debug!(
                "{}: animation {animation} does not exist ({} clips)",
                self.path,
                self.clips.len()
            );
            return;
        };

        self.at = at;
        self.evaluate(at, &view.billboard_basis(), Target::Model);
    }

    pub(super) fn evaluate(&mut self, at: AnimationTime, basis: &BillboardBasis, target: Target) {
        let instance = match target {
            Target::Instance(id) => Some(id),
            Target::Model | Target::Picking => None,
        };

        let pose = self.poses.pose_mut(instance);
        if self.animation.bones {
            self.bones.compute(at, basis, pose);
        }
        if self.animation.geometry {
            skin_vertices(&self.vertices, &self.weights, pose, &mut self.current_vertices);
        }

        if target != Target::Model {
            return;
        }
        let pose = &*pose;

        self.light_states.clear();
        self.light_states
            .extend(self.lights.iter().map(|light| light.state(at, pose)));

        let length = self
            .clips
            .get(at.animation)
            .map_or(1, |clip| clip.length);
        for system in &mut self.particles {
            // Each emitter runs at its own phase of the clip
            let offset = (length as f32 * system.time_offset()) as u32;
            let time = at.time.wrapping_add(offset) % length;
            system.setup(AnimationTime::new(at.animation, time, at.global_time), pose);
        }
        for ribbon in &mut self.ribbons {
            ribbon.setup(at, pose);
        }

        if self.animation.textures {
            self.texture_matrices.clear();
            self.texture_matrices
                .extend(self.texture_animations.iter().map(|t| t.matrix(at)));
        }
    }

    /// Distances of every triangle hit by `ray`
    ///
    /// Animated models are evaluated at `time` first; the cached per-frame
    /// pose is not reused.
    pub fn intersect(&mut self, ray: &Ray, time: u32, view: &ViewState) -> Vec<f32> {
        if self.animation.animated
            && let Some(at) = self.time_in_clip(self.at.animation, time)
        {
            self.evaluate(at, &view.billboard_basis(), Target::Picking);
            self.poses.invalidate();
        }

        let mut hits = Vec::new();
        for pass in &self.passes {
            let start = pass.index_start as usize;
            let end = start + pass.index_count as usize;
            let Some(indices) = self.indices.get(start..end) else {
                continue;
            };

            for triangle in indices.chunks_exact(3) {
                let corner = |i: usize| {
                    self.current_vertices
                        .get(usize::from(triangle[i]))
                        .map(|v| v.position)
                };
                if let (Some(a), Some(b), Some(c)) = (corner(0), corner(1), corner(2))
                    && let Some(distance) = ray.intersect_triangle(a, b, c)
                {
                    hits.push(distance);
                }
            }
        }
        hits
    }

    /// Age particles by `dt` seconds
    pub fn update_emitters(&mut self, dt: f32) {
        if !self.finished {
            return;
        }
        for system in &mut self.particles {
            system.update(dt);
        }
    }
}
