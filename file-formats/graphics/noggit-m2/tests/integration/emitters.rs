//! Particle systems and ribbons attached to bones

use glam::{Vec3, Vec4};
use noggit_m2::chunks::particle_emitter::emitter_type;
use noggit_m2::particles::EmitterShape;
use noggit_m2::render::{BlendFactor, BlendState};
use noggit_m2::test_utils::{BoneSpec, Keys, ModelBuilder, ParticleSpec, RibbonSpec, SequenceSpec};
use noggit_m2::{DrawOptions, LoadOptions, Model};
use pretty_assertions::assert_eq;

use crate::common::{MODEL_PATH, approx_eq, instance_at, load, uploaded, wide_view};

fn with_particles(emitter_type: u8) -> ModelBuilder {
    ModelBuilder::triangle().particle_emitter(ParticleSpec::new(emitter_type, 10.0, 1.0))
}

#[test]
fn test_plane_and_sphere_emitters_load() {
    let model = load(
        &with_particles(emitter_type::PLANE)
            .particle_emitter(ParticleSpec::new(emitter_type::SPHERE, 5.0, 2.0)),
    );
    assert!(model.is_animated());
    assert_eq!(model.particles().len(), 2);
    assert_eq!(model.particles()[0].shape(), EmitterShape::Plane);
    assert_eq!(model.particles()[1].shape(), EmitterShape::Sphere);
    assert!(model.warnings().is_empty());
}

#[test]
fn test_unsupported_emitters_are_skipped() {
    let model = load(
        &with_particles(emitter_type::SPLINE)
            .particle_emitter(ParticleSpec::new(9, 5.0, 2.0))
            .particle_emitter(ParticleSpec::new(emitter_type::PLANE, 5.0, 2.0)),
    );
    assert!(model.finished_loading());
    assert_eq!(model.particles().len(), 1);
    assert_eq!(model.warnings().len(), 2);
}

#[test]
fn test_oversized_atlas_skips_only_its_emitter() {
    let mut huge = ParticleSpec::new(emitter_type::PLANE, 10.0, 1.0);
    huge.rows = u16::MAX;
    huge.columns = u16::MAX;
    let model = load(
        &ModelBuilder::triangle()
            .particle_emitter(huge)
            .particle_emitter(ParticleSpec::new(emitter_type::SPHERE, 5.0, 2.0)),
    );
    assert!(model.finished_loading());
    assert_eq!(model.particles().len(), 1);
    assert_eq!(model.particles()[0].shape(), EmitterShape::Sphere);
    assert_eq!(model.warnings().len(), 1);
    assert!(model.warnings()[0].contains("atlas"));
}

#[test]
fn test_spawn_rate_and_expiry() {
    let mut model = load(&with_particles(emitter_type::PLANE));

    model.update_emitters(0.5);
    assert_eq!(model.particles()[0].particle_count(), 5);

    // Everything older than the lifespan dies, new spawns included
    model.update_emitters(2.0);
    assert_eq!(model.particles()[0].particle_count(), 0);
}

#[test]
fn test_particle_limit() {
    let built = with_particles(emitter_type::PLANE).build();
    let options = LoadOptions {
        max_particles: 3,
        seed: Some(1),
        ..LoadOptions::default()
    };
    let mut model = Model::load_with(MODEL_PATH, &built.m2, &built.files(MODEL_PATH), &options)
        .unwrap();

    model.update_emitters(0.5);
    assert_eq!(model.particles()[0].particle_count(), 3);
    assert_eq!(model.particles()[0].max_particles(), 3);
}

#[test]
fn test_disabled_emitter_does_not_spawn() {
    let mut emitter = ParticleSpec::new(emitter_type::PLANE, 10.0, 1.0);
    emitter.enabled = Keys::constant(0u8);
    let mut model = load(&ModelBuilder::triangle().particle_emitter(emitter));

    model.update_emitters(0.5);
    assert_eq!(model.particles()[0].particle_count(), 0);
}

#[test]
fn test_particles_drawn_as_quads() {
    let mut model = load(&with_particles(emitter_type::PLANE));
    let mut gfx = uploaded(&mut model);
    model.update_emitters(0.5);

    let instances = [instance_at(1, -5.0), instance_at(2, 5.0)];
    let stats = model.draw(&mut gfx, &instances, &wide_view(1), 0, &DrawOptions::default());

    assert_eq!(stats.particle_batches, 1);
    let batch = &gfx.particles[0];
    assert_eq!(batch.vertices.len(), 5 * 4);
    assert_eq!(batch.instances, 2);
    assert_eq!(
        batch.blend,
        BlendState::Enabled {
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::One
        }
    );
    assert_eq!(batch.alpha_test, None);
    assert_eq!(batch.texture, gfx.draws[0].textures[0]);
}

#[test]
fn test_alpha_keyed_particles() {
    let mut emitter = ParticleSpec::new(emitter_type::PLANE, 10.0, 1.0);
    emitter.blend_mode = 3;
    let mut model = load(&ModelBuilder::triangle().particle_emitter(emitter));
    let mut gfx = uploaded(&mut model);
    model.update_emitters(0.5);
    model.draw(&mut gfx, &[instance_at(1, 0.0)], &wide_view(1), 0, &DrawOptions::default());

    assert_eq!(gfx.particles[0].blend, BlendState::Disabled);
    assert!(gfx.particles[0].alpha_test.is_some());
}

#[test]
fn test_particles_can_be_turned_off() {
    let mut model = load(&with_particles(emitter_type::PLANE));
    let mut gfx = uploaded(&mut model);
    model.update_emitters(0.5);

    let options = DrawOptions {
        particles: false,
        ..DrawOptions::default()
    };
    let stats = model.draw(&mut gfx, &[instance_at(1, 0.0)], &wide_view(1), 0, &options);
    assert_eq!(stats.particle_batches, 0);
    assert!(gfx.particles.is_empty());
}

#[test]
fn test_pending_model_ignores_emitter_updates() {
    let mut model = Model::pending("world/loading.m2");
    model.update_emitters(1.0);
    assert!(model.particles().is_empty());
}

#[test]
fn test_ribbon_strip() {
    let mut model = load(&ModelBuilder::triangle().ribbon(RibbonSpec::new(0, 10.0, 0.5)));
    assert_eq!(model.ribbons().len(), 1);
    assert_eq!(model.ribbons()[0].length(), 5.0);
    assert_eq!(model.ribbons()[0].texture(), Some(0));

    let mut gfx = uploaded(&mut model);
    let stats = model.draw(&mut gfx, &[instance_at(1, 0.0)], &wide_view(1), 0, &DrawOptions::default());

    assert_eq!(stats.ribbon_strips, 1);
    let strip = &gfx.ribbons[0];
    assert_eq!(strip.vertices.len(), 2);
    assert!(approx_eq(strip.vertices[0].position, Vec3::new(0.0, 0.0, 0.5)));
    assert!(approx_eq(strip.vertices[1].position, Vec3::new(0.0, 0.0, -0.5)));
    assert_eq!(strip.vertices[0].color, Vec4::ONE);
    assert_eq!(
        strip.blend,
        BlendState::Enabled {
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::One
        }
    );
}

#[test]
fn test_ribbon_follows_its_bone() {
    let builder = ModelBuilder::triangle()
        .sequence(SequenceSpec::embedded(0, 1000))
        .with_bone(
            0,
            BoneSpec::root().translation(Keys::linear(&[
                (0, Vec3::ZERO),
                (1000, Vec3::new(0.0, 0.0, 2.0)),
            ])),
        )
        .ribbon(RibbonSpec::new(0, 10.0, 0.5));
    let mut model = load(&builder);

    model.animate(0, 500, &wide_view(0));
    let front = &model.ribbons()[0].segments()[0];
    assert!(approx_eq(front.position, Vec3::new(0.0, 1.0, 0.0)));
}
