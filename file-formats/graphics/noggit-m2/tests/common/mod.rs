//! Common test fixtures

#![allow(dead_code)]

use glam::{Mat4, Vec3};
use noggit_m2::test_utils::{BuiltModel, ModelBuilder, RecordingBackend};
use noggit_m2::{DrawOptions, Instance, LoadOptions, Model, ViewState};

/// Game path every synthesized model is stored under
pub const MODEL_PATH: &str = "World/Test/Model.m2";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Load options with a fixed particle seed
pub fn seeded() -> LoadOptions {
    LoadOptions {
        seed: Some(7),
        ..LoadOptions::default()
    }
}

pub fn load(builder: &ModelBuilder) -> Model {
    load_built(&builder.build())
}

pub fn load_built(built: &BuiltModel) -> Model {
    init_logging();
    let files = built.files(MODEL_PATH);
    Model::load_with(MODEL_PATH, &built.m2, &files, &seeded()).expect("model should load")
}

/// Orthographic camera on +Z looking at the origin, 100 units across
pub fn wide_view(frame: u64) -> ViewState {
    let eye = Vec3::new(0.0, 0.0, 20.0);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    let projection = Mat4::orthographic_rh_gl(-50.0, 50.0, -50.0, 50.0, 0.1, 100.0);
    ViewState::new(eye, view, projection, 1000.0, frame)
}

pub fn instance_at(id: u32, x: f32) -> Instance {
    Instance::new(id, Mat4::from_translation(Vec3::new(x, 0.0, 0.0)))
}

/// Upload `model` and clear the recorded uploads' draws
pub fn uploaded(model: &mut Model) -> RecordingBackend {
    let mut gfx = RecordingBackend::new();
    let stats = model.draw(
        &mut gfx,
        &[instance_at(1, 0.0)],
        &wide_view(0),
        0,
        &DrawOptions::default(),
    );
    assert!(stats.uploaded);
    gfx.clear_draws();
    gfx
}

pub fn approx_eq(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}
