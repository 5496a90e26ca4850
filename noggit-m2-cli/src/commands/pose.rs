//! `pose`: bone positions at a point in time

use anyhow::{Result, bail};
use glam::{Mat4, Vec3};
use noggit_m2::{DirectoryFiles, ViewState};

use crate::utils::{add_table_row, create_table, format_vec3};

pub fn execute(files: &DirectoryFiles, path: &str, animation: usize, time: u32) -> Result<()> {
    let mut model = super::load(files, path)?;

    if model.clips().is_empty() {
        println!("{} has no animation clips; showing the bind pose", model.path());
    } else if animation >= model.clips().len() {
        bail!(
            "Animation {animation} does not exist ({} clips)",
            model.clips().len()
        );
    }

    let view = ViewState::new(Vec3::ZERO, Mat4::IDENTITY, Mat4::IDENTITY, f32::MAX, 0);
    model.animate(animation, time, &view);
    let at = model.current_time();
    println!(
        "Clip {} at {} ms (global {} ms)",
        at.animation, at.time, at.global_time
    );

    let Some(pose) = model.pose(None) else {
        bail!("{} has no evaluated pose", model.path());
    };

    let mut table = create_table(&["Bone", "Parent", "Pivot", "World position"]);
    for (index, bone) in model.bones().bones().iter().enumerate() {
        add_table_row(
            &mut table,
            vec![
                index.to_string(),
                bone.parent.map_or_else(|| "-".to_string(), |p| p.to_string()),
                format_vec3(bone.pivot),
                format_vec3(pose.world(index).transform_point3(bone.pivot)),
            ],
        );
    }
    table.printstd();

    for (index, light) in model.light_states().iter().enumerate() {
        println!(
            "Light {index}: position {} diffuse {}",
            format_vec3(light.position.truncate()),
            format_vec3(light.diffuse.truncate())
        );
    }
    Ok(())
}
