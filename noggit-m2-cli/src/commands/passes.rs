//! `passes`: render pass table

use anyhow::{Result, bail};
use noggit_m2::DirectoryFiles;

use crate::utils::{add_table_row, create_table};

pub fn execute(files: &DirectoryFiles, path: &str, json: bool) -> Result<()> {
    let model = super::load(files, path)?;

    if json {
        return print_json(&model);
    }

    if model.passes().is_empty() {
        println!("{} has no render passes", model.path());
        return Ok(());
    }

    let mut table = create_table(&[
        "#", "Shader", "Pixel shader", "Blend", "Textures", "Indices", "Geoset", "Layer",
    ]);
    for (index, pass) in model.passes().iter().enumerate() {
        let mut shader = format!("0x{:04x}", pass.shader_id);
        if pass.duplicate {
            shader.push_str(" (dup)");
        }
        add_table_row(
            &mut table,
            vec![
                index.to_string(),
                shader,
                format!("{:?}", pass.pixel_shader),
                format!("{:?}", pass.blend_mode),
                pass.texture_count.to_string(),
                format!("{}+{}", pass.index_start, pass.index_count),
                pass.geoset.to_string(),
                pass.material_layer.to_string(),
            ],
        );
    }
    table.printstd();
    Ok(())
}

#[cfg(feature = "json")]
fn print_json(model: &noggit_m2::Model) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(model.passes())?);
    Ok(())
}

#[cfg(not(feature = "json"))]
fn print_json(_model: &noggit_m2::Model) -> Result<()> {
    bail!("JSON output requires the `json` feature")
}
