//! `info`: model summary

use anyhow::Result;
use noggit_m2::DirectoryFiles;

use crate::utils::format_vec3;

pub fn execute(files: &DirectoryFiles, path: &str) -> Result<()> {
    let model = super::load(files, path)?;
    let flags = model.animation_flags();
    let bounds = model.bounding_box();

    println!("=== M2 Model Information ===");
    println!("Path:            {}", model.path());
    println!("Flags:           {:?}", model.flags());
    println!("Vertices:        {}", model.vertices().len());
    println!("Triangles:       {}", model.indices().len() / 3);
    println!("Render passes:   {}", model.passes().len());
    println!("Geosets:         {}", model.geoset_count());
    println!("Bones:           {}", model.bones().len());
    println!("Global seqs:     {}", model.global_sequences().len());
    println!("Lights:          {}", model.lights().len());
    println!("Camera:          {}", if model.camera().is_some() { "yes" } else { "no" });
    println!("Particle systems:{:>2}", model.particles().len());
    println!("Ribbons:         {}", model.ribbons().len());
    println!(
        "Bounds:          {} .. {} (radius {:.3})",
        format_vec3(bounds.min),
        format_vec3(bounds.max),
        model.bounding_radius()
    );
    println!(
        "Animated:        {} (geometry {}, per instance {}, textures {})",
        flags.animated, flags.geometry, flags.per_instance, flags.textures
    );

    if !model.clips().is_empty() {
        println!("\nClips:");
        for (index, clip) in model.clips().iter().enumerate() {
            println!(
                "  [{index}] id {}.{} {} ms{}",
                clip.animation_id,
                clip.sub_animation_id,
                clip.length,
                if clip.is_embedded() { "" } else { " (side file)" }
            );
        }
    }

    if !model.textures().is_empty() {
        println!("\nTextures:");
        for (index, texture) in model.textures().iter().enumerate() {
            let kind = if texture.is_replaceable() {
                format!(" (replaceable {})", texture.texture_type)
            } else {
                String::new()
            };
            println!("  [{index}] {}{kind}", texture.filename);
        }
    }

    if !model.warnings().is_empty() {
        println!("\nWarnings:");
        for warning in model.warnings() {
            println!("  - {warning}");
        }
    }

    Ok(())
}
