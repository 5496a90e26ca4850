//! Sub-command implementations

pub mod info;
pub mod passes;
pub mod pose;

use std::path::Path;

use anyhow::{Context, Result, bail};
use noggit_m2::{DirectoryFiles, LoadOptions, Model, load_model};

/// File provider rooted at the data directory
pub fn open_data(root: &Path) -> Result<DirectoryFiles> {
    if !root.is_dir() {
        bail!("Data directory {} does not exist", root.display());
    }
    Ok(DirectoryFiles::new(root))
}

/// Load one model with a fixed particle seed so output is reproducible
pub fn load(files: &DirectoryFiles, path: &str) -> Result<Model> {
    let options = LoadOptions {
        seed: Some(0),
        ..LoadOptions::default()
    };
    load_model(path, files, &options).with_context(|| format!("Failed to load model {path}"))
}
