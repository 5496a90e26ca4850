//! Batch loading on worker threads
//!
//! Parsing only needs bytes and a [`FileProvider`], so a batch of models can
//! be loaded on the rayon pool and handed to the render thread afterwards.
//! Failed loads become empty finished models, the same as
//! [`Model::load_or_empty`].

use rayon::prelude::*;

use crate::error::Result;
use crate::files::FileProvider;
use crate::model::{LoadOptions, Model};

/// Read and parse one model by game path
pub fn load_model(path: &str, files: &dyn FileProvider, options: &LoadOptions) -> Result<Model> {
    let data = files.read(path)?;
    Model::load_with(path, &data, files, options)
}

/// Load every path in parallel, keeping the input order
pub fn load_models<P: AsRef<str> + Sync>(
    paths: &[P],
    files: &dyn FileProvider,
    options: &LoadOptions,
) -> Vec<Model> {
    log::debug!(
        "Loading {} models on {} threads",
        paths.len(),
        rayon::current_num_threads()
    );

    paths
        .par_iter()
        .map(|path| {
            let path = path.as_ref();
            match load_model(path, files, options) {
                Ok(model) => model,
                Err(err) => {
                    log::error!("Error loading model \"{path}\": {err}");
                    Model::empty(path)
                }
            }
        })
        .collect()
}
