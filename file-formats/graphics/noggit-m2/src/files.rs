//! Access to model files and their companions
//!
//! Paths are game paths (`World\Generic\Tree.m2`). Providers accept either
//! separator.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LoadError, Result};

/// Source of file bytes by game path
pub trait FileProvider: Send + Sync {
    /// Read a whole file; absent files are `MissingCompanionFile`
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    fn exists(&self, path: &str) -> bool;
}

/// Lookup key for a game path: forward slashes, lower case
fn normalize(path: &str) -> String {
    path.replace('\\', "/").to_ascii_lowercase()
}

/// Path without its extension
fn stem(path: &str) -> &str {
    let file_start = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) => &path[..file_start + dot],
        None => path,
    }
}

/// First level-of-detail skin file of a model
pub fn skin_path(model_path: &str) -> String {
    format!("{}00.skin", stem(model_path))
}

/// Side file holding the keyframes of one clip
///
/// Ids are zero-padded to four and two digits, as the client names them.
pub fn anim_path(model_path: &str, animation_id: u16, sub_animation_id: u16) -> String {
    format!(
        "{}{animation_id:04}-{sub_animation_id:02}.anim",
        stem(model_path)
    )
}

/// Files held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>) {
        self.files.insert(normalize(path), data.into());
    }

    /// Builder-style [`MemoryFiles::insert`]
    pub fn with(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(&normalize(path))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileProvider for MemoryFiles {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| LoadError::MissingCompanionFile(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(&normalize(path))
    }
}

/// Files extracted to a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryFiles {
    root: PathBuf,
}

impl DirectoryFiles {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split(['/', '\\'])
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |full, part| full.join(part))
    }
}

impl FileProvider for DirectoryFiles {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        fs::read(&full_path).map_err(|e| {
            log::debug!("Failed to read {}: {e}", full_path.display());
            LoadError::MissingCompanionFile(path.to_string())
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }
}
