//! Shared utilities for the noggit-m2 CLI

pub mod table;

pub use table::*;
