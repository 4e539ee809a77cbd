//! Manifest generation: scan the directory, write the manifest.
//!
//! Every run regenerates the manifest from scratch. Nothing from a previous
//! `images.json` is read or merged, so adding, removing, or renaming an image
//! and re-running always yields exactly the current directory contents.
//!
//! The scan completes before anything is written. A directory that can't be
//! read therefore never gets a manifest, and a failed write leaves the old
//! manifest as it was.

use crate::config::ManifestConfig;
use crate::manifest::{self, Manifest, WriteError};
use crate::scan::{self, ScanError};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// What a successful run produced.
#[derive(Debug)]
pub struct Generated {
    pub manifest: Manifest,
    /// Path of the written manifest file.
    pub path: PathBuf,
}

pub fn generate(dir: &Path, config: &ManifestConfig) -> Result<Generated, GenerateError> {
    let manifest = scan::scan(dir, &config.extensions)?;
    let path = manifest::write_manifest(&manifest, dir, &config.output)?;
    tracing::info!(path = %path.display(), images = manifest.len(), "manifest generated");
    Ok(Generated { manifest, path })
}
