//! Directory scanning.
//!
//! Lists the immediate entries of the image directory and keeps the ones
//! whose name ends with a recognized extension:
//!
//! ```text
//! images/
//! ├── A.JPG          ✓
//! ├── a.png          ✓
//! ├── b.png          ✓
//! ├── notes.txt      ✗ not an image suffix
//! ├── photos.png/    ✓ a folder, but the name has an image suffix
//! └── sub/           ✗ not descended into
//! ```
//!
//! ## Matching Rules
//!
//! - **Non-recursive**: subdirectories are never descended into.
//! - **Name-only**: the check is a plain, case-sensitive string suffix match.
//!   A folder named `photos.png` is included; a file named `photo.Png` is not.
//!   Nothing is opened or decoded.
//! - **Byte order**: names are sorted by byte (codepoint) order, so every
//!   name starting with an uppercase letter sorts before any name starting
//!   with a lowercase one (`A.JPG` < `a.png` < `b.png`).
//!
//! Any error reading the directory aborts the scan. There is no partial result.

use crate::manifest::Manifest;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image name is not valid UTF-8: {0}")]
    NonUtf8Name(PathBuf),
}

/// Scan `dir` and return the manifest of recognized image names.
///
/// Sorting happens in [`Manifest::new`].
pub fn scan(dir: &Path, extensions: &[String]) -> Result<Manifest, ScanError> {
    let read_err = |source: std::io::Error| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if let Some(name) = image_name(dir, entry.file_name(), extensions)? {
            names.push(name);
        } else {
            tracing::trace!(entry = ?entry.file_name(), "skipped");
        }
    }

    tracing::debug!(dir = %dir.display(), count = names.len(), "scanned directory");
    Ok(Manifest::new(names))
}

/// Whether `name` ends with one of the recognized suffixes.
pub fn is_image_name(name: &str, extensions: &[String]) -> bool {
    extensions.iter().any(|ext| name.ends_with(ext.as_str()))
}

/// Returns the entry's name if it belongs in the manifest.
///
/// A name that is not valid UTF-8 can't be written as a JSON string. That
/// is only an error when the raw bytes carry an image suffix; otherwise
/// the entry would have been filtered out anyway.
fn image_name(
    dir: &Path,
    file_name: OsString,
    extensions: &[String],
) -> Result<Option<String>, ScanError> {
    match file_name.into_string() {
        Ok(name) => Ok(is_image_name(&name, extensions).then_some(name)),
        Err(raw) => {
            let bytes = raw.as_encoded_bytes();
            if extensions.iter().any(|ext| bytes.ends_with(ext.as_bytes())) {
                Err(ScanError::NonUtf8Name(dir.join(raw)))
            } else {
                Ok(None)
            }
        }
    }
}
