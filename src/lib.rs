//! # image-manifest
//!
//! Build-time manifest generator for static image directories. Lists the
//! images in a folder, sorts their names, and writes them as a JSON array to
//! `images.json` in the same folder, so client code (a static site's gallery,
//! a slideshow) can fetch one file instead of listing the directory at runtime.
//!
//! ```text
//! images/                 images/images.json
//! ├── b.png               [
//! ├── A.JPG      ──→        "A.JPG",
//! ├── a.png                 "a.png",
//! └── notes.txt             "b.png"
//!                         ]
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists the immediate entries of the directory and keeps recognized image names |
//! | [`manifest`] | The sorted [`manifest::Manifest`], its ASCII JSON encoding, and the atomic file write |
//! | [`generate`] | One full run: scan, then write |
//! | [`config`] | `config.toml` loading, validation, and layering with CLI overrides |
//! | [`output`] | CLI summary formatting |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Names Only
//!
//! An entry is an image if its name ends with one of the recognized
//! suffixes, matched case-sensitively. Nothing is opened, decoded, or
//! stat'ed, so a folder named `photos.png` is listed like any file. Clients
//! consuming the manifest rely on this exact, predictable rule.
//!
//! ## Byte Order, Not Natural Order
//!
//! Names are sorted by byte order: `A.JPG` < `Z.png` < `a.png`, and `10.png`
//! < `9.png`. Zero-pad numbered files if display order matters.
//!
//! ## Full Regeneration
//!
//! Each run writes the manifest from scratch. The previous file is never read,
//! so the output depends only on the current directory contents and repeated
//! runs are byte-identical.

pub mod config;
pub mod generate;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
