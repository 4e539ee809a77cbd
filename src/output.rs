//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! Generated images.json with 3 images
//! First 10 images: ["A.JPG", "a.png", "b.png"]
//! ```
//!
//! The preview is the head of the sorted manifest, at most `preview_count`
//! names, rendered as a Rust string list. It is `[]` for an empty directory.
//!
//! ## Check
//!
//! ```text
//! Found 3 images in images
//!     A.JPG
//!     a.png
//!     b.png
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. Diagnostics never go to
//! stdout; they go through `tracing` to stderr.

use crate::manifest::Manifest;
use std::path::Path;

/// Format the summary printed after the manifest is written.
pub fn format_generate_output(
    manifest: &Manifest,
    output_name: &str,
    preview_count: usize,
) -> Vec<String> {
    vec![
        format!("Generated {} with {} images", output_name, manifest.len()),
        format!(
            "First {} images: {:?}",
            preview_count,
            manifest.preview(preview_count)
        ),
    ]
}

/// Print the generate summary to stdout.
pub fn print_generate_output(manifest: &Manifest, output_name: &str, preview_count: usize) {
    for line in format_generate_output(manifest, output_name, preview_count) {
        println!("{}", line);
    }
}

/// Format the full listing shown by `check`.
pub fn format_check_output(manifest: &Manifest, dir: &Path) -> Vec<String> {
    let mut lines = Vec::with_capacity(manifest.len() + 1);
    lines.push(format!(
        "Found {} images in {}",
        manifest.len(),
        dir.display()
    ));
    lines.extend(manifest.names().iter().map(|name| format!("    {}", name)));
    lines
}

/// Print the check listing to stdout.
pub fn print_check_output(manifest: &Manifest, dir: &Path) {
    for line in format_check_output(manifest, dir) {
        println!("{}", line);
    }
}
