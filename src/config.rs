//! Manifest configuration.
//!
//! Handles loading, validating, and layering `config.toml`. Every setting has
//! a stock default, so running with no config file and no flags produces the
//! classic `images/images.json` manifest.
//!
//! ## Config File Location
//!
//! The config file lives inside the scanned directory:
//!
//! ```text
//! images/
//! ├── config.toml     # Optional, overrides stock defaults
//! ├── images.json     # Generated manifest
//! ├── A.JPG
//! └── a.png
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! extensions = [".jpg", ".jpeg", ".png", ".gif", ".JPG", ".JPEG", ".PNG", ".GIF"]
//! output = "images.json"    # Manifest file name, written inside the directory
//! preview_count = 10        # How many names the summary prints
//! ```
//!
//! ## Layering
//!
//! Stock defaults, then `config.toml`, then CLI flags. Each layer is a sparse
//! `toml::Value` table merged onto the previous one with [`merge_toml`], so a
//! layer only needs the keys it wants to change. Unknown keys are rejected to
//! catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the scanned directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// The recognized image suffixes. Matching is case-sensitive, so each type is
/// listed in both lower and upper case, and nothing else (`.Jpg` is not an image).
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".JPG", ".JPEG", ".PNG", ".GIF",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Manifest generation settings.
///
/// All fields have defaults matching the classic behavior. Unknown keys are
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Filename suffixes that mark an entry as an image.
    pub extensions: Vec<String>,
    /// Manifest file name, created inside the scanned directory.
    pub output: String,
    /// Number of manifest entries echoed in the console summary.
    pub preview_count: usize,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            output: "images.json".to_string(),
            preview_count: 10,
        }
    }
}

impl ManifestConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must not be empty".into(),
            ));
        }
        if self.extensions.iter().any(|e| e.is_empty()) {
            return Err(ConfigError::Validation(
                "extensions must not contain an empty suffix".into(),
            ));
        }
        if self.output.is_empty() {
            return Err(ConfigError::Validation("output must not be empty".into()));
        }
        // The manifest always lands next to the images it lists
        if self.output.contains(['/', '\\']) || self.output == "." || self.output == ".." {
            return Err(ConfigError::Validation(format!(
                "output must be a bare file name, got {:?}",
                self.output
            )));
        }
        Ok(())
    }
}

/// Overrides supplied on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_count: Option<usize>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ManifestConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so an
///   `extensions` list in a config file replaces the stock list.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file, including when the
/// directory itself does not exist (the scan reports that).
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge the given layers in order onto the stock defaults, then deserialize
/// and validate.
pub fn resolve_config<I>(layers: I) -> Result<ManifestConfig, ConfigError>
where
    I: IntoIterator<Item = toml::Value>,
{
    let merged = layers.into_iter().fold(stock_defaults_value(), merge_toml);
    let config: ManifestConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config for a directory: stock defaults, then
/// `<dir>/config.toml`, then CLI overrides.
pub fn load_config(dir: &Path, overrides: &CliOverrides) -> Result<ManifestConfig, ConfigError> {
    let file_layer = load_raw_config(dir)?;
    if file_layer.is_some() {
        tracing::debug!(path = %dir.join(CONFIG_FILENAME).display(), "loaded config file");
    }
    let cli_layer =
        toml::Value::try_from(overrides).map_err(|e| ConfigError::Validation(e.to_string()))?;
    resolve_config(file_layer.into_iter().chain(std::iter::once(cli_layer)))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-manifest configuration
# ============================
# Place this file in the scanned directory as config.toml.
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Filename suffixes that mark an entry as an image. Matching is an exact,
# case-sensitive suffix check: list every casing you want to accept.
extensions = [".jpg", ".jpeg", ".png", ".gif", ".JPG", ".JPEG", ".PNG", ".GIF"]

# Manifest file name, written inside the scanned directory.
output = "images.json"

# Number of manifest entries printed in the console summary.
preview_count = 10
"##
}
