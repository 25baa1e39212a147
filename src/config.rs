//! Configuration module.
//!
//! Handles loading, validating, and merging `grafika.toml`. Stock defaults are
//! the base layer; a user file overrides just the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [backends]
//! order = ["skia", "raster"]   # Probe order; first available backend wins
//!
//! [text]
//! # font = "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"
//! size = 12.0                  # Default font size in pixels
//!
//! [output]
//! jpeg_quality = 75            # JPEG quality (0-100); PNG and GIF ignore it
//! dir_permissions = 0o755      # Mode for directories created on save
//! interlace = false            # Progressive JPEG request (logged and ignored)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{BackendKind, Quality, SaveOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "grafika.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `grafika.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrafikaConfig {
    /// Backend probe order.
    pub backends: BackendsConfig,
    /// Defaults for `text`.
    pub text: TextConfig,
    /// Defaults for `save`.
    pub output: OutputConfig,
}

impl GrafikaConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let order = self.backend_order()?;
        if order.is_empty() {
            return Err(ConfigError::Validation(
                "backends.order must not be empty".into(),
            ));
        }
        for (i, kind) in order.iter().enumerate() {
            if order[..i].contains(kind) {
                return Err(ConfigError::Validation(format!(
                    "backends.order lists '{kind}' twice"
                )));
            }
        }
        if self.output.jpeg_quality > 100 {
            return Err(ConfigError::Validation(
                "output.jpeg_quality must be 0-100".into(),
            ));
        }
        if self.output.dir_permissions > 0o7777 {
            return Err(ConfigError::Validation(format!(
                "output.dir_permissions {:#o} is not a valid mode",
                self.output.dir_permissions
            )));
        }
        if !(self.text.size.is_finite() && self.text.size > 0.0) {
            return Err(ConfigError::Validation(
                "text.size must be a positive number".into(),
            ));
        }
        Ok(())
    }

    /// Parsed backend order.
    pub fn backend_order(&self) -> Result<Vec<BackendKind>, ConfigError> {
        self.backends
            .order
            .iter()
            .map(|name| {
                name.parse::<BackendKind>().map_err(|_| {
                    ConfigError::Validation(format!(
                        "backends.order: unknown backend '{name}' (expected skia or raster)"
                    ))
                })
            })
            .collect()
    }

    /// Save options carrying the configured defaults.
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            image_type: None,
            quality: Quality::new(self.output.jpeg_quality),
            interlace: self.output.interlace,
            permissions: self.output.dir_permissions,
        }
    }
}

/// Backend selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendsConfig {
    /// Backend names in probe order.
    pub order: Vec<String>,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            order: BackendKind::ALL.iter().map(|k| k.name().to_string()).collect(),
        }
    }
}

/// Text rendering defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    /// Font file used when `text` is called without one.
    pub font: Option<PathBuf>,
    /// Font size in pixels.
    pub size: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font: None,
            size: 12.0,
        }
    }
}

/// Output settings for `save`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG quality (0 = worst, 100 = best).
    pub jpeg_quality: u32,
    /// Unix mode for directories created on the way to a save target.
    pub dir_permissions: u32,
    /// Request progressive JPEG output.
    pub interlace: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 75,
            dir_permissions: 0o755,
            interlace: false,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GrafikaConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(file: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !file.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(file)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GrafikaConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GrafikaConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `file`, falling back to stock defaults when it is absent.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(file: &Path) -> Result<GrafikaConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(file)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `grafika.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Grafika Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Backends
# ---------------------------------------------------------------------------
[backends]
# Probe order. The first backend whose capability check passes is used.
#   skia   - anti-aliased shapes, bicubic resampling, any-angle rotation
#   raster - aliased shapes, triangle resampling, lossless right-angle rotation
order = ["skia", "raster"]

# ---------------------------------------------------------------------------
# Text
# ---------------------------------------------------------------------------
[text]
# TrueType/OpenType font used when no font is passed to `text`.
# Without one, `text` calls must name a font explicitly.
# font = "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"

# Font size in pixels.
size = 12.0

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# JPEG quality (0 = worst, 100 = best). PNG and GIF ignore it.
jpeg_quality = 75

# Mode for directories created on the way to a save target.
dir_permissions = 0o755

# Progressive JPEG. Not supported by the encoder; logged and ignored.
interlace = false
"##
}
