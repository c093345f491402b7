//! Cropper configuration module.
//!
//! Handles loading, validating, and merging the TOML configuration. Stock
//! defaults are the base layer; a user file overrides any subset of keys.
//!
//! ## Config File Location
//!
//! Pass `--config <FILE>` to use a specific file. Without it, `rioyi-crop.toml`
//! in the current directory is used when present, stock defaults otherwise.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! width = 650               # Output canvas width in pixels
//! height = 434              # Output canvas height in pixels
//! quality = 80              # WebP quality (1-100)
//! brand = "rioyi-dev"       # Filename prefix
//!
//! [smartcrop]
//! detail_weight = 0.2       # Weight of edges / texture
//! skin_weight = 1.8         # Weight of skin-tone pixels
//! saturation_weight = 0.1   # Weight of saturated pixels
//! edge_radius = 0.4         # Fraction of the window treated as border
//! edge_weight = -20.0       # Penalty for interest near the border
//! outside_importance = -0.5 # Weight of interest left outside the window
//! rule_of_thirds = true     # Boost interest near the thirds lines
//! step = 8                  # Candidate spacing (analysis pixels)
//! score_down_sample = 8     # Feature-map cell size (analysis pixels)
//! prescale = true           # Analyse a ~256px copy of large images
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [output]
//! brand = "my-shop"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{CanvasConfig, CropOptions, Dimensions, MAX_WEBP_DIMENSION, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "rioyi-crop.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Cropper configuration.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropperConfig {
    /// Output canvas, encoding and naming.
    pub output: OutputConfig,
    /// Content-aware crop detector weights.
    pub smartcrop: SmartcropConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl CropperConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.width == 0 || self.output.height == 0 {
            return Err(ConfigError::Validation(
                "output.width and output.height must be non-zero".into(),
            ));
        }
        if self.output.width > MAX_WEBP_DIMENSION || self.output.height > MAX_WEBP_DIMENSION {
            return Err(ConfigError::Validation(format!(
                "output.width and output.height must be at most {MAX_WEBP_DIMENSION}"
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.output.brand.is_empty() {
            return Err(ConfigError::Validation(
                "output.brand must not be empty".into(),
            ));
        }
        if self.output.brand.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.brand must not contain path separators".into(),
            ));
        }
        if self.smartcrop.step == 0 || self.smartcrop.score_down_sample == 0 {
            return Err(ConfigError::Validation(
                "smartcrop.step and smartcrop.score_down_sample must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// The render settings every item of a batch is processed with.
    pub fn canvas(&self) -> CanvasConfig {
        CanvasConfig {
            size: Dimensions::new(self.output.width, self.output.height),
            quality: Quality::new(self.output.quality),
            detector: self.smartcrop.to_crop_options(),
        }
    }
}

/// Output canvas, encoding and naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Lossy WebP quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Prefix of every generated filename.
    pub brand: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 650,
            height: 434,
            quality: 80,
            brand: "rioyi-dev".to_string(),
        }
    }
}

/// Crop detector weights. Thresholds and the skin reference colour are fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmartcropConfig {
    pub detail_weight: f64,
    pub skin_weight: f64,
    pub saturation_weight: f64,
    pub edge_radius: f64,
    pub edge_weight: f64,
    pub outside_importance: f64,
    pub rule_of_thirds: bool,
    pub step: u32,
    pub score_down_sample: u32,
    pub prescale: bool,
}

impl Default for SmartcropConfig {
    fn default() -> Self {
        let d = CropOptions::default();
        Self {
            detail_weight: d.detail_weight,
            skin_weight: d.skin_weight,
            saturation_weight: d.saturation_weight,
            edge_radius: d.edge_radius,
            edge_weight: d.edge_weight,
            outside_importance: d.outside_importance,
            rule_of_thirds: d.rule_of_thirds,
            step: d.step,
            score_down_sample: d.score_down_sample,
            prescale: d.prescale,
        }
    }
}

impl SmartcropConfig {
    pub fn to_crop_options(&self) -> CropOptions {
        CropOptions {
            detail_weight: self.detail_weight,
            skin_weight: self.skin_weight,
            saturation_weight: self.saturation_weight,
            edge_radius: self.edge_radius,
            edge_weight: self.edge_weight,
            outside_importance: self.outside_importance,
            rule_of_thirds: self.rule_of_thirds,
            step: self.step,
            score_down_sample: self.score_down_sample,
            prescale: self.prescale,
            ..CropOptions::default()
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(CropperConfig::default()).expect("default config must serialize")
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
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CropperConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CropperConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used if present. User values are merged on top of
/// stock defaults, unknown keys are rejected, and the result is validated.
pub fn load_config(explicit: Option<&Path>) -> Result<CropperConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# rioyi-crop Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Save as rioyi-crop.toml in the working directory, or pass --config <FILE>.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output canvas and naming
# ---------------------------------------------------------------------------
[output]
# Every image is cropped and resized to exactly width x height pixels.
# Each side must be at most 16383 (the WebP limit).
width = 650
height = 434

# Lossy WebP quality (1 = worst, 100 = best).
quality = 80

# Filename prefix: <brand>-<date>-<timestamp>-<index>-<name>.webp
brand = "rioyi-dev"

# ---------------------------------------------------------------------------
# Content-aware crop detection
# ---------------------------------------------------------------------------
[smartcrop]
# Weight of edges and texture.
detail_weight = 0.2

# Weight of pixels close to a skin tone.
skin_weight = 1.8

# Weight of strongly saturated pixels.
saturation_weight = 0.1

# Fraction of the window near its border where interest is penalised.
edge_radius = 0.4
edge_weight = -20.0

# Weight of interest left outside the window (negative = avoid cutting it).
outside_importance = -0.5

# Boost interest that sits near the rule-of-thirds lines.
rule_of_thirds = true

# Distance between candidate windows, in analysis pixels.
step = 8

# Feature-map cell size, in analysis pixels.
score_down_sample = 8

# Analyse a copy of large images scaled to about 256px.
prescale = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
