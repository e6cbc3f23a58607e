//! Build configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the source root next to the Markdown pages; every key is optional and
//! overrides the stock default of the same name.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [rewrite]
//! max_iterations = 64          # Cap for passes that repeat until stable
//!
//! [figures]
//! width = "0.8\\textwidth"     # \includegraphics width
//! placement = "H"              # figure float placement
//! png_images = true            # Reference converted .png siblings
//!
//! [document]
//! standalone = false           # Wrap output in a preamble + document env
//! class = "report"             # \documentclass when standalone
//! packages = ["graphicx", "hyperref", "float"]
//! # title = "Manual"           # \title + \maketitle when standalone
//! append = false               # Append to an existing output file
//! source_comments = true       # "% source: <path>" before each page
//!
//! [processing]
//! max_processes = 4            # Max parallel parse workers (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the source root.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Rewrite pipeline limits.
    pub rewrite: RewriteConfig,
    /// Figure environment generated for images.
    pub figures: FiguresConfig,
    /// Output document layout.
    pub document: DocumentConfig,
    /// Parallel parsing settings.
    pub processing: ProcessingConfig,
}

impl BuildConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rewrite.max_iterations == 0 {
            return Err(ConfigError::Validation(
                "rewrite.max_iterations must be at least 1".into(),
            ));
        }
        if self.figures.width.trim().is_empty() {
            return Err(ConfigError::Validation(
                "figures.width must not be empty".into(),
            ));
        }
        if self.document.standalone && self.document.class.trim().is_empty() {
            return Err(ConfigError::Validation(
                "document.class must not be empty for standalone output".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// Maximum sweeps for the replace-until-none-remain passes.
    pub max_iterations: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self { max_iterations: 64 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiguresConfig {
    /// `width=` argument for `\includegraphics`.
    pub width: String,
    /// Float placement specifier, e.g. `"H"` (needs the `float` package) or `"htbp"`.
    pub placement: String,
    /// Rewrite `.svg`, `.jpg`, ... references to the converted `.png`.
    pub png_images: bool,
}

impl Default for FiguresConfig {
    fn default() -> Self {
        Self {
            width: "0.8\\textwidth".to_string(),
            placement: "H".to_string(),
            png_images: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    /// Emit a complete document instead of bare fragments.
    pub standalone: bool,
    /// `\documentclass` used when standalone.
    pub class: String,
    /// Packages loaded in the standalone preamble.
    pub packages: Vec<String>,
    /// Document title for `\maketitle` when standalone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Keep existing output file contents and append after them.
    pub append: bool,
    /// Precede each page with a `% source:` comment.
    pub source_comments: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            standalone: false,
            class: "report".to_string(),
            packages: vec![
                "graphicx".to_string(),
                "hyperref".to_string(),
                "float".to_string(),
            ],
            title: None,
            append: false,
            source_comments: true,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel front-matter parsing workers.
    /// When absent, defaults to the number of CPU cores.
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
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BuildConfig::default())?)
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BuildConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BuildConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<BuildConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# mdlatex Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the source root as config.toml.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Rewrite pipeline
# ---------------------------------------------------------------------------
[rewrite]
# How many times a repeating pass (emphasis, lists, images) may sweep one
# page before the build fails with the fragment that kept matching.
max_iterations = 64

# ---------------------------------------------------------------------------
# Figures generated for ![alt](path) and <img> tags
# ---------------------------------------------------------------------------
[figures]
# Width passed to \includegraphics.
width = "0.8\\textwidth"

# Float placement. "H" pins the figure in place and needs the float package.
placement = "H"

# Point .svg/.jpg/.gif/... references at the .png produced by the image
# converter next to the original file.
png_images = true

# ---------------------------------------------------------------------------
# Output document
# ---------------------------------------------------------------------------
[document]
# false: write bare fragments, to be \input from a master document.
# true: write a complete document with a preamble.
standalone = false

# Document class and packages for standalone output.
class = "report"
packages = ["graphicx", "hyperref", "float"]

# Title typeset with \maketitle in standalone output.
# title = "Manual"

# Keep the existing contents of the output file and append after them.
append = false

# Write "% source: <path>" before each page's fragment.
source_comments = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel front-matter parsing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
