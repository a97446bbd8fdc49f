//! Compile configuration.
//!
//! Handles loading and validating `foldpdf.toml`. The file is optional and
//! lives in the compile root; every key has a default, and command-line flags
//! override whatever the file says.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! page_size = "letter"      # letter | a4 | none
//! quality = "low"           # low (150 dpi) | medium (300) | high (600)
//! # dpi = 200               # Explicit resolution, wins over `quality`
//! jpeg_quality = 90         # JPEG quality of embedded images (1-100)
//! pretty_labels = false     # Prettify outline titles without a label
//! include = []              # Regexes a relative path must match
//! exclude = []              # Regexes that drop a relative path
//!
//! [metadata]
//! # title = "..."           # Defaults to the root folder's name
//! # author = "..."
//! # subject = "..."
//! # keywords = "..."
//!
//! [processing]
//! # max_processes = 4       # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early. The config file is never
//! bound into the document itself: it is neither a PDF nor an image.

use crate::compile::CompileOptions;
use crate::imaging::{DEFAULT_JPEG_QUALITY, PageSize, QualityPreset};
use crate::materialize::LopdfMaterializer;
use crate::writer::DocumentMetadata;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the compile root.
pub const CONFIG_FILE: &str = "foldpdf.toml";

pub use crate::imaging::MAX_DPI;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `foldpdf.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileConfig {
    /// Page images are centred on.
    pub page_size: PageSize,
    /// Resolution preset, used when `dpi` is not set.
    pub quality: QualityPreset,
    /// Explicit resolution in dots per inch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
    /// JPEG quality of embedded page images (1-100).
    pub jpeg_quality: u8,
    /// Prettify unlabelled outline titles.
    pub pretty_labels: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Document information written to the output.
    pub metadata: DocumentMetadata,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            quality: QualityPreset::default(),
            dpi: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            pretty_labels: false,
            include: Vec::new(),
            exclude: Vec::new(),
            metadata: DocumentMetadata::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

/// Values given on the command line. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub page_size: Option<PageSize>,
    pub quality: Option<QualityPreset>,
    pub dpi: Option<u32>,
    pub pretty_labels: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub metadata: DocumentMetadata,
}

impl CompileConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dpi) = self.dpi.filter(|dpi| !(1..=MAX_DPI).contains(dpi)) {
            return Err(ConfigError::Validation(format!(
                "dpi must be 1-{MAX_DPI}, got {dpi}"
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Validation(
                "jpeg_quality must be 1-100".into(),
            ));
        }
        for pattern in self.include.iter().chain(&self.exclude) {
            Regex::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("invalid pattern {pattern:?}: {e}"))
            })?;
        }
        Ok(())
    }

    /// Resolution used for images outside any `.dpi` folder.
    pub fn effective_dpi(&self) -> u32 {
        self.dpi.unwrap_or_else(|| self.quality.dpi())
    }

    /// Layer command-line values on top of the file.
    ///
    /// A quality preset given on the command line clears a `dpi` from the
    /// file; an explicit `--dpi` beats both. Non-empty pattern lists replace
    /// the file's lists. Metadata is merged field by field.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(page_size) = overrides.page_size {
            self.page_size = page_size;
        }
        if let Some(quality) = overrides.quality {
            self.quality = quality;
            self.dpi = None;
        }
        if overrides.dpi.is_some() {
            self.dpi = overrides.dpi;
        }
        self.pretty_labels |= overrides.pretty_labels;
        if !overrides.include.is_empty() {
            self.include = overrides.include;
        }
        if !overrides.exclude.is_empty() {
            self.exclude = overrides.exclude;
        }
        self.metadata = overrides.metadata.or(self.metadata);
        self
    }

    /// Options for [`crate::compile::compile`] writing to `output`.
    pub fn compile_options(&self, output: PathBuf) -> CompileOptions {
        CompileOptions {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            pretty: self.pretty_labels,
            output,
            metadata: self.metadata.clone(),
        }
    }

    /// The production page materializer for these settings.
    pub fn materializer(&self) -> LopdfMaterializer {
        LopdfMaterializer::new(self.page_size, self.effective_dpi())
            .with_jpeg_quality(self.jpeg_quality)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel materialization workers.
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

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<CompileConfig, ConfigError> {
    let config: CompileConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load `foldpdf.toml` from the given directory.
///
/// Returns the defaults when the directory has no config file.
pub fn load_config(root: &Path) -> Result<CompileConfig, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.is_file() {
        return Ok(CompileConfig::default());
    }
    parse_config(&fs::read_to_string(&config_path)?)
}

/// Returns a fully-commented stock `foldpdf.toml` with all keys and explanations.
///
/// Used by the `--gen-config` flag.
pub fn stock_config_toml() -> &'static str {
    r##"# foldpdf Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the root folder being compiled. Command-line flags
# override anything set here. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Image pages
# ---------------------------------------------------------------------------
# Page each image is centred on: "letter" (8.5 x 11 in), "a4", or "none"
# to keep the image's own size.
page_size = "letter"

# Resolution preset: "low" (150 dpi), "medium" (300), "high" (600).
quality = "low"

# Explicit resolution in dpi (1-2400). Wins over `quality`.
# A `.dpi` file inside a folder wins over both for that folder's images.
# dpi = 200

# JPEG quality of embedded images (1 = worst, 100 = best).
jpeg_quality = 90

# ---------------------------------------------------------------------------
# Outline
# ---------------------------------------------------------------------------
# Replace underscores with spaces and capitalise titles that have no
# explicit label.
pretty_labels = false

# ---------------------------------------------------------------------------
# Selection
# ---------------------------------------------------------------------------
# Regular expressions matched against each path relative to the root.
# A path must match at least one include pattern (when any are given)
# and no exclude pattern.
include = []
exclude = []

# ---------------------------------------------------------------------------
# Document information
# ---------------------------------------------------------------------------
[metadata]
# title = "Defaults to the root folder's name"
# author = ""
# subject = ""
# keywords = ""

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for reading PDFs and rendering images.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
