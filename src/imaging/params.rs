//! Parameter types for rendering images onto pages.
//!
//! - [`PageSize`]: physical page an image is centred on, or `None` to use the image's own size.
//! - [`QualityPreset`]: named resolutions: low (150 dpi), medium (300), high (600).
//! - [`RenderParams`]: everything a single image render needs.

use serde::{Deserialize, Serialize};

/// Page an image is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    Letter,
    A4,
    /// No fixed page: one image pixel per dot at the render resolution.
    None,
}

impl PageSize {
    /// Width and height in inches, if the page has a fixed size.
    pub fn inches(self) -> Option<(f64, f64)> {
        match self {
            PageSize::Letter => Some((8.5, 11.0)),
            PageSize::A4 => Some((8.27, 11.69)),
            PageSize::None => None,
        }
    }
}

/// Named resolution presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    #[default]
    Low,
    Medium,
    High,
}

impl QualityPreset {
    pub fn dpi(self) -> u32 {
        match self {
            QualityPreset::Low => 150,
            QualityPreset::Medium => 300,
            QualityPreset::High => 600,
        }
    }
}

/// Highest render resolution accepted from config, CLI or a `.dpi` marker.
pub const MAX_DPI: u32 = 2400;

/// JPEG quality used for embedded page images (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Everything needed to render one image as one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderParams {
    pub page: PageSize,
    pub dpi: u32,
    pub jpeg_quality: u8,
}

impl RenderParams {
    pub fn new(page: PageSize, dpi: u32) -> Self {
        Self {
            page,
            dpi: dpi.max(1),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self::new(PageSize::default(), QualityPreset::default().dpi())
    }
}
