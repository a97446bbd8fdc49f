//! Image pages, rendered in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` |
//! | **Fit to page** | `fit_within` + Lanczos3 resize, centred on a white canvas |
//! | **Embed** | JPEG image XObject in a one-page `lopdf` document |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for page and canvas geometry (unit testable)
//! - **Parameters**: Page sizes, resolution presets, render parameters
//! - **Render**: Decoding, placement and PDF page construction

mod calculations;
mod params;
pub mod render;

pub use calculations::{MAX_CANVAS_PIXELS, canvas_fits, canvas_size, center_offset, fit_within, page_points};
pub use params::{DEFAULT_JPEG_QUALITY, MAX_DPI, PageSize, QualityPreset, RenderParams};
pub use render::{RenderError, render_image_document};
