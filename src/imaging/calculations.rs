//! Pure geometry for placing an image on a page.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::PageSize;

/// Points per inch in PDF user space.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Largest canvas, in pixels, a render may allocate. Letter and A4 at
/// [`MAX_DPI`](super::params::MAX_DPI) both fit.
pub const MAX_CANVAS_PIXELS: u64 = 600_000_000;

/// Canvas size in pixels for a page size at a resolution.
///
/// Returns `None` for [`PageSize::None`]: the page takes the image's own size.
///
/// ```
/// # use foldpdf::imaging::{PageSize, canvas_size};
/// assert_eq!(canvas_size(PageSize::Letter, 100), Some((850, 1100)));
/// assert_eq!(canvas_size(PageSize::None, 100), None);
/// ```
pub fn canvas_size(page: PageSize, dpi: u32) -> Option<(u32, u32)> {
    let (width_in, height_in) = page.inches()?;
    let dpi = dpi as f64;
    // Truncate, never round up past the physical page.
    Some(((width_in * dpi) as u32, (height_in * dpi) as u32))
}

/// True if a canvas of `dims` stays within [`MAX_CANVAS_PIXELS`].
pub fn canvas_fits(dims: (u32, u32)) -> bool {
    u64::from(dims.0) * u64::from(dims.1) <= MAX_CANVAS_PIXELS
}

/// Largest size with the source's aspect ratio that fits inside `bounds`.
///
/// Images are only ever shrunk: a source that already fits is returned
/// unchanged. Neither edge drops below 1px.
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Top-left offset that centres `inner` inside `outer`.
pub fn center_offset(inner: (u32, u32), outer: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(inner.0) / 2,
        outer.1.saturating_sub(inner.1) / 2,
    )
}

/// Physical page size in points for a pixel size at a resolution.
pub fn page_points(pixels: (u32, u32), dpi: u32) -> (f32, f32) {
    let dpi = dpi.max(1) as f32;
    (
        pixels.0 as f32 * POINTS_PER_INCH / dpi,
        pixels.1 as f32 * POINTS_PER_INCH / dpi,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::MAX_DPI;

    // =========================================================================
    // canvas_size tests
    // =========================================================================

    #[test]
    fn letter_at_150_dpi() {
        assert_eq!(canvas_size(PageSize::Letter, 150), Some((1275, 1650)));
    }

    #[test]
    fn a4_at_300_dpi_truncates() {
        // 8.27 * 300 = 2481, 11.69 * 300 = 3507
        assert_eq!(canvas_size(PageSize::A4, 300), Some((2481, 3507)));
    }

    #[test]
    fn no_page_size_has_no_canvas() {
        assert_eq!(canvas_size(PageSize::None, 300), None);
    }

    // =========================================================================
    // fit_within tests
    // =========================================================================

    #[test]
    fn small_image_untouched() {
        assert_eq!(fit_within((400, 300), (1275, 1650)), (400, 300));
    }

    #[test]
    fn wide_image_limited_by_width() {
        // 4000x3000 into 1275x1650: scale = 1275/4000 → 1275x956
        assert_eq!(fit_within((4000, 3000), (1275, 1650)), (1275, 956));
    }

    #[test]
    fn tall_image_limited_by_height() {
        // 1000x5000 into 1275x1650: scale = 1650/5000 → 330x1650
        assert_eq!(fit_within((1000, 5000), (1275, 1650)), (330, 1650));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_within((100_000, 10), (1000, 1000)), (1000, 1));
    }

    // =========================================================================
    // center_offset / page_points tests
    // =========================================================================

    #[test]
    fn centered_offsets() {
        assert_eq!(center_offset((1275, 956), (1275, 1650)), (0, 347));
        assert_eq!(center_offset((10, 10), (5, 5)), (0, 0));
    }

    #[test]
    fn points_from_pixels() {
        assert_eq!(page_points((1275, 1650), 150), (612.0, 792.0));
        assert_eq!(page_points((300, 300), 300), (72.0, 72.0));
    }

    #[test]
    fn largest_pages_fit_at_max_dpi() {
        for page in [PageSize::Letter, PageSize::A4] {
            let dims = canvas_size(page, MAX_DPI).unwrap();
            assert!(canvas_fits(dims), "{page:?} at {MAX_DPI} dpi: {dims:?}");
        }
    }

    #[test]
    fn oversized_canvas_rejected() {
        let dims = canvas_size(PageSize::Letter, 1_000_000).unwrap();
        assert!(!canvas_fits(dims));
        assert!(!canvas_fits((u32::MAX, u32::MAX)));
    }
}
