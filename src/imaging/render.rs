//! Render one image as a one-page PDF document.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, BMP, GIF, TIFF, WebP) | `image::ImageReader` |
//! | Shrink to fit the canvas | `image::imageops::resize` with `Lanczos3` |
//! | Centre on a white canvas | `image::imageops::overlay` |
//! | Embed | JPEG (`DCTDecode`) image XObject drawn full-page via `lopdf` |

use super::calculations::{MAX_CANVAS_PIXELS, canvas_fits, canvas_size, center_offset, fit_within, page_points};
use super::params::RenderParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageReader, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image decoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF construction failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Page canvas of {width}x{height} pixels at {dpi} dpi exceeds {max} pixels", max = MAX_CANVAS_PIXELS)]
    CanvasTooLarge { width: u32, height: u32, dpi: u32 },
}

/// Decode `path` and lay it out on a page according to `params`.
pub fn render_page_image(path: &Path, params: &RenderParams) -> Result<RgbImage, RenderError> {
    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgb8();
    place_on_canvas(image, params)
}

/// Shrink and centre `image` on the page canvas. Without a fixed page size
/// the image is returned as is.
///
/// Fails before allocating if the canvas would exceed [`MAX_CANVAS_PIXELS`].
pub fn place_on_canvas(image: RgbImage, params: &RenderParams) -> Result<RgbImage, RenderError> {
    let Some(canvas_dims) = canvas_size(params.page, params.dpi) else {
        return Ok(image);
    };
    if !canvas_fits(canvas_dims) {
        return Err(RenderError::CanvasTooLarge {
            width: canvas_dims.0,
            height: canvas_dims.1,
            dpi: params.dpi,
        });
    }

    let fitted = fit_within(image.dimensions(), canvas_dims);
    let image = if fitted == image.dimensions() {
        image
    } else {
        imageops::resize(&image, fitted.0, fitted.1, FilterType::Lanczos3)
    };

    let mut canvas = RgbImage::from_pixel(canvas_dims.0, canvas_dims.1, Rgb([255, 255, 255]));
    let (x, y) = center_offset(fitted, canvas_dims);
    imageops::overlay(&mut canvas, &image, x as i64, y as i64);
    Ok(canvas)
}

/// Render `path` into a standalone single-page PDF document.
pub fn render_image_document(path: &Path, params: &RenderParams) -> Result<Document, RenderError> {
    let page = render_page_image(path, params)?;
    image_document(&page, params)
}

/// Wrap an RGB bitmap as a single PDF page sized `pixels × 72 / dpi` points.
pub fn image_document(page: &RgbImage, params: &RenderParams) -> Result<Document, RenderError> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, params.jpeg_quality).encode_image(page)?;

    let (width, height) = page.dimensions();
    let (width_pt, height_pt) = page_points((width, height), params.dpi);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width_pt.into(),
                    0.into(),
                    0.into(),
                    height_pt.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
        "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}
