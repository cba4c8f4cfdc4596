//! Test-only helpers that keep production modules lean.
//!
//! Image fixtures are generated in memory. Padding appended after the encoded
//! image is never read by the header-only dimension probe, so it lets tests dial
//! in an exact byte size (and therefore quality score) for a given resolution.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::types::ImageFile;

/// Size that comfortably passes the quality heuristic for a 400x400 image.
const COMFORTABLE_SIZE: usize = 200_000;

// Truncation is the point: a cheap repeating gradient.
#[allow(clippy::cast_possible_truncation)]
fn fixture(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
}

/// Encode a `width` x `height` PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 200, 200])))
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode png fixture");
    buffer
}

/// Encode a `width` x `height` JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(fixture(width, height))
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, 85))
        .expect("encode jpeg fixture");
    buffer
}

/// Pad `bytes` with zeros up to `size`. Larger inputs are returned unchanged.
pub fn padded(mut bytes: Vec<u8>, size: usize) -> Vec<u8> {
    if bytes.len() < size {
        bytes.resize(size, 0);
    }
    bytes
}

/// PNG fixture padded to `size` bytes (0 = unpadded).
pub fn png_file(width: u32, height: u32, size: usize) -> ImageFile {
    ImageFile::new("image.png", "image/png", padded(png_bytes(width, height), size))
}

/// JPEG fixture padded to `size` bytes (0 = unpadded).
pub fn jpeg_file(width: u32, height: u32, size: usize) -> ImageFile {
    ImageFile::new(
        "image.jpg",
        "image/jpeg",
        padded(jpeg_bytes(width, height), size),
    )
}

/// An ID document image that passes the precheck.
pub fn valid_id_image() -> ImageFile {
    ImageFile::new(
        "id.png",
        "image/png",
        padded(png_bytes(400, 400), COMFORTABLE_SIZE),
    )
}

/// A selfie image that passes the precheck.
pub fn valid_selfie() -> ImageFile {
    ImageFile::new(
        "selfie.jpg",
        "image/jpeg",
        padded(jpeg_bytes(400, 400), COMFORTABLE_SIZE),
    )
}

/// A frame as a camera would deliver it.
pub fn camera_frame(width: u32, height: u32) -> RgbImage {
    fixture(width, height)
}
