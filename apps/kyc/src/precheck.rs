//! Local, advisory image precheck.
//!
//! Runs before an image is accepted into the wizard so obviously unusable
//! uploads never reach the network. The remote service remains the authority
//! on what it will accept.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::types::{ImageFile, ImageValidationResult, PrecheckIssue};

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Minimum width and height in pixels.
pub const MIN_DIMENSION: u32 = 300;

/// Quality scores below this are rejected.
pub const MIN_QUALITY: f64 = 30.0;

/// Content types accepted by the precheck.
pub const ACCEPTED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Validate an image, accumulating every failed check.
///
/// Checks run in a fixed order (format, size, dimensions, quality). If the image
/// cannot be decoded, a single [`PrecheckIssue::Undecodable`] is appended and the
/// dimension and quality checks are skipped.
pub fn validate(image: &ImageFile) -> ImageValidationResult {
    let mut issues = Vec::new();

    if !is_accepted_content_type(image.content_type()) {
        issues.push(PrecheckIssue::UnsupportedFormat);
    }

    if image.size() > MAX_IMAGE_BYTES {
        issues.push(PrecheckIssue::TooLarge);
    }

    let (width, height) = match read_dimensions(image.bytes()) {
        Ok(dimensions) => dimensions,
        Err(e) => {
            tracing::debug!(
                file_name = image.file_name(),
                error = %e,
                "Image could not be decoded"
            );
            issues.push(PrecheckIssue::Undecodable);
            return ImageValidationResult::from_issues(issues, None);
        }
    };

    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        issues.push(PrecheckIssue::TooSmall);
    }

    let quality = quality_score(image.size(), width, height);
    if quality < MIN_QUALITY {
        issues.push(PrecheckIssue::LowQuality);
    }

    let result = ImageValidationResult::from_issues(issues, Some(quality));
    tracing::debug!(
        file_name = image.file_name(),
        width,
        height,
        quality,
        is_valid = result.is_valid,
        "Image precheck complete"
    );
    result
}

/// Crude quality proxy: bytes per pixel, scaled by 1000 and capped at 100.
pub fn quality_score(byte_size: u64, width: u32, height: u32) -> f64 {
    let pixels = f64::from(width) * f64::from(height);
    if pixels == 0.0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let bytes = byte_size as f64;
    (bytes / pixels * 1000.0).min(100.0)
}

pub fn is_accepted_content_type(content_type: &str) -> bool {
    let content_type = content_type.trim();
    ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(content_type))
}

fn read_dimensions(bytes: &[u8]) -> image::ImageResult<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
}

/// Re-encode an image so it fits inside a `max_dimension` square.
///
/// Aspect ratio is preserved and images are never upscaled. PNG input stays PNG;
/// everything else is written as JPEG at `jpeg_quality`.
pub fn compress(
    image: &ImageFile,
    max_dimension: u32,
    jpeg_quality: u8,
) -> image::ImageResult<ImageFile> {
    let decoded = ImageReader::new(Cursor::new(&image.bytes()[..]))
        .with_guessed_format()?
        .decode()?;

    let resized = if decoded.width() > max_dimension || decoded.height() > max_dimension {
        decoded.resize(max_dimension, max_dimension, FilterType::Triangle)
    } else {
        decoded
    };

    let mut buffer = Vec::new();
    let content_type = if image.content_type().trim().eq_ignore_ascii_case("image/png") {
        resized.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        "image/png"
    } else {
        let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
        DynamicImage::ImageRgb8(resized.to_rgb8()).write_with_encoder(encoder)?;
        "image/jpeg"
    };

    tracing::debug!(
        file_name = image.file_name(),
        original_size = image.size(),
        compressed_size = buffer.len(),
        width = resized.width(),
        height = resized.height(),
        "Image compressed"
    );

    Ok(ImageFile::new(image.file_name(), content_type, buffer))
}
