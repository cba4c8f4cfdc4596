//! Manual file upload variant of the selfie source.

use crate::error::CaptureError;
use crate::precheck;
use crate::types::{ImageFile, ImageValidationResult};

/// Holds the most recently accepted upload.
#[derive(Debug, Default)]
pub struct UploadCapture {
    selected: Option<ImageFile>,
}

impl UploadCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the precheck on `image` and keep it if it passes.
    ///
    /// A rejected file leaves the previous selection untouched.
    pub fn select(&mut self, image: ImageFile) -> Result<ImageValidationResult, CaptureError> {
        let result = precheck::validate(&image);
        if !result.is_valid {
            return Err(CaptureError::Precheck(result));
        }
        tracing::debug!(file = image.file_name(), bytes = image.size(), "Upload selected");
        self.selected = Some(image);
        Ok(result)
    }

    pub fn selected(&self) -> Option<&ImageFile> {
        self.selected.as_ref()
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn capture(&self) -> Result<ImageFile, CaptureError> {
        self.selected.clone().ok_or(CaptureError::NothingSelected)
    }
}
