//! Selfie sources.
//!
//! Two interchangeable ways of producing the selfie [`ImageFile`]:
//! - `live`: camera preview plus a single still frame
//! - `upload`: a user-supplied file checked by the precheck
//!
//! [`SelfieCapture`] keeps one of each and tracks which is active. Switching
//! discards the other's in-progress state and releases any held camera.

pub mod live;
pub mod upload;

use serde::Serialize;

use crate::error::CaptureError;
use crate::types::ImageFile;

pub use live::{
    CameraDevice, CaptureConstraints, FacingMode, LiveCapture, LiveCaptureState, VideoStream,
};
pub use upload::UploadCapture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    Live,
    Upload,
}

/// Selfie source with one active variant per attempt.
pub struct SelfieCapture<D: CameraDevice> {
    mode: CaptureMode,
    live: LiveCapture<D>,
    upload: UploadCapture,
}

impl<D: CameraDevice> SelfieCapture<D> {
    /// Start in live mode; nothing is requested from the camera yet.
    pub fn new(device: D, constraints: CaptureConstraints) -> Self {
        Self {
            mode: CaptureMode::Live,
            live: LiveCapture::new(device, constraints),
            upload: UploadCapture::new(),
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn switch_to(&mut self, mode: CaptureMode) {
        if mode == self.mode {
            return;
        }
        match self.mode {
            CaptureMode::Live => self.live.cancel(),
            CaptureMode::Upload => self.upload.clear(),
        }
        tracing::debug!(from = ?self.mode, to = ?mode, "Selfie source switched");
        self.mode = mode;
    }

    /// Switch to live mode and request the camera.
    ///
    /// On [`CaptureError::PermissionDenied`] the caller can offer upload instead.
    pub fn start_live(&mut self) -> Result<(), CaptureError> {
        self.switch_to(CaptureMode::Live);
        self.live.start()
    }

    pub fn live(&self) -> &LiveCapture<D> {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut LiveCapture<D> {
        &mut self.live
    }

    pub fn upload(&self) -> &UploadCapture {
        &self.upload
    }

    pub fn upload_mut(&mut self) -> &mut UploadCapture {
        &mut self.upload
    }

    /// Produce the selfie from whichever variant is active.
    pub fn capture(&mut self) -> Result<ImageFile, CaptureError> {
        match self.mode {
            CaptureMode::Live => self.live.capture(),
            CaptureMode::Upload => self.upload.capture(),
        }
    }
}
