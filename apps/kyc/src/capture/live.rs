//! Live camera capture: open a video device, preview, grab one still frame.
//!
//! The device handle is owned by a [`StreamGuard`], so it is released on every
//! path out of a capture attempt: cancel, successful capture, failed frame grab,
//! retake and drop.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use serde::Serialize;

use crate::config::Settings;
use crate::error::CaptureError;
use crate::types::ImageFile;

/// File name given to captured selfies.
pub const SELFIE_FILE_NAME: &str = "selfie.jpg";

/// Which camera to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front-facing.
    User,
    /// Rear-facing.
    Environment,
}

/// Preferences passed to the device when opening a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
    pub jpeg_quality: u8,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            facing: FacingMode::User,
            jpeg_quality: 90,
        }
    }
}

impl CaptureConstraints {
    pub fn from_settings(settings: &Settings) -> Self {
        let (width, height) = settings.capture_resolution();
        Self {
            width,
            height,
            facing: FacingMode::User,
            jpeg_quality: settings.capture_jpeg_quality(),
        }
    }
}

/// A camera that can be opened for exclusive use.
pub trait CameraDevice: Send {
    type Stream: VideoStream;

    /// Request access. Denied access must be reported as
    /// [`CaptureError::PermissionDenied`].
    fn open(&mut self, constraints: &CaptureConstraints) -> Result<Self::Stream, CaptureError>;
}

/// An open video stream.
pub trait VideoStream: Send {
    /// The frame currently shown in the preview.
    fn current_frame(&mut self) -> Result<RgbImage, CaptureError>;

    /// Stop every track and give the device back. Must tolerate repeated calls.
    fn stop(&mut self);
}

/// Stops the wrapped stream when dropped.
struct StreamGuard<S: VideoStream> {
    stream: S,
}

impl<S: VideoStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        self.stream.stop();
        tracing::debug!("Camera stream released");
    }
}

/// Where a live capture attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveCaptureState {
    NotRequested,
    PermissionDenied,
    Previewing,
    Captured,
}

/// Live camera variant of the selfie source.
pub struct LiveCapture<D: CameraDevice> {
    device: D,
    constraints: CaptureConstraints,
    stream: Option<StreamGuard<D::Stream>>,
    captured: Option<ImageFile>,
    state: LiveCaptureState,
}

impl<D: CameraDevice> LiveCapture<D> {
    pub fn new(device: D, constraints: CaptureConstraints) -> Self {
        Self {
            device,
            constraints,
            stream: None,
            captured: None,
            state: LiveCaptureState::NotRequested,
        }
    }

    pub fn state(&self) -> LiveCaptureState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn captured(&self) -> Option<&ImageFile> {
        self.captured.as_ref()
    }

    pub fn constraints(&self) -> &CaptureConstraints {
        &self.constraints
    }

    /// Request the camera and start previewing.
    ///
    /// Any stream or still from an earlier attempt is discarded first.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        self.stream = None;
        self.captured = None;

        match self.device.open(&self.constraints) {
            Ok(stream) => {
                self.stream = Some(StreamGuard { stream });
                self.state = LiveCaptureState::Previewing;
                tracing::debug!(
                    width = self.constraints.width,
                    height = self.constraints.height,
                    "Camera stream started"
                );
                Ok(())
            }
            Err(CaptureError::PermissionDenied) => {
                self.state = LiveCaptureState::PermissionDenied;
                tracing::info!("Camera access denied");
                Err(CaptureError::PermissionDenied)
            }
            Err(e) => {
                self.state = LiveCaptureState::NotRequested;
                tracing::warn!(error = %e, "Could not open camera");
                Err(e)
            }
        }
    }

    /// Frame for the live preview.
    pub fn preview_frame(&mut self) -> Result<RgbImage, CaptureError> {
        let guard = self.stream.as_mut().ok_or(CaptureError::NotStreaming)?;
        guard.stream.current_frame()
    }

    /// Grab exactly one frame, encode it as JPEG and release the device.
    ///
    /// Once a still is held, it is returned again until a retake or cancel.
    pub fn capture(&mut self) -> Result<ImageFile, CaptureError> {
        if let Some(image) = &self.captured {
            return Ok(image.clone());
        }

        let mut guard = self.stream.take().ok_or(CaptureError::NotStreaming)?;
        let frame = guard.stream.current_frame();
        drop(guard);

        let frame = frame.inspect_err(|_| self.state = LiveCaptureState::NotRequested)?;
        let image = encode_frame(frame, self.constraints.jpeg_quality)
            .inspect_err(|_| self.state = LiveCaptureState::NotRequested)?;

        tracing::info!(bytes = image.size(), "Selfie captured");
        self.captured = Some(image.clone());
        self.state = LiveCaptureState::Captured;
        Ok(image)
    }

    /// Throw away the captured still and preview again.
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        self.start()
    }

    /// Abandon the attempt and release the device.
    pub fn cancel(&mut self) {
        self.stream = None;
        self.captured = None;
        self.state = LiveCaptureState::NotRequested;
    }
}

fn encode_frame(frame: RgbImage, quality: u8) -> Result<ImageFile, CaptureError> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(frame)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))?;
    Ok(ImageFile::new(SELFIE_FILE_NAME, "image/jpeg", buffer))
}
