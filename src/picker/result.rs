// SPDX-License-Identifier: GPL-3.0-only

//! Captured still image with metadata

use crate::backends::camera::{
    BackendError, BackendResult, CameraFacing, CameraFrame, CaptureRequestId,
};
use chrono::{DateTime, Local};
use image::RgbaImage;
use serde::Serialize;

/// A captured still
///
/// Not `Clone`: the workflow owns it until it is handed to the delegate on
/// confirmation, after which the host owns it.
pub struct CaptureResult {
    image: RgbaImage,
    captured_at: DateTime<Local>,
    facing: CameraFacing,
    request: CaptureRequestId,
}

/// Serializable description of a capture (no pixels)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureMetadata {
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Local>,
    pub facing: CameraFacing,
    pub request: CaptureRequestId,
}

impl CaptureResult {
    /// Build from a provider frame, stamping the current local time
    ///
    /// Fails with [`BackendError::CaptureFailed`] when the frame buffer does
    /// not hold the pixels its geometry promises.
    pub fn from_frame(request: CaptureRequestId, frame: CameraFrame) -> BackendResult<Self> {
        let facing = frame.facing;
        let (width, height) = (frame.width, frame.height);

        let image = frame
            .packed_rgba()
            .and_then(|pixels| RgbaImage::from_raw(width, height, pixels))
            .ok_or_else(|| {
                BackendError::CaptureFailed(format!(
                    "frame buffer of {} bytes does not hold {}x{} RGBA",
                    frame.data.len(),
                    width,
                    height
                ))
            })?;

        Ok(Self {
            image,
            captured_at: Local::now(),
            facing,
            request,
        })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Take the pixels, dropping the metadata
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    /// Capture request this image answers
    pub fn request(&self) -> CaptureRequestId {
        self.request
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn metadata(&self) -> CaptureMetadata {
        let (width, height) = self.image.dimensions();
        CaptureMetadata {
            width,
            height,
            captured_at: self.captured_at,
            facing: self.facing,
            request: self.request,
        }
    }
}

impl std::fmt::Debug for CaptureResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.image.dimensions();
        f.debug_struct("CaptureResult")
            .field("request", &self.request)
            .field("size", &format_args!("{}x{}", width, height))
            .field("facing", &self.facing)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
