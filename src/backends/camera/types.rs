// SPDX-License-Identifier: GPL-3.0-only
// Shared types for capture session providers

//! Shared types for camera session providers

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Which way the active camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Rear camera (default)
    #[default]
    Back,
    /// User-facing camera
    Front,
}

impl CameraFacing {
    /// The opposite facing
    pub fn flipped(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Back => write!(f, "back"),
            CameraFacing::Front => write!(f, "front"),
        }
    }
}

/// Represents a camera device exposed by a provider
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub name: String,
    pub facing: CameraFacing,
    /// Native still resolution (width, height)
    pub resolution: (u32, u32),
}

/// A single RGBA frame from the camera
///
/// Pixel data is shared through an `Arc` so preview frames can be handed to
/// several consumers without copying.
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Facing of the camera that produced the frame
    pub facing: CameraFacing,
    /// When the frame was produced (for latency diagnostics)
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Bytes per RGBA pixel
    pub const BYTES_PER_PIXEL: u32 = 4;

    /// Build a frame from tightly packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>, facing: CameraFacing) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            stride: width * Self::BYTES_PER_PIXEL,
            facing,
            captured_at: Instant::now(),
        }
    }

    /// Whether the buffer is large enough for the declared geometry
    pub fn is_complete(&self) -> bool {
        let row_bytes = self.width as usize * Self::BYTES_PER_PIXEL as usize;
        let stride = self.stride as usize;
        if self.width == 0 || self.height == 0 || stride < row_bytes {
            return false;
        }
        let needed = stride * (self.height as usize - 1) + row_bytes;
        self.data.len() >= needed
    }

    /// Copy the frame into tightly packed RGBA rows, dropping stride padding
    ///
    /// Returns `None` when the buffer is shorter than the geometry requires.
    pub fn packed_rgba(&self) -> Option<Vec<u8>> {
        if !self.is_complete() {
            return None;
        }

        let row_bytes = self.width as usize * Self::BYTES_PER_PIXEL as usize;
        let stride = self.stride as usize;
        if stride == row_bytes {
            return Some(self.data[..row_bytes * self.height as usize].to_vec());
        }

        let mut packed = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * stride;
            packed.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Some(packed)
    }

    /// Read one pixel (RGBA) if it lies inside the frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        // Stride comes from the producer; keep the arithmetic out of u32
        let offset = (y as usize)
            .checked_mul(self.stride as usize)?
            .checked_add(x as usize * Self::BYTES_PER_PIXEL as usize)?;
        let px = self.data.get(offset..offset.checked_add(4)?)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .field("stride", &self.stride)
            .field("facing", &self.facing)
            .finish()
    }
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No camera hardware on this system
    NotAvailable(String),
    /// The user or platform refused camera access
    PermissionDenied,
    /// Camera device not found
    DeviceNotFound(String),
    /// Failed to bring up the session
    InitializationFailed(String),
    /// Operation needs a running session
    NotRunning,
    /// Still capture failed (sensor, encoding, malformed buffer)
    CaptureFailed(String),
    /// Camera is busy or in use
    Busy,
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Camera not available: {}", msg),
            BackendError::PermissionDenied => write!(f, "Camera access denied"),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::NotRunning => write!(f, "Camera session is not running"),
            BackendError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            BackendError::Busy => write!(f, "Camera is busy"),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
