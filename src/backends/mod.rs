// SPDX-License-Identifier: GPL-3.0-only

//! Camera session providers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            CapturePickerWorkflow            │
//! └────────────────────┬────────────────────────┘
//!                      │ CaptureSessionProvider
//! ┌────────────────────┴────────────────────────┐
//! │  ┌──────────────────┐                       │
//! │  │  Virtual camera  │   (other providers)   │
//! │  └──────────────────┘                       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! - [`camera`]: provider trait, frames and backend errors
//! - [`virtual_camera`]: synthetic provider producing a test pattern

pub mod camera;
pub mod virtual_camera;
