// SPDX-License-Identifier: GPL-3.0-only

//! Test-pattern rendering for the synthetic camera

use crate::backends::camera::{CameraFacing, CameraFrame};
use crate::drawing::{fill_circle, fill_rect, fill_vertical_gradient, image_with_size};
use image::Rgba;

/// Background gradient per camera so a flip is visible
fn palette(facing: CameraFacing) -> (Rgba<u8>, Rgba<u8>) {
    match facing {
        CameraFacing::Back => (Rgba([20, 40, 90, 255]), Rgba([30, 150, 140, 255])),
        CameraFacing::Front => (Rgba([200, 110, 40, 255]), Rgba([90, 30, 110, 255])),
    }
}

/// Live preview frame; a disc sweeps across the frame as `tick` advances
pub fn render_preview(width: u32, height: u32, facing: CameraFacing, tick: u64) -> CameraFrame {
    let (top, bottom) = palette(facing);
    let image = image_with_size(width, height, |canvas, size| {
        fill_vertical_gradient(canvas, top, bottom);

        let span = u64::from(size.width.max(1));
        let x = (tick * 8 % span) as i64;
        let radius = (size.height / 8).max(1);
        fill_circle(canvas, (x, i64::from(size.height / 2)), radius, Rgba([240, 240, 240, 255]));
    });

    CameraFrame::from_rgba(width, height, image.into_raw(), facing)
}

/// Still frame: preview pattern with a frame border marking it as a capture
pub fn render_still(width: u32, height: u32, facing: CameraFacing, sequence: u64) -> CameraFrame {
    let (top, bottom) = palette(facing);
    let image = image_with_size(width, height, |canvas, size| {
        fill_vertical_gradient(canvas, top, bottom);

        let border = (size.width.min(size.height) / 40).max(1);
        let white = Rgba([255, 255, 255, 255]);
        fill_rect(canvas, 0, 0, size.width, border, white);
        fill_rect(canvas, 0, i64::from(size.height - border), size.width, border, white);
        fill_rect(canvas, 0, 0, border, size.height, white);
        fill_rect(canvas, i64::from(size.width - border), 0, border, size.height, white);

        // One marker per capture so consecutive stills differ
        let marker = (size.height / 12).max(1);
        let count = (sequence % 8) as i64 + 1;
        for i in 0..count {
            let x = i64::from(border) * 2 + i * i64::from(marker) * 2;
            fill_rect(canvas, x, i64::from(border) * 2, marker, marker, white);
        }
    });

    CameraFrame::from_rgba(width, height, image.into_raw(), facing)
}
