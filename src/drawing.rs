// SPDX-License-Identifier: GPL-3.0-only

//! Drawing convenience for building RGBA images with a closure
//!
//! ```ignore
//! let dot = image_with_size(16, 16, |canvas, size| {
//!     fill_circle(canvas, size.center(), 6, WHITE);
//! });
//! ```

use image::{Rgba, RgbaImage};

/// Canvas dimensions handed to a draw closure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Center point (rounded down)
    pub fn center(&self) -> (i64, i64) {
        (i64::from(self.width / 2), i64::from(self.height / 2))
    }
}

/// Allocate a transparent canvas of `width` x `height` and let `draw` paint it
pub fn image_with_size<F>(width: u32, height: u32, draw: F) -> RgbaImage
where
    F: FnOnce(&mut RgbaImage, Size),
{
    let mut canvas = RgbaImage::new(width, height);
    draw(&mut canvas, Size::new(width, height));
    canvas
}

/// Fill an axis-aligned rectangle, clipped to the canvas
pub fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    let x0 = x.clamp(0, cw);
    let y0 = y.clamp(0, ch);
    let x1 = (x + i64::from(w)).clamp(0, cw);
    let y1 = (y + i64::from(h)).clamp(0, ch);

    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// Fill a disc, clipped to the canvas
pub fn fill_circle(canvas: &mut RgbaImage, center: (i64, i64), radius: u32, color: Rgba<u8>) {
    let r = i64::from(radius);
    let (cx, cy) = center;
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));

    for py in (cy - r).max(0)..(cy + r + 1).min(ch) {
        for px in (cx - r).max(0)..(cx + r + 1).min(cw) {
            let (dx, dy) = (px - cx, py - cy);
            if dx * dx + dy * dy <= r * r {
                canvas.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Vertical gradient between two colors
pub fn fill_vertical_gradient(canvas: &mut RgbaImage, top: Rgba<u8>, bottom: Rgba<u8>) {
    let height = canvas.height().max(1);
    for y in 0..canvas.height() {
        let t = y as f32 / (height.saturating_sub(1).max(1)) as f32;
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        let color = Rgba([
            mix(top[0], bottom[0]),
            mix(top[1], bottom[1]),
            mix(top[2], bottom[2]),
            mix(top[3], bottom[3]),
        ]);
        for x in 0..canvas.width() {
            canvas.put_pixel(x, y, color);
        }
    }
}
