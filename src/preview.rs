// SPDX-License-Identifier: GPL-3.0-only

//! Preview surface abstraction

use crate::backends::camera::{CameraFrame, FrameReceiver};

/// Something that can show the live camera feed
pub trait PreviewSurface {
    /// Show a new frame
    fn present(&mut self, frame: &CameraFrame);

    /// Drop whatever is currently shown
    fn clear(&mut self);
}

/// Feed every frame waiting on `receiver` to `surface`, showing only the newest
///
/// Returns how many frames were drained. Older frames are skipped so a slow
/// surface never falls behind the camera.
pub fn present_latest(receiver: &mut FrameReceiver, surface: &mut dyn PreviewSurface) -> usize {
    let mut drained = 0;
    let mut latest = None;
    while let Ok(frame) = receiver.try_recv() {
        latest = Some(frame);
        drained += 1;
    }
    if let Some(frame) = latest {
        surface.present(&frame);
    }
    drained
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::CameraFacing;

    #[derive(Default)]
    struct RecordingSurface {
        shown: Vec<u32>,
    }

    impl PreviewSurface for RecordingSurface {
        fn present(&mut self, frame: &CameraFrame) {
            self.shown.push(frame.width);
        }

        fn clear(&mut self) {
            self.shown.clear();
        }
    }

    #[test]
    fn test_only_newest_frame_is_presented() {
        let (mut tx, mut rx) = futures::channel::mpsc::channel(8);
        for width in 1..=3 {
            tx.try_send(CameraFrame::from_rgba(width, 1, vec![0; width as usize * 4], CameraFacing::Back))
                .unwrap();
        }

        let mut surface = RecordingSurface::default();
        assert_eq!(present_latest(&mut rx, &mut surface), 3);
        assert_eq!(surface.shown, vec![3]);

        assert_eq!(present_latest(&mut rx, &mut surface), 0);
        assert_eq!(surface.shown, vec![3]);
    }
}
