// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based capture picker
//!
//! Hosts a [`CapturePickerWorkflow`] on the synthetic camera and renders the
//! preview (or the image awaiting confirmation) with Unicode half-block
//! characters.

use crate::backends::camera::{CameraFacing, CameraFrame, FrameReceiver};
use crate::backends::virtual_camera::{VirtualCameraConfig, VirtualCameraProvider};
use crate::config::Config;
use crate::constants::ui;
use crate::controls::{ActionSource, ForwardingControl, VolumeButton};
use crate::errors::PickerError;
use crate::layout::{self, ViewId};
use crate::picker::{
    CaptureResult, CapturePickerWorkflow, PickerDelegate, PickerEventSender, PickerId, PickerState,
};
use crate::preview::{PreviewSurface, present_latest};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

const ROOT_VIEW: ViewId = 1;
const PREVIEW_VIEW: ViewId = 2;

/// Command-line overrides for the interactive picker
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalOptions {
    pub no_editing: bool,
    pub no_volume_button: bool,
    pub no_front_camera: bool,
    pub auto_retake: bool,
    pub front: bool,
    /// Simulate refused camera access
    pub deny_camera: bool,
}

impl TerminalOptions {
    /// Apply the overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if self.no_editing {
            config.flags.editing_enabled = false;
        }
        if self.no_volume_button {
            config.flags.volume_button_takes_picture = false;
        }
        if self.no_front_camera {
            config.flags.front_camera_enabled = false;
        }
        if self.auto_retake {
            config.flags.auto_retake_enabled = true;
        }
        if self.front {
            config.initial_facing = CameraFacing::Front;
        }
    }
}

/// Run the terminal capture picker
pub fn run(options: TerminalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    options.apply(&mut config);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &config, options.deny_camera);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let outcome = result?;
    println!("{}", outcome);
    Ok(())
}

/// What the delegate has heard so far
#[derive(Default)]
struct TerminalDelegate {
    outcome: Mutex<Option<String>>,
    last_capture: Mutex<Option<String>>,
}

impl TerminalDelegate {
    fn outcome(&self) -> Option<String> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn last_capture(&self) -> Option<String> {
        self.last_capture.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl PickerDelegate for TerminalDelegate {
    fn did_capture_image(&self, _picker: PickerId, picture: &CaptureResult) {
        let (width, height) = picture.dimensions();
        *self.last_capture.lock().unwrap_or_else(PoisonError::into_inner) = Some(format!(
            "Captured {}x{} at {}",
            width,
            height,
            picture.captured_at().format("%H:%M:%S")
        ));
    }

    fn did_confirm_image(&self, picker: PickerId, picture: CaptureResult) {
        let (width, height) = picture.dimensions();
        info!(%picker, width, height, "Image confirmed");
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some(format!(
            "Confirmed {}x{} image from the {} camera",
            width,
            height,
            picture.facing()
        ));
    }

    fn picker_did_cancel(&self, picker: PickerId) {
        info!(%picker, "Picker cancelled");
        *self.outcome.lock().unwrap_or_else(PoisonError::into_inner) = Some("Cancelled".to_string());
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    deny_camera: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut camera = VirtualCameraProvider::new(VirtualCameraConfig::from_config(config));
    camera.deny_session_start(deny_camera);

    let delegate = Arc::new(TerminalDelegate::default());
    let mut picker = CapturePickerWorkflow::new(camera, config.flags)
        .with_initial_facing(config.initial_facing)
        .with_delegate(&delegate);
    picker
        .capture_button_mut()
        .set_label(ui::CAPTURE_BUTTON_LABEL);

    // The space bar drives the on-screen button through a forwarding proxy
    let shutter = ForwardingControl::new(picker.capture_button().control());
    let volume = VolumeButton::new();
    let volume_subscription = picker.attach_volume_button(&volume);
    let sender = picker.event_sender();

    let mut status = match picker.activate() {
        Ok(()) => None,
        Err(e) => {
            error!(error = %e, "Could not start capture picker");
            Some(format!("{} (press q to quit)", e))
        }
    };
    let mut receiver: Option<FrameReceiver> = picker.preview_receiver();
    let mut frame_widget = FrameWidget::new();
    let mut review: Option<(u64, CameraFrame)> = None;

    loop {
        match picker.pump() {
            Ok(_) => {}
            Err(PickerError::Capture(e)) => {
                warn!(error = %e, "Capture failed");
                status = Some(format!("Capture failed: {}", e));
            }
            Err(e) => {
                error!(error = %e, "Picker stopped");
                status = Some(format!("{} (press q to quit)", e));
            }
        }

        if receiver.is_none() && picker.is_active() {
            receiver = picker.preview_receiver();
        }
        if let Some(rx) = receiver.as_mut() {
            present_latest(rx, &mut frame_widget);
        }

        review = match (picker.pending_image(), review.take()) {
            (Some(pending), Some((request, frame))) if pending.request() == request => {
                Some((request, frame))
            }
            (Some(pending), _) => Some((pending.request(), review_frame(pending))),
            (None, _) => None,
        };

        if let Some(capture) = delegate.last_capture()
            && picker.state() == PickerState::Confirming
        {
            status = Some(capture);
        }

        let bar = ControlBar {
            state: picker.state(),
            facing: picker.facing(),
            button_label: picker.capture_button().label(),
            button_enabled: picker.capture_button().is_enabled(),
            volume_enabled: picker.flags().volume_button_takes_picture,
            flip_enabled: picker.flags().front_camera_enabled,
            message: delegate.outcome().or_else(|| status.clone()),
        };

        terminal.draw(|f| {
            let area = f.area();
            let container = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(ui::CONTROL_BAR_HEIGHT),
            };
            let preview_area = matched_area(container);

            match &review {
                Some((_, frame)) => f.render_widget(&FrameWidget::showing(frame.clone()), preview_area),
                None => f.render_widget(&frame_widget, preview_area),
            }

            let bar_area = Rect {
                x: area.x,
                y: area.y + container.height,
                width: area.width,
                height: area.height - container.height,
            };
            f.render_widget(&bar, bar_area);
        })?;

        if !event::poll(ui::INPUT_POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        if picker.is_finished() {
            break;
        }
        if !picker.is_active() {
            if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                sender.cancel();
                let _ = picker.pump();
                break;
            }
            continue;
        }

        if ctrl_c {
            sender.cancel();
            let _ = picker.pump();
            break;
        }
        handle_key(key.code, &shutter, &volume, &sender);
    }

    volume.unsubscribe(volume_subscription);
    Ok(delegate
        .outcome()
        .unwrap_or_else(|| "Picker closed without a result".to_string()))
}

/// Map a key press to picker input
fn handle_key(code: KeyCode, shutter: &ForwardingControl, volume: &VolumeButton, sender: &PickerEventSender) {
    match code {
        KeyCode::Char(' ') => {
            shutter.tap();
        }
        KeyCode::Char('v') => {
            volume.press();
        }
        KeyCode::Char('f') => {
            sender.toggle_camera();
        }
        KeyCode::Enter | KeyCode::Char('y') => {
            sender.confirm();
        }
        KeyCode::Char('r') => {
            sender.retake();
        }
        KeyCode::Esc | KeyCode::Char('q') => {
            sender.cancel();
        }
        _ => {}
    }
}

/// Area of the preview view, pinned edge-to-edge to its container
fn matched_area(container: Rect) -> Rect {
    let constraints = layout::constraints_to_match(PREVIEW_VIEW, ROOT_VIEW);
    let frame = layout::Rect::new(
        f32::from(container.x),
        f32::from(container.y),
        f32::from(container.width),
        f32::from(container.height),
    );

    match layout::resolve(&constraints, PREVIEW_VIEW, ROOT_VIEW, frame) {
        Some(resolved) => Rect {
            x: resolved.x as u16,
            y: resolved.y as u16,
            width: resolved.width as u16,
            height: resolved.height as u16,
        },
        None => container,
    }
}

/// Frame for showing a captured image while it awaits confirmation
fn review_frame(pending: &CaptureResult) -> CameraFrame {
    let (width, height) = pending.dimensions();
    CameraFrame::from_rgba(width, height, pending.image().as_raw().clone(), pending.facing())
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<CameraFrame>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { frame: None }
    }

    fn showing(frame: CameraFrame) -> Self {
        Self { frame: Some(frame) }
    }
}

impl PreviewSurface for FrameWidget {
    fn present(&mut self, frame: &CameraFrame) {
        self.frame = Some(frame.clone());
    }

    fn clear(&mut self) {
        self.frame = None;
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.as_ref().filter(|f| f.is_complete()) else {
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Each terminal cell shows two vertical pixels
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let w = term_height * frame_aspect;
            (w as u16, area.height)
        } else {
            let h = term_width / frame_aspect;
            (area.width, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;
        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let x = x.min(frame.width.saturating_sub(1));
    let y = y.min(frame.height.saturating_sub(1));
    match frame.pixel(x, y) {
        Some([r, g, b, _]) => Color::Rgb(r, g, b),
        None => Color::Black,
    }
}

/// Bottom bar: capture button, picker state and key hints
struct ControlBar<'a> {
    state: PickerState,
    facing: CameraFacing,
    button_label: &'a str,
    button_enabled: bool,
    volume_enabled: bool,
    flip_enabled: bool,
    message: Option<String>,
}

impl ControlBar<'_> {
    fn hints(&self) -> String {
        match self.state {
            PickerState::Previewing => {
                let mut msg = "space capture".to_string();
                if self.volume_enabled {
                    msg.push_str(" | v volume");
                }
                if self.flip_enabled {
                    msg.push_str(" | f flip");
                }
                msg.push_str(" | q cancel");
                msg
            }
            PickerState::Capturing => "Capturing... | q cancel".to_string(),
            PickerState::Confirming => "enter/y use photo | r retake | q cancel".to_string(),
            PickerState::Confirmed | PickerState::Cancelled => "press any key to exit".to_string(),
        }
    }
}

impl Widget for &ControlBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let background = Style::default().fg(Color::White).bg(Color::DarkGray);
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(' ');
                    cell.set_style(background);
                }
            }
        }
        if area.height == 0 {
            return;
        }

        let button = format!("[ {} ]", self.button_label);
        let button_style = if self.button_enabled {
            background.fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            background.fg(Color::Gray)
        };
        let button_x = area.x + area.width.saturating_sub(button.len() as u16) / 2;
        buf.set_stringn(button_x, area.y, &button, area.width as usize, button_style);

        let mut lines = vec![format!("{} | {} camera", self.state, self.facing), self.hints()];
        if let Some(message) = &self.message {
            lines[0] = format!("{} | {}", lines[0], message);
        }
        for (row, line) in lines.iter().enumerate() {
            let y = area.y + 1 + row as u16;
            if y >= area.y + area.height {
                break;
            }
            buf.set_stringn(area.x + 1, y, line, area.width.saturating_sub(1) as usize, background);
        }
    }
}
