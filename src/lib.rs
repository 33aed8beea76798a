//! Scroll-canvas compositing and playback for RGB LED matrix panels.
//!
//! Boards render their content into one or more images, hand them to a
//! [`canvas::ScrollCanvas`], and the canvas composites them into a single
//! continuous strip that is played back on a [`matrix::Matrix`] one column
//! (or row) at a time.
//!
//! This module holds the small shared pieces:
//! - Panel configuration
//! - The `Color` type used by every canvas and driver
//! - Signal handling for clean shutdown
//!
//! It also re-exports the canvas, matrix, render, media and server modules
//! used by the main binary.

pub mod canvas;
pub mod error;
pub mod matrix;
pub mod media;
pub mod render;
pub mod server;

pub use error::{Error, Result};

use tokio_util::sync::CancellationToken;

// ── Panel ──────────────────────────────────────────────────────────

/// Physical size of the LED panel, as passed on the command line.
///
/// # Rust concept: `Copy` value types
/// Two `u32`s are cheaper to copy than to borrow, so the panel is passed
/// around by value everywhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    pub rows: u32,
    pub cols: u32,
}

impl PanelConfig {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// LEDs on the panel, i.e. the length of a full frame.
    pub fn pixel_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// `(width, height)` in the signed coordinates canvases use.
    pub fn geometry(&self) -> (i32, i32) {
        (self.cols as i32, self.rows as i32)
    }
}

impl Default for PanelConfig {
    /// The common 64x32 HUB75 panel.
    fn default() -> Self {
        Self::new(32, 64)
    }
}

// ── Color ──────────────────────────────────────────────────────────

/// RGB value shared by canvases, pixel buffers and matrix drivers.
///
/// Drivers convert to their own pixel type at the edge (`image::Rgb` for
/// buffers, `LedColor` for the panel).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Background color. Anything outside a buffer reads as this.
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A pixel is blank when all three channels are exactly zero.
    pub fn is_blank(self) -> bool {
        self == Self::BLACK
    }

    /// Fully saturated color for `hue` degrees on the color wheel.
    ///
    /// The wheel is split into six 60° sextants. In each one a single
    /// channel ramps while the other two sit at 0 or 255.
    pub fn from_hue(hue: u16) -> Self {
        let hue = u32::from(hue % 360);
        let up = (hue % 60 * 255 / 60) as u8;
        let down = 255 - up;

        match hue / 60 {
            0 => Self::new(255, up, 0),
            1 => Self::new(down, 255, 0),
            2 => Self::new(0, 255, up),
            3 => Self::new(0, down, 255),
            4 => Self::new(up, 0, 255),
            _ => Self::new(255, 0, down),
        }
    }

    /// Scale every channel by `brightness` percent. 100 and above is a no-op.
    pub fn apply_brightness(self, brightness: u8) -> Self {
        if brightness >= 100 {
            return self;
        }
        let scale = |c: u8| (u16::from(c) * u16::from(brightness) / 100) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl From<image::Rgb<u8>> for Color {
    fn from(px: image::Rgb<u8>) -> Self {
        let [r, g, b] = px.0;
        Self::new(r, g, b)
    }
}

impl From<Color> for image::Rgb<u8> {
    fn from(c: Color) -> Self {
        image::Rgb([c.r, c.g, c.b])
    }
}

#[cfg(feature = "hardware")]
impl From<Color> for rpi_led_matrix::LedColor {
    fn from(c: Color) -> Self {
        Self {
            red: c.r,
            green: c.g,
            blue: c.b,
        }
    }
}

// ── Shutdown ───────────────────────────────────────────────────────

/// Install a Ctrl+C handler that cancels the returned token.
///
/// # Rust concept: cloning a handle
/// `CancellationToken` is a cheap handle onto shared state. The clone moved
/// into the signal handler and the one we return observe the same flag, so
/// every scroll loop holding a child token stops within one frame.
pub fn setup_signal_handler() -> std::result::Result<CancellationToken, ctrlc::Error> {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    ctrlc::set_handler(move || on_signal.cancel())?;
    Ok(token)
}
