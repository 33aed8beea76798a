//! The scroll canvas: composite several rendered images into one strip and
//! scroll it across the matrix.
//!
//! A board builds one `ScrollCanvas` per page, either drawing on it directly
//! (`set`) or handing it finished images (`add_canvas`), then calls `render`.
//! Two ways of compositing the added images:
//!
//! - **merge**: copy each image's non-blank columns into one flat strip,
//!   `padding` pixels apart. Playback then reads a single buffer.
//! - **no merge**: keep the images separate and map every column of a
//!   continuous virtual strip back to the image that owns it
//!   (see `nomerge.rs`).
//!
//! Playback itself lives in `playback.rs`.
//!
//! ## Rust concepts
//! - Boxed `FnOnce` closures as functional construction options
//! - `Arc<PixelBuffer>` so sub-canvases share the added images without copying
//! - `impl` blocks split across child modules that can see private fields

mod nomerge;
mod playback;

use super::blank::non_blank_columns;
use super::buffer::{PixelBuffer, Rect};
use super::speed::ScrollSpeed;
use super::{Canvas, match_scroll};
use crate::matrix::SharedMatrix;
use crate::{Color, Error, Result};
use async_trait::async_trait;
use nomerge::SubCanvasHorizontal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SCROLL_DELAY: Duration = Duration::from_millis(50);

/// Which way content travels across the panel.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    #[default]
    RightToLeft,
    LeftToRight,
    BottomToTop,
    TopToBottom,
}

impl ScrollDirection {
    pub fn is_horizontal(self) -> bool {
        matches!(self, ScrollDirection::RightToLeft | ScrollDirection::LeftToRight)
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScrollDirection::RightToLeft => "right to left",
            ScrollDirection::LeftToRight => "left to right",
            ScrollDirection::BottomToTop => "bottom to top",
            ScrollDirection::TopToBottom => "top to bottom",
        };
        f.write_str(name)
    }
}

/// Whether `merge` has already flattened the added images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Composition {
    Separate,
    Merged,
}

/// Configures a canvas at construction. Returning an error aborts `new`.
pub type ScrollCanvasOption = Box<dyn FnOnce(&mut ScrollCanvas) -> Result<()> + Send>;

pub struct ScrollCanvas {
    width: i32,
    height: i32,
    matrix: SharedMatrix,
    actual: PixelBuffer,
    pad: i32,
    padding_set: bool,
    actuals: Vec<Arc<PixelBuffer>>,
    direction: ScrollDirection,
    speed: ScrollSpeed,
    merge_pad: i32,
    composition: Composition,
    sub_canvases: Vec<SubCanvasHorizontal>,
    scroll_status: Option<mpsc::Sender<f64>>,
}

/// Padding used when nothing else asked for one: the width plus a quarter.
fn default_padding(width: i32) -> i32 {
    width + (width as f64 * 0.25) as i32
}

impl ScrollCanvas {
    pub fn new(matrix: SharedMatrix, opts: Vec<ScrollCanvasOption>) -> Result<Self> {
        let (width, height) = matrix.geometry();
        let mut c = Self {
            width,
            height,
            matrix,
            actual: PixelBuffer::new(Rect::default()),
            pad: 0,
            padding_set: false,
            actuals: Vec::new(),
            direction: ScrollDirection::RightToLeft,
            speed: ScrollSpeed::new(DEFAULT_SCROLL_DELAY),
            merge_pad: 0,
            composition: Composition::Separate,
            sub_canvases: Vec::new(),
            scroll_status: None,
        };

        for opt in opts {
            opt(&mut c)?;
        }

        if !c.padding_set {
            c.set_padding(default_padding(width));
        }

        Ok(c)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Change the logical width. Padding is recomputed from it.
    pub fn set_width(&mut self, width: i32) {
        self.width = width;
        self.set_padding(default_padding(width));
    }

    pub fn padding(&self) -> i32 {
        self.pad
    }

    /// Reallocate the backing buffer with `pad` pixels on every side, all black.
    pub fn set_padding(&mut self, pad: i32) {
        self.pad = pad;
        self.padding_set = true;
        self.actual = PixelBuffer::new(Rect::new(
            -pad,
            -pad,
            self.width + pad,
            self.height + pad,
        ));

        let b = self.actual.bounds();
        tracing::debug!(
            padding = pad,
            width = self.width,
            height = self.height,
            min_x = b.min.x,
            min_y = b.min.y,
            max_x = b.max.x,
            max_y = b.max.y,
            "creating scroll canvas"
        );
    }

    /// The backing buffer: padded drawing area, or the merged strip after `merge`.
    pub fn actual(&self) -> &PixelBuffer {
        &self.actual
    }

    pub fn matrix(&self) -> &SharedMatrix {
        &self.matrix
    }

    // ── Accumulating images ─────────────────────────────────────────

    /// Queue a copy of `img` to be scrolled after the ones already added.
    /// Ignored unless the direction is horizontal.
    pub fn add_canvas(&mut self, img: &PixelBuffer) {
        if !self.direction.is_horizontal() {
            return;
        }
        self.actuals.push(Arc::new(img.clone()));
    }

    /// Number of added images.
    pub fn len(&self) -> usize {
        self.actuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actuals.is_empty()
    }

    /// Add every image queued on `other` after ours.
    pub fn append(&mut self, other: &ScrollCanvas) {
        self.actuals.extend(other.actuals.iter().cloned());
    }

    pub fn is_merged(&self) -> bool {
        self.composition == Composition::Merged
    }

    /// Flatten the added images into one strip, `padding` columns between them.
    ///
    /// Only each image's non-blank columns are copied; the first lands at
    /// column 0 and every later one at the previous end plus `padding`.
    /// Rows keep their coordinates. Images with no content are skipped.
    /// Does nothing after the first call.
    pub fn merge(&mut self, padding: i32) {
        if self.composition == Composition::Merged {
            return;
        }
        let padding = padding.max(0);

        let spans: Vec<(&PixelBuffer, i32, i32)> = self
            .actuals
            .iter()
            .filter_map(|img| non_blank_columns(img).map(|(first, last)| (&**img, first, last)))
            .collect();

        let content: i32 = spans.iter().map(|(_, first, last)| last - first + 1).sum();
        let gaps = padding * (spans.len() as i32 - 1).max(0);
        let min_y = self.actuals.iter().map(|img| img.bounds().min.y).min().unwrap_or(0);
        let max_y = self.actuals.iter().map(|img| img.bounds().max.y).max().unwrap_or(0);

        let mut merged = PixelBuffer::new(Rect::new(0, min_y, content + gaps, max_y));
        tracing::debug!(
            width = merged.width(),
            height = merged.height(),
            images = spans.len(),
            "merging tight scroll canvas"
        );

        let mut cursor = 0;
        for (i, (img, first, last)) in spans.iter().enumerate() {
            if i > 0 {
                cursor += padding;
            }
            let b = img.bounds();
            for x in *first..=*last {
                for y in b.min.y..b.max.y {
                    merged.set(cursor + (x - first), y, img.at(x, y));
                }
            }
            cursor += last - first + 1;
        }

        self.actual = merged;
        self.composition = Composition::Merged;
    }

    // ── Speed and direction ─────────────────────────────────────────

    pub fn scroll_speed(&self) -> Duration {
        self.speed.get()
    }

    /// Takes effect on the next frame, even while playing.
    pub fn set_scroll_speed(&mut self, interval: Duration) {
        self.speed.set(interval);
    }

    /// Shared handle onto this canvas's speed.
    pub fn speed_handle(&self) -> ScrollSpeed {
        self.speed.clone()
    }

    /// Steer this canvas with an existing speed handle instead of its own.
    pub fn use_speed_handle(&mut self, speed: ScrollSpeed) {
        self.speed = speed;
    }

    pub fn scroll_direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn set_scroll_direction(&mut self, direction: ScrollDirection) {
        self.direction = direction;
    }

    pub fn merge_padding(&self) -> i32 {
        self.merge_pad
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Scroll the content across the matrix. Blocks until it has fully
    /// left the panel or `cancel` fires.
    ///
    /// Right to left plays the merged strip (or whatever was drawn with
    /// `set`) when there is one, and the separate added images otherwise.
    /// Bottom to top merges first. Other directions are refused.
    pub async fn render(&mut self, cancel: &CancellationToken) -> Result<()> {
        match self.direction {
            ScrollDirection::RightToLeft => {
                if self.is_merged() || self.actuals.is_empty() {
                    tracing::debug!("scrolling right to left");
                    self.right_to_left(cancel).await?;
                } else {
                    tracing::debug!("scrolling right to left without merge");
                    self.right_to_left_no_merge(cancel).await?;
                }
            }
            ScrollDirection::BottomToTop => {
                if !self.actuals.is_empty() {
                    self.merge(self.merge_pad);
                }
                tracing::debug!("scrolling bottom to top");
                self.bottom_to_top(cancel).await?;
            }
            other => return Err(Error::UnsupportedDirection(other)),
        }

        self.actual.fill(Color::BLACK);
        Ok(())
    }

    /// Scroll the added images without merging them.
    ///
    /// Sub-canvas ranges are inclusive, so the gap between two images is
    /// `pad + 1` blank columns wide, one more than `merge` leaves.
    pub async fn render_no_merge(&mut self, cancel: &CancellationToken, pad: i32) -> Result<()> {
        if self.direction != ScrollDirection::RightToLeft {
            return Err(Error::UnsupportedDirection(self.direction));
        }
        if pad < 0 {
            return Err(Error::InvalidOption(format!("merge padding {pad} is negative")));
        }
        self.merge_pad = pad;
        self.prepare_sub_canvases();
        self.right_to_left_no_merge(cancel).await?;

        self.actual.fill(Color::BLACK);
        Ok(())
    }

    /// Like `render`, reporting progress (0.0 to 1.0) on `status` without
    /// ever waiting for the receiver. `1.0` is sent when the scroll finishes.
    pub async fn render_with_status(
        &mut self,
        cancel: &CancellationToken,
        status: mpsc::Sender<f64>,
    ) -> Result<()> {
        self.scroll_status = Some(status);
        let result = self.render(cancel).await;
        self.scroll_status = None;
        result
    }

    /// Render while copying `base`'s speed onto this canvas.
    pub async fn render_following(
        &mut self,
        cancel: &CancellationToken,
        base: ScrollSpeed,
    ) -> Result<()> {
        let follow = cancel.child_token();
        let task = tokio::spawn(match_scroll(self.speed.clone(), base, follow.clone()));

        let result = self.render(cancel).await;

        follow.cancel();
        if let Err(e) = task.await {
            tracing::warn!("match scroll task failed: {}", e);
        }
        result
    }

    /// Copy `base`'s speed onto this canvas in the background until `cancel` fires.
    pub fn spawn_match_scroll(&self, base: &ScrollCanvas, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(match_scroll(self.speed.clone(), base.speed.clone(), cancel))
    }

    fn report_status(&self, done: f64) {
        if let Some(status) = &self.scroll_status {
            let _ = status.try_send(done.clamp(0.0, 1.0));
        }
    }
}

// ── Canvas ───────────────────────────────────────────────────────────

#[async_trait]
impl Canvas for ScrollCanvas {
    fn name(&self) -> &'static str {
        "RGB ScrollCanvas"
    }

    fn bounds(&self) -> Rect {
        self.actual.bounds()
    }

    fn at(&self, x: i32, y: i32) -> Color {
        self.actual.at(x, y)
    }

    fn set(&mut self, x: i32, y: i32, color: Color) {
        self.actual.set(x, y, color);
    }

    fn scrollable(&self) -> bool {
        true
    }

    /// Black out the backing buffer and the matrix.
    fn clear(&mut self) -> Result<()> {
        self.actual.fill(Color::BLACK);
        for y in 0..self.height {
            for x in 0..self.width {
                self.matrix.set(x, y, Color::BLACK);
            }
        }
        self.matrix.render()
    }

    fn close(&mut self) -> Result<()> {
        let _ = self.clear();
        self.matrix.close()
    }

    async fn render(&mut self, cancel: &CancellationToken) -> Result<()> {
        ScrollCanvas::render(self, cancel).await
    }

    fn as_scroll_canvas(&mut self) -> Option<&mut ScrollCanvas> {
        Some(self)
    }
}

// ── Options ──────────────────────────────────────────────────────────

pub fn with_scroll_speed(interval: Duration) -> ScrollCanvasOption {
    Box::new(move |c| {
        if interval.is_zero() {
            return Err(Error::InvalidOption("scroll speed must be above zero".to_string()));
        }
        c.speed.set(interval);
        Ok(())
    })
}

pub fn with_scroll_direction(direction: ScrollDirection) -> ScrollCanvasOption {
    Box::new(move |c| {
        c.set_scroll_direction(direction);
        Ok(())
    })
}

/// Columns left between images by `merge` and no-merge playback.
pub fn with_merge_padding(pad: i32) -> ScrollCanvasOption {
    Box::new(move |c| {
        if pad < 0 {
            return Err(Error::InvalidOption(format!("merge padding {pad} is negative")));
        }
        c.merge_pad = pad;
        Ok(())
    })
}

/// Explicit padding around the drawing area instead of the default.
pub fn with_padding(pad: i32) -> ScrollCanvasOption {
    Box::new(move |c| {
        if pad < 0 {
            return Err(Error::InvalidOption(format!("padding {pad} is negative")));
        }
        c.set_padding(pad);
        Ok(())
    })
}
