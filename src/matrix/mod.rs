//! The matrix driver capability.
//!
//! A `Matrix` is anything with a pixel grid: the real panel behind
//! `rpi-led-matrix`, or the ASCII [`ConsoleMatrix`] used for development
//! and tests. Besides per-pixel `set` + `render`, drivers offer a two-step
//! playback protocol:
//!
//! 1. `preload(scene)` queues a fully computed frame, keyed by its index.
//! 2. `play(...)` walks the queue in index order, waiting one interval
//!    between frames. The interval can be changed mid-playback through a
//!    `watch` channel without recomputing any frame.
//!
//! ## Rust concepts
//! - `#[async_trait]` for an object-safe trait with an `async fn`
//! - `Arc<dyn Trait>` for a driver shared by several canvases
//! - `tokio::select!` with `biased;` so cancellation wins over a ready timer

pub mod console;
#[cfg(feature = "hardware")]
pub mod hardware;
#[cfg(test)]
pub(crate) mod testing;

pub use console::ConsoleMatrix;
#[cfg(feature = "hardware")]
pub use hardware::HardwareMatrix;

use crate::{Color, Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Receiving end of a scroll speed channel. Drivers check it once per frame.
pub type IntervalUpdates = watch::Receiver<Duration>;

/// A driver shared between the canvases that take turns drawing on it.
pub type SharedMatrix = Arc<dyn Matrix>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatrixPoint {
    pub x: i32,
    pub y: i32,
    pub color: Color,
}

/// One full frame, ready to be queued with [`Matrix::preload`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatrixScene {
    pub points: Vec<MatrixPoint>,
    /// Position of this scene in the playback order.
    pub index: usize,
}

/// Any RGB matrix. Methods take `&self`; implementations keep their own locks.
#[async_trait]
pub trait Matrix: Send + Sync {
    fn geometry(&self) -> (i32, i32);
    fn at(&self, x: i32, y: i32) -> Color;
    fn set(&self, x: i32, y: i32, color: Color);
    fn render(&self) -> Result<()>;
    fn close(&self) -> Result<()>;
    /// Brightness in percent (0-100).
    fn set_brightness(&self, brightness: u8);
    fn preload(&self, scene: MatrixScene);
    /// Play every preloaded scene in index order, then forget them.
    async fn play(
        &self,
        cancel: &CancellationToken,
        start_interval: Duration,
        updates: Option<&mut IntervalUpdates>,
    ) -> Result<()>;
}

/// Row-major index of `(x, y)`, or `None` when it falls off the grid.
pub(crate) fn position(x: i32, y: i32, width: i32, height: i32) -> Option<usize> {
    if x < 0 || y < 0 || x >= width || y >= height {
        return None;
    }
    Some((x + y * width) as usize)
}

// ── Scene queue ──────────────────────────────────────────────────────

/// Frames waiting for `play`, stored by scene index.
#[derive(Debug, Default)]
pub(crate) struct SceneQueue {
    frames: Vec<Option<Vec<Color>>>,
}

impl SceneQueue {
    /// Rasterize a scene into a full frame and store it at `scene.index`.
    /// Points outside the grid are dropped.
    pub(crate) fn insert(&mut self, scene: &MatrixScene, width: i32, height: i32) {
        let mut frame = vec![Color::BLACK; (width.max(0) * height.max(0)) as usize];
        for pt in &scene.points {
            if let Some(pos) = position(pt.x, pt.y, width, height) {
                frame[pos] = pt.color;
            }
        }

        if self.frames.len() < scene.index + 1 {
            self.frames.resize(scene.index + 1, None);
        }
        self.frames[scene.index] = Some(frame);
    }

    /// Drain the queue in index order, skipping indices never filled.
    pub(crate) fn take(&mut self) -> Vec<Vec<Color>> {
        std::mem::take(&mut self.frames).into_iter().flatten().collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.frames.iter().flatten().count()
    }
}

// ── Playback ─────────────────────────────────────────────────────────

/// Timing loop shared by every driver's `play`.
///
/// Before each frame: bail out if canceled, pick up the newest interval if
/// one was sent, then wait. Cancellation is checked first in the `select!`
/// so a canceled scroll never draws one more frame. A new interval applies
/// to the next frame still waiting, never to one already drawn.
pub(crate) async fn play_frames<F>(
    frames: Vec<Vec<Color>>,
    cancel: &CancellationToken,
    start_interval: Duration,
    mut updates: Option<&mut IntervalUpdates>,
    mut draw: F,
) -> Result<()>
where
    F: FnMut(&[Color]) -> Result<()> + Send,
{
    let mut wait = start_interval;
    tracing::info!("Play matrix: {} frames, interval {:?}", frames.len(), wait);

    for leds in frames {
        if cancel.is_cancelled() {
            return Err(Error::Canceled);
        }

        if let Some(rx) = updates.as_deref_mut() {
            if rx.has_changed().unwrap_or(false) {
                wait = *rx.borrow_and_update();
                tracing::info!("Matrix got new interval during play: {:?}", wait);
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Canceled),
            _ = tokio::time::sleep(wait) => {}
        }

        draw(&leds)?;
    }

    Ok(())
}
