//! Scroll algorithms.
//!
//! Horizontal scrolls compute every frame up front, queue them on the
//! matrix with `preload` and let the driver `play` them on a timer, so a
//! speed change applies without recomputing anything. Vertical scrolls
//! draw each step directly with `set` + `render`.
//!
//! A "shift" is how far the content's origin sits from the panel's origin:
//! the pixel shown at matrix `(x, y)` is the content pixel at
//! `(x - shift, y)` (or `(x, y - shift)` vertically). Every scroll starts
//! with the content just past one edge of the panel and stops once it has
//! fully left through the other.

use super::ScrollCanvas;
use crate::canvas::blank::{
    first_non_blank_x, first_non_blank_y, last_non_blank_x, last_non_blank_y,
};
use crate::matrix::{MatrixPoint, MatrixScene};
use crate::{Color, Error, Result};
use tokio_util::sync::CancellationToken;

/// Number of progress reports over a full scroll.
const STATUS_STEPS: usize = 10;

impl ScrollCanvas {
    // ── Horizontal ──────────────────────────────────────────────────

    /// Scroll the backing buffer from the right edge out through the left.
    pub(super) async fn right_to_left(&mut self, cancel: &CancellationToken) -> Result<()> {
        let start = self.width - first_non_blank_x(&self.actual);
        let finish = -(last_non_blank_x(&self.actual) + 1);

        tracing::debug!(
            start_x = start,
            finish_x = finish,
            delay = ?self.speed.get(),
            "scrolling right to left"
        );

        let mut frames = Vec::with_capacity((start - finish).max(0) as usize);
        let mut shift = start;
        while shift > finish {
            if cancel.is_cancelled() {
                return Err(Error::Canceled);
            }
            frames.push(self.frame(|x, y| self.actual.at(x - shift, y)));
            shift -= 1;
        }

        self.play(cancel, frames).await
    }

    /// Scroll the added images across the panel through the virtual strip,
    /// leaving them unmerged.
    pub(super) async fn right_to_left_no_merge(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.prepare_sub_canvases();

        let (Some(first), Some(last)) = (self.sub_canvases.first(), self.sub_canvases.last()) else {
            return Err(Error::NoSubCanvases);
        };
        let (start, finish) = (first.virtual_start_x, last.virtual_end_x);

        tracing::debug!(
            virtual_start_x = start,
            finish = finish,
            "performing right to left scroll without canvas merge"
        );

        let mut frames = Vec::with_capacity((finish - start).max(0) as usize);
        for virtual_x in start..finish {
            if cancel.is_cancelled() {
                return Err(Error::Canceled);
            }
            let mut points = Vec::with_capacity((self.width * self.height).max(0) as usize);
            for x in 0..self.width {
                self.virtual_column(virtual_x + x, |y, color| {
                    points.push(MatrixPoint { x, y, color });
                });
            }
            frames.push(points);
        }

        self.play(cancel, frames).await
    }

    /// Every pixel of one frame, in panel coordinates.
    fn frame(&self, pixel: impl Fn(i32, i32) -> Color) -> Vec<MatrixPoint> {
        let mut points = Vec::with_capacity((self.width * self.height).max(0) as usize);
        for x in 0..self.width {
            for y in 0..self.height {
                points.push(MatrixPoint { x, y, color: pixel(x, y) });
            }
        }
        points
    }

    /// Queue `frames` on the matrix and play them at this canvas's speed.
    ///
    /// With a status channel attached the frames go out in tenths, and the
    /// fraction played is reported after each. `1.0` follows a full scroll.
    async fn play(&self, cancel: &CancellationToken, frames: Vec<Vec<MatrixPoint>>) -> Result<()> {
        let total = frames.len();
        let chunk = match self.scroll_status {
            Some(_) => total.div_ceil(STATUS_STEPS).max(1),
            None => total.max(1),
        };

        let mut updates = self.speed.subscribe();
        let mut played = 0;
        let mut frames = frames.into_iter().peekable();

        while frames.peek().is_some() {
            for (index, points) in frames.by_ref().take(chunk).enumerate() {
                self.matrix.preload(MatrixScene { points, index });
                played += 1;
            }
            self.matrix
                .play(cancel, self.speed.get(), Some(&mut updates))
                .await?;

            if played < total {
                self.report_status(played as f64 / total as f64);
            }
        }

        self.report_status(1.0);
        Ok(())
    }

    // ── Vertical ────────────────────────────────────────────────────

    /// Scroll the backing buffer up from below the panel out through the top.
    pub(super) async fn bottom_to_top(&mut self, cancel: &CancellationToken) -> Result<()> {
        let start = self.height - first_non_blank_y(&self.actual);
        let finish = -(last_non_blank_y(&self.actual) + 1);
        tracing::debug!(start_y = start, finish_line = finish, "scrolling until line");

        let shifts: Vec<i32> = ((finish + 1)..=start).rev().collect();
        self.scroll_vertical(cancel, shifts).await
    }

    /// Scroll the backing buffer down from above the panel out through the
    /// bottom. `render` never picks this direction; call it directly.
    pub async fn scroll_top_to_bottom(&mut self, cancel: &CancellationToken) -> Result<()> {
        let start = -(last_non_blank_y(&self.actual) + 1);
        let finish = self.height - first_non_blank_y(&self.actual);
        tracing::debug!(start_y = start, finish_line = finish, "scrolling until line");

        let shifts: Vec<i32> = (start..finish).collect();
        self.scroll_vertical(cancel, shifts).await
    }

    async fn scroll_vertical(&mut self, cancel: &CancellationToken, shifts: Vec<i32>) -> Result<()> {
        let total = shifts.len();
        let mut reported = 0;

        for (step, shift) in shifts.into_iter().enumerate() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Canceled),
                _ = tokio::time::sleep(self.speed.get()) => {}
            }

            for x in 0..self.width {
                for y in 0..self.height {
                    self.matrix.set(x, y, self.actual.at(x, y - shift));
                }
            }
            self.matrix.render()?;

            let tenth = (step + 1) * STATUS_STEPS / total;
            if tenth > reported && step + 1 < total {
                reported = tenth;
                self.report_status(tenth as f64 / STATUS_STEPS as f64);
            }
        }

        self.report_status(1.0);
        Ok(())
    }
}
