//! No-merge composition.
//!
//! Instead of copying the added images into one strip, lay them out along a
//! virtual X axis:
//!
//! ```text
//! [blank, width w] [image 1] [gap] [image 2] [gap] ... [blank, width w]
//!  index 0          index 1   2     3         4         last
//! ```
//!
//! Each entry covers an inclusive virtual range that starts one column after
//! the previous entry ends. A virtual column is resolved to the entry owning
//! it and then to a column of that entry's own image.

use super::ScrollCanvas;
use crate::Color;
use crate::canvas::blank::{first_non_blank_x, last_non_blank_x};
use crate::canvas::buffer::{PixelBuffer, Rect};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub(crate) struct SubCanvasHorizontal {
    pub(crate) actual_start_x: i32,
    pub(crate) actual_end_x: i32,
    pub(crate) virtual_start_x: i32,
    pub(crate) virtual_end_x: i32,
    pub(crate) img: Arc<PixelBuffer>,
    pub(crate) index: usize,
}

impl SubCanvasHorizontal {
    fn new(index: usize, actual_start_x: i32, actual_end_x: i32, img: Arc<PixelBuffer>) -> Self {
        Self {
            actual_start_x,
            actual_end_x,
            virtual_start_x: 0,
            virtual_end_x: 0,
            img,
            index,
        }
    }

    fn contains(&self, virtual_x: i32) -> bool {
        virtual_x >= self.virtual_start_x && virtual_x <= self.virtual_end_x
    }

    /// Column of `img` shown at `virtual_x`.
    fn actual_x(&self, virtual_x: i32) -> i32 {
        (virtual_x - self.virtual_start_x) + self.actual_start_x
    }
}

impl ScrollCanvas {
    /// Rebuild the virtual layout from the added images. No-op with none.
    pub fn prepare_sub_canvases(&mut self) {
        self.sub_canvases.clear();
        if self.actuals.is_empty() {
            return;
        }

        let (w, h) = (self.width, self.height);
        let blank = |width: i32| Arc::new(PixelBuffer::new(Rect::new(0, 0, width, h)));

        let mut subs = vec![SubCanvasHorizontal {
            virtual_end_x: w,
            ..SubCanvasHorizontal::new(0, 0, w, blank(w))
        }];

        let mut index = 1;
        for actual in &self.actuals {
            subs.push(SubCanvasHorizontal::new(
                index,
                first_non_blank_x(actual),
                last_non_blank_x(actual),
                actual.clone(),
            ));
            index += 1;
            subs.push(SubCanvasHorizontal::new(
                index,
                0,
                self.merge_pad,
                blank(self.merge_pad),
            ));
            index += 1;
        }
        subs.push(SubCanvasHorizontal::new(index, 0, w, blank(w)));

        subs.sort_by_key(|sub| sub.index);
        tracing::debug!(num = subs.len(), "done initializing sub canvases");

        for i in 1..subs.len() {
            let prev_end = subs[i - 1].virtual_end_x;
            let sub = &mut subs[i];
            sub.virtual_start_x = prev_end + 1;
            // A negative start widens the span by its magnitude.
            sub.virtual_end_x = sub.virtual_start_x + (sub.actual_end_x - sub.actual_start_x);

            tracing::debug!(
                index = sub.index,
                actual_start_x = sub.actual_start_x,
                actual_end_x = sub.actual_end_x,
                virtual_start_x = sub.virtual_start_x,
                virtual_end_x = sub.virtual_end_x,
                "define sub canvas"
            );
        }

        self.sub_canvases = subs;
    }

    fn sub_canvas_at(&self, virtual_x: i32) -> Option<&SubCanvasHorizontal> {
        self.sub_canvases.iter().find(|sub| sub.contains(virtual_x))
    }

    /// Color at a virtual coordinate; black outside every sub-canvas.
    pub fn virtual_pixel(&self, virtual_x: i32, y: i32) -> Color {
        self.sub_canvas_at(virtual_x)
            .map(|sub| sub.img.at(sub.actual_x(virtual_x), y))
            .unwrap_or(Color::BLACK)
    }

    /// Write column `x` of a frame showing virtual column `virtual_x`.
    pub(super) fn virtual_column(&self, virtual_x: i32, mut emit: impl FnMut(i32, Color)) {
        match self.sub_canvas_at(virtual_x) {
            Some(sub) => {
                let actual_x = sub.actual_x(virtual_x);
                for y in 0..self.height {
                    emit(y, sub.img.at(actual_x, y));
                }
            }
            None => {
                for y in 0..self.height {
                    emit(y, Color::BLACK);
                }
            }
        }
    }

    /// Virtual `(start, end)` of every sub-canvas, in order.
    pub fn sub_canvas_ranges(&self) -> Vec<(i32, i32)> {
        self.sub_canvases
            .iter()
            .map(|sub| (sub.virtual_start_x, sub.virtual_end_x))
            .collect()
    }
}
