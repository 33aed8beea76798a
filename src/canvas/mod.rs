//! Canvases are what boards draw on.
//!
//! Every canvas implements [`Canvas`]. Only [`ScrollCanvas`] scrolls; a
//! board that wants scroll-only features asks for them with
//! [`Canvas::as_scroll_canvas`] and gets `None` back from a plain canvas.
//!
//! ## Rust concepts
//! - Trait objects (`&mut dyn Canvas`) for boards that accept either canvas
//! - A default trait method returning `Option<&mut T>` as a checked downcast

pub mod blank;
pub mod buffer;
pub mod plain;
pub mod scroll;
pub mod speed;

pub use buffer::{PixelBuffer, Point, Rect};
pub use plain::MatrixCanvas;
pub use scroll::{
    DEFAULT_SCROLL_DELAY, ScrollCanvas, ScrollCanvasOption, ScrollDirection, with_merge_padding,
    with_padding, with_scroll_direction, with_scroll_speed,
};
pub use speed::{MATCH_SCROLL_POLL, ScrollSpeed, match_scroll};

use crate::{Color, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Canvas: Send {
    fn name(&self) -> &'static str;
    fn bounds(&self) -> Rect;
    fn at(&self, x: i32, y: i32) -> Color;
    fn set(&mut self, x: i32, y: i32, color: Color);
    /// True only for canvases that scroll their content.
    fn scrollable(&self) -> bool;
    fn clear(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    /// Put the canvas on the matrix. Blocks until a scroll finishes or
    /// `cancel` fires.
    async fn render(&mut self, cancel: &CancellationToken) -> Result<()>;

    fn as_scroll_canvas(&mut self) -> Option<&mut ScrollCanvas> {
        None
    }

    /// Copy every pixel of `img` onto the canvas at the same coordinates.
    fn draw(&mut self, img: &PixelBuffer) {
        let b = img.bounds();
        for y in b.min.y..b.max.y {
            for x in b.min.x..b.max.x {
                self.set(x, y, img.at(x, y));
            }
        }
    }
}
