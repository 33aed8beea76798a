//! The non-scrolling canvas: pixels go straight to the matrix.

use super::{Canvas, Rect};
use crate::matrix::SharedMatrix;
use crate::{Color, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub struct MatrixCanvas {
    width: i32,
    height: i32,
    matrix: SharedMatrix,
}

impl MatrixCanvas {
    pub fn new(matrix: SharedMatrix) -> Self {
        let (width, height) = matrix.geometry();
        Self {
            width,
            height,
            matrix,
        }
    }
}

#[async_trait]
impl Canvas for MatrixCanvas {
    fn name(&self) -> &'static str {
        "RGB Canvas"
    }

    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    fn at(&self, x: i32, y: i32) -> Color {
        self.matrix.at(x, y)
    }

    fn set(&mut self, x: i32, y: i32, color: Color) {
        self.matrix.set(x, y, color);
    }

    fn scrollable(&self) -> bool {
        false
    }

    fn clear(&mut self) -> Result<()> {
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

    async fn render(&mut self, _cancel: &CancellationToken) -> Result<()> {
        self.matrix.render()
    }
}
