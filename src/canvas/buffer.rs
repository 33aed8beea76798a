//! Pixel buffers with an arbitrary origin.
//!
//! `image::RgbImage` always starts at `(0, 0)`. A scroll canvas needs room
//! left of and above the visible panel, so `PixelBuffer` pairs an image with
//! a `Rect` whose minimum corner may be negative. Reads outside the rect
//! return black; writes outside it are dropped.

use crate::Color;
use image::{DynamicImage, RgbImage};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Half-open rectangle: `min` is inside, `max` is one past the last pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Build a rectangle from two corners, swapping them if needed.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0.min(x1), y0.min(y1)),
            max: Point::new(x0.max(x1), y0.max(y1)),
        }
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min.x && x < self.max.x && y >= self.min.y && y < self.max.y
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    bounds: Rect,
    img: RgbImage,
}

impl PixelBuffer {
    /// A black buffer covering `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            img: RgbImage::new(bounds.width().max(0) as u32, bounds.height().max(0) as u32),
        }
    }

    /// Place an image so its top-left pixel sits at `origin`.
    pub fn with_origin(img: RgbImage, origin: Point) -> Self {
        let bounds = Rect::new(
            origin.x,
            origin.y,
            origin.x + img.width() as i32,
            origin.y + img.height() as i32,
        );
        Self { bounds, img }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    pub fn height(&self) -> i32 {
        self.bounds.height()
    }

    pub fn at(&self, x: i32, y: i32) -> Color {
        if !self.bounds.contains(x, y) {
            return Color::BLACK;
        }
        let px = self.img.get_pixel(
            (x - self.bounds.min.x) as u32,
            (y - self.bounds.min.y) as u32,
        );
        Color::from(*px)
    }

    pub fn set(&mut self, x: i32, y: i32, color: Color) {
        if !self.bounds.contains(x, y) {
            return;
        }
        self.img.put_pixel(
            (x - self.bounds.min.x) as u32,
            (y - self.bounds.min.y) as u32,
            color.into(),
        );
    }

    pub fn fill(&mut self, color: Color) {
        for px in self.img.pixels_mut() {
            *px = color.into();
        }
    }

    /// Underlying image, indexed from `(0, 0)` regardless of origin.
    pub fn image(&self) -> &RgbImage {
        &self.img
    }
}

impl From<RgbImage> for PixelBuffer {
    fn from(img: RgbImage) -> Self {
        Self::with_origin(img, Point::default())
    }
}

/// Alpha is dropped; blankness only looks at RGB.
impl From<&DynamicImage> for PixelBuffer {
    fn from(img: &DynamicImage) -> Self {
        Self::from(img.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn rect_normalizes_corners() {
        let r = Rect::new(10, 5, -2, -3);
        assert_eq!(r.min, Point::new(-2, -3));
        assert_eq!(r.max, Point::new(10, 5));
        assert_eq!(r.width(), 12);
        assert_eq!(r.height(), 8);
    }

    #[rstest]
    #[case(-5, -5, true)]
    #[case(4, 4, true)]
    #[case(5, 0, false)]
    #[case(0, -6, false)]
    fn rect_contains_is_half_open(#[case] x: i32, #[case] y: i32, #[case] inside: bool) {
        assert_eq!(Rect::new(-5, -5, 5, 5).contains(x, y), inside);
    }

    #[test]
    fn negative_origin_buffer_reads_and_writes() {
        let mut buf = PixelBuffer::new(Rect::new(-3, -2, 3, 2));
        buf.set(-3, -2, Color::WHITE);
        buf.set(2, 1, Color::new(1, 2, 3));
        buf.set(3, 2, Color::WHITE); // just outside

        assert_eq!(buf.at(-3, -2), Color::WHITE);
        assert_eq!(buf.at(2, 1), Color::new(1, 2, 3));
        assert_eq!(buf.at(3, 2), Color::BLACK);
        assert_eq!(buf.image().get_pixel(0, 0), &image::Rgb([255, 255, 255]));
    }

    #[test]
    fn fill_paints_every_pixel() {
        let mut buf = PixelBuffer::new(Rect::new(0, 0, 3, 2));
        buf.fill(Color::WHITE);
        assert!(buf.image().pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn empty_rect_buffer_is_empty() {
        let buf = PixelBuffer::new(Rect::new(0, 0, 0, 4));
        assert!(buf.bounds().is_empty());
        assert_eq!(buf.at(0, 0), Color::BLACK);
    }

    #[test]
    fn from_dynamic_image_drops_alpha() {
        let mut rgba = image::RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 255]));
        let buf = PixelBuffer::from(&DynamicImage::ImageRgba8(rgba));
        assert!(buf.at(0, 0).is_blank());
    }
}
