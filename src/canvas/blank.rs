//! Find where the content of an image starts and ends.
//!
//! A pixel counts as content when any of its RGB channels is non-zero. The
//! scans never fail: an empty buffer gives `0`, and an all-blank buffer gives
//! the edge the scan started from (`min` for `first_*`, `max` for `last_*`).

use super::buffer::PixelBuffer;

fn column_has_content(img: &PixelBuffer, x: i32) -> bool {
    let b = img.bounds();
    (b.min.y..b.max.y).any(|y| !img.at(x, y).is_blank())
}

fn row_has_content(img: &PixelBuffer, y: i32) -> bool {
    let b = img.bounds();
    (b.min.x..b.max.x).any(|x| !img.at(x, y).is_blank())
}

/// Inclusive range of columns holding content, or `None` if every pixel is blank.
pub fn non_blank_columns(img: &PixelBuffer) -> Option<(i32, i32)> {
    let b = img.bounds();
    let first = (b.min.x..b.max.x).find(|&x| column_has_content(img, x))?;
    let last = (first..b.max.x)
        .rev()
        .find(|&x| column_has_content(img, x))
        .unwrap_or(first);
    Some((first, last))
}

/// Inclusive range of rows holding content, or `None` if every pixel is blank.
pub fn non_blank_rows(img: &PixelBuffer) -> Option<(i32, i32)> {
    let b = img.bounds();
    let first = (b.min.y..b.max.y).find(|&y| row_has_content(img, y))?;
    let last = (first..b.max.y)
        .rev()
        .find(|&y| row_has_content(img, y))
        .unwrap_or(first);
    Some((first, last))
}

pub fn first_non_blank_x(img: &PixelBuffer) -> i32 {
    let b = img.bounds();
    if b.is_empty() {
        return 0;
    }
    non_blank_columns(img).map_or(b.min.x, |(first, _)| first)
}

pub fn last_non_blank_x(img: &PixelBuffer) -> i32 {
    let b = img.bounds();
    if b.is_empty() {
        return 0;
    }
    non_blank_columns(img).map_or(b.max.x, |(_, last)| last)
}

pub fn first_non_blank_y(img: &PixelBuffer) -> i32 {
    let b = img.bounds();
    if b.is_empty() {
        return 0;
    }
    non_blank_rows(img).map_or(b.min.y, |(first, _)| first)
}

pub fn last_non_blank_y(img: &PixelBuffer) -> i32 {
    let b = img.bounds();
    if b.is_empty() {
        return 0;
    }
    non_blank_rows(img).map_or(b.max.y, |(_, last)| last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use crate::canvas::buffer::{Point, Rect};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn single_pixel(size: i32, pt: Point) -> PixelBuffer {
        let mut img = PixelBuffer::new(Rect::new(0, 0, size, size));
        img.set(pt.x, pt.y, Color::WHITE);
        img
    }

    #[rstest]
    #[case::first_line(Point::new(2, 0), 0)]
    #[case::last_line(Point::new(2, 10), 10)]
    #[case::middle(Point::new(2, 5), 5)]
    fn test_first_non_blank_y(#[case] pt: Point, #[case] expected: i32) {
        assert_eq!(first_non_blank_y(&single_pixel(11, pt)), expected);
    }

    #[rstest]
    #[case::first_line(Point::new(2, 0), 2)]
    #[case::last_line(Point::new(2, 10), 2)]
    #[case::middle(Point::new(2, 5), 2)]
    fn test_first_non_blank_x(#[case] pt: Point, #[case] expected: i32) {
        assert_eq!(first_non_blank_x(&single_pixel(11, pt)), expected);
    }

    #[rstest]
    #[case::first_line(Point::new(0, 0), 0)]
    #[case::last_line(Point::new(2, 9), 9)]
    #[case::middle(Point::new(2, 5), 5)]
    fn test_last_non_blank_y(#[case] pt: Point, #[case] expected: i32) {
        assert_eq!(last_non_blank_y(&single_pixel(10, pt)), expected);
    }

    #[rstest]
    #[case::first_line(Point::new(0, 0), 0)]
    #[case::last_line(Point::new(2, 9), 2)]
    #[case::middle(Point::new(5, 5), 5)]
    #[case::last_x(Point::new(9, 5), 9)]
    fn test_last_non_blank_x(#[case] pt: Point, #[case] expected: i32) {
        assert_eq!(last_non_blank_x(&single_pixel(10, pt)), expected);
    }

    #[rstest]
    #[case(Point::new(0, 0))]
    #[case(Point::new(3, 7))]
    #[case(Point::new(7, 3))]
    fn single_pixel_bounds_collapse_to_that_pixel(#[case] pt: Point) {
        let img = single_pixel(8, pt);
        assert_eq!(first_non_blank_x(&img), pt.x);
        assert_eq!(last_non_blank_x(&img), pt.x);
        assert_eq!(first_non_blank_y(&img), pt.y);
        assert_eq!(last_non_blank_y(&img), pt.y);
    }

    #[test]
    fn all_blank_returns_edges() {
        let img = PixelBuffer::new(Rect::new(-4, -2, 6, 3));
        assert_eq!(first_non_blank_x(&img), -4);
        assert_eq!(last_non_blank_x(&img), 6);
        assert_eq!(first_non_blank_y(&img), -2);
        assert_eq!(last_non_blank_y(&img), 3);
        assert_eq!(non_blank_columns(&img), None);
    }

    #[test]
    fn empty_buffer_returns_zero() {
        let img = PixelBuffer::new(Rect::new(5, 5, 5, 9));
        assert_eq!(first_non_blank_x(&img), 0);
        assert_eq!(last_non_blank_x(&img), 0);
        assert_eq!(first_non_blank_y(&img), 0);
        assert_eq!(last_non_blank_y(&img), 0);
    }

    #[test]
    fn negative_coordinates_are_reported_as_is() {
        let mut img = PixelBuffer::new(Rect::new(-10, -10, 10, 10));
        img.set(-7, -3, Color::new(0, 0, 9));
        img.set(4, 2, Color::new(9, 0, 0));
        assert_eq!(non_blank_columns(&img), Some((-7, 4)));
        assert_eq!(non_blank_rows(&img), Some((-3, 2)));
    }
}
