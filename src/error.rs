//! Crate error type.
//!
//! Everything that can stop a scroll bubbles up as one of these variants.
//! The core never retries; the caller (a board, or the rotation loop in
//! `render.rs`) decides whether to skip the page, retry, or give up.

use crate::canvas::ScrollDirection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The cancellation token fired while scenes were being built or played.
    #[error("scroll canceled")]
    Canceled,

    /// `render` was asked to scroll in a direction it has no algorithm for.
    #[error("unsupported scroll direction: {0}")]
    UnsupportedDirection(ScrollDirection),

    /// No-merge playback was requested but no sub-images were added.
    #[error("not enough sub canvases to scroll")]
    NoSubCanvases,

    /// A construction option rejected its argument.
    #[error("invalid scroll canvas option: {0}")]
    InvalidOption(String),

    /// The matrix driver failed to render or play.
    #[error("matrix driver error: {0}")]
    Driver(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
