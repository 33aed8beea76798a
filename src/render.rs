//! Rotation loop: what the binary keeps scrolling until it is stopped.
//!
//! Each pass loads every image under `media/images`, scales it to the panel
//! height and scrolls the lot through a fresh [`ScrollCanvas`]. With no
//! images on disk a hue test pattern scrolls instead, so a freshly wired
//! panel always shows something.
//!
//! The scroll speed is one shared [`ScrollSpeed`] handle: the HTTP server
//! changes it and the canvas playing right now picks it up on its next
//! frame. Direction is read from the shared status at the start of each
//! pass.
//!
//! ## Rust concepts
//! - `Arc<Mutex<T>>` for status shared with the HTTP handlers
//! - `tokio::select!` to back off after an error without missing Ctrl+C
//! - Match guards (`Err(e) if e.is_canceled()`)

use crate::canvas::{
    Canvas, PixelBuffer, ScrollCanvas, ScrollDirection, ScrollSpeed, with_merge_padding,
    with_scroll_direction,
};
use crate::matrix::SharedMatrix;
use crate::{Color, PanelConfig, Result, media};
use image::imageops::FilterType;
use image::{ImageReader, RgbImage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pause after a failed pass before trying again.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(1);

// ── Status ───────────────────────────────────────────────────────────

/// What the display is currently doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Idle,
    Scrolling,
}

/// Shared status: the rotation loop writes it, HTTP handlers read and
/// adjust it.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct DisplayStatus {
    /// Current display state
    pub state: DisplayState,
    /// Names of the images in the current pass
    pub current_media: Option<String>,
    /// Direction used from the next pass on
    pub direction: ScrollDirection,
    /// Delay between two scroll steps, in milliseconds
    pub scroll_ms: u64,
    /// Current brightness (0-100)
    pub brightness: u8,
    /// Passes completed since startup
    pub passes: u64,
    /// Server version
    pub version: String,
}

impl DisplayStatus {
    pub fn new(direction: ScrollDirection, scroll_speed: Duration) -> Self {
        Self {
            state: DisplayState::Idle,
            current_media: None,
            direction,
            scroll_ms: scroll_speed.as_millis() as u64,
            brightness: 100,
            passes: 0,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn set_idle(&mut self) {
        self.state = DisplayState::Idle;
        self.current_media = None;
    }
}

pub type SharedStatus = Arc<Mutex<DisplayStatus>>;

/// Lock the status even if a panicking holder poisoned it.
pub fn lock_status(status: &SharedStatus) -> MutexGuard<'_, DisplayStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Pages ────────────────────────────────────────────────────────────

/// One image to scroll.
#[derive(Clone, Debug)]
pub struct Page {
    pub name: String,
    pub img: PixelBuffer,
}

/// Load an image from disk and scale it to the panel height, keeping its
/// aspect ratio.
pub fn load_and_resize_image(path: &Path, panel: PanelConfig) -> Result<PixelBuffer> {
    let img = ImageReader::open(path)?.decode()?;
    let height = panel.rows.max(1);
    let width = (u64::from(img.width()) * u64::from(height) / u64::from(img.height().max(1))).max(1);
    let resized = img
        .resize_exact(width as u32, height, FilterType::Lanczos3)
        .to_rgb8();
    Ok(PixelBuffer::from(resized))
}

/// A panel-sized rainbow, one hue per column.
pub fn test_pattern(panel: PanelConfig) -> PixelBuffer {
    let cols = panel.cols.max(1);
    let img = RgbImage::from_fn(cols, panel.rows, |x, _| {
        Color::from_hue((x * 360 / cols) as u16).into()
    });
    PixelBuffer::from(img)
}

/// Every loadable image in the media directory, or the test pattern when
/// there is none. Images that fail to load are skipped.
pub fn load_pages(media_dir: &Path, panel: PanelConfig) -> Vec<Page> {
    let mut pages = Vec::new();
    for path in media::image_paths(media_dir) {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        match load_and_resize_image(&path, panel) {
            Ok(img) => pages.push(Page { name, img }),
            Err(e) => tracing::warn!("Skipping image {}: {}", path.display(), e),
        }
    }

    if pages.is_empty() {
        pages.push(Page {
            name: "test pattern".to_string(),
            img: test_pattern(panel),
        });
    }
    pages
}

// ── Rotation ─────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct RotationConfig {
    /// Root directory containing `images/`
    pub media_dir: PathBuf,
    /// Flatten the images into one strip before scrolling
    pub merge: bool,
    /// Columns left between two images
    pub merge_padding: i32,
}

fn new_canvas(
    matrix: &SharedMatrix,
    config: &RotationConfig,
    direction: ScrollDirection,
    speed: &ScrollSpeed,
) -> Result<ScrollCanvas> {
    let mut canvas = ScrollCanvas::new(
        matrix.clone(),
        vec![
            with_scroll_direction(direction),
            with_merge_padding(config.merge_padding),
        ],
    )?;
    canvas.use_speed_handle(speed.clone());
    Ok(canvas)
}

/// Scroll `pages` once.
///
/// Horizontally all pages go out as one ticker. Vertically each page
/// scrolls up on its own canvas.
pub async fn scroll_pass(
    matrix: &SharedMatrix,
    pages: &[Page],
    config: &RotationConfig,
    direction: ScrollDirection,
    speed: &ScrollSpeed,
    cancel: &CancellationToken,
) -> Result<()> {
    if direction.is_horizontal() {
        let mut canvas = new_canvas(matrix, config, direction, speed)?;
        for page in pages {
            canvas.add_canvas(&page.img);
        }
        if config.merge {
            canvas.merge(config.merge_padding);
        }
        return canvas.render(cancel).await;
    }

    for page in pages {
        let mut canvas = new_canvas(matrix, config, direction, speed)?;
        canvas.draw(&page.img);
        canvas.render(cancel).await?;
    }
    Ok(())
}

/// Scroll the media directory over and over until `cancel` fires.
///
/// A failed pass is logged and retried after [`ERROR_BACKOFF`].
pub async fn rotation_loop(
    matrix: SharedMatrix,
    config: RotationConfig,
    speed: ScrollSpeed,
    status: SharedStatus,
    cancel: CancellationToken,
) {
    let (width, height) = matrix.geometry();
    let panel = PanelConfig::new(height as u32, width as u32);
    tracing::info!("Rotation loop started, media dir: {}", config.media_dir.display());

    while !cancel.is_cancelled() {
        let pages = load_pages(&config.media_dir, panel);
        let direction = {
            let mut s = lock_status(&status);
            s.state = DisplayState::Scrolling;
            s.current_media = Some(
                pages
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            s.direction
        };

        match scroll_pass(&matrix, &pages, &config, direction, &speed, &cancel).await {
            Ok(()) => {
                lock_status(&status).passes += 1;
            }
            Err(e) if e.is_canceled() => break,
            Err(e) => {
                tracing::error!("Scroll pass failed: {}", e);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                }
            }
        }
    }

    lock_status(&status).set_idle();
    tracing::info!("Rotation loop stopped");
}
