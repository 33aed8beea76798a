//! Scroll Matrix server
//!
//! Scrolls the images in a media directory across an RGB LED matrix and
//! exposes a small HTTP API to steer the scroll while it runs.
//!
//! ## Architecture
//! - **Rotation task** (tokio): builds a scroll canvas per pass and plays it
//! - **HTTP server** (tokio/axum): changes speed, direction and brightness
//! - **Matrix driver**: the real panel (feature `hardware`) or an ASCII
//!   console emulation
//!
//! ## Rust concepts
//! - `#[tokio::main]` async entry point
//! - `#[cfg(feature = ...)]` to pick the driver at compile time
//! - `CancellationToken` shared by Ctrl+C, the rotation task and the server
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/scroll-matrix --media-dir /path/to/media --port 8080
//! ```

use clap::Parser;
use scroll_matrix::canvas::{ScrollDirection, ScrollSpeed};
use scroll_matrix::matrix::{ConsoleMatrix, SharedMatrix};
use scroll_matrix::render::{DisplayStatus, RotationConfig, rotation_loop};
use scroll_matrix::server::{self, AppState};
use scroll_matrix::{PanelConfig, setup_signal_handler};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Scroll Matrix server
#[derive(Parser)]
#[command(name = "scroll-matrix")]
#[command(about = "Scrolls images across an RGB LED matrix, steerable over HTTP")]
#[command(version)]
struct Args {
    /// Number of rows on the LED panel
    #[arg(long, default_value = "32")]
    rows: u32,

    /// Number of columns on the LED panel
    #[arg(long, default_value = "64")]
    cols: u32,

    /// Root directory containing an images/ subdirectory
    #[arg(long, default_value = ".")]
    media_dir: PathBuf,

    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Delay between two scroll steps, in milliseconds
    #[arg(long, default_value = "50", value_parser = clap::value_parser!(u64).range(1..))]
    scroll_ms: u64,

    /// Initial scroll direction
    #[arg(long, value_enum, default_value_t = ScrollDirection::RightToLeft)]
    direction: ScrollDirection,

    /// Columns left between two images
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(i32).range(0..))]
    merge_padding: i32,

    /// Flatten all images into one strip before scrolling
    #[arg(long)]
    merge: bool,

    /// Draw frames as ASCII on stdout instead of driving the panel
    #[arg(long)]
    console: bool,
}

fn console_matrix(panel: PanelConfig) -> SharedMatrix {
    let (width, height) = panel.geometry();
    Arc::new(ConsoleMatrix::new(width, height, Box::new(std::io::stdout())))
}

#[cfg(feature = "hardware")]
fn open_matrix(console: bool, panel: PanelConfig) -> scroll_matrix::Result<SharedMatrix> {
    if console {
        return Ok(console_matrix(panel));
    }
    Ok(Arc::new(scroll_matrix::matrix::HardwareMatrix::new(panel)?))
}

#[cfg(not(feature = "hardware"))]
fn open_matrix(console: bool, panel: PanelConfig) -> scroll_matrix::Result<SharedMatrix> {
    if !console {
        tracing::warn!("Built without the 'hardware' feature, using the console matrix");
    }
    Ok(console_matrix(panel))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    let panel = PanelConfig::new(args.rows, args.cols);

    let media_dir = args.media_dir.canonicalize().unwrap_or_else(|_| {
        tracing::warn!("Could not canonicalize media dir, using as-is");
        args.media_dir.clone()
    });

    tracing::info!("Scroll Matrix v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Panel: {}x{}", panel.cols, panel.rows);
    tracing::info!("Media dir: {}", media_dir.display());
    tracing::info!(
        "Scroll: {} every {}ms, merge: {}, padding: {}",
        args.direction,
        args.scroll_ms,
        args.merge,
        args.merge_padding
    );

    let matrix = match open_matrix(args.console, panel) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Failed to initialize LED matrix: {}", e);
            std::process::exit(1);
        }
    };

    let cancel = setup_signal_handler().expect("Failed to install Ctrl+C handler");

    let speed = ScrollSpeed::new(Duration::from_millis(args.scroll_ms));
    let status = Arc::new(Mutex::new(DisplayStatus::new(args.direction, speed.get())));

    let rotation = tokio::spawn(rotation_loop(
        matrix.clone(),
        RotationConfig {
            media_dir: media_dir.clone(),
            merge: args.merge,
            merge_padding: args.merge_padding,
        },
        speed.clone(),
        status.clone(),
        cancel.clone(),
    ));

    let app = server::create_router(AppState {
        speed,
        status,
        matrix: matrix.clone(),
        media_dir,
    });

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await
        .expect("Server error");

    cancel.cancel();
    if let Err(e) = rotation.await {
        tracing::error!("Rotation task failed: {}", e);
    }
    if let Err(e) = matrix.close() {
        tracing::error!("Failed to close matrix: {}", e);
    }
    tracing::info!("Shut down cleanly");
}
