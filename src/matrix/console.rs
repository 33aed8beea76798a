//! ASCII emulation of a matrix.
//!
//! Prints one box per rendered frame, one character per LED, so layouts
//! and scroll timing can be checked without a Pi. Tests point it at
//! `std::io::sink()`.

use super::{IntervalUpdates, Matrix, MatrixScene, SceneQueue, play_frames, position};
use crate::{Color, Result};
use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct ConsoleMatrix {
    width: i32,
    height: i32,
    leds: Mutex<Vec<Color>>,
    preload: Mutex<SceneQueue>,
    out: Mutex<Box<dyn Write + Send>>,
    brightness: AtomicU8,
    frames_rendered: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConsoleMatrix {
    pub fn new(width: i32, height: i32, out: Box<dyn Write + Send>) -> Self {
        Self {
            width,
            height,
            leds: Mutex::new(vec![Color::BLACK; (width.max(0) * height.max(0)) as usize]),
            preload: Mutex::new(SceneQueue::default()),
            out: Mutex::new(out),
            brightness: AtomicU8::new(100),
            frames_rendered: AtomicUsize::new(0),
        }
    }

    /// Number of frames written so far, by `render` or by `play`.
    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        lock(&self.leds).fill(Color::BLACK);
    }

    fn write_frame(&self, leds: &[Color]) -> Result<()> {
        let brightness = self.brightness.load(Ordering::Relaxed);
        let border = "_ ".repeat(self.width.max(0) as usize + 1);

        let mut rendered = String::with_capacity(leds.len() * 2 + border.len() * 2);
        rendered.push_str(&border);
        rendered.push('\n');
        for row in leds.chunks(self.width.max(1) as usize) {
            rendered.push('|');
            for led in row {
                rendered.push_str(glyph(led.apply_brightness(brightness)));
            }
            rendered.push_str("|\n");
        }
        rendered.push_str(&border);
        rendered.push('|');

        let mut out = lock(&self.out);
        writeln!(out, "{rendered}")?;
        out.flush()?;

        self.frames_rendered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// The dominant channel as a letter, blanks as spaces.
fn glyph(c: Color) -> &'static str {
    let (r, g, b) = (c.r, c.g, c.b);
    if r > g && r > b {
        "R "
    } else if g > r && g > b {
        "G "
    } else if b > r && b > g {
        "B "
    } else if r < 40 && g < 40 && b < 40 {
        "  "
    } else if r > 240 && g > 240 && b > 240 {
        "W "
    } else {
        "0 "
    }
}

#[async_trait]
impl Matrix for ConsoleMatrix {
    fn geometry(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn at(&self, x: i32, y: i32) -> Color {
        position(x, y, self.width, self.height)
            .map(|pos| lock(&self.leds)[pos])
            .unwrap_or(Color::BLACK)
    }

    fn set(&self, x: i32, y: i32, color: Color) {
        if let Some(pos) = position(x, y, self.width, self.height) {
            lock(&self.leds)[pos] = color;
        }
    }

    /// Print the current LEDs, then reset them to black.
    fn render(&self) -> Result<()> {
        let leds = lock(&self.leds).clone();
        self.write_frame(&leds)?;
        self.reset();
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn set_brightness(&self, brightness: u8) {
        self.brightness.store(brightness.min(100), Ordering::Relaxed);
    }

    fn preload(&self, scene: MatrixScene) {
        lock(&self.preload).insert(&scene, self.width, self.height);
    }

    async fn play(
        &self,
        cancel: &CancellationToken,
        start_interval: Duration,
        updates: Option<&mut IntervalUpdates>,
    ) -> Result<()> {
        let frames = lock(&self.preload).take();
        play_frames(frames, cancel, start_interval, updates, |leds| {
            self.write_frame(leds)
        })
        .await
    }
}
