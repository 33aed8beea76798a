//! A matrix test double that remembers everything it was asked to draw.

use super::{IntervalUpdates, Matrix, MatrixScene, SceneQueue, play_frames, position};
use crate::{Color, Error, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub(crate) struct RecordingMatrix {
    width: i32,
    height: i32,
    leds: Mutex<Vec<Color>>,
    preload: Mutex<SceneQueue>,
    preloaded: Mutex<usize>,
    frames: Mutex<Vec<Vec<Color>>>,
    brightness: Mutex<Option<u8>>,
    closed: AtomicBool,
    fail_render: AtomicBool,
}

impl RecordingMatrix {
    pub(crate) fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            leds: Mutex::new(vec![Color::BLACK; (width * height) as usize]),
            preload: Mutex::new(SceneQueue::default()),
            preloaded: Mutex::new(0),
            frames: Mutex::new(Vec::new()),
            brightness: Mutex::new(None),
            closed: AtomicBool::new(false),
            fail_render: AtomicBool::new(false),
        }
    }

    /// Every frame shown so far, whether by `render` or `play`.
    pub(crate) fn frames(&self) -> Vec<Vec<Color>> {
        self.frames.lock().unwrap().clone()
    }

    /// Total scenes handed to `preload`.
    pub(crate) fn preloaded(&self) -> usize {
        *self.preloaded.lock().unwrap()
    }

    pub(crate) fn brightness(&self) -> Option<u8> {
        *self.brightness.lock().unwrap()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_renders(&self) {
        self.fail_render.store(true, Ordering::SeqCst);
    }

    fn record(&self, leds: &[Color]) -> Result<()> {
        if self.fail_render.load(Ordering::SeqCst) {
            return Err(Error::Driver("render failed".to_string()));
        }
        self.frames.lock().unwrap().push(leds.to_vec());
        Ok(())
    }
}

#[async_trait]
impl Matrix for RecordingMatrix {
    fn geometry(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn at(&self, x: i32, y: i32) -> Color {
        position(x, y, self.width, self.height)
            .map(|pos| self.leds.lock().unwrap()[pos])
            .unwrap_or(Color::BLACK)
    }

    fn set(&self, x: i32, y: i32, color: Color) {
        if let Some(pos) = position(x, y, self.width, self.height) {
            self.leds.lock().unwrap()[pos] = color;
        }
    }

    fn render(&self) -> Result<()> {
        let leds = self.leds.lock().unwrap().clone();
        self.record(&leds)
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn set_brightness(&self, brightness: u8) {
        *self.brightness.lock().unwrap() = Some(brightness);
    }

    fn preload(&self, scene: MatrixScene) {
        *self.preloaded.lock().unwrap() += 1;
        self.preload
            .lock()
            .unwrap()
            .insert(&scene, self.width, self.height);
    }

    async fn play(
        &self,
        cancel: &CancellationToken,
        start_interval: Duration,
        updates: Option<&mut IntervalUpdates>,
    ) -> Result<()> {
        let frames = self.preload.lock().unwrap().take();
        play_frames(frames, cancel, start_interval, updates, |leds| {
            self.record(leds)
        })
        .await
    }
}
