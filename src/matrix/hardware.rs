//! A real panel driven through `rpi-led-matrix`.
//!
//! The C library is not thread-safe, so the `LedMatrix` lives on one
//! dedicated thread. `HardwareMatrix` keeps a shadow copy of the LEDs and
//! ships finished frames to that thread over an `mpsc` channel, which makes
//! the driver itself `Send + Sync` and usable from async scroll loops.
//!
//! ## Rust concepts
//! - Moving ownership of a `!Send` resource into a thread that never gives it back
//! - `sync_channel(1)` to report whether initialization succeeded

use super::{IntervalUpdates, Matrix, MatrixScene, SceneQueue, play_frames, position};
use crate::{Color, Error, PanelConfig, Result};
use async_trait::async_trait;
use rpi_led_matrix::{LedMatrix, LedMatrixOptions, LedRuntimeOptions};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

enum DriverCommand {
    Frame(Vec<Color>),
    Brightness(u8),
    Close,
}

pub struct HardwareMatrix {
    panel: PanelConfig,
    leds: Mutex<Vec<Color>>,
    preload: Mutex<SceneQueue>,
    tx: Mutex<Sender<DriverCommand>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create a matrix configured for our hardware:
/// Pi Zero 2 W + Adafruit Bonnet + configurable panel size.
fn create_matrix(panel: PanelConfig) -> std::result::Result<LedMatrix, Box<dyn std::error::Error>> {
    let mut options = LedMatrixOptions::new();
    options.set_rows(panel.rows);
    options.set_cols(panel.cols);
    options.set_hardware_mapping("adafruit-hat");
    options.set_pwm_bits(8)?;
    options.set_pwm_lsb_nanoseconds(130);

    let mut rt_options = LedRuntimeOptions::new();
    rt_options.set_gpio_slowdown(2); // Pi Zero 2 W requires slowdown=2

    let matrix = LedMatrix::new(Some(options), Some(rt_options))?;
    Ok(matrix)
}

/// Owns the panel. Runs until `Close` arrives or every sender is dropped.
fn driver_loop(
    panel: PanelConfig,
    rx: Receiver<DriverCommand>,
    ready: SyncSender<std::result::Result<(), String>>,
) {
    let matrix = match create_matrix(panel) {
        Ok(m) => {
            let _ = ready.send(Ok(()));
            m
        }
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    let mut canvas = matrix.offscreen_canvas();
    let mut brightness = 100u8;
    let cols = panel.cols.max(1) as usize;

    while let Ok(cmd) = rx.recv() {
        match cmd {
            DriverCommand::Frame(leds) => {
                for (i, led) in leds.iter().enumerate() {
                    let c = led.apply_brightness(brightness);
                    canvas.set((i % cols) as i32, (i / cols) as i32, &c.into());
                }
                canvas = matrix.swap(canvas);
            }
            DriverCommand::Brightness(value) => {
                brightness = value.min(100);
            }
            DriverCommand::Close => {
                canvas.clear();
                matrix.swap(canvas);
                break;
            }
        }
    }

    tracing::info!("Matrix driver thread stopped");
}

impl HardwareMatrix {
    pub fn new(panel: PanelConfig) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let handle = thread::Builder::new()
            .name("matrix-driver".to_string())
            .spawn(move || driver_loop(panel, rx, ready_tx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::Driver(format!("failed to initialize LED matrix: {e}"))),
            Err(_) => return Err(Error::Driver("matrix driver thread exited".to_string())),
        }

        tracing::info!("LED matrix ready: {}x{}", panel.cols, panel.rows);

        Ok(Self {
            panel,
            leds: Mutex::new(vec![Color::BLACK; panel.pixel_count()]),
            preload: Mutex::new(SceneQueue::default()),
            tx: Mutex::new(tx),
            thread: Mutex::new(Some(handle)),
        })
    }

    fn send(&self, cmd: DriverCommand) -> Result<()> {
        lock(&self.tx)
            .send(cmd)
            .map_err(|_| Error::Driver("matrix driver thread gone".to_string()))
    }
}

#[async_trait]
impl Matrix for HardwareMatrix {
    fn geometry(&self) -> (i32, i32) {
        self.panel.geometry()
    }

    fn at(&self, x: i32, y: i32) -> Color {
        let (w, h) = self.geometry();
        position(x, y, w, h)
            .map(|pos| lock(&self.leds)[pos])
            .unwrap_or(Color::BLACK)
    }

    fn set(&self, x: i32, y: i32, color: Color) {
        let (w, h) = self.geometry();
        if let Some(pos) = position(x, y, w, h) {
            lock(&self.leds)[pos] = color;
        }
    }

    fn render(&self) -> Result<()> {
        let leds = lock(&self.leds).clone();
        self.send(DriverCommand::Frame(leds))
    }

    fn close(&self) -> Result<()> {
        if let Some(handle) = lock(&self.thread).take() {
            let _ = self.send(DriverCommand::Close);
            handle
                .join()
                .map_err(|_| Error::Driver("matrix driver thread panicked".to_string()))?;
        }
        Ok(())
    }

    fn set_brightness(&self, brightness: u8) {
        if let Err(e) = self.send(DriverCommand::Brightness(brightness)) {
            tracing::warn!("Failed to set brightness: {}", e);
        }
    }

    fn preload(&self, scene: MatrixScene) {
        let (w, h) = self.geometry();
        lock(&self.preload).insert(&scene, w, h);
    }

    async fn play(
        &self,
        cancel: &CancellationToken,
        start_interval: Duration,
        updates: Option<&mut IntervalUpdates>,
    ) -> Result<()> {
        let frames = lock(&self.preload).take();
        play_frames(frames, cancel, start_interval, updates, |leds| {
            self.send(DriverCommand::Frame(leds.to_vec()))
        })
        .await
    }
}
