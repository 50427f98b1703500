//! Camera abstraction and multi-frame capture sessions.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use facemark_types::{
    capture::{CaptureFrame, Framing, Resolution},
    config::CaptureConfig,
    FacemarkError, Result,
};
use image::{DynamicImage, Rgb, RgbImage};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, info};

pub mod camera;
pub mod encode;

pub use camera::CommandFrameSource;

/// A live video device that can hand out stills of its current frame.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Acquires the device. Must resolve before any draw.
    async fn start(&mut self) -> Result<()>;
    fn is_streaming(&self) -> bool;
    /// Resolution the device reported, if it has reported one yet.
    fn native_resolution(&self) -> Option<Resolution>;
    async fn draw(&self, surface: Resolution, quality: u8) -> Result<CaptureFrame>;
}

#[async_trait]
impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    async fn start(&mut self) -> Result<()> {
        (**self).start().await
    }

    fn is_streaming(&self) -> bool {
        (**self).is_streaming()
    }

    fn native_resolution(&self) -> Option<Resolution> {
        (**self).native_resolution()
    }

    async fn draw(&self, surface: Resolution, quality: u8) -> Result<CaptureFrame> {
        (**self).draw(surface, quality).await
    }
}

/// Owns one frame source for the lifetime of a page context and turns draws
/// into frames for the enrollment and recognition flows.
pub struct CaptureSession<S: FrameSource> {
    source: S,
    config: CaptureConfig,
}

impl<S: FrameSource> CaptureSession<S> {
    pub fn new(source: S, config: CaptureConfig) -> Self {
        Self { source, config }
    }

    /// Acquires the device once. Failure is fatal for this session.
    pub async fn start(&mut self) -> Result<()> {
        self.source.start().await.map_err(|err| match err {
            FacemarkError::DeviceUnavailable(_) => err,
            other => FacemarkError::DeviceUnavailable(other.user_message()),
        })?;
        info!(
            "Camera ready (native resolution: {:?})",
            self.source.native_resolution()
        );
        Ok(())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn surface(&self, framing: Framing) -> Resolution {
        self.source
            .native_resolution()
            .unwrap_or_else(|| framing.fallback_resolution())
    }

    fn quality(&self, framing: Framing) -> u8 {
        match framing {
            Framing::Enrollment => self.config.enrollment_quality,
            Framing::Recognition => self.config.recognition_quality,
        }
    }

    fn ensure_streaming(&self) -> Result<()> {
        if self.source.is_streaming() {
            Ok(())
        } else {
            Err(FacemarkError::DeviceUnavailable(
                "camera has not been started".into(),
            ))
        }
    }

    pub async fn capture_one(&self, framing: Framing) -> Result<CaptureFrame> {
        self.ensure_streaming()?;
        self.source
            .draw(self.surface(framing), self.quality(framing))
            .await
    }

    /// Draws `count` frames, starting each one no sooner than `interval` after
    /// the previous draw started. Any failed draw aborts the sequence.
    pub async fn capture_sequence(
        &self,
        framing: Framing,
        count: usize,
        interval: Duration,
    ) -> Result<Vec<CaptureFrame>> {
        self.ensure_streaming()?;
        let surface = self.surface(framing);
        let quality = self.quality(framing);
        let mut frames = Vec::with_capacity(count);
        let mut next_draw = Instant::now();

        for index in 0..count {
            sleep_until(next_draw).await;
            let started = Instant::now();
            next_draw = started + interval;
            frames.push(self.source.draw(surface, quality).await?);
            debug!("Captured frame {}/{}", index + 1, count);
        }
        Ok(frames)
    }
}

/// In-process source returning flat grey frames; used by tests and the CLI's
/// `--mock-camera` mode.
#[derive(Clone, Default)]
pub struct MockFrameSource {
    streaming: bool,
    unavailable: bool,
    failing_draws: bool,
    native: Option<Resolution>,
    draw_delay: Duration,
    draws: Arc<Mutex<Vec<Instant>>>,
}

impl MockFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native_resolution(mut self, resolution: Resolution) -> Self {
        self.native = Some(resolution);
        self
    }

    /// Simulated time each draw takes.
    pub fn with_draw_delay(mut self, delay: Duration) -> Self {
        self.draw_delay = delay;
        self
    }

    /// A source whose acquisition always fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// A source that starts streaming but whose every draw fails.
    pub fn with_failing_draws(mut self) -> Self {
        self.failing_draws = true;
        self
    }

    /// Start instants of every draw so far.
    pub fn draw_log(&self) -> Vec<Instant> {
        self.draws.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FrameSource for MockFrameSource {
    async fn start(&mut self) -> Result<()> {
        if self.unavailable {
            return Err(FacemarkError::DeviceUnavailable(
                "permission denied by mock device".into(),
            ));
        }
        info!("Starting mock camera");
        self.streaming = true;
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.streaming
    }

    fn native_resolution(&self) -> Option<Resolution> {
        self.native
    }

    async fn draw(&self, surface: Resolution, quality: u8) -> Result<CaptureFrame> {
        self.draws
            .lock()
            .map_err(|_| capture_error("failed to lock draw log"))?
            .push(Instant::now());
        if !self.draw_delay.is_zero() {
            tokio::time::sleep(self.draw_delay).await;
        }
        if self.failing_draws {
            return Err(capture_error("mock camera dropped the frame"));
        }
        let still = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 12, Rgb([128, 128, 128])));
        encode::encode_frame(&still, surface, quality)
    }
}

/// Generate an error aligned with capture semantics.
pub fn capture_error(message: impl Into<String>) -> FacemarkError {
    FacemarkError::Capture(message.into())
}
