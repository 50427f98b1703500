use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Instant,
};

use async_trait::async_trait;
use facemark_types::{
    capture::{CaptureFrame, Resolution},
    config::CameraConfig,
    FacemarkError, Result,
};
use image::GenericImageView;
use tokio::process::Command;

use crate::{capture_error, encode, FrameSource};

/// Draw counters for a physical camera.
#[derive(Debug, Default, Clone)]
pub struct CameraMetrics {
    pub last_draw_ms: Option<u64>,
    pub successful_draws: u64,
    pub failed_draws: u64,
}

/// Camera driven through an external grabber (`ffmpeg`, `fswebcam`, ...)
/// that prints one encoded still to stdout per invocation.
pub struct CommandFrameSource {
    program: PathBuf,
    args: Vec<String>,
    native: Option<Resolution>,
    streaming: bool,
    metrics: Arc<Mutex<CameraMetrics>>,
}

impl CommandFrameSource {
    pub fn new(config: &CameraConfig) -> Result<Self> {
        let (program, args) = config.command.split_first().ok_or_else(|| {
            FacemarkError::Configuration("camera.command must name a program".into())
        })?;

        Ok(Self {
            program: PathBuf::from(program),
            args: args.to_vec(),
            native: config.native_resolution,
            streaming: false,
            metrics: Arc::new(Mutex::new(CameraMetrics::default())),
        })
    }

    async fn grab_raw(&self) -> Result<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|err| {
                FacemarkError::DeviceUnavailable(format!(
                    "failed to run {}: {err}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            return Err(FacemarkError::DeviceUnavailable(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(capture_error("camera produced an empty frame"));
        }
        Ok(output.stdout)
    }

    fn record(&self, start: Instant, ok: bool) {
        if let Ok(mut guard) = self.metrics.lock() {
            if ok {
                guard.successful_draws += 1;
                guard.last_draw_ms = Some(start.elapsed().as_millis() as u64);
            } else {
                guard.failed_draws += 1;
            }
        }
    }

    pub fn metrics(&self) -> CameraMetrics {
        self.metrics.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FrameSource for CommandFrameSource {
    async fn start(&mut self) -> Result<()> {
        tracing::info!("Acquiring camera via {}", self.program.display());
        let raw = self.grab_raw().await?;
        let still = encode::decode_still(&raw)
            .map_err(|err| FacemarkError::DeviceUnavailable(err.user_message()))?;
        if self.native.is_none() {
            self.native = Some(Resolution::new(still.width(), still.height()));
        }
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
        let start = Instant::now();
        let result = match self.grab_raw().await {
            Ok(raw) => encode::decode_still(&raw)
                .and_then(|still| encode::encode_frame(&still, surface, quality)),
            Err(err) => Err(err),
        };
        self.record(start, result.is_ok());
        if let Err(err) = &result {
            tracing::warn!("Camera draw failed: {err}");
        }
        result
    }
}
