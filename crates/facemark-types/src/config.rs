use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{capture::Resolution, FacemarkError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Program and arguments that write one encoded frame to stdout.
    pub command: Vec<String>,
    pub native_resolution: Option<Resolution>,
    pub device_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub enrollment_frames: usize,
    pub enrollment_interval_ms: u64,
    pub enrollment_quality: u8,
    pub recognition_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enrollment_frames: 15,
            enrollment_interval_ms: 250,
            enrollment_quality: 80,
            recognition_quality: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacemarkConfig {
    pub camera: CameraConfig,
    pub service: ServiceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    pub ops: OpsConfig,
}

impl FacemarkConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            FacemarkError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            FacemarkError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.camera.command.is_empty() {
            return Err(FacemarkError::Configuration(
                "camera.command must name a program".into(),
            ));
        }
        if self.camera.device_tag.trim().is_empty() {
            return Err(FacemarkError::Configuration(
                "camera.device_tag must not be blank".into(),
            ));
        }
        if !self.service.base_url.starts_with("http://")
            && !self.service.base_url.starts_with("https://")
        {
            return Err(FacemarkError::Configuration(
                "service.base_url must be an http(s) URL".into(),
            ));
        }
        if self.service.timeout_ms == 0 {
            return Err(FacemarkError::Configuration(
                "service.timeout_ms must be greater than zero".into(),
            ));
        }
        if self.capture.enrollment_frames == 0 {
            return Err(FacemarkError::Configuration(
                "capture.enrollment_frames must be greater than zero".into(),
            ));
        }
        for (field, quality) in [
            ("enrollment_quality", self.capture.enrollment_quality),
            ("recognition_quality", self.capture.recognition_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(FacemarkError::Configuration(format!(
                    "capture.{field} must be between 1 and 100"
                )));
            }
        }
        Ok(())
    }
}
