use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Which flow a draw is framed for. Decides the fallback draw surface when the
/// device has not reported its native resolution yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Framing {
    Enrollment,
    Recognition,
}

impl Framing {
    pub const fn fallback_resolution(self) -> Resolution {
        match self {
            Framing::Enrollment => Resolution::new(480, 360),
            Framing::Recognition => Resolution::new(640, 480),
        }
    }
}

/// One encoded still image. Serializes as its data URL, which is the form the
/// service expects inside request bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureFrame {
    resolution: Resolution,
    encoded: String,
    captured_at: DateTime<Utc>,
}

impl CaptureFrame {
    pub fn new(resolution: Resolution, encoded: impl Into<String>) -> Self {
        Self {
            resolution,
            encoded: encoded.into(),
            captured_at: Utc::now(),
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl Serialize for CaptureFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

/// Request body for the two capture endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CapturePayload {
    Recognition { image: CaptureFrame, device: String },
    Enrollment { name: String, images: Vec<CaptureFrame> },
}

impl CapturePayload {
    pub fn recognition(image: CaptureFrame, device: impl Into<String>) -> Self {
        CapturePayload::Recognition {
            image,
            device: device.into(),
        }
    }

    pub fn enrollment(name: impl Into<String>, images: Vec<CaptureFrame>) -> Self {
        CapturePayload::Enrollment {
            name: name.into(),
            images,
        }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            CapturePayload::Recognition { .. } => 1,
            CapturePayload::Enrollment { images, .. } => images.len(),
        }
    }
}
