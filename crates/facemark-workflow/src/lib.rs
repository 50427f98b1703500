//! Capture flows: draw frames, submit them once, classify the reply and render
//! it. Each flow runs behind its own trigger so one control never has two
//! submissions in flight.

use std::sync::Arc;

use facemark_capture::{CaptureSession, FrameSource};
use facemark_client::{SubmissionClient, Transport};
use facemark_ops::ActivityLog;
use facemark_outcome::{interpret_enrollment, interpret_recognition, present};
use facemark_types::{
    activity::{ActivityEvent, ActivityKind, ActivityPayload},
    capture::Framing,
    outcome::{EnrollmentOutcome, OutcomeView, RecognitionOutcome},
    ui::StatusView,
    FacemarkError, Result,
};
use tokio::time::{Duration, Instant};
use tracing::{info, warn};

pub mod trigger;

pub use trigger::{Trigger, TriggerGuard};

pub struct CaptureWorkflow<S, T>
where
    S: FrameSource,
    T: Transport,
{
    session: CaptureSession<S>,
    client: Arc<SubmissionClient<T>>,
    status: Arc<dyn StatusView>,
    activity: ActivityLog,
    device_tag: String,
    enroll_trigger: Trigger,
    mark_trigger: Trigger,
}

impl<S, T> CaptureWorkflow<S, T>
where
    S: FrameSource,
    T: Transport,
{
    pub fn new(
        session: CaptureSession<S>,
        client: Arc<SubmissionClient<T>>,
        status: Arc<dyn StatusView>,
        activity: ActivityLog,
        device_tag: impl Into<String>,
    ) -> Self {
        Self {
            session,
            client,
            status,
            activity,
            device_tag: device_tag.into(),
            enroll_trigger: Trigger::new("enrollment"),
            mark_trigger: Trigger::new("attendance marking"),
        }
    }

    pub fn session(&self) -> &CaptureSession<S> {
        &self.session
    }

    /// Acquires the camera. On failure the operator is told and every later
    /// capture fails fast until the flow is restarted.
    pub async fn start_camera(&mut self) -> Result<()> {
        if let Err(err) = self.session.start().await {
            self.status
                .set_status(&format!("Camera error: {}", err.user_message()));
            return Err(err);
        }
        Ok(())
    }

    /// Captures one frame, submits it for recognition and shows the outcome.
    pub async fn mark_attendance(&self) -> Result<OutcomeView> {
        let _guard = self.mark_trigger.try_acquire()?;
        self.status.set_status("Processing...");

        let frame = self
            .session
            .capture_one(Framing::Recognition)
            .await
            .map_err(|err| {
                warn!("Recognition capture aborted: {err}");
                self.status.set_status(&err.user_message());
                err
            })?;
        let outcome = interpret_recognition(self.client.recognize(frame, &self.device_tag).await);
        let view = present(&outcome);
        self.status.show(&view);

        let name = match &outcome {
            RecognitionOutcome::Recognized { name, .. } => Some(name.clone()),
            _ => None,
        };
        info!("Recognition finished: {:?}", view.kind);
        self.activity
            .record(ActivityEvent::new(
                ActivityKind::Recognition,
                ActivityPayload::Recognized {
                    outcome: view.kind,
                    name,
                },
            ))
            .await;
        Ok(view)
    }

    /// Captures the enrollment burst for `name` and submits it for approval.
    pub async fn enroll(&self, name: &str) -> Result<EnrollmentOutcome> {
        let name = name.trim();
        if name.is_empty() {
            self.status.set_status("Enter name");
            return Err(FacemarkError::Domain("Enter name".into()));
        }
        let _guard = self.enroll_trigger.try_acquire()?;

        self.status.set_status("Capturing images...");
        let config = self.session.config();
        let started = Instant::now();
        let frames = self
            .session
            .capture_sequence(
                Framing::Enrollment,
                config.enrollment_frames,
                Duration::from_millis(config.enrollment_interval_ms),
            )
            .await
            .map_err(|err| {
                warn!("Enrollment capture aborted: {err}");
                self.status.set_status(&err.user_message());
                err
            })?;
        self.activity
            .record(ActivityEvent::new(
                ActivityKind::Capture,
                ActivityPayload::FramesCaptured {
                    count: frames.len(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                },
            ))
            .await;

        self.status.set_status("Uploading, please wait...");
        let outcome = interpret_enrollment(self.client.enroll(name, frames).await);
        self.status.set_status(&outcome.status_text());

        self.activity
            .record(ActivityEvent::new(
                ActivityKind::Enrollment,
                ActivityPayload::EnrollmentSubmitted {
                    name: name.to_string(),
                    accepted: matches!(outcome, EnrollmentOutcome::Submitted { .. }),
                },
            ))
            .await;
        Ok(outcome)
    }
}
