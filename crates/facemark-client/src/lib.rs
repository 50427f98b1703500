//! Submission client for the recognition and moderation service.
//!
//! Every call is attempted exactly once. Network failures, non-2xx replies and
//! malformed bodies surface as [`FacemarkError::Transport`]; a non-2xx reply
//! carrying a JSON `error` string surfaces as [`FacemarkError::Rejected`].

use async_trait::async_trait;
use facemark_types::{
    capture::{CaptureFrame, CapturePayload},
    outcome::ServiceResponse,
    records::{AttendanceEntry, AttendanceFilter, AttendanceRow, PendingRecord, UserRecord},
    FacemarkError, Result,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::{MockTransport, Reply};

pub mod endpoints {
    pub const ENROLL: &str = "/api/enroll";
    pub const RECOGNIZE: &str = "/api/recognize";
    pub const PENDING: &str = "/api/admin/pending";
    pub const APPROVE: &str = "/api/admin/approve";
    pub const REJECT: &str = "/api/admin/reject";
    pub const USERS: &str = "/api/admin/users";
    pub const UPDATE_USER: &str = "/api/admin/update_user";
    pub const DELETE_USER: &str = "/api/admin/delete_user";
    pub const ADMIN_ATTENDANCE: &str = "/api/admin/attendance";
    pub const USER_ATTENDANCE: &str = "/api/user/attendance";
    pub const SAVE_NOTE: &str = "/api/user/save_note";
    pub const LOGIN: &str = "/admin/login";
}

/// Raw JSON exchange with the service, relative to its base URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<ServiceResponse>;
    async fn post_json(&self, path: &str, body: &Value) -> Result<ServiceResponse>;
}

/// Typed view of the service endpoints over a [`Transport`].
pub struct SubmissionClient<T: Transport> {
    transport: T,
}

impl<T: Transport> SubmissionClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Posts a capture payload once and returns the untyped reply.
    pub async fn submit(&self, endpoint: &str, payload: &CapturePayload) -> Result<ServiceResponse> {
        let body = serde_json::to_value(payload)
            .map_err(|err| transport_error(format!("failed to encode payload: {err}")))?;
        debug!(
            "Submitting {} frame(s) to {}",
            payload.frame_count(),
            endpoint
        );
        self.transport.post_json(endpoint, &body).await
    }

    pub async fn recognize(&self, image: CaptureFrame, device: &str) -> Result<ServiceResponse> {
        self.submit(
            endpoints::RECOGNIZE,
            &CapturePayload::recognition(image, device),
        )
        .await
    }

    pub async fn enroll(&self, name: &str, images: Vec<CaptureFrame>) -> Result<ServiceResponse> {
        self.submit(endpoints::ENROLL, &CapturePayload::enrollment(name, images))
            .await
    }

    pub async fn pending(&self) -> Result<Vec<PendingRecord>> {
        let reply = self.transport.get_json(endpoints::PENDING).await?;
        decode_rows(reply)
    }

    pub async fn users(&self) -> Result<Vec<UserRecord>> {
        let reply = self.transport.get_json(endpoints::USERS).await?;
        decode_rows(reply)
    }

    pub async fn approve(&self, pending_id: i64) -> Result<ServiceResponse> {
        self.transport
            .post_json(endpoints::APPROVE, &json!({ "pending_id": pending_id }))
            .await
    }

    pub async fn reject(&self, pending_id: i64) -> Result<ServiceResponse> {
        self.transport
            .post_json(endpoints::REJECT, &json!({ "pending_id": pending_id }))
            .await
    }

    pub async fn update_user(&self, id: i64, name: &str) -> Result<ServiceResponse> {
        self.transport
            .post_json(endpoints::UPDATE_USER, &json!({ "id": id, "name": name }))
            .await
    }

    pub async fn delete_user(&self, id: i64) -> Result<ServiceResponse> {
        self.transport
            .post_json(endpoints::DELETE_USER, &json!({ "id": id }))
            .await
    }

    pub async fn save_note(&self, id: i64, note: &str) -> Result<ServiceResponse> {
        self.transport
            .post_json(endpoints::SAVE_NOTE, &json!({ "id": id, "note": note }))
            .await
    }

    pub async fn user_attendance(&self, user_id: i64) -> Result<Vec<AttendanceEntry>> {
        let reply = self
            .transport
            .post_json(endpoints::USER_ATTENDANCE, &json!({ "user_id": user_id }))
            .await?;
        decode_rows(reply)
    }

    pub async fn attendance_report(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRow>> {
        let body = serde_json::to_value(filter)
            .map_err(|err| transport_error(format!("failed to encode filter: {err}")))?;
        let reply = self
            .transport
            .post_json(endpoints::ADMIN_ATTENDANCE, &body)
            .await?;
        decode_rows(reply)
    }
}

/// Classifies one HTTP reply. Shared by every transport so the rules live in
/// one place.
pub fn classify_reply(status: u16, body: &str) -> Result<ServiceResponse> {
    let parsed = serde_json::from_str::<Value>(body);
    if (200..300).contains(&status) {
        return parsed
            .map(ServiceResponse::new)
            .map_err(|err| transport_error(format!("malformed response body: {err}")));
    }

    if let Ok(value) = parsed {
        let reply = ServiceResponse::new(value);
        if reply.text("error").is_some() {
            return Err(FacemarkError::Rejected { status, reply });
        }
    }
    Err(transport_error(format!(
        "request failed with status {status}: {}",
        body.trim()
    )))
}

fn decode_rows<R: DeserializeOwned>(reply: ServiceResponse) -> Result<Vec<R>> {
    serde_json::from_value(reply.into_value())
        .map_err(|err| transport_error(format!("unexpected list shape: {err}")))
}

pub fn transport_error(message: impl Into<String>) -> FacemarkError {
    FacemarkError::Transport(message.into())
}
