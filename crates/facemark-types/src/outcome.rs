use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Untyped JSON reply from the service. Field lookups follow the loose
/// truthiness the service relies on: a missing field and `null` read the same.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceResponse(Value);

impl ServiceResponse {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).map(truthy).unwrap_or(false)
    }

    /// Non-empty string field.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn field(&self, key: &str) -> Option<ServiceResponse> {
        self.get(key).cloned().map(ServiceResponse)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for ServiceResponse {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceResult {
    pub success: bool,
    pub reason: Option<String>,
}

impl AttendanceResult {
    pub fn not_confirmed() -> Self {
        Self {
            success: false,
            reason: None,
        }
    }
}

/// Classified reply of the recognize endpoint. Recognition and attendance are
/// kept apart: a matched face may still have its attendance refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecognitionOutcome {
    NotRecognized {
        reason: String,
        score: Option<f64>,
        borderline: bool,
    },
    Recognized {
        name: String,
        score: f64,
        borderline: bool,
        attendance: AttendanceResult,
    },
    TransportError {
        message: String,
    },
}

/// The user-facing buckets a recognition attempt can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    NotRecognized,
    AttendanceSuccess,
    AttendanceFailure,
    TransportError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Success,
    Warning,
    Error,
}

/// What a status sink displays after one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeView {
    pub kind: OutcomeKind,
    pub tone: Tone,
    pub borderline: bool,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentOutcome {
    Submitted { pending_id: Option<i64> },
    Rejected { message: String },
    TransportError { message: String },
}

impl EnrollmentOutcome {
    pub fn status_text(&self) -> String {
        match self {
            EnrollmentOutcome::Submitted { .. } => {
                "Enrollment submitted (waiting for admin approval)".to_string()
            }
            EnrollmentOutcome::Rejected { message } => format!("Error: {message}"),
            EnrollmentOutcome::TransportError { .. } => {
                "Network error. Server not reachable".to_string()
            }
        }
    }
}

/// Three-way classification of a moderation command reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutcome {
    Succeeded { message: String },
    DomainError { message: String },
    Failed { message: String },
}

impl CommandOutcome {
    pub fn message(&self) -> &str {
        match self {
            CommandOutcome::Succeeded { message }
            | CommandOutcome::DomainError { message }
            | CommandOutcome::Failed { message } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Succeeded { .. })
    }
}
