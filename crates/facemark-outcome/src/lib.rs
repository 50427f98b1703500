//! Maps service replies onto the fixed set of user-facing outcomes.
//!
//! Interpretation is a single pass with no retained state. Recognition and
//! attendance are judged separately, and a recognized face without an
//! attendance confirmation is never reported as marked.

use facemark_types::{
    outcome::{
        AttendanceResult, CommandOutcome, EnrollmentOutcome, OutcomeKind, OutcomeView,
        RecognitionOutcome, ServiceResponse, Tone,
    },
    FacemarkError, Result,
};
use tracing::debug;

pub const BORDERLINE_NOTE: &str = "Borderline similarity — retry advised.";
const GENERIC_FAILURE: &str = "Recognition failed";
const UNKNOWN_REASON: &str = "unknown reason";

/// Classifies the result of one recognize submission. Transport failures
/// short-circuit. A refused reply that still carries a recognition record is
/// read like a successful one; any other refusal is a negative recognition
/// carrying the service's text.
pub fn interpret_recognition(reply: Result<ServiceResponse>) -> RecognitionOutcome {
    match reply {
        Ok(response) => classify_recognition(&response),
        Err(FacemarkError::Rejected { reply, .. }) if reply.get("recognized").is_some() => {
            classify_recognition(&reply)
        }
        Err(err @ (FacemarkError::Domain(_) | FacemarkError::Rejected { .. })) => {
            RecognitionOutcome::NotRecognized {
                reason: err.user_message(),
                score: None,
                borderline: false,
            }
        }
        Err(err) => RecognitionOutcome::TransportError {
            message: err.user_message(),
        },
    }
}

pub fn classify_recognition(response: &ServiceResponse) -> RecognitionOutcome {
    let score = response.number("score");
    let borderline = response.flag("borderline");

    if !response.flag("recognized") {
        let reason = response
            .text("reason")
            .or_else(|| response.text("error"))
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        return RecognitionOutcome::NotRecognized {
            reason,
            score,
            borderline,
        };
    }

    let attendance = response
        .field("attendance")
        .map(|att| AttendanceResult {
            success: att.flag("success"),
            reason: att.text("reason").map(str::to_owned),
        })
        .unwrap_or_else(AttendanceResult::not_confirmed);

    RecognitionOutcome::Recognized {
        name: response.text("name").unwrap_or_default().to_string(),
        score: score.unwrap_or(0.0),
        borderline,
        attendance,
    }
}

fn score_text(score: f64) -> String {
    format!("Score: {score:.2}")
}

fn with_note(mut message: String, borderline: bool) -> String {
    if borderline {
        message.push(' ');
        message.push_str(BORDERLINE_NOTE);
    }
    message
}

/// Renders an outcome into the panel text.
pub fn present(outcome: &RecognitionOutcome) -> OutcomeView {
    let view = match outcome {
        RecognitionOutcome::NotRecognized {
            reason,
            score,
            borderline,
        } => {
            let mut message = reason.clone();
            if let Some(score) = score {
                message.push_str(&format!(" ({})", score_text(*score)));
            }
            OutcomeView {
                kind: OutcomeKind::NotRecognized,
                tone: Tone::Error,
                borderline: *borderline,
                title: "Face Not Recognized".into(),
                message: with_note(message, *borderline),
            }
        }
        RecognitionOutcome::Recognized {
            name,
            score,
            borderline,
            attendance,
        } if attendance.success => OutcomeView {
            kind: OutcomeKind::AttendanceSuccess,
            tone: Tone::Success,
            borderline: *borderline,
            title: format!("Name: {name}"),
            message: with_note(
                format!("Attendance marked successfully! ({})", score_text(*score)),
                *borderline,
            ),
        },
        RecognitionOutcome::Recognized {
            name,
            score,
            borderline,
            attendance,
        } => OutcomeView {
            kind: OutcomeKind::AttendanceFailure,
            tone: Tone::Warning,
            borderline: *borderline,
            title: format!("Name: {name}"),
            message: format!(
                "Attendance NOT marked: {} ({})",
                attendance.reason.as_deref().unwrap_or(UNKNOWN_REASON),
                score_text(*score)
            ),
        },
        RecognitionOutcome::TransportError { message } => OutcomeView {
            kind: OutcomeKind::TransportError,
            tone: Tone::Error,
            borderline: false,
            title: "Network Error".into(),
            message: message.clone(),
        },
    };
    debug!("Outcome {:?}: {}", view.kind, view.message);
    view
}

pub fn interpret_enrollment(reply: Result<ServiceResponse>) -> EnrollmentOutcome {
    match reply {
        Ok(response) if response.text("status") == Some("pending") => {
            EnrollmentOutcome::Submitted {
                pending_id: response.number("pending_id").map(|id| id as i64),
            }
        }
        Ok(response) => EnrollmentOutcome::Rejected {
            message: response
                .text("error")
                .map(str::to_owned)
                .unwrap_or_else(|| response.as_value().to_string()),
        },
        Err(err @ (FacemarkError::Domain(_) | FacemarkError::Rejected { .. })) => {
            EnrollmentOutcome::Rejected {
                message: err.user_message(),
            }
        }
        Err(err) => EnrollmentOutcome::TransportError {
            message: err.user_message(),
        },
    }
}

/// Three-way classification of an approve reply.
pub fn interpret_approval(reply: Result<ServiceResponse>) -> CommandOutcome {
    classify_command(
        reply,
        "approved",
        |response| match user_id_text(response) {
            Some(id) => format!("Approved: User ID {id}"),
            None => "Approved".to_string(),
        },
        "Approval failed",
    )
}

fn user_id_text(response: &ServiceResponse) -> Option<String> {
    let id = response.get("user_id")?;
    Some(match (id.as_i64(), id.as_str()) {
        (Some(number), _) => number.to_string(),
        (None, Some(text)) => text.to_string(),
        _ => id.to_string(),
    })
}

pub fn interpret_rejection(reply: Result<ServiceResponse>, pending_id: i64) -> CommandOutcome {
    classify_command(
        reply,
        "rejected",
        |_| format!("Rejected pending enrollment ID {pending_id}"),
        "Rejection failed",
    )
}

fn classify_command(
    reply: Result<ServiceResponse>,
    success_status: &str,
    success_message: impl FnOnce(&ServiceResponse) -> String,
    generic_failure: &str,
) -> CommandOutcome {
    match reply {
        Ok(response) if response.text("status") == Some(success_status) => {
            CommandOutcome::Succeeded {
                message: success_message(&response),
            }
        }
        Ok(response) => match response.text("error") {
            Some(error) => CommandOutcome::DomainError {
                message: format!("Error: {error}"),
            },
            None => CommandOutcome::Failed {
                message: generic_failure.to_string(),
            },
        },
        Err(err @ (FacemarkError::Domain(_) | FacemarkError::Rejected { .. })) => {
            CommandOutcome::DomainError {
                message: format!("Error: {}", err.user_message()),
            }
        }
        Err(err) => CommandOutcome::Failed {
            message: format!("{generic_failure}: {}", err.user_message()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view_for(value: serde_json::Value) -> OutcomeView {
        present(&interpret_recognition(Ok(ServiceResponse::new(value))))
    }

    #[test]
    fn recognized_with_attendance_is_success() {
        let view = view_for(json!({
            "recognized": true,
            "score": 0.91,
            "name": "Alice",
            "attendance": {"success": true}
        }));
        assert_eq!(view.kind, OutcomeKind::AttendanceSuccess);
        assert!(view.message.contains("0.91"));
        assert!(!view.message.contains(BORDERLINE_NOTE));
        assert_eq!(view.title, "Name: Alice");
    }

    #[test]
    fn borderline_refused_attendance_is_failure() {
        let view = view_for(json!({
            "recognized": true,
            "score": 0.62,
            "borderline": true,
            "name": "Bob",
            "attendance": {"success": false, "reason": "duplicate"}
        }));
        assert_eq!(view.kind, OutcomeKind::AttendanceFailure);
        assert!(view.message.contains("duplicate"));
        assert!(view.message.contains("0.62"));
        assert!(view.borderline);
    }

    #[test]
    fn missing_attendance_fails_closed() {
        let outcome = interpret_recognition(Ok(ServiceResponse::new(json!({
            "recognized": true,
            "score": 0.97,
            "name": "Cara"
        }))));
        match &outcome {
            RecognitionOutcome::Recognized { attendance, .. } => assert!(!attendance.success),
            other => panic!("unexpected outcome {other:?}"),
        }
        let view = present(&outcome);
        assert_eq!(view.kind, OutcomeKind::AttendanceFailure);
        assert!(view.message.contains(UNKNOWN_REASON));
    }

    #[test]
    fn not_recognized_reason_precedence() {
        let with_reason = view_for(json!({"recognized": false, "reason": "Unknown user", "error": "x"}));
        assert!(with_reason.message.starts_with("Unknown user"));

        let with_error = view_for(json!({"recognized": false, "error": "Embedding failed"}));
        assert!(with_error.message.starts_with("Embedding failed"));

        let bare = view_for(json!({"recognized": false}));
        assert_eq!(bare.message, GENERIC_FAILURE);
    }

    #[test]
    fn not_recognized_appends_two_decimal_score_and_note() {
        let view = view_for(json!({
            "recognized": false,
            "reason": "Unknown user",
            "score": 0.7349,
            "borderline": true
        }));
        assert_eq!(view.kind, OutcomeKind::NotRecognized);
        assert_eq!(
            view.message,
            format!("Unknown user (Score: 0.73) {BORDERLINE_NOTE}")
        );
    }

    #[test]
    fn non_numeric_score_is_not_appended() {
        let view = view_for(json!({"recognized": false, "reason": "No face", "score": "high"}));
        assert_eq!(view.message, "No face");
    }

    #[test]
    fn borderline_success_carries_note() {
        let view = view_for(json!({
            "recognized": true,
            "score": 0.88,
            "borderline": true,
            "name": "Dee",
            "attendance": {"success": true}
        }));
        assert_eq!(view.kind, OutcomeKind::AttendanceSuccess);
        assert!(view.message.ends_with(BORDERLINE_NOTE));
    }

    #[test]
    fn transport_failure_short_circuits() {
        let outcome = interpret_recognition(Err(FacemarkError::Transport(
            "connection refused".into(),
        )));
        let view = present(&outcome);
        assert_eq!(view.kind, OutcomeKind::TransportError);
        assert_eq!(view.message, "connection refused");
    }

    #[test]
    fn domain_rejection_reads_as_not_recognized() {
        let outcome = interpret_recognition(Err(FacemarkError::Domain("invalid image".into())));
        assert_eq!(present(&outcome).kind, OutcomeKind::NotRecognized);
    }

    #[test]
    fn refused_recognition_record_keeps_score_and_note() {
        let outcome = interpret_recognition(Err(FacemarkError::Rejected {
            status: 500,
            reply: ServiceResponse::new(json!({
                "recognized": false,
                "error": "Face alignment failed",
                "details": "x",
                "score": 0
            })),
        }));
        let view = present(&outcome);
        assert_eq!(view.kind, OutcomeKind::NotRecognized);
        assert_eq!(view.message, "Face alignment failed (Score: 0.00)");

        let borderline = present(&interpret_recognition(Err(FacemarkError::Rejected {
            status: 400,
            reply: ServiceResponse::new(json!({
                "recognized": false,
                "reason": "Embedding failed",
                "error": "ignored",
                "score": 0.5,
                "borderline": true
            })),
        })));
        assert_eq!(
            borderline.message,
            format!("Embedding failed (Score: 0.50) {BORDERLINE_NOTE}")
        );
    }

    #[test]
    fn refusal_without_record_uses_error_text() {
        let outcome = interpret_recognition(Err(FacemarkError::Rejected {
            status: 400,
            reply: ServiceResponse::new(json!({"error": "image required"})),
        }));
        let view = present(&outcome);
        assert_eq!(view.kind, OutcomeKind::NotRecognized);
        assert_eq!(view.message, "image required");
    }

    #[test]
    fn enrollment_replies() {
        let ok = interpret_enrollment(Ok(ServiceResponse::new(
            json!({"status": "pending", "pending_id": 5}),
        )));
        assert_eq!(ok, EnrollmentOutcome::Submitted { pending_id: Some(5) });

        let refused = interpret_enrollment(Err(FacemarkError::Domain(
            "name and images required".into(),
        )));
        assert_eq!(refused.status_text(), "Error: name and images required");

        let offline = interpret_enrollment(Err(FacemarkError::Transport("down".into())));
        assert_eq!(offline.status_text(), "Network error. Server not reachable");
    }

    #[test]
    fn approval_replies_fall_in_three_buckets() {
        let ok = interpret_approval(Ok(ServiceResponse::new(
            json!({"status": "approved", "user_id": 9}),
        )));
        assert_eq!(ok.message(), "Approved: User ID 9");

        let domain = interpret_approval(Ok(ServiceResponse::new(json!({"error": "not found"}))));
        assert!(matches!(domain, CommandOutcome::DomainError { .. }));
        assert!(domain.message().contains("not found"));

        let refused = interpret_approval(Err(FacemarkError::Rejected {
            status: 404,
            reply: ServiceResponse::new(json!({"error": "pending not found"})),
        }));
        assert_eq!(refused.message(), "Error: pending not found");

        let empty = interpret_approval(Ok(ServiceResponse::new(json!({}))));
        assert_eq!(
            empty,
            CommandOutcome::Failed {
                message: "Approval failed".into()
            }
        );
    }

    #[test]
    fn approval_user_id_is_printed_bare() {
        let textual = interpret_approval(Ok(ServiceResponse::new(
            json!({"status": "approved", "user_id": "7"}),
        )));
        assert_eq!(textual.message(), "Approved: User ID 7");

        let missing = interpret_approval(Ok(ServiceResponse::new(json!({"status": "approved"}))));
        assert_eq!(missing.message(), "Approved");
    }

    #[test]
    fn rejection_transport_failure_is_generic_failure() {
        let outcome = interpret_rejection(Err(FacemarkError::Transport("timeout".into())), 4);
        assert_eq!(
            outcome,
            CommandOutcome::Failed {
                message: "Rejection failed: timeout".into()
            }
        );
    }
}
