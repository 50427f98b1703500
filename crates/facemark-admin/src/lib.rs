//! Moderation queue controller.
//!
//! Every approve/reject is a two-phase operation: run the command, then
//! resynchronize the affected list views from the service whatever the command
//! returned. The views are never patched locally.

use std::sync::Arc;

use facemark_client::{SubmissionClient, Transport};
use facemark_ops::ActivityLog;
use facemark_outcome::{interpret_approval, interpret_rejection};
use facemark_types::{
    activity::{ActivityEvent, ActivityKind, ActivityPayload},
    outcome::CommandOutcome,
    records::{AttendanceEntry, AttendanceFilter, AttendanceRow, PendingRow, UserRecord},
    ui::{ListView, NoticeLevel, Notifier},
    FacemarkError, Result,
};
use tracing::{info, warn};

/// Render targets of the admin pages, constructed once at startup.
#[derive(Clone)]
pub struct AdminViews {
    pub pending: Arc<dyn ListView<PendingRow>>,
    pub users: Arc<dyn ListView<UserRecord>>,
    pub history: Arc<dyn ListView<AttendanceEntry>>,
    pub report: Arc<dyn ListView<AttendanceRow>>,
    pub notifier: Arc<dyn Notifier>,
}

/// Which views a command invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resync {
    Pending,
    PendingAndUsers,
    Users,
}

pub struct ApprovalQueueController<T: Transport> {
    client: Arc<SubmissionClient<T>>,
    views: AdminViews,
    activity: ActivityLog,
}

impl<T: Transport> ApprovalQueueController<T> {
    pub fn new(client: Arc<SubmissionClient<T>>, views: AdminViews, activity: ActivityLog) -> Self {
        Self {
            client,
            views,
            activity,
        }
    }

    /// Fetches the queue and replaces the pending view. An empty queue renders
    /// a single placeholder row. On failure the view is left as it was.
    pub async fn load_pending(&self) -> Result<usize> {
        match self.client.pending().await {
            Ok(records) => {
                let rows = PendingRow::rows_for(records);
                self.views.pending.render(&rows);
                Ok(rows.len())
            }
            Err(err) => Err(self.load_failed("pending enrollments", err)),
        }
    }

    pub async fn load_users(&self) -> Result<usize> {
        match self.client.users().await {
            Ok(users) => {
                self.views.users.render(&users);
                Ok(users.len())
            }
            Err(err) => Err(self.load_failed("users", err)),
        }
    }

    pub async fn approve(&self, pending_id: i64) -> CommandOutcome {
        let outcome = interpret_approval(self.client.approve(pending_id).await);
        self.finish_command("approve", pending_id, &outcome).await;
        self.resync(Resync::PendingAndUsers).await;
        outcome
    }

    /// Rejection never creates a user, so only the queue is reloaded.
    pub async fn reject(&self, pending_id: i64) -> CommandOutcome {
        let outcome = interpret_rejection(self.client.reject(pending_id).await, pending_id);
        self.finish_command("reject", pending_id, &outcome).await;
        self.resync(Resync::Pending).await;
        outcome
    }

    /// Renames a user. A blank name is refused locally without a request.
    pub async fn update_user(&self, id: i64, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            self.views.notifier.notify(NoticeLevel::Error, "Name required");
            return Err(FacemarkError::Domain("Name required".into()));
        }
        let result = self.client.update_user(id, name).await.map(|_| ());
        self.report_failure(&result);
        self.resync(Resync::Users).await;
        result
    }

    /// Deletes a user together with their attendance history and images.
    /// Callers confirm with the operator first.
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let result = self.client.delete_user(id).await.map(|_| ());
        self.report_failure(&result);
        self.resync(Resync::Users).await;
        result
    }

    pub async fn save_note(&self, id: i64, note: &str) -> Result<()> {
        let reply = self.client.save_note(id, note.trim()).await?;
        if reply.text("status").is_none() {
            warn!("Note save for user {} returned no status", id);
            return Err(FacemarkError::Domain("Note save failed".into()));
        }
        Ok(())
    }

    pub async fn view_attendance(&self, user_id: i64) -> Result<usize> {
        match self.client.user_attendance(user_id).await {
            Ok(entries) => {
                self.views.history.render(&entries);
                Ok(entries.len())
            }
            Err(err) => Err(self.load_failed("attendance", err)),
        }
    }

    pub async fn load_attendance(&self, filter: &AttendanceFilter) -> Result<usize> {
        match self.client.attendance_report(filter).await {
            Ok(rows) => {
                self.views.report.render(&rows);
                Ok(rows.len())
            }
            Err(err) => Err(self.load_failed("attendance", err)),
        }
    }

    /// Reload failures were already reported to the operator by the loaders.
    async fn resync(&self, scope: Resync) {
        match scope {
            Resync::Pending => {
                let _ = self.load_pending().await;
            }
            Resync::Users => {
                let _ = self.load_users().await;
            }
            Resync::PendingAndUsers => {
                let _ = futures::join!(self.load_pending(), self.load_users());
            }
        }
    }

    async fn finish_command(&self, action: &str, target: i64, outcome: &CommandOutcome) {
        let level = if outcome.is_success() {
            info!("{} {} succeeded", action, target);
            NoticeLevel::Info
        } else {
            warn!("{} {} failed: {}", action, target, outcome.message());
            NoticeLevel::Error
        };
        self.views.notifier.notify(level, outcome.message());
        self.activity
            .record(ActivityEvent::new(
                ActivityKind::Moderation,
                ActivityPayload::Command {
                    action: action.to_string(),
                    target,
                    success: outcome.is_success(),
                },
            ))
            .await;
    }

    fn report_failure(&self, result: &Result<()>) {
        if let Err(err) = result {
            self.views
                .notifier
                .notify(NoticeLevel::Error, &format!("Error: {}", err.user_message()));
        }
    }

    fn load_failed(&self, what: &str, err: FacemarkError) -> FacemarkError {
        warn!("Loading {} failed: {}", what, err);
        self.views
            .notifier
            .notify(NoticeLevel::Error, &format!("Failed to load {what}"));
        err
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use facemark_client::{endpoints, MockTransport, Reply};
    use serde_json::json;

    struct Recorder<Row> {
        renders: Mutex<Vec<Vec<Row>>>,
    }

    impl<Row> Recorder<Row> {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                renders: Mutex::new(Vec::new()),
            })
        }
    }

    impl<Row: Clone + Send + Sync> Recorder<Row> {
        fn renders(&self) -> Vec<Vec<Row>> {
            self.renders.lock().unwrap().clone()
        }
    }

    impl<Row: Clone + Send + Sync> ListView<Row> for Recorder<Row> {
        fn render(&self, rows: &[Row]) {
            self.renders.lock().unwrap().push(rows.to_vec());
        }
    }

    #[derive(Default)]
    struct Alerts(Mutex<Vec<(NoticeLevel, String)>>);

    impl Notifier for Alerts {
        fn notify(&self, level: NoticeLevel, message: &str) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }
    }

    impl Alerts {
        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
        }
    }

    struct Harness {
        transport: MockTransport,
        controller: ApprovalQueueController<MockTransport>,
        pending: Arc<Recorder<PendingRow>>,
        users: Arc<Recorder<UserRecord>>,
        history: Arc<Recorder<AttendanceEntry>>,
        report: Arc<Recorder<AttendanceRow>>,
        alerts: Arc<Alerts>,
        activity: ActivityLog,
    }

    fn harness(transport: MockTransport) -> Harness {
        let pending: Arc<Recorder<PendingRow>> = Recorder::new();
        let users: Arc<Recorder<UserRecord>> = Recorder::new();
        let history: Arc<Recorder<AttendanceEntry>> = Recorder::new();
        let report: Arc<Recorder<AttendanceRow>> = Recorder::new();
        let alerts = Arc::new(Alerts::default());
        let activity = ActivityLog::new();
        let views = AdminViews {
            pending: pending.clone(),
            users: users.clone(),
            history: history.clone(),
            report: report.clone(),
            notifier: alerts.clone(),
        };
        let controller = ApprovalQueueController::new(
            Arc::new(SubmissionClient::new(transport.clone())),
            views,
            activity.clone(),
        );
        Harness {
            transport,
            controller,
            pending,
            users,
            history,
            report,
            alerts,
            activity,
        }
    }

    fn queue_with_lists() -> MockTransport {
        MockTransport::new()
            .with_reply(
                endpoints::PENDING,
                Reply::json(json!([{"id": 2, "name": "Eve"}])),
            )
            .with_reply(
                endpoints::USERS,
                Reply::json(json!([{"id": 1, "name": "Ann", "attendance_count": 4}])),
            )
    }

    #[tokio::test]
    async fn approve_success_reloads_both_lists_once() {
        let transport = queue_with_lists().with_reply(
            endpoints::APPROVE,
            Reply::json(json!({"status": "approved", "user_id": 7})),
        );
        let h = harness(transport);

        let outcome = h.controller.approve(2).await;

        assert!(outcome.is_success());
        assert_eq!(h.transport.count(endpoints::APPROVE), 1);
        assert_eq!(h.transport.count(endpoints::PENDING), 1);
        assert_eq!(h.transport.count(endpoints::USERS), 1);
        assert_eq!(h.pending.renders().len(), 1);
        assert_eq!(h.users.renders().len(), 1);
        assert_eq!(h.alerts.messages(), vec!["Approved: User ID 7".to_string()]);
        assert_eq!(h.activity.count(ActivityKind::Moderation).await, 1);
    }

    #[tokio::test]
    async fn approve_domain_error_is_reported_then_lists_reload() {
        let transport = queue_with_lists()
            .with_reply(endpoints::APPROVE, Reply::json(json!({"error": "not found"})));
        let h = harness(transport);

        let outcome = h.controller.approve(99).await;

        assert!(matches!(outcome, CommandOutcome::DomainError { .. }));
        assert!(h.alerts.messages()[0].contains("not found"));
        assert_eq!(h.transport.count(endpoints::PENDING), 1);
        assert_eq!(h.transport.count(endpoints::USERS), 1);
    }

    #[tokio::test]
    async fn approve_domain_error_with_error_status_still_reloads() {
        let transport = queue_with_lists().with_reply(
            endpoints::APPROVE,
            Reply::status(404, json!({"error": "pending not found"})),
        );
        let h = harness(transport);

        let outcome = h.controller.approve(5).await;

        assert_eq!(
            outcome,
            CommandOutcome::DomainError {
                message: "Error: pending not found".into()
            }
        );
        assert_eq!(h.pending.renders().len(), 1);
        assert_eq!(h.users.renders().len(), 1);
    }

    #[tokio::test]
    async fn approve_transport_failure_still_reloads() {
        let transport = queue_with_lists().with_reply(endpoints::APPROVE, Reply::Unreachable);
        let h = harness(transport);

        let outcome = h.controller.approve(2).await;

        assert!(matches!(outcome, CommandOutcome::Failed { .. }));
        assert_eq!(h.transport.count(endpoints::PENDING), 1);
        assert_eq!(h.transport.count(endpoints::USERS), 1);
    }

    #[tokio::test]
    async fn approve_empty_reply_is_generic_failure() {
        let transport = queue_with_lists().with_reply(endpoints::APPROVE, Reply::json(json!({})));
        let h = harness(transport);

        let outcome = h.controller.approve(2).await;

        assert_eq!(
            outcome,
            CommandOutcome::Failed {
                message: "Approval failed".into()
            }
        );
    }

    #[tokio::test]
    async fn reject_reloads_only_pending() {
        let transport = queue_with_lists().with_reply(
            endpoints::REJECT,
            Reply::json(json!({"status": "rejected", "pending_id": 2})),
        );
        let h = harness(transport);

        let outcome = h.controller.reject(2).await;

        assert_eq!(outcome.message(), "Rejected pending enrollment ID 2");
        assert_eq!(h.transport.count(endpoints::PENDING), 1);
        assert_eq!(h.transport.count(endpoints::USERS), 0);
        assert!(h.users.renders().is_empty());
    }

    #[tokio::test]
    async fn reject_failure_still_reloads_pending() {
        let transport = queue_with_lists().with_reply(
            endpoints::REJECT,
            Reply::status(500, json!({"error": "failed to delete pending folder"})),
        );
        let h = harness(transport);

        let outcome = h.controller.reject(3).await;

        assert!(!outcome.is_success());
        assert_eq!(h.transport.count(endpoints::PENDING), 1);
    }

    #[tokio::test]
    async fn empty_queue_renders_one_placeholder() {
        let transport = MockTransport::new().with_reply(endpoints::PENDING, Reply::json(json!([])));
        let h = harness(transport);

        let rendered = h.controller.load_pending().await.unwrap();

        assert_eq!(rendered, 1);
        assert_eq!(h.pending.renders(), vec![vec![PendingRow::Placeholder]]);
    }

    #[tokio::test]
    async fn failed_load_notifies_and_keeps_view() {
        let transport = MockTransport::new().with_reply(endpoints::USERS, Reply::Unreachable);
        let h = harness(transport);

        assert!(h.controller.load_users().await.is_err());
        assert!(h.users.renders().is_empty());
        assert_eq!(h.alerts.messages(), vec!["Failed to load users".to_string()]);
    }

    #[tokio::test]
    async fn blank_rename_sends_nothing() {
        let h = harness(queue_with_lists());

        assert!(h.controller.update_user(1, "   ").await.is_err());
        assert!(h.transport.calls().is_empty());
        assert_eq!(h.alerts.messages(), vec!["Name required".to_string()]);
    }

    #[tokio::test]
    async fn rename_trims_and_reloads_users() {
        let transport = queue_with_lists().with_reply(
            endpoints::UPDATE_USER,
            Reply::json(json!({"status": "updated", "user_id": 1})),
        );
        let h = harness(transport);

        h.controller.update_user(1, "  Annie ").await.unwrap();

        let calls = h.transport.calls();
        assert_eq!(calls[0].body, Some(json!({"id": 1, "name": "Annie"})));
        assert_eq!(h.transport.count(endpoints::USERS), 1);
    }

    #[tokio::test]
    async fn delete_reloads_users_even_on_failure() {
        let transport = queue_with_lists().with_reply(
            endpoints::DELETE_USER,
            Reply::status(400, json!({"error": "id required"})),
        );
        let h = harness(transport);

        assert!(h.controller.delete_user(1).await.is_err());
        assert_eq!(h.transport.count(endpoints::USERS), 1);
        assert_eq!(h.alerts.messages(), vec!["Error: id required".to_string()]);
    }

    #[tokio::test]
    async fn attendance_history_and_report_render() {
        let transport = MockTransport::new()
            .with_reply(
                endpoints::USER_ATTENDANCE,
                Reply::json(json!([{"timestamp": "2026-10-01 09:00:00", "device": "camera"}])),
            )
            .with_reply(
                endpoints::ADMIN_ATTENDANCE,
                Reply::json(json!([
                    {"user_id": 1, "name": "Ann", "timestamp": "2026-10-01 09:00:00", "device": "camera"},
                    {"user_id": 2, "name": "Eve", "timestamp": "2026-10-01 09:05:00", "device": null}
                ])),
            );
        let h = harness(transport);

        assert_eq!(h.controller.view_attendance(1).await.unwrap(), 1);
        let filter = AttendanceFilter::from_inputs(Some("2026-10-01"), None, Some(""));
        assert_eq!(h.controller.load_attendance(&filter).await.unwrap(), 2);

        assert_eq!(h.history.renders()[0][0].device.as_deref(), Some("camera"));
        assert_eq!(h.report.renders()[0][1].name, "Eve");
        let report_call = &h.transport.calls()[1];
        assert_eq!(report_call.body, Some(json!({"date": "2026-10-01"})));
    }

    #[tokio::test]
    async fn note_without_status_is_a_failure() {
        let transport =
            MockTransport::new().with_reply(endpoints::SAVE_NOTE, Reply::json(json!({})));
        let h = harness(transport);

        assert!(h.controller.save_note(1, "late twice").await.is_err());
    }
}
