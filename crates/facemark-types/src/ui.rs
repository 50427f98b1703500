//! Render sinks injected into the controllers. Implementations only draw; they
//! never hold state the controllers read back.

use crate::outcome::OutcomeView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A list-shaped render target. Every call fully replaces what was shown.
pub trait ListView<Row>: Send + Sync {
    fn render(&self, rows: &[Row]);
}

/// Result panel of the capture flows.
pub trait StatusView: Send + Sync {
    /// Plain status line: progress while an action runs, or a final
    /// one-line result for flows without an outcome panel.
    fn set_status(&self, text: &str);
    fn show(&self, view: &OutcomeView);
}

/// One-line messages that interrupt the operator.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}
