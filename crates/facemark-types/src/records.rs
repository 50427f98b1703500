use serde::{Deserialize, Serialize};

/// Enrollment awaiting a moderator decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub requested_at: Option<String>,
}

/// Approved user as listed by the moderation store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub attendance_count: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub admin_note: Option<String>,
}

/// One attendance mark in a single user's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub timestamp: String,
    #[serde(default)]
    pub device: Option<String>,
}

/// One row of the admin attendance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub user_id: i64,
    pub name: String,
    pub timestamp: String,
    #[serde(default)]
    pub device: Option<String>,
}

/// Report filter; unset fields are left out of the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl AttendanceFilter {
    /// Builds a filter from raw form input, treating blank fields as unset.
    pub fn from_inputs(date: Option<&str>, user_id: Option<i64>, device: Option<&str>) -> Self {
        let non_blank = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        Self {
            date: non_blank(date),
            user_id,
            device: non_blank(device),
        }
    }
}

pub const NO_PENDING_PLACEHOLDER: &str = "No pending enrollments";

/// Row rendered into the pending view. An empty queue renders exactly one
/// `Placeholder` so "loaded and empty" is distinguishable from "not loaded".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingRow {
    Entry(PendingRecord),
    Placeholder,
}

impl PendingRow {
    pub fn rows_for(records: Vec<PendingRecord>) -> Vec<PendingRow> {
        if records.is_empty() {
            vec![PendingRow::Placeholder]
        } else {
            records.into_iter().map(PendingRow::Entry).collect()
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PendingRow::Entry(record) => &record.name,
            PendingRow::Placeholder => NO_PENDING_PLACEHOLDER,
        }
    }
}
