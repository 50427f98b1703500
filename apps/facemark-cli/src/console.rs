//! Stdout render sinks for the terminal front end.

use facemark_types::{
    outcome::{OutcomeView, Tone},
    records::{AttendanceEntry, AttendanceRow, PendingRow, UserRecord},
    ui::{ListView, NoticeLevel, Notifier, StatusView},
};

pub struct Console;

impl ListView<PendingRow> for Console {
    fn render(&self, rows: &[PendingRow]) {
        println!("Pending enrollments");
        for row in rows {
            match row {
                PendingRow::Entry(record) => println!(
                    "  #{:<5} {}  {}",
                    record.id,
                    record.name,
                    record.requested_at.as_deref().unwrap_or("")
                ),
                PendingRow::Placeholder => println!("  ({})", row.label()),
            }
        }
    }
}

impl ListView<UserRecord> for Console {
    fn render(&self, rows: &[UserRecord]) {
        println!("{:<6} {:<24} {:>10}  {}", "ID", "Name", "Attendance", "Created");
        for user in rows {
            println!(
                "{:<6} {:<24} {:>10}  {}",
                user.id,
                user.name,
                user.attendance_count,
                user.created_at.as_deref().unwrap_or("N/A")
            );
        }
    }
}

impl ListView<AttendanceEntry> for Console {
    fn render(&self, rows: &[AttendanceEntry]) {
        for entry in rows {
            println!("  {} ({})", entry.timestamp, entry.device.as_deref().unwrap_or(""));
        }
    }
}

impl ListView<AttendanceRow> for Console {
    fn render(&self, rows: &[AttendanceRow]) {
        println!("{:<8} {:<24} {:<20} {}", "User", "Name", "Timestamp", "Device");
        for row in rows {
            println!(
                "{:<8} {:<24} {:<20} {}",
                row.user_id,
                row.name,
                row.timestamp,
                row.device.as_deref().unwrap_or("")
            );
        }
    }
}

impl StatusView for Console {
    fn set_status(&self, text: &str) {
        println!("{text}");
    }

    fn show(&self, view: &OutcomeView) {
        let mark = match view.tone {
            Tone::Success => "[ok]",
            Tone::Warning => "[!!]",
            Tone::Error => "[x]",
        };
        println!("{mark} {}", view.title);
        println!("    {}", view.message);
    }
}

impl Notifier for Console {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => println!("{message}"),
            NoticeLevel::Error => eprintln!("{message}"),
        }
    }
}
