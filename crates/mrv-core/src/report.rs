//! # Snapshot Report
//!
//! Renders the downloadable markdown snapshot of one assessment: project
//! label, date, the narrative and the user's notes.

use crate::primitives::{REPORT_FILE_NAME, REPORT_MIME};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A rendered snapshot, ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReport {
    pub file_name: String,
    pub mime: String,
    pub body: String,
}

impl SnapshotReport {
    /// Render a snapshot with the default file name.
    #[must_use]
    pub fn new(label: &str, date: NaiveDate, narrative: &str, notes: &str) -> Self {
        Self {
            file_name: REPORT_FILE_NAME.to_string(),
            mime: REPORT_MIME.to_string(),
            body: render_report(label, date, narrative, notes),
        }
    }

    /// UTF-8 bytes of the body.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.body.as_bytes()
    }
}

/// Render the snapshot markdown. Blank notes render as `-`.
#[must_use]
pub fn render_report(label: &str, date: NaiveDate, narrative: &str, notes: &str) -> String {
    let notes = notes.trim();
    let notes = if notes.is_empty() { "-" } else { notes };

    format!(
        "# MRV Readiness Snapshot\n\n\
         - Project: {label}\n\
         - Date: {date}\n\n\
         {narrative}\n\n\
         ### Notes\n\
         {notes}\n"
    )
}
