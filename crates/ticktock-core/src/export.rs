//! Tabular export: one row per ticket, one column per field.
//!
//! Rows come out in store order. CSV opens in any spreadsheet; JSON is the
//! same records as an array of objects.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ErrorCode;
use crate::model::ticket::Ticket;

/// Default file stem for exports.
pub const DEFAULT_EXPORT_STEM: &str = "tickets";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode export: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ExportFailed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported export format '{other}' (expected csv or json)")),
        }
    }
}

/// A flat export row. Column order matches the persisted record layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub project_id: String,
    pub member: String,
    pub priority: String,
    pub date: String,
    pub status: String,
    pub time_spent: f64,
    pub is_paused: bool,
    pub is_completed: bool,
    pub is_correction: bool,
    pub is_correction_completed: bool,
    /// RFC 3339, empty when no run is open.
    pub start_time: String,
    pub live_seconds: f64,
}

impl ExportRecord {
    pub const HEADERS: [&'static str; 12] = [
        "projectId",
        "member",
        "priority",
        "date",
        "status",
        "timeSpent",
        "isPaused",
        "isCompleted",
        "isCorrection",
        "isCorrectionCompleted",
        "startTime",
        "liveSeconds",
    ];

    fn cells(&self) -> [String; 12] {
        [
            self.project_id.clone(),
            self.member.clone(),
            self.priority.clone(),
            self.date.clone(),
            self.status.clone(),
            self.time_spent.to_string(),
            self.is_paused.to_string(),
            self.is_completed.to_string(),
            self.is_correction.to_string(),
            self.is_correction_completed.to_string(),
            self.start_time.clone(),
            self.live_seconds.to_string(),
        ]
    }
}

impl From<&Ticket> for ExportRecord {
    fn from(ticket: &Ticket) -> Self {
        Self {
            project_id: ticket.project_id.clone(),
            member: ticket.member.clone(),
            priority: ticket.priority.clone(),
            date: ticket.date.format("%Y-%m-%d").to_string(),
            status: ticket.status.to_string(),
            time_spent: ticket.time_spent,
            is_paused: ticket.is_paused,
            is_completed: ticket.is_completed,
            is_correction: ticket.is_correction,
            is_correction_completed: ticket.is_correction_completed,
            start_time: ticket
                .start_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            live_seconds: ticket.live_seconds,
        }
    }
}

fn csv_cell(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Write a header row and one CSV row per record.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv<W: Write>(records: &[ExportRecord], mut out: W) -> Result<(), ExportError> {
    writeln!(out, "{}", ExportRecord::HEADERS.join(","))?;
    for record in records {
        let row: Vec<String> = record.cells().iter().map(|c| csv_cell(c)).collect();
        writeln!(out, "{}", row.join(","))?;
    }
    out.flush()?;
    Ok(())
}

/// Write the records as a pretty JSON array.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn write_json<W: Write>(records: &[ExportRecord], mut out: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut out, records)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Write `records` to `path` in `format`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn export_to_path(
    records: &[ExportRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let out = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Csv => write_csv(records, out),
        ExportFormat::Json => write_json(records, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::complete_task;
    use chrono::{TimeZone, Utc};

    fn finished_ticket() -> Ticket {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let mut ticket = Ticket::new("P1", "Ana, Jr.", "high", start);
        complete_task(&mut ticket, start + chrono::Duration::seconds(1800));
        ticket
    }

    #[test]
    fn record_mirrors_ticket_fields() {
        let record = ExportRecord::from(&finished_ticket());
        assert_eq!(record.date, "2024-06-03");
        assert_eq!(record.status, "Task Finished");
        assert!((record.time_spent - 0.5).abs() < 1e-9);
        assert!(record.start_time.is_empty());
        assert!(record.is_completed);
    }

    #[test]
    fn csv_has_header_and_quoted_cells() {
        let records = vec![ExportRecord::from(&finished_ticket())];
        let mut buf = Vec::new();
        write_csv(&records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "projectId,member,priority,date,status,timeSpent,isPaused,isCompleted,isCorrection,isCorrectionCompleted,startTime,liveSeconds"
        );
        assert_eq!(
            lines.next().unwrap(),
            "P1,\"Ana, Jr.\",high,2024-06-03,Task Finished,0.5,true,true,false,false,,1800"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn csv_cell_escapes_quotes() {
        assert_eq!(csv_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_cell("plain"), "plain");
    }

    #[test]
    fn empty_export_is_header_only() {
        let mut buf = Vec::new();
        write_csv(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }

    #[test]
    fn json_export_keeps_camel_case_keys() {
        let records = vec![ExportRecord::from(&finished_ticket())];
        let mut buf = Vec::new();
        write_json(&records, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["projectId"], "P1");
        assert_eq!(value[0]["isCorrectionCompleted"], false);
    }

    #[test]
    fn export_format_parses() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xlsx".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Json.extension(), "json");
    }

    #[test]
    fn export_to_path_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_to_path(
            &[ExportRecord::from(&finished_ticket())],
            ExportFormat::Csv,
            &path,
        )
        .unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
