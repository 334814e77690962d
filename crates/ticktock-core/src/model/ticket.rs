use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The four lifecycle states.
///
/// Serialized with the display labels (`"In Progress"`, ...) so collections
/// written by older tooling stay readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Correction")]
    Correction,
    #[serde(rename = "Task Finished")]
    TaskFinished,
    #[serde(rename = "Correction Completed")]
    CorrectionCompleted,
}

impl Status {
    pub const ALL: [Self; 4] = [
        Self::InProgress,
        Self::Correction,
        Self::TaskFinished,
        Self::CorrectionCompleted,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::Correction => "Correction",
            Self::TaskFinished => "Task Finished",
            Self::CorrectionCompleted => "Correction Completed",
        }
    }

    /// Active tickets are the ones a new ticket for the same project would
    /// collide with.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::InProgress | Self::Correction)
    }

    /// Terminal-looking states: left only through `start_correction`
    /// (from `TaskFinished`) or `start_task` (from `CorrectionCompleted`).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::TaskFinished | Self::CorrectionCompleted)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`Status`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status: '{got}'")]
pub struct ParseStatusError {
    pub got: String,
}

fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "inprogress" => Ok(Self::InProgress),
            "correction" => Ok(Self::Correction),
            "taskfinished" | "finished" => Ok(Self::TaskFinished),
            "correctioncompleted" => Ok(Self::CorrectionCompleted),
            _ => Err(ParseStatusError { got: s.to_string() }),
        }
    }
}

/// A tracked ticket, the only entity in the store.
///
/// Field order and key names follow the persisted record layout, which is also
/// the export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub project_id: String,
    #[serde(default)]
    pub member: String,
    #[serde(default)]
    pub priority: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: Status,
    /// Cumulative worked hours.
    #[serde(default)]
    pub time_spent: f64,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_correction: bool,
    #[serde(default)]
    pub is_correction_completed: bool,
    /// Start of the current run; `None` while paused or stopped.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub start_time: Option<DateTime<Utc>>,
    /// Seconds worked since the last restart after a correction.
    #[serde(default)]
    pub live_seconds: f64,
}

impl Ticket {
    /// A fresh ticket: `In Progress`, zero accumulators, run started at `now`.
    ///
    /// The creation date is the UTC calendar date of `now`.
    #[must_use]
    pub fn new(
        project_id: impl Into<String>,
        member: impl Into<String>,
        priority: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            member: member.into(),
            priority: priority.into(),
            date: now.date_naive(),
            status: Status::InProgress,
            time_spent: 0.0,
            is_paused: false,
            is_completed: false,
            is_correction: false,
            is_correction_completed: false,
            start_time: Some(now),
            live_seconds: 0.0,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// True while elapsed time is accruing: not paused and a run is open.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        !self.is_paused && self.start_time.is_some()
    }

    /// List every way the stored flags disagree with `status` or with each
    /// other. Lifecycle operations never produce issues; manual edits can.
    #[must_use]
    pub fn consistency_issues(&self) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();

        if self.start_time.is_some() == self.is_paused {
            issues.push(ConsistencyIssue::RunFlagMismatch {
                paused: self.is_paused,
            });
        }

        if self.status.is_terminal() && self.start_time.is_some() {
            issues.push(ConsistencyIssue::RunningWhileStopped(self.status));
        }

        let flags_ok = match self.status {
            Status::InProgress => !self.is_correction_completed,
            Status::Correction => self.is_correction && !self.is_correction_completed,
            Status::TaskFinished => self.is_completed,
            Status::CorrectionCompleted => self.is_correction && self.is_correction_completed,
        };
        if !flags_ok {
            issues.push(ConsistencyIssue::FlagsDisagreeWithStatus(self.status));
        }

        if !self.time_spent.is_finite() || self.time_spent < 0.0 {
            issues.push(ConsistencyIssue::BadAccumulator("timeSpent"));
        }
        if !self.live_seconds.is_finite() || self.live_seconds < 0.0 {
            issues.push(ConsistencyIssue::BadAccumulator("liveSeconds"));
        }

        issues
    }
}

/// One disagreement found by [`Ticket::consistency_issues`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// `startTime` presence does not match `isPaused`.
    RunFlagMismatch { paused: bool },
    /// A terminal ticket still has an open run.
    RunningWhileStopped(Status),
    /// The four boolean flags contradict `status`.
    FlagsDisagreeWithStatus(Status),
    /// An accumulator is negative or not a number.
    BadAccumulator(&'static str),
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunFlagMismatch { paused: true } => {
                f.write_str("marked paused but a run start time is set")
            }
            Self::RunFlagMismatch { paused: false } => {
                f.write_str("marked running but no run start time is set")
            }
            Self::RunningWhileStopped(status) => {
                write!(f, "status '{status}' should not have an open run")
            }
            Self::FlagsDisagreeWithStatus(status) => {
                write!(f, "lifecycle flags contradict status '{status}'")
            }
            Self::BadAccumulator(field) => write!(f, "{field} is negative or not a number"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConsistencyIssue, Status, Ticket};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::str::FromStr;

    fn at(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn status_json_uses_display_labels() {
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(
            serde_json::to_string(&Status::CorrectionCompleted).unwrap(),
            "\"Correction Completed\""
        );
        assert_eq!(
            serde_json::from_str::<Status>("\"Task Finished\"").unwrap(),
            Status::TaskFinished
        );
    }

    #[test]
    fn status_parse_is_lenient_about_spacing_and_case() {
        assert_eq!(Status::from_str("in progress").unwrap(), Status::InProgress);
        assert_eq!(Status::from_str("in-progress").unwrap(), Status::InProgress);
        assert_eq!(
            Status::from_str("CORRECTION_COMPLETED").unwrap(),
            Status::CorrectionCompleted
        );
        assert_eq!(Status::from_str("finished").unwrap(), Status::TaskFinished);
        for status in Status::ALL {
            assert_eq!(Status::from_str(&status.to_string()).unwrap(), status);
        }
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        let err = Status::from_str("archived").unwrap_err();
        assert_eq!(err.got, "archived");
        assert_eq!(err.to_string(), "invalid status: 'archived'");
    }

    #[test]
    fn active_and_terminal_partition_statuses() {
        for status in Status::ALL {
            assert_ne!(status.is_active(), status.is_terminal(), "{status}");
        }
    }

    #[test]
    fn new_ticket_is_running_with_zero_accumulators() {
        let ticket = Ticket::new("P1", "ana", "high", at(0));
        assert_eq!(ticket.status, Status::InProgress);
        assert_eq!(ticket.start_time, Some(at(0)));
        assert!(ticket.is_running());
        assert!(ticket.time_spent.abs() < f64::EPSILON);
        assert!(ticket.live_seconds.abs() < f64::EPSILON);
        assert_eq!(ticket.date, at(0).date_naive());
        assert!(ticket.consistency_issues().is_empty());
    }

    #[test]
    fn reads_records_written_by_the_browser_widget() {
        let raw = r#"{
            "projectId": "P-17",
            "member": "Ravi",
            "priority": "High",
            "date": "2024-05-02",
            "status": "In Progress",
            "timeSpent": 0.5,
            "isPaused": false,
            "isCompleted": false,
            "isCorrection": false,
            "isCorrectionCompleted": false,
            "startTime": 1714640000000,
            "liveSeconds": 1800
        }"#;
        let ticket: Ticket = serde_json::from_str(raw).unwrap();
        assert_eq!(ticket.project_id, "P-17");
        assert_eq!(ticket.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(
            ticket.start_time.map(|t| t.timestamp_millis()),
            Some(1_714_640_000_000)
        );
        assert!((ticket.live_seconds - 1800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn writes_camel_case_keys_and_null_start_time() {
        let mut ticket = Ticket::new("P1", "ana", "low", at(0));
        ticket.start_time = None;
        ticket.is_paused = true;
        let value = serde_json::to_value(&ticket).unwrap();
        assert_eq!(value["projectId"], "P1");
        assert_eq!(value["status"], "In Progress");
        assert!(value["startTime"].is_null());
        assert_eq!(value["isCorrectionCompleted"], false);
    }

    #[test]
    fn missing_optional_fields_default() {
        let raw = r#"{"projectId":"P2","date":"2024-01-01"}"#;
        let ticket: Ticket = serde_json::from_str(raw).unwrap();
        assert_eq!(ticket.status, Status::InProgress);
        assert_eq!(Status::default(), Status::InProgress);
        assert!(ticket.member.is_empty());
        assert!(ticket.start_time.is_none());
    }

    #[test]
    fn consistency_flags_edited_status() {
        let mut ticket = Ticket::new("P1", "ana", "low", at(0));
        ticket.status = Status::TaskFinished;
        let issues = ticket.consistency_issues();
        assert!(issues.contains(&ConsistencyIssue::RunningWhileStopped(Status::TaskFinished)));
        assert!(issues.contains(&ConsistencyIssue::FlagsDisagreeWithStatus(Status::TaskFinished)));
    }

    #[test]
    fn consistency_flags_run_mismatch_and_bad_numbers() {
        let mut ticket = Ticket::new("P1", "ana", "low", at(0));
        ticket.is_paused = true;
        ticket.live_seconds = -1.0;
        let issues = ticket.consistency_issues();
        assert!(issues.contains(&ConsistencyIssue::RunFlagMismatch { paused: true }));
        assert!(issues.contains(&ConsistencyIssue::BadAccumulator("liveSeconds")));
    }
}
