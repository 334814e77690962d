//! Ticket lifecycle engine.
//!
//! Pure transitions over a single [`Ticket`]:
//!
//! ```text
//! In Progress --pause_resume--> In Progress (isPaused flips)
//! In Progress --complete_task--> Task Finished
//! In Progress | Task Finished --start_correction--> Correction
//! Correction --complete_correction--> Correction Completed
//! Correction Completed --start_task--> In Progress (liveSeconds folded into timeSpent)
//! ```
//!
//! # Invariants
//!
//! - Accumulators change only when a run stops (pause, complete,
//!   complete-correction) or on restart (`start_task`).
//! - `startTime` is set exactly when the ticket is accruing time.
//! - Invalid transitions return [`Transition::Ignored`] and leave the ticket
//!   untouched; they are not errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::model::ticket::{Status, Ticket};

const SECS_PER_HOUR: f64 = 3600.0;

/// Result of a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The ticket was changed and should be saved.
    Applied,
    /// The operation did not apply in the ticket's current state.
    Ignored,
}

impl Transition {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Fractional seconds between `start` and `now`, clamped at zero when the
/// clock went backwards.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn elapsed_secs(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - start).num_milliseconds().max(0) as f64 / 1000.0
}

/// Close the current run, adding its length to both accumulators.
fn flush_run(ticket: &mut Ticket, now: DateTime<Utc>) {
    if let Some(start) = ticket.start_time {
        let elapsed = elapsed_secs(start, now);
        ticket.time_spent += elapsed / SECS_PER_HOUR;
        ticket.live_seconds += elapsed;
    }
}

/// Toggle between running and paused.
///
/// Tickets in `Task Finished` or `Correction Completed` are left alone; a
/// paused terminal ticket would otherwise start accruing time with no way to
/// stop it short of another transition.
pub fn pause_resume(ticket: &mut Ticket, now: DateTime<Utc>) -> Transition {
    if ticket.status.is_terminal() {
        debug!(project_id = %ticket.project_id, status = %ticket.status, "pause/resume ignored");
        return Transition::Ignored;
    }

    if ticket.is_paused {
        ticket.start_time = Some(now);
        ticket.is_paused = false;
        debug!(project_id = %ticket.project_id, "resumed");
    } else {
        flush_run(ticket, now);
        ticket.is_paused = true;
        ticket.start_time = None;
        debug!(project_id = %ticket.project_id, time_spent = ticket.time_spent, "paused");
    }
    Transition::Applied
}

/// Finish the task. Time of a still-open run is counted first.
pub fn complete_task(ticket: &mut Ticket, now: DateTime<Utc>) -> Transition {
    if !ticket.is_paused && !ticket.is_completed {
        flush_run(ticket, now);
    }

    ticket.is_completed = true;
    ticket.is_paused = true;
    ticket.start_time = None;
    ticket.status = Status::TaskFinished;
    debug!(project_id = %ticket.project_id, time_spent = ticket.time_spent, "task finished");
    Transition::Applied
}

/// Begin a correction run. Accumulators are not touched.
pub fn start_correction(ticket: &mut Ticket, now: DateTime<Utc>) -> Transition {
    ticket.is_paused = false;
    ticket.is_correction = true;
    ticket.start_time = Some(now);
    ticket.status = Status::Correction;
    debug!(project_id = %ticket.project_id, "correction started");
    Transition::Applied
}

pub fn complete_correction(ticket: &mut Ticket, now: DateTime<Utc>) -> Transition {
    if !ticket.is_correction || ticket.is_correction_completed {
        debug!(project_id = %ticket.project_id, "complete correction ignored");
        return Transition::Ignored;
    }

    flush_run(ticket, now);
    ticket.is_correction_completed = true;
    ticket.is_paused = true;
    ticket.start_time = None;
    ticket.status = Status::CorrectionCompleted;
    debug!(project_id = %ticket.project_id, time_spent = ticket.time_spent, "correction completed");
    Transition::Applied
}

/// Restart work after a completed correction.
///
/// Folds `liveSeconds` into `timeSpent` and zeroes it, then opens a new run
/// with every lifecycle flag cleared.
pub fn start_task(ticket: &mut Ticket, now: DateTime<Utc>) -> Transition {
    if ticket.status != Status::CorrectionCompleted {
        debug!(project_id = %ticket.project_id, status = %ticket.status, "start task ignored");
        return Transition::Ignored;
    }

    ticket.time_spent += ticket.live_seconds / SECS_PER_HOUR;
    ticket.live_seconds = 0.0;
    ticket.start_time = Some(now);
    ticket.status = Status::InProgress;
    ticket.is_paused = false;
    ticket.is_correction = false;
    ticket.is_correction_completed = false;
    ticket.is_completed = false;
    debug!(project_id = %ticket.project_id, time_spent = ticket.time_spent, "task restarted");
    Transition::Applied
}

/// Manual field overrides. Empty strings count as "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketEdit {
    pub project_id: Option<String>,
    pub member: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<String>,
}

impl TicketEdit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        fn blank(value: Option<&String>) -> bool {
            value.is_none_or(String::is_empty)
        }
        blank(self.project_id.as_ref())
            && blank(self.member.as_ref())
            && self.status.is_none()
            && blank(self.priority.as_ref())
    }
}

/// Apply manual overrides as-is.
///
/// Flags and accumulators are not reconciled with a new status; use
/// [`Ticket::consistency_issues`] to find what an edit left inconsistent.
pub fn edit_ticket(ticket: &mut Ticket, edit: TicketEdit) -> Transition {
    if edit.is_empty() {
        return Transition::Ignored;
    }

    if let Some(project_id) = edit.project_id.filter(|v| !v.is_empty()) {
        ticket.project_id = project_id;
    }
    if let Some(member) = edit.member.filter(|v| !v.is_empty()) {
        ticket.member = member;
    }
    if let Some(status) = edit.status {
        ticket.status = status;
    }
    if let Some(priority) = edit.priority.filter(|v| !v.is_empty()) {
        ticket.priority = priority;
    }
    debug!(project_id = %ticket.project_id, "ticket edited");
    Transition::Applied
}

/// Display-only totals, including the open run if there is one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub hours: f64,
    pub live_seconds: f64,
}

/// Project the stored accumulators forward to `now` without touching them.
#[must_use]
pub fn current_totals(ticket: &Ticket, now: DateTime<Utc>) -> Totals {
    let running = match ticket.start_time {
        Some(start) if !ticket.is_paused => elapsed_secs(start, now),
        _ => 0.0,
    };
    Totals {
        hours: ticket.time_spent + running / SECS_PER_HOUR,
        live_seconds: ticket.live_seconds + running,
    }
}

/// Which actions make sense for a ticket right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionGates {
    pub pause_resume: bool,
    pub complete: bool,
    pub start_correction: bool,
    pub complete_correction: bool,
    pub start_task: bool,
    pub edit: bool,
}

impl ActionGates {
    #[must_use]
    pub const fn for_ticket(ticket: &Ticket) -> Self {
        let status = ticket.status;
        Self {
            pause_resume: !status.is_terminal(),
            complete: !ticket.is_completed,
            start_correction: matches!(status, Status::TaskFinished | Status::InProgress)
                && !ticket.is_correction,
            complete_correction: matches!(status, Status::Correction),
            start_task: matches!(status, Status::CorrectionCompleted),
            edit: true,
        }
    }
}

/// Label for the pause/resume control.
#[must_use]
pub const fn pause_label(ticket: &Ticket) -> &'static str {
    if ticket.is_paused { "Resume" } else { "Pause" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn fresh() -> Ticket {
        Ticket::new("P1", "ana", "high", t(0))
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn pause_flushes_exact_elapsed_time() {
        let mut ticket = fresh();
        assert_eq!(pause_resume(&mut ticket, t(90)), Transition::Applied);
        assert!(ticket.is_paused);
        assert!(ticket.start_time.is_none());
        assert!(approx(ticket.live_seconds, 90.0));
        assert!(approx(ticket.time_spent, 90.0 / 3600.0));
    }

    #[test]
    fn resume_opens_a_new_run_without_accruing() {
        let mut ticket = fresh();
        pause_resume(&mut ticket, t(60));
        let before = (ticket.time_spent, ticket.live_seconds);
        pause_resume(&mut ticket, t(600));
        assert!(!ticket.is_paused);
        assert_eq!(ticket.start_time, Some(t(600)));
        assert_eq!((ticket.time_spent, ticket.live_seconds), before);
    }

    #[test]
    fn pause_resume_ignores_terminal_tickets() {
        let mut ticket = fresh();
        complete_task(&mut ticket, t(10));
        let snapshot = ticket.clone();
        assert_eq!(pause_resume(&mut ticket, t(20)), Transition::Ignored);
        assert_eq!(ticket, snapshot);
    }

    #[test]
    fn complete_after_an_hour() {
        let mut ticket = fresh();
        complete_task(&mut ticket, t(3600));
        assert!(approx(ticket.time_spent, 1.0));
        assert!(approx(ticket.live_seconds, 3600.0));
        assert_eq!(ticket.status, Status::TaskFinished);
        assert!(ticket.is_completed);
        assert!(ticket.is_paused);
        assert!(ticket.start_time.is_none());
    }

    #[test]
    fn complete_while_paused_adds_nothing() {
        let mut ticket = fresh();
        pause_resume(&mut ticket, t(30));
        complete_task(&mut ticket, t(5000));
        assert!(approx(ticket.live_seconds, 30.0));
    }

    #[test]
    fn start_correction_keeps_accumulators() {
        let mut ticket = fresh();
        complete_task(&mut ticket, t(100));
        start_correction(&mut ticket, t(200));
        assert_eq!(ticket.status, Status::Correction);
        assert!(ticket.is_correction);
        assert!(!ticket.is_paused);
        assert_eq!(ticket.start_time, Some(t(200)));
        assert!(approx(ticket.live_seconds, 100.0));
    }

    #[test]
    fn complete_correction_requires_open_correction() {
        let mut ticket = fresh();
        let snapshot = ticket.clone();
        assert_eq!(complete_correction(&mut ticket, t(50)), Transition::Ignored);
        assert_eq!(ticket, snapshot);

        start_correction(&mut ticket, t(50));
        assert_eq!(complete_correction(&mut ticket, t(80)), Transition::Applied);
        assert_eq!(ticket.status, Status::CorrectionCompleted);
        assert!(ticket.is_correction_completed);
        assert!(ticket.start_time.is_none());
        assert!(approx(ticket.live_seconds, 30.0));

        assert_eq!(complete_correction(&mut ticket, t(90)), Transition::Ignored);
    }

    #[test]
    fn start_task_folds_live_seconds() {
        let mut ticket = fresh();
        start_correction(&mut ticket, t(0));
        complete_correction(&mut ticket, t(1800));
        ticket.time_spent = 2.0;
        ticket.live_seconds = 1800.0;

        assert_eq!(start_task(&mut ticket, t(2000)), Transition::Applied);
        assert!(approx(ticket.time_spent, 2.5));
        assert!(approx(ticket.live_seconds, 0.0));
        assert_eq!(ticket.status, Status::InProgress);
        assert_eq!(ticket.start_time, Some(t(2000)));
        assert!(!ticket.is_paused);
        assert!(!ticket.is_correction);
        assert!(!ticket.is_correction_completed);
        assert!(!ticket.is_completed);
    }

    #[test]
    fn start_task_only_from_correction_completed() {
        for status in [Status::InProgress, Status::Correction, Status::TaskFinished] {
            let mut ticket = fresh();
            ticket.status = status;
            let snapshot = ticket.clone();
            assert_eq!(start_task(&mut ticket, t(10)), Transition::Ignored);
            assert_eq!(ticket, snapshot);
        }
    }

    #[test]
    fn edit_overrides_only_given_fields() {
        let mut ticket = fresh();
        complete_task(&mut ticket, t(120));
        let before = ticket.clone();

        let edit = TicketEdit {
            member: Some("bo".to_string()),
            ..TicketEdit::default()
        };
        assert_eq!(edit_ticket(&mut ticket, edit), Transition::Applied);
        assert_eq!(ticket.member, "bo");
        assert_eq!(
            Ticket {
                member: before.member.clone(),
                ..ticket.clone()
            },
            before
        );
    }

    #[test]
    fn edit_treats_empty_strings_as_absent() {
        let mut ticket = fresh();
        let edit = TicketEdit {
            project_id: Some(String::new()),
            priority: Some(String::new()),
            ..TicketEdit::default()
        };
        assert!(edit.is_empty());
        assert_eq!(edit_ticket(&mut ticket, edit), Transition::Ignored);
        assert_eq!(ticket.project_id, "P1");
    }

    #[test]
    fn edit_status_does_not_reconcile_flags() {
        let mut ticket = fresh();
        let edit = TicketEdit {
            status: Some(Status::CorrectionCompleted),
            ..TicketEdit::default()
        };
        edit_ticket(&mut ticket, edit);
        assert_eq!(ticket.status, Status::CorrectionCompleted);
        assert!(!ticket.is_correction_completed);
        assert!(!ticket.consistency_issues().is_empty());
    }

    #[test]
    fn current_totals_projects_open_run_without_mutation() {
        let mut ticket = fresh();
        ticket.time_spent = 1.0;
        ticket.live_seconds = 10.0;
        let snapshot = ticket.clone();

        let totals = current_totals(&ticket, t(1800));
        assert!(approx(totals.hours, 1.5));
        assert!(approx(totals.live_seconds, 1810.0));
        assert_eq!(ticket, snapshot);

        pause_resume(&mut ticket, t(60));
        let paused = current_totals(&ticket, t(99_999));
        assert!(approx(paused.live_seconds, ticket.live_seconds));
        assert!(approx(paused.hours, ticket.time_spent));
    }

    #[test]
    fn backwards_clock_counts_as_zero() {
        let mut ticket = Ticket::new("P1", "ana", "high", t(100));
        pause_resume(&mut ticket, t(40));
        assert!(approx(ticket.live_seconds, 0.0));
    }

    #[test]
    fn gates_follow_status() {
        let mut ticket = fresh();
        let gates = ActionGates::for_ticket(&ticket);
        assert!(gates.pause_resume && gates.complete && gates.start_correction);
        assert!(!gates.complete_correction && !gates.start_task);
        assert_eq!(pause_label(&ticket), "Pause");

        complete_task(&mut ticket, t(10));
        let gates = ActionGates::for_ticket(&ticket);
        assert!(!gates.pause_resume && !gates.complete);
        assert!(gates.start_correction);

        start_correction(&mut ticket, t(20));
        let gates = ActionGates::for_ticket(&ticket);
        assert!(gates.complete_correction && gates.pause_resume);
        assert!(!gates.start_correction);

        complete_correction(&mut ticket, t(30));
        let gates = ActionGates::for_ticket(&ticket);
        assert!(gates.start_task && !gates.pause_resume && gates.edit);
        assert_eq!(pause_label(&ticket), "Resume");
    }
}
