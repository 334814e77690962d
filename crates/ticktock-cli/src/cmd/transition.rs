//! Shared runner for the lifecycle commands.
//!
//! Every lifecycle command resolves a ticket reference, checks the action is
//! currently offered for that ticket, applies it and prints the resulting
//! view. A closed gate or an ignored transition is reported as a notice, not
//! an error.

use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::{Context, Session};
use crate::output::{Renderable, render_item, write_json};
use ticktock_core::lifecycle::{self, ActionGates};
use ticktock_core::view::TicketView;
use ticktock_core::{Ticket, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PauseResume,
    Complete,
    StartCorrection,
    CompleteCorrection,
    StartTask,
}

impl Action {
    /// Verb used in notices.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PauseResume => "pause/resume",
            Self::Complete => "complete",
            Self::StartCorrection => "start correction",
            Self::CompleteCorrection => "complete correction",
            Self::StartTask => "restart",
        }
    }

    pub const fn is_open(self, gates: &ActionGates) -> bool {
        match self {
            Self::PauseResume => gates.pause_resume,
            Self::Complete => gates.complete,
            Self::StartCorrection => gates.start_correction,
            Self::CompleteCorrection => gates.complete_correction,
            Self::StartTask => gates.start_task,
        }
    }

    fn apply(self, ticket: &mut Ticket, now: DateTime<Utc>) -> Transition {
        match self {
            Self::PauseResume => lifecycle::pause_resume(ticket, now),
            Self::Complete => lifecycle::complete_task(ticket, now),
            Self::StartCorrection => lifecycle::start_correction(ticket, now),
            Self::CompleteCorrection => lifecycle::complete_correction(ticket, now),
            Self::StartTask => lifecycle::start_task(ticket, now),
        }
    }
}

/// What a command did to one ticket.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketReport {
    pub action: &'static str,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub ticket: TicketView,
}

impl TicketReport {
    pub fn applied(action: &'static str, ticket: TicketView) -> Self {
        let warnings = ticket
            .ticket
            .consistency_issues()
            .iter()
            .map(ToString::to_string)
            .collect();
        Self {
            action,
            applied: true,
            notice: None,
            warnings,
            ticket,
        }
    }

    pub fn skipped(action: &'static str, notice: impl Into<String>, ticket: TicketView) -> Self {
        Self {
            action,
            applied: false,
            notice: Some(notice.into()),
            warnings: Vec::new(),
            ticket,
        }
    }
}

impl Renderable for TicketReport {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        if let Some(notice) = &self.notice {
            writeln!(w, "! {notice}")?;
        }
        for warning in &self.warnings {
            writeln!(w, "warning: {warning}")?;
        }
        self.ticket.render_human(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        if let Some(notice) = &self.notice {
            writeln!(w, "notice\t{notice}")?;
        }
        for warning in &self.warnings {
            writeln!(w, "warning\t{warning}")?;
        }
        self.ticket.render_table(w)
    }
}

/// Decide and apply `action` on the ticket at `index`.
///
/// # Errors
///
/// Returns an error if `index` is out of range or saving fails.
pub fn transition(session: &mut Session, index: usize, action: Action) -> Result<TicketReport> {
    let now = session.now();
    let ticket = session.store.get(index)?;

    if !action.is_open(&ActionGates::for_ticket(ticket)) {
        debug!(row = index + 1, action = action.name(), "action not available");
        let notice = format!(
            "cannot {} {}: not available while '{}'",
            action.name(),
            ticket.project_id,
            ticket.status
        );
        let view = TicketView::new(index, ticket, now);
        return Ok(TicketReport::skipped(action.name(), notice, view));
    }

    let outcome = session
        .store
        .apply(index, now, |ticket, now| action.apply(ticket, now))?;
    let view = TicketView::new(index, session.store.get(index)?, now);

    Ok(match outcome {
        Transition::Applied => TicketReport::applied(action.name(), view),
        Transition::Ignored => {
            let notice = format!("{} had no effect on {}", action.name(), view.ticket.project_id);
            TicketReport::skipped(action.name(), notice, view)
        }
    })
}

/// Open a session, resolve `reference`, apply `action` and print the result.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the reference does not
/// match a ticket, or saving fails.
pub fn run_transition(ctx: &Context, reference: &str, action: Action) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let index = session.store.resolve(reference)?;
    let report = transition(&mut session, index, action)?;
    if !(ctx.quiet && report.applied) || ctx.output.is_json() {
        render_item(&report, ctx.output)?;
    }
    Ok(())
}
