//! `tt new`: start tracking a ticket.
//!
//! When the project already has an active ticket, the user is asked whether
//! to continue it instead of creating a duplicate.

use super::transition::TicketReport;
use super::{Context, Session};
use crate::output::render_item;
use crate::prompt::confirmer;
use clap::Args;
use ticktock_core::store::{CreateOutcome, NewTicket};
use ticktock_core::view::TicketView;

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Project ID the ticket tracks.
    pub project_id: String,

    /// Team member working on it.
    #[arg(long, short)]
    pub member: String,

    /// Free-form priority label.
    #[arg(long, short, default_value = "")]
    pub priority: String,

    /// Continue an active ticket for the same project without asking.
    #[arg(long, conflicts_with = "no")]
    pub yes: bool,

    /// Never continue an active ticket for the same project.
    #[arg(long)]
    pub no: bool,
}

impl NewArgs {
    /// Pre-supplied answer to the continuation question, if any.
    const fn answer(&self) -> Option<bool> {
        match (self.yes, self.no) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

pub fn run_new(args: &NewArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut session = Session::open(ctx)?;
    let now = session.now();
    let mut prompter = confirmer(args.answer());

    let new = NewTicket {
        project_id: args.project_id.trim().to_string(),
        member: args.member.trim().to_string(),
        priority: args.priority.trim().to_string(),
    };
    let outcome = session
        .store
        .create_or_resume(new, prompter.as_mut(), now)?;

    let report = match outcome {
        CreateOutcome::Created(index) => {
            TicketReport::applied("new", TicketView::new(index, session.store.get(index)?, now))
        }
        CreateOutcome::Resumed(index) => {
            let view = TicketView::new(index, session.store.get(index)?, now);
            let mut report = TicketReport::applied("continue", view);
            report.notice = Some(format!("continuing the active ticket at row {}", index + 1));
            report
        }
        CreateOutcome::Declined(index) => TicketReport::skipped(
            "new",
            format!(
                "{} is still active at row {}; nothing changed",
                args.project_id.trim(),
                index + 1
            ),
            TicketView::new(index, session.store.get(index)?, now),
        ),
    };

    if !(ctx.quiet && report.applied) || ctx.output.is_json() {
        render_item(&report, ctx.output)?;
    }
    Ok(())
}
