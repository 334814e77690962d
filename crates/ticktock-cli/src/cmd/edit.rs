//! `tt edit`: override ticket fields by hand.
//!
//! Overrides are applied as given. Changing the status does not touch the
//! lifecycle flags or accumulators, so the result is reported with any
//! inconsistencies it introduced (see `tt verify`).

use super::transition::TicketReport;
use super::{Context, Session};
use crate::output::render_item;
use crate::prompt::{TerminalPrompter, is_interactive};
use clap::Args;
use ticktock_core::lifecycle::TicketEdit;
use ticktock_core::view::TicketView;
use ticktock_core::{Status, Transition};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Ticket to edit: project ID, row number, or `#N`.
    pub reference: String,

    /// New project ID.
    #[arg(long)]
    pub project_id: Option<String>,

    /// New member name.
    #[arg(long, short)]
    pub member: Option<String>,

    /// New status, e.g. "in progress" or task-finished.
    #[arg(long, short, value_parser = parse_status)]
    pub status: Option<Status>,

    /// New priority label.
    #[arg(long, short)]
    pub priority: Option<String>,
}

fn parse_status(raw: &str) -> Result<Status, String> {
    raw.parse::<Status>().map_err(|err| err.to_string())
}

impl EditArgs {
    fn to_edit(&self) -> TicketEdit {
        TicketEdit {
            project_id: self.project_id.clone(),
            member: self.member.clone(),
            status: self.status,
            priority: self.priority.clone(),
        }
    }
}

pub fn run_edit(args: &EditArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut session = Session::open(ctx)?;
    let index = session.store.resolve(&args.reference)?;
    let now = session.now();

    let edit = args.to_edit();
    let outcome = if edit.is_empty() && is_interactive() {
        let mut prompter = TerminalPrompter::stdio();
        session.store.edit_interactive(index, &mut prompter, now)?
    } else {
        session.store.edit(index, edit, now)?
    };

    let view = TicketView::new(index, session.store.get(index)?, now);
    let report = match outcome {
        Transition::Applied => TicketReport::applied("edit", view),
        Transition::Ignored => TicketReport::skipped("edit", "no fields given; nothing changed", view),
    };

    if !(ctx.quiet && report.applied && report.warnings.is_empty()) || ctx.output.is_json() {
        render_item(&report, ctx.output)?;
    }
    Ok(())
}
