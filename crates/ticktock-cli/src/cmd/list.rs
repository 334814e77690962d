//! `tt list`: every ticket in store order with totals projected to now.

use std::io::{self, Write};

use super::{Context, Session};
use crate::output::{OutputMode, render_list_to};
use clap::Args;
use serde::Serialize;
use ticktock_core::view::TicketView;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only show tickets that are in progress or under correction.
    #[arg(long)]
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub tickets: Vec<TicketView>,
    pub total: usize,
}

impl ListOutput {
    pub fn new(views: Vec<TicketView>, active_only: bool) -> Self {
        let tickets: Vec<_> = views
            .into_iter()
            .filter(|v| !active_only || v.ticket.is_active())
            .collect();
        let total = tickets.len();
        Self { tickets, total }
    }

    /// Write the listing in `mode`. Shared with `tt watch`.
    pub fn write_to(&self, out: &mut dyn Write, mode: OutputMode) -> io::Result<()> {
        match mode {
            OutputMode::Json => {
                serde_json::to_writer_pretty(&mut *out, self).map_err(io::Error::other)?;
                writeln!(out)
            }
            OutputMode::Pretty => {
                if self.tickets.is_empty() {
                    return writeln!(out, "No tickets yet. Start one with `tt new <PROJECT_ID> --member <NAME>`.");
                }
                render_list_to(out, &self.tickets, mode)?;
                writeln!(
                    out,
                    "{} ticket{}",
                    self.total,
                    if self.total == 1 { "" } else { "s" }
                )
            }
            OutputMode::Text => render_list_to(out, &self.tickets, mode),
        }
    }
}

pub fn run_list(args: &ListArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let output = ListOutput::new(session.store.views(session.now()), args.active);
    let stdout = io::stdout();
    output.write_to(&mut stdout.lock(), ctx.output)?;
    Ok(())
}
