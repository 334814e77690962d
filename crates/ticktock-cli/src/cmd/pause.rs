//! `tt pause` / `tt resume`: toggle whether a ticket is accruing time.

use super::Context;
use super::transition::{Action, run_transition};
use clap::Args;

#[derive(Args, Debug)]
pub struct PauseArgs {
    /// Ticket to toggle: project ID, or row number (`#3` forces a row).
    pub reference: String,
}

/// Pause a running ticket, or resume a paused one.
///
/// Finished tickets are left alone.
pub fn run_pause(args: &PauseArgs, ctx: &Context) -> anyhow::Result<()> {
    run_transition(ctx, &args.reference, Action::PauseResume)
}
