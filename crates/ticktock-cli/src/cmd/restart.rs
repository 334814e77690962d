//! `tt restart`: resume work after a completed correction.

use super::Context;
use super::transition::{Action, run_transition};
use clap::Args;

#[derive(Args, Debug)]
pub struct RestartArgs {
    /// Ticket with a completed correction: project ID, row number, or `#N`.
    pub reference: String,
}

/// Folds the correction's live seconds into the total hours and starts a
/// new run.
pub fn run_restart(args: &RestartArgs, ctx: &Context) -> anyhow::Result<()> {
    run_transition(ctx, &args.reference, Action::StartTask)
}
