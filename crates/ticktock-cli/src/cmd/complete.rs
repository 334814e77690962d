//! `tt complete`: finish a task.

use super::Context;
use super::transition::{Action, run_transition};
use clap::Args;

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Ticket to finish: project ID, row number, or `#N`.
    pub reference: String,
}

pub fn run_complete(args: &CompleteArgs, ctx: &Context) -> anyhow::Result<()> {
    run_transition(ctx, &args.reference, Action::Complete)
}
