//! `tt correct` and `tt correct-done`: the correction round trip.
//!
//! A correction reopens a ticket and keeps its accumulated time. Completing
//! it stops the run; `tt restart` then folds the correction time into the
//! total.

use super::Context;
use super::transition::{Action, run_transition};
use clap::Args;

#[derive(Args, Debug)]
pub struct CorrectArgs {
    /// Ticket to correct: project ID, row number, or `#N`.
    pub reference: String,
}

#[derive(Args, Debug)]
pub struct CorrectDoneArgs {
    /// Ticket under correction: project ID, row number, or `#N`.
    pub reference: String,
}

pub fn run_correct(args: &CorrectArgs, ctx: &Context) -> anyhow::Result<()> {
    run_transition(ctx, &args.reference, Action::StartCorrection)
}

pub fn run_correct_done(args: &CorrectDoneArgs, ctx: &Context) -> anyhow::Result<()> {
    run_transition(ctx, &args.reference, Action::CompleteCorrection)
}
