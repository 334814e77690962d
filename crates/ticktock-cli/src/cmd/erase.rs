//! `tt erase`: wipe every ticket after confirmation.

use super::{Context, Session};
use crate::output::render;
use crate::prompt::confirmer;
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct EraseArgs {
    /// Skip the confirmation prompt.
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct EraseOutput {
    erased: bool,
    removed: usize,
}

pub fn run_erase(args: &EraseArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut session = Session::open(ctx)?;
    let count = session.store.len();
    let mut prompter = confirmer(args.yes.then_some(true));
    let erased = session.store.erase_all(prompter.as_mut())?;

    let output = EraseOutput {
        erased,
        removed: if erased { count } else { 0 },
    };
    render(ctx.output, &output, |o, w| {
        if o.erased {
            writeln!(w, "✓ erased {} ticket(s)", o.removed)
        } else {
            writeln!(w, "! nothing erased (confirm interactively or pass --yes)")
        }
    })
}
