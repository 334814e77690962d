//! `tt show`: one ticket with its live totals.

use super::{Context, Session};
use crate::output::render_item;
use clap::Args;
use ticktock_core::view::TicketView;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Project ID, or row number (`#3` forces a row).
    pub reference: String,
}

pub fn run_show(args: &ShowArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let index = session.store.resolve(&args.reference)?;
    let view = TicketView::new(index, session.store.get(index)?, session.now());
    render_item(&view, ctx.output)?;
    Ok(())
}
