//! `tt watch`: redraw the ticket list on a fixed interval.
//!
//! Totals are projected from the stored accumulators at each refresh; nothing
//! is written. On a terminal in pretty mode the screen is cleared between
//! frames, otherwise frames are appended.

use std::io::{self, IsTerminal, Write};
use std::thread;
use std::time::Duration;

use super::list::ListOutput;
use super::{Context, Session};
use crate::output::OutputMode;
use chrono::Local;
use clap::Args;
use crossterm::{cursor, execute, terminal};
use ticktock_core::clock::{Clock, SystemClock};
use ticktock_core::store::{FileStore, TicketStore};
use tracing::debug;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Refresh interval in milliseconds (default from config, 1000).
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Stop after this many refreshes instead of running until interrupted.
    #[arg(long, value_name = "N")]
    pub ticks: Option<u64>,
}

fn draw_frame<W: Write>(
    out: &mut W,
    listing: &ListOutput,
    mode: OutputMode,
    interval: Duration,
    clear: bool,
) -> io::Result<()> {
    if clear {
        execute!(
            out,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
    }
    if mode.is_pretty() {
        writeln!(
            out,
            "ticktock  {}  (every {}ms, Ctrl-C to quit)\n",
            Local::now().format("%H:%M:%S"),
            interval.as_millis()
        )?;
    }
    listing.write_to(out, mode)?;
    out.flush()
}

pub fn run_watch(args: &WatchArgs, ctx: &Context) -> anyhow::Result<()> {
    // Apply the daily reset once, then release the lock and only read.
    let dir = {
        let session = Session::open(ctx)?;
        session.store.backend().dir().to_path_buf()
    };

    let interval =
        Duration::from_millis(args.interval_ms.unwrap_or(ctx.config.display.refresh_ms).max(1));
    let clear = ctx.output.is_pretty() && io::stdout().is_terminal();
    let stdout = io::stdout();

    let mut tick: u64 = 0;
    loop {
        let store = TicketStore::load(FileStore::open(&dir)?)?;
        let listing = ListOutput::new(store.views(SystemClock.now()), false);
        draw_frame(&mut stdout.lock(), &listing, ctx.output, interval, clear)?;

        tick += 1;
        debug!(tick, "watch frame drawn");
        if args.ticks.is_some_and(|limit| tick >= limit) {
            return Ok(());
        }
        thread::sleep(interval);
    }
}
