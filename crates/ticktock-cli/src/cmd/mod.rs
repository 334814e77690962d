//! Subcommand handlers and the session they share.

pub mod complete;
pub mod correction;
pub mod edit;
pub mod erase;
pub mod export;
pub mod list;
pub mod new;
pub mod pause;
pub mod restart;
pub mod show;
pub mod transition;
pub mod verify;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use tracing::{debug, info};

use crate::output::OutputMode;
use ticktock_core::clock::{Clock, SystemClock};
use ticktock_core::config::Config;
use ticktock_core::lock::{DEFAULT_LOCK_TIMEOUT, StoreLock};
use ticktock_core::store::{FileStore, TicketStore};

/// Settings every handler needs, resolved once in `main`.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub data_dir: PathBuf,
    pub output: OutputMode,
    pub quiet: bool,
}

/// A loaded store held under the data-directory lock.
pub struct Session {
    pub store: TicketStore<FileStore>,
    clock: SystemClock,
    _lock: StoreLock,
}

impl Session {
    /// Lock the data directory, load the store and apply the daily reset.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or locked, or the
    /// store cannot be read or written.
    pub fn open(ctx: &Context) -> Result<Self> {
        let backend = FileStore::open(&ctx.data_dir)?;
        let lock = backend.lock(DEFAULT_LOCK_TIMEOUT)?;
        let mut store = TicketStore::load(backend)?;

        if ctx.config.reset.enabled {
            let wiped = store.apply_daily_reset_if_due(&Local::now(), ctx.config.reset.at)?;
            if wiped {
                info!(dir = %ctx.data_dir.display(), "daily reset cleared yesterday's tickets");
            }
        }
        debug!(dir = %ctx.data_dir.display(), count = store.len(), "session opened");

        Ok(Self {
            store,
            clock: SystemClock,
            _lock: lock,
        })
    }

    /// Current instant for operations in this session.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
