//! The ticket store: ordered collection, persistence, reset policy.
//!
//! A [`TicketStore`] is constructed by [`TicketStore::load`], mutated only
//! through its methods, and writes itself back to its [`KeyValueStore`] after
//! every change. Tickets are addressed by position, as they are displayed.

pub mod backend;
pub mod reset;

use std::io;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::export::ExportRecord;
use crate::lifecycle::{self, TicketEdit, Transition};
use crate::lock::LockError;
use crate::model::ticket::{Status, Ticket};
use crate::prompt::Prompter;
use crate::view::TicketView;

pub use backend::{
    CORRUPT_KEY, FileStore, KeyValueStore, LAST_SAVED_KEY, MemoryStore, TICKETS_KEY,
};
pub use reset::{default_reset_at, reset_boundary, reset_due};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode tickets: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("no ticket at row {row} (the store has {len})")]
    NotFound { row: usize, len: usize },

    #[error("no ticket matches '{0}'")]
    Unresolved(String),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::StoreReadFailed,
            Self::Write { .. } => ErrorCode::StoreWriteFailed,
            Self::Encode(_) => ErrorCode::InternalUnexpected,
            Self::Lock(err) => err.code(),
            Self::NotFound { .. } | Self::Unresolved(_) => ErrorCode::TicketNotFound,
        }
    }
}

/// Fields supplied when creating a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTicket {
    pub project_id: String,
    pub member: String,
    pub priority: String,
}

/// What [`TicketStore::create_or_resume`] did. Positions are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new ticket was appended at this position.
    Created(usize),
    /// The user chose to continue the active ticket at this position.
    Resumed(usize),
    /// An active ticket exists at this position and the user declined.
    Declined(usize),
}

#[derive(Debug)]
pub struct TicketStore<B: KeyValueStore> {
    backend: B,
    tickets: Vec<Ticket>,
    last_saved: Option<DateTime<Utc>>,
}

impl<B: KeyValueStore> TicketStore<B> {
    /// Read the persisted collection and last-saved stamp.
    ///
    /// Missing entries load as empty. Records are decoded one by one; a
    /// record that does not parse is logged and skipped, and the raw
    /// collection is copied to [`CORRUPT_KEY`] before anything can overwrite
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] when the backend itself fails, or
    /// [`StoreError::Write`] when the raw copy cannot be kept.
    pub fn load(mut backend: B) -> Result<Self, StoreError> {
        let tickets = match backend.get(TICKETS_KEY)? {
            Some(raw) => {
                let (tickets, intact) = decode_tickets(&raw);
                if !intact {
                    backend.set(CORRUPT_KEY, &raw)?;
                    warn!(
                        code = %ErrorCode::CorruptStore,
                        kept = tickets.len(),
                        copy = CORRUPT_KEY,
                        "ticket collection was only partly readable"
                    );
                }
                tickets
            }
            None => Vec::new(),
        };

        let last_saved = backend.get(LAST_SAVED_KEY)?.and_then(|raw| {
            DateTime::parse_from_rfc3339(raw.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|err| warn!("ignoring unreadable last-saved time '{raw}': {err}"))
                .ok()
        });

        debug!(count = tickets.len(), ?last_saved, "ticket store loaded");
        Ok(Self {
            backend,
            tickets,
            last_saved,
        })
    }

    #[must_use]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    #[must_use]
    pub const fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Ticket at 0-based `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for positions past the end.
    pub fn get(&self, index: usize) -> Result<&Ticket, StoreError> {
        self.tickets.get(index).ok_or(StoreError::NotFound {
            row: index + 1,
            len: self.tickets.len(),
        })
    }

    /// Persist the whole collection and stamp `now` as last saved.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend write fails.
    pub fn save(&mut self, now: DateTime<Utc>) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&self.tickets)?;
        self.backend.set(TICKETS_KEY, &encoded)?;
        self.backend.set(LAST_SAVED_KEY, &now.to_rfc3339())?;
        self.last_saved = Some(now);
        Ok(())
    }

    /// Start a ticket for `new.project_id`, or continue the active one.
    ///
    /// An active ticket (`In Progress` or `Correction`) with the same project
    /// id is a conflict: `prompter` decides whether to continue it. Continuing
    /// reopens its run at `now` with status `In Progress`; nothing is added
    /// to the accumulators and no record is created.
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub fn create_or_resume(
        &mut self,
        new: NewTicket,
        prompter: &mut dyn Prompter,
        now: DateTime<Utc>,
    ) -> Result<CreateOutcome, StoreError> {
        let existing = self
            .tickets
            .iter()
            .position(|t| t.project_id == new.project_id && t.is_active());

        if let Some(index) = existing {
            let question = format!(
                "Project ID {} is still in progress or under correction. Would you like to continue with this task?",
                new.project_id
            );
            if !prompter.confirm(&question) {
                debug!(project_id = %new.project_id, "continuation declined");
                return Ok(CreateOutcome::Declined(index));
            }

            let ticket = &mut self.tickets[index];
            ticket.is_paused = false;
            ticket.start_time = Some(now);
            ticket.status = Status::InProgress;
            self.save(now)?;
            info!(project_id = %new.project_id, row = index + 1, "continuing active ticket");
            return Ok(CreateOutcome::Resumed(index));
        }

        let ticket = Ticket::new(new.project_id, new.member, new.priority, now);
        info!(project_id = %ticket.project_id, member = %ticket.member, "ticket created");
        self.tickets.push(ticket);
        self.save(now)?;
        Ok(CreateOutcome::Created(self.tickets.len() - 1))
    }

    /// Run a lifecycle operation against the ticket at `index`, saving when
    /// it applied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for a bad position, or a save error.
    pub fn apply(
        &mut self,
        index: usize,
        now: DateTime<Utc>,
        op: impl FnOnce(&mut Ticket, DateTime<Utc>) -> Transition,
    ) -> Result<Transition, StoreError> {
        let len = self.tickets.len();
        let ticket = self.tickets.get_mut(index).ok_or(StoreError::NotFound {
            row: index + 1,
            len,
        })?;
        let outcome = op(ticket, now);
        if outcome.is_applied() {
            self.save(now)?;
        }
        Ok(outcome)
    }

    /// Apply manual overrides to the ticket at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for a bad position, or a save error.
    pub fn edit(
        &mut self,
        index: usize,
        edit: TicketEdit,
        now: DateTime<Utc>,
    ) -> Result<Transition, StoreError> {
        self.apply(index, now, |ticket, _| lifecycle::edit_ticket(ticket, edit))
    }

    /// Ask `prompter` for revised values, then apply them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for a bad position, or a save error.
    pub fn edit_interactive(
        &mut self,
        index: usize,
        prompter: &mut dyn Prompter,
        now: DateTime<Utc>,
    ) -> Result<Transition, StoreError> {
        let edit = prompter.revise(self.get(index)?);
        self.edit(index, edit, now)
    }

    /// Wipe everything once per day after the reset boundary.
    ///
    /// `now` carries the time zone the boundary is computed in. The store is
    /// saved after a wipe or when its last-saved stamp predates today's
    /// boundary, so later calls the same day find a fresh stamp and neither
    /// wipe nor write. Returns `true` on a wipe.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    pub fn apply_daily_reset_if_due<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
        reset_at: NaiveTime,
    ) -> Result<bool, StoreError> {
        let due = reset_due(now, self.last_saved, reset_at);
        let boundary = reset_boundary(now, reset_at);
        let stale = self.last_saved.is_none_or(|saved| saved < boundary);
        if due {
            info!(
                cleared = self.tickets.len(),
                last_saved = ?self.last_saved,
                "daily reset: clearing ticket store"
            );
            self.clear()?;
        }
        if due || stale {
            self.save(now.with_timezone(&Utc))?;
        }
        Ok(due)
    }

    /// Wipe everything after `prompter` confirms. Returns `true` on a wipe.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    pub fn erase_all(&mut self, prompter: &mut dyn Prompter) -> Result<bool, StoreError> {
        if !prompter.confirm("Are you sure you want to erase all data?") {
            return Ok(false);
        }
        info!(cleared = self.tickets.len(), "erasing all tickets");
        self.clear()?;
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.tickets.clear();
        self.last_saved = None;
        self.backend.remove(TICKETS_KEY)?;
        self.backend.remove(LAST_SAVED_KEY)
    }

    /// Resolve a user-facing reference to a 0-based position.
    ///
    /// - `#N` is always row `N` (1-based).
    /// - Otherwise an exact project id wins: its active ticket if it has
    ///   one, else its most recently created ticket.
    /// - Bare digits matching no project id are a row when in range.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an out-of-range `#N` and
    /// [`StoreError::Unresolved`] when nothing matches.
    pub fn resolve(&self, reference: &str) -> Result<usize, StoreError> {
        let reference = reference.trim();
        let len = self.tickets.len();

        if let Some(raw_row) = reference.strip_prefix('#') {
            let row: usize = raw_row
                .parse()
                .map_err(|_| StoreError::Unresolved(reference.to_string()))?;
            return if (1..=len).contains(&row) {
                Ok(row - 1)
            } else {
                Err(StoreError::NotFound { row, len })
            };
        }

        let matches = move || {
            self.tickets
                .iter()
                .enumerate()
                .rev()
                .filter(move |(_, t)| t.project_id == reference)
        };
        if let Some((index, _)) = matches()
            .find(|(_, t)| t.is_active())
            .or_else(|| matches().next())
        {
            return Ok(index);
        }

        match reference.parse::<usize>() {
            Ok(row) if (1..=len).contains(&row) => Ok(row - 1),
            _ => Err(StoreError::Unresolved(reference.to_string())),
        }
    }

    /// Presentation rows for every ticket, in store order.
    #[must_use]
    pub fn views(&self, now: DateTime<Utc>) -> Vec<TicketView> {
        self.tickets
            .iter()
            .enumerate()
            .map(|(index, ticket)| TicketView::new(index, ticket, now))
            .collect()
    }

    /// Flat export rows, in store order.
    #[must_use]
    pub fn export_records(&self) -> Vec<ExportRecord> {
        self.tickets.iter().map(ExportRecord::from).collect()
    }
}

/// Decode each record on its own. The flag is `false` when anything was
/// dropped, including a collection that is not a JSON array at all.
fn decode_tickets(raw: &str) -> (Vec<Ticket>, bool) {
    let records = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(records) => records,
        Err(err) => {
            warn!(code = %ErrorCode::CorruptStore, "ignoring unreadable ticket collection: {err}");
            return (Vec::new(), false);
        }
    };

    let total = records.len();
    let tickets: Vec<Ticket> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            serde_json::from_value(record)
                .map_err(|err| {
                    warn!(code = %ErrorCode::CorruptStore, row = index + 1, "skipping unreadable ticket: {err}");
                })
                .ok()
        })
        .collect();
    let intact = tickets.len() == total;
    (tickets, intact)
}
