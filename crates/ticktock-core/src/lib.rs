//! ticktock-core library.
//!
//! The crate is split into a pure lifecycle engine ([`lifecycle`]) that moves a
//! single [`model::ticket::Ticket`] between states and keeps its time
//! accumulators, and a [`store::TicketStore`] that owns the ordered ticket
//! collection and mirrors it to a [`store::KeyValueStore`] after every change.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at module seams, `anyhow::Result` for config.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Time**: every operation takes the current instant as an argument; nothing
//!   in this crate reads the wall clock except [`clock::SystemClock`].

pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod lock;
pub mod model;
pub mod prompt;
pub mod store;
pub mod view;

pub use lifecycle::Transition;
pub use model::ticket::{Status, Ticket};
pub use store::TicketStore;
