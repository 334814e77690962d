//! Questions the core asks its user.
//!
//! The store never blocks on a terminal itself. Whoever drives it supplies a
//! [`Prompter`]: the CLI asks on stdin, tests and non-interactive callers use
//! [`FixedAnswer`].

use crate::lifecycle::TicketEdit;
use crate::model::ticket::Ticket;

pub trait Prompter {
    /// Ask a yes/no question.
    fn confirm(&mut self, question: &str) -> bool;

    /// Ask for revised field values for `ticket`.
    ///
    /// Fields left as `None` or empty keep their current value.
    fn revise(&mut self, ticket: &Ticket) -> TicketEdit;
}

/// Answers every question the same way and records what was asked.
#[derive(Debug, Clone, Default)]
pub struct FixedAnswer {
    answer: bool,
    edit: TicketEdit,
    asked: Vec<String>,
}

impl FixedAnswer {
    #[must_use]
    pub fn yes() -> Self {
        Self {
            answer: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn no() -> Self {
        Self::default()
    }

    /// Reply to [`Prompter::revise`] with `edit`.
    #[must_use]
    pub fn with_edit(mut self, edit: TicketEdit) -> Self {
        self.edit = edit;
        self
    }

    /// Every question passed to [`Prompter::confirm`], in order.
    #[must_use]
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompter for FixedAnswer {
    fn confirm(&mut self, question: &str) -> bool {
        self.asked.push(question.to_string());
        self.answer
    }

    fn revise(&mut self, _ticket: &Ticket) -> TicketEdit {
        self.edit.clone()
    }
}
