//! Interactive answers on the terminal.

use std::io::{self, BufRead, IsTerminal, Write};

use ticktock_core::error::ErrorCode;
use ticktock_core::lifecycle::TicketEdit;
use ticktock_core::prompt::{FixedAnswer, Prompter};
use ticktock_core::{Status, Ticket};
use tracing::warn;

/// Asks on `output` and reads answers line by line from `input`.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr so stdout stays clean for results.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Ask for one field; an empty answer keeps `current`.
    fn ask_field(&mut self, label: &str, current: &str) -> Option<String> {
        match self.ask(&format!("{label} [{current}]: ")) {
            Ok(answer) if !answer.is_empty() => Some(answer),
            Ok(_) => None,
            Err(err) => {
                warn!("failed to read answer for {label}: {err}");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        match self.ask(&format!("{question} [y/N] ")) {
            Ok(answer) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(err) => {
                warn!("failed to read confirmation: {err}");
                false
            }
        }
    }

    fn revise(&mut self, ticket: &Ticket) -> TicketEdit {
        let project_id = self.ask_field("Project ID", &ticket.project_id);
        let member = self.ask_field("Member", &ticket.member);
        let status = self
            .ask_field("Status", ticket.status.as_str())
            .and_then(|raw| {
                raw.parse::<Status>()
                    .map_err(|err| {
                        warn!(code = %ErrorCode::InvalidStatusValue, "{err}; keeping '{}'", ticket.status);
                    })
                    .ok()
            });
        let priority = self.ask_field("Priority", &ticket.priority);
        TicketEdit {
            project_id,
            member,
            status,
            priority,
        }
    }
}

/// Whether both ends of the terminal are interactive.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Pick who answers yes/no questions: an explicit flag wins, then the
/// terminal, and a non-interactive run without a flag declines.
pub fn confirmer(answer: Option<bool>) -> Box<dyn Prompter> {
    match answer {
        Some(true) => Box::new(FixedAnswer::yes()),
        Some(false) => Box::new(FixedAnswer::no()),
        None if is_interactive() => Box::new(TerminalPrompter::stdio()),
        None => Box::new(FixedAnswer::no()),
    }
}
