use std::fmt;

/// Machine-readable error codes for script-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    TicketNotFound,
    InvalidStatusValue,
    StoreReadFailed,
    StoreWriteFailed,
    CorruptStore,
    LockContention,
    ExportFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::TicketNotFound => "E2001",
            Self::InvalidStatusValue => "E2005",
            Self::StoreReadFailed => "E3001",
            Self::CorruptStore => "E3003",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::ExportFailed => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::TicketNotFound => "Ticket not found",
            Self::InvalidStatusValue => "Invalid status value",
            Self::StoreReadFailed => "Ticket store read failed",
            Self::CorruptStore => "Corrupt ticket store",
            Self::StoreWriteFailed => "Ticket store write failed",
            Self::LockContention => "Lock contention",
            Self::ExportFailed => "Export failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users and scripts.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in ticktock/config.toml and retry."),
            Self::TicketNotFound => Some("Run `tt list` to see row numbers and project ids."),
            Self::InvalidStatusValue => Some(
                "Use one of: In Progress, Correction, Task Finished, Correction Completed.",
            ),
            Self::StoreReadFailed => Some("Check read permissions on the data directory."),
            Self::CorruptStore => Some("Run `tt erase` to start over with an empty store."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `tt` process releases its lock."),
            Self::ExportFailed => Some("Check that the output path is writable."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
