use std::fmt;

/// Crate-wide error taxonomy. Location and parse failures are recovered at
/// the command-handler boundary; `ConnectionLost` ends the session;
/// `UserQuit` is a sentinel, not a real failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not parse '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("no such command '{0}'. Use 'help' or 'apropos' to list commands")]
    UnknownCommand(String),

    #[error("breaking on a function or label reference is not supported ('{0}')")]
    UnsupportedLocationKind(String),

    #[error("'{query}' must match exactly one loaded script, but matched {}: [{}]",
            candidates.len(), candidates.join(", "))]
    AmbiguousLocation {
        query: String,
        candidates: Vec<String>,
    },

    #[error("no current location: the debuggee is not paused")]
    NoCurrentLocation,

    #[error("the debuggee is not paused")]
    NotPaused,

    #[error("engine request '{method}' failed: {message}")]
    EngineRequest { method: String, message: String },

    #[error("failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("connection to the debuggee was lost")]
    ConnectionLost,

    /// Sentinel raised by the `quit` command to unwind the REPL loop.
    #[error("quit")]
    UserQuit,

    #[error("no breakpoint at {0}")]
    NoSuchBreakpoint(String),

    #[error("not implemented: {0}")]
    Unimplemented(&'static str),

    #[error("launch failed: {0}")]
    Launch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error should terminate the REPL loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ConnectionLost)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Mode for pausing on thrown exceptions, forwarded to the backend verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionMode {
    None,
    Uncaught,
    All,
}

impl ExceptionMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(ExceptionMode::None),
            "uncaught" => Some(ExceptionMode::Uncaught),
            "all" => Some(ExceptionMode::All),
            _ => None,
        }
    }
}

impl fmt::Display for ExceptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExceptionMode::None => "none",
            ExceptionMode::Uncaught => "uncaught",
            ExceptionMode::All => "all",
        };
        f.write_str(s)
    }
}
