use std::fmt;

/// A position in a loaded script, addressed by source URL rather than by any
/// engine-internal script id. `line` is 1-based; `col` of `None` means the
/// whole line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub source_url: String,
    pub line: u32,
    pub col: Option<u32>,
}

impl Location {
    pub fn new(source_url: impl Into<String>, line: u32, col: Option<u32>) -> Self {
        Self {
            source_url: source_url.into(),
            line,
            col,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_url, self.line)?;
        match self.col {
            Some(col) if col != 0 => write!(f, ":{}", col),
            _ => Ok(()),
        }
    }
}

/// An operator breakpoint. Identity for set/remove purposes is the
/// `(location, condition)` tuple; attached commands do not participate.
#[derive(Debug, Clone)]
pub struct Breakpoint {
    pub location: Location,
    /// Expression evaluated by the remote runtime before reporting a hit.
    pub condition: Option<String>,
    /// Operator commands auto-run each time this breakpoint fires.
    pub commands: Vec<String>,
}

impl Breakpoint {
    pub fn new(location: Location, condition: Option<String>) -> Self {
        Self {
            location,
            condition,
            commands: Vec::new(),
        }
    }
}

impl PartialEq for Breakpoint {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.condition == other.condition
    }
}

impl Eq for Breakpoint {}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location)?;
        if let Some(cond) = &self.condition {
            write!(f, " if {}", cond)?;
        }
        Ok(())
    }
}

/// A call frame as reported by the backend while paused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub function: String,
    pub location: Location,
}
