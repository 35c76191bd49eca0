//! Command registry and dispatcher. One input line becomes a command name
//! plus its raw remaining argument text; lookup is by exact name or
//! declared alias, never fuzzy. Handlers see a context exposing the debug
//! session and the REPL I/O surface, not the wire connection.

mod builtin;

use crate::error::Result;
use crate::repl::ReplIo;
use crate::session::DebugSession;

/// What the REPL driver should do after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stay at the prompt.
    Handled,
    /// The debuggee is running; suspend the prompt until the next pause.
    Resume,
}

pub struct CommandContext<'a> {
    pub session: &'a mut DebugSession,
    pub io: &'a mut dyn ReplIo,
}

/// An immutable command descriptor. `run` receives the unsplit remainder of
/// the input line and owns any further tokenization.
pub struct CommandDesc {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub help: &'static str,
    pub run: fn(&mut CommandContext<'_>, &str) -> Result<Outcome>,
}

impl CommandDesc {
    fn matches(&self, word: &str) -> bool {
        self.name == word || self.aliases.contains(&word)
    }
}

pub struct CommandRegistry {
    commands: &'static [CommandDesc],
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: builtin::COMMANDS,
        }
    }

    pub fn lookup(&self, word: &str) -> Option<&CommandDesc> {
        self.commands.iter().find(|c| c.matches(word))
    }

    pub fn commands(&self) -> &[CommandDesc] {
        self.commands
    }

    /// Dispatches one input line. Empty input is a no-op; an unknown
    /// command is reported to the operator by name and swallowed, never
    /// raised. Handler failures propagate to the caller, which decides
    /// whether they are fatal.
    pub fn dispatch(&self, line: &str, ctx: &mut CommandContext<'_>) -> Result<Outcome> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Outcome::Handled);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match self.lookup(word) {
            Some(desc) => (desc.run)(ctx, rest),
            None => {
                ctx.io
                    .output_line(&crate::error::Error::UnknownCommand(word.to_string()).to_string());
                Ok(Outcome::Handled)
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
