//! Protocol-client abstraction. An [`Engine`] hides a concrete remote
//! debugging protocol behind a stable interface so that session logic stays
//! protocol-agnostic. Backend-internal script ids never cross this boundary;
//! everything above it speaks [`Location`]s.

mod cdp;
mod node;
mod registry;

pub use cdp::CdpEngine;
pub use node::{engine_from_exe, node_engine, NodeEngine};
pub use registry::ScriptRegistry;

use std::path::Path;
use std::sync::mpsc::Receiver;

use crate::error::{ExceptionMode, Result};
use crate::location::{Breakpoint, Frame, Location};

/// The session's belief about whether the remote runtime is halted and why.
/// Mutated only by engine-originated pause/resume events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    NotPaused,
    Breakpoint,
    DebuggerStatement,
    CaughtException,
    UncaughtException,
}

impl PauseState {
    pub fn is_paused(self) -> bool {
        self != PauseState::NotPaused
    }

    pub fn describe(self) -> &'static str {
        match self {
            PauseState::NotPaused => "running",
            PauseState::Breakpoint => "breakpoint",
            PauseState::DebuggerStatement => "debugger statement",
            PauseState::CaughtException => "caught exception",
            PauseState::UncaughtException => "uncaught exception",
        }
    }
}

/// Domain events translated from the wire protocol, delivered in
/// wire-arrival order through a single receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The runtime halted. `state` is never `NotPaused`; `location` is the
    /// top frame when the backend reported one.
    Paused {
        state: PauseState,
        location: Option<Location>,
    },
    Resumed,
    ScriptParsed { url: String },
    ScriptFailedToParse { url: String },
    BreakpointResolved { location: Location },
    /// The wire dropped. Terminal for the session.
    ConnectionLost,
}

/// A value computed by the remote runtime, reduced to what the operator
/// needs to see.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteValue {
    pub description: String,
    pub value: Option<serde_json::Value>,
}

impl std::fmt::Display for RemoteValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

/// Contract every protocol backend implements. All operations may block on
/// the wire. Completion of `pause`/`resume`/step requests is observed via
/// the corresponding event, not via the call's return.
pub trait Engine {
    fn connect(&mut self, address: &str) -> Result<()>;
    fn disconnect(&mut self) -> Result<()>;

    /// Evaluates an expression. With `frame` omitted, operates on the
    /// currently inspected frame and fails with `NotPaused` when there is
    /// none.
    fn eval(&mut self, expression: &str, frame: Option<usize>) -> Result<RemoteValue>;

    /// Defined only while paused; `None` while running.
    fn get_location(&mut self) -> Result<Option<Location>>;

    fn pause(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
    fn step_into(&mut self) -> Result<()>;
    fn step_over(&mut self) -> Result<()>;
    fn step_out(&mut self) -> Result<()>;

    /// Resolves the breakpoint's location against the loaded-script registry
    /// and installs it. Fails with `AmbiguousLocation` when no script
    /// matches; success is followed by a `BreakpointResolved` event.
    fn set_breakpoint(&mut self, bp: &Breakpoint) -> Result<()>;
    fn remove_breakpoint(&mut self, bp: &Breakpoint) -> Result<()>;

    fn set_break_on_exceptions(&mut self, mode: ExceptionMode) -> Result<()>;

    /// Every registered source URL whose path suffix matches, most recently
    /// loaded first; empty if none.
    fn find_loaded_file(&mut self, suffix: &str) -> Result<Vec<String>>;

    /// The call stack of the paused runtime; fails with `NotPaused` while
    /// running.
    fn get_stack(&mut self) -> Result<Vec<Frame>>;

    /// A few source lines around `location`, for announcements. `None` when
    /// the backend cannot produce the source.
    fn source_context(&mut self, location: &Location) -> Result<Option<String>>;

    /// Path injected into the spawned debuggee so it auto-activates the
    /// protocol. Opaque to everything but the launcher.
    fn bootloader_path(&self) -> &Path;

    /// Hands out the event stream. Single consumer; returns `None` once
    /// taken.
    fn take_events(&mut self) -> Option<Receiver<EngineEvent>>;
}
