//! The REPL driver: schedules prompts, interprets dispatch outcomes, and
//! resumes the prompt loop exactly when the session re-enters a paused
//! state. One logical thread of control; the only trustworthy confirmation
//! of a pause/resume transition is the engine event, never a call's return.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use log::debug;

use crate::commands::{CommandContext, CommandRegistry, Outcome};
use crate::engine::{EngineEvent, PauseState};
use crate::error::{Error, Result};
use crate::location::Location;
use crate::session::DebugSession;

const PROMPT: &str = "(jsdbg) ";

/// How often the event wait wakes up to honor an interrupt request.
const INTERRUPT_POLL: Duration = Duration::from_millis(100);

/// One prompt read, as seen by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-C at the prompt: a pause request, not an abort.
    Interrupted,
    Eof,
}

/// The I/O surface commands and the driver share. Implemented over
/// rustyline for the real terminal and over scripted data in tests.
pub trait ReplIo {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;
    fn output_line(&mut self, line: &str);
    fn add_history(&mut self, line: &str);
    /// All previously entered lines, oldest first, seeded from the
    /// persisted history file.
    fn history(&self) -> &[String];
}

/// Why the loop ended. Propagated to the entry point for structured
/// teardown instead of exiting the process from inside the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    UserQuit,
    ConnectionLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingPrompt,
    SessionRunning,
}

pub struct Repl<I: ReplIo> {
    io: I,
    registry: CommandRegistry,
    session: DebugSession,
    events: Receiver<EngineEvent>,
    interrupted: Arc<AtomicBool>,
}

impl<I: ReplIo> Repl<I> {
    pub fn new(io: I, mut session: DebugSession, interrupted: Arc<AtomicBool>) -> Result<Self> {
        let events = session
            .take_events()
            .ok_or_else(|| Error::Launch("engine event stream already taken".to_string()))?;
        Ok(Self {
            io,
            registry: CommandRegistry::new(),
            session,
            events,
            interrupted,
        })
    }

    pub fn session_mut(&mut self) -> &mut DebugSession {
        &mut self.session
    }

    pub fn into_parts(self) -> (I, DebugSession) {
        (self.io, self.session)
    }

    /// Runs the loop to completion. With `start_running` the driver begins
    /// in the session-running state, waiting for the launcher's entry pause
    /// to land before the first prompt.
    pub fn run(&mut self, start_running: bool) -> Result<Shutdown> {
        let mut state = if start_running {
            State::SessionRunning
        } else {
            State::AwaitingPrompt
        };

        loop {
            match state {
                State::AwaitingPrompt => {
                    if let Some(shutdown) = self.drain_pending_events()? {
                        return Ok(shutdown);
                    }
                    match self.io.read_line(PROMPT)? {
                        ReadOutcome::Line(line) => {
                            let line = line.trim().to_string();
                            if !line.is_empty() {
                                self.io.add_history(&line);
                            }
                            match self.dispatch(&line) {
                                Ok(Outcome::Handled) => {}
                                Ok(Outcome::Resume) => state = State::SessionRunning,
                                Err(Error::UserQuit) => return Ok(Shutdown::UserQuit),
                                Err(e) if e.is_fatal() => {
                                    self.io.output_line(&format!("error: {e}"));
                                    return Ok(Shutdown::ConnectionLost);
                                }
                                Err(e) => self.io.output_line(&format!("error: {e}")),
                            }
                        }
                        ReadOutcome::Interrupted => self.request_pause(),
                        ReadOutcome::Eof => return Ok(Shutdown::UserQuit),
                    }
                }
                State::SessionRunning => match self.next_event() {
                    Some(event) => {
                        self.session.apply_event(&event);
                        match event {
                            EngineEvent::Paused {
                                state: pause_state,
                                location,
                            } => {
                                state = self.on_paused(pause_state, location.as_ref())?;
                            }
                            EngineEvent::ConnectionLost => {
                                self.io.output_line("connection to the debuggee was lost");
                                return Ok(Shutdown::ConnectionLost);
                            }
                            _ => {}
                        }
                    }
                    None => {
                        self.io.output_line("connection to the debuggee was lost");
                        return Ok(Shutdown::ConnectionLost);
                    }
                },
            }
        }
    }

    fn dispatch(&mut self, line: &str) -> Result<Outcome> {
        let mut ctx = CommandContext {
            session: &mut self.session,
            io: &mut self.io,
        };
        self.registry.dispatch(line, &mut ctx)
    }

    /// Handles a pause: announce the stop (location before prompt, always),
    /// then run any commands attached to a hit breakpoint. A `continue`
    /// inside attached commands keeps the session running.
    fn on_paused(
        &mut self,
        pause_state: PauseState,
        location: Option<&Location>,
    ) -> Result<State> {
        self.announce_pause(pause_state, location);
        if pause_state == PauseState::Breakpoint {
            if let Some(location) = location {
                let attached: Vec<String> = self
                    .session
                    .breakpoints_at(location)
                    .into_iter()
                    .flat_map(|bp| bp.commands.iter().cloned())
                    .collect();
                for command in attached {
                    match self.dispatch(&command) {
                        Ok(Outcome::Handled) => {}
                        Ok(Outcome::Resume) => return Ok(State::SessionRunning),
                        Err(Error::UserQuit) => return Err(Error::UserQuit),
                        Err(e) => self.io.output_line(&format!("error: {e}")),
                    }
                }
            }
        }
        Ok(State::AwaitingPrompt)
    }

    fn announce_pause(&mut self, pause_state: PauseState, location: Option<&Location>) {
        match location {
            Some(location) => {
                let header = format!("===== {location} ({}) =====", pause_state.describe());
                self.io.output_line(&header.yellow().italic().to_string());
                match self.session.source_context(location) {
                    Ok(Some(window)) => {
                        self.io.output_line(&window);
                        self.io
                            .output_line(&"==========".yellow().italic().to_string());
                    }
                    Ok(None) => {}
                    Err(e) => debug!("could not fetch source context: {e}"),
                }
            }
            None => self
                .io
                .output_line(&format!("Stopped ({})", pause_state.describe())),
        }
    }

    /// An interrupt is a request to pause, not a forced abort; a failing
    /// request is reported, never fatal.
    fn request_pause(&mut self) {
        if let Err(e) = self.session.pause() {
            self.io.output_line(&format!("pause request failed: {e}"));
        }
    }

    /// Blocks for the next event, waking periodically to honor an
    /// interrupt request from the signal handler. `None` means the event
    /// channel closed behind a dead transport.
    fn next_event(&mut self) -> Option<EngineEvent> {
        loop {
            if self.interrupted.swap(false, Ordering::SeqCst) {
                self.request_pause();
            }
            match self.events.recv_timeout(INTERRUPT_POLL) {
                Ok(event) => return Some(event),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Applies events that arrived while the prompt was idle (script loads,
    /// stray pauses). Returns a shutdown when the wire died underneath us.
    fn drain_pending_events(&mut self) -> Result<Option<Shutdown>> {
        while let Ok(event) = self.events.try_recv() {
            self.session.apply_event(&event);
            match event {
                EngineEvent::Paused {
                    state: pause_state,
                    location,
                } => {
                    // Announce, but do not re-run breakpoint commands here:
                    // the operator is already at (or about to get) a prompt.
                    self.announce_pause(pause_state, location.as_ref());
                }
                EngineEvent::ConnectionLost => {
                    self.io.output_line("connection to the debuggee was lost");
                    return Ok(Some(Shutdown::ConnectionLost));
                }
                _ => {}
            }
        }
        Ok(None)
    }
}

/// Terminal I/O over rustyline, with a newline-delimited history file.
pub struct RustylineIo {
    editor: rustyline::DefaultEditor,
    history: Vec<String>,
    history_path: Option<std::path::PathBuf>,
}

impl RustylineIo {
    pub fn new(history_path: Option<std::path::PathBuf>) -> Result<Self> {
        let mut editor = rustyline::DefaultEditor::new()
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        let mut history = Vec::new();
        if let Some(path) = &history_path {
            if let Ok(text) = std::fs::read_to_string(path) {
                for line in text.lines().filter(|l| !l.trim().is_empty()) {
                    let _ = editor.add_history_entry(line);
                    history.push(line.to_string());
                }
            }
        }
        Ok(Self {
            editor,
            history,
            history_path,
        })
    }

    /// Persists the history file. Best effort; the session's value is in
    /// the debuggee, not the history.
    pub fn save_history(&self) {
        if let Some(path) = &self.history_path {
            let mut text = self.history.join("\n");
            text.push('\n');
            if let Err(e) = std::fs::write(path, text) {
                log::warn!("could not save history to {}: {e}", path.display());
            }
        }
    }
}

impl ReplIo for RustylineIo {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(rustyline::error::ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(rustyline::error::ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(e) => Err(Error::Io(std::io::Error::other(e.to_string()))),
        }
    }

    fn output_line(&mut self, line: &str) {
        println!("{line}");
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
        self.history.push(line.to_string());
    }

    fn history(&self) -> &[String] {
        &self.history
    }
}
