//! The single authoritative view of one debugging session: breakpoint
//! bookkeeping and pause-state tracking, independent of which [`Engine`]
//! backend is plugged in. Commands go through this type, never to the
//! engine directly.

use std::process::Child;
use std::sync::mpsc::Receiver;

use log::{debug, warn};

use crate::engine::{Engine, EngineEvent, PauseState, RemoteValue};
use crate::error::{Error, ExceptionMode, Result};
use crate::location::{Breakpoint, Frame, Location};

pub struct DebugSession {
    engine: Box<dyn Engine>,
    /// Handle to the spawned debuggee, when this session launched it.
    debuggee: Option<Child>,
    breakpoints: Vec<Breakpoint>,
    /// The most recently set breakpoint, for `commands` attachment.
    last_set: Option<Breakpoint>,
    pause_state: PauseState,
}

impl DebugSession {
    pub fn new(engine: Box<dyn Engine>, debuggee: Option<Child>) -> Self {
        Self {
            engine,
            debuggee,
            breakpoints: Vec::new(),
            last_set: None,
            pause_state: PauseState::NotPaused,
        }
    }

    /// Takes the engine's event stream. Single consumer.
    pub fn take_events(&mut self) -> Option<Receiver<EngineEvent>> {
        self.engine.take_events()
    }

    /// Applies an engine-originated event. This is the only place pause
    /// state changes.
    pub fn apply_event(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Paused { state, .. } => {
                self.pause_state = *state;
            }
            EngineEvent::Resumed | EngineEvent::ConnectionLost => {
                self.pause_state = PauseState::NotPaused;
            }
            EngineEvent::ScriptParsed { url } => debug!("script parsed: {url}"),
            EngineEvent::ScriptFailedToParse { url } => {
                warn!("script failed to parse: {url}");
            }
            EngineEvent::BreakpointResolved { location } => {
                debug!("breakpoint resolved at {location}");
            }
        }
    }

    pub fn pause_state(&self) -> PauseState {
        self.pause_state
    }

    /// Requests a pause. Safe to call while already paused: the request is
    /// simply not sent again.
    pub fn pause(&mut self) -> Result<()> {
        if self.pause_state.is_paused() {
            return Ok(());
        }
        self.engine.pause()
    }

    /// Requests a resume. Safe to call while already running. Completion is
    /// observed through the `resumed`/`paused` events, never assumed from
    /// the call returning.
    pub fn resume(&mut self) -> Result<()> {
        if !self.pause_state.is_paused() {
            return Ok(());
        }
        self.engine.resume()
    }

    pub fn step_into(&mut self) -> Result<()> {
        self.engine.step_into()
    }

    pub fn step_over(&mut self) -> Result<()> {
        self.engine.step_over()
    }

    pub fn step_out(&mut self) -> Result<()> {
        self.engine.step_out()
    }

    /// Sets a breakpoint through the engine and records it, remembering it
    /// as the last-set breakpoint.
    pub fn set_breakpoint(&mut self, bp: Breakpoint) -> Result<()> {
        self.engine.set_breakpoint(&bp)?;
        // Re-setting the same (location, condition) replaces the record so
        // attached commands survive exactly one copy.
        self.breakpoints.retain(|existing| *existing != bp);
        self.breakpoints.push(bp.clone());
        self.last_set = Some(bp);
        Ok(())
    }

    /// Removes the breakpoint identified by `(location, condition)`. Local
    /// bookkeeping is pruned only after the engine confirms, so a failed
    /// wire call never leaves a breakpoint firing with no record of it.
    pub fn remove_breakpoint(&mut self, bp: &Breakpoint) -> Result<()> {
        if !self.breakpoints.iter().any(|existing| existing == bp) {
            return Err(Error::NoSuchBreakpoint(bp.to_string()));
        }
        self.engine.remove_breakpoint(bp)?;
        self.breakpoints.retain(|existing| existing != bp);
        if self.last_set.as_ref() == Some(bp) {
            self.last_set = None;
        }
        Ok(())
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn last_set_breakpoint(&self) -> Option<&Breakpoint> {
        self.last_set.as_ref()
    }

    /// Attaches auto-run commands to the last-set breakpoint. Fails when no
    /// breakpoint has been set this session.
    pub fn attach_commands_to_last(&mut self, commands: Vec<String>) -> Result<()> {
        let last = self
            .last_set
            .as_mut()
            .ok_or(Error::NoSuchBreakpoint("no breakpoint set yet".to_string()))?;
        last.commands = commands.clone();
        let key = last.clone();
        if let Some(stored) = self.breakpoints.iter_mut().find(|b| **b == key) {
            stored.commands = commands;
        }
        Ok(())
    }

    /// Breakpoints recorded at `location`, matched by source URL and line
    /// (a hit reports the resolved column, which may differ from the one
    /// the operator asked for). Several conditional breakpoints may share a
    /// line; the caller runs all of their attached commands.
    pub fn breakpoints_at(&self, location: &Location) -> Vec<&Breakpoint> {
        self.breakpoints
            .iter()
            .filter(|b| {
                b.location.source_url == location.source_url && b.location.line == location.line
            })
            .collect()
    }

    pub fn eval(&mut self, expression: &str, frame: Option<usize>) -> Result<RemoteValue> {
        self.engine.eval(expression, frame)
    }

    pub fn current_location(&mut self) -> Result<Option<Location>> {
        self.engine.get_location()
    }

    pub fn find_loaded_file(&mut self, suffix: &str) -> Result<Vec<String>> {
        self.engine.find_loaded_file(suffix)
    }

    pub fn get_stack(&mut self) -> Result<Vec<Frame>> {
        self.engine.get_stack()
    }

    pub fn source_context(&mut self, location: &Location) -> Result<Option<String>> {
        self.engine.source_context(location)
    }

    pub fn set_break_on_exceptions(&mut self, mode: ExceptionMode) -> Result<()> {
        self.engine.set_break_on_exceptions(mode)
    }

    /// Structured teardown: disconnect the wire, then take the debuggee
    /// down with us.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.engine.disconnect() {
            warn!("disconnect failed during shutdown: {e}");
        }
        if let Some(child) = self.debuggee.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
