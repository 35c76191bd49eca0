// Shared test doubles: a scriptable in-memory engine and a scripted REPL
// I/O surface, so session and prompt-loop behavior can be exercised without
// a live runtime. Each test binary uses a subset.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use jsdbg::engine::{Engine, EngineEvent, PauseState, RemoteValue};
use jsdbg::error::{Error, ExceptionMode, Result};
use jsdbg::location::{Breakpoint, Frame, Location};
use jsdbg::repl::{ReadOutcome, ReplIo};

#[derive(Default)]
pub struct FakeState {
    pub calls: Vec<String>,
    pub current: Option<Location>,
    /// Pauses to emit, front first, whenever a resume or step is requested.
    pub auto_pause: VecDeque<(PauseState, Option<Location>)>,
    /// When set, breakpoint removal fails as if the wire refused it.
    pub fail_remove: bool,
}

/// Test-side handle kept after the engine moves into the session.
pub struct FakeHandle {
    pub state: Arc<Mutex<FakeState>>,
    pub events: Sender<EngineEvent>,
}

impl FakeHandle {
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn set_current(&self, location: Location) {
        self.state.lock().unwrap().current = Some(location);
    }

    pub fn fail_removals(&self) {
        self.state.lock().unwrap().fail_remove = true;
    }

    pub fn queue_pause(&self, state: PauseState, location: Option<Location>) {
        self.state
            .lock()
            .unwrap()
            .auto_pause
            .push_back((state, location));
    }
}

pub struct FakeEngine {
    scripts: Vec<String>,
    state: Arc<Mutex<FakeState>>,
    event_tx: Sender<EngineEvent>,
    events: Option<Receiver<EngineEvent>>,
    bootloader: PathBuf,
}

impl FakeEngine {
    pub fn new(scripts: &[&str]) -> (Self, FakeHandle) {
        let (event_tx, events) = channel();
        let state = Arc::new(Mutex::new(FakeState::default()));
        let handle = FakeHandle {
            state: state.clone(),
            events: event_tx.clone(),
        };
        let engine = Self {
            scripts: scripts.iter().map(|s| s.to_string()).collect(),
            state,
            event_tx,
            events: Some(events),
            bootloader: PathBuf::from("/tmp/fake-bootloader.js"),
        };
        (engine, handle)
    }

    fn log(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    /// Emits the next queued pause, mirroring a runtime that runs until its
    /// next stop after any resume-like request.
    fn run_until_next_pause(&self) {
        let next = self.state.lock().unwrap().auto_pause.pop_front();
        if let Some((pause, location)) = next {
            let _ = self.event_tx.send(EngineEvent::Resumed);
            self.state.lock().unwrap().current = location.clone();
            let _ = self.event_tx.send(EngineEvent::Paused {
                state: pause,
                location,
            });
        }
    }
}

impl Engine for FakeEngine {
    fn connect(&mut self, address: &str) -> Result<()> {
        self.log(format!("connect {address}"));
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.log("disconnect".to_string());
        Ok(())
    }

    fn eval(&mut self, expression: &str, _frame: Option<usize>) -> Result<RemoteValue> {
        self.log(format!("eval {expression}"));
        Ok(RemoteValue {
            description: format!("<{expression}>"),
            value: None,
        })
    }

    fn get_location(&mut self) -> Result<Option<Location>> {
        Ok(self.state.lock().unwrap().current.clone())
    }

    fn pause(&mut self) -> Result<()> {
        self.log("pause".to_string());
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.log("resume".to_string());
        self.run_until_next_pause();
        Ok(())
    }

    fn step_into(&mut self) -> Result<()> {
        self.log("step_into".to_string());
        self.run_until_next_pause();
        Ok(())
    }

    fn step_over(&mut self) -> Result<()> {
        self.log("step_over".to_string());
        self.run_until_next_pause();
        Ok(())
    }

    fn step_out(&mut self) -> Result<()> {
        self.log("step_out".to_string());
        self.run_until_next_pause();
        Ok(())
    }

    fn set_breakpoint(&mut self, bp: &Breakpoint) -> Result<()> {
        self.log(format!("set_breakpoint {bp}"));
        let _ = self.event_tx.send(EngineEvent::BreakpointResolved {
            location: bp.location.clone(),
        });
        Ok(())
    }

    fn remove_breakpoint(&mut self, bp: &Breakpoint) -> Result<()> {
        self.log(format!("remove_breakpoint {bp}"));
        if self.state.lock().unwrap().fail_remove {
            return Err(Error::EngineRequest {
                method: "Debugger.removeBreakpoint".to_string(),
                message: "refused".to_string(),
            });
        }
        Ok(())
    }

    fn set_break_on_exceptions(&mut self, mode: ExceptionMode) -> Result<()> {
        self.log(format!("set_break_on_exceptions {mode}"));
        Ok(())
    }

    fn find_loaded_file(&mut self, suffix: &str) -> Result<Vec<String>> {
        Ok(self
            .scripts
            .iter()
            .rev()
            .filter(|url| {
                url.as_str() == suffix
                    || url.ends_with(&format!("/{suffix}"))
            })
            .cloned()
            .collect())
    }

    fn get_stack(&mut self) -> Result<Vec<Frame>> {
        match self.state.lock().unwrap().current.clone() {
            Some(location) => Ok(vec![Frame {
                function: "main".to_string(),
                location,
            }]),
            None => Err(Error::NotPaused),
        }
    }

    fn source_context(&mut self, _location: &Location) -> Result<Option<String>> {
        Ok(None)
    }

    fn bootloader_path(&self) -> &Path {
        &self.bootloader
    }

    fn take_events(&mut self) -> Option<Receiver<EngineEvent>> {
        self.events.take()
    }
}

/// Scripted prompt I/O. Every prompt shown is recorded into the transcript
/// as `[prompt]...` so tests can assert ordering of output against prompts.
pub struct ScriptedIo {
    inputs: VecDeque<String>,
    pub transcript: Vec<String>,
    history: Vec<String>,
}

impl ScriptedIo {
    pub fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            transcript: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn output_lines(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter(|l| !l.starts_with("[prompt]"))
            .map(String::as_str)
            .collect()
    }
}

impl ReplIo for ScriptedIo {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        self.transcript.push(format!("[prompt]{prompt}"));
        match self.inputs.pop_front() {
            Some(line) => Ok(ReadOutcome::Line(line)),
            None => Ok(ReadOutcome::Eof),
        }
    }

    fn output_line(&mut self, line: &str) {
        self.transcript.push(line.to_string());
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }

    fn history(&self) -> &[String] {
        &self.history
    }
}
