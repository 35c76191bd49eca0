//! Chrome DevTools Protocol backend. One transport thread owns the
//! WebSocket and multiplexes outbound JSON-RPC calls with inbound traffic;
//! responses are routed back over per-call reply channels and protocol
//! events are translated into [`EngineEvent`]s through an explicit event
//! map. Script ids and breakpoint ids never leave this module.

use std::collections::HashMap;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::registry::ScriptRegistry;
use super::{Engine, EngineEvent, PauseState, RemoteValue};
use crate::error::{Error, ExceptionMode, Result};
use crate::location::{Breakpoint, Frame, Location};

/// Outbound JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

/// Inbound envelope: a response carries `id` and one of `result`/`error`,
/// an event carries `method` and `params`.
#[derive(Debug, Deserialize)]
struct WireMessage {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<WireError>,
    method: Option<String>,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
}

/// Abstract event names mapped to their protocol-specific names. Kept as an
/// enumerated table so adding a backend means adding a table, not
/// reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireEvent {
    Paused,
    Resumed,
    ScriptParsed,
    ScriptFailedToParse,
    BreakpointResolved,
}

const EVENT_MAP: &[(&str, WireEvent)] = &[
    ("Debugger.paused", WireEvent::Paused),
    ("Debugger.resumed", WireEvent::Resumed),
    ("Debugger.scriptParsed", WireEvent::ScriptParsed),
    ("Debugger.scriptFailedToParse", WireEvent::ScriptFailedToParse),
    ("Debugger.breakpointResolved", WireEvent::BreakpointResolved),
];

fn wire_event(method: &str) -> Option<WireEvent> {
    EVENT_MAP
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, evt)| *evt)
}

enum TransportCmd {
    Call {
        id: u64,
        method: &'static str,
        payload: String,
        reply: Sender<Result<Value>>,
    },
    Close,
}

/// Call frame as cached from the last `paused` event. The call frame id is
/// needed for frame-scoped evaluation and stays private.
#[derive(Debug, Clone)]
struct FrameRecord {
    call_frame_id: String,
    function: String,
    location: Location,
}

/// State shared between the transport thread (writer) and engine calls
/// (readers). Registry mutation and lookup share this one mutex, so no
/// lookup can race a `scriptParsed` in flight.
#[derive(Debug, Default)]
struct Shared {
    registry: ScriptRegistry,
    current_location: Option<Location>,
    frames: Vec<FrameRecord>,
}

type BreakpointKey = (String, u32, u32, Option<String>);

fn breakpoint_key(bp: &Breakpoint) -> BreakpointKey {
    (
        bp.location.source_url.clone(),
        bp.location.line,
        bp.location.col.unwrap_or(0),
        bp.condition.clone(),
    )
}

pub struct CdpEngine {
    bootloader: PathBuf,
    shared: Arc<Mutex<Shared>>,
    cmd_tx: Option<Sender<TransportCmd>>,
    events: Option<Receiver<EngineEvent>>,
    event_tx: Option<Sender<EngineEvent>>,
    transport: Option<JoinHandle<()>>,
    next_id: u64,
    /// (location, condition) -> backend breakpoint id.
    breakpoint_ids: HashMap<BreakpointKey, String>,
    /// Backend script id -> source lines.
    source_cache: HashMap<String, Vec<String>>,
}

impl CdpEngine {
    pub fn new(bootloader: PathBuf) -> Self {
        Self {
            bootloader,
            shared: Arc::new(Mutex::new(Shared::default())),
            cmd_tx: None,
            events: None,
            event_tx: None,
            transport: None,
            next_id: 0,
            breakpoint_ids: HashMap::new(),
            source_cache: HashMap::new(),
        }
    }

    fn call(&mut self, method: &'static str, params: Value) -> Result<Value> {
        let tx = self.cmd_tx.as_ref().ok_or(Error::EngineRequest {
            method: method.to_string(),
            message: "engine is not connected".to_string(),
        })?;

        self.next_id += 1;
        let id = self.next_id;
        let payload = serde_json::to_string(&WireRequest { id, method, params })
            .map_err(|e| Error::EngineRequest {
                method: method.to_string(),
                message: e.to_string(),
            })?;

        let (reply_tx, reply_rx) = channel();
        tx.send(TransportCmd::Call {
            id,
            method,
            payload,
            reply: reply_tx,
        })
        .map_err(|_| Error::ConnectionLost)?;

        // A dropped reply sender means the transport died mid-call.
        reply_rx.recv().map_err(|_| Error::ConnectionLost)?
    }

    /// Releases a runtime that was started waiting for a debugger. Node
    /// backends call this once after `connect`; not part of the generic
    /// engine contract.
    pub fn run_if_waiting(&mut self) -> Result<()> {
        self.call("Runtime.runIfWaitingForDebugger", json!({}))
            .map(|_| ())
    }

    fn lock_shared(&self) -> std::sync::MutexGuard<'_, Shared> {
        // The transport thread never panics while holding the lock.
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn script_source(&mut self, script_id: &str) -> Result<Option<Vec<String>>> {
        if let Some(lines) = self.source_cache.get(script_id) {
            return Ok(Some(lines.clone()));
        }
        let result = self.call(
            "Debugger.getScriptSource",
            json!({ "scriptId": script_id }),
        );
        let result = match result {
            Ok(v) => v,
            Err(Error::EngineRequest { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let lines: Vec<String> = result
            .get("scriptSource")
            .and_then(Value::as_str)
            .unwrap_or("")
            .lines()
            .map(str::to_string)
            .collect();
        self.source_cache.insert(script_id.to_string(), lines.clone());
        Ok(Some(lines))
    }
}

impl Engine for CdpEngine {
    fn connect(&mut self, address: &str) -> Result<()> {
        let address = url::Url::parse(address).map_err(|e| Error::Connect {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
        if address.scheme() != "ws" && address.scheme() != "wss" {
            return Err(Error::Connect {
                address: address.to_string(),
                reason: format!("unsupported scheme '{}'", address.scheme()),
            });
        }
        info!("connecting to {address}");
        let (mut socket, _response) =
            tungstenite::connect(address.as_str()).map_err(|e| Error::Connect {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        // The transport thread polls: short read timeouts let it interleave
        // outbound calls with inbound traffic on one socket.
        if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
            stream
                .set_read_timeout(Some(Duration::from_millis(50)))
                .map_err(|e| Error::Connect {
                    address: address.to_string(),
                    reason: e.to_string(),
                })?;
        }

        let (cmd_tx, cmd_rx) = channel();
        let (event_tx, event_rx) = channel();
        let shared = Arc::clone(&self.shared);
        let thread_event_tx = event_tx.clone();
        let handle = thread::spawn(move || {
            transport_loop(socket, cmd_rx, thread_event_tx, shared);
        });

        self.cmd_tx = Some(cmd_tx);
        self.events = Some(event_rx);
        self.event_tx = Some(event_tx);
        self.transport = Some(handle);

        self.call("Debugger.enable", json!({}))?;
        self.call("Runtime.enable", json!({}))?;
        info!("connected, debugger enabled");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(TransportCmd::Close);
        }
        if let Some(handle) = self.transport.take() {
            let _ = handle.join();
        }
        self.event_tx = None;
        debug!("connection closed");
        Ok(())
    }

    fn eval(&mut self, expression: &str, frame: Option<usize>) -> Result<RemoteValue> {
        let frame_id = {
            let shared = self.lock_shared();
            match shared.frames.get(frame.unwrap_or(0)) {
                Some(f) => f.call_frame_id.clone(),
                None => return Err(Error::NotPaused),
            }
        };
        let result = self.call(
            "Debugger.evaluateOnCallFrame",
            json!({
                "callFrameId": frame_id,
                "expression": expression,
                "returnByValue": false,
                "generatePreview": true,
            }),
        )?;

        if let Some(details) = result.get("exceptionDetails") {
            let text = details
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(Value::as_str)
                .or_else(|| details.get("text").and_then(Value::as_str))
                .unwrap_or("evaluation threw");
            return Err(Error::EngineRequest {
                method: "Debugger.evaluateOnCallFrame".to_string(),
                message: text.to_string(),
            });
        }

        Ok(remote_value(result.get("result").unwrap_or(&Value::Null)))
    }

    fn get_location(&mut self) -> Result<Option<Location>> {
        Ok(self.lock_shared().current_location.clone())
    }

    fn pause(&mut self) -> Result<()> {
        self.call("Debugger.pause", json!({})).map(|_| ())
    }

    fn resume(&mut self) -> Result<()> {
        self.call("Debugger.resume", json!({})).map(|_| ())
    }

    fn step_into(&mut self) -> Result<()> {
        self.call("Debugger.stepInto", json!({})).map(|_| ())
    }

    fn step_over(&mut self) -> Result<()> {
        self.call("Debugger.stepOver", json!({})).map(|_| ())
    }

    fn step_out(&mut self) -> Result<()> {
        self.call("Debugger.stepOut", json!({})).map(|_| ())
    }

    fn set_breakpoint(&mut self, bp: &Breakpoint) -> Result<()> {
        {
            let shared = self.lock_shared();
            if shared.registry.id_for_url(&bp.location.source_url).is_none() {
                return Err(Error::AmbiguousLocation {
                    query: bp.location.source_url.clone(),
                    candidates: Vec::new(),
                });
            }
        }

        let mut params = json!({
            "url": bp.location.source_url,
            // The wire speaks 0-based lines; the domain model is 1-based.
            "lineNumber": bp.location.line.saturating_sub(1),
            "columnNumber": bp.location.col.unwrap_or(0),
        });
        if let Some(cond) = &bp.condition {
            params["condition"] = Value::String(cond.clone());
        }

        let result = self.call("Debugger.setBreakpointByUrl", params)?;
        let backend_id = result
            .get("breakpointId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::EngineRequest {
                method: "Debugger.setBreakpointByUrl".to_string(),
                message: "response carried no breakpoint id".to_string(),
            })?
            .to_string();
        self.breakpoint_ids.insert(breakpoint_key(bp), backend_id);

        // For already-loaded scripts resolution happens in the response, not
        // via a later breakpointResolved event; surface it uniformly.
        let resolved = result
            .get("locations")
            .and_then(Value::as_array)
            .and_then(|locs| locs.first())
            .and_then(|loc| self.lock_shared().location_from_wire(loc));
        if let (Some(location), Some(tx)) = (resolved, &self.event_tx) {
            let _ = tx.send(EngineEvent::BreakpointResolved { location });
        }
        Ok(())
    }

    fn remove_breakpoint(&mut self, bp: &Breakpoint) -> Result<()> {
        let backend_id = match self.breakpoint_ids.remove(&breakpoint_key(bp)) {
            Some(id) => id,
            None => return Ok(()),
        };
        self.call(
            "Debugger.removeBreakpoint",
            json!({ "breakpointId": backend_id }),
        )
        .map(|_| ())
    }

    fn set_break_on_exceptions(&mut self, mode: ExceptionMode) -> Result<()> {
        self.call(
            "Debugger.setPauseOnExceptions",
            json!({ "state": mode.to_string() }),
        )
        .map(|_| ())
    }

    fn find_loaded_file(&mut self, suffix: &str) -> Result<Vec<String>> {
        Ok(self.lock_shared().registry.find_by_suffix(suffix))
    }

    fn get_stack(&mut self) -> Result<Vec<Frame>> {
        let shared = self.lock_shared();
        if shared.frames.is_empty() {
            return Err(Error::NotPaused);
        }
        Ok(shared
            .frames
            .iter()
            .map(|f| Frame {
                function: f.function.clone(),
                location: f.location.clone(),
            })
            .collect())
    }

    fn source_context(&mut self, location: &Location) -> Result<Option<String>> {
        let script_id = match self
            .lock_shared()
            .registry
            .id_for_url(&location.source_url)
            .map(str::to_string)
        {
            Some(id) => id,
            None => return Ok(None),
        };
        let lines = match self.script_source(&script_id)? {
            Some(lines) => lines,
            None => return Ok(None),
        };
        Ok(Some(render_window(&lines, location.line, 3)))
    }

    fn bootloader_path(&self) -> &Path {
        &self.bootloader
    }

    fn take_events(&mut self) -> Option<Receiver<EngineEvent>> {
        self.events.take()
    }
}

impl Drop for CdpEngine {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

impl Shared {
    /// Translates a wire location (`scriptId` + 0-based line) into a domain
    /// location, if the script is registered.
    fn location_from_wire(&self, loc: &Value) -> Option<Location> {
        let script_id = loc.get("scriptId").and_then(Value::as_str)?;
        let url = self.registry.url_for_id(script_id)?;
        if url.is_empty() {
            return None;
        }
        let line = loc.get("lineNumber").and_then(Value::as_u64)? as u32 + 1;
        let col = loc
            .get("columnNumber")
            .and_then(Value::as_u64)
            .map(|c| c as u32);
        Some(Location::new(url, line, col))
    }
}

/// Renders a window of `half` lines either side of the 1-based `line`, with
/// the current line marked.
fn render_window(lines: &[String], line: u32, half: usize) -> String {
    // A requested line past the end of the script clamps to the last line.
    let current = (line.saturating_sub(1) as usize).min(lines.len().saturating_sub(1));
    let start = current.saturating_sub(half);
    let end = (current + half + 1).min(lines.len());
    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let marker = if start + i == current { "->" } else { " |" };
            format!("{} {}", marker, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn remote_value(result: &Value) -> RemoteValue {
    let description = result
        .get("value")
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .or_else(|| {
            result
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| {
            result
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "undefined".to_string());
    RemoteValue {
        description,
        value: result.get("value").cloned(),
    }
}

fn pause_state_from(reason: &str, uncaught: Option<bool>, hit_breakpoints: bool) -> PauseState {
    if hit_breakpoints {
        PauseState::Breakpoint
    } else if reason == "exception" || reason == "promiseRejection" {
        if uncaught.unwrap_or(true) {
            PauseState::UncaughtException
        } else {
            PauseState::CaughtException
        }
    } else {
        // V8 reports both `debugger;` statements and operator-requested
        // pauses as "other".
        PauseState::DebuggerStatement
    }
}

fn transport_loop(
    mut socket: WebSocket<MaybeTlsStream<TcpStream>>,
    cmd_rx: Receiver<TransportCmd>,
    event_tx: Sender<EngineEvent>,
    shared: Arc<Mutex<Shared>>,
) {
    let mut pending: HashMap<u64, (&'static str, Sender<Result<Value>>)> = HashMap::new();

    'outer: loop {
        // Flush outbound calls first so a request never waits on the poll
        // interval.
        loop {
            match cmd_rx.try_recv() {
                Ok(TransportCmd::Call {
                    id,
                    method,
                    payload,
                    reply,
                }) => {
                    debug!("-> {payload}");
                    if let Err(e) = socket.send(Message::Text(payload)) {
                        warn!("send failed: {e}");
                        let _ = reply.send(Err(Error::ConnectionLost));
                        break 'outer;
                    }
                    pending.insert(id, (method, reply));
                }
                Ok(TransportCmd::Close) => {
                    let _ = socket.close(None);
                    // Drain the close handshake without reporting a loss.
                    for (_, (_, reply)) in pending.drain() {
                        let _ = reply.send(Err(Error::ConnectionLost));
                    }
                    return;
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => break,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    return;
                }
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                handle_wire_message(&text, &mut pending, &event_tx, &shared);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // Poll tick; loop back to check for outbound work.
            }
            Err(e) => {
                warn!("wire read failed: {e}");
                break;
            }
        }
    }

    // The wire dropped: fail every in-flight call and tell the session.
    for (_, (_, reply)) in pending.drain() {
        let _ = reply.send(Err(Error::ConnectionLost));
    }
    if let Ok(mut shared) = shared.lock() {
        shared.current_location = None;
        shared.frames.clear();
    }
    let _ = event_tx.send(EngineEvent::ConnectionLost);
}

fn handle_wire_message(
    text: &str,
    pending: &mut HashMap<u64, (&'static str, Sender<Result<Value>>)>,
    event_tx: &Sender<EngineEvent>,
    shared: &Arc<Mutex<Shared>>,
) {
    debug!("<- {text}");
    let msg: WireMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("unparseable wire message: {e}");
            return;
        }
    };

    if let Some(id) = msg.id {
        if let Some((method, reply)) = pending.remove(&id) {
            let outcome = match (msg.result, msg.error) {
                (_, Some(err)) => Err(Error::EngineRequest {
                    method: method.to_string(),
                    message: err.message,
                }),
                (Some(result), None) => Ok(result),
                (None, None) => Ok(Value::Null),
            };
            let _ = reply.send(outcome);
        } else {
            warn!("response for unknown call id {id}");
        }
        return;
    }

    let method = match msg.method.as_deref() {
        Some(m) => m,
        None => return,
    };
    let Some(evt) = wire_event(method) else {
        return;
    };
    let params = &msg.params;

    let event = {
        let mut shared = match shared.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match evt {
            WireEvent::ScriptParsed => {
                let id = params
                    .get("scriptId")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let url = params
                    .get("url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                shared.registry.insert(id, url.clone());
                if url.is_empty() {
                    None
                } else {
                    Some(EngineEvent::ScriptParsed { url })
                }
            }
            WireEvent::ScriptFailedToParse => params
                .get("url")
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(|url| EngineEvent::ScriptFailedToParse {
                    url: url.to_string(),
                }),
            WireEvent::Paused => {
                let frames: Vec<FrameRecord> = params
                    .get("callFrames")
                    .and_then(Value::as_array)
                    .map(|frames| {
                        frames
                            .iter()
                            .filter_map(|f| {
                                let location =
                                    shared.location_from_wire(f.get("location")?)?;
                                Some(FrameRecord {
                                    call_frame_id: f
                                        .get("callFrameId")
                                        .and_then(Value::as_str)?
                                        .to_string(),
                                    function: f
                                        .get("functionName")
                                        .and_then(Value::as_str)
                                        .filter(|n| !n.is_empty())
                                        .unwrap_or("(anonymous)")
                                        .to_string(),
                                    location,
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                let reason = params
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("other");
                let uncaught = params
                    .get("data")
                    .and_then(|d| d.get("uncaught"))
                    .and_then(Value::as_bool);
                let hit = params
                    .get("hitBreakpoints")
                    .and_then(Value::as_array)
                    .map(|h| !h.is_empty())
                    .unwrap_or(false);

                let location = frames.first().map(|f| f.location.clone());
                shared.current_location = location.clone();
                shared.frames = frames;

                Some(EngineEvent::Paused {
                    state: pause_state_from(reason, uncaught, hit),
                    location,
                })
            }
            WireEvent::Resumed => {
                // No known location while running.
                shared.current_location = None;
                shared.frames.clear();
                Some(EngineEvent::Resumed)
            }
            WireEvent::BreakpointResolved => params
                .get("location")
                .and_then(|loc| shared.location_from_wire(loc))
                .map(|location| EngineEvent::BreakpointResolved { location }),
        }
    };

    if let Some(event) = event {
        let _ = event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_map_covers_all_subscribed_events() {
        assert_eq!(wire_event("Debugger.paused"), Some(WireEvent::Paused));
        assert_eq!(wire_event("Debugger.resumed"), Some(WireEvent::Resumed));
        assert_eq!(
            wire_event("Debugger.scriptParsed"),
            Some(WireEvent::ScriptParsed)
        );
        assert_eq!(
            wire_event("Debugger.scriptFailedToParse"),
            Some(WireEvent::ScriptFailedToParse)
        );
        assert_eq!(
            wire_event("Debugger.breakpointResolved"),
            Some(WireEvent::BreakpointResolved)
        );
        assert_eq!(wire_event("Profiler.start"), None);
    }

    #[test]
    fn pause_state_mapping() {
        assert_eq!(pause_state_from("other", None, true), PauseState::Breakpoint);
        assert_eq!(
            pause_state_from("other", None, false),
            PauseState::DebuggerStatement
        );
        assert_eq!(
            pause_state_from("exception", Some(false), false),
            PauseState::CaughtException
        );
        assert_eq!(
            pause_state_from("exception", Some(true), false),
            PauseState::UncaughtException
        );
        // Breakpoint hits win over the reported reason.
        assert_eq!(
            pause_state_from("exception", Some(true), true),
            PauseState::Breakpoint
        );
    }

    #[test]
    fn paused_event_translates_frames_through_registry() {
        let shared = Arc::new(Mutex::new(Shared::default()));
        shared
            .lock()
            .unwrap()
            .registry
            .insert("42".into(), "file:///app.js".into());
        let (event_tx, event_rx) = channel();
        let mut pending = HashMap::new();

        let paused = serde_json::json!({
            "method": "Debugger.paused",
            "params": {
                "reason": "other",
                "hitBreakpoints": ["some-backend-id"],
                "callFrames": [{
                    "callFrameId": "frame-0",
                    "functionName": "",
                    "location": { "scriptId": "42", "lineNumber": 9, "columnNumber": 2 }
                }]
            }
        });
        handle_wire_message(&paused.to_string(), &mut pending, &event_tx, &shared);

        let event = event_rx.try_recv().expect("paused event");
        assert_eq!(
            event,
            EngineEvent::Paused {
                state: PauseState::Breakpoint,
                location: Some(Location::new("file:///app.js", 10, Some(2))),
            }
        );
        let guard = shared.lock().unwrap();
        assert_eq!(guard.frames.len(), 1);
        assert_eq!(guard.frames[0].function, "(anonymous)");
    }

    #[test]
    fn resumed_event_clears_location() {
        let shared = Arc::new(Mutex::new(Shared::default()));
        shared.lock().unwrap().current_location =
            Some(Location::new("file:///app.js", 1, None));
        let (event_tx, event_rx) = channel();
        let mut pending = HashMap::new();

        handle_wire_message(
            r#"{"method":"Debugger.resumed","params":{}}"#,
            &mut pending,
            &event_tx,
            &shared,
        );

        assert_eq!(event_rx.try_recv().unwrap(), EngineEvent::Resumed);
        assert!(shared.lock().unwrap().current_location.is_none());
    }

    #[test]
    fn error_responses_become_engine_request_failures() {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let (event_tx, _event_rx) = channel();
        let (reply_tx, reply_rx) = channel();
        let mut pending = HashMap::new();
        pending.insert(7, ("Debugger.pause", reply_tx));

        handle_wire_message(
            r#"{"id":7,"error":{"code":-32000,"message":"nope"}}"#,
            &mut pending,
            &event_tx,
            &shared,
        );

        match reply_rx.try_recv().unwrap() {
            Err(Error::EngineRequest { method, message }) => {
                assert_eq!(method, "Debugger.pause");
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn render_window_marks_current_line() {
        let lines: Vec<String> = (1..=10).map(|i| format!("line {i}")).collect();
        let window = render_window(&lines, 5, 2);
        assert_eq!(
            window,
            " | line 3\n | line 4\n-> line 5\n | line 6\n | line 7"
        );
        // Window clamps at file edges.
        let window = render_window(&lines, 1, 2);
        assert!(window.starts_with("-> line 1"));
    }

    #[test]
    fn render_window_clamps_lines_past_end_of_script() {
        let lines: Vec<String> = (1..=5).map(|i| format!("line {i}")).collect();
        let window = render_window(&lines, 100, 3);
        assert!(window.ends_with("-> line 5"));

        assert_eq!(render_window(&[], 100, 3), "");
    }
}
