//! Spawns a debuggee with the engine's bootloader injected and attaches to
//! it. The bootloader opens the debug port inside the child, writes the
//! WebSocket address to a handshake file, and holds the runtime before the
//! first user instruction until we connect and release it. That hold is what
//! makes breakpoints on the debuggee's first lines reliable.

use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::{Duration, Instant};

use log::{debug, info};
use rand::Rng;

use crate::engine::{engine_from_exe, Engine};
use crate::error::{Error, Result};
use crate::session::DebugSession;

/// How long we wait for the bootloader to publish its address.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const HANDSHAKE_POLL: Duration = Duration::from_millis(50);

/// Launches `argv` (program plus arguments, already split) under the
/// debugger and returns a session attached to it, paused at the debuggee's
/// entry.
pub fn launch(argv: &[String]) -> Result<DebugSession> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::Launch("empty command line".to_string()))?;

    let exe = find_in_path(program)
        .ok_or_else(|| Error::Launch(format!("'{program}' not found in PATH")))?;
    let mut engine = engine_from_exe(&exe)?;

    let port: u16 = rand::thread_rng().gen_range(9000..=10000);
    let handshake = std::env::temp_dir().join(format!("jsdbg-handshake-{}", std::process::id()));
    let _ = std::fs::remove_file(&handshake);

    let mut child = spawn_debuggee(&exe, args, engine.bootloader_path(), port, &handshake)?;
    info!("spawned '{}' (pid {}) on debug port {port}", exe.display(), child.id());

    let address = match wait_for_handshake(&handshake, &mut child) {
        Ok(address) => address,
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
    };
    let _ = std::fs::remove_file(&handshake);

    engine.connect(&address)?;
    // Pause first, then release the runtime: the entry stop is already
    // queued when the first user instruction becomes runnable.
    engine.pause()?;
    engine.run_if_waiting()?;

    Ok(DebugSession::new(Box::new(engine), Some(child)))
}

/// Launches a shell-style command line, split with shell quoting rules, so
/// `node "my file.js"` keeps the space inside the argument.
pub fn launch_line(command_line: &str) -> Result<DebugSession> {
    let argv = shlex::split(command_line).ok_or_else(|| {
        Error::Launch(format!("could not split command line '{command_line}'"))
    })?;
    launch(&argv)
}

fn spawn_debuggee(
    exe: &Path,
    args: &[String],
    bootloader: &Path,
    port: u16,
    handshake: &Path,
) -> Result<Child> {
    let require = format!("--require \"{}\"", bootloader.display());
    let node_options = match std::env::var("NODE_OPTIONS") {
        Ok(existing) if !existing.trim().is_empty() => format!("{existing} {require}"),
        _ => require,
    };

    let child = Command::new(exe)
        .args(args)
        .env("NODE_OPTIONS", node_options)
        .env("JSDBG_PORT", port.to_string())
        .env("JSDBG_HANDSHAKE_FILE", handshake)
        .spawn()
        .map_err(|e| Error::Launch(format!("could not spawn '{}': {e}", exe.display())))?;
    Ok(child)
}

/// Polls the handshake file for the WebSocket address. A debuggee that exits
/// before publishing (bad script path, crashing bootstrap) is reported as
/// such instead of timing out.
fn wait_for_handshake(handshake: &Path, child: &mut Child) -> Result<String> {
    let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
    loop {
        if let Ok(text) = std::fs::read_to_string(handshake) {
            let address = text.trim();
            if !address.is_empty() {
                debug!("debuggee published {address}");
                return Ok(address.to_string());
            }
        }
        if let Ok(Some(status)) = child.try_wait() {
            return Err(Error::Launch(format!(
                "debuggee exited ({status}) before the debug port came up"
            )));
        }
        if Instant::now() >= deadline {
            return Err(Error::Launch(
                "timed out waiting for the debuggee's debug port".to_string(),
            ));
        }
        std::thread::sleep(HANDSHAKE_POLL);
    }
}

/// Resolves a program name against PATH, honoring absolute and relative
/// paths as given. Appends `.exe` on Windows when needed.
fn find_in_path(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let with_exe = dir.join(format!("{program}.exe"));
            if with_exe.is_file() {
                return Some(with_exe);
            }
        }
    }
    None
}
