//! Node.js specifics: the bootloader injected into the debuggee and
//! executable-based engine selection. The bootloader opens the inspector on
//! the port named in `JSDBG_PORT`, writes the WebSocket address to the
//! handshake file named in `JSDBG_HANDSHAKE_FILE`, and then blocks in
//! `waitForDebugger()` until we attach.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::CdpEngine;
use crate::error::{Error, Result};

const BOOTLOADER_SOURCE: &str = include_str!("bootloader.js");

/// A Node.js engine is a CDP engine plus this bootloader.
pub type NodeEngine = CdpEngine;

/// Materializes the bootloader next to the temp dir and builds an engine
/// around it. The file is rewritten on every start so upgrades never run a
/// stale copy.
pub fn node_engine() -> Result<CdpEngine> {
    let path = std::env::temp_dir().join("jsdbg-bootloader.js");
    fs::write(&path, BOOTLOADER_SOURCE)?;
    debug!("bootloader materialized at {}", path.display());
    Ok(CdpEngine::new(path))
}

/// Picks an engine implementation from the debuggee executable. Only
/// Node.js is supported today.
pub fn engine_from_exe(exe: &Path) -> Result<CdpEngine> {
    let stem = exe
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if stem == "node" {
        node_engine()
    } else {
        Err(Error::Launch(format!(
            "'{}' is not a supported JavaScript engine (supported: node)",
            exe.display()
        )))
    }
}
