use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use log::warn;

use jsdbg::error::Error;
use jsdbg::launch;
use jsdbg::repl::{Repl, RustylineIo, Shutdown};

/// Interactive debugger for JavaScript runtimes.
#[derive(Parser, Debug)]
#[command(name = "jsdbg", version, about)]
struct Cli {
    /// Attach to an already-running process instead of launching one.
    #[arg(short = 'p', long = "process", value_name = "PID")]
    process: Option<u32>,

    /// The command line to launch under the debugger, e.g. `node app.js`.
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(Shutdown::UserQuit) => ExitCode::SUCCESS,
        Ok(Shutdown::ConnectionLost) => {
            // The debuggee went away on its own terms; still a clean exit
            // for the operator.
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("jsdbg: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> jsdbg::Result<Shutdown> {
    if cli.process.is_some() && !cli.command.is_empty() {
        return Err(Error::Launch(
            "give either --process or a command line, not both".to_string(),
        ));
    }
    if cli.process.is_some() {
        return Err(Error::Unimplemented("attaching to a running process"));
    }
    if cli.command.is_empty() {
        return Err(Error::Launch(
            "nothing to debug: give a command line such as 'node app.js'".to_string(),
        ));
    }

    let session = launch::launch(&cli.command)?;

    // Ctrl-C during a run is a pause request serviced by the REPL loop, not
    // process termination.
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("could not install the interrupt handler: {e}");
    }

    let io = RustylineIo::new(history_path())?;
    let mut repl = Repl::new(io, session, interrupted)?;
    let shutdown = repl.run(true)?;

    let (io, mut session) = repl.into_parts();
    session.shutdown();
    io.save_history();
    Ok(shutdown)
}

fn history_path() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| std::path::PathBuf::from(home).join(".jsdbg_history"))
}
