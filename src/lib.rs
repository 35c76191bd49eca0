//! jsdbg: an interactive command-line debugger front end for JavaScript
//! runtimes that speak the Chrome DevTools Protocol. The crate splits into
//! a protocol layer ([`engine`]), session bookkeeping ([`session`]), the
//! location grammar ([`resolve`]), the command table ([`commands`]), and
//! the prompt loop that ties them together ([`repl`]).

pub mod commands;
pub mod engine;
pub mod error;
pub mod launch;
pub mod location;
pub mod repl;
pub mod resolve;
pub mod session;

pub use error::{Error, Result};
