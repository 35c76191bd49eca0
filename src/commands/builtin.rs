//! The built-in command table and its handlers.

use super::{CommandContext, CommandDesc, Outcome};
use crate::error::{Error, ExceptionMode, Result};
use crate::location::Breakpoint;
use crate::repl::ReadOutcome;
use crate::resolve;

pub(super) const COMMANDS: &[CommandDesc] = &[
    CommandDesc {
        name: "break",
        aliases: &["b"],
        help: "set a breakpoint: break [<file>][:<line>][:<col>] [if <condition>]",
        run: cmd_break,
    },
    CommandDesc {
        name: "delete",
        aliases: &["d", "clear"],
        help: "remove a breakpoint: delete [<file>][:<line>][:<col>] [if <condition>]",
        run: cmd_delete,
    },
    CommandDesc {
        name: "next",
        aliases: &["n"],
        help: "step over one source line",
        run: cmd_next,
    },
    CommandDesc {
        name: "step",
        aliases: &["s"],
        help: "step into",
        run: cmd_step,
    },
    CommandDesc {
        name: "continue",
        aliases: &["c"],
        help: "resume execution until the next pause",
        run: cmd_continue,
    },
    CommandDesc {
        name: "finish",
        aliases: &["fin"],
        help: "step out of the current frame",
        run: cmd_finish,
    },
    CommandDesc {
        name: "up",
        aliases: &[],
        help: "move the inspected frame up the stack",
        run: cmd_up,
    },
    CommandDesc {
        name: "down",
        aliases: &[],
        help: "move the inspected frame down the stack",
        run: cmd_down,
    },
    CommandDesc {
        name: "print",
        aliases: &["p"],
        help: "evaluate an expression in the current frame",
        run: cmd_print,
    },
    CommandDesc {
        name: "quit",
        aliases: &["q"],
        help: "terminate the session",
        run: cmd_quit,
    },
    CommandDesc {
        name: "backtrace",
        aliases: &["bt"],
        help: "list the call stack",
        run: cmd_backtrace,
    },
    CommandDesc {
        name: "list",
        aliases: &["l"],
        help: "show source around a location (default: current)",
        run: cmd_list,
    },
    CommandDesc {
        name: "catch",
        aliases: &[],
        help: "break on exceptions: catch <none|uncaught|all>",
        run: cmd_catch,
    },
    CommandDesc {
        name: "history",
        aliases: &[],
        help: "print previously entered lines",
        run: cmd_history,
    },
    CommandDesc {
        name: "commands",
        aliases: &[],
        help: "attach commands to the last-set breakpoint (inline with ';', or lines until 'end')",
        run: cmd_commands,
    },
    CommandDesc {
        name: "help",
        aliases: &[],
        help: "list available commands",
        run: cmd_help,
    },
    CommandDesc {
        name: "apropos",
        aliases: &[],
        help: "search commands: apropos <term>",
        run: cmd_apropos,
    },
];

/// Splits an optional trailing `if <condition>` off a breakpoint argument.
/// The location itself never contains whitespace, so the first token is the
/// location (or `if`, when the location is defaulted).
fn split_condition(args: &str) -> Result<(&str, Option<&str>)> {
    let args = args.trim();
    if args.is_empty() {
        return Ok(("", None));
    }
    let (first, rest) = match args.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (args, ""),
    };
    if first == "if" {
        return Ok(("", Some(rest)));
    }
    if rest.is_empty() {
        return Ok((first, None));
    }
    match rest.split_once(char::is_whitespace) {
        Some(("if", cond)) => Ok((first, Some(cond.trim()))),
        _ => Err(Error::Parse {
            input: args.to_string(),
            reason: "expected 'if <condition>' after the location".to_string(),
        }),
    }
}

fn parse_breakpoint(ctx: &mut CommandContext<'_>, args: &str) -> Result<Breakpoint> {
    let (loc_src, condition) = split_condition(args)?;
    let location = resolve::parse_and_resolve(loc_src, ctx.session)?;
    Ok(Breakpoint::new(location, condition.map(str::to_string)))
}

fn cmd_break(ctx: &mut CommandContext<'_>, args: &str) -> Result<Outcome> {
    let bp = parse_breakpoint(ctx, args)?;
    ctx.session.set_breakpoint(bp.clone())?;
    ctx.io.output_line(&format!("Breakpoint set at {bp}"));
    Ok(Outcome::Handled)
}

fn cmd_delete(ctx: &mut CommandContext<'_>, args: &str) -> Result<Outcome> {
    let bp = parse_breakpoint(ctx, args)?;
    ctx.session.remove_breakpoint(&bp)?;
    ctx.io.output_line(&format!("Breakpoint removed from {bp}"));
    Ok(Outcome::Handled)
}

fn require_paused(ctx: &CommandContext<'_>) -> Result<()> {
    if ctx.session.pause_state().is_paused() {
        Ok(())
    } else {
        Err(Error::NotPaused)
    }
}

fn cmd_next(ctx: &mut CommandContext<'_>, _args: &str) -> Result<Outcome> {
    require_paused(ctx)?;
    ctx.session.step_over()?;
    Ok(Outcome::Resume)
}

fn cmd_step(ctx: &mut CommandContext<'_>, _args: &str) -> Result<Outcome> {
    require_paused(ctx)?;
    ctx.session.step_into()?;
    Ok(Outcome::Resume)
}

fn cmd_finish(ctx: &mut CommandContext<'_>, _args: &str) -> Result<Outcome> {
    require_paused(ctx)?;
    ctx.session.step_out()?;
    Ok(Outcome::Resume)
}

fn cmd_continue(ctx: &mut CommandContext<'_>, _args: &str) -> Result<Outcome> {
    ctx.session.resume()?;
    Ok(Outcome::Resume)
}

fn cmd_up(_ctx: &mut CommandContext<'_>, _args: &str) -> Result<Outcome> {
    Err(Error::Unimplemented("frame navigation (up)"))
}

fn cmd_down(_ctx: &mut CommandContext<'_>, _args: &str) -> Result<Outcome> {
    Err(Error::Unimplemented("frame navigation (down)"))
}

fn cmd_print(ctx: &mut CommandContext<'_>, args: &str) -> Result<Outcome> {
    if args.is_empty() {
        return Err(Error::Parse {
            input: "print".to_string(),
            reason: "expected an expression".to_string(),
        });
    }
    let value = ctx.session.eval(args, None)?;
    ctx.io.output_line(&value.to_string());
    Ok(Outcome::Handled)
}

fn cmd_quit(_ctx: &mut CommandContext<'_>, _args: &str) -> Result<Outcome> {
    Err(Error::UserQuit)
}

fn cmd_backtrace(ctx: &mut CommandContext<'_>, _args: &str) -> Result<Outcome> {
    let stack = ctx.session.get_stack()?;
    for (i, frame) in stack.iter().enumerate() {
        ctx.io
            .output_line(&format!("#{i} {} at {}", frame.function, frame.location));
    }
    Ok(Outcome::Handled)
}

fn cmd_list(ctx: &mut CommandContext<'_>, args: &str) -> Result<Outcome> {
    let location = resolve::parse_and_resolve(args, ctx.session)?;
    match ctx.session.source_context(&location)? {
        Some(window) => {
            ctx.io.output_line(&format!("===== {location} ====="));
            ctx.io.output_line(&window);
        }
        None => ctx
            .io
            .output_line(&format!("no source available for {location}")),
    }
    Ok(Outcome::Handled)
}

fn cmd_catch(ctx: &mut CommandContext<'_>, args: &str) -> Result<Outcome> {
    let mode = ExceptionMode::parse(args.trim()).ok_or_else(|| Error::Parse {
        input: args.to_string(),
        reason: "expected one of: none, uncaught, all".to_string(),
    })?;
    ctx.session.set_break_on_exceptions(mode)?;
    ctx.io.output_line(&format!("Breaking on {mode} exceptions"));
    Ok(Outcome::Handled)
}

fn cmd_history(ctx: &mut CommandContext<'_>, _args: &str) -> Result<Outcome> {
    let lines: Vec<String> = ctx.io.history().to_vec();
    for (i, line) in lines.iter().enumerate() {
        ctx.io.output_line(&format!("{:>5}  {line}", i + 1));
    }
    Ok(Outcome::Handled)
}

fn cmd_commands(ctx: &mut CommandContext<'_>, args: &str) -> Result<Outcome> {
    let commands: Vec<String> = if !args.is_empty() {
        args.split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        // Multi-line form: read until a line equal to `end`.
        let mut lines = Vec::new();
        loop {
            match ctx.io.read_line("> ")? {
                ReadOutcome::Line(line) => {
                    let line = line.trim().to_string();
                    if line == "end" {
                        break;
                    }
                    if !line.is_empty() {
                        lines.push(line);
                    }
                }
                ReadOutcome::Interrupted | ReadOutcome::Eof => break,
            }
        }
        lines
    };

    ctx.session.attach_commands_to_last(commands)?;
    let bp = ctx
        .session
        .last_set_breakpoint()
        .map(ToString::to_string)
        .unwrap_or_default();
    ctx.io
        .output_line(&format!("Commands attached to breakpoint at {bp}"));
    Ok(Outcome::Handled)
}

fn cmd_help(ctx: &mut CommandContext<'_>, _args: &str) -> Result<Outcome> {
    for desc in COMMANDS {
        let aliases = if desc.aliases.is_empty() {
            String::new()
        } else {
            format!(" ({})", desc.aliases.join(", "))
        };
        ctx.io
            .output_line(&format!("{}{aliases} - {}", desc.name, desc.help));
    }
    Ok(Outcome::Handled)
}

fn cmd_apropos(ctx: &mut CommandContext<'_>, args: &str) -> Result<Outcome> {
    let term = args.trim().to_lowercase();
    if term.is_empty() {
        return Err(Error::Parse {
            input: "apropos".to_string(),
            reason: "expected a search term".to_string(),
        });
    }
    let mut any = false;
    for desc in COMMANDS {
        if desc.name.contains(&term) || desc.help.to_lowercase().contains(&term) {
            ctx.io.output_line(&format!("{} - {}", desc.name, desc.help));
            any = true;
        }
    }
    if !any {
        ctx.io
            .output_line(&format!("nothing matches '{}'", args.trim()));
    }
    Ok(Outcome::Handled)
}
