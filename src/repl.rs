use crate::commands::{execute_command, CommandOutcome};
use crate::config::ConsoleConfig;
use crate::core::Output;
use crate::parser::COMMAND_PREFIX;
use crate::render::Renderer;
use crate::session::DebugSession;
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::{debug, info};

/// Whether the console keeps reading after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplControl {
    Continue,
    Exit,
}

/// Executes one line and renders its outputs, or its error.
///
/// Command errors are shown and the console carries on; only write failures
/// on `out`/`err` are returned.
pub fn handle_line<O: Write, E: Write>(
    session: &mut DebugSession,
    line: &str,
    renderer: Renderer,
    out: &mut O,
    err: &mut E,
) -> io::Result<ReplControl> {
    let line = line.trim_end();
    if line.trim_start().is_empty() {
        return Ok(ReplControl::Continue);
    }

    match execute_command(line, session) {
        Ok(CommandOutcome::Continue(outputs)) => renderer.render(&outputs, out, err)?,
        Ok(CommandOutcome::Exit) => {
            info!("exit requested");
            return Ok(ReplControl::Exit);
        }
        Err(e) => {
            debug!(error = %e, kind = e.kind(), "command failed");
            renderer.render(&[Output::error(&e)], out, err)?;
        }
    }
    Ok(ReplControl::Continue)
}

/// Feeds lines to the session until they run out or `!exit` is executed.
pub fn run_lines<I, O, E>(
    session: &mut DebugSession,
    lines: I,
    renderer: Renderer,
    out: &mut O,
    err: &mut E,
) -> io::Result<()>
where
    I: IntoIterator<Item = io::Result<String>>,
    O: Write,
    E: Write,
{
    for line in lines {
        if handle_line(session, &line?, renderer, out, err)? == ReplControl::Exit {
            break;
        }
    }
    Ok(())
}

/// Runs the console on stdin: a line editor on a terminal, plain line
/// reading when input is piped.
pub fn run_repl(session: &mut DebugSession, renderer: Renderer, config: &ConsoleConfig) -> io::Result<()> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        info!("reading commands from piped input");
        return run_lines(session, stdin.lock().lines(), renderer, &mut io::stdout(), &mut io::stderr());
    }

    if config.banner {
        println!("Welcome to dbreak! An interactive debugging console for database connections.");
        println!("Type {COMMAND_PREFIX}help for commands, {COMMAND_PREFIX}exit to quit. Anything else runs as a statement.");
    }

    let mut line_editor = Reedline::create();
    loop {
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!("{} [{}]", config.prompt, session.current_connection_name())),
            DefaultPromptSegment::Empty,
        );
        match line_editor.read_line(&prompt)? {
            Signal::Success(buffer) => {
                let control = handle_line(session, &buffer, renderer, &mut io::stdout(), &mut io::stderr())?;
                if control == ReplControl::Exit {
                    break;
                }
            }
            Signal::CtrlC => continue,
            Signal::CtrlD => break,
        }
    }

    info!("console closed");
    Ok(())
}
