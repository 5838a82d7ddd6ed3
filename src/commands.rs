//! Console Commands
//!
//! The built-in command table and [`execute_command`], which parses one line
//! against the built-ins plus the custom commands of the active connection
//! and runs the matching handler.

use crate::connections::driver_identity;
use crate::core::{DbreakError, Output, Result, TableOutput};
use crate::parser::{self, COMMAND_PREFIX};
use crate::session::DebugSession;
use std::fs;
use tracing::{debug, warn};

/// What the console should do after a command ran.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Render these outputs and read the next line.
    Continue(Vec<Output>),
    /// Leave the console.
    Exit,
}

/// Runs a command with its parsed arguments.
pub type CommandHandler = fn(&mut DebugSession, &[String]) -> Result<CommandOutcome>;

/// A console command.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub handler: CommandHandler,
    pub description: &'static str,
    /// Argument names; their count is the command's arity.
    pub arguments: &'static [&'static str],
    /// The last argument takes the rest of the line verbatim.
    pub verbose_final_argument: bool,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("verbose_final_argument", &self.verbose_final_argument)
            .finish()
    }
}

/// Commands available on every connection.
pub static BUILTIN_COMMANDS: [CommandSpec; 7] = [
    CommandSpec {
        name: "connections",
        handler: connections,
        description: "List all available connections",
        arguments: &[],
        verbose_final_argument: false,
    },
    CommandSpec {
        name: "execute",
        handler: execute,
        description: "Execute a statement against the current connection",
        arguments: &["statement"],
        verbose_final_argument: true,
    },
    CommandSpec {
        name: "exit",
        handler: exit,
        description: "Exit the debugging session",
        arguments: &[],
        verbose_final_argument: false,
    },
    CommandSpec {
        name: "file",
        handler: file,
        description: "Execute the contents of a file as one statement",
        arguments: &["path"],
        verbose_final_argument: true,
    },
    CommandSpec {
        name: "help",
        handler: help,
        description: "Show the available commands",
        arguments: &[],
        verbose_final_argument: false,
    },
    CommandSpec {
        name: "rename",
        handler: rename,
        description: "Rename the current connection",
        arguments: &["new_name"],
        verbose_final_argument: false,
    },
    CommandSpec {
        name: "switch",
        handler: switch,
        description: "Switch to another connection",
        arguments: &["name"],
        verbose_final_argument: false,
    },
];

/// Parses and runs one line of console input.
///
/// Lines without the command prefix run as statements on the current
/// connection. Errors leave the session as it was.
pub fn execute_command(line: &str, session: &mut DebugSession) -> Result<CommandOutcome> {
    let commands = command_table(session);
    let parsed = parser::parse(line, &commands)?;
    debug!(
        command = parsed.command.name,
        connection = session.current_connection_name(),
        "dispatching command"
    );
    (parsed.command.handler)(session, &parsed.arguments)
}

/// Built-ins followed by the active connection's custom commands. Custom
/// commands named like a built-in are dropped.
pub fn command_table(session: &DebugSession) -> Vec<CommandSpec> {
    let mut commands = BUILTIN_COMMANDS.to_vec();
    for custom in session.current_connection().custom_commands() {
        if is_builtin(custom.name) {
            warn!(command = custom.name, "custom command shadows a built-in command, ignoring it");
            continue;
        }
        commands.push(custom);
    }
    commands
}

fn is_builtin(name: &str) -> bool {
    BUILTIN_COMMANDS.iter().any(|command| command.name == name)
}

/// Error for a handler called with arguments its command does not declare.
pub(crate) fn wrong_arguments(command: &str, expected: usize, found: &[String]) -> DbreakError {
    DbreakError::WrongNumberOfArguments {
        command: command.to_string(),
        expected,
        found: found.len(),
    }
}

fn execute(session: &mut DebugSession, arguments: &[String]) -> Result<CommandOutcome> {
    let [statement] = arguments else {
        return Err(wrong_arguments("execute", 1, arguments));
    };
    let outputs = session.current_connection_mut().execute_statement(statement)?;
    Ok(CommandOutcome::Continue(outputs))
}

fn file(session: &mut DebugSession, arguments: &[String]) -> Result<CommandOutcome> {
    let [path] = arguments else {
        return Err(wrong_arguments("file", 1, arguments));
    };
    let statement = fs::read_to_string(path)?;
    debug!(path = %path, bytes = statement.len(), "running statement from file");
    execute(session, &[statement])
}

fn connections(session: &mut DebugSession, _arguments: &[String]) -> Result<CommandOutcome> {
    let rows = session.connections().iter().map(|(name, wrapper)| {
        let (module, class) = driver_identity(wrapper.driver_type_name());
        [name, wrapper.wrapper_name(), module, class]
    });
    let table = TableOutput::from_strings(&["name", "wrapper", "driver module", "driver class"], rows);
    Ok(CommandOutcome::Continue(vec![table.into()]))
}

fn rename(session: &mut DebugSession, arguments: &[String]) -> Result<CommandOutcome> {
    let [new_name] = arguments else {
        return Err(wrong_arguments("rename", 1, arguments));
    };
    session.rename(new_name)?;
    Ok(CommandOutcome::Continue(Vec::new()))
}

fn switch(session: &mut DebugSession, arguments: &[String]) -> Result<CommandOutcome> {
    let [name] = arguments else {
        return Err(wrong_arguments("switch", 1, arguments));
    };
    session.switch(name)?;
    Ok(CommandOutcome::Continue(Vec::new()))
}

fn help(session: &mut DebugSession, _arguments: &[String]) -> Result<CommandOutcome> {
    let describe = |commands: &[CommandSpec]| {
        TableOutput::from_strings(
            &["command", "description"],
            commands
                .iter()
                .map(|c| [format!("{COMMAND_PREFIX}{}", c.name), c.description.to_string()]),
        )
    };

    let custom: Vec<CommandSpec> = command_table(session)
        .into_iter()
        .filter(|command| !is_builtin(command.name))
        .collect();

    Ok(CommandOutcome::Continue(vec![
        describe(&BUILTIN_COMMANDS[..]).into(),
        describe(&custom[..]).into(),
    ]))
}

fn exit(_session: &mut DebugSession, _arguments: &[String]) -> Result<CommandOutcome> {
    Ok(CommandOutcome::Exit)
}
