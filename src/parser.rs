//! Command Line Parser
//!
//! Turns one line of console input into a command and its arguments.
//!
//! A line starting with [`COMMAND_PREFIX`] names a command; anything else is
//! a raw statement handed to [`EXECUTE_COMMAND`] untouched. Arguments are
//! split on whitespace with single-quote grouping. A command with a verbose
//! final argument takes everything after its leading arguments verbatim, so
//! statements keep their own quoting.

use crate::commands::CommandSpec;
use crate::core::{DbreakError, Result};
use tracing::debug;

/// Marks a line as a console command rather than a statement.
pub const COMMAND_PREFIX: char = '!';

/// Command receiving lines typed without the prefix.
pub const EXECUTE_COMMAND: &str = "execute";

const QUOTE: char = '\'';

/// A command resolved from the command table, with its arguments.
#[derive(Debug)]
pub struct ParsedCommand<'a> {
    pub command: &'a CommandSpec,
    pub arguments: Vec<String>,
}

/// Parses `line` against `commands`.
///
/// # Errors
///
/// `UnknownCommand` when the prefixed name is not in the table,
/// `WrongNumberOfArguments` when the arguments do not fit the command.
pub fn parse<'a>(line: &str, commands: &'a [CommandSpec]) -> Result<ParsedCommand<'a>> {
    let (name, argument_text) = split_command(line);
    let command = commands
        .iter()
        .find(|command| command.name == name)
        .ok_or_else(|| DbreakError::UnknownCommand(name.to_string()))?;

    let arguments = parse_arguments(command, argument_text)?;
    debug!(command = command.name, arguments = arguments.len(), "parsed command line");
    Ok(ParsedCommand { command, arguments })
}

/// Splits a line into the command name and the text following it.
fn split_command(line: &str) -> (&str, &str) {
    match line.trim_start().strip_prefix(COMMAND_PREFIX) {
        Some(rest) => {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            (&rest[..end], &rest[end..])
        }
        None => (EXECUTE_COMMAND, line),
    }
}

fn parse_arguments(command: &CommandSpec, text: &str) -> Result<Vec<String>> {
    let expected = command.arguments.len();
    let mut tokens = Tokens::new(text);

    if !command.verbose_final_argument || expected == 0 {
        let arguments: Vec<String> = tokens.collect();
        if arguments.len() != expected {
            return Err(wrong_count(command, arguments.len()));
        }
        return Ok(arguments);
    }

    let mut arguments = Vec::with_capacity(expected);
    for _ in 1..expected {
        match tokens.next() {
            Some(token) => arguments.push(token),
            None => return Err(wrong_count(command, arguments.len())),
        }
    }

    let remainder = tokens.remainder().trim_start();
    if remainder.is_empty() {
        return Err(wrong_count(command, arguments.len()));
    }
    arguments.push(remainder.to_string());
    Ok(arguments)
}

fn wrong_count(command: &CommandSpec, found: usize) -> DbreakError {
    DbreakError::WrongNumberOfArguments {
        command: command.name.to_string(),
        expected: command.arguments.len(),
        found,
    }
}

/// Lazy shell-like tokenizer.
///
/// Whitespace separates tokens; a single quote starts a run that lasts until
/// the next single quote, taken literally with the quotes removed. Quoted and
/// unquoted runs that touch form one token, and `''` is an empty token. An
/// unterminated quote runs to the end of the text.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(text: &'a str) -> Self {
        Tokens { text, position: 0 }
    }

    /// The text not consumed by the tokens read so far.
    pub fn remainder(&self) -> &'a str {
        &self.text[self.position..]
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let rest = self.remainder();
        self.position += rest.len() - rest.trim_start().len();

        let rest = self.remainder();
        let mut token = String::new();
        let mut in_quotes = false;
        let mut started = false;
        let mut consumed = rest.len();

        for (offset, c) in rest.char_indices() {
            if in_quotes {
                if c == QUOTE {
                    in_quotes = false;
                } else {
                    token.push(c);
                }
            } else if c == QUOTE {
                in_quotes = true;
                started = true;
            } else if c.is_whitespace() {
                consumed = offset;
                break;
            } else {
                token.push(c);
                started = true;
            }
        }

        self.position += consumed;
        started.then_some(token)
    }
}
