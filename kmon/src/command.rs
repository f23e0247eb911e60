//! Command table and line tokenizer.

use alloc::vec::Vec;
use core::fmt;

use arrayvec::ArrayVec;

use crate::{
    config::{MAX_ARGS, WHITESPACE},
    error::MonitorError,
    monitor::Monitor,
};

/// What the monitor does after a command returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Prompt for the next command.
    Continue,
    /// The command failed. It already said why; the monitor keeps going.
    Failed,
    /// Leave the monitor.
    Exit,
}

impl Status {
    /// Returns true if the monitor should stop.
    pub fn is_exit(self) -> bool {
        self == Self::Exit
    }
}

/// A command handler. Receives the monitor and every token of the line, command name first.
pub type Handler = fn(&mut Monitor<'_>, &[&str]) -> Status;

/// A named command.
#[derive(Clone, Copy)]
pub struct Command {
    /// The word typed to run the command.
    pub name: &'static str,
    /// One line for `help`.
    pub description: &'static str,
    /// The code that runs.
    pub handler: Handler,
}

impl Command {
    /// Creates a command.
    pub const fn new(name: &'static str, description: &'static str, handler: Handler) -> Self {
        Self {
            name,
            description,
            handler,
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// The ordered set of commands a monitor accepts.
///
/// `help` lists commands in registration order. If two commands share a name the first one
/// registered is the one that runs.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Adds a command.
    pub fn register(&mut self, command: Command) -> &mut Self {
        if self.find(command.name).is_some() {
            log::warn!("command {} registered twice", command.name);
        }
        self.commands.push(command);
        self
    }

    /// Lets `f` register a group of commands.
    pub fn with(mut self, f: fn(&mut CommandRegistry)) -> Self {
        f(&mut self);
        self
    }

    /// Finds a command by exact name.
    pub fn find(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Iterates over the commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// The number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// The tokens of one command line.
pub type Tokens<'l> = ArrayVec<&'l str, MAX_ARGS>;

/// Splits `line` on tabs, carriage returns, newlines and spaces.
///
/// Runs of separators count as one. Fails when the line has more than [`MAX_ARGS`] tokens.
pub fn tokenize(line: &str) -> Result<Tokens<'_>, MonitorError> {
    let mut tokens = Tokens::new();
    for token in line.split(WHITESPACE).filter(|t| !t.is_empty()) {
        tokens
            .try_push(token)
            .map_err(|_| MonitorError::TooManyArguments { max: MAX_ARGS })?;
    }
    Ok(tokens)
}
