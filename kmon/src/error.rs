//! Monitor errors.

use alloc::string::String;

use kcall::{InvokeError, MarshalError, ValueError};
use thiserror::Error;

/// Failure to read from the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The input ended. Not reported to the operator.
    #[error("end of input")]
    EndOfInput,
    /// The device reported an error code.
    #[error("read error: {0}")]
    Device(i32),
}

/// Everything that can go wrong while running a command line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MonitorError {
    /// The line split into more than `max` tokens.
    #[error("Too many arguments (max {max})")]
    TooManyArguments {
        /// The token limit.
        max: usize,
    },
    /// No command is registered under this name.
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    /// The symbol table has no function with this name.
    #[error("cannot find this function '{0}'")]
    SymbolNotFound(String),
    /// The argument count was not a number.
    #[error("invalid argument count '{0}'")]
    InvalidCount(String),
    /// A format was given on the command line without a value.
    #[error("missing value for argument {index}")]
    MissingValue {
        /// 1-based argument position.
        index: usize,
    },
    /// Reading a line failed.
    #[error(transparent)]
    Read(#[from] ReadError),
    /// An argument value did not parse.
    #[error(transparent)]
    Value(#[from] ValueError),
    /// The arguments did not fit a call.
    #[error(transparent)]
    Marshal(#[from] MarshalError),
    /// The call could not be made.
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    /// [`Monitor::run`](crate::Monitor::run) was called from inside a command.
    #[error("the monitor is already running")]
    NestedSession,
}

impl MonitorError {
    /// Returns true if the console can no longer be read from.
    pub fn is_read_error(&self) -> bool {
        matches!(self, Self::Read(_))
    }
}
