//! The character device the monitor talks through.

use alloc::{collections::VecDeque, string::String};
use core::fmt;

use crate::error::ReadError;

/// A character console. Writing goes through [`fmt::Write`]; reading is one byte at a time.
///
/// Reads block until a byte is available. Implementations backed by a serial port or keyboard
/// usually never return [`ReadError::EndOfInput`].
pub trait Console: fmt::Write {
    /// Reads the next byte of input.
    fn read_byte(&mut self) -> Result<u8, ReadError>;

    /// Writes one byte of output.
    fn write_byte(&mut self, byte: u8) {
        let mut buf = [0; 4];
        let _ = self.write_str(char::from(byte).encode_utf8(&mut buf));
    }

    /// Returns true if a person is typing on the other end. Input is only echoed back to
    /// interactive consoles.
    fn is_interactive(&self) -> bool {
        true
    }
}

/// A console that reads from a fixed script and records everything written to it.
///
/// Used to drive the monitor from a file or a test.
#[derive(Debug, Clone, Default)]
pub struct ScriptConsole {
    input: VecDeque<u8>,
    output: String,
    interactive: bool,
    error: Option<i32>,
}

impl ScriptConsole {
    /// Creates a non-interactive console that will read `input` and then report end of input.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.bytes().collect(),
            ..Self::default()
        }
    }

    /// Makes the console report itself as interactive.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Reports a device error with `code` instead of end of input once the script runs out.
    pub fn fail_with(mut self, code: i32) -> Self {
        self.error = Some(code);
        self
    }

    /// Appends more input.
    pub fn push_input(&mut self, input: &str) {
        self.input.extend(input.bytes());
    }

    /// Everything written so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns and clears the recorded output.
    pub fn take_output(&mut self) -> String {
        core::mem::take(&mut self.output)
    }
}

impl fmt::Write for ScriptConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s);
        Ok(())
    }
}

impl Console for ScriptConsole {
    fn read_byte(&mut self) -> Result<u8, ReadError> {
        match self.input.pop_front() {
            Some(byte) => Ok(byte),
            None => Err(self.error.map_or(ReadError::EndOfInput, ReadError::Device)),
        }
    }

    fn write_byte(&mut self, byte: u8) {
        self.output.push(char::from(byte));
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}
