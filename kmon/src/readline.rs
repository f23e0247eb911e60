//! Line editing on a [`Console`].

use arrayvec::ArrayString;
use log::error;

use crate::{config::MAX_LINE, console::Console, error::ReadError};

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

/// Storage for one input line. Holds up to `MAX_LINE - 1` characters.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    text: ArrayString<MAX_LINE>,
}

impl LineBuffer {
    /// The most characters a line can hold.
    pub const CAPACITY: usize = MAX_LINE - 1;

    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            text: ArrayString::new(),
        }
    }

    /// The line read so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns true if no more characters fit.
    pub fn is_full(&self) -> bool {
        self.text.len() >= Self::CAPACITY
    }

    fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.text.push(char::from(byte));
        true
    }

    fn erase(&mut self) -> bool {
        self.text.pop().is_some()
    }
}

/// Reads one line from `console` into `buf` and returns it without the line terminator.
///
/// `prompt` is written first. With `echo` set, accepted characters are written back and
/// backspace or delete rub out the last character with `"\b \b"`. Characters past the capacity of
/// the buffer and control characters other than those are dropped. Only printable ASCII is
/// accepted.
///
/// End of input is returned silently; a device error is also reported on the console.
pub fn read_line<'b>(
    console: &mut dyn Console,
    prompt: Option<&str>,
    echo: bool,
    buf: &'b mut LineBuffer,
) -> Result<&'b str, ReadError> {
    if let Some(prompt) = prompt {
        cprint!(console, "{}", prompt);
    }
    buf.text.clear();

    loop {
        let byte = match console.read_byte() {
            Ok(byte) => byte,
            Err(ReadError::EndOfInput) => return Err(ReadError::EndOfInput),
            Err(err @ ReadError::Device(code)) => {
                error!("console read failed with {}", code);
                cprintln!(console, "{}", err);
                return Err(err);
            }
        };

        match byte {
            BACKSPACE | DELETE => {
                if buf.erase() && echo {
                    cprint!(console, "\x08 \x08");
                }
            }
            b'\n' | b'\r' => {
                if echo {
                    console.write_byte(b'\n');
                }
                return Ok(buf.as_str());
            }
            b' '..=b'~' => {
                if buf.push(byte) && echo {
                    console.write_byte(byte);
                }
            }
            _ => {}
        }
    }
}
