//! [`kmon::Console`] over standard streams or a terminal device.

use std::{
    fmt,
    fs::{File, OpenOptions},
    io::{self, BufReader, ErrorKind, Read, Stdin, Stdout, Write},
    path::Path,
};

use kmon::{Console, ReadError};

/// A console reading bytes from `R` and writing to `W`.
///
/// Terminals in canonical mode echo and edit lines themselves, so this console never asks the
/// monitor to echo.
#[derive(Debug)]
pub struct IoConsole<R: Read, W: Write> {
    input: BufReader<R>,
    output: W,
}

impl IoConsole<Stdin, Stdout> {
    /// A console on the process's standard input and output.
    pub fn stdio() -> Self {
        Self::new(io::stdin(), io::stdout())
    }
}

impl IoConsole<File, File> {
    /// A console on a terminal device such as a pty.
    pub fn open(path: &Path) -> io::Result<Self> {
        let input = OpenOptions::new().read(true).write(true).open(path)?;
        let output = input.try_clone()?;
        Ok(Self::new(input, output))
    }
}

impl<R: Read, W: Write> IoConsole<R, W> {
    /// Wraps a reader and a writer.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: BufReader::new(input),
            output,
        }
    }
}

impl<R: Read, W: Write> fmt::Write for IoConsole<R, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl<R: Read, W: Write> Console for IoConsole<R, W> {
    fn read_byte(&mut self) -> Result<u8, ReadError> {
        // Prompts must be visible before blocking.
        let _ = self.output.flush();

        let mut byte = [0];
        loop {
            return match self.input.read(&mut byte) {
                Ok(0) => Err(ReadError::EndOfInput),
                Ok(_) => Ok(byte[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("console read failed: {}", e);
                    Err(ReadError::Device(e.raw_os_error().unwrap_or(-1)))
                }
            };
        }
    }

    fn write_byte(&mut self, byte: u8) {
        let _ = self.output.write_all(&[byte]);
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    #[test]
    fn reads_and_writes() {
        let mut console = IoConsole::new(&b"ok"[..], Vec::new());
        assert_eq!(console.read_byte(), Ok(b'o'));
        assert_eq!(console.read_byte(), Ok(b'k'));
        assert_eq!(console.read_byte(), Err(ReadError::EndOfInput));

        write!(console, "K> ").unwrap();
        console.write_byte(b'!');
        assert_eq!(console.output, b"K> !");
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from_raw_os_error(5))
        }
    }

    #[test]
    fn device_errors_carry_the_os_code() {
        let mut console = IoConsole::new(Broken, io::sink());
        assert_eq!(console.read_byte(), Err(ReadError::Device(5)));
    }
}
