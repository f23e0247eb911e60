//! The read-eval-print loop.

use core::fmt;

use ksym::SymbolTable;
use log::{debug, info};

use crate::{
    command::{CommandRegistry, Status, tokenize},
    commands::diagnostics::Diagnostics,
    config::{HINT, MonitorConfig, WELCOME},
    console::Console,
    error::{MonitorError, ReadError},
    readline::{LineBuffer, read_line},
};

/// A monitor session over one console.
///
/// Everything a command can reach goes through the monitor: the console, the symbol table, the
/// diagnostics hooks and the command registry itself.
pub struct Monitor<'a> {
    console: &'a mut dyn Console,
    symbols: &'a dyn SymbolTable,
    diagnostics: &'a mut dyn Diagnostics,
    registry: &'a CommandRegistry,
    config: MonitorConfig,
    active: bool,
}

impl<'a> Monitor<'a> {
    /// Creates a monitor. Nothing is printed until [`Monitor::run`].
    pub fn new(
        console: &'a mut dyn Console,
        symbols: &'a dyn SymbolTable,
        diagnostics: &'a mut dyn Diagnostics,
        registry: &'a CommandRegistry,
        config: MonitorConfig,
    ) -> Self {
        Self {
            console,
            symbols,
            diagnostics,
            registry,
            config,
            active: false,
        }
    }

    /// The console commands print to.
    pub fn console(&mut self) -> &mut dyn Console {
        &mut *self.console
    }

    /// The kernel's symbol table.
    pub fn symbols(&self) -> &'a dyn SymbolTable {
        self.symbols
    }

    /// The commands this monitor accepts.
    pub fn registry(&self) -> &'a CommandRegistry {
        self.registry
    }

    /// The diagnostics hooks together with the console they print to.
    pub fn diagnostics(&mut self) -> (&mut dyn Diagnostics, &mut dyn Console) {
        (&mut *self.diagnostics, &mut *self.console)
    }

    /// This monitor's settings.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Returns true while [`Monitor::run`] is looping.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns true if typed input is echoed back.
    pub fn echo(&self) -> bool {
        self.config
            .echo
            .unwrap_or_else(|| self.console.is_interactive())
    }

    /// Prompts with `prompt` and reads a line into `buf`.
    pub fn read_line<'b>(
        &mut self,
        prompt: &str,
        buf: &'b mut LineBuffer,
    ) -> Result<&'b str, ReadError> {
        let echo = self.echo();
        read_line(&mut *self.console, Some(prompt), echo, buf)
    }

    /// Prints `err` unless the console already saw it. Read errors are either silent (end of
    /// input) or were reported by the line reader.
    pub fn report_error(&mut self, err: &MonitorError) {
        debug!("command failed: {:?}", err);
        if !err.is_read_error() {
            cprintln!(self.console, "{}", err);
        }
    }

    /// Tokenizes `line` and runs the command it names. Blank lines do nothing.
    pub fn dispatch(&mut self, line: &str) -> Result<Status, MonitorError> {
        let tokens = tokenize(line)?;
        let Some(name) = tokens.first() else {
            return Ok(Status::Continue);
        };
        let command = self
            .registry
            .find(name)
            .ok_or_else(|| MonitorError::UnknownCommand((*name).into()))?;

        debug!("running {} with {} arguments", command.name, tokens.len() - 1);
        let handler = command.handler;
        Ok(handler(self, &tokens))
    }

    /// Like [`Monitor::dispatch`], printing errors instead of returning them.
    pub fn execute(&mut self, line: &str) -> Status {
        match self.dispatch(line) {
            Ok(status) => status,
            Err(err) => {
                self.report_error(&err);
                Status::Failed
            }
        }
    }

    fn banner(&mut self) {
        cprintln!(self.console, "{}", WELCOME);
        cprintln!(self.console, "{}", HINT);
    }

    /// Runs commands until one returns [`Status::Exit`] or the console runs dry.
    ///
    /// End of input ends the loop quietly. A device error ends it after the line reader has
    /// reported it, and is returned. Calling this from inside a command fails with
    /// [`MonitorError::NestedSession`].
    pub fn run(&mut self) -> Result<(), MonitorError> {
        if self.active {
            return Err(MonitorError::NestedSession);
        }
        self.active = true;
        info!("monitor started");

        if self.config.banner {
            self.banner();
        }

        let result = loop {
            let mut line = LineBuffer::new();
            let echo = self.echo();
            let prompt = Some(&*self.config.prompt);
            let text = match read_line(&mut *self.console, prompt, echo, &mut line) {
                Ok(text) => text,
                Err(ReadError::EndOfInput) => break Ok(()),
                Err(err) => break Err(MonitorError::Read(err)),
            };
            if self.execute(text).is_exit() {
                break Ok(());
            }
        };

        self.active = false;
        info!("monitor stopped");
        result
    }
}

impl fmt::Debug for Monitor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
