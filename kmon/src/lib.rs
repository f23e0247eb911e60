//! kmon - Kernel Monitor
//!
//! An interactive debug console for a bare-metal kernel. The operator types commands at a prompt;
//! the monitor looks them up in a [`CommandRegistry`] and runs them. Besides the usual inspection
//! commands it can walk the frame pointer chain ([`unwind`]) and call any function in the kernel
//! by name with arguments typed in at runtime ([`session`]).
//!
//! Everything the monitor needs from the kernel comes in through traits: [`Console`] for
//! characters, [`ksym::SymbolTable`] for symbols and [`Diagnostics`] for the subsystems some
//! commands forward to.
//!
//! ```text
//! Welcome to the kernel monitor!
//! Type 'help' for a list of commands.
//! K> call
//! function name: strlen
//! argument count: 1
//! arg 1 format: %s
//! arg 1 value: hello
//! --- begin output ---
//! --- end output ---
//! returned 0x0000000000000005 (5)
//! ```
#![cfg_attr(not(test), no_std)]
#![warn(missing_debug_implementations)]
#![forbid(unsafe_op_in_unsafe_fn)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod arch;
pub mod command;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod logger;
pub mod monitor;
pub mod readline;
pub mod session;
pub mod unwind;

pub use command::{Command, CommandRegistry, Handler, Status};
pub use commands::diagnostics::{Diagnostics, NoDiagnostics};
pub use config::MonitorConfig;
pub use console::{Console, ScriptConsole};
pub use error::{MonitorError, ReadError};
pub use monitor::Monitor;

/// A registry with every command this crate provides.
pub fn default_registry() -> CommandRegistry {
    CommandRegistry::new()
        .with(commands::builtins::register)
        .with(commands::diagnostics::register)
}
