//! The commands that come with the monitor.
//!
//! [`builtins`] work on any kernel. [`diagnostics`] forward to kernel subsystems through the
//! [`Diagnostics`](diagnostics::Diagnostics) trait and report them as unavailable when the
//! kernel does not provide them.

pub mod builtins;
pub mod diagnostics;

use crate::{command::Status, console::Console};

/// Prints a usage line and fails the command.
pub(crate) fn usage(out: &mut dyn Console, usage: &str) -> Status {
    cprintln!(out, "Usage: {}", usage);
    Status::Failed
}
