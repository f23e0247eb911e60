//! Runs the kernel monitor as an ordinary process.
//!
//! The process plays the kernel: the monitor reads its own executable for symbols, walks its own
//! stack and calls its own functions. [`demo`] has a few functions worth calling.

pub mod console;
pub mod demo;
pub mod diagnostics;
pub mod env;
pub mod symbols;

pub use console::IoConsole;
pub use diagnostics::HostDiagnostics;
