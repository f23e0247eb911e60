//! Kernel symbol lookup
//!
//! The monitor needs two questions answered about the running kernel: where does the function
//! called `name` live, and which function contains a given instruction address. [`SymbolTable`]
//! is that contract. Two tables are provided: [`ElfSymbolTable`], which reads the `.symtab` of a
//! loaded ELF image, and [`SymbolMap`], a plain list for linker-generated tables and tests.

#![cfg_attr(not(test), no_std)]
#![warn(missing_debug_implementations)]
#![forbid(unsafe_op_in_unsafe_fn)]

extern crate alloc;

use core::fmt;

pub use goblin;
use rustc_demangle::demangle;

pub mod elf;
pub mod map;
pub mod sections;
pub mod symbols;
pub mod table;

pub use elf::{Elf, ElfError};
pub use map::SymbolMap;
pub use table::ElfSymbolTable;

/// Placeholder used for anything a table cannot tell.
pub const UNKNOWN: &str = "<unknown>";

/// Source information for an instruction address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugInfo<'a> {
    /// Source (or object) file the function came from.
    pub file: &'a str,
    /// Source line, 0 if unknown.
    pub line: u32,
    /// The raw, possibly mangled, function name.
    pub function_name: &'a str,
    /// Address of the first instruction of the function.
    pub function_start: usize,
}

impl DebugInfo<'static> {
    /// Debug info for an address nothing is known about. The function is assumed to start at the
    /// address itself, so offsets come out as zero.
    pub const fn unknown(addr: usize) -> Self {
        DebugInfo {
            file: UNKNOWN,
            line: 0,
            function_name: UNKNOWN,
            function_start: addr,
        }
    }
}

impl<'a> DebugInfo<'a> {
    /// The function name, demangled if it is a Rust symbol. Use `{:#}` to omit the hash.
    pub fn demangled(&self) -> rustc_demangle::Demangle<'a> {
        demangle(self.function_name)
    }

    /// Offset of `addr` from the start of the function.
    pub fn offset(&self, addr: usize) -> usize {
        addr.wrapping_sub(self.function_start)
    }
}

impl fmt::Display for DebugInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {:#}", self.file, self.line, self.demangled())
    }
}

/// Answers name-to-address and address-to-source questions about the kernel image.
pub trait SymbolTable {
    /// Returns the address of the function called `name`, or `None` if there is no such function.
    fn resolve_name(&self, name: &str) -> Option<usize>;

    /// Returns the debug info for the function containing `addr`.
    fn resolve_address(&self, addr: usize) -> Option<DebugInfo<'_>>;

    /// Like [`SymbolTable::resolve_address`], falling back to [`DebugInfo::unknown`].
    fn debug_info(&self, addr: usize) -> DebugInfo<'_> {
        self.resolve_address(addr)
            .unwrap_or_else(|| DebugInfo::unknown(addr))
    }
}

impl<T: SymbolTable + ?Sized> SymbolTable for &T {
    fn resolve_name(&self, name: &str) -> Option<usize> {
        (**self).resolve_name(name)
    }

    fn resolve_address(&self, addr: usize) -> Option<DebugInfo<'_>> {
        (**self).resolve_address(addr)
    }
}

/// Returns true if `name` refers to the symbol `raw`, either verbatim or by its demangled path
/// without the trailing hash (`kdb::demo::add` for `_ZN3kdb4demo3add17h...E`).
pub fn name_matches(raw: &str, name: &str) -> bool {
    if raw == name {
        return true;
    }
    let Ok(demangled) = rustc_demangle::try_demangle(raw) else {
        return false;
    };
    let mut matcher = Matcher { rest: name };
    fmt::write(&mut matcher, format_args!("{:#}", demangled)).is_ok() && matcher.rest.is_empty()
}

/// Compares formatted output against an expected string without allocating.
struct Matcher<'a> {
    rest: &'a str,
}

impl fmt::Write for Matcher<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self.rest.strip_prefix(s) {
            Some(rest) => {
                self.rest = rest;
                Ok(())
            }
            None => Err(fmt::Error),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_has_zero_offset() {
        let info = DebugInfo::unknown(0x1234);
        assert_eq!(info.offset(0x1234), 0);
        assert_eq!(info.file, UNKNOWN);
        assert_eq!(info.function_name, UNKNOWN);
    }

    #[test]
    fn display_demangles() {
        let info = DebugInfo {
            file: "main.rs",
            line: 12,
            function_name: "_ZN3kdb4demo3add17h0123456789abcdefE",
            function_start: 0,
        };
        assert_eq!(format!("{}", info), "main.rs:12: kdb::demo::add");
    }

    #[test]
    fn names_match_verbatim_or_demangled() {
        let raw = "_ZN3kdb4demo3add17h0123456789abcdefE";
        assert!(name_matches(raw, raw));
        assert!(name_matches(raw, "kdb::demo::add"));
        assert!(!name_matches(raw, "kdb::demo"));
        assert!(!name_matches(raw, "kdb::demo::add::more"));
        assert!(name_matches("entry", "entry"));
        assert!(!name_matches("entry", "etext"));
    }
}
