//! `.symtab` entries and their names.

use core::ffi::CStr;

use goblin::elf64::{
    section_header::SectionHeader,
    sym::{self, SIZEOF_SYM, Sym},
};
use log::trace;

use crate::elf::read_struct;

/// One `.symtab` entry with its name already looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfSymbol<'a> {
    /// The raw name. Empty for unnamed symbols or names that are not valid UTF-8.
    pub name: &'a str,
    /// `st_value`: the link-time address for functions.
    pub value: u64,
    /// `st_size`: the size of the function in bytes, 0 if unknown.
    pub size: u64,
    /// `STT_*` type.
    pub kind: u8,
    /// `STB_*` binding.
    pub bind: u8,
}

impl ElfSymbol<'_> {
    /// Returns true for `STT_FUNC` symbols.
    pub fn is_function(&self) -> bool {
        self.kind == sym::STT_FUNC
    }

    /// Returns true for `STT_FILE` symbols, which name the source file of the local symbols that
    /// follow them.
    pub fn is_file(&self) -> bool {
        self.kind == sym::STT_FILE
    }

    /// Returns true if `value` falls inside this symbol. Zero-sized symbols only contain their own
    /// address.
    pub fn contains(&self, value: u64) -> bool {
        if self.size == 0 {
            return value == self.value;
        }
        value >= self.value && value - self.value < self.size
    }
}

/// An iterator over the symbols in an ELF symbol table.
#[derive(Debug, Clone)]
pub struct ElfSymbols<'a> {
    data: &'a [u8],
    strings: &'a [u8],
    offset: usize,
    i: usize,
    max: usize,
}

impl<'a> ElfSymbols<'a> {
    /// Creates an iterator over `symtab`, resolving names through `strtab`. Returns `None` if either
    /// section lies outside `data`.
    pub fn new(data: &'a [u8], symtab: &SectionHeader, strtab: &SectionHeader) -> Option<Self> {
        let strings = section_bytes(data, strtab)?;
        let table = section_bytes(data, symtab)?;
        trace!(
            "symbol table: {} entries, {} bytes of names",
            table.len() / SIZEOF_SYM,
            strings.len()
        );
        Some(Self {
            data,
            strings,
            offset: symtab.sh_offset as usize,
            i: 0,
            max: table.len() / SIZEOF_SYM,
        })
    }

    fn name(&self, index: u32) -> &'a str {
        self.strings
            .get(index as usize..)
            .and_then(|tail| CStr::from_bytes_until_nul(tail).ok())
            .and_then(|name| name.to_str().ok())
            .unwrap_or("")
    }
}

impl<'a> Iterator for ElfSymbols<'a> {
    type Item = ElfSymbol<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.i >= self.max {
            return None;
        }
        let raw: Sym = read_struct(self.data, self.offset + self.i * SIZEOF_SYM)?;
        self.i += 1;
        Some(ElfSymbol {
            name: self.name(raw.st_name),
            value: raw.st_value,
            size: raw.st_size,
            kind: sym::st_type(raw.st_info),
            bind: sym::st_bind(raw.st_info),
        })
    }
}

fn section_bytes<'a>(data: &'a [u8], section: &SectionHeader) -> Option<&'a [u8]> {
    let start = usize::try_from(section.sh_offset).ok()?;
    let len = usize::try_from(section.sh_size).ok()?;
    data.get(start..start.checked_add(len)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(value: u64, size: u64) -> ElfSymbol<'static> {
        ElfSymbol {
            name: "f",
            value,
            size,
            kind: sym::STT_FUNC,
            bind: sym::STB_GLOBAL,
        }
    }

    #[test]
    fn contains_respects_size() {
        let f = symbol(0x100, 0x20);
        assert!(f.contains(0x100));
        assert!(f.contains(0x11f));
        assert!(!f.contains(0x120));
        assert!(!f.contains(0xff));
    }

    #[test]
    fn zero_sized_contains_only_itself() {
        let f = symbol(0x100, 0);
        assert!(f.contains(0x100));
        assert!(!f.contains(0x101));
    }
}
