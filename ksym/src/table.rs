//! [`SymbolTable`] backed by the `.symtab` of a loaded ELF image.

use goblin::elf64::sym;
use log::debug;

use crate::{
    DebugInfo, SymbolTable, UNKNOWN,
    elf::{Elf, ElfError},
    name_matches,
    symbols::ElfSymbol,
};

/// Looks symbols up in an ELF image that is loaded `load_bias` bytes away from its link address.
///
/// Names resolve to functions and untyped linker labels. The symbol table knows nothing about
/// lines: [`DebugInfo::line`] is always 0 and [`DebugInfo::file`] is the `STT_FILE` entry
/// preceding a local function, if there is one.
#[derive(Debug, Clone, Copy)]
pub struct ElfSymbolTable<'a> {
    elf: Elf<'a>,
    load_bias: usize,
}

impl<'a> ElfSymbolTable<'a> {
    /// Parses `image`. Stripped images are accepted; every lookup in them fails.
    pub fn new(image: &'a [u8], load_bias: usize) -> Result<Self, ElfError> {
        let elf = Elf::new(image)?;
        if elf.symbols().is_none() {
            debug!("ELF image has no symbol table");
        }
        Ok(Self { elf, load_bias })
    }

    /// The difference between runtime and link-time addresses.
    pub fn load_bias(&self) -> usize {
        self.load_bias
    }

    fn symbols(&self) -> impl Iterator<Item = ElfSymbol<'a>> + use<'a> {
        self.elf.symbols().into_iter().flatten()
    }

    /// Finds the link-time address of `name` and derives the load bias from where that function
    /// actually is. Useful for position independent images.
    pub fn with_anchor(image: &'a [u8], name: &str, runtime_addr: usize) -> Result<Self, ElfError> {
        let mut table = Self::new(image, 0)?;
        if let Some(link_addr) = table.resolve_name(name) {
            table.load_bias = runtime_addr.wrapping_sub(link_addr);
            debug!("load bias {:#x} (anchored on {})", table.load_bias, name);
        }
        Ok(table)
    }
}

impl SymbolTable for ElfSymbolTable<'_> {
    fn resolve_name(&self, name: &str) -> Option<usize> {
        // Linker script labels such as `etext` carry no type.
        self.symbols()
            .filter(|s| (s.is_function() || s.kind == sym::STT_NOTYPE) && s.value != 0)
            .find(|s| name_matches(s.name, name))
            .map(|s| (s.value as usize).wrapping_add(self.load_bias))
    }

    fn resolve_address(&self, addr: usize) -> Option<DebugInfo<'_>> {
        let link_addr = addr.wrapping_sub(self.load_bias) as u64;
        let mut file = UNKNOWN;
        for s in self.symbols() {
            if s.is_file() {
                file = s.name;
                continue;
            }
            if s.is_function() && s.value != 0 && s.contains(link_addr) {
                let local = s.bind == sym::STB_LOCAL;
                return Some(DebugInfo {
                    file: if local { file } else { UNKNOWN },
                    line: 0,
                    function_name: s.name,
                    function_start: (s.value as usize).wrapping_add(self.load_bias),
                });
            }
        }
        None
    }
}
