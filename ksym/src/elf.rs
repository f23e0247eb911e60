//! Minimal ELF64 image access: just enough to find the symbol table.

use core::mem::size_of;

use goblin::{
    elf::section_header::SHT_SYMTAB,
    elf64::{
        header::{self, Header},
        section_header::SectionHeader,
    },
};

use crate::{sections::ElfSections, symbols::ElfSymbols};

/// Why an image was rejected.
#[allow(missing_docs)]
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfError {
    #[error("Not enough data: {actual} < {expected}")]
    NotEnoughData { actual: usize, expected: usize },
    #[error("Invalid magic: {actual:?} != {expected:?}")]
    InvalidMagic { actual: [u8; 4], expected: [u8; 4] },
    #[error("Invalid class: {actual} != {expected}")]
    InvalidClass { actual: u8, expected: u8 },
    #[error("Section header table out of bounds")]
    SectionTableOutOfBounds,
}

/// Reads a plain-old-data ELF structure at `offset`, or `None` if it does not fit in `data`.
pub(crate) fn read_struct<T: Copy>(data: &[u8], offset: usize) -> Option<T> {
    let end = offset.checked_add(size_of::<T>())?;
    if end > data.len() {
        return None;
    }
    // SAFETY: The bounds are checked above and the ELF structures read through this are plain
    // integers, valid for any bit pattern. The read is unaligned so `data` can live anywhere.
    Some(unsafe { data.as_ptr().add(offset).cast::<T>().read_unaligned() })
}

/// A validated ELF64 image.
#[derive(Debug, Clone, Copy)]
pub struct Elf<'a> {
    data: &'a [u8],
    header: Header,
}

impl<'a> Elf<'a> {
    /// Validates the identification bytes and the section header table bounds.
    pub fn new(data: &'a [u8]) -> Result<Elf<'a>, ElfError> {
        if data.len() < header::SIZEOF_EHDR {
            return Err(ElfError::NotEnoughData {
                actual: data.len(),
                expected: header::SIZEOF_EHDR,
            });
        }
        if &data[..header::SELFMAG] != header::ELFMAG {
            let mut actual = [0u8; 4];
            actual.copy_from_slice(&data[..header::SELFMAG]);
            return Err(ElfError::InvalidMagic {
                actual,
                expected: *header::ELFMAG,
            });
        }
        if data[header::EI_CLASS] != header::ELFCLASS {
            return Err(ElfError::InvalidClass {
                actual: data[header::EI_CLASS],
                expected: header::ELFCLASS,
            });
        }

        let header: Header = read_struct(data, 0).ok_or(ElfError::NotEnoughData {
            actual: data.len(),
            expected: header::SIZEOF_EHDR,
        })?;

        let table_size = usize::from(header.e_shnum) * usize::from(header.e_shentsize);
        let table_end = usize::try_from(header.e_shoff)
            .ok()
            .and_then(|start| start.checked_add(table_size));
        match table_end {
            Some(end) if end <= data.len() => {}
            _ => return Err(ElfError::SectionTableOutOfBounds),
        }
        if header.e_shnum != 0 && usize::from(header.e_shentsize) < size_of::<SectionHeader>() {
            return Err(ElfError::SectionTableOutOfBounds);
        }

        Ok(Elf { data, header })
    }

    /// The raw image.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Iterate over the section headers.
    pub fn sections(&self) -> ElfSections<'a> {
        ElfSections::new(self.data, &self.header)
    }

    /// The section header at `index`, if there is one.
    pub fn section(&self, index: usize) -> Option<SectionHeader> {
        self.sections().nth(index)
    }

    /// Iterate over the `.symtab` entries, or `None` if the image is stripped.
    pub fn symbols(&self) -> Option<ElfSymbols<'a>> {
        let symtab = self
            .sections()
            .find(|section| section.sh_type == SHT_SYMTAB)?;
        let strtab = self.section(symtab.sh_link as usize)?;
        ElfSymbols::new(self.data, &symtab, &strtab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_images() {
        assert!(matches!(
            Elf::new(&[0x7f, b'E', b'L', b'F']),
            Err(ElfError::NotEnoughData { .. })
        ));
    }

    #[test]
    fn rejects_bad_magic() {
        let data = [0u8; header::SIZEOF_EHDR];
        assert!(matches!(
            Elf::new(&data),
            Err(ElfError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn rejects_32_bit_images() {
        let mut data = [0u8; header::SIZEOF_EHDR];
        data[..4].copy_from_slice(header::ELFMAG);
        data[header::EI_CLASS] = 1;
        assert!(matches!(
            Elf::new(&data),
            Err(ElfError::InvalidClass { actual: 1, .. })
        ));
    }

    #[test]
    fn section_table_must_fit() {
        let mut data = [0u8; header::SIZEOF_EHDR];
        data[..4].copy_from_slice(header::ELFMAG);
        data[header::EI_CLASS] = header::ELFCLASS;
        // e_shoff at 0x28, e_shentsize at 0x3a, e_shnum at 0x3c
        data[0x28] = 0x40;
        data[0x3a] = 64;
        data[0x3c] = 1;
        assert_eq!(Elf::new(&data).unwrap_err(), ElfError::SectionTableOutOfBounds);
    }

    #[test]
    fn image_without_sections_has_no_symbols() {
        let mut data = [0u8; header::SIZEOF_EHDR];
        data[..4].copy_from_slice(header::ELFMAG);
        data[header::EI_CLASS] = header::ELFCLASS;
        let elf = Elf::new(&data).unwrap();
        assert_eq!(elf.sections().count(), 0);
        assert!(elf.symbols().is_none());
    }
}
