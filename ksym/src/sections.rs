//! Section header iteration.

use core::fmt::Debug;

use goblin::elf64::{header::Header, section_header::SectionHeader};

use crate::elf::read_struct;

/// An iterator over the section headers of an ELF image.
#[derive(Clone)]
pub struct ElfSections<'a> {
    data: &'a [u8],
    offset: usize,
    stride: usize,
    count: usize,
    i: usize,
}

impl<'a> ElfSections<'a> {
    pub(crate) fn new(data: &'a [u8], header: &Header) -> Self {
        Self {
            data,
            offset: header.e_shoff as usize,
            stride: usize::from(header.e_shentsize),
            count: usize::from(header.e_shnum),
            i: 0,
        }
    }
}

impl Iterator for ElfSections<'_> {
    type Item = SectionHeader;

    fn next(&mut self) -> Option<Self::Item> {
        if self.i >= self.count {
            return None;
        }
        let item = read_struct(self.data, self.offset + self.i * self.stride);
        self.i += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.i;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ElfSections<'_> {}

impl Debug for ElfSections<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ElfSections")
            .field("count", &self.count)
            .field("position", &self.i)
            .finish()
    }
}
