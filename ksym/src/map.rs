//! A [`SymbolTable`] built from an explicit list of functions.

use alloc::vec::Vec;

use log::warn;

use crate::{DebugInfo, SymbolTable, UNKNOWN, name_matches};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry<'a> {
    name: &'a str,
    start: usize,
    size: usize,
    file: &'a str,
    line: u32,
    seq: usize,
}

impl Entry<'_> {
    fn contains(&self, addr: usize) -> bool {
        addr >= self.start && addr - self.start < self.size.max(1)
    }
}

/// A list of functions with optional source locations.
///
/// Intended for tables emitted by a build step and for tests. Entries are kept sorted by address;
/// the first entry added under a name wins name lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolMap<'a> {
    entries: Vec<Entry<'a>>,
}

impl<'a> SymbolMap<'a> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a function of `size` bytes starting at `start` with no source location.
    pub fn insert(&mut self, name: &'a str, start: usize, size: usize) -> &mut Self {
        self.insert_with_location(name, start, size, UNKNOWN, 0)
    }

    /// Adds a function with the file and line it was defined at.
    pub fn insert_with_location(
        &mut self,
        name: &'a str,
        start: usize,
        size: usize,
        file: &'a str,
        line: u32,
    ) -> &mut Self {
        if self.entries.iter().any(|e| e.name == name) {
            warn!("symbol {} added twice, keeping the first", name);
        }
        let seq = self.entries.len();
        let index = self.entries.partition_point(|e| e.start <= start);
        self.entries.insert(
            index,
            Entry {
                name,
                start,
                size,
                file,
                line,
                seq,
            },
        );
        self
    }

    /// The number of functions in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SymbolTable for SymbolMap<'_> {
    fn resolve_name(&self, name: &str) -> Option<usize> {
        // Insertion order decides duplicates, not address order.
        self.entries
            .iter()
            .filter(|e| name_matches(e.name, name))
            .min_by_key(|e| e.seq)
            .map(|e| e.start)
    }

    fn resolve_address(&self, addr: usize) -> Option<DebugInfo<'_>> {
        let index = self.entries.partition_point(|e| e.start <= addr);
        let entry = self.entries[..index].last().filter(|e| e.contains(addr))?;
        Some(DebugInfo {
            file: entry.file,
            line: entry.line,
            function_name: entry.name,
            function_start: entry.start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> SymbolMap<'static> {
        let mut map = SymbolMap::new();
        map.insert_with_location("monitor", 0x2000, 0x100, "kern/monitor.rs", 40)
            .insert("entry", 0x1000, 0x10)
            .insert("etext", 0x3000, 0);
        map
    }

    #[test]
    fn resolves_names() {
        let map = map();
        assert_eq!(map.resolve_name("entry"), Some(0x1000));
        assert_eq!(map.resolve_name("monitor"), Some(0x2000));
        assert_eq!(map.resolve_name("missing"), None);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn first_inserted_name_wins() {
        let mut map = map();
        map.insert("entry", 0x500, 0x10);
        assert_eq!(map.resolve_name("entry"), Some(0x1000));
    }

    #[test]
    fn resolves_addresses_inside_functions() {
        let map = map();
        let info = map.resolve_address(0x2042).unwrap();
        assert_eq!(info.function_name, "monitor");
        assert_eq!(info.file, "kern/monitor.rs");
        assert_eq!(info.line, 40);
        assert_eq!(info.offset(0x2042), 0x42);

        assert!(map.resolve_address(0x2100).is_none());
        assert!(map.resolve_address(0x0fff).is_none());
        assert_eq!(map.resolve_address(0x3000).unwrap().function_name, "etext");
        assert!(map.resolve_address(0x3001).is_none());
    }
}
