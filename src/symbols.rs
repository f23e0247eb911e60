//! Symbols of the running executable.

use std::{fs, io, path::PathBuf};

use ksym::{ElfError, ElfSymbolTable};
use thiserror::Error;

use crate::demo;

/// Why the executable's symbols could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The executable could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// What went wrong.
        source: io::Error,
    },
    /// It is not an ELF image this reader understands.
    #[error("cannot parse the executable: {0}")]
    Elf(#[from] ElfError),
}

/// Reads the running executable.
pub fn own_image() -> Result<Vec<u8>, LoadError> {
    let path = std::env::current_exe().map_err(|source| LoadError::Io {
        path: PathBuf::from("/proc/self/exe"),
        source,
    })?;
    fs::read(&path).map_err(|source| LoadError::Io { path, source })
}

/// Parses `image`, which must be the running executable, and works out where it was loaded by
/// looking for [`demo::kdb_add`].
pub fn table(image: &[u8]) -> Result<ElfSymbolTable<'_>, LoadError> {
    ElfSymbolTable::with_anchor(image, "kdb_add", demo::kdb_add as usize).map_err(LoadError::from)
}
