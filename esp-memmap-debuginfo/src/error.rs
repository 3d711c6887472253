//! Error types for the ELF and DWARF readers.

use std::error::Error;
use std::fmt;

use thiserror::Error;

/// The kind of [`ElfError`] that occurred.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElfErrorKind {
    /// The file does not start with the ELF magic bytes.
    InvalidMagic,
    /// The ELF header, program headers or section headers could not be parsed.
    MalformedHeader,
    /// A symbol table references a string table that doesn't exist.
    MissingStringTable,
}

impl fmt::Display for ElfErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic => write!(f, "not an ELF file"),
            Self::MalformedHeader => write!(f, "malformed ELF header or section table"),
            Self::MissingStringTable => write!(f, "symbol table has no linked string table"),
        }
    }
}

/// An error parsing an [`ElfObject`](crate::elf::ElfObject).
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ElfError {
    kind: ElfErrorKind,
    #[source]
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ElfError {
    pub(crate) fn new<E>(kind: ElfErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self {
            kind,
            source: Some(source.into()),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ElfErrorKind {
        self.kind
    }
}

impl From<ElfErrorKind> for ElfError {
    fn from(kind: ElfErrorKind) -> Self {
        Self { kind, source: None }
    }
}

impl From<goblin::error::Error> for ElfError {
    fn from(e: goblin::error::Error) -> Self {
        Self::new(ElfErrorKind::MalformedHeader, e)
    }
}

/// The kind of [`DwarfError`] that occurred.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DwarfErrorKind {
    /// The `debug_abbrev_offset`/`unit_type` ordering for an unsupported DWARF version was hit.
    UnsupportedVersion(u16),
    /// An attribute form outside the restricted set this reader consumes.
    UnsupportedForm(u16),
    /// A DWARF expression evaluation did not leave exactly one value on the stack.
    InvalidExpression,
    /// A reference attribute pointed outside of any known compilation unit.
    InvalidUnitRef,
    /// The underlying section data was truncated or otherwise corrupted.
    CorruptedData,
}

impl fmt::Display for DwarfErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion(v) => write!(f, "unsupported DWARF version {v}"),
            Self::UnsupportedForm(form) => write!(f, "unsupported attribute form 0x{form:x}"),
            Self::InvalidExpression => {
                write!(f, "DWARF expression did not evaluate to a single address")
            }
            Self::InvalidUnitRef => write!(f, "reference does not resolve to a known unit"),
            Self::CorruptedData => write!(f, "corrupted DWARF debug data"),
        }
    }
}

/// An error reading DWARF debugging information.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct DwarfError {
    kind: DwarfErrorKind,
    #[source]
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl DwarfError {
    pub(crate) fn new<E>(kind: DwarfErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self {
            kind,
            source: Some(source.into()),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> DwarfErrorKind {
        self.kind
    }
}

impl From<DwarfErrorKind> for DwarfError {
    fn from(kind: DwarfErrorKind) -> Self {
        Self { kind, source: None }
    }
}

impl From<gimli::Error> for DwarfError {
    fn from(e: gimli::Error) -> Self {
        Self::new(DwarfErrorKind::CorruptedData, e)
    }
}
