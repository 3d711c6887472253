//! Error type for the linker map parser.

use std::error::Error;
use std::fmt;

use thiserror::Error;

/// The kind of [`MapFileError`] that occurred.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapFileErrorKind {
    /// The `Memory Configuration` header was never found.
    MissingMemoryConfigHeader,
    /// A `Memory Configuration` row did not have three or four columns.
    MalformedMemoryConfigRow(String),
    /// An `origin`/`length` column was not a valid C-style numeric literal.
    InvalidNumericLiteral(String),
    /// The `Linker script and memory map` header was never found.
    MissingLinkerMapHeader,
}

impl fmt::Display for MapFileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMemoryConfigHeader => {
                write!(f, "map file has no 'Memory Configuration' section")
            }
            Self::MalformedMemoryConfigRow(line) => {
                write!(f, "malformed memory configuration row: {line:?}")
            }
            Self::InvalidNumericLiteral(token) => {
                write!(f, "invalid numeric literal: {token:?}")
            }
            Self::MissingLinkerMapHeader => {
                write!(f, "map file has no 'Linker script and memory map' section")
            }
        }
    }
}

/// An error parsing a linker map file.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct MapFileError {
    kind: MapFileErrorKind,
    #[source]
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl MapFileError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> &MapFileErrorKind {
        &self.kind
    }
}

impl From<MapFileErrorKind> for MapFileError {
    fn from(kind: MapFileErrorKind) -> Self {
        Self { kind, source: None }
    }
}
