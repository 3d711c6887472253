//! Error type for the memory-map builder.

use std::error::Error;
use std::fmt;

use thiserror::Error;

/// The kind of [`BuildError`] that occurred.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildErrorKind {
    /// Neither a supplied target, a project description target nor the map
    /// file's own detected target was available.
    NoTarget,
    /// A symbol's `[value, value + size)` range extends past the input
    /// section it was matched against.
    SymbolDoesNotFit {
        symbol: String,
        input_section: String,
    },
    /// A symbol's address falls after every known input section.
    SymbolOutsideSections(String),
    /// A requested archive has no entry anywhere in the tree.
    ArchiveNotFound(String),
}

impl fmt::Display for BuildErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTarget => write!(
                f,
                "no target chip identifier supplied, found in the project description, or detected in the map file"
            ),
            Self::SymbolDoesNotFit {
                symbol,
                input_section,
            } => write!(
                f,
                "symbol {symbol:?} does not fit within input section {input_section:?}"
            ),
            Self::SymbolOutsideSections(symbol) => {
                write!(f, "symbol {symbol:?} lies outside every input section")
            }
            Self::ArchiveNotFound(archive) => write!(f, "archive {archive:?} not found"),
        }
    }
}

/// An error building a [`crate::tree::MemoryMap`].
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct BuildError {
    kind: BuildErrorKind,
    #[source]
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl BuildError {
    pub(crate) fn new<E>(kind: BuildErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self {
            kind,
            source: Some(source.into()),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> &BuildErrorKind {
        &self.kind
    }
}

impl From<BuildErrorKind> for BuildError {
    fn from(kind: BuildErrorKind) -> Self {
        Self { kind, source: None }
    }
}
