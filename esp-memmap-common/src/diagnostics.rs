//! The logical-warning sink shared by the map parser, debuginfo reader and
//! memory-map builder.
//!
//! Per the error taxonomy, a `LogicalWarning` is a recoverable anomaly: the
//! contiguity invariant didn't hold, a region couldn't be mapped to a memory
//! type, a section overflowed into its neighbour. These are traced through
//! `tracing::warn!` for the ambient logging story, and also collected inline
//! so that callers and tests can inspect exactly what was downgraded without
//! having to install a subscriber.

use std::fmt;

/// A single recoverable anomaly raised during parsing or building.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Accumulates [`Diagnostic`]s raised over the course of one analysis.
///
/// Every push is also traced via `tracing::warn!`, so a caller that only
/// cares about live log output needs nothing further; a caller that wants to
/// inspect warnings programmatically (tests, a future formatter) can drain
/// this collector once the pipeline stage is done.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and emits it through `tracing`.
    pub fn warn(&mut self, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(message);
        tracing::warn!("{}", diagnostic.message);
        self.warnings.push(diagnostic);
    }

    /// Returns `true` if no warnings have been recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Number of warnings recorded so far.
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Iterates over the recorded warnings in the order they were raised.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.warnings.iter()
    }

    /// Consumes the collector, returning the recorded warnings.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.warnings
    }

    /// Merges another collector's warnings into this one, preserving order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_order() {
        let mut diags = Diagnostics::new();
        diags.warn("first");
        diags.warn("second");
        let collected: Vec<_> = diags.into_vec().into_iter().map(|d| d.message).collect();
        assert_eq!(collected, vec!["first", "second"]);
    }
}
