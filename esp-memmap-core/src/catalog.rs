//! The chip memory-type catalog: which address ranges belong to which
//! memory type, supplied by the caller rather than loaded from a bundled
//! per-chip YAML database.

use indexmap::IndexMap;
use serde::Deserialize;

/// One memory type's address range(s), as declared by the chip catalog.
///
/// Some memory types are addressable from two ranges (e.g. a cache-mapped
/// flash region and its raw counterpart); `secondary_address` is `0` when
/// only one range applies.
#[derive(Clone, Debug, Deserialize)]
pub struct MemTypeCatalogEntry {
    /// The display name for this memory type, if it differs from the
    /// catalog key (used to alias two catalog entries onto one memory type).
    #[serde(default)]
    pub name: Option<String>,
    pub primary_address: u64,
    pub length: u64,
    #[serde(default)]
    pub secondary_address: u64,
}

/// The full set of memory types a target chip exposes, keyed by catalog
/// name. Order is significant: regions are matched against entries in
/// iteration order and the first match wins.
pub type ChipCatalog = IndexMap<String, MemTypeCatalogEntry>;
