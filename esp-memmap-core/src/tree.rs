//! The five-level memory-map tree: memory types, output sections, archives,
//! object files and symbols.
//!
//! Every level below [`MemoryMap`] is keyed by name in an [`IndexMap`], which
//! preserves the order entries were inserted in rather than sorting by key.
//! That order is the construction order of the builder pipeline (roughly,
//! ascending address), and a caller that wants a different order runs
//! [`crate::sort::sort_memory_map`] rather than relying on map iteration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The root of one analysis: a target chip, an image size and the memory
/// types it was linked against.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMap {
    /// Schema version of this tree, for consumers that serialize it to JSON.
    pub version: String,
    pub target: String,
    /// The reference map's target, set only after [`crate::diff::diff_memory_maps`].
    #[serde(default)]
    pub target_diff: String,
    pub image_size: u64,
    #[serde(default)]
    pub image_size_diff: i64,
    pub project_path: String,
    #[serde(default)]
    pub project_path_diff: String,
    pub memory_types: IndexMap<String, MemType>,
}

/// One memory type (`iram`, `dram`, `flash_code`, ...): its total capacity,
/// how much of it is used, and the output sections placed within it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemType {
    pub size: u64,
    #[serde(default)]
    pub size_diff: i64,
    pub used: u64,
    #[serde(default)]
    pub used_diff: i64,
    pub sections: IndexMap<String, OutputSectionNode>,
}

/// An output section as it lands in the tree, keyed by its full linker name
/// (`.iram0.text`); [`Self::abbrev_name`] holds the last dotted component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSectionNode {
    pub abbrev_name: String,
    pub size: u64,
    #[serde(default)]
    pub size_diff: i64,
    pub archives: IndexMap<String, ArchiveNode>,
}

/// An archive (or `(exe)` for objects linked directly), keyed by its full
/// path relative to the build directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveNode {
    pub abbrev_name: String,
    pub size: u64,
    #[serde(default)]
    pub size_diff: i64,
    pub object_files: IndexMap<String, ObjectFileNode>,
}

/// An object file contributed by an archive, keyed by its path within the
/// archive (or its own path, for `(exe)`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectFileNode {
    pub abbrev_name: String,
    pub size: u64,
    #[serde(default)]
    pub size_diff: i64,
    pub symbols: IndexMap<String, SymbolNode>,
}

/// A single symbol's contribution, keyed by its name (with a trailing `()`
/// if it is a function).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolNode {
    pub abbrev_name: String,
    pub size: u64,
    #[serde(default)]
    pub size_diff: i64,
}

/// Common accessors shared by every non-root tree level, used by the diff
/// engine and the sort pass so they don't need one copy of their logic per
/// struct.
pub trait SizedNode {
    fn size(&self) -> u64;
    fn set_size(&mut self, size: u64);
    fn size_diff(&self) -> i64;
    fn set_size_diff(&mut self, size_diff: i64);
}

macro_rules! impl_sized_node {
    ($ty:ty) => {
        impl SizedNode for $ty {
            fn size(&self) -> u64 {
                self.size
            }
            fn set_size(&mut self, size: u64) {
                self.size = size;
            }
            fn size_diff(&self) -> i64 {
                self.size_diff
            }
            fn set_size_diff(&mut self, size_diff: i64) {
                self.size_diff = size_diff;
            }
        }
    };
}

impl_sized_node!(OutputSectionNode);
impl_sized_node!(ArchiveNode);
impl_sized_node!(ObjectFileNode);
impl_sized_node!(SymbolNode);
