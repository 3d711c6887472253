//! The memory-map builder, diff engine and post-processing passes (§4.3,
//! §4.4, §4.5 — Components C, D, E).
//!
//! [`builder::build`] is the entry point: it runs Stages 0-7 of the
//! pipeline over a parsed [`esp_memmap_linkermap::model::LinkerMap`] and
//! optional [`esp_memmap_debuginfo`] ELF/DWARF readers, producing a
//! [`tree::MemoryMap`]. [`diff::diff_memory_maps`] combines two such trees.
//! The remaining modules are post-processing passes a caller runs over the
//! finished tree: [`walk`], [`sort`], [`trim`], [`unify`], [`summary`] and
//! [`archive_deps`].

#![warn(missing_docs)]

pub mod archive_deps;
pub mod assemble;
pub mod assign;
pub mod attribute;
pub mod builder;
pub mod catalog;
pub mod diff;
pub mod dwarf_expand;
pub mod error;
pub mod image_size;
pub mod project;
pub mod regions;
pub mod sections_filter;
pub mod sort;
pub mod split;
pub mod summary;
pub mod trim;
pub mod tree;
pub mod unify;
pub mod walk;

pub use builder::{build, BuildInputs, BuildOptions};
pub use diff::diff_memory_maps;
pub use error::{BuildError, BuildErrorKind};
pub use tree::MemoryMap;
