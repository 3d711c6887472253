//! `esp-memmap` analyzes the static memory footprint of firmware built for
//! the ESP32 family of SoCs. Given a linker-produced map file, and
//! optionally the relocatable ELF it was linked from (with DWARF debugging
//! information) and a project-description record, it builds a hierarchical
//! memory map that attributes every byte of the image to a memory type
//! (IRAM, DRAM, flash...), then to an output section, an originating
//! static library, an object file, and a symbol. Given two such maps, it
//! computes the size deltas between them.
//!
//! This crate re-exports the individual pieces of the workspace under one
//! name, the common umbrella-crate convention for bundling a family of
//! format-specific crates behind a single dependency:
//!
//! - [`linkermap`]: the linker map file parser (Component B).
//! - [`debuginfo`] (feature `debuginfo`, default on): the ELF/DWARF reader
//!   (Component A).
//! - [`core`]: the memory-map tree, builder, diff engine and
//!   post-processing passes (Components C, D, E).
//! - [`common`]: shared primitives (byte buffers, numeric parsing,
//!   diagnostics) used by the crates above.
//!
//! # Usage
//!
//! Parse a map file, optionally load an ELF, build the memory map, and
//! walk or diff the result:
//!
//! ```no_run
//! use esp_memmap::common::Diagnostics;
//! use esp_memmap::core::{build, BuildInputs, BuildOptions};
//! use esp_memmap::core::catalog::ChipCatalog;
//! use esp_memmap::linkermap::parse_map_file;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let text = std::fs::read_to_string("build/app.map")?;
//! let mut diagnostics = Diagnostics::new();
//! let map = parse_map_file(&text, None, &mut diagnostics)?;
//! let catalog: ChipCatalog = serde_json::from_str(&std::fs::read_to_string("esp32.json")?)?;
//!
//! let inputs = BuildInputs {
//!     map: &map,
//!     elf: None,
//!     dwarf: None,
//!     project: None,
//!     sdk_config: None,
//!     catalog: &catalog,
//!     project_path: "build/app.map".to_owned(),
//! };
//! let tree = build(inputs, &BuildOptions::new(), &mut diagnostics)?;
//! println!("{}", serde_json::to_string_pretty(&tree)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Minimal Rust Version
//!
//! This crate is known to require at least Rust 1.74.

#![warn(missing_docs)]

#[doc(inline)]
pub use esp_memmap_common as common;
#[doc(inline)]
pub use esp_memmap_core as core;
#[doc(inline)]
#[cfg(feature = "debuginfo")]
pub use esp_memmap_debuginfo as debuginfo;
#[doc(inline)]
pub use esp_memmap_linkermap as linkermap;
