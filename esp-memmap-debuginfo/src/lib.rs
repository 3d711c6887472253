//! ELF and DWARF readers for the memory-map analyzer.
//!
//! [`elf`] exposes a minimal ELF reader built on [`goblin`], restricted to
//! the section and symbol fields the analyzer consumes. [`dwarf`] exposes a
//! DWARF CU/DIE reader built on [`gimli`], restricted to the
//! `DW_TAG_compile_unit`/`DW_TAG_subprogram`/`DW_TAG_variable` tags and the
//! name/address attributes needed to attribute a symbol to its source file.
//! [`symbols`] ties the two together via [`symbols::add_cus_to_symbols`].

#![warn(missing_docs)]

pub mod dwarf;
pub mod elf;
pub mod error;
pub mod symbols;

pub use dwarf::DwarfReader;
pub use elf::ElfObject;
pub use error::{DwarfError, DwarfErrorKind, ElfError, ElfErrorKind};
pub use symbols::add_cus_to_symbols;
