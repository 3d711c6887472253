//! A minimal ELF reader.
//!
//! This does not attempt to be a general-purpose ELF library; it exposes
//! exactly the section, symbol and derived fields the memory-map builder
//! consumes (§4.2 of the design), on top of [`goblin`]'s section/symbol
//! table parsing.

use goblin::elf::section_header::{SHF_ALLOC, SHN_ABS, SHT_PROGBITS};
use goblin::elf::sym::{STT_FUNC, STT_NOTYPE, STT_OBJECT};
use goblin::elf::Elf;

use crate::error::{ElfError, ElfErrorKind};

/// The low-nibble `st_info` symbol type, restricted to the values this tool
/// distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolType {
    /// `STT_FUNC` — a function or other executable code.
    Func,
    /// `STT_OBJECT` — a data object such as a variable or array.
    Object,
    /// Any other `st_info` type (section, file, TLS, ...).
    Other(u8),
}

impl SymbolType {
    fn from_raw(raw: u8) -> Self {
        match raw {
            STT_FUNC => SymbolType::Func,
            STT_OBJECT => SymbolType::Object,
            other => SymbolType::Other(other),
        }
    }
}

/// An ELF section header, with its name already resolved.
#[derive(Clone, Debug)]
pub struct ElfSection {
    pub name: String,
    pub ty: u32,
    pub flags: u64,
    pub addr: u64,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
}

impl ElfSection {
    /// Whether this section occupies memory at runtime (`SHF_ALLOC`).
    pub fn is_alloc(&self) -> bool {
        self.flags & u64::from(SHF_ALLOC) != 0
    }

    /// Whether this section contributes initialized bytes to the image
    /// (`SHT_PROGBITS`), used for the image-size computation (§4.3 Stage 3).
    pub fn is_progbits(&self) -> bool {
        self.ty == SHT_PROGBITS
    }
}

/// An ELF symbol table entry, with derived type/bind/visibility and its name
/// already resolved.
#[derive(Clone, Debug)]
pub struct ElfSymbol {
    pub name: String,
    pub value: u64,
    pub size: u64,
    pub ty: SymbolType,
    pub bind: u8,
    pub visibility: u8,
    pub section_index: usize,
    /// Source path of the compilation unit this symbol was attributed to by
    /// [`crate::symbols::add_cus_to_symbols`], if DWARF expansion ran.
    pub cu_path: Option<String>,
}

impl ElfSymbol {
    /// Whether this symbol's `st_shndx` is `SHN_ABS` (an absolute value, not
    /// tied to any section) — such symbols are excluded from attribution
    /// (§4.2, `add_cus_to_symbols`).
    pub fn is_absolute(&self) -> bool {
        self.section_index == SHN_ABS as usize
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self.ty, SymbolType::Other(STT_NOTYPE)) && self.section_index != 0
    }
}

/// A parsed ELF relocatable or executable image.
pub struct ElfObject<'data> {
    elf: Elf<'data>,
    data: &'data [u8],
}

impl<'data> ElfObject<'data> {
    /// Tests whether the buffer starts with the ELF magic bytes.
    pub fn test(data: &[u8]) -> bool {
        data.get(0..goblin::elf::header::SELFMAG)
            .map_or(false, |magic| magic == goblin::elf::header::ELFMAG)
    }

    /// Parses an ELF image from the given buffer.
    pub fn parse(data: &'data [u8]) -> Result<Self, ElfError> {
        if !Self::test(data) {
            return Err(ElfErrorKind::InvalidMagic.into());
        }

        let elf = Elf::parse(data)?;
        Ok(ElfObject { elf, data })
    }

    /// `true` if this is a 64-bit ELF class.
    pub fn is_64(&self) -> bool {
        self.elf.is_64
    }

    /// `true` if this ELF's data encoding is little-endian.
    pub fn little_endian(&self) -> bool {
        self.elf.little_endian
    }

    /// The raw image bytes, for section-data access (e.g. DWARF sections).
    pub fn data(&self) -> &'data [u8] {
        self.data
    }

    /// Iterates over all section headers with their names resolved.
    pub fn sections(&self) -> impl Iterator<Item = ElfSection> + '_ {
        self.elf.section_headers.iter().map(move |shdr| ElfSection {
            name: self
                .elf
                .shdr_strtab
                .get_at(shdr.sh_name)
                .unwrap_or("")
                .to_owned(),
            ty: shdr.sh_type,
            flags: shdr.sh_flags,
            addr: shdr.sh_addr,
            offset: shdr.sh_offset,
            size: shdr.sh_size,
            link: shdr.sh_link,
        })
    }

    /// Returns the raw bytes of the section with the given name, if present.
    pub fn section_data(&self, name: &str) -> Option<&'data [u8]> {
        let shdr = self
            .elf
            .section_headers
            .iter()
            .find(|shdr| self.elf.shdr_strtab.get_at(shdr.sh_name) == Some(name))?;

        let start = shdr.sh_offset as usize;
        let end = start.checked_add(shdr.sh_size as usize)?;
        self.data.get(start..end)
    }

    /// Iterates over the static symbol table (`.symtab`), filtering out
    /// entries with no name.
    pub fn symbols(&self) -> impl Iterator<Item = ElfSymbol> + '_ {
        self.elf.syms.iter().filter_map(move |sym| {
            let name = self.elf.strtab.get_at(sym.st_name)?;
            Some(ElfSymbol {
                name: name.to_owned(),
                value: sym.st_value,
                size: sym.st_size,
                ty: SymbolType::from_raw(sym.st_type()),
                bind: sym.st_bind(),
                visibility: sym.st_visibility(),
                section_index: sym.st_shndx,
                cu_path: None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_elf() {
        assert!(!ElfObject::test(b"not an elf"));
        assert!(ElfObject::parse(b"not an elf").is_err());
    }
}
