//! Stage 3: the flashed/loaded image size (§4.3 Stage 3).

use indexmap::IndexMap;

use esp_memmap_linkermap::model::OutputSection;

use crate::sections_filter::ElfSectionSummary;

/// The total size of the bytes that must actually be present in the binary
/// image, as opposed to memory the linker reserved but that is zero-filled
/// at startup.
///
/// With an ELF available, this sums the size of every allocated
/// `SHT_PROGBITS` section — exactly the sections that carry initialized
/// bytes on disk. Without one, it falls back to summing every (already
/// filtered) output section except `.bss`/`noinit`, which is the closest
/// approximation obtainable from the map file alone.
pub fn image_size(
    elf_sections: Option<&IndexMap<String, ElfSectionSummary>>,
    sections: &[OutputSection],
) -> u64 {
    match elf_sections {
        Some(headers) => headers
            .values()
            .filter(|header| header.is_progbits())
            .map(|header| header.size)
            .sum(),
        None => sections
            .iter()
            .filter(|section| !(section.name.ends_with(".bss") || section.name.ends_with("noinit")))
            .map(|section| section.size)
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goblin::elf::section_header::{SHT_NOBITS, SHT_PROGBITS};

    fn section(name: &str, size: u64) -> OutputSection {
        OutputSection {
            name: name.to_owned(),
            address: 0,
            size,
            input_sections: Vec::new(),
        }
    }

    #[test]
    fn without_elf_excludes_bss_and_noinit() {
        let sections = vec![
            section(".iram0.text", 0x100),
            section(".dram0.bss", 0x200),
            section(".dram0.noinit", 0x40),
        ];
        assert_eq!(image_size(None, &sections), 0x100);
    }

    #[test]
    fn with_elf_sums_only_progbits() {
        let mut headers = IndexMap::new();
        headers.insert(
            ".iram0.text".to_owned(),
            ElfSectionSummary {
                ty: SHT_PROGBITS,
                size: 0x100,
            },
        );
        headers.insert(
            ".dram0.bss".to_owned(),
            ElfSectionSummary {
                ty: SHT_NOBITS,
                size: 0x200,
            },
        );
        assert_eq!(image_size(Some(&headers), &[]), 0x100);
    }
}
