//! Stage 2: dropping output sections that carry no real image bytes
//! (§4.3 Stage 2).

use goblin::elf::section_header::SHT_PROGBITS;
use indexmap::IndexMap;

use esp_memmap_debuginfo::elf::ElfObject;
use esp_memmap_linkermap::model::OutputSection;

/// The subset of an ELF section header the later stages need: enough to
/// confirm a section is allocated at runtime and to classify it for the
/// image-size computation.
#[derive(Clone, Copy, Debug)]
pub struct ElfSectionSummary {
    pub ty: u32,
    pub size: u64,
}

impl ElfSectionSummary {
    pub fn is_progbits(&self) -> bool {
        self.ty == SHT_PROGBITS
    }
}

/// Builds the name -> header-summary map used to cross-check map-file
/// output sections against the ELF's own section table, keeping only
/// sections that are both nonempty and allocated at runtime.
pub fn elf_section_headers(elf: &ElfObject<'_>) -> IndexMap<String, ElfSectionSummary> {
    let mut map = IndexMap::new();
    for section in elf.sections() {
        if section.size == 0 || !section.is_alloc() {
            continue;
        }
        map.insert(
            section.name,
            ElfSectionSummary {
                ty: section.ty,
                size: section.size,
            },
        );
    }
    map
}

fn looks_like_real_section(name: &str) -> bool {
    name.ends_with(".text")
        || name.ends_with(".data")
        || name.ends_with(".bss")
        || name.ends_with(".rodata")
        || name.ends_with("noinit")
        || name.ends_with(".vectors")
        || name.contains(".flash")
        || name.contains(".eh_frame")
}

/// Drops zero-size sections, linker-script bookkeeping sections (`*dummy*`,
/// `*reserved_for_iram*`, `*noload*`) and, when no ELF is available to
/// cross-check against, any section whose name doesn't look like a real
/// code/data section. Input sections with zero size are dropped too.
pub fn filter_output_sections(
    sections: Vec<OutputSection>,
    elf_sections: Option<&IndexMap<String, ElfSectionSummary>>,
) -> Vec<OutputSection> {
    sections
        .into_iter()
        .filter_map(|mut section| {
            if section.size == 0 {
                return None;
            }
            if section.name.ends_with("dummy")
                || section.name.ends_with("reserved_for_iram")
                || section.name.ends_with("noload")
            {
                return None;
            }
            match elf_sections {
                Some(headers) => {
                    if !headers.contains_key(&section.name) {
                        return None;
                    }
                }
                None => {
                    if !looks_like_real_section(&section.name) {
                        return None;
                    }
                }
            }
            section.input_sections.retain(|isec| isec.size != 0);
            Some(section)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str, size: u64) -> OutputSection {
        OutputSection {
            name: name.to_owned(),
            address: 0x4000_0000,
            size,
            input_sections: Vec::new(),
        }
    }

    #[test]
    fn drops_zero_size_sections() {
        let sections = vec![section(".iram0.text", 0)];
        assert!(filter_output_sections(sections, None).is_empty());
    }

    #[test]
    fn drops_bookkeeping_sections() {
        let sections = vec![section(".iram0.text_dummy", 0x100)];
        assert!(filter_output_sections(sections, None).is_empty());
    }

    #[test]
    fn keeps_recognized_sections_with_no_elf() {
        let sections = vec![section(".iram0.text", 0x100)];
        assert_eq!(filter_output_sections(sections, None).len(), 1);
    }

    #[test]
    fn unrecognized_name_is_dropped_with_no_elf() {
        let sections = vec![section(".unknown.blob", 0x100)];
        assert!(filter_output_sections(sections, None).is_empty());
    }

    #[test]
    fn elf_cross_check_keeps_only_matching_names() {
        let mut headers = IndexMap::new();
        headers.insert(
            ".iram0.text".to_owned(),
            ElfSectionSummary {
                ty: SHT_PROGBITS,
                size: 0x100,
            },
        );
        let sections = vec![section(".iram0.text", 0x100), section(".unknown.blob", 0x100)];
        let kept = filter_output_sections(sections, Some(&headers));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, ".iram0.text");
    }
}
