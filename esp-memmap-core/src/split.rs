//! Stage 5: splitting output sections (and, recursively, the input
//! sections and symbols within them) across memory-type region boundaries
//! (§4.3 Stage 5).

use esp_memmap_linkermap::model::{InputSection, OutputSection, Symbol};

use crate::regions::TypedRegion;

/// Splits every output section that straddles a region boundary into one
/// piece per region it overlaps, recursively splitting input sections and
/// symbols the same way. A section entirely contained within one region is
/// returned unchanged.
///
/// Sections that fall outside every known region are passed through as-is;
/// [`crate::assign::build_memory_type_map`] is responsible for warning
/// about those.
pub fn split_output_sections(
    sections: Vec<OutputSection>,
    regions: &[TypedRegion],
) -> Vec<OutputSection> {
    let mut work: Vec<OutputSection> = sections;
    let mut result: Vec<OutputSection> = Vec::new();

    while let Some(section) = work.pop() {
        let mut handled = false;

        for region in regions {
            if section.address < region.origin || section.address >= region.origin + region.length {
                continue;
            }

            let region_end = region.origin + region.length;
            if section.address + section.size <= region_end {
                result.push(section.clone());
                handled = true;
                break;
            }

            let (first, second) = split_output_section_at(&section, region_end);
            result.push(first);
            work.push(second);
            handled = true;
            break;
        }

        if !handled {
            result.push(section);
        }
    }

    result
}

fn split_output_section_at(section: &OutputSection, split_addr: u64) -> (OutputSection, OutputSection) {
    let mut first = OutputSection {
        name: section.name.clone(),
        address: section.address,
        size: split_addr - section.address,
        input_sections: Vec::new(),
    };
    let mut second = OutputSection {
        name: section.name.clone(),
        address: split_addr,
        size: section.address + section.size - split_addr,
        input_sections: Vec::new(),
    };

    for isec in &section.input_sections {
        let isec_end = isec.address + isec.size + isec.fill;
        if isec_end <= split_addr {
            first.input_sections.push(isec.clone());
        } else if isec.address >= split_addr {
            second.input_sections.push(isec.clone());
        } else {
            let (isec1, isec2) = split_input_section_at(isec, split_addr);
            first.input_sections.push(isec1);
            second.input_sections.push(isec2);
        }
    }

    (first, second)
}

fn split_input_section_at(isec: &InputSection, split_addr: u64) -> (InputSection, InputSection) {
    let mut isec1 = InputSection {
        name: isec.name.clone(),
        address: isec.address,
        size: (split_addr - isec.address).min(isec.size),
        archive: isec.archive.clone(),
        object_file: isec.object_file.clone(),
        fill: 0,
        symbols: Vec::new(),
    };
    isec1.fill = split_addr - (isec1.address + isec1.size);

    let mut isec2 = InputSection {
        name: isec.name.clone(),
        address: split_addr,
        size: isec.size - isec1.size,
        archive: isec.archive.clone(),
        object_file: isec.object_file.clone(),
        fill: isec.fill - isec1.fill,
        symbols: Vec::new(),
    };

    for symbol in &isec.symbols {
        let symbol_end = symbol.address + symbol.size;
        if symbol_end <= split_addr {
            isec1.symbols.push(symbol.clone());
        } else if symbol.address >= split_addr {
            isec2.symbols.push(symbol.clone());
        } else {
            let first_size = split_addr - symbol.address;
            isec1.symbols.push(Symbol {
                name: symbol.name.clone(),
                address: symbol.address,
                size: first_size,
            });
            isec2.symbols.push(Symbol {
                name: symbol.name.clone(),
                address: split_addr,
                size: symbol.size - first_size,
            });
        }
    }

    (isec1, isec2)
}
