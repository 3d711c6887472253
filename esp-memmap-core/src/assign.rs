//! Stage 7: computing each memory type's total capacity and assigning
//! output sections into the memory type that contains their address
//! (§4.3 Stage 7).

use esp_memmap_common::Diagnostics;
use esp_memmap_linkermap::model::OutputSection;

use crate::assemble::{abbrev_section_name, assemble_section};
use crate::catalog::ChipCatalog;
use crate::regions::TypedRegion;
use crate::tree::MemType;

/// Computes each memory type's capacity from the catalog and regions, then
/// assigns every (already split) output section into the memory type whose
/// region contains its address.
///
/// A memory type's capacity is the sum of the distinct regions assigned to
/// it — two regions that alias the same physical range (same offset from
/// their catalog address, same length) count once. A section that
/// overflows past the end of its region is attributed to that region
/// anyway, with a diagnostic; a section that falls between two regions is
/// attributed to the preceding one under an `_overflow`-suffixed name.
pub fn build_memory_type_map(
    catalog: &ChipCatalog,
    regions: &[TypedRegion],
    sections: &[OutputSection],
    diagnostics: &mut Diagnostics,
) -> indexmap::IndexMap<String, MemType> {
    let mut memory_map: indexmap::IndexMap<String, MemType> = indexmap::IndexMap::new();
    let mut type_offset: indexmap::IndexMap<String, u64> = indexmap::IndexMap::new();
    let mut regions_by_type: indexmap::IndexMap<String, Vec<(u64, u64)>> = indexmap::IndexMap::new();

    for (catalog_name, info) in catalog {
        let alias = info.name.clone().unwrap_or_else(|| catalog_name.clone());
        memory_map.entry(alias.clone()).or_default();
        regions_by_type.entry(alias.clone()).or_default();
        let offset = if info.secondary_address != 0 {
            info.primary_address.abs_diff(info.secondary_address)
        } else {
            0
        };
        type_offset.insert(alias, offset);
    }

    for region in regions {
        let alias = &region.mem_type;
        let existing = regions_by_type.entry(alias.clone()).or_default();
        let is_alias = if existing.is_empty() {
            false
        } else {
            let offset = type_offset.get(alias).copied().unwrap_or(0);
            existing
                .iter()
                .any(|&(origin, length)| region.origin.abs_diff(origin) == offset && length == region.length)
        };

        if !is_alias {
            memory_map.entry(alias.clone()).or_default().size += region.length;
        }
        existing.push((region.origin, region.length));
    }

    let mut sorted_regions: Vec<&TypedRegion> = regions.iter().collect();
    sorted_regions.sort_by_key(|r| r.origin);

    for section in sections {
        let mut prev: Option<&TypedRegion> = None;
        let mut assigned = false;

        for region in &sorted_regions {
            let region_start = region.origin;
            let region_end = region.origin + region.length;

            if region_start <= section.address && section.address < region_end {
                if section.address + section.size > region_end {
                    diagnostics.warn(format!(
                        "output section {:?} (addr: {:#x}, size: {:#x}) exceeds memory region {:?} (addr: {:#x}, length: {:#x})",
                        section.name, section.address, section.size, region.name, region_start, region.length
                    ));
                }
                let node = assemble_section(section);
                let mem_type = memory_map.entry(region.mem_type.clone()).or_default();
                mem_type.used += section.size;
                mem_type.sections.insert(section.name.clone(), node);
                assigned = true;
                break;
            }

            if region_start > section.address {
                if let Some(prev_region) = prev {
                    diagnostics.warn(format!(
                        "{} overflow: output section {:?} (addr: {:#x}, size: {:#x}) does not fit into any memory region and is assigned to the preceding {:?} region",
                        prev_region.mem_type, section.name, section.address, section.size, prev_region.name
                    ));
                    let overflow_name = format!("{}_overflow", section.name);
                    let mut node = assemble_section(section);
                    node.abbrev_name = abbrev_section_name(&overflow_name);
                    let mem_type = memory_map.entry(prev_region.mem_type.clone()).or_default();
                    mem_type.used += section.size;
                    mem_type.sections.insert(overflow_name, node);
                    assigned = true;
                }
                break;
            }

            prev = Some(region);
        }

        if !assigned {
            diagnostics.warn(format!(
                "cannot assign output section {:?} (addr: {:#x}, size: {:#x}) to any memory type",
                section.name, section.address, section.size
            ));
        }
    }

    memory_map
}
