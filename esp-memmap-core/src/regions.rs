//! Stage 1: splitting linker memory regions across chip memory types
//! (§4.3 Stage 1).

use esp_memmap_common::Diagnostics;
use esp_memmap_linkermap::model::MemoryRegion;

use crate::catalog::ChipCatalog;

/// A linker region (or the slice of one) assigned to a single memory type.
///
/// A region that straddles two catalog address ranges (rare, but the
/// catalog doesn't promise otherwise) is split into one `TypedRegion` per
/// range it touches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedRegion {
    pub name: String,
    pub origin: u64,
    pub length: u64,
    pub attrs: String,
    pub mem_type: String,
}

/// Assigns every non-`*default*` linker region to a memory type from
/// `catalog`, splitting a region across catalog boundaries where necessary.
///
/// A region with no home in the catalog is assigned to whichever prior
/// region ends at the same address (a zero-length carve-out reserved by the
/// linker script); failing that, it is dropped with a diagnostic.
pub fn split_memory_regions(
    regions: &[MemoryRegion],
    catalog: &ChipCatalog,
    diagnostics: &mut Diagnostics,
) -> Vec<TypedRegion> {
    let mut out: Vec<TypedRegion> = Vec::new();

    for region in regions {
        if region.name == "*default*" {
            continue;
        }

        let mut origin = region.origin;
        let mut length = region.length;

        loop {
            let mut matched = false;

            for (catalog_name, info) in catalog {
                let mut addr = info.primary_address;
                let mut found = addr <= origin && origin < addr + info.length;
                if !found && info.secondary_address != 0 {
                    addr = info.secondary_address;
                    found = addr <= origin && origin < addr + info.length;
                }
                if !found {
                    continue;
                }

                let used_length = length.min(info.length - (origin - addr));
                out.push(TypedRegion {
                    name: region.name.clone(),
                    origin,
                    length: used_length,
                    attrs: region.attrs.clone(),
                    mem_type: info.name.clone().unwrap_or_else(|| catalog_name.clone()),
                });
                origin += used_length;
                length -= used_length;
                matched = true;
                break;
            }

            if matched {
                if length == 0 {
                    break;
                }
                continue;
            }

            if let Some(carve_out) = out
                .iter()
                .find(|r| origin + length == r.origin + r.length)
                .map(|r| r.mem_type.clone())
            {
                out.push(TypedRegion {
                    name: region.name.clone(),
                    origin,
                    length,
                    attrs: region.attrs.clone(),
                    mem_type: carve_out,
                });
                if length == 0 {
                    break;
                }
                continue;
            }

            diagnostics.warn(format!(
                "cannot assign memory region {:?} (origin: {:#x}, length: {:#x}) to any chip memory type, skipping",
                region.name, origin, length
            ));
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemTypeCatalogEntry;

    fn region(name: &str, origin: u64, length: u64) -> MemoryRegion {
        MemoryRegion {
            name: name.to_owned(),
            origin,
            length,
            attrs: "xrw".to_owned(),
        }
    }

    #[test]
    fn default_region_is_skipped() {
        let catalog = ChipCatalog::new();
        let mut diagnostics = Diagnostics::new();
        let regions = vec![region("*default*", 0, 0xffff_ffff)];
        assert!(split_memory_regions(&regions, &catalog, &mut diagnostics).is_empty());
    }

    #[test]
    fn region_assigned_to_matching_catalog_entry() {
        let mut catalog = ChipCatalog::new();
        catalog.insert(
            "iram".to_owned(),
            MemTypeCatalogEntry {
                name: None,
                primary_address: 0x4000_0000,
                length: 0x4000,
                secondary_address: 0,
            },
        );
        let mut diagnostics = Diagnostics::new();
        let regions = vec![region("iram0_0_seg", 0x4000_0000, 0x4000)];
        let typed = split_memory_regions(&regions, &catalog, &mut diagnostics);
        assert_eq!(typed.len(), 1);
        assert_eq!(typed[0].mem_type, "iram");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn region_spanning_two_catalog_entries_is_split() {
        let mut catalog = ChipCatalog::new();
        catalog.insert(
            "iram".to_owned(),
            MemTypeCatalogEntry {
                name: None,
                primary_address: 0x4000_0000,
                length: 0x2000,
                secondary_address: 0,
            },
        );
        catalog.insert(
            "dram".to_owned(),
            MemTypeCatalogEntry {
                name: None,
                primary_address: 0x4000_2000,
                length: 0x2000,
                secondary_address: 0,
            },
        );
        let mut diagnostics = Diagnostics::new();
        let regions = vec![region("spanning", 0x4000_0000, 0x4000)];
        let typed = split_memory_regions(&regions, &catalog, &mut diagnostics);
        assert_eq!(typed.len(), 2);
        assert_eq!(typed[0].mem_type, "iram");
        assert_eq!(typed[0].length, 0x2000);
        assert_eq!(typed[1].mem_type, "dram");
        assert_eq!(typed[1].length, 0x2000);
    }

    #[test]
    fn unmatched_region_warns_and_is_dropped() {
        let catalog = ChipCatalog::new();
        let mut diagnostics = Diagnostics::new();
        let regions = vec![region("unknown", 0x1000, 0x100)];
        let typed = split_memory_regions(&regions, &catalog, &mut diagnostics);
        assert!(typed.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }
}
