//! The top-level builder: assembles a [`MemoryMap`] from a parsed linker
//! map, an optional ELF (with optional DWARF) and an optional project
//! description (§4.3).

use esp_memmap_common::Diagnostics;
use esp_memmap_debuginfo::dwarf::DwarfReader;
use esp_memmap_debuginfo::elf::ElfObject;
use esp_memmap_debuginfo::symbols::add_cus_to_symbols;
use esp_memmap_linkermap::model::LinkerMap;

use crate::attribute::attach_symbols;
use crate::catalog::ChipCatalog;
use crate::dwarf_expand::{build_components, expand_input_sections};
use crate::error::{BuildError, BuildErrorKind};
use crate::image_size::image_size;
use crate::project::{ProjectDescription, SdkConfig};
use crate::regions::split_memory_regions;
use crate::sections_filter::{elf_section_headers, filter_output_sections};
use crate::split::split_output_sections;
use crate::tree::MemoryMap;

/// Schema version written into every [`MemoryMap`] this builder produces.
pub const SCHEMA_VERSION: &str = "1.0";

/// Inputs the builder needs that aren't already implied by the linker map
/// itself.
pub struct BuildInputs<'a> {
    pub map: &'a LinkerMap,
    pub elf: Option<&'a ElfObject<'a>>,
    pub dwarf: Option<&'a DwarfReader<'a>>,
    pub project: Option<&'a ProjectDescription>,
    pub sdk_config: Option<&'a SdkConfig>,
    pub catalog: &'a ChipCatalog,
    /// The path the map file was read from, recorded verbatim in the tree.
    pub project_path: String,
}

/// Knobs that change builder behavior without changing what inputs it
/// needs.
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// If `false` while an ELF was supplied, every input section's symbol
    /// list is left empty rather than populated from the ELF symbol table.
    /// This is distinct from not supplying an ELF at all, which still
    /// synthesizes one symbol per input section from the map file alone.
    pub load_symbols: bool,
    /// Overrides the DWARF-expansion auto-detection
    /// ([`SdkConfig::compiler_lto_linktime`]). `None` defers to the SDK
    /// config (or skips expansion if none was supplied).
    pub use_dwarf: Option<bool>,
    /// Overrides target detection (explicit target beats the project
    /// description, which beats the map file's own detected target).
    pub supplied_target: Option<String>,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self {
            load_symbols: true,
            use_dwarf: None,
            supplied_target: None,
        }
    }
}

/// Runs the full builder pipeline (§4.3 Stages 0-7), producing the
/// hierarchical memory-map tree.
pub fn build(
    inputs: BuildInputs<'_>,
    options: &BuildOptions,
    diagnostics: &mut Diagnostics,
) -> Result<MemoryMap, BuildError> {
    let target = options
        .supplied_target
        .clone()
        .or_else(|| inputs.project.map(|p| p.target.clone()))
        .or_else(|| inputs.map.target.clone())
        .ok_or(BuildErrorKind::NoTarget)?;

    let use_dwarf = options
        .use_dwarf
        .or_else(|| inputs.sdk_config.map(|c| c.compiler_lto_linktime))
        .unwrap_or(false);

    let mut working_sections = inputs.map.output_sections.clone();

    let mut elf_symbols: Vec<_> = inputs
        .elf
        .map(|elf| elf.symbols().collect())
        .unwrap_or_default();

    if use_dwarf {
        if let (Some(dwarf), Some(project)) = (inputs.dwarf, inputs.project) {
            add_cus_to_symbols(dwarf, &mut elf_symbols)?;
            let components = build_components(project);
            expand_input_sections(&mut working_sections, &elf_symbols, &components);
        }
    }

    let elf_sections = inputs.elf.map(elf_section_headers);
    let sections_filtered = filter_output_sections(working_sections, elf_sections.as_ref());
    let size = image_size(elf_sections.as_ref(), &sections_filtered);

    let mut sections_attributed = sections_filtered;
    let symbols_for_attribution = match inputs.elf {
        Some(_) if options.load_symbols => Some(elf_symbols.as_slice()),
        Some(_) => Some(&[][..]),
        None => None,
    };
    attach_symbols(symbols_for_attribution, &mut sections_attributed)?;

    let regions = split_memory_regions(&inputs.map.regions, inputs.catalog, diagnostics);
    let sections_split = split_output_sections(sections_attributed, &regions);
    let memory_types =
        crate::assign::build_memory_type_map(inputs.catalog, &regions, &sections_split, diagnostics);

    Ok(MemoryMap {
        version: SCHEMA_VERSION.to_owned(),
        target,
        target_diff: String::new(),
        image_size: size,
        image_size_diff: 0,
        project_path: inputs.project_path,
        project_path_diff: String::new(),
        memory_types,
    })
}
