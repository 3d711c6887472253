//! Stage 0: expanding `(exe)` input sections (object files linked directly
//! into the executable rather than pulled from an archive) down to the
//! compilation unit and owning build component DWARF identifies (§4.3
//! Stage 0).
//!
//! This only runs when link-time optimization merged translation units
//! together at link time, destroying the per-object-file granularity the
//! map file would otherwise carry. [`crate::builder::build`] decides
//! whether to run it from [`crate::project::SdkConfig::compiler_lto_linktime`]
//! or an explicit override.

use std::path::Path;

use esp_memmap_debuginfo::elf::ElfSymbol;
use esp_memmap_linkermap::model::InputSection;

use crate::project::ProjectDescription;

const DIRECT_LINK_ARCHIVE: &str = "(exe)";

/// A build component's source directory and the archive path (relative to
/// the build directory) its object files are attributed to once expanded.
pub struct Component {
    component_path: String,
    archive_relpath: String,
}

/// Builds the component lookup table from a project description, sorted so
/// that the longest (most specific) component path is matched first.
pub fn build_components(project: &ProjectDescription) -> Vec<Component> {
    let mut components: Vec<Component> = project
        .build_component_info
        .values()
        .filter(|info| !info.file.is_empty())
        .map(|info| Component {
            component_path: to_posix(&info.dir),
            archive_relpath: relative_to_posix(&info.file, &project.build_dir),
        })
        .collect();
    components.sort_by_key(|c| std::cmp::Reverse(c.component_path.len()));
    components
}

fn find_component<'a>(cu_path: &str, components: &'a [Component]) -> Option<&'a Component> {
    let cu_path = to_posix(cu_path);
    components
        .iter()
        .find(|component| cu_path.starts_with(&component.component_path))
}

fn to_posix(path: &str) -> String {
    path.replace('\\', "/")
}

fn relative_to_posix(file: &str, build_dir: &str) -> String {
    let file = to_posix(file);
    let build_dir = to_posix(build_dir);
    let build_dir = build_dir.trim_end_matches('/');
    file.strip_prefix(build_dir)
        .map(|rest| rest.trim_start_matches('/').to_owned())
        .unwrap_or(file)
}

fn cu_basename(cu_path: &str) -> String {
    Path::new(cu_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cu_path.to_owned())
}

struct ExpansionSymbol<'a> {
    address: u64,
    elf_symbol: &'a ElfSymbol,
    component: &'a Component,
}

/// Expands every `(exe)` input section across the output sections,
/// replacing the compiler's "linked directly" attribution with the
/// component archive path DWARF traces each covered byte range back to.
///
/// Bytes not covered by any eligible, DWARF-attributed symbol keep their
/// `(exe)` attribution; a gap between two attributed symbols is emitted as
/// its own, still-`(exe)`, input section.
pub fn expand_input_sections(
    sections: &mut [esp_memmap_linkermap::model::OutputSection],
    elf_symbols: &[ElfSymbol],
    components: &[Component],
) {
    let mut symbols: Vec<ExpansionSymbol<'_>> = Vec::new();
    for elf_symbol in elf_symbols {
        if elf_symbol.size == 0 {
            continue;
        }
        let Some(cu_path) = elf_symbol.cu_path.as_deref() else {
            continue;
        };
        let Some(component) = find_component(cu_path, components) else {
            continue;
        };
        symbols.push(ExpansionSymbol {
            address: elf_symbol.value,
            elf_symbol,
            component,
        });
    }
    symbols.sort_by_key(|s| s.address);

    for section in sections.iter_mut() {
        let mut expanded = Vec::new();
        for isec in std::mem::take(&mut section.input_sections) {
            if isec.archive != DIRECT_LINK_ARCHIVE {
                expanded.push(isec);
                continue;
            }
            expand_one(isec, &symbols, &mut expanded);
        }
        section.input_sections = expanded;
    }
}

fn expand_one(isec: InputSection, symbols: &[ExpansionSymbol<'_>], out: &mut Vec<InputSection>) {
    let mut cur = isec;

    for entry in symbols {
        if entry.address < cur.address {
            continue;
        } else if entry.address == cur.address && cur.size != 0 {
            out.push(attributed_input_section(entry));
            cur.address += entry.elf_symbol.size;
            cur.size -= entry.elf_symbol.size;
        } else if entry.address < cur.address + cur.size {
            let gap_size = entry.address - cur.address;
            out.push(InputSection {
                name: cur.name.clone(),
                address: cur.address,
                size: gap_size,
                archive: DIRECT_LINK_ARCHIVE.to_owned(),
                object_file: cur.object_file.clone(),
                fill: 0,
                symbols: Vec::new(),
            });
            cur.address += gap_size;
            cur.size -= gap_size;

            out.push(attributed_input_section(entry));
            cur.address += entry.elf_symbol.size;
            cur.size -= entry.elf_symbol.size;
        } else {
            if cur.size != 0 || out.is_empty() {
                out.push(cur);
            } else if let Some(last) = out.last_mut() {
                last.fill = cur.fill;
            }
            return;
        }
    }
    // The symbol list was exhausted without a gap/overflow check ever
    // firing — any unattributed tail stays unexpanded, matching the
    // original tool's behaviour when expansion data runs out mid-section.
}

fn attributed_input_section(entry: &ExpansionSymbol<'_>) -> InputSection {
    InputSection {
        name: entry.elf_symbol.name.clone(),
        address: entry.elf_symbol.value,
        size: entry.elf_symbol.size,
        archive: entry.component.archive_relpath.clone(),
        object_file: cu_basename(entry.elf_symbol.cu_path.as_deref().unwrap_or_default()),
        fill: 0,
        symbols: Vec::new(),
    }
}
