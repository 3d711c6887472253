//! Stage 6: aggregating an output section's input sections into the
//! archive/object-file/symbol levels of the tree (§4.3 Stage 6).

use std::path::Path;

use esp_memmap_linkermap::model::OutputSection;

use crate::tree::{ArchiveNode, ObjectFileNode, OutputSectionNode, SymbolNode};

/// The display name for an output section: its last dotted component, with
/// a leading dot (`.iram0.text` -> `.text`). Unlike [`abbrev_path`], this is
/// not a path basename — linker section names are dot-separated, not
/// slash-separated.
pub fn abbrev_section_name(name: &str) -> String {
    match name.rsplit('.').next() {
        Some(last) if !last.is_empty() => format!(".{last}"),
        _ => name.to_owned(),
    }
}

/// The display name for an archive or object file path: its basename.
pub fn abbrev_path(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_owned())
}

/// Builds the archive/object-file/symbol subtree for one output section
/// from its (already split) input sections.
pub fn assemble_section(section: &OutputSection) -> OutputSectionNode {
    let mut archives: indexmap::IndexMap<String, ArchiveNode> = indexmap::IndexMap::new();

    for isec in &section.input_sections {
        let archive = archives.entry(isec.archive.clone()).or_insert_with(|| ArchiveNode {
            abbrev_name: abbrev_path(&isec.archive),
            size: 0,
            size_diff: 0,
            object_files: indexmap::IndexMap::new(),
        });
        archive.size += isec.size;

        let object_file = archive
            .object_files
            .entry(isec.object_file.clone())
            .or_insert_with(|| ObjectFileNode {
                abbrev_name: abbrev_path(&isec.object_file),
                size: 0,
                size_diff: 0,
                symbols: indexmap::IndexMap::new(),
            });
        object_file.size += isec.size;

        for symbol in &isec.symbols {
            object_file.symbols.insert(
                symbol.name.clone(),
                SymbolNode {
                    abbrev_name: symbol.name.clone(),
                    size: symbol.size,
                    size_diff: 0,
                },
            );
        }
    }

    OutputSectionNode {
        abbrev_name: abbrev_section_name(&section.name),
        size: section.size,
        size_diff: 0,
        archives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esp_memmap_linkermap::model::{InputSection, Symbol};

    #[test]
    fn abbrev_section_name_takes_last_dotted_component() {
        assert_eq!(abbrev_section_name(".iram0.text"), ".text");
        assert_eq!(abbrev_section_name(".flash.rodata"), ".rodata");
        assert_eq!(abbrev_section_name("noextension"), ".noextension");
    }

    #[test]
    fn abbrev_path_takes_basename() {
        assert_eq!(abbrev_path("esp-idf/main/libmain.a"), "libmain.a");
        assert_eq!(abbrev_path("(exe)"), "(exe)");
    }

    #[test]
    fn assembles_archive_object_symbol_levels() {
        let section = OutputSection {
            name: ".iram0.text".to_owned(),
            address: 0x4000_0000,
            size: 0x20,
            input_sections: vec![InputSection {
                name: "isec".to_owned(),
                address: 0x4000_0000,
                size: 0x20,
                archive: "esp-idf/main/libmain.a".to_owned(),
                object_file: "app_main.c.obj".to_owned(),
                fill: 0,
                symbols: vec![Symbol {
                    name: "app_main()".to_owned(),
                    address: 0x4000_0000,
                    size: 0x20,
                }],
            }],
        };

        let node = assemble_section(&section);
        assert_eq!(node.abbrev_name, ".text");
        let archive = &node.archives["esp-idf/main/libmain.a"];
        assert_eq!(archive.abbrev_name, "libmain.a");
        assert_eq!(archive.size, 0x20);
        let object_file = &archive.object_files["app_main.c.obj"];
        assert_eq!(object_file.abbrev_name, "app_main.c.obj");
        assert_eq!(object_file.size, 0x20);
        let symbol = &object_file.symbols["app_main()"];
        assert_eq!(symbol.size, 0x20);
    }
}
