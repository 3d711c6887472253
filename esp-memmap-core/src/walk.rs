//! Component E: a uniform walk over the tree to an arbitrary depth,
//! underlying sort, trim and the summary views (§4.5).

use crate::tree::{ArchiveNode, MemType, MemoryMap, ObjectFileNode, OutputSectionNode, SymbolNode};

/// How deep [`walk`] should descend before yielding an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Depth {
    Types,
    Sections,
    Archives,
    Objects,
    All,
}

/// One node visited by [`walk`], carrying the full path down from the root
/// memory type. Levels below the requested [`Depth`] are `None`.
pub struct WalkEntry<'a> {
    pub mem_type: (&'a str, &'a MemType),
    pub section: Option<(&'a str, &'a OutputSectionNode)>,
    pub archive: Option<(&'a str, &'a ArchiveNode)>,
    pub object_file: Option<(&'a str, &'a ObjectFileNode)>,
    pub symbol: Option<(&'a str, &'a SymbolNode)>,
}

/// Visits every node of `map` down to `depth`, in tree (insertion) order.
pub fn walk(map: &MemoryMap, depth: Depth) -> Vec<WalkEntry<'_>> {
    let mut out = Vec::new();

    for (mt_name, mt) in &map.memory_types {
        if depth == Depth::Types {
            out.push(WalkEntry {
                mem_type: (mt_name, mt),
                section: None,
                archive: None,
                object_file: None,
                symbol: None,
            });
            continue;
        }

        for (sec_name, sec) in &mt.sections {
            if depth == Depth::Sections {
                out.push(WalkEntry {
                    mem_type: (mt_name, mt),
                    section: Some((sec_name, sec)),
                    archive: None,
                    object_file: None,
                    symbol: None,
                });
                continue;
            }

            for (arc_name, arc) in &sec.archives {
                if depth == Depth::Archives {
                    out.push(WalkEntry {
                        mem_type: (mt_name, mt),
                        section: Some((sec_name, sec)),
                        archive: Some((arc_name, arc)),
                        object_file: None,
                        symbol: None,
                    });
                    continue;
                }

                for (obj_name, obj) in &arc.object_files {
                    if depth == Depth::Objects {
                        out.push(WalkEntry {
                            mem_type: (mt_name, mt),
                            section: Some((sec_name, sec)),
                            archive: Some((arc_name, arc)),
                            object_file: Some((obj_name, obj)),
                            symbol: None,
                        });
                        continue;
                    }

                    for (sym_name, sym) in &obj.symbols {
                        out.push(WalkEntry {
                            mem_type: (mt_name, mt),
                            section: Some((sec_name, sec)),
                            archive: Some((arc_name, arc)),
                            object_file: Some((obj_name, obj)),
                            symbol: Some((sym_name, sym)),
                        });
                    }
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble_section;
    use esp_memmap_linkermap::model::{InputSection, OutputSection, Symbol};
    use indexmap::IndexMap;

    fn sample_map() -> MemoryMap {
        let section = OutputSection {
            name: ".iram0.text".to_owned(),
            address: 0x4000_0000,
            size: 0x20,
            input_sections: vec![InputSection {
                name: "isec".to_owned(),
                address: 0x4000_0000,
                size: 0x20,
                archive: "libmain.a".to_owned(),
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
        let mut sections = IndexMap::new();
        sections.insert(".iram0.text".to_owned(), node);
        let mut memory_types = IndexMap::new();
        memory_types.insert(
            "iram".to_owned(),
            MemType {
                size: 0x4000,
                size_diff: 0,
                used: 0x20,
                used_diff: 0,
                sections,
            },
        );
        MemoryMap {
            version: "1.0".to_owned(),
            target: "esp32".to_owned(),
            target_diff: String::new(),
            image_size: 0x20,
            image_size_diff: 0,
            project_path: "a.map".to_owned(),
            project_path_diff: String::new(),
            memory_types,
        }
    }

    #[test]
    fn types_depth_yields_one_entry_per_memory_type() {
        let map = sample_map();
        let entries = walk(&map, Depth::Types);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].section.is_none());
    }

    #[test]
    fn all_depth_yields_one_entry_per_symbol() {
        let map = sample_map();
        let entries = walk(&map, Depth::All);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol.unwrap().0, "app_main()");
        assert_eq!(entries[0].object_file.unwrap().0, "app_main.c.obj");
    }
}
