//! Component E: the three report-only summary views (§4.5 Summaries).
//!
//! Unlike [`crate::walk`] and friends, these don't operate on the tree in
//! place: they flatten it into dictionaries keyed by a composite identifier
//! (an archive path; an archive/object-file pair; an archive/object/symbol
//! triple), each entry carrying the identifier's total size plus a
//! memory-type-to-section breakdown of exactly where those bytes live.

use indexmap::IndexMap;

use crate::error::{BuildError, BuildErrorKind};
use crate::tree::MemoryMap;

/// One row of a summary view: a composite identifier's total footprint,
/// plus where in the memory-type/section grid it came from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SummaryEntry {
    pub size: u64,
    pub size_diff: i64,
    /// `memory_type -> output_section -> (size, size_diff)` for every
    /// section this identifier contributes to.
    pub sections: IndexMap<String, IndexMap<String, (u64, i64)>>,
}

impl SummaryEntry {
    fn add(&mut self, mem_type: &str, section: &str, size: u64, size_diff: i64) {
        self.size += size;
        self.size_diff += size_diff;
        let by_section = self.sections.entry(mem_type.to_owned()).or_default();
        let entry = by_section.entry(section.to_owned()).or_insert((0, 0));
        entry.0 += size;
        entry.1 += size_diff;
    }
}

/// One entry per archive (keyed by its full path, `(exe)` included),
/// summing its footprint across every memory type and section it appears
/// in.
pub fn archives_summary(map: &MemoryMap) -> IndexMap<String, SummaryEntry> {
    let mut out: IndexMap<String, SummaryEntry> = IndexMap::new();
    for (mt_name, mt) in &map.memory_types {
        for (sec_name, section) in &mt.sections {
            for (archive_name, archive) in &section.archives {
                out.entry(archive_name.clone()).or_default().add(
                    mt_name,
                    sec_name,
                    archive.size,
                    archive.size_diff,
                );
            }
        }
    }
    out
}

/// One entry per `(archive, object_file)` pair.
pub fn object_files_summary(map: &MemoryMap) -> IndexMap<(String, String), SummaryEntry> {
    let mut out: IndexMap<(String, String), SummaryEntry> = IndexMap::new();
    for (mt_name, mt) in &map.memory_types {
        for (sec_name, section) in &mt.sections {
            for (archive_name, archive) in &section.archives {
                for (object_name, object_file) in &archive.object_files {
                    out.entry((archive_name.clone(), object_name.clone())).or_default().add(
                        mt_name,
                        sec_name,
                        object_file.size,
                        object_file.size_diff,
                    );
                }
            }
        }
    }
    out
}

/// One entry per `(object_file, symbol)` pair within `archive`.
///
/// Errors with [`BuildErrorKind::ArchiveNotFound`] if `archive` doesn't
/// appear anywhere in the tree — unlike the other two summaries, this one
/// is scoped to a single archive rather than enumerating all of them, so
/// there is no empty-but-valid result to fall back to.
pub fn symbols_summary(
    map: &MemoryMap,
    archive: &str,
) -> Result<IndexMap<(String, String), SummaryEntry>, BuildError> {
    let mut out: IndexMap<(String, String), SummaryEntry> = IndexMap::new();
    let mut found = false;

    for (mt_name, mt) in &map.memory_types {
        for (sec_name, section) in &mt.sections {
            let Some(archive_node) = section.archives.get(archive) else {
                continue;
            };
            found = true;
            for (object_name, object_file) in &archive_node.object_files {
                for (symbol_name, symbol) in &object_file.symbols {
                    out.entry((object_name.clone(), symbol_name.clone())).or_default().add(
                        mt_name,
                        sec_name,
                        symbol.size,
                        symbol.size_diff,
                    );
                }
            }
        }
    }

    if !found {
        return Err(BuildErrorKind::ArchiveNotFound(archive.to_owned()).into());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ArchiveNode, MemType, ObjectFileNode, OutputSectionNode, SymbolNode};

    fn sample_map() -> MemoryMap {
        let mut symbols = IndexMap::new();
        symbols.insert(
            "app_main()".to_owned(),
            SymbolNode {
                abbrev_name: "app_main()".to_owned(),
                size: 0x20,
                size_diff: 0,
            },
        );
        let mut object_files = IndexMap::new();
        object_files.insert(
            "app_main.c.obj".to_owned(),
            ObjectFileNode {
                abbrev_name: "app_main.c.obj".to_owned(),
                size: 0x20,
                size_diff: 0,
                symbols,
            },
        );
        let mut archives = IndexMap::new();
        archives.insert(
            "libmain.a".to_owned(),
            ArchiveNode {
                abbrev_name: "libmain.a".to_owned(),
                size: 0x20,
                size_diff: 0,
                object_files,
            },
        );
        let mut sections = IndexMap::new();
        sections.insert(
            ".iram0.text".to_owned(),
            OutputSectionNode {
                abbrev_name: ".text".to_owned(),
                size: 0x20,
                size_diff: 0,
                archives,
            },
        );
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
    fn archives_summary_totals_and_breaks_down_by_section() {
        let map = sample_map();
        let summary = archives_summary(&map);
        let entry = &summary["libmain.a"];
        assert_eq!(entry.size, 0x20);
        assert_eq!(entry.sections["iram"][".iram0.text"], (0x20, 0));
    }

    #[test]
    fn object_files_summary_keys_on_archive_and_object() {
        let map = sample_map();
        let summary = object_files_summary(&map);
        let key = ("libmain.a".to_owned(), "app_main.c.obj".to_owned());
        assert_eq!(summary[&key].size, 0x20);
    }

    #[test]
    fn symbols_summary_errors_on_missing_archive() {
        let map = sample_map();
        let result = symbols_summary(&map, "libother.a");
        assert!(matches!(
            result.unwrap_err().kind(),
            BuildErrorKind::ArchiveNotFound(name) if name == "libother.a"
        ));
    }

    #[test]
    fn symbols_summary_enumerates_symbols_for_the_archive() {
        let map = sample_map();
        let summary = symbols_summary(&map, "libmain.a").unwrap();
        let key = ("app_main.c.obj".to_owned(), "app_main()".to_owned());
        assert_eq!(summary[&key].size, 0x20);
    }
}
