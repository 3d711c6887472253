//! Component D: the diff engine (§4.4).
//!
//! Diffing two memory maps produces a tree shaped like the union of both:
//! every entry present in either map appears in the result, with `size`
//! (and `used`, at the memory-type level) taken from the current map where
//! present, and `size_diff`/`used_diff` holding `current - reference` (zero
//! where an entry is reference-only, since its current size is zero).

use crate::tree::{MemType, MemoryMap, SizedNode};

/// Produces the diff of `current` against `reference`: a tree containing
/// every entry from both, with diffs computed at every level.
pub fn diff_memory_maps(current: &MemoryMap, reference: &MemoryMap) -> MemoryMap {
    let mut out = current.clone();
    out.target_diff = reference.target.clone();
    out.project_path_diff = reference.project_path.clone();
    out.image_size_diff = current.image_size as i64 - reference.image_size as i64;

    union_sections_into(&mut out, reference);
    compute_diffs(&mut out, current, reference);

    out
}

fn union_sections_into(out: &mut MemoryMap, reference: &MemoryMap) {
    for (type_name, ref_type) in &reference.memory_types {
        let diff_type = out
            .memory_types
            .entry(type_name.clone())
            .or_insert_with(|| ref_type.clone());

        for (sec_name, ref_sec) in &ref_type.sections {
            let diff_sec = diff_type
                .sections
                .entry(sec_name.clone())
                .or_insert_with(|| ref_sec.clone());

            for (arc_name, ref_arc) in &ref_sec.archives {
                let diff_arc = diff_sec
                    .archives
                    .entry(arc_name.clone())
                    .or_insert_with(|| ref_arc.clone());

                for (obj_name, ref_obj) in &ref_arc.object_files {
                    let diff_obj = diff_arc
                        .object_files
                        .entry(obj_name.clone())
                        .or_insert_with(|| ref_obj.clone());

                    for (sym_name, ref_sym) in &ref_obj.symbols {
                        diff_obj
                            .symbols
                            .entry(sym_name.clone())
                            .or_insert_with(|| ref_sym.clone());
                    }
                }
            }
        }
    }
}

fn compute_diffs(out: &mut MemoryMap, current: &MemoryMap, reference: &MemoryMap) {
    for (type_name, diff_type) in out.memory_types.iter_mut() {
        let cur_type = current.memory_types.get(type_name);
        let ref_type = reference.memory_types.get(type_name);
        apply_mem_type_diff(diff_type, cur_type, ref_type);

        for (sec_name, diff_sec) in diff_type.sections.iter_mut() {
            let cur_sec = cur_type.and_then(|t| t.sections.get(sec_name));
            let ref_sec = ref_type.and_then(|t| t.sections.get(sec_name));
            apply_node_diff(diff_sec, cur_sec, ref_sec);

            for (arc_name, diff_arc) in diff_sec.archives.iter_mut() {
                let cur_arc = cur_sec.and_then(|s| s.archives.get(arc_name));
                let ref_arc = ref_sec.and_then(|s| s.archives.get(arc_name));
                apply_node_diff(diff_arc, cur_arc, ref_arc);

                for (obj_name, diff_obj) in diff_arc.object_files.iter_mut() {
                    let cur_obj = cur_arc.and_then(|a| a.object_files.get(obj_name));
                    let ref_obj = ref_arc.and_then(|a| a.object_files.get(obj_name));
                    apply_node_diff(diff_obj, cur_obj, ref_obj);

                    for (sym_name, diff_sym) in diff_obj.symbols.iter_mut() {
                        let cur_sym = cur_obj.and_then(|o| o.symbols.get(sym_name));
                        let ref_sym = ref_obj.and_then(|o| o.symbols.get(sym_name));
                        apply_node_diff(diff_sym, cur_sym, ref_sym);
                    }
                }
            }
        }
    }
}

fn apply_mem_type_diff(diff: &mut MemType, cur: Option<&MemType>, reference: Option<&MemType>) {
    match (cur, reference) {
        (Some(c), Some(r)) => {
            diff.size_diff = c.size as i64 - r.size as i64;
            diff.used_diff = c.used as i64 - r.used as i64;
        }
        (Some(c), None) => {
            diff.size_diff = c.size as i64;
            diff.used_diff = c.used as i64;
        }
        (None, Some(r)) => {
            diff.size = 0;
            diff.used = 0;
            diff.size_diff = -(r.size as i64);
            diff.used_diff = -(r.used as i64);
        }
        (None, None) => unreachable!("union guarantees at least one side is present"),
    }
}

fn apply_node_diff<T: SizedNode>(diff: &mut T, cur: Option<&T>, reference: Option<&T>) {
    match (cur, reference) {
        (Some(c), Some(r)) => diff.set_size_diff(c.size() as i64 - r.size() as i64),
        (Some(c), None) => diff.set_size_diff(c.size() as i64),
        (None, Some(r)) => {
            diff.set_size(0);
            diff.set_size_diff(-(r.size() as i64));
        }
        (None, None) => unreachable!("union guarantees at least one side is present"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ArchiveNode, ObjectFileNode, OutputSectionNode, SymbolNode};
    use indexmap::IndexMap;

    fn leaf_map(type_size: u64, type_used: u64, section_size: u64, symbol_size: u64) -> MemoryMap {
        let mut symbols = IndexMap::new();
        symbols.insert(
            "app_main()".to_owned(),
            SymbolNode {
                abbrev_name: "app_main()".to_owned(),
                size: symbol_size,
                size_diff: 0,
            },
        );
        let mut object_files = IndexMap::new();
        object_files.insert(
            "app_main.c.obj".to_owned(),
            ObjectFileNode {
                abbrev_name: "app_main.c.obj".to_owned(),
                size: symbol_size,
                size_diff: 0,
                symbols,
            },
        );
        let mut archives = IndexMap::new();
        archives.insert(
            "libmain.a".to_owned(),
            ArchiveNode {
                abbrev_name: "libmain.a".to_owned(),
                size: symbol_size,
                size_diff: 0,
                object_files,
            },
        );
        let mut sections = IndexMap::new();
        sections.insert(
            ".iram0.text".to_owned(),
            OutputSectionNode {
                abbrev_name: ".text".to_owned(),
                size: section_size,
                size_diff: 0,
                archives,
            },
        );
        let mut memory_types = IndexMap::new();
        memory_types.insert(
            "iram".to_owned(),
            MemType {
                size: type_size,
                size_diff: 0,
                used: type_used,
                used_diff: 0,
                sections,
            },
        );
        MemoryMap {
            version: "1.0".to_owned(),
            target: "esp32".to_owned(),
            target_diff: String::new(),
            image_size: section_size,
            image_size_diff: 0,
            project_path: "a.map".to_owned(),
            project_path_diff: String::new(),
            memory_types,
        }
    }

    #[test]
    fn diffs_a_symbol_present_in_both() {
        let current = leaf_map(0x4000, 0x200, 0x100, 0x80);
        let reference = leaf_map(0x4000, 0x180, 0x80, 0x40);
        let diff = diff_memory_maps(&current, &reference);

        assert_eq!(diff.image_size_diff, 0x20);
        let mem_type = &diff.memory_types["iram"];
        assert_eq!(mem_type.used_diff, 0x80);
        let section = &mem_type.sections[".iram0.text"];
        assert_eq!(section.size_diff, 0x80);
        let symbol = &section.archives["libmain.a"].object_files["app_main.c.obj"].symbols["app_main()"];
        assert_eq!(symbol.size_diff, 0x40);
    }

    #[test]
    fn reference_only_entry_gets_negative_diff_and_zero_size() {
        let current = MemoryMap::default();
        let reference = leaf_map(0x4000, 0x180, 0x80, 0x40);
        let diff = diff_memory_maps(&current, &reference);

        let mem_type = &diff.memory_types["iram"];
        assert_eq!(mem_type.size, 0);
        assert_eq!(mem_type.size_diff, -0x4000);
        assert_eq!(mem_type.used_diff, -0x180);
        let symbol = &mem_type.sections[".iram0.text"].archives["libmain.a"].object_files["app_main.c.obj"]
            .symbols["app_main()"];
        assert_eq!(symbol.size, 0);
        assert_eq!(symbol.size_diff, -0x40);
    }
}
