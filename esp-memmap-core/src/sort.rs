//! Component E: sorting every level of the tree by size (§4.5).

use crate::tree::{MemoryMap, SizedNode};

/// Which field to sort by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Size,
    SizeDiff,
}

/// Sorts every level of `map` (memory types, then sections, archives,
/// object files and symbols within each) by `key`, descending unless
/// `reverse` is set.
///
/// Equal-key entries keep their relative (insertion) order — the sort is
/// used to rank, not to impose an otherwise-arbitrary tie-break order.
pub fn sort_memory_map(map: &mut MemoryMap, key: SortKey, reverse: bool) {
    sort_by(&mut map.memory_types, reverse, |mt| match key {
        SortKey::Size => mt.used as i64,
        SortKey::SizeDiff => mt.used_diff,
    });

    for mem_type in map.memory_types.values_mut() {
        sort_by(&mut mem_type.sections, reverse, |node| node_key(node, key));
        for section in mem_type.sections.values_mut() {
            sort_by(&mut section.archives, reverse, |node| node_key(node, key));
            for archive in section.archives.values_mut() {
                sort_by(&mut archive.object_files, reverse, |node| node_key(node, key));
                for object_file in archive.object_files.values_mut() {
                    sort_by(&mut object_file.symbols, reverse, |node| node_key(node, key));
                }
            }
        }
    }
}

fn node_key<T: SizedNode>(node: &T, key: SortKey) -> i64 {
    match key {
        SortKey::Size => node.size() as i64,
        SortKey::SizeDiff => node.size_diff(),
    }
}

fn sort_by<K, V>(map: &mut indexmap::IndexMap<K, V>, reverse: bool, key_fn: impl Fn(&V) -> i64)
where
    K: std::hash::Hash + Eq,
{
    map.sort_by(|_, a, _, b| {
        let (ka, kb) = (key_fn(a), key_fn(b));
        if reverse {
            ka.cmp(&kb)
        } else {
            kb.cmp(&ka)
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{MemType, OutputSectionNode};
    use indexmap::IndexMap;

    fn section(size: u64) -> OutputSectionNode {
        OutputSectionNode {
            abbrev_name: ".text".to_owned(),
            size,
            size_diff: 0,
            archives: IndexMap::new(),
        }
    }

    #[test]
    fn descending_by_size_is_the_default() {
        let mut sections = IndexMap::new();
        sections.insert(".small".to_owned(), section(0x10));
        sections.insert(".big".to_owned(), section(0x100));
        let mut memory_types = IndexMap::new();
        memory_types.insert(
            "iram".to_owned(),
            MemType {
                size: 0x4000,
                size_diff: 0,
                used: 0x110,
                used_diff: 0,
                sections,
            },
        );
        let mut map = MemoryMap {
            version: "1.0".to_owned(),
            target: "esp32".to_owned(),
            target_diff: String::new(),
            image_size: 0x110,
            image_size_diff: 0,
            project_path: String::new(),
            project_path_diff: String::new(),
            memory_types,
        };

        sort_memory_map(&mut map, SortKey::Size, false);

        let names: Vec<&str> = map.memory_types["iram"]
            .sections
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec![".big", ".small"]);
    }
}
