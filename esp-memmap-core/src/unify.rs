//! Component E: merging sibling entries that share an `abbrev_name`
//! (§4.5 Unify).
//!
//! `.dram0.bss` and `.dram1.bss` both abbreviate to `.bss`; a caller that
//! wants one combined `.bss` row per memory type, rather than one per
//! underlying linker section, runs this pass after the tree is built (and,
//! typically, before [`crate::sort::sort_memory_map`]). The same collapsing
//! applies recursively at the archive, object-file and symbol levels, since
//! `abbrev_name` collisions can occur there too (two archives with the same
//! basename built from different component directories, for instance).

use indexmap::IndexMap;

use crate::tree::{ArchiveNode, MemoryMap, ObjectFileNode, OutputSectionNode, SymbolNode};

/// Unifies every level of `map` in place, merging siblings that share an
/// `abbrev_name` and summing their `size`/`size_diff` (and children,
/// recursively).
///
/// Idempotent: unifying an already-unified map leaves it unchanged, since
/// every remaining sibling then has a distinct `abbrev_name`.
pub fn unify_memory_map(map: &mut MemoryMap) {
    for mem_type in map.memory_types.values_mut() {
        mem_type.sections = unify_sections(std::mem::take(&mut mem_type.sections));
    }
}

fn unify_sections(sections: IndexMap<String, OutputSectionNode>) -> IndexMap<String, OutputSectionNode> {
    let mut merged: IndexMap<String, OutputSectionNode> = IndexMap::new();
    for (_, mut node) in sections {
        node.archives = unify_archives(std::mem::take(&mut node.archives));
        merge_into(&mut merged, node.abbrev_name.clone(), node, |dst, src| {
            dst.archives = merge_child_maps(std::mem::take(&mut dst.archives), src.archives);
        });
    }
    merged
}

fn unify_archives(archives: IndexMap<String, ArchiveNode>) -> IndexMap<String, ArchiveNode> {
    let mut merged: IndexMap<String, ArchiveNode> = IndexMap::new();
    for (_, mut node) in archives {
        node.object_files = unify_object_files(std::mem::take(&mut node.object_files));
        merge_into(&mut merged, node.abbrev_name.clone(), node, |dst, src| {
            dst.object_files = merge_child_maps(std::mem::take(&mut dst.object_files), src.object_files);
        });
    }
    merged
}

fn unify_object_files(object_files: IndexMap<String, ObjectFileNode>) -> IndexMap<String, ObjectFileNode> {
    let mut merged: IndexMap<String, ObjectFileNode> = IndexMap::new();
    for (_, mut node) in object_files {
        node.symbols = unify_symbols(std::mem::take(&mut node.symbols));
        merge_into(&mut merged, node.abbrev_name.clone(), node, |dst, src| {
            dst.symbols = merge_child_maps(std::mem::take(&mut dst.symbols), src.symbols);
        });
    }
    merged
}

fn unify_symbols(symbols: IndexMap<String, SymbolNode>) -> IndexMap<String, SymbolNode> {
    let mut merged: IndexMap<String, SymbolNode> = IndexMap::new();
    for (_, node) in symbols {
        merge_into(&mut merged, node.abbrev_name.clone(), node, |_, _| {});
    }
    merged
}

/// Inserts `node` under `key`, or — if `key` is already present — adds its
/// `size`/`size_diff` to the existing entry and lets `merge_children`
/// combine whatever nested maps the two levels carry.
fn merge_into<T>(
    merged: &mut IndexMap<String, T>,
    key: String,
    node: T,
    merge_children: impl FnOnce(&mut T, T),
) where
    T: SizeFields,
{
    match merged.get_mut(&key) {
        Some(existing) => {
            existing.add_size(node.size());
            existing.add_size_diff(node.size_diff());
            let node = node;
            merge_children(existing, node);
        }
        None => {
            merged.insert(key, node);
        }
    }
}

/// Unions two already-unified child maps, keyed by `abbrev_name` rather
/// than the original key, so a second round of merging across the two
/// source subtrees still collapses matching siblings.
fn merge_child_maps<T>(mut dst: IndexMap<String, T>, src: IndexMap<String, T>) -> IndexMap<String, T>
where
    T: SizeFields + HasChildren<T>,
{
    for (_, node) in src {
        merge_into(&mut dst, node.abbrev_name().to_owned(), node, |existing, incoming| {
            existing.merge_children(incoming);
        });
    }
    dst
}

trait SizeFields {
    fn size(&self) -> u64;
    fn size_diff(&self) -> i64;
    fn add_size(&mut self, delta: u64);
    fn add_size_diff(&mut self, delta: i64);
}

trait HasChildren<T> {
    fn abbrev_name(&self) -> &str;
    fn merge_children(&mut self, other: T);
}

macro_rules! impl_size_fields {
    ($ty:ty) => {
        impl SizeFields for $ty {
            fn size(&self) -> u64 {
                self.size
            }
            fn size_diff(&self) -> i64 {
                self.size_diff
            }
            fn add_size(&mut self, delta: u64) {
                self.size += delta;
            }
            fn add_size_diff(&mut self, delta: i64) {
                self.size_diff += delta;
            }
        }
    };
}

impl_size_fields!(OutputSectionNode);
impl_size_fields!(ArchiveNode);
impl_size_fields!(ObjectFileNode);
impl_size_fields!(SymbolNode);

impl HasChildren<OutputSectionNode> for OutputSectionNode {
    fn abbrev_name(&self) -> &str {
        &self.abbrev_name
    }
    fn merge_children(&mut self, other: Self) {
        self.archives = merge_child_maps(std::mem::take(&mut self.archives), other.archives);
    }
}

impl HasChildren<ArchiveNode> for ArchiveNode {
    fn abbrev_name(&self) -> &str {
        &self.abbrev_name
    }
    fn merge_children(&mut self, other: Self) {
        self.object_files = merge_child_maps(std::mem::take(&mut self.object_files), other.object_files);
    }
}

impl HasChildren<ObjectFileNode> for ObjectFileNode {
    fn abbrev_name(&self) -> &str {
        &self.abbrev_name
    }
    fn merge_children(&mut self, other: Self) {
        self.symbols = merge_child_maps(std::mem::take(&mut self.symbols), other.symbols);
    }
}

impl HasChildren<SymbolNode> for SymbolNode {
    fn abbrev_name(&self) -> &str {
        &self.abbrev_name
    }
    fn merge_children(&mut self, _other: Self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemType;
    use indexmap::IndexMap;

    fn section(abbrev: &str, size: u64) -> OutputSectionNode {
        OutputSectionNode {
            abbrev_name: abbrev.to_owned(),
            size,
            size_diff: 0,
            archives: IndexMap::new(),
        }
    }

    fn map_with_sections(sections: IndexMap<String, OutputSectionNode>) -> MemoryMap {
        let mut memory_types = IndexMap::new();
        let used = sections.values().map(|s| s.size).sum();
        memory_types.insert(
            "dram".to_owned(),
            MemType {
                size: 0x1_0000,
                size_diff: 0,
                used,
                used_diff: 0,
                sections,
            },
        );
        MemoryMap {
            version: "1.0".to_owned(),
            target: "esp32".to_owned(),
            target_diff: String::new(),
            image_size: used,
            image_size_diff: 0,
            project_path: String::new(),
            project_path_diff: String::new(),
            memory_types,
        }
    }

    #[test]
    fn merges_sections_sharing_an_abbrev_name() {
        let mut sections = IndexMap::new();
        sections.insert(".dram0.bss".to_owned(), section(".bss", 0x100));
        sections.insert(".dram1.bss".to_owned(), section(".bss", 0x40));
        let mut map = map_with_sections(sections);

        unify_memory_map(&mut map);

        let sections = &map.memory_types["dram"].sections;
        assert_eq!(sections.len(), 1);
        let merged = sections.values().next().unwrap();
        assert_eq!(merged.size, 0x140);
    }

    #[test]
    fn unifying_twice_is_idempotent() {
        let mut sections = IndexMap::new();
        sections.insert(".dram0.bss".to_owned(), section(".bss", 0x100));
        sections.insert(".dram1.bss".to_owned(), section(".bss", 0x40));
        let mut map = map_with_sections(sections);

        unify_memory_map(&mut map);
        let once = map.memory_types["dram"].sections.clone();
        unify_memory_map(&mut map);
        let twice = map.memory_types["dram"].sections.clone();

        assert_eq!(once.len(), twice.len());
        for (key, node) in &once {
            assert_eq!(node.size, twice[key].size);
        }
    }

    #[test]
    fn distinct_abbrev_names_are_left_separate() {
        let mut sections = IndexMap::new();
        sections.insert(".iram0.text".to_owned(), section(".text", 0x100));
        sections.insert(".dram0.bss".to_owned(), section(".bss", 0x40));
        let mut map = map_with_sections(sections);

        unify_memory_map(&mut map);

        assert_eq!(map.memory_types["dram"].sections.len(), 2);
    }
}
