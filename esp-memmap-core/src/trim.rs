//! Component E: trimming the tree to the detail level a report actually
//! wants, and dropping unchanged/unused entries (§4.5).

use crate::tree::MemoryMap;

/// How far down the tree detail survives trimming.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrimDepth {
    /// Keep archive detail only for the named archive (by `abbrev_name`);
    /// every other archive in a section is dropped entirely.
    ArchiveDetails(String),
    /// Keep archives, drop their object files.
    Archives,
    /// Keep object files, drop their symbols.
    Objects,
    /// Keep everything.
    All,
}

/// Drops tree levels below `depth`, and — in diff mode, unless
/// `show_unchanged` is set — any entry whose `size_diff` (`used_diff` for
/// memory types) is zero.
pub fn trim(map: &mut MemoryMap, depth: &TrimDepth, diff_mode: bool, show_unchanged: bool) {
    let changed = |d: i64| !diff_mode || show_unchanged || d != 0;

    map.memory_types.retain(|_, mt| changed(mt.used_diff));

    for mem_type in map.memory_types.values_mut() {
        mem_type.sections.retain(|_, section| changed(section.size_diff));

        for section in mem_type.sections.values_mut() {
            match depth {
                TrimDepth::ArchiveDetails(name) => {
                    section
                        .archives
                        .retain(|_, archive| &archive.abbrev_name == name && changed(archive.size_diff));
                }
                _ => section.archives.retain(|_, archive| changed(archive.size_diff)),
            }

            for archive in section.archives.values_mut() {
                if matches!(depth, TrimDepth::Archives) {
                    archive.object_files.clear();
                    continue;
                }

                archive
                    .object_files
                    .retain(|_, object_file| changed(object_file.size_diff));

                for object_file in archive.object_files.values_mut() {
                    if matches!(depth, TrimDepth::Objects) {
                        object_file.symbols.clear();
                        continue;
                    }

                    object_file.symbols.retain(|_, symbol| changed(symbol.size_diff));
                }
            }
        }
    }
}

/// Drops memory types with zero usage and, within the rest, sections with
/// no remaining archives — cleanup for a tree assembled from a partial
/// symbol set (e.g. after [`crate::summary`] rather than from a full build).
pub fn remove_unused(map: &mut MemoryMap) {
    map.memory_types.retain(|_, mt| mt.used != 0);
    for mem_type in map.memory_types.values_mut() {
        mem_type.sections.retain(|_, section| !section.archives.is_empty());
        mem_type.used = mem_type.sections.values().map(|s| s.size).sum();
    }
}

/// Zeroes the reported capacity of every memory type whose name contains
/// `flash` (case-insensitively) — flash capacity is usually irrelevant to
/// the headroom question a report is trying to answer.
pub fn ignore_flash_size(map: &mut MemoryMap) {
    for (name, mem_type) in map.memory_types.iter_mut() {
        if name.to_lowercase().contains("flash") {
            mem_type.size = 0;
        }
    }
}
