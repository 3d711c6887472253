//! Component E: the archive dependency graph derived from the linker's
//! cross-reference table (§4.5 Archive dependencies).
//!
//! This is consumed downstream by archive cross-reference reporting (out
//! of scope here per §1); what this module owns is building the graph
//! itself from the map file's [`CrossReferenceEntry`] list plus the
//! archive set the builder actually produced a tree for.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use esp_memmap_debuginfo::elf::{ElfSymbol, SymbolType};
use esp_memmap_linkermap::model::CrossReferenceEntry;

/// `archive -> archive -> symbols responsible for the edge`.
pub type DependencyGraph = IndexMap<String, IndexMap<String, IndexSet<String>>>;

/// Both directions of the archive dependency graph.
#[derive(Clone, Debug, Default)]
pub struct ArchiveDependencies {
    /// `ref_archive -> def_archive -> symbols`: "what I depend on".
    pub forward: DependencyGraph,
    /// `def_archive -> ref_archive -> symbols`: "who depends on me".
    pub reverse: DependencyGraph,
}

/// Builds the archive dependency graph from `cross_references`, restricted
/// to `archives` (the archive set the memory-map tree actually contains)
/// and to symbols that survive the §4.2 `add_cus_to_symbols` filter
/// (`FUNC`/`OBJECT`, nonzero size, not `SHN_ABS`) against `elf_symbols`.
///
/// A reference from an archive to itself is never recorded as an edge — a
/// library referencing its own symbols isn't a dependency worth reporting.
/// A symbol whose only references are to its own defining archive therefore
/// contributes no edge at all.
pub fn archive_dependencies(
    cross_references: &[CrossReferenceEntry],
    archives: &HashSet<String>,
    elf_symbols: &[ElfSymbol],
) -> ArchiveDependencies {
    let known_symbols: HashSet<&str> = elf_symbols
        .iter()
        .filter(|s| matches!(s.ty, SymbolType::Func | SymbolType::Object) && s.size != 0 && !s.is_absolute())
        .map(|s| s.name.as_str())
        .collect();

    let mut forward: DependencyGraph = IndexMap::new();
    let mut reverse: DependencyGraph = IndexMap::new();

    for entry in cross_references {
        if !known_symbols.contains(entry.symbol.as_str()) {
            continue;
        }
        let Some((def_archive, _)) = entry.sites.first() else {
            continue;
        };
        if !archives.contains(def_archive) {
            continue;
        }

        for (ref_archive, _) in entry.sites.iter().skip(1) {
            if !archives.contains(ref_archive) || ref_archive == def_archive {
                continue;
            }

            forward
                .entry(ref_archive.clone())
                .or_default()
                .entry(def_archive.clone())
                .or_default()
                .insert(entry.symbol.clone());
            reverse
                .entry(def_archive.clone())
                .or_default()
                .entry(ref_archive.clone())
                .or_default()
                .insert(entry.symbol.clone());
        }
    }

    ArchiveDependencies { forward, reverse }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(name: &str, ty: SymbolType, size: u64) -> ElfSymbol {
        ElfSymbol {
            name: name.to_owned(),
            value: 0x1000,
            size,
            ty,
            bind: 0,
            visibility: 0,
            section_index: 1,
            cu_path: None,
        }
    }

    fn xref(symbol: &str, sites: &[(&str, &str)]) -> CrossReferenceEntry {
        CrossReferenceEntry {
            symbol: symbol.to_owned(),
            sites: sites.iter().map(|(a, o)| (a.to_string(), o.to_string())).collect(),
        }
    }

    #[test]
    fn builds_forward_and_reverse_edges() {
        let xrefs = vec![xref(
            "esp_log_write",
            &[("liblog.a", "log.o"), ("libmain.a", "app_main.o")],
        )];
        let archives: HashSet<String> = ["liblog.a", "libmain.a"].into_iter().map(String::from).collect();
        let elf_symbols = vec![symbol("esp_log_write", SymbolType::Func, 0x20)];

        let deps = archive_dependencies(&xrefs, &archives, &elf_symbols);

        assert!(deps.forward["libmain.a"]["liblog.a"].contains("esp_log_write"));
        assert!(deps.reverse["liblog.a"]["libmain.a"].contains("esp_log_write"));
    }

    #[test]
    fn self_only_archive_is_elided() {
        let xrefs = vec![xref("internal_helper", &[("libmain.a", "a.o"), ("libmain.a", "b.o")])];
        let archives: HashSet<String> = ["libmain.a".to_owned()].into_iter().collect();
        let elf_symbols = vec![symbol("internal_helper", SymbolType::Func, 0x10)];

        let deps = archive_dependencies(&xrefs, &archives, &elf_symbols);

        assert!(deps.forward.is_empty());
        assert!(deps.reverse.is_empty());
    }

    #[test]
    fn self_edge_is_dropped_even_when_other_edges_survive() {
        // "libmain.a" defines S1, referenced only by itself, and S2,
        // referenced by "liblog.a". The self-reference to S1 must not
        // survive just because "libmain.a" has an unrelated real edge.
        let xrefs = vec![
            xref("s1", &[("libmain.a", "a.o"), ("libmain.a", "b.o")]),
            xref("s2", &[("libmain.a", "c.o"), ("liblog.a", "log.o")]),
        ];
        let archives: HashSet<String> = ["libmain.a", "liblog.a"].into_iter().map(String::from).collect();
        let elf_symbols = vec![
            symbol("s1", SymbolType::Func, 0x10),
            symbol("s2", SymbolType::Func, 0x10),
        ];

        let deps = archive_dependencies(&xrefs, &archives, &elf_symbols);

        assert!(!deps.reverse["libmain.a"].contains_key("libmain.a"));
        assert!(deps.reverse["libmain.a"]["liblog.a"].contains("s2"));
        assert!(!deps.forward.contains_key("libmain.a"));
        assert!(deps.forward["liblog.a"]["libmain.a"].contains("s2"));
    }

    #[test]
    fn symbol_absent_from_elf_is_dropped() {
        let xrefs = vec![xref("unknown_symbol", &[("liblog.a", "log.o"), ("libmain.a", "a.o")])];
        let archives: HashSet<String> = ["liblog.a", "libmain.a"].into_iter().map(String::from).collect();

        let deps = archive_dependencies(&xrefs, &archives, &[]);

        assert!(deps.forward.is_empty());
    }

    #[test]
    fn archive_outside_the_known_set_is_ignored() {
        let xrefs = vec![xref(
            "esp_log_write",
            &[("liblog.a", "log.o"), ("libunknown.a", "x.o")],
        )];
        let archives: HashSet<String> = ["liblog.a".to_owned()].into_iter().collect();
        let elf_symbols = vec![symbol("esp_log_write", SymbolType::Func, 0x20)];

        let deps = archive_dependencies(&xrefs, &archives, &elf_symbols);

        assert!(deps.forward.is_empty());
        assert!(deps.reverse.is_empty());
    }
}
