//! Stage 4: attributing ELF symbols to the input sections that contain them
//! (§4.3 Stage 4).

use esp_memmap_debuginfo::elf::{ElfSymbol, SymbolType};
use esp_memmap_linkermap::model::{InputSection, OutputSection, Symbol};

use crate::error::{BuildError, BuildErrorKind};

/// Attributes ELF `FUNC`/`OBJECT` symbols to the input section that
/// contains each one, walking both lists in address order with a single
/// cursor rather than scanning every symbol against every input section.
///
/// `elf_symbols` distinguishes three cases:
///
/// - `None` — no ELF was supplied at all. Every input section gets a single
///   synthetic symbol named after itself, the best attribution obtainable
///   from a map file alone.
/// - `Some(&[])` — an ELF was supplied but symbol loading was disabled
///   (`BuildOptions::load_symbols = false`). Every input section's symbol
///   list is left empty; no synthetic symbol is injected, matching the
///   reference implementation's `load_symbols=False` path.
/// - `Some(symbols)` — normal attribution against the given symbol table.
///
/// A `FUNC` symbol's name gets a trailing `()` so callers can distinguish
/// functions from data objects of the same name in flattened output.
pub fn attach_symbols(
    elf_symbols: Option<&[ElfSymbol]>,
    sections: &mut [OutputSection],
) -> Result<(), BuildError> {
    let Some(elf_symbols) = elf_symbols else {
        for section in sections.iter_mut() {
            for isec in section.input_sections.iter_mut() {
                isec.symbols = vec![Symbol {
                    name: isec.name.clone(),
                    address: isec.address,
                    size: isec.size,
                }];
            }
        }
        return Ok(());
    };

    let mut symbols: Vec<&ElfSymbol> = elf_symbols
        .iter()
        .filter(|s| matches!(s.ty, SymbolType::Func | SymbolType::Object) && s.size != 0)
        .collect();
    symbols.sort_by_key(|s| s.value);

    let mut cursor: Vec<(usize, usize)> = Vec::new();
    for (si, section) in sections.iter_mut().enumerate() {
        for (ii, isec) in section.input_sections.iter_mut().enumerate() {
            isec.symbols.clear();
            cursor.push((si, ii));
        }
    }
    cursor.sort_by_key(|&(si, ii)| sections[si].input_sections[ii].address);

    if cursor.is_empty() {
        return Ok(());
    }

    let mut pos = 0usize;
    for symbol in symbols {
        loop {
            let (si, ii) = cursor[pos];
            let isec_end = isec_end(&sections[si].input_sections[ii]);
            if symbol.value < isec_end {
                break;
            }
            close_out_unassigned(&mut sections[si].input_sections[ii]);
            pos += 1;
            if pos >= cursor.len() {
                return Err(BuildErrorKind::SymbolOutsideSections(symbol.name.clone()).into());
            }
        }

        let (si, ii) = cursor[pos];
        let isec = &mut sections[si].input_sections[ii];
        if symbol.value < isec.address {
            // Symbol lies before this input section's start; it belongs to
            // a ROM-mapped range the map file doesn't describe. Skip it.
            continue;
        }
        if symbol.value + symbol.size > isec_end(isec) {
            return Err(BuildErrorKind::SymbolDoesNotFit {
                symbol: symbol.name.clone(),
                input_section: isec.name.clone(),
            }
            .into());
        }

        let mut name = symbol.name.clone();
        if matches!(symbol.ty, SymbolType::Func) {
            name.push_str("()");
        }
        isec.symbols.push(Symbol {
            name,
            address: symbol.value,
            size: symbol.size,
        });
    }

    Ok(())
}

fn isec_end(isec: &InputSection) -> u64 {
    isec.address + isec.size
}

fn close_out_unassigned(isec: &mut InputSection) {
    if isec.symbols.is_empty() {
        isec.symbols.push(Symbol {
            name: isec.name.clone(),
            address: isec.address,
            size: isec.size,
        });
    }
}
