//! The output/input section state machine (§4.1).

use esp_memmap_common::{parse_c_uint, Diagnostics};

use crate::cursor::LineCursor;
use crate::model::{InputSection, OutputSection};
use crate::text::{is_column_zero, splitn_ws};

const XREF_HEADER: &str = "Cross Reference Table";
const EXPLICIT_BYTE_KEYWORDS: [&str; 5] = ["BYTE", "SHORT", "LONG", "QUAD", "SQUAD"];

/// Parses every output section from the cursor (positioned right after the
/// `Linker script and memory map` header) up to, but not including, the
/// `Cross Reference Table` header or end of file.
pub fn parse_output_sections(
    cursor: &mut LineCursor<'_>,
    diagnostics: &mut Diagnostics,
) -> Vec<OutputSection> {
    let mut sections = Vec::new();
    let mut current: Option<OutputSection> = None;

    while let Some(line) = cursor.peek() {
        if line.trim_end() == XREF_HEADER {
            break;
        }

        if line.trim().is_empty() {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            cursor.next();
            continue;
        }

        if is_column_zero(line) && (line.trim_start().starts_with('.')) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(open_output_section(cursor));
            continue;
        }

        match &mut current {
            Some(section) => {
                consume_input_line(cursor, section, diagnostics);
            }
            None => {
                // A line outside any output section (e.g. a `LOAD ...` entry
                // or a discarded-section notice): not part of this grammar.
                cursor.next();
            }
        }
    }

    if let Some(section) = current.take() {
        sections.push(section);
    }

    sections
}

/// Opens a new output section starting at the cursor's current (column-0,
/// dot-leading) line, consuming it and — when the header carried only a
/// name — its dimension-supplying continuation line.
fn open_output_section(cursor: &mut LineCursor<'_>) -> OutputSection {
    let header = cursor.next().expect("caller verified a line is present");
    let tokens = splitn_ws(header, 3);

    if tokens.len() >= 3 {
        return OutputSection {
            name: tokens[0].to_owned(),
            address: parse_c_uint(tokens[1]).unwrap_or(0),
            size: parse_c_uint(tokens[2]).unwrap_or(0),
            input_sections: Vec::new(),
        };
    }

    let name = tokens.first().copied().unwrap_or_default().to_owned();
    let mut section = OutputSection {
        name,
        address: 0,
        size: 0,
        input_sections: Vec::new(),
    };

    if let Some(next_line) = next_non_empty(cursor) {
        let dims: Vec<&str> = next_line.split_whitespace().collect();
        if dims.len() == 2 {
            if let (Some(addr), Some(size)) = (parse_c_uint(dims[0]), parse_c_uint(dims[1])) {
                section.address = addr;
                section.size = size;
                cursor.next();
            }
        }
    }

    section
}

/// Peeks the next non-blank line without consuming any line (including
/// blank ones already skipped), so a caller can inspect it before deciding
/// whether to consume it.
fn next_non_empty<'a>(cursor: &LineCursor<'a>) -> Option<&'a str> {
    let mut offset = 0;
    loop {
        let line = cursor.peek_at(offset)?;
        if !line.trim().is_empty() {
            return Some(line);
        }
        offset += 1;
    }
}

fn consume_input_line(
    cursor: &mut LineCursor<'_>,
    section: &mut OutputSection,
    diagnostics: &mut Diagnostics,
) {
    let line = cursor.next().expect("caller verified a line is present");
    let trimmed = line.trim_start();

    if let Some(rest) = trimmed.strip_prefix("*fill*") {
        if let Some(entry) = parse_fill(rest) {
            apply_fill(section, entry, diagnostics);
        }
        return;
    }

    let ws_tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if ws_tokens.len() >= 3
        && EXPLICIT_BYTE_KEYWORDS.contains(&ws_tokens[1])
        && parse_c_uint(ws_tokens[0]).is_some()
    {
        if let Some(size) = parse_c_uint(ws_tokens[2]) {
            if let Some(last) = section.input_sections.last_mut() {
                last.fill += size;
            }
        }
        return;
    }

    if trimmed.starts_with('.') || trimmed.starts_with("COMMON") {
        let new_section = parse_input_section_header(cursor, trimmed);
        push_input_section(section, new_section, diagnostics);
    }
    // Any other indented line (wildcard patterns, `LOAD` continuations,
    // bare symbol-address annotations) carries no data this reader consumes.
}

struct FillEntry {
    address: u64,
    size: u64,
}

fn parse_fill(rest: &str) -> Option<FillEntry> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    if tokens.len() != 2 {
        return None;
    }
    Some(FillEntry {
        address: parse_c_uint(tokens[0])?,
        size: parse_c_uint(tokens[1])?,
    })
}

fn apply_fill(section: &mut OutputSection, fill: FillEntry, diagnostics: &mut Diagnostics) {
    if let Some(current) = section.input_sections.last_mut() {
        if current.address == fill.address {
            // The fill record covers the same address as the input section
            // itself: it contributes no real bytes, only padding.
            current.size = 0;
            current.fill += fill.size;
            return;
        }
        if current.end() == fill.address {
            current.fill += fill.size;
            return;
        }
    }

    match section
        .input_sections
        .iter_mut()
        .rev()
        .find(|isec| isec.size != 0)
    {
        Some(isec) => isec.fill += fill.size,
        None => diagnostics.warn(format!(
            "*fill* at {:#x} in section {:?} has no input section to attach to",
            fill.address, section.name
        )),
    }
}

fn parse_input_section_header(cursor: &mut LineCursor<'_>, header: &str) -> InputSection {
    let tokens = splitn_ws(header, 4);

    let (name, address, size, archive_with_object) = if tokens.len() >= 4 {
        (
            tokens[0].to_owned(),
            parse_c_uint(tokens[1]).unwrap_or(0),
            parse_c_uint(tokens[2]).unwrap_or(0),
            tokens[3].to_owned(),
        )
    } else {
        let name = tokens.first().copied().unwrap_or_default().to_owned();
        if let Some(continuation) = next_non_empty(cursor) {
            let rest = splitn_ws(continuation, 3);
            if rest.len() == 3 {
                cursor.next();
                (
                    name,
                    parse_c_uint(rest[0]).unwrap_or(0),
                    parse_c_uint(rest[1]).unwrap_or(0),
                    rest[2].to_owned(),
                )
            } else {
                (name, 0, 0, String::new())
            }
        } else {
            (name, 0, 0, String::new())
        }
    };

    let (archive, object_file) = match archive_with_object.find('(') {
        Some(idx) => {
            let archive = archive_with_object[..idx].to_owned();
            let object_file = archive_with_object[idx + 1..]
                .trim_end_matches(')')
                .to_owned();
            (archive, object_file)
        }
        None => ("(exe)".to_owned(), archive_with_object),
    };

    InputSection {
        name,
        address,
        size,
        archive,
        object_file,
        fill: 0,
        symbols: Vec::new(),
    }
}

fn push_input_section(
    section: &mut OutputSection,
    mut new_section: InputSection,
    diagnostics: &mut Diagnostics,
) {
    if let Some(previous) = section.input_sections.last_mut() {
        if previous.address == new_section.address {
            previous.size = 0;
        }
    }

    if section.size != 0
        && (new_section.address < section.address || new_section.address >= section.address + section.size)
    {
        diagnostics.warn(format!(
            "input section {:?} at {:#x} lies outside output section {:?} [{:#x}, {:#x})",
            new_section.name,
            new_section.address,
            section.name,
            section.address,
            section.address + section.size,
        ));
        new_section.size = 0;
    }

    section.input_sections.push(new_section);
}
