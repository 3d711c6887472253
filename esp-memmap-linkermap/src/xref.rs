//! The optional `Cross Reference Table` extractor.

use esp_memmap_common::Diagnostics;

use crate::cursor::LineCursor;
use crate::model::CrossReferenceEntry;
use crate::text::is_column_zero;

const HEADER: &str = "Cross Reference Table";

/// Parses the cross-reference table, if the map file carries one.
///
/// Returns `None` (and leaves the cursor untouched) if `Cross Reference
/// Table` never appears — the table is optional per the design.
pub fn parse_cross_references(
    cursor: &mut LineCursor<'_>,
    diagnostics: &mut Diagnostics,
) -> Option<Vec<CrossReferenceEntry>> {
    if cursor.peek().map(str::trim_end) != Some(HEADER) {
        return None;
    }
    cursor.next();

    // Skip the `Symbol ... File` column header line, if present.
    if let Some(line) = cursor.peek() {
        if line.trim_start().starts_with("Symbol") {
            cursor.next();
        }
    }

    let mut entries: Vec<CrossReferenceEntry> = Vec::new();
    while let Some(line) = cursor.next() {
        if line.trim().is_empty() {
            continue;
        }

        let trimmed = line.trim_start();
        let Some((symbol_or_site, site)) = split_site(trimmed) else {
            diagnostics.warn(format!("unrecognized cross-reference line: {line:?}"));
            continue;
        };

        if is_column_zero(line) {
            entries.push(CrossReferenceEntry {
                symbol: symbol_or_site.to_owned(),
                sites: vec![site],
            });
        } else {
            match entries.last_mut() {
                Some(entry) => entry.sites.push(site),
                None => diagnostics.warn(format!(
                    "cross-reference continuation line with no preceding symbol: {line:?}"
                )),
            }
        }
    }

    Some(entries)
}

/// Splits `symbol archive(object)` (column 0) or `archive(object)`
/// (continuation) into the leading token (symbol name, empty for
/// continuations) and the `(archive, object_file)` pair.
fn split_site(trimmed: &str) -> Option<(&str, (String, String))> {
    let tokens: Vec<&str> = trimmed.splitn(2, char::is_whitespace).collect();
    let (symbol, site_token) = match tokens.len() {
        2 => (tokens[0], tokens[1].trim_start()),
        1 => ("", tokens[0]),
        _ => return None,
    };

    let idx = site_token.find('(')?;
    let archive = site_token[..idx].to_owned();
    let object_file = site_token[idx + 1..].trim_end_matches(')').to_owned();
    Some((symbol, (archive, object_file)))
}
