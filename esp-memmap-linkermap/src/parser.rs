//! Top-level orchestration of the four map-file extractors (§4.1).

use esp_memmap_common::Diagnostics;

use crate::cursor::LineCursor;
use crate::error::MapFileError;
use crate::model::LinkerMap;
use crate::target::detect_target;
use crate::{memory_config, sections, validate, xref};

/// Parses a complete linker map file.
///
/// `supplied_target`, when given, is used verbatim instead of running target
/// detection — matching the design's "an empty target is allowed if the
/// caller supplies one externally" rule. Recoverable anomalies (contiguity
/// violations, orphan cross-reference lines) are reported through
/// `diagnostics` rather than failing the parse.
pub fn parse_map_file(
    text: &str,
    supplied_target: Option<String>,
    diagnostics: &mut Diagnostics,
) -> Result<LinkerMap, MapFileError> {
    let mut cursor = LineCursor::new(text);

    let regions = memory_config::parse_memory_configuration(&mut cursor)?;
    // `parse_memory_configuration` leaves the cursor at the
    // `Linker script and memory map` line itself; consume it before scanning
    // for a target or handing off to the section state machine.
    let lmap_start = cursor.next();
    debug_assert!(lmap_start.is_some());

    let remaining_from_here = text_from(&cursor);
    let target = supplied_target.or_else(|| detect_target(remaining_from_here.lines()));

    let output_sections = sections::parse_output_sections(&mut cursor, diagnostics);
    validate::validate_contiguity(&output_sections, diagnostics);

    let cross_references = xref::parse_cross_references(&mut cursor, diagnostics);

    Ok(LinkerMap {
        regions,
        target,
        output_sections,
        cross_references,
    })
}

/// Reconstructs the remaining text from a cursor's current position, for the
/// target scan, which runs over the same lines the section parser will
/// subsequently consume.
fn text_from(cursor: &LineCursor<'_>) -> String {
    let mut lines = Vec::new();
    let mut offset = 0;
    while let Some(line) = cursor.peek_at(offset) {
        lines.push(line);
        offset += 1;
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::InputSection;
    use similar_asserts::assert_eq;

    #[test]
    fn parses_fixture_minimal_map() {
        let path = esp_memmap_testutils::fixture("maps/minimal.map");
        let text = std::fs::read_to_string(path).unwrap();
        let mut diagnostics = Diagnostics::new();
        let map = parse_map_file(&text, None, &mut diagnostics).unwrap();

        assert_eq!(map.regions.len(), 2);
        assert_eq!(map.output_sections.len(), 1);
        let section = &map.output_sections[0];
        assert_eq!(section.name, ".iram0.text");
        assert_eq!(section.address, 0x4000_0000);
        assert_eq!(section.size, 0x1000);
        assert_eq!(section.input_sections.len(), 1);
        assert_eq!(
            section.input_sections[0],
            InputSection {
                name: section.input_sections[0].name.clone(),
                address: 0x4000_0000,
                size: 0x1000,
                archive: "libfoo.a".to_owned(),
                object_file: "foo.o".to_owned(),
                fill: 0,
                symbols: Vec::new(),
            }
        );

        let xrefs = map.cross_references.unwrap();
        assert_eq!(xrefs.len(), 1);
        assert_eq!(xrefs[0].symbol, "__init");
    }

    #[test]
    fn supplied_target_short_circuits_detection() {
        let text = "Memory Configuration\n\nLinker script and memory map\n\
                     IDF_TARGET_ESP32S3 =\n";
        let mut diagnostics = Diagnostics::new();
        let map = parse_map_file(text, Some("esp32c3".to_owned()), &mut diagnostics).unwrap();
        assert_eq!(map.target.as_deref(), Some("esp32c3"));
    }

    #[test]
    fn detects_target_from_idf_define() {
        let text = "Memory Configuration\n\nLinker script and memory map\n\
                     #define IDF_TARGET_ESP32 =\n";
        let mut diagnostics = Diagnostics::new();
        let map = parse_map_file(text, None, &mut diagnostics).unwrap();
        assert_eq!(map.target.as_deref(), Some("esp32"));
    }
}
