//! The `Memory Configuration` extractor.

use esp_memmap_common::parse_c_uint;

use crate::cursor::LineCursor;
use crate::error::{MapFileError, MapFileErrorKind};
use crate::model::MemoryRegion;

const HEADER: &str = "Memory Configuration";
const NEXT_HEADER: &str = "Linker script and memory map";

/// Parses the `Memory Configuration` table, leaving the cursor at the
/// `Linker script and memory map` line.
///
/// Returns [`MapFileErrorKind::MissingMemoryConfigHeader`] if the header is
/// never found — this is the one fatal condition in this extractor, per the
/// design's parse-error taxonomy for Component B.
pub fn parse_memory_configuration(
    cursor: &mut LineCursor<'_>,
) -> Result<Vec<MemoryRegion>, MapFileError> {
    if !cursor.seek_to(HEADER) {
        return Err(MapFileErrorKind::MissingMemoryConfigHeader.into());
    }
    cursor.next();

    let mut regions = Vec::new();
    while let Some(line) = cursor.peek() {
        let trimmed = line.trim_end();
        if trimmed.starts_with(NEXT_HEADER) {
            break;
        }
        if trimmed.trim().is_empty() {
            cursor.next();
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() >= 2 && tokens[0].eq_ignore_ascii_case("Name") {
            cursor.next();
            continue;
        }

        if tokens.len() < 3 || tokens.len() > 4 {
            return Err(MapFileErrorKind::MalformedMemoryConfigRow(trimmed.to_owned()).into());
        }

        let origin = parse_c_uint(tokens[1])
            .ok_or_else(|| MapFileErrorKind::InvalidNumericLiteral(tokens[1].to_owned()))?;
        let length = parse_c_uint(tokens[2])
            .ok_or_else(|| MapFileErrorKind::InvalidNumericLiteral(tokens[2].to_owned()))?;

        regions.push(MemoryRegion {
            name: tokens[0].to_owned(),
            origin,
            length,
            attrs: tokens.get(3).map(|s| s.to_string()).unwrap_or_default(),
        });

        cursor.next();
    }

    if !cursor.seek_to(NEXT_HEADER) {
        return Err(MapFileErrorKind::MissingLinkerMapHeader.into());
    }

    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_and_four_column_rows() {
        let text = "Memory Configuration\n\
             Name             Origin             Length             Attributes\n\
             iram0_0_seg      0x40000000         0x00004000         xrw\n\
             *default*        0x00000000         0xffffffff\n\
             \n\
             Linker script and memory map\n";
        let mut cursor = LineCursor::new(text);
        let regions = parse_memory_configuration(&mut cursor).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].name, "iram0_0_seg");
        assert_eq!(regions[0].origin, 0x4000_0000);
        assert_eq!(regions[0].length, 0x4000);
        assert_eq!(regions[0].attrs, "xrw");
        assert_eq!(regions[1].name, "*default*");
        assert_eq!(regions[1].attrs, "");
        assert_eq!(cursor.peek(), Some("Linker script and memory map"));
    }

    #[test]
    fn missing_header_is_fatal() {
        let mut cursor = LineCursor::new("nothing here");
        let err = parse_memory_configuration(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), &MapFileErrorKind::MissingMemoryConfigHeader);
    }
}
