//! Contiguity validation (§3.4 invariant 1 / P7).

use esp_memmap_common::Diagnostics;

use crate::model::OutputSection;

/// Checks that every output section's input sections are contiguous:
/// `addr_{i+1} = addr_i + size_i + fill_i`, and that the section's size
/// equals the sum of its input sections' sizes and fills.
///
/// Violations are recoverable: they are recorded as diagnostics, not errors,
/// and the caller proceeds with the tree as built.
pub fn validate_contiguity(sections: &[OutputSection], diagnostics: &mut Diagnostics) {
    for section in sections {
        if section.input_sections.is_empty() {
            continue;
        }

        let total: u64 = section
            .input_sections
            .iter()
            .map(|isec| isec.size + isec.fill)
            .sum();
        if total != section.size {
            diagnostics.warn(format!(
                "output section {:?} size {:#x} does not match the sum of its input sections {:#x}",
                section.name, section.size, total
            ));
        }

        for pair in section.input_sections.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let expected = prev.address + prev.size + prev.fill;
            if next.address != expected {
                diagnostics.warn(format!(
                    "input section {:?} at {:#x} is not contiguous with the preceding \
                     section {:?} (expected {:#x})",
                    next.name, next.address, prev.name, expected
                ));
            }
        }
    }
}
