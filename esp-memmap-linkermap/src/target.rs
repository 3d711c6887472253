//! SoC target detection from linker-script lines.

use once_cell::sync::Lazy;
use regex::Regex;

static IDF_TARGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"IDF_TARGET_(\S*) =").unwrap());
static PROJECT_ELF_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"project_elf_src_(\S*)\.c\.obj").unwrap());
static XTENSA_LOAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^LOAD .*?/xtensa-(esp[^-]+)-elf/").unwrap());

/// Tries the three target-detection patterns against one line, in priority
/// order. Returns `None` if none match; the caller tries the next line.
pub fn detect_target_in_line(line: &str) -> Option<String> {
    if let Some(captures) = IDF_TARGET.captures(line) {
        return Some(captures[1].to_lowercase());
    }
    if let Some(captures) = PROJECT_ELF_SRC.captures(line) {
        return Some(captures[1].to_owned());
    }
    if let Some(captures) = XTENSA_LOAD.captures(line) {
        return Some(captures[1].to_owned());
    }
    None
}

/// Scans `lines` in order and returns the first detected target, or `None`
/// if the caller must supply one externally.
pub fn detect_target<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<String> {
    lines.into_iter().find_map(detect_target_in_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_target_is_lowercased() {
        assert_eq!(
            detect_target_in_line("#define IDF_TARGET_ESP32 ="),
            Some("esp32".to_owned())
        );
    }

    #[test]
    fn project_elf_src_is_unchanged() {
        assert_eq!(
            detect_target_in_line("CMakeFiles/app.elf.dir/project_elf_src_esp32s3.c.obj"),
            Some("esp32s3".to_owned())
        );
    }

    #[test]
    fn xtensa_load_line_requires_column_zero() {
        assert_eq!(
            detect_target_in_line("LOAD /opt/toolchains/xtensa-esp32-elf/lib/libc.a"),
            Some("esp32".to_owned())
        );
        assert_eq!(
            detect_target_in_line(" LOAD /opt/toolchains/xtensa-esp32-elf/lib/libc.a"),
            None
        );
    }

    #[test]
    fn first_match_wins() {
        let lines = vec![
            "nothing",
            "project_elf_src_esp32c3.c.obj",
            "#define IDF_TARGET_ESP32 =",
        ];
        assert_eq!(detect_target(lines), Some("esp32c3".to_owned()));
    }
}
