//! Parsing of the C-style integer literals that appear throughout linker map
//! files (`0x40080000`, `16384`, ...).

/// Parses a C-style integer literal in base 10 or, with a `0x`/`0X` prefix,
/// base 16. Returns `None` for anything else (empty input, stray signs,
/// non-hex-digit characters after the prefix).
pub fn parse_c_uint(token: &str) -> Option<u64> {
    let token = token.trim();
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        token.parse::<u64>().ok()
    }
}
