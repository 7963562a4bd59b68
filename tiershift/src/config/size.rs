//! Human-readable size parsing (e.g., "500GB", "2TB").

use thiserror::Error;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '2TB', '500GB', or '750MB'")]
pub struct SizeParseError {
    input: String,
}

impl SizeParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;
const TIB: u64 = 1024 * GIB;

/// Parse a human-readable size string into bytes.
///
/// Supports bare numbers (bytes) and KB/MB/GB/TB suffixes with their
/// single-letter forms, case-insensitive and whitespace tolerant.
///
/// # Examples
///
/// ```
/// use tiershift::config::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("500 MB").unwrap(), 500 * 1024 * 1024);
/// assert_eq!(parse_size("2tb").unwrap(), 2 * 1024 * 1024 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SizeParseError::new(s));
    }

    let upper = s.to_uppercase();
    let (digits, multiplier) = if let Some(rest) = strip_suffix(&upper, &["TB", "T"]) {
        (rest, TIB)
    } else if let Some(rest) = strip_suffix(&upper, &["GB", "G"]) {
        (rest, GIB)
    } else if let Some(rest) = strip_suffix(&upper, &["MB", "M"]) {
        (rest, MIB)
    } else if let Some(rest) = strip_suffix(&upper, &["KB", "K"]) {
        (rest, KIB)
    } else {
        (upper.as_str(), 1)
    };

    let num: u64 = digits
        .trim()
        .parse()
        .map_err(|_| SizeParseError::new(s))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| SizeParseError::new(s))
}

fn strip_suffix<'a>(s: &'a str, suffixes: &[&str]) -> Option<&'a str> {
    suffixes.iter().find_map(|suffix| s.strip_suffix(suffix))
}

/// Format a byte count as a human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes >= TIB {
        format!("{:.1} TB", bytes as f64 / TIB as f64)
    } else if bytes >= GIB {
        format!("{:.1} GB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_bytes() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
    }

    #[test]
    fn parses_all_suffixes() {
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1MB").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("1GB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("1TB").unwrap(), 1024u64.pow(4));
    }

    #[test]
    fn parses_short_suffixes_case_insensitively() {
        assert_eq!(parse_size("2t").unwrap(), 2 * 1024u64.pow(4));
        assert_eq!(parse_size("500m").unwrap(), 500 * 1024 * 1024);
    }

    #[test]
    fn tolerates_whitespace() {
        assert_eq!(parse_size(" 500 MB ").unwrap(), 500 * 1024 * 1024);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("lots").is_err());
        assert!(parse_size("12XB").is_err());
    }

    #[test]
    fn rejects_overflow() {
        assert!(parse_size("99999999999TB").is_err());
    }

    #[test]
    fn formats_round_trip_magnitudes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MB");
        assert_eq!(format_size(3 * 1024u64.pow(4)), "3.0 TB");
    }
}
