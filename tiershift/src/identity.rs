//! Logical media identity and episode coordinate parsing.
//!
//! Two releases of the same title usually differ only in the trailing
//! quality/codec annotation (`Show - S01E01 - Pilot [1080p].mkv` vs the
//! older `[720p]` rip). The identity of a file is its name with the
//! extension, any trailing bracketed annotations, and trailing separator
//! characters removed, so an upgraded rip still matches its predecessor.

use std::path::Path;

/// Characters treated as separators at the end of a name.
const TRAILING_SEPARATORS: &[char] = &[' ', '-', '.', '_'];

/// Episode coordinates parsed from an `SxxEyy` filename marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeMarker {
    /// Season number.
    pub season: u32,
    /// Episode number within the season.
    pub episode: u32,
}

/// Derive the logical media identity of a file.
///
/// Strips the file extension, then repeatedly strips trailing bracketed
/// annotations (`[1080p]`, `[x265]`, ...), then trims trailing separator
/// characters.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use tiershift::identity::media_identity;
///
/// let a = media_identity(Path::new("Show - S01E01 - Pilot [720p].mkv"));
/// let b = media_identity(Path::new("Show - S01E01 - Pilot [1080p][x265].mkv"));
/// assert_eq!(a, b);
/// ```
pub fn media_identity(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let mut name = stem.trim();

    // Strip trailing bracketed annotations, innermost last
    loop {
        let trimmed = name.trim_end_matches(TRAILING_SEPARATORS);
        if trimmed.ends_with(']') {
            if let Some(open) = trimmed.rfind('[') {
                name = &trimmed[..open];
                continue;
            }
        }
        name = trimmed;
        break;
    }

    name.to_string()
}

/// Parse the first `SxxEyy` episode marker from a filename.
///
/// Matching is case-insensitive and requires the marker to start at a word
/// boundary (`Show S01E02` and `Show.s1e2` match, `HOUSE01E02` does not).
/// Returns `None` for names without a marker, which are treated as movies.
pub fn episode_marker(name: &str) -> Option<EpisodeMarker> {
    let bytes = name.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        if b != b'S' && b != b's' {
            continue;
        }
        // Word boundary: start of string or a non-alphanumeric predecessor
        if i > 0 && bytes[i - 1].is_ascii_alphanumeric() {
            continue;
        }

        let (season, after_season) = match take_number(bytes, i + 1) {
            Some(v) => v,
            None => continue,
        };
        if after_season >= bytes.len() {
            continue;
        }
        let e = bytes[after_season];
        if e != b'E' && e != b'e' {
            continue;
        }
        if let Some((episode, after_episode)) = take_number(bytes, after_season + 1) {
            // Reject runaway digit sequences glued to the marker
            if after_episode < bytes.len() && bytes[after_episode].is_ascii_digit() {
                continue;
            }
            return Some(EpisodeMarker { season, episode });
        }
    }

    None
}

/// Derive a grouping key for the show an episode belongs to.
///
/// Uses the identity prefix before the episode marker; falls back to the
/// full identity when the marker leads the name.
pub fn show_key(path: &Path) -> String {
    let identity = media_identity(path);

    if let Some(pos) = marker_position(&identity) {
        let prefix = identity[..pos].trim_end_matches(TRAILING_SEPARATORS);
        if !prefix.is_empty() {
            return prefix.to_string();
        }
    }

    identity
}

/// Byte offset of the first episode marker within a name, if any.
fn marker_position(name: &str) -> Option<usize> {
    let bytes = name.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'S' || b == b's') && (i == 0 || !bytes[i - 1].is_ascii_alphanumeric()) {
            if let Some((_, after)) = take_number(bytes, i + 1) {
                if after < bytes.len() && (bytes[after] == b'E' || bytes[after] == b'e') {
                    if take_number(bytes, after + 1).is_some() {
                        return Some(i);
                    }
                }
            }
        }
    }
    None
}

/// Parse a run of up to four digits starting at `start`.
///
/// Returns the value and the index just past the digits.
fn take_number(bytes: &[u8], start: usize) -> Option<(u32, usize)> {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() && end - start < 4 {
        end += 1;
    }
    if end == start {
        return None;
    }
    let value: u32 = std::str::from_utf8(&bytes[start..end]).ok()?.parse().ok()?;
    Some((value, end))
}
