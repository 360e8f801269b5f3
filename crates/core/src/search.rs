//! Byte pattern search over a byte source.

use twoway::find_bytes;

use crate::error::{CoreError, Result};
use crate::hex::decode_hex;
use crate::source::ByteSource;

/// Bytes scanned per window when searching large sources.
pub const DEFAULT_WINDOW: usize = 4 * 1024 * 1024;

/// A validated, non-empty byte pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern(Vec<u8>);

impl Pattern {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(CoreError::InvalidQuery("pattern is empty".into()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse a query made only of hex digit pairs, e.g. `"AABB"`.
pub fn validate_query(text: &str) -> Result<Pattern> {
    if text.is_empty() {
        return Err(CoreError::InvalidQuery("query is empty".into()));
    }
    if let Some((pos, c)) = text.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidQuery(format!(
            "non-hex character '{c}' at position {pos}"
        )));
    }
    if text.len() % 2 != 0 {
        return Err(CoreError::InvalidQuery(format!(
            "odd number of hex digits ({})",
            text.len()
        )));
    }
    Pattern::new(decode_hex(text)?)
}

/// Every start offset of `pattern` in `source`, overlapping matches included.
pub fn search(source: &ByteSource, pattern: &Pattern) -> Vec<usize> {
    search_windowed(source, pattern, DEFAULT_WINDOW)
}

/// Same as [`search`], scanning `window` bytes at a time.
///
/// Consecutive windows overlap by `pattern.len() - 1` bytes so matches that
/// straddle a boundary are found exactly once.
pub fn search_windowed(source: &ByteSource, pattern: &Pattern, window: usize) -> Vec<usize> {
    let needle = pattern.as_bytes();
    let hay = source.as_bytes();
    let mut matches = Vec::new();
    if needle.len() > hay.len() {
        return matches;
    }
    // Candidate start offsets per window; each start is owned by exactly one window.
    let step = window.max(1);
    let last_start = hay.len() - needle.len();
    let mut window_start = 0usize;
    while window_start <= last_start {
        let starts_end = window_start.saturating_add(step).min(last_start + 1);
        let chunk = &hay[window_start..starts_end + needle.len() - 1];
        let mut pos = 0;
        while let Some(found) = find_bytes(&chunk[pos..], needle) {
            matches.push(window_start + pos + found);
            pos += found + 1;
            if pos + needle.len() > chunk.len() {
                break;
            }
        }
        window_start = starts_end;
    }
    tracing::debug!(
        pattern_len = needle.len(),
        matches = matches.len(),
        "byte search finished"
    );
    matches
}
