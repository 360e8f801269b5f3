// Hex dump formatting for the visible window of a byte source.

use std::fmt;

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::source::ByteSource;

pub const BYTES_PER_LINE: usize = 16;

/// Width of the hex column: 16 two-digit bytes, 15 separators, one group gap.
pub const HEX_COLUMN_WIDTH: usize = BYTES_PER_LINE * 3;

/// One row of a hex dump.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HexLine {
    pub address: usize,
    /// Space-separated byte pairs, split into two groups of eight, padded.
    pub hex: String,
    /// Printable ASCII or `.`, padded to 16 characters.
    pub ascii: String,
}

impl fmt::Display for HexLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}  {}  {}", self.address, self.hex, self.ascii)
    }
}

/// Printable character for `b`, or `.`.
pub fn ascii_char(b: u8) -> char {
    if (32..=126).contains(&b) { b as char } else { '.' }
}

/// Address of the first byte on `row`.
pub fn address_for_row(row: usize) -> usize {
    row * BYTES_PER_LINE
}

/// Format up to 16 bytes starting at `address`.
pub fn format_line(bytes: &[u8], address: usize) -> HexLine {
    let bytes = &bytes[..bytes.len().min(BYTES_PER_LINE)];
    let mut hex = String::with_capacity(HEX_COLUMN_WIDTH);
    for i in 0..BYTES_PER_LINE {
        match bytes.get(i) {
            Some(b) => hex.push_str(&format!("{b:02X}")),
            None => hex.push_str("  "),
        }
        if i != BYTES_PER_LINE - 1 {
            hex.push(' ');
        }
        if i == 7 {
            hex.push(' ');
        }
    }
    let ascii: String = bytes.iter().map(|&b| ascii_char(b)).collect();
    HexLine {
        address,
        hex,
        ascii: format!("{ascii:<width$}", width = BYTES_PER_LINE),
    }
}

/// Format `count` rows starting at the row containing `start_address`.
///
/// Only the bytes of the requested rows are touched.
pub fn hex_lines(source: &ByteSource, start_address: usize, count: usize) -> Result<Vec<HexLine>> {
    let first_row = start_address / BYTES_PER_LINE;
    let mut lines = Vec::with_capacity(count.min(1024));
    for row in first_row..first_row.saturating_add(count) {
        let address = address_for_row(row);
        if address >= source.len() {
            break;
        }
        let len = BYTES_PER_LINE.min(source.len() - address);
        lines.push(format_line(source.read(address, len)?, address));
    }
    Ok(lines)
}

/// Number of rows needed to show `byte_count` bytes.
pub fn line_count(byte_count: usize) -> usize {
    byte_count.div_ceil(BYTES_PER_LINE)
}

/// Uppercase hex digits for `bytes`, no separators.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Parse a string of hex digit pairs back into bytes.
pub fn decode_hex(text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| CoreError::InvalidQuery(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_line_layout() {
        let line = format_line(b"Hello World!\x00\x00\x00\x00", 0);
        assert_eq!(
            line.to_string(),
            "00000000  48 65 6C 6C 6F 20 57 6F  72 6C 64 21 00 00 00 00  Hello World!...."
        );
        assert_eq!(line.hex.len(), HEX_COLUMN_WIDTH);
    }

    #[test]
    fn short_line_is_padded() {
        let line = format_line(&[0x41, 0x00, 0xFF], 0x30);
        assert_eq!(line.hex.len(), HEX_COLUMN_WIDTH);
        assert!(line.hex.starts_with("41 00 FF "));
        assert_eq!(line.ascii, "A..             ");
        assert!(line.to_string().starts_with("00000030  "));
    }

    #[test]
    fn ascii_column_printable_range() {
        for b in 0..=255u8 {
            let c = ascii_char(b);
            if (32..=126).contains(&b) {
                assert_eq!(c, b as char);
            } else {
                assert_eq!(c, '.');
            }
        }
    }

    #[test]
    fn rows_map_to_addresses() {
        assert_eq!(address_for_row(0), 0);
        assert_eq!(address_for_row(3), 48);
        assert_eq!(line_count(0), 0);
        assert_eq!(line_count(17), 2);
    }

    #[test]
    fn window_is_aligned_and_clipped() {
        let src = ByteSource::from_bytes((0u8..40).collect());
        let lines = hex_lines(&src, 20, 10).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].address, 16);
        assert_eq!(lines[1].address, 32);
        assert!(lines[1].hex.starts_with("20 21 22 23 24 25 26 27  "));
        assert!(hex_lines(&src, 4096, 4).unwrap().is_empty());
    }

    #[test]
    fn encode_decode_roundtrip() {
        let samples: [&[u8]; 4] = [b"", b"\x00", b"\xDE\xAD\xBE\xEF", &[0x7F; 33]];
        for bytes in samples {
            assert_eq!(decode_hex(&encode_hex(bytes)).unwrap(), bytes);
        }
        let all: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_hex(&encode_hex(&all)).unwrap(), all);
        assert_eq!(encode_hex(&[0xAB, 0x01]), "AB01");
    }
}
