//! Text encodings for the delimited files read and written by the pipeline.
//!
//! Only the encodings the reports actually use are supported: Latin-1 for the
//! catalogs and spreadsheet-bound reports, UTF-8 and UTF-8 with a byte order
//! mark for the tracking export.

use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Replacement byte for characters Latin-1 cannot represent.
const LATIN1_REPLACEMENT: u8 = b'?';

/// A supported text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// ISO-8859-1: one byte per code point, U+0000..=U+00FF.
    Latin1,
    /// Plain UTF-8.
    Utf8,
    /// UTF-8 prefixed with a byte order mark (what spreadsheets expect).
    Utf8Bom,
}

impl TextEncoding {
    /// Decode raw file bytes into a string.
    ///
    /// A leading UTF-8 BOM always wins over the configured encoding, so a
    /// BOM-marked export can be re-read by a Latin-1 configured run.
    pub fn decode(&self, bytes: &[u8]) -> String {
        if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
            return String::from_utf8_lossy(rest).into_owned();
        }
        match self {
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Utf8 | TextEncoding::Utf8Bom => {
                String::from_utf8_lossy(bytes).into_owned()
            }
        }
    }

    /// Encode a string into bytes ready to be written to disk.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(LATIN1_REPLACEMENT))
                .collect(),
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf8Bom => {
                let mut out = Vec::with_capacity(UTF8_BOM.len() + text.len());
                out.extend_from_slice(UTF8_BOM);
                out.extend_from_slice(text.as_bytes());
                out
            }
        }
    }
}

impl FromStr for TextEncoding {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => Ok(TextEncoding::Latin1),
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "utf-8-sig" | "utf8-sig" => Ok(TextEncoding::Utf8Bom),
            _ => Err(ReportError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Bom => "utf-8-sig",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("latin-1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("ISO-8859-1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("utf8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("utf_8_sig".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8Bom);
        assert!("cp437".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn test_latin1_decodes_high_bytes() {
        // "Año" in Latin-1.
        let bytes = [0x41, 0xF1, 0x6F];
        assert_eq!(TextEncoding::Latin1.decode(&bytes), "Año");
    }

    #[test]
    fn test_latin1_encode_replaces_unrepresentable() {
        assert_eq!(TextEncoding::Latin1.encode("Año €"), vec![0x41, 0xF1, 0x6F, 0x20, b'?']);
    }

    #[test]
    fn test_bom_overrides_configured_encoding() {
        let bytes = TextEncoding::Utf8Bom.encode("Año");
        assert_eq!(&bytes[..3], UTF8_BOM);
        assert_eq!(TextEncoding::Latin1.decode(&bytes), "Año");
    }
}
