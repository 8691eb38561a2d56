//! Text encodings for character and memo fields

use serde::{Deserialize, Serialize};

/// Text encoding applied to character and memo text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8 (lengths are counted in bytes, not characters)
    #[default]
    Utf8,
    /// ISO-8859-1: one byte per code point U+0000..U+00FF
    Latin1,
    /// 7-bit ASCII
    Ascii,
}

impl TextEncoding {
    /// Encoding implied by a header language-driver byte.
    ///
    /// Unmarked tables (0x00) default to UTF-8. The Windows ANSI and ISO
    /// Latin drivers map to Latin-1; every other driver also falls back to
    /// Latin-1, which never fails to decode.
    pub fn from_language_driver(driver: u8) -> Self {
        match driver {
            0x00 => TextEncoding::Utf8,
            _ => TextEncoding::Latin1,
        }
    }

    /// Language-driver byte written for this encoding
    pub fn language_driver(&self) -> u8 {
        match self {
            TextEncoding::Utf8 => 0x00,
            // Windows ANSI (code page 1252)
            TextEncoding::Latin1 => 0x03,
            TextEncoding::Ascii => 0x00,
        }
    }

    /// Name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Latin1 => "Latin-1",
            TextEncoding::Ascii => "ASCII",
        }
    }

    /// Encode text; `None` when a character has no representation.
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            TextEncoding::Utf8 => Some(text.as_bytes().to_vec()),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).ok())
                .collect(),
            TextEncoding::Ascii => {
                if text.is_ascii() {
                    Some(text.as_bytes().to_vec())
                } else {
                    None
                }
            }
        }
    }

    /// Decode bytes; `None` when they are not valid in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            TextEncoding::Ascii => {
                if bytes.is_ascii() {
                    std::str::from_utf8(bytes).ok().map(str::to_string)
                } else {
                    None
                }
            }
        }
    }
}
