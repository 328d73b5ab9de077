use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TextEncoding – how the raw CSV bytes are turned into text
// ---------------------------------------------------------------------------

/// Character encoding of a CSV source.
///
/// SAM.gov extracts are Latin-1 in practice, hence the default. Decoding is
/// strict: a byte the encoding does not define is an error and no other
/// encoding is tried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    #[serde(alias = "iso-8859-1")]
    Latin1,
    #[serde(alias = "windows-1252")]
    Cp1252,
    #[serde(alias = "utf-8")]
    Utf8,
}

/// Position of the first byte the encoding cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    pub offset: usize,
    pub byte: u8,
}

/// Windows-1252 assignments for 0x80..=0x9F; `None` marks undefined bytes.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None,             Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None,             Some('\u{017D}'), None,
    None,             Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None,             Some('\u{017E}'), Some('\u{0178}'),
];

impl TextEncoding {
    /// Canonical label, as accepted in configuration files.
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Latin1 => "latin1",
            TextEncoding::Cp1252 => "cp1252",
            TextEncoding::Utf8 => "utf8",
        }
    }

    /// Decode `bytes` into a `String`.
    pub fn decode(self, bytes: &[u8]) -> Result<String, DecodeError> {
        match self {
            // Every byte is the code point of the same value.
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Cp1252 => {
                let mut out = String::with_capacity(bytes.len());
                for (offset, &byte) in bytes.iter().enumerate() {
                    let ch = match byte {
                        0x80..=0x9F => CP1252_HIGH[(byte - 0x80) as usize]
                            .ok_or(DecodeError { offset, byte })?,
                        _ => byte as char,
                    };
                    out.push(ch);
                }
                Ok(out)
            }
            TextEncoding::Utf8 => {
                let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                let skipped = bytes.len() - body.len();
                match std::str::from_utf8(body) {
                    Ok(s) => Ok(s.to_string()),
                    Err(e) => {
                        let offset = e.valid_up_to();
                        Err(DecodeError {
                            offset: offset + skipped,
                            byte: body[offset],
                        })
                    }
                }
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latin1" | "latin-1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            "cp1252" | "windows-1252" => Ok(TextEncoding::Cp1252),
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            other => Err(format!(
                "unknown encoding '{other}' (expected latin1, cp1252 or utf8)"
            )),
        }
    }
}
