//! Conversions between application values and their transport form.
//!
//! Text travels as bytes in a [`TextEncoding`]; structured values travel as
//! JSON text. Every failure surfaces as [`QueueError::Encoding`].

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::backend::QueueError;

/// Character encoding used to turn text items into stored bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    /// ISO-8859-1: one byte per code point below U+0100
    Latin1,
}

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    pub fn encode(&self, text: &str) -> Result<Vec<u8>, QueueError> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Ascii => {
                if let Some((pos, ch)) = text.char_indices().find(|(_, c)| !c.is_ascii()) {
                    return Err(unencodable(*self, ch, pos));
                }
                Ok(text.as_bytes().to_vec())
            }
            TextEncoding::Latin1 => text
                .char_indices()
                .map(|(pos, ch)| u8::try_from(u32::from(ch)).map_err(|_| unencodable(*self, ch, pos)))
                .collect(),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, QueueError> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| QueueError::Encoding(format!("invalid utf-8 data: {}", e))),
            TextEncoding::Ascii => {
                if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(QueueError::Encoding(format!(
                        "byte 0x{:02x} at position {} is not ascii",
                        bytes[pos], pos
                    )));
                }
                Ok(bytes.iter().map(|&b| char::from(b)).collect())
            }
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

fn unencodable(encoding: TextEncoding, ch: char, pos: usize) -> QueueError {
    QueueError::Encoding(format!(
        "'{}' at position {} cannot be encoded as {}",
        ch.escape_unicode(),
        pos,
        encoding.label()
    ))
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(QueueError::InvalidValue(format!(
                "unsupported encoding '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = QueueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TextEncoding> for String {
    fn from(value: TextEncoding) -> Self {
        value.label().to_string()
    }
}

/// Serialize a structured value to JSON text.
pub fn encode_json<V: Serialize + ?Sized>(value: &V) -> Result<String, QueueError> {
    serde_json::to_string(value).map_err(|e| QueueError::Encoding(format!("cannot serialize item: {}", e)))
}

/// Restore a structured value from JSON text.
pub fn decode_json<V: DeserializeOwned>(raw: &str) -> Result<V, QueueError> {
    serde_json::from_str(raw)
        .map_err(|e| QueueError::Encoding(format!("malformed stored item: {}", e)))
}
