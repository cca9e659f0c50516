// Copyright © 2024 Pathway

use std::fmt;

use crate::error::{Error, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];
const UTF32_LE_BOM: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
const UTF32_BE_BOM: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

/// Character encodings supported for text files.
///
/// `Utf8` writes no byte-order mark, the UTF-16 and UTF-32 variants always
/// start a new file with theirs so that readers can detect them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf8WithBom,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 | Self::Utf8WithBom => "UTF-8",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf32Le => "UTF-32LE",
            Self::Utf32Be => "UTF-32BE",
        }
    }

    /// The byte-order mark written at the beginning of a new file.
    pub fn preamble(self) -> &'static [u8] {
        match self {
            Self::Utf8 => &[],
            Self::Utf8WithBom => UTF8_BOM,
            Self::Utf16Le => UTF16_LE_BOM,
            Self::Utf16Be => UTF16_BE_BOM,
            Self::Utf32Le => UTF32_LE_BOM,
            Self::Utf32Be => UTF32_BE_BOM,
        }
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 | Self::Utf8WithBom => text.as_bytes().to_vec(),
            Self::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Self::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Self::Utf32Le => text.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect(),
            Self::Utf32Be => text.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect(),
        }
    }

    /// Decodes `bytes` that carry no byte-order mark.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        let invalid = || Error::Decoding(self.name());
        match self {
            Self::Utf8 | Self::Utf8WithBom => {
                String::from_utf8(bytes.to_vec()).map_err(|_| invalid())
            }
            Self::Utf16Le | Self::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(invalid());
                }
                let units = bytes.chunks_exact(2).map(|pair| {
                    let pair = [pair[0], pair[1]];
                    if self == Self::Utf16Le {
                        u16::from_le_bytes(pair)
                    } else {
                        u16::from_be_bytes(pair)
                    }
                });
                char::decode_utf16(units)
                    .collect::<Result<String, _>>()
                    .map_err(|_| invalid())
            }
            Self::Utf32Le | Self::Utf32Be => {
                if bytes.len() % 4 != 0 {
                    return Err(invalid());
                }
                bytes
                    .chunks_exact(4)
                    .map(|quad| {
                        let quad = [quad[0], quad[1], quad[2], quad[3]];
                        let code = if self == Self::Utf32Le {
                            u32::from_le_bytes(quad)
                        } else {
                            u32::from_be_bytes(quad)
                        };
                        char::from_u32(code).ok_or_else(invalid)
                    })
                    .collect()
            }
        }
    }

    /// Recognizes a byte-order mark at the start of `bytes`.
    ///
    /// Returns the encoding it announces and the length of the mark.
    ///
    /// `FF FE 00 00` always reads as the UTF-32LE mark. UTF-16LE text that
    /// starts with U+0000 begins with the same four bytes and is therefore
    /// misdetected; its content should be read with an explicit encoding and
    /// the mark stripped by the caller.
    pub fn detect(bytes: &[u8]) -> Option<(Self, usize)> {
        // UTF-32LE must be checked before UTF-16LE, they share the first two bytes
        [
            (Self::Utf32Le, UTF32_LE_BOM),
            (Self::Utf32Be, UTF32_BE_BOM),
            (Self::Utf8WithBom, UTF8_BOM),
            (Self::Utf16Le, UTF16_LE_BOM),
            (Self::Utf16Be, UTF16_BE_BOM),
        ]
        .into_iter()
        .find(|(_, bom)| bytes.starts_with(bom))
        .map(|(encoding, bom)| (encoding, bom.len()))
    }

    /// Decodes file content, honoring a byte-order mark over `fallback`.
    pub fn decode_detecting(bytes: &[u8], fallback: Self) -> Result<String> {
        match Self::detect(bytes) {
            Some((encoding, bom_len)) => encoding.decode(&bytes[bom_len..]),
            None => fallback.decode(bytes),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
