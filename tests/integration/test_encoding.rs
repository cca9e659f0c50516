// Copyright © 2024 Pathway

use assert_matches::assert_matches;

use abstract_files::encoding::TextEncoding;
use abstract_files::error::Error;

fn marked(encoding: TextEncoding, text: &str) -> Vec<u8> {
    let mut bytes = encoding.preamble().to_vec();
    bytes.extend(encoding.encode(text));
    bytes
}

#[test]
fn test_preambles() {
    assert!(TextEncoding::Utf8.preamble().is_empty());
    assert_eq!(TextEncoding::Utf8WithBom.preamble(), [0xEF, 0xBB, 0xBF]);
    assert_eq!(TextEncoding::Utf16Le.preamble(), [0xFF, 0xFE]);
    assert_eq!(TextEncoding::Utf16Be.preamble(), [0xFE, 0xFF]);
    assert_eq!(TextEncoding::Utf32Le.preamble(), [0xFF, 0xFE, 0x00, 0x00]);
    assert_eq!(TextEncoding::Utf32Be.preamble(), [0x00, 0x00, 0xFE, 0xFF]);
}

#[test]
fn test_encoded_bytes() {
    assert_eq!(TextEncoding::Utf16Le.encode("A€"), [0x41, 0x00, 0xAC, 0x20]);
    assert_eq!(TextEncoding::Utf16Be.encode("A€"), [0x00, 0x41, 0x20, 0xAC]);
    assert_eq!(TextEncoding::Utf32Be.encode("😀"), [0x00, 0x01, 0xF6, 0x00]);
    assert_eq!(TextEncoding::Utf8WithBom.encode("ą"), "ą".as_bytes());
}

#[test]
fn test_detection_prefers_longest_mark() {
    let utf32 = marked(TextEncoding::Utf32Le, "hi");
    assert_eq!(TextEncoding::detect(&utf32), Some((TextEncoding::Utf32Le, 4)));

    let utf16 = marked(TextEncoding::Utf16Le, "hi");
    assert_eq!(TextEncoding::detect(&utf16), Some((TextEncoding::Utf16Le, 2)));

    assert_eq!(TextEncoding::detect(b"plain"), None);
    assert_eq!(TextEncoding::detect(&[]), None);
}

#[test]
fn test_utf16le_text_starting_with_nul_reads_as_utf32le() {
    let bytes = marked(TextEncoding::Utf16Le, "\0hi");
    assert_eq!(bytes[..4], [0xFF, 0xFE, 0x00, 0x00]);
    assert_eq!(TextEncoding::detect(&bytes), Some((TextEncoding::Utf32Le, 4)));
    assert_matches!(
        TextEncoding::decode_detecting(&bytes, TextEncoding::Utf16Le),
        Err(Error::Decoding("UTF-32LE"))
    );
    assert_eq!(
        TextEncoding::Utf16Le.decode(&bytes[2..]).ok().as_deref(),
        Some("\0hi")
    );
}

#[test]
fn test_mark_overrides_fallback() -> eyre::Result<()> {
    let bytes = marked(TextEncoding::Utf16Be, "żółw");
    assert_eq!(TextEncoding::decode_detecting(&bytes, TextEncoding::Utf8)?, "żółw");
    assert_eq!(TextEncoding::decode_detecting(&bytes, TextEncoding::Utf32Le)?, "żółw");

    let unmarked = TextEncoding::Utf16Be.encode("żółw");
    assert_eq!(TextEncoding::decode_detecting(&unmarked, TextEncoding::Utf16Be)?, "żółw");
    Ok(())
}

#[test]
fn test_invalid_content() {
    assert_matches!(
        TextEncoding::Utf8.decode(&[0xC3, 0x28]),
        Err(Error::Decoding("UTF-8"))
    );
    assert_matches!(
        TextEncoding::Utf16Le.decode(&[0x41]),
        Err(Error::Decoding("UTF-16LE"))
    );
    // unpaired high surrogate
    assert_matches!(
        TextEncoding::Utf16Be.decode(&[0xD8, 0x00]),
        Err(Error::Decoding("UTF-16BE"))
    );
    assert_matches!(
        TextEncoding::Utf32Le.decode(&[0x00, 0x00, 0x11, 0x00]),
        Err(Error::Decoding("UTF-32LE"))
    );
}

#[test]
fn test_names() {
    assert_eq!(TextEncoding::default(), TextEncoding::Utf8);
    assert_eq!(TextEncoding::Utf8WithBom.to_string(), "UTF-8");
    assert_eq!(TextEncoding::Utf32Be.name(), "UTF-32BE");
}
