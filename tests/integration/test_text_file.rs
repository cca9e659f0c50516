// Copyright © 2024 Pathway

use abstract_files::culture::Culture;
use abstract_files::encoding::TextEncoding;
use abstract_files::text_file::{TextFileOptions, TextReader, DEFAULT_FILE_FLUSH_SIZE_KB};
use abstract_files::writer::FlushAction;

#[test]
fn test_reader_line_breaks() {
    let mut reader = TextReader::new("one\r\ntwo\nthree\rfour\n\nlast".to_string());
    let mut lines = Vec::new();
    while let Some(line) = reader.read_line() {
        lines.push(line);
    }
    assert_eq!(lines, ["one", "two", "three", "four", "", "last"]);
    assert!(reader.is_at_end());
    assert_eq!(reader.read_line(), None);
}

#[test]
fn test_reader_chars_and_rest() {
    let mut reader = TextReader::new("ąb\ncd".to_string());
    assert_eq!(reader.peek_char(), Some('ą'));
    assert_eq!(reader.read_char(), Some('ą'));
    assert_eq!(reader.read_line().as_deref(), Some("b"));
    assert_eq!(reader.read_to_end(), "cd");
    assert_eq!(reader.read_char(), None);
    assert_eq!(reader.read_to_end(), "");
}

#[test]
fn test_empty_reader() {
    let mut reader = TextReader::default();
    assert!(reader.is_at_end());
    assert_eq!(reader.peek_char(), None);
    assert_eq!(reader.read_line(), None);
}

#[test]
fn test_options_defaults() {
    let options = TextFileOptions::default();
    assert_eq!(options.effective_encoding(), TextEncoding::Utf8);
    assert_eq!(options.effective_flush_size_kb(), DEFAULT_FILE_FLUSH_SIZE_KB);
    assert_eq!(
        options.with_flush_size_kb(-3).effective_flush_size_kb(),
        DEFAULT_FILE_FLUSH_SIZE_KB
    );
}

#[test]
fn test_options_build_writer() -> eyre::Result<()> {
    let options = TextFileOptions::default()
        .with_culture(Culture::from_name("sv-SE")?)
        .with_encoding(TextEncoding::Utf32Le)
        .with_flush_size_kb(2);
    let flush_action: FlushAction = Box::new(|_: &str| Ok(()));
    let writer = options.build_writer(flush_action);
    assert_eq!(writer.culture().name(), "sv-SE");
    assert_eq!(writer.encoding(), TextEncoding::Utf32Le);
    assert_eq!(writer.flush_size(), 2048);
    Ok(())
}
