// Copyright © 2024 Pathway

//! Handles to open text files.
//!
//! A handle is either a writer or a reader, never both. Backends implement
//! [`TextFile`] on their own handle types and keep the common state in a
//! [`TextFileState`].

use std::fmt::Debug;
use std::mem;

use crate::culture::Culture;
use crate::descriptor::FileDescriptor;
use crate::encoding::TextEncoding;
use crate::error::{Error, HandleMode, Result};
use crate::writer::{AutoFlushTextWriter, FlushAction};

/// Flush size used by the file-opening operations when none is requested.
/// It is applied before the writer is built, so the writer's own default is
/// never reached through a file handle.
pub const DEFAULT_FILE_FLUSH_SIZE_KB: i32 = 4096;

/// Optional settings for `create_text`, `append_text` and
/// `create_or_append_text`.
#[derive(Debug, Clone, Default)]
pub struct TextFileOptions {
    pub culture: Option<Culture>,
    pub encoding: Option<TextEncoding>,
    /// Kilobytes; zero or less selects [`DEFAULT_FILE_FLUSH_SIZE_KB`].
    pub flush_size_kb: i32,
}

impl TextFileOptions {
    #[must_use]
    pub fn with_culture(mut self, culture: Culture) -> Self {
        self.culture = Some(culture);
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    #[must_use]
    pub fn with_flush_size_kb(mut self, flush_size_kb: i32) -> Self {
        self.flush_size_kb = flush_size_kb;
        self
    }

    pub fn effective_encoding(&self) -> TextEncoding {
        self.encoding.unwrap_or_default()
    }

    pub fn effective_flush_size_kb(&self) -> i32 {
        if self.flush_size_kb <= 0 {
            DEFAULT_FILE_FLUSH_SIZE_KB
        } else {
            self.flush_size_kb
        }
    }

    /// Builds the writer of a file handle around a backend flush action.
    pub fn build_writer(&self, flush_action: FlushAction) -> AutoFlushTextWriter {
        AutoFlushTextWriter::new(
            self.culture.clone().unwrap_or_default(),
            self.effective_encoding(),
            flush_action,
            self.effective_flush_size_kb(),
        )
    }
}

/// Capability set of an open text file.
pub trait TextFile: Send + Debug {
    fn descriptor(&self) -> &FileDescriptor;

    fn mode(&self) -> HandleMode;

    /// The writer of a handle opened by create or append.
    fn writer(&mut self) -> Result<&mut AutoFlushTextWriter>;

    /// The reader of a handle opened by `open_text`.
    fn reader(&mut self) -> Result<&mut TextReader>;

    /// Pushes buffered text down to the backend.
    fn flush(&mut self) -> Result<()>;

    /// Flushes and releases the underlying resource. Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;
}

/// Reader over the complete decoded content of a file.
#[derive(Debug, Clone, Default)]
pub struct TextReader {
    content: String,
    position: usize,
}

impl TextReader {
    pub fn new(content: String) -> Self {
        Self {
            content,
            position: 0,
        }
    }

    fn remaining(&self) -> &str {
        &self.content[self.position..]
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.content.len()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub fn read_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Reads up to the next line break; `\n`, `\r\n` and a lone `\r` all end
    /// a line and are not part of the result.
    pub fn read_line(&mut self) -> Option<String> {
        if self.is_at_end() {
            return None;
        }
        let remaining = self.remaining();
        let (line, consumed) = match remaining.find(['\n', '\r']) {
            Some(end) => {
                let terminator_len = if remaining[end..].starts_with("\r\n") { 2 } else { 1 };
                (remaining[..end].to_string(), end + terminator_len)
            }
            None => (remaining.to_string(), remaining.len()),
        };
        self.position += consumed;
        Some(line)
    }

    /// Returns everything not read yet.
    pub fn read_to_end(&mut self) -> String {
        let rest = self.remaining().to_string();
        self.position = self.content.len();
        rest
    }
}

/// Mode-dependent part of a handle shared by the backend implementations.
#[derive(Debug)]
pub enum TextFileState {
    Writing(AutoFlushTextWriter),
    Reading(TextReader),
    Closed,
}

impl TextFileState {
    pub fn mode(&self) -> HandleMode {
        match self {
            Self::Writing(_) => HandleMode::Write,
            Self::Reading(_) => HandleMode::Read,
            Self::Closed => HandleMode::Closed,
        }
    }

    pub fn writer(&mut self) -> Result<&mut AutoFlushTextWriter> {
        match self {
            Self::Writing(writer) => Ok(writer),
            other => Err(Error::WrongMode {
                requested: HandleMode::Write,
                actual: other.mode(),
            }),
        }
    }

    pub fn reader(&mut self) -> Result<&mut TextReader> {
        match self {
            Self::Reading(reader) => Ok(reader),
            other => Err(Error::WrongMode {
                requested: HandleMode::Read,
                actual: other.mode(),
            }),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match self {
            Self::Writing(writer) => writer.flush(),
            Self::Reading(_) | Self::Closed => Ok(()),
        }
    }

    /// Flushes the writer and moves to the closed state.
    ///
    /// The state becomes closed even if the final flush fails; the writer,
    /// and with it the backend resource held by its flush action, is
    /// released either way.
    pub fn close(&mut self) -> Result<()> {
        match mem::replace(self, Self::Closed) {
            Self::Writing(mut writer) => writer.flush(),
            Self::Reading(_) | Self::Closed => Ok(()),
        }
    }
}
