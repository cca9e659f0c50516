// Copyright © 2024 Pathway

use std::fmt;
use std::fmt::Write as _;

use log::{error, trace};

use crate::culture::{format_composite, Culture, CultureFormat};
use crate::encoding::TextEncoding;
use crate::error::{Error, Result};

/// Flush size used by a writer constructed with a non-positive size.
pub const DEFAULT_WRITER_FLUSH_SIZE_KB: usize = 1024;

const NEW_LINE: &str = "\n";

/// Receives the buffered text whenever the writer flushes.
pub type FlushAction = Box<dyn FnMut(&str) -> Result<()> + Send>;

/// A text writer that keeps everything in memory and hands the accumulated
/// text to a [`FlushAction`] once it grows past the flush size.
///
/// Every write call performs exactly one flush check, so
/// [`flush_check_count`](Self::flush_check_count) always equals the number of
/// successful write calls.
///
/// A flush action may fail after part of the text already reached its sink,
/// so a failed flush is never retried: the buffer is discarded and every later
/// write or flush fails with [`Error::WriterFailed`].
pub struct AutoFlushTextWriter {
    culture: Culture,
    encoding: TextEncoding,
    flush_action: FlushAction,
    flush_size: usize,
    buffer: String,
    flush_check_count: usize,
    flush_count: usize,
    failed: bool,
}

impl AutoFlushTextWriter {
    /// `flush_size_kb` is in kilobytes; zero or less selects
    /// [`DEFAULT_WRITER_FLUSH_SIZE_KB`].
    pub fn new(
        culture: Culture,
        encoding: TextEncoding,
        flush_action: FlushAction,
        flush_size_kb: i32,
    ) -> Self {
        let flush_size_kb = usize::try_from(flush_size_kb)
            .ok()
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_WRITER_FLUSH_SIZE_KB);
        Self {
            culture,
            encoding,
            flush_action,
            flush_size: flush_size_kb.saturating_mul(1024),
            buffer: String::new(),
            flush_check_count: 0,
            flush_count: 0,
            failed: false,
        }
    }

    /// The effective flush threshold in bytes.
    pub fn flush_size(&self) -> usize {
        self.flush_size
    }

    pub fn flush_check_count(&self) -> usize {
        self.flush_check_count
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    pub fn culture(&self) -> &Culture {
        &self.culture
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Whether a flush action has failed; such a writer accepts nothing more.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Text written but not yet handed to the flush action.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.failed {
            return Err(Error::WriterFailed);
        }
        Ok(())
    }

    pub fn write(&mut self, value: impl CultureFormat) -> Result<()> {
        self.ensure_usable()?;
        value.format_to(&self.culture, &mut self.buffer);
        self.auto_flush()
    }

    pub fn write_line(&mut self, value: impl CultureFormat) -> Result<()> {
        self.ensure_usable()?;
        value.format_to(&self.culture, &mut self.buffer);
        self.buffer.push_str(NEW_LINE);
        self.auto_flush()
    }

    pub fn write_chars(&mut self, chars: &[char]) -> Result<()> {
        self.ensure_usable()?;
        self.buffer.extend(chars);
        self.auto_flush()
    }

    /// Writes `count` characters of `chars` starting at `index`.
    pub fn write_chars_range(&mut self, chars: &[char], index: usize, count: usize) -> Result<()> {
        let slice = index
            .checked_add(count)
            .and_then(|end| chars.get(index..end))
            .ok_or_else(|| {
                Error::invalid_argument(format!(
                    "range {index}..{index}+{count} is outside of a buffer of {} characters",
                    chars.len()
                ))
            })?;
        self.write_chars(slice)
    }

    /// Writes any value through its [`Display`](fmt::Display) implementation.
    pub fn write_display(&mut self, value: impl fmt::Display) -> Result<()> {
        self.write_fmt(format_args!("{value}"))
    }

    /// Writes a composite format string, see [`format_composite`].
    pub fn write_format(&mut self, template: &str, args: &[&dyn CultureFormat]) -> Result<()> {
        self.ensure_usable()?;
        let rendered = format_composite(template, args, &self.culture)?;
        self.buffer.push_str(&rendered);
        self.auto_flush()
    }

    /// Lets the `write!` macro target the writer directly.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.ensure_usable()?;
        self.buffer
            .write_fmt(args)
            .map_err(|_| Error::invalid_argument("a formatting trait implementation failed"))?;
        self.auto_flush()
    }

    /// Hands any buffered text to the flush action regardless of the flush size.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_usable()?;
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.flush_buffer()
    }

    fn auto_flush(&mut self) -> Result<()> {
        self.flush_check_count += 1;
        if self.buffer.len() >= self.flush_size {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<()> {
        trace!("Flushing {} buffered bytes", self.buffer.len());
        if let Err(err) = (self.flush_action)(&self.buffer) {
            // part of the buffer may already be in the sink, resending it would duplicate text
            error!(
                "Flush of {} buffered bytes failed, discarding them: {err}",
                self.buffer.len()
            );
            self.buffer.clear();
            self.failed = true;
            return Err(err);
        }
        self.flush_count += 1;
        self.buffer.clear();
        Ok(())
    }
}

impl fmt::Debug for AutoFlushTextWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoFlushTextWriter")
            .field("culture", &self.culture.name())
            .field("encoding", &self.encoding)
            .field("flush_size", &self.flush_size)
            .field("buffered", &self.buffer.len())
            .field("flush_check_count", &self.flush_check_count)
            .field("flush_count", &self.flush_count)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}
