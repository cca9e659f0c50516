#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)] // too noisy

// FIXME:
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod culture;
pub mod descriptor;
pub mod encoding;
pub mod error;
pub mod registry;
pub mod storage;
pub mod text_file;
pub mod writer;

mod fs_helpers;

pub use culture::{format_composite, Culture, CultureFormat};
pub use descriptor::FileDescriptor;
pub use encoding::TextEncoding;
pub use error::{Error, Result};
pub use storage::FileStorage;
pub use text_file::{TextFile, TextFileOptions};
pub use writer::AutoFlushTextWriter;
