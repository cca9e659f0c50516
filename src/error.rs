// Copyright © 2024 Pathway

use std::error;
use std::io::Error as IoError;
use std::result;

use serde_json::Error as JsonParseError;

#[allow(clippy::module_name_repetitions)]
pub type DynError = Box<dyn error::Error + Send + Sync>;
pub type Result<T, E = Error> = result::Result<T, E>;

/// The mode a text file handle was opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleMode {
    Read,
    Write,
    Closed,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("container {0:?} already exists, it cannot be created")]
    AlreadyExists(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("container {0:?} is not empty, it cannot be removed")]
    NotEmpty(String),

    #[error("the file handle is in {actual:?} mode, {requested:?} mode is required")]
    WrongMode {
        requested: HandleMode,
        actual: HandleMode,
    },

    #[error("format string {0:?} is malformed: {1}")]
    Format(String, &'static str),

    #[error("an earlier flush failed, the writer no longer accepts text")]
    WriterFailed,

    #[error("content is not valid {0} text")]
    Decoding(&'static str),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("blob storage request failed: {0}")]
    Blob(#[source] DynError),

    #[error("settings file is incorrectly formatted: {0}")]
    Json(#[from] JsonParseError),
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn blob(err: impl Into<DynError>) -> Self {
        Self::Blob(err.into())
    }
}
