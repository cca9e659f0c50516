// Copyright © 2024 Pathway

use std::fmt;

use crate::error::{Error, Result};

/// Backend-independent address of a file: a container, the path segments
/// under it and the file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileDescriptor {
    container: String,
    path_segments: Vec<String>,
    file_name: String,
}

impl FileDescriptor {
    pub fn new<I, S>(container: &str, path_segments: I, file_name: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if file_name.trim().is_empty() {
            return Err(Error::invalid_argument(
                "file name cannot be empty or whitespace only",
            ));
        }
        Ok(Self {
            container: container.to_string(),
            path_segments: path_segments.into_iter().map(Into::into).collect(),
            file_name: file_name.to_string(),
        })
    }

    /// A file placed directly into `container`.
    pub fn in_container(container: &str, file_name: &str) -> Result<Self> {
        Self::new(container, std::iter::empty::<String>(), file_name)
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.container.is_empty() {
            write!(f, "{}/", self.container)?;
        }
        for segment in &self.path_segments {
            write!(f, "{segment}/")?;
        }
        f.write_str(&self.file_name)
    }
}
