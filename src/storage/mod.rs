// Copyright © 2024 Pathway

use std::fmt::Debug;

use crate::descriptor::FileDescriptor;
use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::text_file::{TextFile, TextFileOptions};

pub use blob::{BlobFileStorage, BlobStore, BlobTextFile, MAX_APPEND_BLOCK_SIZE};
pub use local::{LocalFileStorage, LocalTextFile};
pub use memory::MemoryBlobStore;

#[cfg(feature = "azure")]
pub use azure::AzureBlobStore;

pub mod blob;
pub mod local;
pub mod memory;

#[cfg(feature = "azure")]
pub mod azure;

/// Rejects names that cannot be one level of a container, path or blob name.
pub(crate) fn checked_component(component: &str) -> Result<&str> {
    if component.is_empty()
        || component == "."
        || component == ".."
        || component.contains(['/', '\\'])
    {
        return Err(Error::invalid_argument(format!(
            "{component:?} cannot be used as a path component"
        )));
    }
    Ok(component)
}

/// A storage that keeps text files in containers.
///
/// Every backend implements this contract with the same externally
/// observable semantics, so callers never depend on backend-specific types.
///
/// Segments and file names are single path components on every backend:
/// `.`, `..` and names containing `/` or `\` fail with `InvalidArgument`.
/// The empty container differs. On the local backend files of the empty
/// container sit directly in the root folder, while container operations
/// on `""` fail with `InvalidArgument`. The blob backend maps `""` to the
/// service's `$root` container for every operation.
pub trait FileStorage: Send + Sync + Debug {
    /// Names of the containers in the storage, sorted.
    fn list_containers(&self) -> Result<Vec<String>>;

    fn container_exists(&self, container: &str) -> Result<bool>;

    /// Creates a new container; fails with `AlreadyExists` if it is present.
    fn create_container(&self, container: &str) -> Result<()>;

    /// Creates the container unless it already exists.
    fn ensure_container(&self, container: &str) -> Result<()> {
        if !self.container_exists(container)? {
            self.create_container(container)?;
        }
        Ok(())
    }

    /// Removes a container together with everything below it.
    ///
    /// Returns `false` if there was no such container. A container with
    /// contents is only removed when `erase_contents` is set, otherwise the
    /// call fails with `NotEmpty`.
    fn remove_container(&self, container: &str, erase_contents: bool) -> Result<bool>;

    /// Checks the file; a missing container means a missing file.
    fn exists(&self, file: &FileDescriptor) -> Result<bool>;

    /// Returns `true` iff the file existed and has been removed.
    fn delete_file(&self, file: &FileDescriptor) -> Result<bool>;

    /// Opens an existing file for reading. A byte-order mark in the file
    /// overrides `encoding`, which defaults to UTF-8.
    fn open_text(
        &self,
        file: &FileDescriptor,
        encoding: Option<TextEncoding>,
    ) -> Result<Box<dyn TextFile>>;

    /// Creates the file, replacing any previous content.
    fn create_text(
        &self,
        file: &FileDescriptor,
        options: &TextFileOptions,
    ) -> Result<Box<dyn TextFile>>;

    /// Opens an existing file for appending; fails with `NotFound` if missing.
    fn append_text(
        &self,
        file: &FileDescriptor,
        options: &TextFileOptions,
    ) -> Result<Box<dyn TextFile>>;

    fn create_or_append_text(
        &self,
        file: &FileDescriptor,
        options: &TextFileOptions,
    ) -> Result<Box<dyn TextFile>> {
        if self.exists(file)? {
            self.append_text(file, options)
        } else {
            self.create_text(file, options)
        }
    }
}
