// Copyright © 2024 Pathway

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, error, info};

use crate::descriptor::FileDescriptor;
use crate::encoding::TextEncoding;
use crate::error::{Error, HandleMode, Result};
use crate::storage::{checked_component, FileStorage};
use crate::text_file::{TextFile, TextFileOptions, TextFileState, TextReader};
use crate::writer::{AutoFlushTextWriter, FlushAction};

/// Largest block a single append operation may carry.
pub const MAX_APPEND_BLOCK_SIZE: usize = 4 * 1024 * 1024;

const ROOT_CONTAINER_NAME: &str = "$root";
const BLOB_NAME_SEPARATOR: &str = "/";

/// Primitive operations of a blob service that offers append blobs.
///
/// Names given to a `BlobStore` are already normalized by
/// [`BlobFileStorage`]. Operations on a missing container or blob fail with
/// `NotFound` unless stated otherwise.
pub trait BlobStore: Send + Sync + Debug {
    fn list_containers(&self) -> Result<Vec<String>>;

    fn container_exists(&self, container: &str) -> Result<bool>;

    fn create_container(&self, container: &str) -> Result<()>;

    /// Deletes the container with all of its blobs.
    fn delete_container(&self, container: &str) -> Result<()>;

    fn list_blobs(&self, container: &str) -> Result<Vec<String>>;

    /// Returns `false` when either the blob or its container is missing.
    fn blob_exists(&self, container: &str, blob: &str) -> Result<bool>;

    /// Creates an empty append blob, replacing an existing blob of that name.
    fn create_append_blob(&self, container: &str, blob: &str) -> Result<()>;

    /// Adds `block` to the end of an existing append blob.
    fn append_block(&self, container: &str, blob: &str, block: Vec<u8>) -> Result<()>;

    fn blob_size(&self, container: &str, blob: &str) -> Result<u64>;

    fn read_blob(&self, container: &str, blob: &str) -> Result<Vec<u8>>;

    fn delete_blob(&self, container: &str, blob: &str) -> Result<()>;
}

/// Storage that keeps every text file in an append blob.
///
/// Container names are lower-cased, the empty container is the service's
/// root container, and the path segments and file name form the blob name.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct BlobFileStorage {
    store: Arc<dyn BlobStore>,
}

impl BlobFileStorage {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// The empty container is the service's root container.
    pub fn container_name(container: &str) -> Result<String> {
        if container.is_empty() {
            Ok(ROOT_CONTAINER_NAME.to_string())
        } else {
            Ok(checked_component(container)?.to_lowercase())
        }
    }

    /// Segments and file name joined with `/`. Each of them must be a single
    /// path component, so distinct descriptors never share a blob.
    pub fn blob_name(file: &FileDescriptor) -> Result<String> {
        let mut parts = Vec::with_capacity(file.path_segments().len() + 1);
        for segment in file.path_segments() {
            parts.push(checked_component(segment)?);
        }
        parts.push(checked_component(file.file_name())?);
        Ok(parts.join(BLOB_NAME_SEPARATOR))
    }

    fn append_encoded(&self, container: &str, blob: &str, bytes: &[u8]) -> Result<usize> {
        let mut blocks = 0;
        for block in bytes.chunks(MAX_APPEND_BLOCK_SIZE) {
            self.store.append_block(container, blob, block.to_vec())?;
            blocks += 1;
        }
        Ok(blocks)
    }

    fn open_for_writing(
        &self,
        descriptor: &FileDescriptor,
        container: String,
        blob: String,
        options: &TextFileOptions,
    ) -> Box<dyn TextFile> {
        let appended_blocks = Arc::new(AtomicUsize::new(0));
        let encoding = options.effective_encoding();
        let storage = self.clone();
        let sink_container = container.clone();
        let sink_blob = blob.clone();
        let sink_blocks = appended_blocks.clone();
        let flush_action: FlushAction = Box::new(move |content: &str| {
            let blocks =
                storage.append_encoded(&sink_container, &sink_blob, &encoding.encode(content))?;
            sink_blocks.fetch_add(blocks, Ordering::Relaxed);
            Ok(())
        });
        Box::new(BlobTextFile {
            descriptor: descriptor.clone(),
            container,
            blob,
            appended_blocks,
            state: TextFileState::Writing(options.build_writer(flush_action)),
        })
    }
}

impl FileStorage for BlobFileStorage {
    fn list_containers(&self) -> Result<Vec<String>> {
        let mut containers = self.store.list_containers()?;
        containers.sort();
        Ok(containers)
    }

    fn container_exists(&self, container: &str) -> Result<bool> {
        self.store.container_exists(&Self::container_name(container)?)
    }

    fn create_container(&self, container: &str) -> Result<()> {
        let name = Self::container_name(container)?;
        if self.store.container_exists(&name)? {
            return Err(Error::AlreadyExists(name));
        }
        self.store.create_container(&name)?;
        info!("Created blob container {name}");
        Ok(())
    }

    fn remove_container(&self, container: &str, erase_contents: bool) -> Result<bool> {
        let name = Self::container_name(container)?;
        if !self.store.container_exists(&name)? {
            return Ok(false);
        }
        if !erase_contents && !self.store.list_blobs(&name)?.is_empty() {
            return Err(Error::NotEmpty(name));
        }
        self.store.delete_container(&name)?;
        info!("Removed blob container {name}");
        Ok(true)
    }

    fn exists(&self, file: &FileDescriptor) -> Result<bool> {
        let container = Self::container_name(file.container())?;
        let blob = Self::blob_name(file)?;
        Ok(self.store.container_exists(&container)? && self.store.blob_exists(&container, &blob)?)
    }

    fn delete_file(&self, file: &FileDescriptor) -> Result<bool> {
        if !self.exists(file)? {
            return Ok(false);
        }
        let container = Self::container_name(file.container())?;
        self.store.delete_blob(&container, &Self::blob_name(file)?)?;
        Ok(true)
    }

    fn open_text(
        &self,
        file: &FileDescriptor,
        encoding: Option<TextEncoding>,
    ) -> Result<Box<dyn TextFile>> {
        if !self.exists(file)? {
            return Err(Error::NotFound(format!("blob {file}")));
        }
        let container = Self::container_name(file.container())?;
        let blob = Self::blob_name(file)?;
        let bytes = self.store.read_blob(&container, &blob)?;
        let content = TextEncoding::decode_detecting(&bytes, encoding.unwrap_or_default())?;
        debug!("Read {} bytes from blob {container}/{blob}", bytes.len());
        Ok(Box::new(BlobTextFile {
            descriptor: file.clone(),
            container,
            blob,
            appended_blocks: Arc::new(AtomicUsize::new(0)),
            state: TextFileState::Reading(TextReader::new(content)),
        }))
    }

    fn create_text(
        &self,
        file: &FileDescriptor,
        options: &TextFileOptions,
    ) -> Result<Box<dyn TextFile>> {
        let container = Self::container_name(file.container())?;
        let blob = Self::blob_name(file)?;
        if !self.store.container_exists(&container)? {
            self.store.create_container(&container)?;
            info!("Created blob container {container}");
        }
        self.store.create_append_blob(&container, &blob)?;
        self.append_encoded(&container, &blob, options.effective_encoding().preamble())?;
        debug!("Created append blob {container}/{blob}");
        Ok(self.open_for_writing(file, container, blob, options))
    }

    fn append_text(
        &self,
        file: &FileDescriptor,
        options: &TextFileOptions,
    ) -> Result<Box<dyn TextFile>> {
        if !self.exists(file)? {
            return Err(Error::NotFound(format!("blob {file}")));
        }
        let container = Self::container_name(file.container())?;
        let blob = Self::blob_name(file)?;
        if self.store.blob_size(&container, &blob)? == 0 {
            self.append_encoded(&container, &blob, options.effective_encoding().preamble())?;
        }
        debug!("Opened append blob {container}/{blob} for append");
        Ok(self.open_for_writing(file, container, blob, options))
    }
}

/// Handle of a text file kept in an append blob.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct BlobTextFile {
    descriptor: FileDescriptor,
    container: String,
    blob: String,
    appended_blocks: Arc<AtomicUsize>,
    state: TextFileState,
}

impl BlobTextFile {
    /// Number of append operations issued through this handle.
    pub fn appended_blocks(&self) -> usize {
        self.appended_blocks.load(Ordering::Relaxed)
    }
}

impl TextFile for BlobTextFile {
    fn descriptor(&self) -> &FileDescriptor {
        &self.descriptor
    }

    fn mode(&self) -> HandleMode {
        self.state.mode()
    }

    fn writer(&mut self) -> Result<&mut AutoFlushTextWriter> {
        self.state.writer()
    }

    fn reader(&mut self) -> Result<&mut TextReader> {
        self.state.reader()
    }

    fn flush(&mut self) -> Result<()> {
        self.state.flush()
    }

    fn close(&mut self) -> Result<()> {
        let was_writing = self.mode() == HandleMode::Write;
        self.state.close()?;
        if was_writing {
            debug!(
                "Closed append blob {}/{} after {} append blocks",
                self.container,
                self.blob,
                self.appended_blocks()
            );
        }
        Ok(())
    }
}

impl Drop for BlobTextFile {
    fn drop(&mut self) {
        if self.mode() == HandleMode::Closed {
            return;
        }
        if let Err(e) = self.close() {
            error!("Failed to close blob {}/{}: {e}", self.container, self.blob);
        }
    }
}
