// Copyright © 2024 Pathway

use log::warn;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::storage::blob::BlobStore;

#[derive(Debug, Default)]
struct MemoryBlob {
    content: Vec<u8>,
    blocks: usize,
}

type Containers = BTreeMap<String, BTreeMap<String, MemoryBlob>>;

/// Blob service kept in process memory. Serves as a local emulator of a
/// cloud blob container and as the blob backend of tests.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct MemoryBlobStore {
    containers: Mutex<Containers>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn containers(&self) -> MutexGuard<'_, Containers> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of append blocks the blob has received since it was created.
    pub fn block_count(&self, container: &str, blob: &str) -> Option<usize> {
        self.containers()
            .get(container)
            .and_then(|blobs| blobs.get(blob))
            .map(|blob| blob.blocks)
    }
}

fn no_container(container: &str) -> Error {
    Error::NotFound(format!("container {container:?}"))
}

fn no_blob(container: &str, blob: &str) -> Error {
    Error::NotFound(format!("blob {container}/{blob}"))
}

impl BlobStore for MemoryBlobStore {
    fn list_containers(&self) -> Result<Vec<String>> {
        Ok(self.containers().keys().cloned().collect())
    }

    fn container_exists(&self, container: &str) -> Result<bool> {
        Ok(self.containers().contains_key(container))
    }

    fn create_container(&self, container: &str) -> Result<()> {
        let mut containers = self.containers();
        if containers.contains_key(container) {
            return Err(Error::AlreadyExists(container.to_string()));
        }
        containers.insert(container.to_string(), BTreeMap::new());
        Ok(())
    }

    fn delete_container(&self, container: &str) -> Result<()> {
        if self.containers().remove(container).is_none() {
            warn!("The container '{container}' was requested to be removed, but it doesn't exist.");
            return Err(no_container(container));
        }
        Ok(())
    }

    fn list_blobs(&self, container: &str) -> Result<Vec<String>> {
        self.containers()
            .get(container)
            .map(|blobs| blobs.keys().cloned().collect())
            .ok_or_else(|| no_container(container))
    }

    fn blob_exists(&self, container: &str, blob: &str) -> Result<bool> {
        Ok(self
            .containers()
            .get(container)
            .is_some_and(|blobs| blobs.contains_key(blob)))
    }

    fn create_append_blob(&self, container: &str, blob: &str) -> Result<()> {
        self.containers()
            .get_mut(container)
            .ok_or_else(|| no_container(container))?
            .insert(blob.to_string(), MemoryBlob::default());
        Ok(())
    }

    fn append_block(&self, container: &str, blob: &str, block: Vec<u8>) -> Result<()> {
        let mut containers = self.containers();
        let target = containers
            .get_mut(container)
            .ok_or_else(|| no_container(container))?
            .get_mut(blob)
            .ok_or_else(|| no_blob(container, blob))?;
        target.content.extend(block);
        target.blocks += 1;
        Ok(())
    }

    fn blob_size(&self, container: &str, blob: &str) -> Result<u64> {
        self.containers()
            .get(container)
            .and_then(|blobs| blobs.get(blob))
            .map(|blob| blob.content.len() as u64)
            .ok_or_else(|| no_blob(container, blob))
    }

    fn read_blob(&self, container: &str, blob: &str) -> Result<Vec<u8>> {
        self.containers()
            .get(container)
            .and_then(|blobs| blobs.get(blob))
            .map(|blob| blob.content.clone())
            .ok_or_else(|| no_blob(container, blob))
    }

    fn delete_blob(&self, container: &str, blob: &str) -> Result<()> {
        self.containers()
            .get_mut(container)
            .ok_or_else(|| no_container(container))?
            .remove(blob)
            .map(|_| ())
            .ok_or_else(|| no_blob(container, blob))
    }
}
