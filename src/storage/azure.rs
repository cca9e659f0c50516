// Copyright © 2024 Pathway

use azure_storage::{ConnectionString, StorageCredentials};
use azure_storage_blobs::prelude::{BlobClient, BlobServiceClient, ClientBuilder, ContainerClient};
use futures::stream::StreamExt;
use tokio::runtime::Runtime as TokioRuntime;

use crate::error::{Error, Result};
use crate::storage::blob::BlobStore;

/// [`BlobStore`] backed by an Azure Storage account.
///
/// The SDK is asynchronous; every call is driven to completion on a private
/// current-thread runtime, so the store is as blocking as the other backends.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct AzureBlobStore {
    account: String,
    credentials: StorageCredentials,
    runtime: TokioRuntime,
}

impl AzureBlobStore {
    pub fn new(account: String, credentials: StorageCredentials) -> Result<Self> {
        Ok(Self {
            account,
            credentials,
            runtime: tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?,
        })
    }

    /// Accepts a storage account connection string
    /// (`DefaultEndpointsProtocol=...;AccountName=...;AccountKey=...`).
    pub fn from_connection_string(connection_string: &str) -> Result<Self> {
        let parsed = ConnectionString::new(connection_string).map_err(Error::blob)?;
        let account = parsed
            .account_name
            .ok_or_else(|| Error::invalid_argument("connection string has no AccountName"))?
            .to_string();
        let credentials = parsed.storage_credentials().map_err(Error::blob)?;
        Self::new(account, credentials)
    }

    fn client_builder(&self) -> ClientBuilder {
        ClientBuilder::new(self.account.clone(), self.credentials.clone())
    }

    fn service_client(&self) -> BlobServiceClient {
        self.client_builder().blob_service_client()
    }

    fn container_client(&self, container: &str) -> ContainerClient {
        self.client_builder().container_client(container)
    }

    fn blob_client(&self, container: &str, blob: &str) -> BlobClient {
        self.client_builder().blob_client(container, blob)
    }
}

impl BlobStore for AzureBlobStore {
    fn list_containers(&self) -> Result<Vec<String>> {
        let service_client = self.service_client();
        self.runtime.block_on(async {
            let mut result = Vec::new();
            let mut stream = service_client.list_containers().into_stream();
            while let Some(page) = stream.next().await {
                let page = page.map_err(Error::blob)?;
                result.extend(page.containers.into_iter().map(|container| container.name));
            }
            Ok(result)
        })
    }

    fn container_exists(&self, container: &str) -> Result<bool> {
        let container_client = self.container_client(container);
        self.runtime
            .block_on(async { container_client.exists().await })
            .map_err(Error::blob)
    }

    fn create_container(&self, container: &str) -> Result<()> {
        let container_client = self.container_client(container);
        self.runtime
            .block_on(async { container_client.create().await })
            .map_err(Error::blob)
    }

    fn delete_container(&self, container: &str) -> Result<()> {
        let container_client = self.container_client(container);
        self.runtime
            .block_on(async { container_client.delete().await })
            .map_err(Error::blob)?;
        Ok(())
    }

    fn list_blobs(&self, container: &str) -> Result<Vec<String>> {
        let container_client = self.container_client(container);
        self.runtime.block_on(async {
            let mut result = Vec::new();
            let mut stream = container_client.list_blobs().into_stream();
            while let Some(next_blobs) = stream.next().await {
                let blob_list = next_blobs.map_err(Error::blob)?;
                for blob in blob_list.blobs.blobs() {
                    if blob.deleted.unwrap_or(false) {
                        continue;
                    }
                    result.push(blob.name.clone());
                }
            }
            Ok(result)
        })
    }

    fn blob_exists(&self, container: &str, blob: &str) -> Result<bool> {
        let blob_client = self.blob_client(container, blob);
        self.runtime
            .block_on(async { blob_client.exists().await })
            .map_err(Error::blob)
    }

    fn create_append_blob(&self, container: &str, blob: &str) -> Result<()> {
        let blob_client = self.blob_client(container, blob);
        self.runtime
            .block_on(async { blob_client.put_append_blob().await })
            .map_err(Error::blob)?;
        Ok(())
    }

    fn append_block(&self, container: &str, blob: &str, block: Vec<u8>) -> Result<()> {
        let blob_client = self.blob_client(container, blob);
        self.runtime
            .block_on(async { blob_client.append_block(block).await })
            .map_err(Error::blob)?;
        Ok(())
    }

    fn blob_size(&self, container: &str, blob: &str) -> Result<u64> {
        let blob_client = self.blob_client(container, blob);
        let properties = self
            .runtime
            .block_on(async { blob_client.get_properties().await })
            .map_err(Error::blob)?;
        Ok(properties.blob.properties.content_length)
    }

    fn read_blob(&self, container: &str, blob: &str) -> Result<Vec<u8>> {
        let blob_client = self.blob_client(container, blob);
        let mut result: Vec<u8> = vec![];
        let mut stream = blob_client.get().into_stream();
        self.runtime.block_on(async {
            while let Some(value) = stream.next().await {
                let mut body = value.map_err(Error::blob)?.data;
                while let Some(value) = body.next().await {
                    let value = value.map_err(Error::blob)?;
                    result.extend(&value);
                }
            }
            Ok(result)
        })
    }

    fn delete_blob(&self, container: &str, blob: &str) -> Result<()> {
        let blob_client = self.blob_client(container, blob);
        self.runtime
            .block_on(async { blob_client.delete().await })
            .map_err(Error::blob)?;
        Ok(())
    }
}
