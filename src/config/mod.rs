// Copyright © 2024 Pathway

#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;

use log::info;

use crate::error::{Error, Result};
use crate::storage::{BlobFileStorage, BlobStore, FileStorage, LocalFileStorage, MemoryBlobStore};

pub use app_settings::{
    AppSettingsReader, EnvironmentProvider, SystemEnvironment, MACHINE_PREFIXES_KEY,
};
pub use env::EnvConfigurationReader;

pub mod app_settings;
pub mod env;

/// Storage info of the form `appSettingsKey=<category>.<key>` names the
/// setting that holds the real value.
pub const SETTINGS_KEY_REFERENCE: &str = "appSettingsKey";

pub const STORAGE_KIND_KEY: &str = "Kind";
pub const ROOT_FOLDER_KEY: &str = "RootFolder";
pub const STORAGE_INFO_KEY: &str = "StorageInfo";

/// Source of `(category, key)` settings.
pub trait ConfigurationReader: Send + Sync {
    fn get_configuration_value(&self, category: &str, key: &str) -> Option<String>;
}

/// Follows an `appSettingsKey=<category>.<key>` reference; any other storage
/// info is returned as is.
pub fn resolve_storage_info(info: &str, reader: &dyn ConfigurationReader) -> Result<String> {
    if info.trim().is_empty() {
        return Err(Error::invalid_argument("storage info cannot be empty"));
    }
    let Some((SETTINGS_KEY_REFERENCE, setting)) = info.split_once('=') else {
        return Ok(info.to_string());
    };
    if setting.contains('=') {
        // a connection string that happens to start with the reference word
        return Ok(info.to_string());
    }
    let (category, key) = setting.split_once('.').ok_or_else(|| {
        Error::invalid_argument(format!(
            "setting reference {setting:?} must have the form <category>.<key>"
        ))
    })?;
    reader
        .get_configuration_value(category, key)
        .ok_or_else(|| Error::NotFound(format!("setting {setting:?}")))
}

fn required_value(reader: &dyn ConfigurationReader, category: &str, key: &str) -> Result<String> {
    reader
        .get_configuration_value(category, key)
        .ok_or_else(|| Error::NotFound(format!("setting \"{category}.{key}\"")))
}

/// The configuration of the backend that stores the files.
#[derive(Debug, Clone)]
pub enum FileStorageConfig {
    Local(PathBuf),
    Blob(Arc<dyn BlobStore>),
    #[cfg(feature = "azure")]
    Azure { connection_string: String },
}

impl FileStorageConfig {
    /// Reads the backend from the settings of `category`:
    /// `Kind` is `local` (with `RootFolder`), `memory`, or `azure` (with
    /// `StorageInfo`, which may be an `appSettingsKey=` reference).
    pub fn from_configuration(reader: &dyn ConfigurationReader, category: &str) -> Result<Self> {
        let kind = required_value(reader, category, STORAGE_KIND_KEY)?;
        match kind.to_lowercase().as_str() {
            "local" => {
                let root_folder = required_value(reader, category, ROOT_FOLDER_KEY)?;
                Ok(Self::Local(PathBuf::from(root_folder)))
            }
            "memory" => Ok(Self::Blob(Arc::new(MemoryBlobStore::new()))),
            #[cfg(feature = "azure")]
            "azure" => {
                let storage_info = required_value(reader, category, STORAGE_INFO_KEY)?;
                Ok(Self::Azure {
                    connection_string: resolve_storage_info(&storage_info, reader)?,
                })
            }
            other => Err(Error::invalid_argument(format!(
                "unsupported storage kind {other:?}"
            ))),
        }
    }

    pub fn create(&self) -> Result<Box<dyn FileStorage>> {
        let storage: Box<dyn FileStorage> = match self {
            Self::Local(root_folder) => Box::new(LocalFileStorage::new(root_folder)?),
            Self::Blob(store) => Box::new(BlobFileStorage::new(store.clone())),
            #[cfg(feature = "azure")]
            Self::Azure { connection_string } => Box::new(BlobFileStorage::new(Arc::new(
                crate::storage::AzureBlobStore::from_connection_string(connection_string)?,
            ))),
        };
        info!("Created {} file storage", self.kind());
        Ok(storage)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::Blob(_) => "blob",
            #[cfg(feature = "azure")]
            Self::Azure { .. } => "azure",
        }
    }
}
