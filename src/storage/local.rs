// Copyright © 2024 Pathway

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::descriptor::FileDescriptor;
use crate::encoding::TextEncoding;
use crate::error::{Error, HandleMode, Result};
use crate::fs_helpers::{ensure_directory, is_directory_empty};
use crate::storage::{checked_component, FileStorage};
use crate::text_file::{TextFile, TextFileOptions, TextFileState, TextReader};
use crate::writer::{AutoFlushTextWriter, FlushAction};

/// Storage over a folder of the local filesystem. Containers are the direct
/// subdirectories of the root folder.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct LocalFileStorage {
    root_folder: PathBuf,
}

impl LocalFileStorage {
    /// Opens the storage, creating the root folder if it doesn't exist yet.
    pub fn new(root_folder: &Path) -> Result<Self> {
        if root_folder.as_os_str().is_empty() {
            return Err(Error::invalid_argument("root folder cannot be empty"));
        }
        ensure_directory(root_folder)?;
        Ok(Self {
            root_folder: root_folder.to_path_buf(),
        })
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Full path of the file on disk.
    pub fn file_path(&self, file: &FileDescriptor) -> Result<PathBuf> {
        let mut path = self.root_folder.clone();
        if !file.container().is_empty() {
            path.push(checked_component(file.container())?);
        }
        for segment in file.path_segments() {
            path.push(checked_component(segment)?);
        }
        path.push(checked_component(file.file_name())?);
        Ok(path)
    }

    fn container_path(&self, container: &str) -> Result<PathBuf> {
        Ok(self.root_folder.join(checked_component(container)?))
    }

    fn write_preamble(file: &mut File, encoding: TextEncoding) -> Result<()> {
        let preamble = encoding.preamble();
        if !preamble.is_empty() {
            file.write_all(preamble)?;
        }
        Ok(())
    }

    fn open_for_writing(
        descriptor: &FileDescriptor,
        path: PathBuf,
        file: File,
        options: &TextFileOptions,
    ) -> Result<Box<dyn TextFile>> {
        let mut sink = file.try_clone()?;
        let encoding = options.effective_encoding();
        let flush_action: FlushAction = Box::new(move |content: &str| {
            sink.write_all(&encoding.encode(content))?;
            Ok(())
        });
        Ok(Box::new(LocalTextFile::writing(
            descriptor.clone(),
            path,
            file,
            options.build_writer(flush_action),
        )))
    }
}

impl FileStorage for LocalFileStorage {
    fn list_containers(&self) -> Result<Vec<String>> {
        let mut containers = Vec::new();
        for entry in std::fs::read_dir(&self.root_folder)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => containers.push(name),
                Err(name) => warn!("The folder name is not UTF-8 encoded: {name:?}"),
            }
        }
        containers.sort();
        Ok(containers)
    }

    fn container_exists(&self, container: &str) -> Result<bool> {
        Ok(self.container_path(container)?.is_dir())
    }

    fn create_container(&self, container: &str) -> Result<()> {
        let path = self.container_path(container)?;
        if path.is_dir() {
            return Err(Error::AlreadyExists(container.to_string()));
        }
        std::fs::create_dir(&path)?;
        info!("Created container folder {}", path.display());
        Ok(())
    }

    fn remove_container(&self, container: &str, erase_contents: bool) -> Result<bool> {
        let path = self.container_path(container)?;
        if !path.is_dir() {
            return Ok(false);
        }
        if !erase_contents && !is_directory_empty(&path)? {
            return Err(Error::NotEmpty(container.to_string()));
        }
        std::fs::remove_dir_all(&path)?;
        info!("Removed container folder {}", path.display());
        Ok(true)
    }

    fn exists(&self, file: &FileDescriptor) -> Result<bool> {
        Ok(self.file_path(file)?.is_file())
    }

    fn delete_file(&self, file: &FileDescriptor) -> Result<bool> {
        let path = self.file_path(file)?;
        if !path.is_file() {
            return Ok(false);
        }
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn open_text(
        &self,
        file: &FileDescriptor,
        encoding: Option<TextEncoding>,
    ) -> Result<Box<dyn TextFile>> {
        let path = self.file_path(file)?;
        if !path.is_file() {
            return Err(Error::NotFound(format!("file {file}")));
        }
        let bytes = std::fs::read(&path)?;
        let content = TextEncoding::decode_detecting(&bytes, encoding.unwrap_or_default())?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Box::new(LocalTextFile::reading(
            file.clone(),
            path,
            TextReader::new(content),
        )))
    }

    fn create_text(
        &self,
        file: &FileDescriptor,
        options: &TextFileOptions,
    ) -> Result<Box<dyn TextFile>> {
        let path = self.file_path(file)?;
        if let Some(parent) = path.parent() {
            ensure_directory(parent)?;
        }
        let mut output_file = File::create(&path)?;
        Self::write_preamble(&mut output_file, options.effective_encoding())?;
        debug!("Created {}", path.display());
        Self::open_for_writing(file, path, output_file, options)
    }

    fn append_text(
        &self,
        file: &FileDescriptor,
        options: &TextFileOptions,
    ) -> Result<Box<dyn TextFile>> {
        let path = self.file_path(file)?;
        if !path.is_file() {
            return Err(Error::NotFound(format!("file {file}")));
        }
        let mut output_file = OpenOptions::new().append(true).open(&path)?;
        if output_file.metadata()?.len() == 0 {
            Self::write_preamble(&mut output_file, options.effective_encoding())?;
        }
        debug!("Opened {} for append", path.display());
        Self::open_for_writing(file, path, output_file, options)
    }
}

/// Handle of a text file on the local filesystem.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct LocalTextFile {
    descriptor: FileDescriptor,
    path: PathBuf,
    file: Option<File>,
    state: TextFileState,
}

impl LocalTextFile {
    fn writing(
        descriptor: FileDescriptor,
        path: PathBuf,
        file: File,
        writer: AutoFlushTextWriter,
    ) -> Self {
        Self {
            descriptor,
            path,
            file: Some(file),
            state: TextFileState::Writing(writer),
        }
    }

    fn reading(descriptor: FileDescriptor, path: PathBuf, reader: TextReader) -> Self {
        Self {
            descriptor,
            path,
            file: None,
            state: TextFileState::Reading(reader),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextFile for LocalTextFile {
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
        let flush_result = self.state.close();
        let sync_result = match self.file.take() {
            Some(file) => file.sync_data().map_err(Error::from),
            None => Ok(()),
        };
        flush_result.and(sync_result)
    }
}

impl Drop for LocalTextFile {
    fn drop(&mut self) {
        if self.mode() == HandleMode::Closed {
            return;
        }
        if let Err(e) = self.close() {
            error!("Failed to close {}: {e}", self.path.display());
        }
    }
}
