use std::io::{Error, ErrorKind};
use std::path::Path;

/// Creates `fs_path` and any missing parents; an existing directory is fine.
pub fn ensure_directory(fs_path: &Path) -> Result<(), Error> {
    if !fs_path.exists() {
        if let Err(e) = std::fs::create_dir_all(fs_path) {
            if e.kind() == ErrorKind::AlreadyExists && fs_path.is_dir() {
                return Ok(());
            }
            return Err(e);
        }
    } else if !fs_path.is_dir() {
        // use ErrorKind::NotADirectory when it becomes stable
        return Err(Error::new(
            ErrorKind::Other,
            "target object should be a directory",
        ));
    }
    Ok(())
}

pub fn is_directory_empty(fs_path: &Path) -> Result<bool, Error> {
    Ok(std::fs::read_dir(fs_path)?.next().is_none())
}
