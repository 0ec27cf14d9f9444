//! Session store backed by a JSON file.
//!
//! File access goes through `cap_std`: the parent directory is opened once
//! per operation and the session file is addressed relative to it.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::ports::{SessionStore, SessionStoreError, StoredSession};

/// [`SessionStore`] persisting `{ "token": ..., "user": ... }` to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store at `path`; the file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> io::Result<(Dir, OsString)> {
        let (parent, name) = split_path(&self.path)?;
        Dir::open_ambient_dir(parent, ambient_authority()).map(|dir| (dir, name))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<StoredSession>, SessionStoreError> {
        let (dir, name) = match self.open() {
            Ok(opened) => opened,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(&self.path, &err)),
        };
        let text = match dir.read_to_string(Path::new(&name)) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(&self.path, &err)),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|err| SessionStoreError::corrupt(err.to_string()))
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError> {
        let (dir, name) = self.open().map_err(|err| io_error(&self.path, &err))?;
        let json = serde_json::to_vec_pretty(session)
            .map_err(|err| SessionStoreError::io(err.to_string()))?;
        dir.write(Path::new(&name), json)
            .map_err(|err| io_error(&self.path, &err))?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        let (dir, name) = match self.open() {
            Ok(opened) => opened,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(io_error(&self.path, &err)),
        };
        match dir.remove_file(Path::new(&name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&self.path, &err)),
        }
    }
}

/// Split `path` into the directory to open and the entry name inside it.
fn split_path(path: &Path) -> io::Result<(&Path, OsString)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "path must include a file name",
        )
    })?;
    Ok((parent, file_name.to_os_string()))
}

fn io_error(path: &Path, err: &io::Error) -> SessionStoreError {
    SessionStoreError::io(format!("{}: {err}", path.display()))
}
