//! Writes downloaded reports to a local directory.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use tracing::info;

use crate::domain::ports::Download;

/// Save `download` under `directory`, creating the directory if needed.
///
/// Only the final component of the suggested filename is used, so a
/// server-supplied name cannot escape `directory`.
///
/// # Errors
///
/// Fails when the directory cannot be created or the file cannot be written.
pub fn write_download(directory: &Path, download: &Download) -> io::Result<PathBuf> {
    let name = Path::new(&download.filename)
        .file_name()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unusable export filename `{}`", download.filename),
            )
        })?
        .to_os_string();
    Dir::create_ambient_dir_all(directory, ambient_authority())?;
    let dir = Dir::open_ambient_dir(directory, ambient_authority())?;
    dir.write(Path::new(&name), &download.bytes)?;
    let written = directory.join(name);
    info!(path = %written.display(), size = download.bytes.len(), "export saved");
    Ok(written)
}
