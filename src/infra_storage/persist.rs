use crate::domain_port::CredentialStoreError;
use std::fs;
use std::io;
use std::path::Path;

/// Replaces `path` with `bytes` via a sibling temp file, so a crash never
/// leaves a half-written credential file behind.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), CredentialStoreError> {
    let io_err = |source| CredentialStoreError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

pub(crate) fn remove_if_exists(path: &Path) -> Result<(), CredentialStoreError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(CredentialStoreError::Io {
            path: path.display().to_string(),
            source: e,
        }),
        _ => Ok(()),
    }
}

/// `None` if the file does not exist or cannot be read.
pub(crate) fn read_if_exists(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable credential file");
            None
        }
    }
}
