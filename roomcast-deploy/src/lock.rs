use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::DeployError;

/// Exclusive marker for one deployment run
///
/// The file is created with create-new semantics and removed when the lock
/// is dropped. A stale file left by a crashed run must be removed by hand;
/// it names the pid that created it.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| match source.kind() {
                ErrorKind::AlreadyExists => DeployError::Locked { path: path.clone() },
                _ => DeployError::LockIo {
                    path: path.clone(),
                    source,
                },
            })?;

        // Dropping the lock on a failed write removes the file again
        let lock = Self { path };
        write_owner(&mut file, &lock.path)?;
        tracing::debug!(path = %lock.path.display(), "acquired run lock");
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Record the owning pid in the lock file
fn write_owner(file: &mut impl Write, path: &Path) -> Result<(), DeployError> {
    writeln!(file, "{}", std::process::id())
        .and_then(|()| file.flush())
        .map_err(|source| DeployError::LockIo {
            path: path.to_path_buf(),
            source,
        })
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(error) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), %error, "failed to remove run lock");
        }
    }
}
