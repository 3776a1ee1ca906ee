use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::debug;

use crate::error::LifecycleError;

/// Exclusive advisory lock serializing start/stop controllers.
/// Held for the lifetime of the value; released on drop.
pub struct ControllerLock {
    file: File,
    path: PathBuf,
}

impl ControllerLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create lock directory {:?}", parent))?;
        }

        // Don't truncate before holding the lock; the current holder's PID lives here
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock file {:?}", path))?;

        if file.try_lock_exclusive().is_err() {
            return Err(LifecycleError::LockHeld {
                path: path.to_path_buf(),
            }
            .into());
        }

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        debug!("Acquired controller lock {:?}", path);

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for ControllerLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("Released controller lock {:?}", self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_holder_is_refused_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run").join("lifecycle.lock");

        let first = ControllerLock::acquire(&path).unwrap();
        let err = ControllerLock::acquire(&path).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<LifecycleError>(),
            Some(LifecycleError::LockHeld { .. })
        ));

        drop(first);
        assert!(ControllerLock::acquire(&path).is_ok());
    }

    #[test]
    fn lock_file_records_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lifecycle.lock");

        let _lock = ControllerLock::acquire(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }
}
