//! Advisory lock on the data directory (fs2).
//!
//! Lock file path: <data_dir>/LOCK
//! One Registry per data directory: a second open fails fast instead of
//! blocking. Lock is released on Drop.

use anyhow::Context;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::consts::LOCK_FILE;
use crate::error::{RegistryError, Result};

#[derive(Debug)]
pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

pub fn lock_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOCK_FILE)
}

/// Take the exclusive lock or report who holds the directory.
pub fn try_lock_data_dir(data_dir: &Path) -> Result<DirLock> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;
    let path = lock_file_path(data_dir);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&path)
        .with_context(|| format!("open lock file {}", path.display()))?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(DirLock { file, path }),
        Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(RegistryError::Locked(path))
        }
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("try_lock_exclusive {}", path.display()))
            .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn second_lock_on_same_dir_fails_until_first_dropped() {
        let t = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("pcelica-lock-{}-{t}", std::process::id()));

        let first = try_lock_data_dir(&dir).expect("first lock");
        assert!(matches!(
            try_lock_data_dir(&dir),
            Err(RegistryError::Locked(_))
        ));
        drop(first);
        let again = try_lock_data_dir(&dir).expect("relock after drop");
        assert_eq!(again.path(), lock_file_path(&dir));
        drop(again);
        let _ = fs::remove_dir_all(dir);
    }
}
