//! Atomic whole-file replacement

use crate::traits::StorageResult;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Removes the staging file unless the rename went through
struct StagingFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut staging = target.as_os_str().to_owned();
    staging.push(".tmp");
    PathBuf::from(staging)
}

/// Replace the contents of `target` with `contents`
///
/// Readers see either the old file or the new one, never a torn write. The
/// parent directory is created when missing.
pub(crate) fn replace_file(target: &Path, contents: &[u8]) -> StorageResult<()> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut staging = StagingFile {
        path: staging_path(target),
        committed: false,
    };

    let mut file = File::create(&staging.path)?;
    file.write_all(contents)?;
    file.flush()?;
    file.sync_all()?;
    drop(file);

    fs::rename(&staging.path, target)?;
    staging.committed = true;

    Ok(())
}
