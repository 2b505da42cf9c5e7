//! Backup-on-overwrite for portable-binary outputs.
//!
//! Before a portable-binary file is created over an existing path, the old
//! file is renamed aside.  Backup names come from a [`BackupNamer`]; the
//! default [`NumberedBackup`] produces `dir/#name.N#` with the first free `N`.

use std::path::{Path, PathBuf};

/// Chooses the name an existing file is moved to before it is overwritten.
pub trait BackupNamer {
    fn backup_name(&self, path: &Path) -> PathBuf;
}

/// `dir/#name.1#`, `dir/#name.2#`, ... up to `max` (inclusive).  When every
/// slot is taken the last one is reused.
#[derive(Debug, Clone, Copy)]
pub struct NumberedBackup {
    pub max: u32,
}

impl Default for NumberedBackup {
    fn default() -> Self {
        Self { max: 99 }
    }
}

impl NumberedBackup {
    fn candidate(path: &Path, n: u32) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!("#{name}.{n}#"))
    }
}

impl BackupNamer for NumberedBackup {
    fn backup_name(&self, path: &Path) -> PathBuf {
        let max = self.max.max(1);
        (1..=max)
            .map(|n| Self::candidate(path, n))
            .find(|p| !p.exists())
            .unwrap_or_else(|| Self::candidate(path, max))
    }
}

/// Rename `path` aside if it exists.  Returns the backup path on success.
///
/// A failed rename is logged and otherwise ignored; the caller goes on to
/// create the new file.
pub fn backup_existing(path: &Path, namer: &dyn BackupNamer) -> Option<PathBuf> {
    if !path.exists() {
        return None;
    }
    let target = namer.backup_name(path);
    match std::fs::rename(path, &target) {
        Ok(()) => {
            tracing::info!(from = %path.display(), to = %target.display(), "backed up existing file");
            Some(target)
        }
        Err(e) => {
            tracing::warn!(from = %path.display(), to = %target.display(), error = %e, "could not back up existing file");
            None
        }
    }
}
