//! Size-based rotation of `logs/hrsync.log`, checked once when logging starts.
//!
//! `hrsync.log` becomes `hrsync.log.1`, older copies shift up by one and the
//! copy past `keep` is deleted. The live file is not recreated here; the
//! logger opens it in create-and-append mode right after.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default size that triggers rotation (10 MiB).
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of rotated copies kept.
pub const MAX_ROTATED_FILES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    /// Numbered copies to keep; at least one is always kept.
    pub keep: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_LOG_BYTES,
            keep: MAX_ROTATED_FILES,
        }
    }
}

/// What a rotation moved and deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotated {
    /// Where the live file went (`<log>.1`).
    pub archived: PathBuf,
    /// Size of the live file when it was moved.
    pub bytes: u64,
    /// The oldest copy, if one had to be deleted to stay within `keep`.
    pub dropped: Option<PathBuf>,
}

impl RotationPolicy {
    /// Rotate `log_path` when it has reached `max_bytes`.
    ///
    /// A missing or smaller file yields `None`.
    pub fn rotate(&self, log_path: &Path) -> io::Result<Option<Rotated>> {
        let bytes = match fs::metadata(log_path) {
            Ok(meta) if meta.len() >= self.max_bytes => meta.len(),
            Ok(_) => return Ok(None),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let keep = self.keep.max(1);

        let oldest = archive_path(log_path, keep);
        let dropped = match fs::remove_file(&oldest) {
            Ok(()) => Some(oldest),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };

        for n in (1..keep).rev() {
            let from = archive_path(log_path, n);
            match fs::rename(&from, archive_path(log_path, n + 1)) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }

        let archived = archive_path(log_path, 1);
        fs::rename(log_path, &archived)?;
        Ok(Some(Rotated {
            archived,
            bytes,
            dropped,
        }))
    }
}

/// `hrsync.log` → `hrsync.log.<n>`.
fn archive_path(log_path: &Path, n: usize) -> PathBuf {
    let mut name = log_path
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| hrsync_core::paths::LOG_FILE.into());
    name.push(format!(".{n}"));
    log_path.with_file_name(name)
}
