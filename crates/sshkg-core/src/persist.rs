//! Atomic key file writes.
//!
//! Every file is written to a fresh temporary file in the target's
//! directory, synced, chmod-ed and then renamed over the target, so the
//! target path never holds a partially-written key.

use crate::error::{KeygenError, KeygenResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Permission mode for private key files.
pub const PRIVATE_KEY_MODE: u32 = 0o600;
/// Permission mode for public key files.
pub const PUBLIC_KEY_MODE: u32 = 0o644;

/// Write `bytes` to `path` atomically with the given permission mode.
///
/// On failure before the rename the temporary file is removed and `path`
/// is left untouched.
pub fn write_atomic(path: &Path, bytes: &[u8], mode: u32) -> KeygenResult<()> {
    let persist_err = |source: std::io::Error| KeygenError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let dir = parent_dir(path);
    let mut tmp = tempfile::Builder::new()
        .prefix(".tmpkey-")
        .tempfile_in(dir)
        .map_err(persist_err)?;

    tmp.write_all(bytes).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;
    set_mode(tmp.as_file(), mode).map_err(persist_err)?;

    // Dropping the PersistError drops the temp file with it.
    tmp.persist(path).map_err(|e| persist_err(e.error))?;
    sync_dir(dir);

    debug!(path = %path.display(), mode = format_args!("{mode:04o}"), "key file written");
    Ok(())
}

/// Remove a file, logging instead of failing.
pub fn remove_best_effort(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed file"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove file"),
    }
}

/// Path-existence check used before overwriting key files.
pub trait PathProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl PathProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        // Dangling symlinks count as existing files.
        fs::symlink_metadata(path).is_ok()
    }
}

/// Return the subset of `paths` that already exist, in order.
pub fn existing_files<'a>(
    probe: &dyn PathProbe,
    paths: impl IntoIterator<Item = &'a Path>,
) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|p| probe.exists(p))
        .map(Path::to_path_buf)
        .collect()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn set_mode(file: &fs::File, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_file: &fs::File, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

/// Make the rename itself durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(dir = %dir.display(), error = %e, "directory sync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
