//! Mode-aware artifact writer.
//!
//! ## Write protocol
//!
//! 1. Ensure the parent directory exists.
//! 2. Write to a `.tincherd.tmp` sibling.
//! 3. chmod the tmp file to the artifact mode.
//! 4. Rename to the final path (atomic on POSIX).
//!
//! There is no content diffing: every run regenerates and overwrites the
//! full artifact set, so convergence is idempotent rather than
//! incremental.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{io_err, GenError};

/// Write `content` to `path` with the given mode, atomically.
pub fn write_contents(path: &Path, content: &str, mode: u32) -> Result<(), GenError> {
    let tmp = PathBuf::from(format!("{}.tincherd.tmp", path.display()));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    set_mode(&tmp, mode)?;

    // The target may be a symlink left by local-override mode; rename
    // replaces it either way, but never follows it.
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    tracing::debug!(path = %path.display(), mode = format_args!("{mode:o}"), "wrote artifact");
    Ok(())
}

/// Write `dir/<name>` after validating that `name` cannot escape `dir`.
///
/// Peer names originate from a remote, semi-trusted registry; anything
/// that is not a plain file name is rejected outright rather than
/// sanitized.
pub fn write_contents_safe(
    dir: &Path,
    name: &str,
    content: &str,
    mode: u32,
) -> Result<(), GenError> {
    check_safe_name(name)?;
    write_contents(&dir.join(name), content, mode)
}

/// Reject names with path separators, traversal sequences, or NULs.
pub fn check_safe_name(name: &str) -> Result<(), GenError> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if unsafe_name {
        return Err(GenError::UnsafeName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Remove `path` and, when an executable `<path>.local` exists, symlink
/// it into place. This is the defined fallback for the subnet scripts
/// when dynamic routes are off: the daemon can still invoke site-local
/// logic even though we generate nothing ourselves.
pub fn install_local_override(path: &Path) -> Result<(), GenError> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(path, e)),
    }

    let local = PathBuf::from(format!("{}.local", path.display()));
    if is_executable(&local) {
        tracing::debug!(
            target_path = %path.display(),
            local = %local.display(),
            "linking site-local override",
        );
        std::os::unix::fs::symlink(&local, path).map_err(|e| io_err(path, e))?;
    }
    Ok(())
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn set_mode(path: &Path, mode: u32) -> Result<(), GenError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| io_err(path, e))
}
