use std::fs::Permissions;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use log::debug;
use tempfile::NamedTempFile;

const TEXTFILE_MODE: u32 = 0o644;

/// Writes `contents` to `path` atomically: readers see either the old file
/// or the complete new one.
pub fn write_atomically(path: &Path, contents: &str) -> Result<(), String> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| format!("Can't create temporary file in '{}': {}", dir.display(), e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| format!("Can't write temporary file: {}", e))?;
    std::fs::set_permissions(tmp.path(), Permissions::from_mode(TEXTFILE_MODE))
        .map_err(|e| format!("Can't set permissions on temporary file: {}", e))?;
    debug!("Renaming {} to {}", tmp.path().display(), path.display());
    tmp.persist(path)
        .map_err(|e| format!("Can't write '{}': {}", path.display(), e.error))?;
    Ok(())
}
