//! Utility functions for directory lookup and output handling
//!
//! # Directory Structure
//!
//! - Config: `~/.config/fwmerge/config.json` - User defaults
//!
//! # Example
//!
//! ```
//! use fwmerge::utils::render_diff;
//!
//! let diff = render_diff("-A INPUT -j DROP\n", "-A INPUT -j ACCEPT\n");
//! assert_eq!(diff.as_deref(), Some("- -A INPUT -j DROP\n+ -A INPUT -j ACCEPT\n"));
//! ```

use directories::ProjectDirs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fwmerge").map(|pd| pd.config_dir().to_path_buf())
}

/// Writes `contents` to `path` using an atomic write pattern.
/// 1. Writes to a temporary file in the target directory.
/// 2. Flushes it to disk.
/// 3. Atomically renames it over the target path.
///
/// A reader such as `iptables-restore` therefore never sees a half-written
/// ruleset.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Line diff between the file at `path` and `new_text`, `None` when they match.
///
/// A missing file counts as empty so a first install shows every line as
/// added. Any other read failure is returned.
pub fn diff_against_file(path: &Path, new_text: &str) -> crate::Result<Option<String>> {
    let current = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(crate::Error::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Ok(render_diff(&current, new_text))
}

/// Line diff between two renders, `None` when they are identical.
pub fn render_diff(old_text: &str, new_text: &str) -> Option<String> {
    use std::fmt::Write;

    if old_text == new_text {
        return None;
    }

    let diff = similar::TextDiff::from_lines(old_text, new_text);
    let mut result = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            similar::ChangeTag::Delete => "- ",
            similar::ChangeTag::Insert => "+ ",
            similar::ChangeTag::Equal => "  ",
        };
        let _ = write!(result, "{sign}{change}");
    }

    Some(result)
}
