//! Path helpers for config and key files

use std::path::{Path, PathBuf};

/// Resolve a user-supplied path: `~` and `~/...` expand to the home
/// directory, relative paths are joined to the working directory.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    let expanded = match path.strip_prefix('~') {
        Some("") => home_or(path),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => {
            home_or(path).join(&rest[1..])
        }
        _ => PathBuf::from(path),
    };

    absolute(&expanded)
}

fn home_or(fallback: &str) -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(fallback))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
