use crate::error::{MhtError, Result};
use std::path::{Path, PathBuf};

/// Rewrites Windows-style separators to `/`.
pub fn normalize_separators(name: &str) -> String {
    name.replace('\\', "/")
}

/// Joins a `/`-separated resource name under `root`, refusing anything that
/// could land outside it.
pub fn safe_join(root: &Path, rel: &str) -> Result<PathBuf> {
    if rel.starts_with('/') || Path::new(rel).is_absolute() {
        return Err(MhtError::UnsafePath(rel.to_string()));
    }
    let mut out = root.to_path_buf();
    let mut pushed = false;
    for comp in rel.split('/') {
        match comp {
            "" | "." => continue,
            ".." => return Err(MhtError::UnsafePath(rel.to_string())),
            c if c.contains(':') && cfg!(windows) => {
                return Err(MhtError::UnsafePath(rel.to_string()));
            }
            c => {
                out.push(c);
                pushed = true;
            }
        }
    }
    if !pushed {
        return Err(MhtError::UnsafePath(rel.to_string()));
    }
    Ok(out)
}

/// File extension for an image subformat; `jpeg` and `jpg` share `jpg`.
pub fn image_extension(subformat: &str) -> String {
    let base = subformat.split('+').next().unwrap_or(subformat);
    match base {
        "jpeg" | "pjpeg" => "jpg".to_string(),
        "" => "bin".to_string(),
        other => file_token(other),
    }
}

/// Keeps `[A-Za-z0-9.+-]`, replacing anything else (separators included)
/// with `_`, so header text can be used inside a file name.
pub fn file_token(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
