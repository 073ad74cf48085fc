use crate::error::{MhtError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Creates `dir` when missing and checks that files can be created in it.
/// Returns the canonical path.
pub fn prepare_output_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            MhtError::Config(format!("cannot create output directory {}: {e}", dir.display()))
        })?;
        debug!(dir = %dir.display(), "created output directory");
    }
    if !dir.is_dir() {
        return Err(MhtError::Config(format!(
            "output path is not a directory: {}",
            dir.display()
        )));
    }
    tempfile::tempfile_in(dir).map_err(|e| {
        MhtError::Config(format!("output directory isn't writable {}: {e}", dir.display()))
    })?;
    Ok(fs::canonicalize(dir)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("a").join("html");
        let got = prepare_output_dir(&target).unwrap();
        assert!(target.is_dir());
        assert!(got.is_absolute());
    }

    #[test]
    fn rejects_regular_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("f");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(prepare_output_dir(&file), Err(MhtError::Config(_))));
    }
}
