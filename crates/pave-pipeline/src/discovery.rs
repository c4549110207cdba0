//! Finding source images on disk.

use crate::error::PipelineError;
use image::ImageFormat;
use std::fs;
use std::path::{Path, PathBuf};

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Image files under `dir`, recursively, sorted by path.
///
/// Entries whose name starts with `.` are skipped, as are files whose
/// extension is not a known image format.
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut found = Vec::new();
    walk(dir, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), PipelineError> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if is_hidden(&path) {
            continue;
        }
        if path.is_dir() {
            walk(&path, found)?;
        } else if ImageFormat::from_path(&path).is_ok() {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_hidden_entries_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b_sub")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        for name in ["c.png", "a.jpg", ".hidden.png", "notes.txt", "b_sub/d.png", ".cache/e.png"] {
            fs::write(root.join(name), b"").unwrap();
        }

        let found = discover_images(root).unwrap();
        let rel: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a.jpg"),
                PathBuf::from("b_sub/d.png"),
                PathBuf::from("c.png"),
            ]
        );
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_images(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
