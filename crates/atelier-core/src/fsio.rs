//! Atomic file replacement

use crate::error::{EngineError, EngineResult};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `content` to `path` so that no partial file is ever visible.
///
/// The content goes to a temporary file in the target's directory and is
/// renamed over the destination; rename is atomic on the same filesystem.
pub(crate) fn write_file_atomic(path: &Path, content: &str) -> EngineResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)
        .map_err(|e| EngineError::file_write(path.display().to_string(), e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| EngineError::file_write(path.display().to_string(), e))?;
    tmp.persist(path)
        .map_err(|e| EngineError::file_write(path.display().to_string(), e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "old").unwrap();

        write_file_atomic(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.txt");

        write_file_atomic(&path, "content\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content\n");
    }
}
