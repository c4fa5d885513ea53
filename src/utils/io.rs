//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::io::{IsTerminal, Read};
use std::path::Path;

/// Read file contents, mapping failures to `internal.io_error`.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("{} {}", operation, path.display())),
        )
    })
}

/// Read from a path, or from stdin when `spec` is `-`.
pub fn read_input(spec: &str, operation: &str) -> Result<String> {
    if spec.trim() != "-" {
        return read_file(Path::new(spec), operation);
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(Error::validation_invalid_argument(
            "input",
            "Cannot read from stdin when stdin is a TTY",
            None,
            None,
        ));
    }

    let mut buf = String::new();
    stdin
        .read_to_string(&mut buf)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} (stdin)", operation))))?;
    Ok(buf)
}

/// Write content to file atomically (write to .tmp, then rename).
///
/// Readers of the bundle see either the old content or the new content,
/// never a partial write.
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let invalid = || {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    };
    let parent = path.parent().ok_or_else(invalid)?;
    let filename = path.file_name().ok_or_else(invalid)?;

    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let tmp_path = parent.join(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} (write temp)", operation))))?;

    fs::rename(&tmp_path, path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} (rename)", operation))))?;

    Ok(())
}
